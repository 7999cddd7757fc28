//! 路由协议模块
//!
//! 路由算法本身是外部协作者：本模块只定义能力接口
//! （路由查询、转发钩子、周期维护钩子、路由表快照）和
//! 按名字实例化协议的注册表。被测的按需反应式协议是其中一个实现，
//! 注册表允许换用其它协议而不改动安装器。

use crate::net::{NodeId, Packet};
use crate::radio::Reachability;
use crate::sim::SimTime;
use std::collections::HashMap;

mod maintain;
mod reactive;
mod snapshot;

pub use maintain::MaintainRoutes;
pub use reactive::ReactiveProtocol;
pub use snapshot::DumpRoutes;

/// 路由协议能力接口。每个节点持有一个独立实例。
pub trait RoutingProtocol: Send {
    /// 协议名（与注册表中的标识一致）。
    fn name(&self) -> &'static str;

    /// 查询从 `here` 到 `dst` 的下一跳。
    ///
    /// 按需发现路由的协议在此触发发现；无路由返回 None
    /// （该包被丢弃，不重试）。
    fn next_hop(&mut self, here: NodeId, dst: NodeId, reach: &Reachability) -> Option<NodeId>;

    /// 转发钩子：每个经由本节点中继的数据包都会经过这里。
    fn on_forward(&mut self, _pkt: &Packet) {}

    /// 周期性维护钩子（过期、清理等）。
    fn maintain(&mut self, _now: SimTime) {}

    /// 路由表的文本快照，用于定期 dump。
    fn table_dump(&self) -> String;
}

/// 协议工厂：产出一个新的协议实例。
pub type ProtocolFactory = fn() -> Box<dyn RoutingProtocol>;

/// 协议注册表：标识 -> 工厂。
///
/// 取代按字符串散落各处的动态选择：安装器只认注册表，
/// 换协议即换注册项。
pub struct ProtocolRegistry {
    factories: HashMap<String, ProtocolFactory>,
}

impl ProtocolRegistry {
    /// 空注册表。
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// 带内置协议的注册表。
    pub fn with_defaults() -> Self {
        let mut r = Self::new();
        r.register("reactive", || Box::new(ReactiveProtocol::new()));
        r
    }

    /// 注册一个协议工厂。同名覆盖。
    pub fn register(&mut self, name: impl Into<String>, factory: ProtocolFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// 实例化指定协议；未注册返回 None。
    pub fn create(&self, name: &str) -> Option<Box<dyn RoutingProtocol>> {
        self.factories.get(name).map(|f| f())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl Default for ProtocolRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
