//! 收发 trace 模块
//!
//! 组件以类型化事件的方式上报收发动作；处理器在 setup 阶段注册一次，
//! 之后由调度器的派发顺序保证 trace 顺序（而不是回调注册顺序）。

use crate::net::NodeId;
use crate::sim::SimTime;
use std::net::Ipv4Addr;

mod collector;

pub use collector::TraceCollector;

/// 类型化 trace 事件。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraceEvent {
    /// 源端发出一个数据包
    Tx {
        at: SimTime,
        src: Ipv4Addr,
        dst: Ipv4Addr,
    },
    /// 汇聚端收到一个数据包。src 无法解析时为 None。
    Rx {
        at: SimTime,
        node: NodeId,
        src: Option<Ipv4Addr>,
    },
}

/// trace 事件处理器。
pub trait TraceHandler: Send {
    fn on_trace(&mut self, ev: &TraceEvent);
}

/// 事件总线：同步分发给所有已注册处理器，不做缓冲。
#[derive(Default)]
pub struct TraceBus {
    handlers: Vec<Box<dyn TraceHandler>>,
}

impl TraceBus {
    /// 注册处理器。应当只在 setup 阶段调用。
    pub fn register(&mut self, handler: Box<dyn TraceHandler>) {
        self.handlers.push(handler);
    }

    /// 同步分发一个事件。
    pub fn emit(&mut self, ev: &TraceEvent) {
        for h in &mut self.handlers {
            h.on_trace(ev);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// 秒级时间戳文本：去掉尾部多余的 0（"1.500000000" -> "1.5"，"2.000000000" -> "2"）。
pub(crate) fn format_secs(t: SimTime) -> String {
    let s = format!("{:.9}", t.as_secs_f64());
    let s = s.trim_end_matches('0');
    s.trim_end_matches('.').to_string()
}
