//! 路由表快照事件
//!
//! 在配置的时刻把每个节点的路由表 dump 到外部 sink，
//! 每节点一段纯文本。产物只写不读，核心不消费它。

use crate::net::ManetWorld;
use crate::sim::{Event, Simulator, World};
use crate::trace::format_secs;
use std::io::Write;
use tracing::info;

/// 事件：dump 全部节点的路由表。
pub struct DumpRoutes {
    pub sink: Box<dyn Write + Send>,
}

impl Event for DumpRoutes {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DumpRoutes { mut sink } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<ManetWorld>()
            .expect("world must be ManetWorld");

        let now = sim.now();
        info!(now = ?now, "📋 dump 路由表");

        // I/O 错误不致命：丢弃剩余输出
        let _ = writeln!(sink, "Routing tables at t={}s", format_secs(now));
        for id in w.node_ids() {
            let node = w.node(id);
            let addr = node
                .addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|| "<unassigned>".to_string());
            let proto = node.protocol().map(|p| p.name()).unwrap_or("<none>");
            let dump = node
                .protocol()
                .map(|p| p.table_dump())
                .unwrap_or_default();

            let _ = writeln!(sink, "\nNode {} ({}, {addr}, protocol {proto}):", id.0, node.name());
            let _ = sink.write_all(dump.as_bytes());
        }
        let _ = sink.flush();
    }
}
