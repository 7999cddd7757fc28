//! trace 收集器
//!
//! 订阅全网的发送/接收事件，逐条同步格式化输出。
//! sink 的 I/O 错误不致命，丢掉该行继续。

use super::{format_secs, TraceEvent, TraceHandler};
use std::io::Write;

/// 把 trace 事件写成文本行的收集器。
///
/// 发送行：`<time> source <srcAddr> send to dest <dstAddr>`
/// 接收行：`<time> <nodeId> received one packet from <srcAddr>`
/// （源地址无法解析时退化为 `<time> <nodeId> received one packet!`）
pub struct TraceCollector {
    sink: Box<dyn Write + Send>,
}

impl TraceCollector {
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self { sink }
    }

    /// 写到标准输出的收集器。
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }
}

impl TraceHandler for TraceCollector {
    fn on_trace(&mut self, ev: &TraceEvent) {
        let line = match ev {
            TraceEvent::Tx { at, src, dst } => {
                format!("{} source {} send to dest {}", format_secs(*at), src, dst)
            }
            TraceEvent::Rx {
                at,
                node,
                src: Some(src),
            } => {
                format!("{} {} received one packet from {}", format_secs(*at), node.0, src)
            }
            TraceEvent::Rx { at, node, src: None } => {
                format!("{} {} received one packet!", format_secs(*at), node.0)
            }
        };
        // I/O 错误丢行，不中断仿真
        let _ = writeln!(self.sink, "{line}");
    }
}
