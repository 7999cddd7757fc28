//! 应用层模块
//!
//! 此模块包含流量发生器。

// 子模块声明
mod onoff;

// 重新导出公共接口
pub use onoff::{
    interval_for, schedule_flow, FlowOpts, FlowState, SendPacket, StartFlow, StopFlow,
    DEFAULT_PKT_BYTES, DEFAULT_RATE_BPS,
};
