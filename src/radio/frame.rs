//! 链路层帧
//!
//! 数据包在共享介质上逐跳传输的封装。

use crate::net::{DeviceId, Packet};

/// 链路层帧：一次从发送设备到接收设备的传输。
#[derive(Debug, Clone)]
pub struct Frame {
    pub from: DeviceId,
    pub to: DeviceId,
    pub pkt: Packet,
}
