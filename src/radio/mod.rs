//! 无线介质模块
//!
//! 此模块包含共享信道、无线设备、链路层帧、丢包策略与抓包 sink。

// 子模块声明
mod capture;
mod channel;
mod deliver;
mod device;
mod frame;
mod loss;

// 重新导出公共接口
pub use capture::{CaptureSink, PcapWriter};
pub use channel::{Channel, Reachability, DEFAULT_TX_QUEUE_BYTES};
pub use deliver::{DeliverFrame, MediumReady};
pub use device::RadioDevice;
pub use frame::Frame;
pub use loss::{DropEveryNth, LossPolicy, Lossless};
