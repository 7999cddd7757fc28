//! 网络模块
//!
//! 此模块包含节点注册表、地址分配、数据包、套接字与仿真世界。

// 子模块声明
mod addr;
mod id;
mod manet_world;
mod node;
mod packet;
mod position;
mod socket;
mod stack;
mod stats;

// 重新导出公共接口
pub use addr::{AddressAssignment, AddressPool, InstallError};
pub use id::{DeviceId, FlowId, NodeId};
pub use manet_world::ManetWorld;
pub use node::Node;
pub use packet::Packet;
pub use position::Position;
pub use socket::{Socket, SINK_PORT};
pub use stack::install_stack;
pub use stats::Stats;
