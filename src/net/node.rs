//! 节点类型
//!
//! 定义无线节点：标识、名称、位置、一个无线设备、一个网络地址、
//! 若干被动套接字和一个路由协议实例。位置与地址在 setup 之后不可变。

use super::addr::InstallError;
use super::id::{DeviceId, NodeId};
use super::position::Position;
use super::socket::Socket;
use crate::route::RoutingProtocol;
use std::net::Ipv4Addr;
use tracing::debug;

/// 无线节点
pub struct Node {
    id: NodeId,
    name: String,
    pos: Position,
    device: Option<DeviceId>,
    addr: Option<Ipv4Addr>,
    sockets: Vec<Socket>,
    protocol: Option<Box<dyn RoutingProtocol>>,
}

impl Node {
    /// 创建新节点。设备、地址与路由协议在后续 setup 步骤中安装。
    pub fn new(id: NodeId, name: impl Into<String>, pos: Position) -> Self {
        Self {
            id,
            name: name.into(),
            pos,
            device: None,
            addr: None,
            sockets: Vec::new(),
            protocol: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pos(&self) -> Position {
        self.pos
    }

    pub fn device(&self) -> Option<DeviceId> {
        self.device
    }

    pub(crate) fn set_device(&mut self, dev: DeviceId) {
        self.device = Some(dev);
    }

    pub fn addr(&self) -> Option<Ipv4Addr> {
        self.addr
    }

    pub(crate) fn set_addr(&mut self, addr: Ipv4Addr) {
        self.addr = Some(addr);
    }

    pub(crate) fn set_protocol(&mut self, proto: Box<dyn RoutingProtocol>) {
        self.protocol = Some(proto);
    }

    /// 已安装的路由协议实例。
    pub fn protocol(&self) -> Option<&dyn RoutingProtocol> {
        self.protocol.as_deref()
    }

    pub fn protocol_mut(&mut self) -> &mut dyn RoutingProtocol {
        self.protocol.as_deref_mut().expect("protocol installed")
    }

    /// 绑定一个被动接收端点。重复绑定同一端口是 setup 错误。
    pub fn bind(&mut self, port: u16) -> Result<(), InstallError> {
        if self.has_socket(port) {
            return Err(InstallError::PortInUse {
                node: self.id.0,
                port,
            });
        }
        debug!(node = ?self.id, port, "绑定被动套接字");
        self.sockets.push(Socket { port });
        Ok(())
    }

    pub fn has_socket(&self, port: u16) -> bool {
        self.sockets.iter().any(|s| s.port == port)
    }
}
