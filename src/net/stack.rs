//! 协议栈安装器
//!
//! 为每个节点从配置子网分配唯一地址，并按名字从注册表实例化
//! 路由协议绑定到节点。地址池耗尽或协议未注册都是致命错误，
//! 在调度器启动之前中止运行。

use super::addr::{AddressAssignment, AddressPool, InstallError};
use super::manet_world::ManetWorld;
use crate::route::ProtocolRegistry;
use std::net::Ipv4Addr;
use tracing::{debug, info};

/// 为世界中的全部节点安装地址与路由协议。
///
/// 返回的分配表同时记录在 world 上，供运行期反向解析源地址。
#[tracing::instrument(skip(world, registry), fields(nodes = world.node_count(), protocol = protocol_id))]
pub fn install_stack(
    world: &mut ManetWorld,
    subnet_base: Ipv4Addr,
    subnet_mask: Ipv4Addr,
    protocol_id: &str,
    registry: &ProtocolRegistry,
) -> Result<AddressAssignment, InstallError> {
    if !registry.contains(protocol_id) {
        return Err(InstallError::UnknownProtocol(protocol_id.to_string()));
    }

    let mut pool = AddressPool::new(subnet_base, subnet_mask);
    let mut assignment = AddressAssignment::default();

    for id in world.node_ids().collect::<Vec<_>>() {
        let addr = pool.allocate().ok_or(InstallError::PoolExhausted {
            base: subnet_base,
            mask: subnet_mask,
            assigned: assignment.len(),
        })?;

        let proto = registry
            .create(protocol_id)
            .expect("registry contains protocol");

        let node = world.node_mut(id);
        node.set_addr(addr);
        node.set_protocol(proto);
        assignment.insert(id, addr);
        debug!(node = ?id, addr = %addr, "协议栈已安装");
    }

    info!(assigned = assignment.len(), "🔗 协议栈安装完成");
    world.assignment = assignment.clone();
    Ok(assignment)
}
