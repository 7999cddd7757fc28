//! 地址池与地址分配表
//!
//! 安装阶段从配置的子网中为每个节点顺序分配一个唯一地址。
//! 地址空间不足是致命错误，在调度器启动之前中止运行。

use super::id::NodeId;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use thiserror::Error;
use tracing::debug;

/// 安装阶段错误。任何一种都会在调度器启动之前中止运行。
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("address pool {base}/{mask} exhausted after {assigned} assignments")]
    PoolExhausted {
        base: Ipv4Addr,
        mask: Ipv4Addr,
        assigned: usize,
    },
    #[error("unknown routing protocol `{0}`")]
    UnknownProtocol(String),
    #[error("port {port} already bound on node {node}")]
    PortInUse { node: usize, port: u16 },
}

/// 地址池：从 `base/mask` 子网顺序分配主机地址。
///
/// 主机部分从 1 开始递增，广播地址（主机位全 1）保留不分配。
#[derive(Debug)]
pub struct AddressPool {
    base: Ipv4Addr,
    mask: Ipv4Addr,
    next_host: u32,
}

impl AddressPool {
    pub fn new(base: Ipv4Addr, mask: Ipv4Addr) -> Self {
        Self {
            base,
            mask,
            next_host: 1,
        }
    }

    /// 分配下一个地址；池耗尽时返回 None。
    pub fn allocate(&mut self) -> Option<Ipv4Addr> {
        let mask = u32::from(self.mask);
        let host_space = !mask;
        if self.next_host >= host_space {
            return None;
        }
        let addr = (u32::from(self.base) & mask) | self.next_host;
        self.next_host += 1;
        Some(Ipv4Addr::from(addr))
    }

    pub fn base(&self) -> Ipv4Addr {
        self.base
    }

    pub fn mask(&self) -> Ipv4Addr {
        self.mask
    }

    /// 判断地址是否落在本池的子网内。
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let mask = u32::from(self.mask);
        u32::from(addr) & mask == u32::from(self.base) & mask
    }
}

/// 地址分配表：节点与地址的双向映射。setup 之后只读。
#[derive(Debug, Default, Clone)]
pub struct AddressAssignment {
    entries: Vec<(NodeId, Ipv4Addr)>,
    by_addr: HashMap<Ipv4Addr, NodeId>,
}

impl AddressAssignment {
    pub fn insert(&mut self, node: NodeId, addr: Ipv4Addr) {
        debug!(node = ?node, addr = %addr, "记录地址分配");
        self.entries.push((node, addr));
        self.by_addr.insert(addr, node);
    }

    /// 查询节点的地址。
    pub fn addr_of(&self, node: NodeId) -> Option<Ipv4Addr> {
        self.entries
            .iter()
            .find(|(n, _)| *n == node)
            .map(|(_, a)| *a)
    }

    /// 反向解析：地址属于哪个节点。未知地址返回 None。
    pub fn node_of(&self, addr: Ipv4Addr) -> Option<NodeId> {
        self.by_addr.get(&addr).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(NodeId, Ipv4Addr)> {
        self.entries.iter()
    }
}
