//! 按需反应式路由协议（参考实现）
//!
//! 不主动维护全网路由：第一次需要到某目的地的路由时，在可达图上
//! 做一次按需发现（对目的地反向 BFS 求最短跳数，取使距离递减的
//! 编号最小邻居作为下一跳），结果进入本节点的路由缓存。
//! `maintain` 清空缓存，过期路由由下一次查询重新发现。

use super::RoutingProtocol;
use crate::net::NodeId;
use crate::radio::Reachability;
use crate::sim::SimTime;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, trace};

/// 反应式协议实例（每节点一个）。
pub struct ReactiveProtocol {
    /// dst -> 本节点的下一跳
    cache: HashMap<NodeId, NodeId>,
    /// 触发过的按需发现次数
    discoveries: u64,
}

impl ReactiveProtocol {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            discoveries: 0,
        }
    }

    pub fn discoveries(&self) -> u64 {
        self.discoveries
    }

    pub fn cached_routes(&self) -> usize {
        self.cache.len()
    }

    /// 按需发现：对 `dst` 在可达图上做反向 BFS 得到各节点到 dst 的
    /// 最短跳数，再从 `here` 的邻居里取距离严格递减的第一个。
    fn discover(&mut self, here: NodeId, dst: NodeId, reach: &Reachability) -> Option<NodeId> {
        let n = reach.len();
        if here.0 >= n || dst.0 >= n {
            return None;
        }

        let mut dist: Vec<u32> = vec![u32::MAX; n];
        let mut q: VecDeque<NodeId> = VecDeque::new();
        dist[dst.0] = 0;
        q.push_back(dst);

        while let Some(v) = q.pop_front() {
            let dv = dist[v.0];
            for &nb in reach.neighbors(v) {
                if dist[nb.0] == u32::MAX {
                    dist[nb.0] = dv.saturating_add(1);
                    q.push_back(nb);
                }
            }
        }

        let dh = dist[here.0];
        if dh == u32::MAX {
            trace!(here = ?here, dst = ?dst, "目的地不可达");
            return None;
        }

        // 邻居按编号升序存储，取第一个候选即可保证确定性
        let next = reach
            .neighbors(here)
            .iter()
            .copied()
            .find(|nb| dist[nb.0] == dh - 1)?;

        self.discoveries += 1;
        debug!(here = ?here, dst = ?dst, next = ?next, hops = dh, "按需发现路由");
        Some(next)
    }
}

impl Default for ReactiveProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutingProtocol for ReactiveProtocol {
    fn name(&self) -> &'static str {
        "reactive"
    }

    fn next_hop(&mut self, here: NodeId, dst: NodeId, reach: &Reachability) -> Option<NodeId> {
        if here == dst {
            return None;
        }
        if let Some(&nh) = self.cache.get(&dst) {
            return Some(nh);
        }
        let nh = self.discover(here, dst, reach)?;
        self.cache.insert(dst, nh);
        Some(nh)
    }

    fn maintain(&mut self, _now: SimTime) {
        // 反应式协议不保鲜：清空缓存，下次查询重新发现
        self.cache.clear();
    }

    fn table_dump(&self) -> String {
        let mut entries: Vec<(&NodeId, &NodeId)> = self.cache.iter().collect();
        entries.sort();

        let mut out = String::new();
        out.push_str("dst\tnext-hop\n");
        for (dst, nh) in entries {
            out.push_str(&format!("{}\t{}\n", dst.0, nh.0));
        }
        out.push_str(&format!("({} cached, {} discoveries)\n", self.cache.len(), self.discoveries));
        out
    }
}
