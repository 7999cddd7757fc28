//! 网格拓扑构建
//!
//! 按行优先顺序把 N 个节点放在固定间距的格点上。
//! 行宽缺省等于 N，即退化为一维直线。

use crate::net::{ManetWorld, NodeId, Position};
use tracing::info;

/// 网格拓扑配置选项
#[derive(Debug, Clone)]
pub struct GridOpts {
    /// 节点数
    pub size: usize,
    /// 格点间距（米）
    pub step: f64,
    /// 行宽。None 表示等于 size（一维直线）。
    pub width: Option<usize>,
}

impl Default for GridOpts {
    fn default() -> Self {
        Self {
            size: 10,
            step: 100.0,
            width: None,
        }
    }
}

/// 构建网格拓扑
///
/// 节点 i 位于 ((i mod W)·step, (i div W)·step)，命名为 node-i。
/// size = 0 产生空拓扑（合法的退化情形，下游组件不得因此崩溃）。
pub fn build_grid(world: &mut ManetWorld, opts: &GridOpts) -> Vec<NodeId> {
    info!(size = opts.size, step_m = opts.step, "创建节点");

    let w = opts.width.unwrap_or(opts.size).max(1);
    let mut ids = Vec::with_capacity(opts.size);
    for i in 0..opts.size {
        let pos = Position::new((i % w) as f64 * opts.step, (i / w) as f64 * opts.step);
        let id = world.add_node(format!("node-{i}"), pos);
        ids.push(id);
    }
    ids
}
