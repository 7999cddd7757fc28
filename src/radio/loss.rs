//! 丢包策略
//!
//! 信道交付可以失败（帧丢失）。策略可插拔；默认无损，保证测试确定性。

use super::frame::Frame;
use crate::sim::SimTime;

/// 丢包策略：判定一帧是否在信道上丢失。
///
/// 实现必须是确定性的（或使用自带的固定种子），整个运行才可复现。
pub trait LossPolicy: Send {
    fn should_drop(&mut self, frame: &Frame, distance_m: f64, now: SimTime) -> bool;
}

/// 默认策略：永不丢帧。
#[derive(Debug, Default)]
pub struct Lossless;

impl LossPolicy for Lossless {
    fn should_drop(&mut self, _frame: &Frame, _distance_m: f64, _now: SimTime) -> bool {
        false
    }
}

/// 确定性周期丢帧：每第 n 帧丢一帧。
#[derive(Debug)]
pub struct DropEveryNth {
    n: u64,
    seen: u64,
}

impl DropEveryNth {
    pub fn new(n: u64) -> Self {
        Self { n: n.max(1), seen: 0 }
    }
}

impl LossPolicy for DropEveryNth {
    fn should_drop(&mut self, _frame: &Frame, _distance_m: f64, _now: SimTime) -> bool {
        self.seen += 1;
        self.seen % self.n == 0
    }
}
