//! 仿真器
//!
//! 定义事件驱动仿真器，维护当前时间、事件队列与取消集合。

use super::event::Event;
use super::scheduled_event::ScheduledEvent;
use super::time::SimTime;
use super::world::World;
use std::collections::{BinaryHeap, HashSet};
use tracing::{debug, info, trace};

/// 事件句柄：由 `schedule` 返回，可在派发前取消对应事件。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle(u64);

/// 事件驱动仿真器：维护当前时间与事件队列。
#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    q: BinaryHeap<ScheduledEvent>,
    cancelled: HashSet<u64>,
    horizon: Option<SimTime>,
}

impl Simulator {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 调度事件在指定时间执行，返回可用于取消的句柄。
    ///
    /// 调度时间早于当前时间的事件被钳制到当前时间（派发时间单调不减）；
    /// 超出 `run_until` 时间窗口的事件被静默丢弃，永远不会派发。
    #[tracing::instrument(skip(self, ev), fields(event_type = std::any::type_name::<E>(), schedule_at = ?at))]
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) -> EventHandle {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);

        let at = at.max(self.now);
        if let Some(h) = self.horizon {
            if at > h {
                debug!(horizon = ?h, "事件超出时间窗口，丢弃");
                return EventHandle(seq);
            }
        }

        trace!(now = ?self.now, seq, "调度事件");
        self.q.push(ScheduledEvent {
            at,
            seq,
            ev: Box::new(ev),
        });

        debug!(queue_size = self.q.len(), "事件已加入队列");
        EventHandle(seq)
    }

    /// 取消一个尚未派发的事件。
    ///
    /// 纯结构性移除：重复取消、或取消已派发/已丢弃的事件都是 no-op。
    pub fn cancel(&mut self, handle: EventHandle) {
        trace!(seq = handle.0, "取消事件");
        self.cancelled.insert(handle.0);
    }

    /// 运行直到事件队列为空或到达 `until`。
    ///
    /// 时间超过 `until` 的事件不会被派发；结束时当前时间推进到 `until`。
    #[tracing::instrument(skip(self, world))]
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) {
        info!(until = ?until, "▶️  开始运行仿真");
        debug!(now = ?self.now, queue_size = self.q.len(), "初始状态");
        self.horizon = Some(until);

        let mut event_count = 0u64;
        while let Some(item) = self.q.pop() {
            if self.cancelled.remove(&item.seq) {
                trace!(seq = item.seq, "跳过已取消事件");
                continue;
            }
            if item.at > until {
                trace!(seq = item.seq, at = ?item.at, "丢弃超出窗口的事件");
                continue;
            }

            event_count += 1;
            self.now = item.at;

            debug!(
                event_num = event_count,
                now = ?self.now,
                seq = item.seq,
                remaining_queue = self.q.len(),
                "执行事件"
            );

            item.ev.execute(self, world);
            world.on_tick(self);
        }

        self.now = self.now.max(until);
        info!(
            total_events = event_count,
            final_time = ?self.now,
            "✅ 仿真完成"
        );
    }
}
