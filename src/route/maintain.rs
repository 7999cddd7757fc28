//! 路由维护事件
//!
//! 周期性调用每个节点路由协议的维护钩子。事件自我重调度，
//! 超出运行窗口的下一次触发由调度器静默丢弃。

use crate::net::ManetWorld;
use crate::sim::{Event, SimTime, Simulator, World};
use tracing::trace;

/// 事件：触发一轮路由维护，然后按间隔重调度自己。
#[derive(Debug)]
pub struct MaintainRoutes {
    pub interval: SimTime,
}

impl Event for MaintainRoutes {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let MaintainRoutes { interval } = *self;
        // 零间隔会在同一时刻无限重入
        if interval == SimTime::ZERO {
            return;
        }
        let w = world
            .as_any_mut()
            .downcast_mut::<ManetWorld>()
            .expect("world must be ManetWorld");

        let now = sim.now();
        trace!(now = ?now, "路由维护");
        w.maintain_routes(now);

        sim.schedule(now.saturating_add(interval), MaintainRoutes { interval });
    }
}
