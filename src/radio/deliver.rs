//! 帧交付事件
//!
//! 定义共享介质上的两类事件：帧到达接收设备、介质空闲驱动队列出队。

use super::frame::Frame;
use crate::net::ManetWorld;
use crate::sim::{Event, Simulator, World};
use tracing::{debug, trace};

/// 事件：一帧经过序列化与传播后到达接收设备。
#[derive(Debug)]
pub struct DeliverFrame {
    pub frame: Frame,
}

impl Event for DeliverFrame {
    #[tracing::instrument(skip(self, sim, world), fields(pkt_id = self.frame.pkt.id, to = ?self.frame.to))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DeliverFrame { frame } = *self;
        debug!(now = ?sim.now(), "📨 帧到达接收设备");

        let w = world
            .as_any_mut()
            .downcast_mut::<ManetWorld>()
            .expect("world must be ManetWorld");
        w.deliver_frame(frame, sim);

        trace!("DeliverFrame::execute 完成");
    }
}

/// 事件：介质完成一次序列化发送，在 depart 时刻尝试发送队列中的下一帧。
#[derive(Debug)]
pub struct MediumReady;

impl Event for MediumReady {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = world
            .as_any_mut()
            .downcast_mut::<ManetWorld>()
            .expect("world must be ManetWorld");
        w.medium_ready(sim);
    }
}
