//! on/off 流量发生器
//!
//! 每个场景恰好一条被测流：源节点在 on 期内按固定间隔向汇聚地址
//! 发送定长数据包，off 期内静默，按配置的占空比交替。
//! 启动时间从有界随机分布抽取（避免人为同步），由外部传入的
//! 种子化随机数发生器决定；停止时间是固定配置值。

use crate::net::{FlowId, ManetWorld, NodeId, SINK_PORT};
use crate::sim::{Event, EventHandle, SimTime, Simulator, World};
use crate::trace::TraceEvent;
use rand::Rng;
use std::net::Ipv4Addr;
use tracing::{debug, info, trace};

/// 默认数据包大小（字节）。
pub const DEFAULT_PKT_BYTES: u32 = 512;
/// 默认发送速率（bit/s），决定包间隔。
pub const DEFAULT_RATE_BPS: u64 = 500_000;

/// 按速率换算包间隔。
pub fn interval_for(pkt_bytes: u32, rate_bps: u64) -> SimTime {
    if rate_bps == 0 {
        return SimTime(u64::MAX / 4);
    }
    let bits = (pkt_bytes as u128).saturating_mul(8);
    let nanos = bits.saturating_mul(1_000_000_000u128) / rate_bps as u128;
    SimTime(nanos.min(u64::MAX as u128) as u64)
}

/// 一条流的配置。
#[derive(Debug, Clone)]
pub struct FlowOpts {
    pub src: NodeId,
    pub dst: Ipv4Addr,
    pub dst_port: u16,
    pub pkt_bytes: u32,
    /// on 期内的包间隔
    pub interval: SimTime,
    pub on_duration: SimTime,
    pub off_duration: SimTime,
    /// 启动时间下界（秒）
    pub start_min_s: f64,
    /// 启动时间上界（秒，不含）
    pub start_max_s: f64,
    pub stop: SimTime,
}

impl FlowOpts {
    /// 默认场景：512 字节、500 kbit/s、常开（on=1s/off=0），
    /// 启动在 [1.0, 2.0) 秒内抽取，10 秒停止。
    pub fn new(src: NodeId, dst: Ipv4Addr) -> Self {
        Self {
            src,
            dst,
            dst_port: SINK_PORT,
            pkt_bytes: DEFAULT_PKT_BYTES,
            interval: interval_for(DEFAULT_PKT_BYTES, DEFAULT_RATE_BPS),
            on_duration: SimTime::from_secs(1),
            off_duration: SimTime::ZERO,
            start_min_s: 1.0,
            start_max_s: 2.0,
            stop: SimTime::from_secs(10),
        }
    }
}

/// 一条流的运行期状态。
pub struct FlowState {
    pub id: FlowId,
    pub opts: FlowOpts,
    /// 实际抽到的启动时刻
    pub start: SimTime,
    pub stopped: bool,
    pub sent: u64,
    pub(crate) pending_send: Option<EventHandle>,
}

/// 创建一条流并调度它的启动/停止事件。返回流句柄。
///
/// 随机性只来自传入的 `rng`：由外层 harness 持有并用固定种子初始化。
pub fn schedule_flow(
    sim: &mut Simulator,
    world: &mut ManetWorld,
    opts: FlowOpts,
    rng: &mut impl Rng,
) -> FlowId {
    let start_s = if opts.start_max_s > opts.start_min_s {
        rng.gen_range(opts.start_min_s..opts.start_max_s)
    } else {
        opts.start_min_s
    };
    let start = SimTime::from_secs_f64(start_s);
    let stop = opts.stop;

    let id = FlowId(world.flows.len());
    info!(flow = ?id, src = ?opts.src, dst = %opts.dst, start = ?start, stop = ?stop, "🚿 创建流");

    world.flows.push(FlowState {
        id,
        opts,
        start,
        stopped: false,
        sent: 0,
        pending_send: None,
    });

    sim.schedule(start, StartFlow { flow: id });
    sim.schedule(stop, StopFlow { flow: id });
    id
}

/// 发送一个包并调度下一次发送。on/off 占空比在这里推进。
fn send_next(world: &mut ManetWorld, sim: &mut Simulator, flow: FlowId) {
    let now = sim.now();
    let (src, dst, port, bytes, interval, on, off, start, stop, stopped) = {
        let f = &world.flows[flow.0];
        (
            f.opts.src,
            f.opts.dst,
            f.opts.dst_port,
            f.opts.pkt_bytes,
            f.opts.interval,
            f.opts.on_duration,
            f.opts.off_duration,
            f.start,
            f.opts.stop,
            f.stopped,
        )
    };

    if stopped || now >= stop {
        return;
    }

    // off 期：推迟到下个 on 周期开始，不发包
    let cycle = on.0.saturating_add(off.0);
    if off.0 > 0 && cycle > 0 {
        let elapsed = now.0.saturating_sub(start.0);
        let pos = elapsed % cycle;
        if pos >= on.0 {
            let next_on = start.0.saturating_add((elapsed / cycle + 1).saturating_mul(cycle));
            trace!(flow = ?flow, next_on, "off 期静默");
            let h = sim.schedule(SimTime(next_on), SendPacket { flow });
            world.flows[flow.0].pending_send = Some(h);
            return;
        }
    }

    let Some(src_addr) = world.node(src).addr() else {
        debug!(flow = ?flow, "源节点无地址，丢包");
        world.stats.dropped_pkts += 1;
        return;
    };

    let pkt = world.make_packet(flow.0 as u64, bytes, src_addr, dst, port, now);
    world.stats.sent_pkts += 1;
    world.flows[flow.0].sent += 1;
    world.bus.emit(&TraceEvent::Tx {
        at: now,
        src: src_addr,
        dst,
    });
    world.send_packet(src, pkt, sim);

    let next = now.saturating_add(interval);
    world.flows[flow.0].pending_send = if next < stop {
        Some(sim.schedule(next, SendPacket { flow }))
    } else {
        None
    };
}

/// 事件：流启动，发出第一个包。
#[derive(Debug)]
pub struct StartFlow {
    pub flow: FlowId,
}

impl Event for StartFlow {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let StartFlow { flow } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<ManetWorld>()
            .expect("world must be ManetWorld");
        info!(flow = ?flow, now = ?sim.now(), "流启动");
        send_next(w, sim, flow);
    }
}

/// 事件：周期发送。
#[derive(Debug)]
pub struct SendPacket {
    pub flow: FlowId,
}

impl Event for SendPacket {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let SendPacket { flow } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<ManetWorld>()
            .expect("world must be ManetWorld");
        send_next(w, sim, flow);
    }
}

/// 事件：流停止。取消挂起的发送事件，流由此终止。
#[derive(Debug)]
pub struct StopFlow {
    pub flow: FlowId,
}

impl Event for StopFlow {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let StopFlow { flow } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<ManetWorld>()
            .expect("world must be ManetWorld");

        let f = &mut w.flows[flow.0];
        f.stopped = true;
        if let Some(h) = f.pending_send.take() {
            sim.cancel(h);
        }
        info!(flow = ?flow, sent = f.sent, now = ?sim.now(), "🛑 流停止");
    }
}
