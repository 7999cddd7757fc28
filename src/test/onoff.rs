use super::util::SharedBuf;
use crate::app::{schedule_flow, FlowOpts, StopFlow};
use crate::net::{install_stack, ManetWorld, NodeId, SINK_PORT};
use crate::radio::{Channel, DropEveryNth};
use crate::route::ProtocolRegistry;
use crate::sim::{SimTime, Simulator};
use crate::topo::{build_grid, GridOpts};
use crate::trace::TraceCollector;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::net::Ipv4Addr;

fn mini_world(n: usize, step: f64) -> (Simulator, ManetWorld, SharedBuf) {
    let sim = Simulator::default();
    let mut world = ManetWorld::new(Channel::new(6_000_000, 150.0));
    let ids = build_grid(
        &mut world,
        &GridOpts {
            size: n,
            step,
            width: None,
        },
    );
    for &id in &ids {
        let dev = world.channel.attach(id);
        world.node_mut(id).set_device(dev);
    }
    let positions = world.positions();
    world.channel.freeze(&positions);
    install_stack(
        &mut world,
        Ipv4Addr::new(10, 0, 0, 0),
        Ipv4Addr::new(255, 0, 0, 0),
        "reactive",
        &ProtocolRegistry::with_defaults(),
    )
    .expect("install succeeds");
    for &id in &ids {
        world.node_mut(id).bind(SINK_PORT).expect("bind succeeds");
    }

    let buf = SharedBuf::default();
    world
        .bus
        .register(Box::new(TraceCollector::new(Box::new(buf.clone()))));
    (sim, world, buf)
}

fn fixed_flow(world: &ManetWorld, start_s: f64, stop_s: f64, interval: SimTime) -> FlowOpts {
    let sink = NodeId(world.node_count() - 1);
    let dst = world.assignment.addr_of(sink).expect("sink addr");
    let mut opts = FlowOpts::new(NodeId(0), dst);
    opts.interval = interval;
    opts.start_min_s = start_s;
    opts.start_max_s = start_s;
    opts.stop = SimTime::from_secs_f64(stop_s);
    opts
}

#[test]
fn always_on_flow_sends_at_fixed_interval_until_stop() {
    let (mut sim, mut world, buf) = mini_world(2, 100.0);
    let opts = fixed_flow(&world, 1.0, 2.0, SimTime::from_millis(500));

    let mut rng = StdRng::seed_from_u64(1);
    let flow = schedule_flow(&mut sim, &mut world, opts, &mut rng);
    sim.run_until(SimTime::from_secs(5), &mut world);

    // 1.0 与 1.5 两次发送；下一次 2.0 不早于 stop，不再调度
    assert_eq!(world.stats.sent_pkts, 2);
    assert_eq!(world.stats.received_pkts, 2);
    assert!(world.flows[flow.0].stopped);

    let out = buf.contents();
    let tx: Vec<&str> = out.lines().filter(|l| l.contains("send to dest")).collect();
    let rx: Vec<&str> = out
        .lines()
        .filter(|l| l.contains("received one packet"))
        .collect();
    assert_eq!(tx.len(), 2);
    assert_eq!(rx.len(), 2);
    assert!(out.lines().next().expect("first line").contains("send to dest"));
}

#[test]
fn duty_cycle_pauses_sending_during_off_period() {
    let (mut sim, mut world, _buf) = mini_world(2, 100.0);
    let mut opts = fixed_flow(&world, 1.0, 2.0, SimTime::from_millis(100));
    opts.on_duration = SimTime::from_millis(200);
    opts.off_duration = SimTime::from_millis(300);

    let mut rng = StdRng::seed_from_u64(1);
    schedule_flow(&mut sim, &mut world, opts, &mut rng);
    sim.run_until(SimTime::from_secs(5), &mut world);

    // on 期 [1.0,1.2) 与 [1.5,1.7)：1.0、1.1、1.5、1.6 四次发送
    assert_eq!(world.stats.sent_pkts, 4);
    assert_eq!(world.stats.received_pkts, 4);
}

#[test]
fn start_time_is_drawn_within_the_configured_bound() {
    let (mut sim, mut world, _buf) = mini_world(2, 100.0);
    let sink = NodeId(1);
    let dst = world.assignment.addr_of(sink).expect("sink addr");
    let opts = FlowOpts::new(NodeId(0), dst);

    let mut rng = StdRng::seed_from_u64(12345);
    let flow = schedule_flow(&mut sim, &mut world, opts, &mut rng);

    let start = world.flows[flow.0].start;
    assert!(start >= SimTime::from_secs(1));
    assert!(start < SimTime::from_secs(2));
    assert_eq!(world.flows[flow.0].opts.stop, SimTime::from_secs(10));
}

#[test]
fn early_stop_cancels_the_pending_send() {
    let (mut sim, mut world, _buf) = mini_world(2, 100.0);
    let opts = fixed_flow(&world, 1.0, 10.0, SimTime::from_millis(500));

    let mut rng = StdRng::seed_from_u64(1);
    let flow = schedule_flow(&mut sim, &mut world, opts, &mut rng);
    // 在 1.0 的首次发送之后、1.5 的下一次发送之前强行停流
    sim.schedule(SimTime::from_millis(1_200), StopFlow { flow });
    sim.run_until(SimTime::from_secs(5), &mut world);

    assert_eq!(world.stats.sent_pkts, 1);
    assert!(world.flows[flow.0].stopped);
    assert_eq!(world.flows[flow.0].sent, 1);
}

#[test]
fn flow_without_route_drops_every_packet() {
    // 间距 200 m 超出射程：两节点互不可达
    let (mut sim, mut world, buf) = mini_world(2, 200.0);
    let opts = fixed_flow(&world, 1.0, 1.35, SimTime::from_millis(100));

    let mut rng = StdRng::seed_from_u64(1);
    schedule_flow(&mut sim, &mut world, opts, &mut rng);
    sim.run_until(SimTime::from_secs(3), &mut world);

    assert_eq!(world.stats.sent_pkts, 4);
    assert_eq!(world.stats.received_pkts, 0);
    assert_eq!(world.stats.dropped_pkts, 4);

    // 发送 trace 照常产生，接收 trace 不产生
    let out = buf.contents();
    assert_eq!(out.lines().filter(|l| l.contains("send to dest")).count(), 4);
    assert_eq!(
        out.lines().filter(|l| l.contains("received one packet")).count(),
        0
    );
}

#[test]
fn lossy_channel_drops_frames_without_crashing_the_run() {
    let (mut sim, mut world, _buf) = mini_world(2, 100.0);
    world
        .channel
        .set_loss_policy(Box::new(DropEveryNth::new(2)));
    let opts = fixed_flow(&world, 1.0, 1.35, SimTime::from_millis(100));

    let mut rng = StdRng::seed_from_u64(1);
    schedule_flow(&mut sim, &mut world, opts, &mut rng);
    sim.run_until(SimTime::from_secs(3), &mut world);

    // 四帧里第 2、4 帧被判丢
    assert_eq!(world.stats.sent_pkts, 4);
    assert_eq!(world.stats.dropped_frames, 2);
    assert_eq!(world.stats.received_pkts, 2);
}
