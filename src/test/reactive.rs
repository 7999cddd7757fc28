use crate::net::{NodeId, Position};
use crate::radio::Channel;
use crate::route::{ProtocolRegistry, ReactiveProtocol, RoutingProtocol};
use crate::sim::SimTime;

fn line_reach(n: usize, step: f64, range: f64) -> Channel {
    let mut ch = Channel::new(6_000_000, range);
    let positions: Vec<Position> = (0..n).map(|i| Position::new(i as f64 * step, 0.0)).collect();
    for i in 0..n {
        ch.attach(NodeId(i));
    }
    ch.freeze(&positions);
    ch
}

#[test]
fn discovers_next_hop_towards_destination_on_demand() {
    let ch = line_reach(4, 100.0, 150.0);
    let mut proto = ReactiveProtocol::new();

    assert_eq!(proto.cached_routes(), 0);
    let nh = proto.next_hop(NodeId(0), NodeId(3), ch.reachability());
    assert_eq!(nh, Some(NodeId(1)));
    assert_eq!(proto.discoveries(), 1);
    assert_eq!(proto.cached_routes(), 1);
}

#[test]
fn cached_route_skips_rediscovery() {
    let ch = line_reach(4, 100.0, 150.0);
    let mut proto = ReactiveProtocol::new();

    let first = proto.next_hop(NodeId(1), NodeId(3), ch.reachability());
    let second = proto.next_hop(NodeId(1), NodeId(3), ch.reachability());
    assert_eq!(first, Some(NodeId(2)));
    assert_eq!(second, Some(NodeId(2)));
    assert_eq!(proto.discoveries(), 1);
}

#[test]
fn maintain_clears_the_route_cache() {
    let ch = line_reach(3, 100.0, 150.0);
    let mut proto = ReactiveProtocol::new();

    proto.next_hop(NodeId(0), NodeId(2), ch.reachability());
    assert_eq!(proto.cached_routes(), 1);

    proto.maintain(SimTime::from_secs(1));
    assert_eq!(proto.cached_routes(), 0);

    // 下一次查询重新发现
    let nh = proto.next_hop(NodeId(0), NodeId(2), ch.reachability());
    assert_eq!(nh, Some(NodeId(1)));
    assert_eq!(proto.discoveries(), 2);
}

#[test]
fn unreachable_destination_has_no_route() {
    // 间距大于射程：全图无边
    let ch = line_reach(3, 400.0, 150.0);
    let mut proto = ReactiveProtocol::new();

    assert_eq!(proto.next_hop(NodeId(0), NodeId(2), ch.reachability()), None);
    assert_eq!(proto.discoveries(), 0);
    assert_eq!(proto.cached_routes(), 0);
}

#[test]
fn next_hop_to_self_is_none() {
    let ch = line_reach(2, 100.0, 150.0);
    let mut proto = ReactiveProtocol::new();
    assert_eq!(proto.next_hop(NodeId(0), NodeId(0), ch.reachability()), None);
}

#[test]
fn table_dump_lists_cached_entries() {
    let ch = line_reach(3, 100.0, 150.0);
    let mut proto = ReactiveProtocol::new();
    proto.next_hop(NodeId(0), NodeId(2), ch.reachability());

    let dump = proto.table_dump();
    assert!(dump.contains("dst\tnext-hop"));
    assert!(dump.contains("2\t1"));
    assert!(dump.contains("(1 cached, 1 discoveries)"));
}

#[test]
fn registry_creates_registered_protocols_by_name() {
    let registry = ProtocolRegistry::with_defaults();
    assert!(registry.contains("reactive"));
    assert!(!registry.contains("osmium"));

    let proto = registry.create("reactive").expect("registered");
    assert_eq!(proto.name(), "reactive");
    assert!(registry.create("osmium").is_none());
}
