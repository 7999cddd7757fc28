use super::util::SharedBuf;
use crate::net::NodeId;
use crate::sim::SimTime;
use crate::trace::{TraceBus, TraceCollector, TraceEvent, TraceHandler};
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

#[test]
fn tx_events_format_like_the_source_trace() {
    let buf = SharedBuf::default();
    let mut collector = TraceCollector::new(Box::new(buf.clone()));

    collector.on_trace(&TraceEvent::Tx {
        at: SimTime::from_secs_f64(1.60094),
        src: Ipv4Addr::new(10, 0, 0, 1),
        dst: Ipv4Addr::new(10, 0, 0, 4),
    });

    assert_eq!(
        buf.contents(),
        "1.60094 source 10.0.0.1 send to dest 10.0.0.4\n"
    );
}

#[test]
fn rx_events_format_with_and_without_source() {
    let buf = SharedBuf::default();
    let mut collector = TraceCollector::new(Box::new(buf.clone()));

    collector.on_trace(&TraceEvent::Rx {
        at: SimTime::from_secs(2),
        node: NodeId(3),
        src: Some(Ipv4Addr::new(10, 0, 0, 1)),
    });
    collector.on_trace(&TraceEvent::Rx {
        at: SimTime::from_secs_f64(2.5),
        node: NodeId(3),
        src: None,
    });

    assert_eq!(
        buf.contents(),
        "2 3 received one packet from 10.0.0.1\n2.5 3 received one packet!\n"
    );
}

struct Counter(Arc<Mutex<usize>>);

impl TraceHandler for Counter {
    fn on_trace(&mut self, _ev: &TraceEvent) {
        *self.0.lock().expect("counter lock") += 1;
    }
}

#[test]
fn bus_dispatches_to_every_registered_handler() {
    let count = Arc::new(Mutex::new(0));
    let buf = SharedBuf::default();

    let mut bus = TraceBus::default();
    bus.register(Box::new(Counter(Arc::clone(&count))));
    bus.register(Box::new(TraceCollector::new(Box::new(buf.clone()))));
    assert_eq!(bus.handler_count(), 2);

    let ev = TraceEvent::Tx {
        at: SimTime::from_secs(1),
        src: Ipv4Addr::new(10, 0, 0, 1),
        dst: Ipv4Addr::new(10, 0, 0, 2),
    };
    bus.emit(&ev);
    bus.emit(&ev);

    assert_eq!(*count.lock().expect("counter lock"), 2);
    assert_eq!(buf.contents().lines().count(), 2);
}
