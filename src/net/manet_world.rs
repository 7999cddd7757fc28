//! 无线仿真世界
//!
//! 仿真的 setup 上下文与运行期世界：持有节点注册表、共享信道、
//! 地址分配表、trace 总线、流状态与统计。所有这些在 setup 阶段
//! 构造一次并按引用传入各组件；调度器启动之后只追加事件与数据包，
//! 不再变更共享拓扑状态。

use super::addr::AddressAssignment;
use super::id::NodeId;
use super::node::Node;
use super::packet::Packet;
use super::position::Position;
use super::stats::Stats;
use crate::app::FlowState;
use crate::radio::{Channel, DeliverFrame, Frame, MediumReady};
use crate::sim::{SimTime, Simulator, World};
use crate::trace::{TraceBus, TraceEvent};
use std::any::Any;
use std::net::Ipv4Addr;
use tracing::{debug, info, trace};

/// 无线仿真世界
pub struct ManetWorld {
    // 取出/放回模式：派发时临时取出节点，避免 &mut self 与 &mut node 重叠借用
    nodes: Vec<Option<Node>>,
    pub channel: Channel,
    pub assignment: AddressAssignment,
    pub bus: TraceBus,
    pub stats: Stats,
    pub(crate) flows: Vec<FlowState>,
    next_pkt_id: u64,
}

impl std::fmt::Debug for ManetWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManetWorld")
            .field("node_count", &self.nodes.len())
            .field("flow_count", &self.flows.len())
            .field("next_pkt_id", &self.next_pkt_id)
            .finish_non_exhaustive()
    }
}

impl ManetWorld {
    pub fn new(channel: Channel) -> Self {
        Self {
            nodes: Vec::new(),
            channel,
            assignment: AddressAssignment::default(),
            bus: TraceBus::default(),
            stats: Stats::default(),
            flows: Vec::new(),
            next_pkt_id: 0,
        }
    }

    /// 添加一个节点。
    pub fn add_node(&mut self, name: impl Into<String>, pos: Position) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node::new(id, name, pos)));
        id
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.0].as_ref().expect("node exists")
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.0].as_mut().expect("node exists")
    }

    /// 全部节点位置，按节点编号排列。用于冻结信道可达图。
    pub fn positions(&self) -> Vec<Position> {
        self.node_ids().map(|id| self.node(id).pos()).collect()
    }

    /// 创建数据包。
    pub fn make_packet(
        &mut self,
        flow_id: u64,
        size_bytes: u32,
        src: Ipv4Addr,
        dst: Ipv4Addr,
        dst_port: u16,
        created: SimTime,
    ) -> Packet {
        let id = self.next_pkt_id;
        self.next_pkt_id = self.next_pkt_id.wrapping_add(1);
        Packet {
            id,
            flow_id,
            size_bytes,
            src,
            dst,
            dst_port,
            created,
        }
    }

    /// 源端发送：查路由，交给介质。无路由或目的地址未知时丢包（不重试）。
    #[tracing::instrument(skip(self, sim, pkt), fields(pkt_id = pkt.id, from = ?from, dst = %pkt.dst))]
    pub fn send_packet(&mut self, from: NodeId, pkt: Packet, sim: &mut Simulator) {
        let Some(dst_node) = self.assignment.node_of(pkt.dst) else {
            debug!("目的地址未知，丢包");
            self.stats.dropped_pkts += 1;
            return;
        };

        let mut node = self.nodes[from.0].take().expect("node exists");
        let nh = node
            .protocol_mut()
            .next_hop(from, dst_node, self.channel.reachability());
        self.nodes[from.0] = Some(node);

        match nh {
            Some(nh) => {
                trace!(next_hop = ?nh, "查到下一跳");
                self.transmit_to(from, nh, pkt, sim);
            }
            None => {
                debug!("无路由，丢包");
                self.stats.dropped_pkts += 1;
            }
        }
    }

    /// 把数据包封装成帧交给共享介质。介质忙则排队，队满则丢帧。
    pub(crate) fn transmit_to(
        &mut self,
        from: NodeId,
        to: NodeId,
        pkt: Packet,
        sim: &mut Simulator,
    ) {
        let frame = Frame {
            from: self.channel.device_of(from),
            to: self.channel.device_of(to),
            pkt,
        };

        if self.channel.busy(sim.now()) {
            trace!(busy_until = ?self.channel.busy_until(), "介质忙，帧入队");
            if self.channel.enqueue_pending(frame).is_err() {
                debug!("发送队列溢出，丢帧");
                self.stats.dropped_frames += 1;
            }
        } else {
            self.start_frame(frame, sim);
        }
    }

    /// 开始在介质上序列化一帧：占用介质、记录抓包、调度到达事件。
    ///
    /// 超出射程或被丢包策略判丢的帧不产生到达事件（静默丢失，仿真继续）。
    pub(crate) fn start_frame(&mut self, frame: Frame, sim: &mut Simulator) {
        let now = sim.now();
        let depart = now.saturating_add(self.channel.tx_time(frame.pkt.size_bytes));
        self.channel.set_busy_until(depart);

        if let Some(cap) = self.channel.device_mut(frame.from).capture_mut() {
            cap.record(now, &frame);
        }

        sim.schedule(depart, MediumReady);

        let from_node = self.channel.device(frame.from).owner();
        let to_node = self.channel.device(frame.to).owner();
        let dist = self.channel.distance(from_node, to_node);

        if dist > self.channel.max_range_m() {
            debug!(dist_m = dist, "超出射程，丢帧");
            self.stats.dropped_frames += 1;
            return;
        }
        if self.channel.should_drop(&frame, dist, now) {
            debug!("丢包策略判丢");
            self.stats.dropped_frames += 1;
            return;
        }

        let arrive = depart.saturating_add(self.channel.prop_delay(dist));
        trace!(depart = ?depart, arrive = ?arrive, "调度帧到达事件");
        sim.schedule(arrive, DeliverFrame { frame });
    }

    /// 介质空闲：发送队列里的下一帧（若有）上介质。
    pub(crate) fn medium_ready(&mut self, sim: &mut Simulator) {
        if let Some(frame) = self.channel.dequeue_pending() {
            trace!(pending = self.channel.pending_len(), "介质空闲，发送队列出队");
            self.start_frame(frame, sim);
        }
    }

    /// 帧到达接收设备：本机地址则交付套接字，否则继续转发。
    pub(crate) fn deliver_frame(&mut self, frame: Frame, sim: &mut Simulator) {
        let now = sim.now();
        let to_node = self.channel.device(frame.to).owner();

        if let Some(cap) = self.channel.device_mut(frame.to).capture_mut() {
            cap.record(now, &frame);
        }

        let mut node = self.nodes[to_node.0].take().expect("node exists");
        let pkt = frame.pkt;

        if node.addr() == Some(pkt.dst) {
            if node.has_socket(pkt.dst_port) {
                info!(node = ?to_node, pkt_id = pkt.id, "✅ 数据包送达汇聚端");
                self.stats.received_pkts += 1;
                // 源地址解析失败时 trace 行退化为无源形式
                let src = self.assignment.node_of(pkt.src).map(|_| pkt.src);
                self.bus.emit(&TraceEvent::Rx {
                    at: now,
                    node: to_node,
                    src,
                });
            } else {
                debug!(port = pkt.dst_port, "端口未绑定，丢包");
                self.stats.dropped_pkts += 1;
            }
            self.nodes[to_node.0] = Some(node);
            return;
        }

        // 中继：转发钩子 + 查下一跳
        match self.assignment.node_of(pkt.dst) {
            Some(dst_node) => {
                let proto = node.protocol_mut();
                proto.on_forward(&pkt);
                match proto.next_hop(to_node, dst_node, self.channel.reachability()) {
                    Some(nh) => {
                        trace!(at = ?to_node, next_hop = ?nh, "中继转发");
                        self.stats.forwarded_pkts += 1;
                        self.nodes[to_node.0] = Some(node);
                        self.transmit_to(to_node, nh, pkt, sim);
                        return;
                    }
                    None => {
                        debug!("中继无路由，丢包");
                        self.stats.dropped_pkts += 1;
                    }
                }
            }
            None => {
                debug!("中继遇到未知目的地址，丢包");
                self.stats.dropped_pkts += 1;
            }
        }
        self.nodes[to_node.0] = Some(node);
    }

    /// 触发一轮全节点路由维护。
    pub(crate) fn maintain_routes(&mut self, now: SimTime) {
        for i in 0..self.nodes.len() {
            let mut node = self.nodes[i].take().expect("node exists");
            node.protocol_mut().maintain(now);
            self.nodes[i] = Some(node);
        }
    }
}

impl World for ManetWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
