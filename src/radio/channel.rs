//! 共享无线信道
//!
//! 所有设备挂接到同一个介质上。信道建模：
//! - 固定数据速率下的序列化时延（ceil(bytes*8 / bps)）
//! - 按距离的光速传播时延
//! - 载波侦听：介质一次只序列化一帧，忙时帧进入发送队列排队
//! - 可达性：距离超过通信半径的两端无法交换帧
//!
//! setup 结束后调用 `freeze` 冻结位置与可达图；运行期信道只追加
//! 帧与事件，不再变更拓扑状态。

use super::capture::CaptureSink;
use super::device::RadioDevice;
use super::frame::Frame;
use super::loss::{LossPolicy, Lossless};
use crate::net::{DeviceId, NodeId, Position};
use crate::sim::SimTime;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, trace};

/// 真空中光速（米/秒），用于传播时延。
const SPEED_OF_LIGHT_M_PER_S: f64 = 299_792_458.0;

/// 发送队列默认容量（字节）。
pub const DEFAULT_TX_QUEUE_BYTES: u64 = 64 * 1024;

/// 可达图：由节点位置与通信半径导出，freeze 之后只读。
#[derive(Debug, Default, Clone)]
pub struct Reachability {
    adj: Vec<Vec<NodeId>>,
}

impl Reachability {
    /// `n` 的直接邻居（按节点编号升序，保证确定性遍历）。
    pub fn neighbors(&self, n: NodeId) -> &[NodeId] {
        self.adj.get(n.0).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn reachable(&self, a: NodeId, b: NodeId) -> bool {
        self.neighbors(a).contains(&b)
    }

    pub fn len(&self) -> usize {
        self.adj.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adj.is_empty()
    }
}

/// 发送队列：尾丢弃，按字节计容量。
#[derive(Default)]
struct TxQueue {
    max_bytes: u64,
    cur_bytes: u64,
    q: VecDeque<Frame>,
}

impl TxQueue {
    fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            cur_bytes: 0,
            q: VecDeque::new(),
        }
    }

    /// 入队：容量不足时丢弃新帧，返回 Err(frame)。
    fn enqueue(&mut self, frame: Frame) -> Result<(), Frame> {
        let sz = frame.pkt.size_bytes as u64;
        if self.cur_bytes.saturating_add(sz) > self.max_bytes {
            return Err(frame);
        }
        self.cur_bytes = self.cur_bytes.saturating_add(sz);
        self.q.push_back(frame);
        Ok(())
    }

    fn dequeue(&mut self) -> Option<Frame> {
        let frame = self.q.pop_front()?;
        self.cur_bytes = self.cur_bytes.saturating_sub(frame.pkt.size_bytes as u64);
        Some(frame)
    }

    fn len(&self) -> usize {
        self.q.len()
    }
}

/// 共享无线信道
pub struct Channel {
    data_rate_bps: u64,
    max_range_m: f64,
    devices: Vec<RadioDevice>,
    device_of: HashMap<NodeId, DeviceId>,
    positions: Vec<Position>,
    reach: Reachability,
    busy_until: SimTime,
    pending: TxQueue,
    loss: Box<dyn LossPolicy>,
}

impl Channel {
    pub fn new(data_rate_bps: u64, max_range_m: f64) -> Self {
        Self {
            data_rate_bps,
            max_range_m,
            devices: Vec::new(),
            device_of: HashMap::new(),
            positions: Vec::new(),
            reach: Reachability::default(),
            busy_until: SimTime::ZERO,
            pending: TxQueue::new(DEFAULT_TX_QUEUE_BYTES),
            loss: Box::new(Lossless),
        }
    }

    /// 替换丢包策略。
    pub fn set_loss_policy(&mut self, loss: Box<dyn LossPolicy>) {
        self.loss = loss;
    }

    /// 为节点挂接一个无线设备，返回设备句柄。
    pub fn attach(&mut self, node: NodeId) -> DeviceId {
        let id = DeviceId(self.devices.len());
        trace!(node = ?node, device = ?id, "挂接无线设备");
        self.devices.push(RadioDevice::new(id, node));
        self.device_of.insert(node, id);
        id
    }

    /// 为设备开启抓包。
    pub fn enable_capture(&mut self, dev: DeviceId, sink: Box<dyn CaptureSink>) {
        self.devices[dev.0].set_capture(sink);
    }

    /// 冻结拓扑：记录位置并计算可达图。setup 的最后一步。
    pub fn freeze(&mut self, positions: &[Position]) {
        self.positions = positions.to_vec();
        let n = positions.len();
        let mut adj = vec![Vec::new(); n];
        for i in 0..n {
            for j in 0..n {
                if i != j && positions[i].distance(&positions[j]) <= self.max_range_m {
                    adj[i].push(NodeId(j));
                }
            }
        }
        self.reach = Reachability { adj };
        debug!(nodes = n, range_m = self.max_range_m, "可达图已冻结");
    }

    pub fn reachability(&self) -> &Reachability {
        &self.reach
    }

    pub fn device(&self, dev: DeviceId) -> &RadioDevice {
        &self.devices[dev.0]
    }

    pub(crate) fn device_mut(&mut self, dev: DeviceId) -> &mut RadioDevice {
        &mut self.devices[dev.0]
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// 节点的设备句柄。设备在 setup 阶段挂接，此处必然存在。
    pub fn device_of(&self, node: NodeId) -> DeviceId {
        *self.device_of.get(&node).expect("device attached")
    }

    /// 两节点间的距离（米）。
    pub fn distance(&self, a: NodeId, b: NodeId) -> f64 {
        self.positions[a.0].distance(&self.positions[b.0])
    }

    pub fn max_range_m(&self) -> f64 {
        self.max_range_m
    }

    /// 序列化指定字节数所需的时间。
    pub fn tx_time(&self, bytes: u32) -> SimTime {
        // ceil(bytes*8 / bps) 秒 -> 纳秒
        if self.data_rate_bps == 0 {
            return SimTime(u64::MAX / 4);
        }
        let bits = (bytes as u128).saturating_mul(8);
        let nanos = (bits.saturating_mul(1_000_000_000u128) + (self.data_rate_bps as u128 - 1))
            / self.data_rate_bps as u128;
        SimTime(nanos.min(u64::MAX as u128) as u64)
    }

    /// 按距离的传播时延。
    pub fn prop_delay(&self, meters: f64) -> SimTime {
        SimTime::from_secs_f64(meters / SPEED_OF_LIGHT_M_PER_S)
    }

    /// 介质是否正忙（载波侦听）。
    pub fn busy(&self, now: SimTime) -> bool {
        now < self.busy_until
    }

    pub fn busy_until(&self) -> SimTime {
        self.busy_until
    }

    pub(crate) fn set_busy_until(&mut self, t: SimTime) {
        self.busy_until = t;
    }

    pub(crate) fn enqueue_pending(&mut self, frame: Frame) -> Result<(), Frame> {
        self.pending.enqueue(frame)
    }

    pub(crate) fn dequeue_pending(&mut self) -> Option<Frame> {
        self.pending.dequeue()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// 丢包策略判定。
    pub(crate) fn should_drop(&mut self, frame: &Frame, distance_m: f64, now: SimTime) -> bool {
        self.loss.should_drop(frame, distance_m, now)
    }
}
