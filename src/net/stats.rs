//! 统计信息
//!
//! 定义整个运行期间的收发/丢弃计数。

/// 运行统计
#[derive(Debug, Default)]
pub struct Stats {
    /// 源端成功发出的数据包数
    pub sent_pkts: u64,
    /// 中间节点转发的数据包数
    pub forwarded_pkts: u64,
    /// 汇聚端套接字收到的数据包数
    pub received_pkts: u64,
    /// 包级丢弃（无路由、目的地址未知、端口未绑定）
    pub dropped_pkts: u64,
    /// 帧级丢弃（超出射程、丢包策略、发送队列溢出）
    pub dropped_frames: u64,
}
