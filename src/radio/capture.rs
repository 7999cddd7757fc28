//! 抓包 sink
//!
//! 开启抓包模式时，每个设备把经手的帧记录到一个外部 sink。
//! 写入机制是协作者的职责；写失败不致命，静默丢弃该条记录。

use super::frame::Frame;
use crate::sim::SimTime;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::warn;

/// 抓包 sink：按设备记录收发的帧。
pub trait CaptureSink: Send {
    fn record(&mut self, now: SimTime, frame: &Frame);
}

/// 经典 pcap 格式的文件写入器，每个设备一个文件。
///
/// 帧内容本身是不透明负载，这里写入一个合成头
/// （源/目的地址、端口、创建时间戳），orig_len 记录真实负载大小。
pub struct PcapWriter {
    w: BufWriter<File>,
    failed: bool,
}

/// pcap 链路类型：IEEE 802.11 无线帧。
const LINKTYPE_IEEE802_11: u32 = 105;

impl PcapWriter {
    /// 创建文件并写入 pcap 全局头。
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let mut w = BufWriter::new(File::create(path)?);
        w.write_all(&0xa1b2_c3d4u32.to_le_bytes())?; // magic
        w.write_all(&2u16.to_le_bytes())?; // version major
        w.write_all(&4u16.to_le_bytes())?; // version minor
        w.write_all(&0i32.to_le_bytes())?; // thiszone
        w.write_all(&0u32.to_le_bytes())?; // sigfigs
        w.write_all(&65_535u32.to_le_bytes())?; // snaplen
        w.write_all(&LINKTYPE_IEEE802_11.to_le_bytes())?;
        Ok(Self { w, failed: false })
    }

    fn try_record(&mut self, now: SimTime, frame: &Frame) -> io::Result<()> {
        let ts_sec = (now.0 / 1_000_000_000) as u32;
        let ts_usec = ((now.0 % 1_000_000_000) / 1_000) as u32;

        let mut body = Vec::with_capacity(18);
        body.extend_from_slice(&frame.pkt.src.octets());
        body.extend_from_slice(&frame.pkt.dst.octets());
        body.extend_from_slice(&frame.pkt.dst_port.to_be_bytes());
        body.extend_from_slice(&frame.pkt.created.0.to_be_bytes());

        self.w.write_all(&ts_sec.to_le_bytes())?;
        self.w.write_all(&ts_usec.to_le_bytes())?;
        self.w.write_all(&(body.len() as u32).to_le_bytes())?;
        self.w.write_all(&frame.pkt.size_bytes.to_le_bytes())?;
        self.w.write_all(&body)?;
        self.w.flush()
    }
}

impl CaptureSink for PcapWriter {
    fn record(&mut self, now: SimTime, frame: &Frame) {
        if self.failed {
            return;
        }
        if let Err(e) = self.try_record(now, frame) {
            // 只警告一次，之后静默丢弃
            warn!(error = %e, "抓包写入失败，停止记录");
            self.failed = true;
        }
    }
}
