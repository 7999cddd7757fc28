//! 场景装配
//!
//! 把各组件按固定顺序装配成一次完整的仿真运行：
//! 网格拓扑 -> 无线设备挂接 -> 协议栈安装 -> 汇聚端绑定 ->
//! trace 收集器注册 -> 流量调度 -> 单次 run_until。
//!
//! 配置既可来自命令行旗标，也可来自 JSON 场景文件；
//! 配置校验失败在任何拓扑构建之前中止。

use crate::app::{interval_for, schedule_flow, FlowOpts};
use crate::net::{install_stack, InstallError, ManetWorld, NodeId, SINK_PORT};
use crate::radio::{Channel, PcapWriter};
use crate::route::{DumpRoutes, MaintainRoutes, ProtocolRegistry};
use crate::sim::{SimTime, Simulator};
use crate::topo::{build_grid, GridOpts};
use crate::trace::TraceCollector;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// 场景配置错误。
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("grid step must be positive, got {0}")]
    NonPositiveStep(f64),
    #[error("simulation time must be positive, got {0}")]
    NonPositiveTime(f64),
    #[error("radio range must be positive, got {0}")]
    NonPositiveRange(f64),
    #[error(transparent)]
    Install(#[from] InstallError),
    #[error("cannot read scenario file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed scenario file: {0}")]
    Json(#[from] serde_json::Error),
}

/// 场景配置选项。缺省值即默认场景。
#[derive(Debug, Clone)]
pub struct ScenarioOpts {
    /// 节点数
    pub size: usize,
    /// 格点间距（米）
    pub step: f64,
    /// 仿真总时长（秒）
    pub total_time: f64,
    /// 是否按设备写抓包文件
    pub pcap: bool,
    /// 是否在固定时刻 dump 路由表
    pub print_routes: bool,
    /// 随机种子（决定流启动时间）
    pub seed: u64,
    /// 路由表 dump 输出文件
    pub routes_file: PathBuf,
    /// dump 时刻（秒）
    pub routes_at: f64,
    /// 抓包文件名前缀（"<prefix>-<node>.pcap"）
    pub pcap_prefix: String,
    /// 路由协议标识（注册表中的名字）
    pub protocol: String,
    /// 通信半径（米）
    pub range_m: f64,
    /// 信道数据速率（bit/s）
    pub data_rate_bps: u64,
    /// 路由维护间隔（秒），<= 0 表示禁用
    pub maintain_interval: f64,
    /// 子网基址与掩码
    pub subnet_base: Ipv4Addr,
    pub subnet_mask: Ipv4Addr,
    /// 流数据包大小（字节）
    pub pkt_bytes: u32,
    /// 流发送速率（bit/s）
    pub flow_rate_bps: u64,
    /// 流停止时刻（秒）
    pub flow_stop: f64,
}

impl Default for ScenarioOpts {
    fn default() -> Self {
        Self {
            size: 10,
            step: 100.0,
            total_time: 100.0,
            pcap: false,
            print_routes: true,
            seed: 12345,
            routes_file: PathBuf::from("manet.routes"),
            routes_at: 8.0,
            pcap_prefix: "manet".to_string(),
            protocol: "reactive".to_string(),
            range_m: 150.0,
            data_rate_bps: 6_000_000,
            maintain_interval: 1.0,
            subnet_base: Ipv4Addr::new(10, 0, 0, 0),
            subnet_mask: Ipv4Addr::new(255, 0, 0, 0),
            pkt_bytes: 512,
            flow_rate_bps: 500_000,
            flow_stop: 10.0,
        }
    }
}

impl ScenarioOpts {
    /// 校验配置。失败必须发生在任何拓扑构建之前。
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !(self.step > 0.0) {
            return Err(ScenarioError::NonPositiveStep(self.step));
        }
        if !(self.total_time > 0.0) {
            return Err(ScenarioError::NonPositiveTime(self.total_time));
        }
        if !(self.range_m > 0.0) {
            return Err(ScenarioError::NonPositiveRange(self.range_m));
        }
        Ok(())
    }
}

/// JSON 场景文件。所有字段可省略，省略处沿用旗标/默认值。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioSpec {
    #[serde(default)]
    pub size: Option<usize>,
    #[serde(default)]
    pub step: Option<f64>,
    #[serde(default)]
    pub time: Option<f64>,
    #[serde(default)]
    pub pcap: Option<bool>,
    #[serde(default)]
    pub print_routes: Option<bool>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub range_m: Option<f64>,
    #[serde(default)]
    pub data_rate_bps: Option<u64>,
    #[serde(default)]
    pub pkt_bytes: Option<u32>,
    #[serde(default)]
    pub flow_rate_bps: Option<u64>,
    #[serde(default)]
    pub flow_stop: Option<f64>,
}

impl ScenarioSpec {
    /// 从 JSON 文件读取。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// 把文件中出现的字段覆盖到选项上。
    pub fn apply(&self, opts: &mut ScenarioOpts) {
        if let Some(v) = self.size {
            opts.size = v;
        }
        if let Some(v) = self.step {
            opts.step = v;
        }
        if let Some(v) = self.time {
            opts.total_time = v;
        }
        if let Some(v) = self.pcap {
            opts.pcap = v;
        }
        if let Some(v) = self.print_routes {
            opts.print_routes = v;
        }
        if let Some(v) = self.seed {
            opts.seed = v;
        }
        if let Some(v) = &self.protocol {
            opts.protocol = v.clone();
        }
        if let Some(v) = self.range_m {
            opts.range_m = v;
        }
        if let Some(v) = self.data_rate_bps {
            opts.data_rate_bps = v;
        }
        if let Some(v) = self.pkt_bytes {
            opts.pkt_bytes = v;
        }
        if let Some(v) = self.flow_rate_bps {
            opts.flow_rate_bps = v;
        }
        if let Some(v) = self.flow_stop {
            opts.flow_stop = v;
        }
    }
}

/// 装配整个场景。返回就绪的世界；之后调用 `run_scenario` 恰好一次。
///
/// 流源是 node-0，汇聚端是最后一个节点；节点数不足 2 时不创建流，
/// 运行仍然正常完成。
pub fn build_scenario(
    sim: &mut Simulator,
    opts: &ScenarioOpts,
    registry: &ProtocolRegistry,
    trace_sink: Box<dyn Write + Send>,
) -> Result<ManetWorld, ScenarioError> {
    opts.validate()?;

    let channel = Channel::new(opts.data_rate_bps, opts.range_m);
    let mut world = ManetWorld::new(channel);

    // 拓扑
    let ids = build_grid(
        &mut world,
        &GridOpts {
            size: opts.size,
            step: opts.step,
            width: None,
        },
    );

    // 无线设备
    for &id in &ids {
        let dev = world.channel.attach(id);
        world.node_mut(id).set_device(dev);
        if opts.pcap {
            let path = format!("{}-{}.pcap", opts.pcap_prefix, id.0);
            match PcapWriter::create(&path) {
                Ok(sink) => world.channel.enable_capture(dev, Box::new(sink)),
                // 产物写入失败不致命
                Err(e) => warn!(path = %path, error = %e, "无法创建抓包文件"),
            }
        }
    }
    let positions = world.positions();
    world.channel.freeze(&positions);

    // 协议栈与地址
    install_stack(
        &mut world,
        opts.subnet_base,
        opts.subnet_mask,
        &opts.protocol,
        registry,
    )?;

    // 汇聚端：运行开始前每个节点都绑定已知端口
    for &id in &ids {
        world.node_mut(id).bind(SINK_PORT)?;
    }

    // trace 收集器只注册一次
    world.bus.register(Box::new(TraceCollector::new(trace_sink)));

    // 被测流：node-0 -> 最后一个节点的地址
    if opts.size >= 2 {
        let src = NodeId(0);
        let sink = ids[opts.size - 1];
        let dst = world
            .assignment
            .addr_of(sink)
            .expect("sink address assigned");

        let mut flow = FlowOpts::new(src, dst);
        flow.pkt_bytes = opts.pkt_bytes;
        flow.interval = interval_for(opts.pkt_bytes, opts.flow_rate_bps);
        flow.stop = SimTime::from_secs_f64(opts.flow_stop);

        let mut rng = StdRng::seed_from_u64(opts.seed);
        schedule_flow(sim, &mut world, flow, &mut rng);
    } else {
        info!(size = opts.size, "节点不足，不创建流");
    }

    // 路由表 dump
    if opts.print_routes {
        match File::create(&opts.routes_file) {
            Ok(f) => {
                sim.schedule(
                    SimTime::from_secs_f64(opts.routes_at),
                    DumpRoutes { sink: Box::new(f) },
                );
            }
            Err(e) => warn!(path = %opts.routes_file.display(), error = %e, "无法创建路由 dump 文件"),
        }
    }

    // 周期路由维护（间隔 <= 0 表示禁用）
    if opts.maintain_interval > 0.0 {
        let interval = SimTime::from_secs_f64(opts.maintain_interval);
        sim.schedule(interval, MaintainRoutes { interval });
    }

    Ok(world)
}

/// 运行场景：权威的、唯一一次 run-to-completion 调用。
pub fn run_scenario(sim: &mut Simulator, world: &mut ManetWorld, opts: &ScenarioOpts) {
    sim.run_until(SimTime::from_secs_f64(opts.total_time), world);
}
