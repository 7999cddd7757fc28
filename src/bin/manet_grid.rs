//! 网格拓扑 ad-hoc 路由仿真
//!
//! 在一维网格上运行反应式路由协议：node-0 向最后一个节点发送
//! 单条 on/off 流，收发 trace 打到标准输出。

use clap::{ArgAction, Parser};
use manetsim_rs::route::ProtocolRegistry;
use manetsim_rs::scenario::{build_scenario, run_scenario, ScenarioOpts, ScenarioSpec};
use manetsim_rs::sim::Simulator;
use std::path::PathBuf;
use tracing::error;

#[derive(Debug, Parser)]
#[command(name = "manet_grid", about = "网格拓扑 ad-hoc 路由仿真：node-0 -> node-(N-1) 单流发包")]
struct Args {
    /// 节点数
    #[arg(long, default_value_t = 10)]
    size: usize,
    /// 格点间距（米）
    #[arg(long, default_value_t = 100.0)]
    step: f64,
    /// 仿真总时长（秒）
    #[arg(long, default_value_t = 100.0)]
    time: f64,
    /// 写每设备抓包文件
    #[arg(long, default_value_t = false)]
    pcap: bool,
    /// 在固定时刻 dump 路由表
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    print_routes: bool,
    /// 随机种子（决定流启动时间）
    #[arg(long, default_value_t = 12345)]
    seed: u64,
    /// 路由表 dump 输出文件
    #[arg(long, default_value = "manet.routes")]
    routes_file: PathBuf,
    /// 路由协议标识
    #[arg(long, default_value = "reactive")]
    protocol: String,
    /// JSON 场景文件（文件中的字段覆盖旗标）
    #[arg(long)]
    scenario: Option<PathBuf>,
}

fn main() {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut opts = ScenarioOpts {
        size: args.size,
        step: args.step,
        total_time: args.time,
        pcap: args.pcap,
        print_routes: args.print_routes,
        seed: args.seed,
        routes_file: args.routes_file,
        protocol: args.protocol,
        ..ScenarioOpts::default()
    };

    if let Some(path) = &args.scenario {
        match ScenarioSpec::load(path) {
            Ok(spec) => spec.apply(&mut opts),
            Err(e) => {
                error!(path = %path.display(), error = %e, "场景文件读取失败");
                std::process::exit(1);
            }
        }
    }

    let registry = ProtocolRegistry::with_defaults();
    let mut sim = Simulator::default();

    let mut world = match build_scenario(&mut sim, &opts, &registry, Box::new(std::io::stdout())) {
        Ok(w) => w,
        Err(e) => {
            error!(error = %e, "场景装配失败");
            std::process::exit(1);
        }
    };

    println!("Starting simulation for {} s ...", opts.total_time);
    run_scenario(&mut sim, &mut world, &opts);

    println!(
        "done @ {:?}, sent={}, forwarded={}, received={}, dropped_pkts={}, dropped_frames={}",
        sim.now(),
        world.stats.sent_pkts,
        world.stats.forwarded_pkts,
        world.stats.received_pkts,
        world.stats.dropped_pkts,
        world.stats.dropped_frames
    );
}
