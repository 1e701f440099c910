//! ARQ 协议实验
//!
//! 在不可靠信道上运行选定的 ARQ 变体（停等 / GBN / SR），
//! 可配置丢包率、损坏率、时延/抖动与窗口大小，结束后输出
//! 统计摘要，并可选地把协议事件轨迹写成 JSON 供脚本后处理。

use arqsim_rs::chan::{AppSend, ArqWorld, Channel, ChannelConfig, TraceEventKind, TraceLogger};
use arqsim_rs::pkt::Msg;
use arqsim_rs::proto::{build_pair, ArqConfig, Variant};
use arqsim_rs::sim::{SimTime, Simulator};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "arq-sim", about = "ARQ 可靠传输仿真：A->B 单向消息流")]
struct Args {
    /// 协议变体
    #[arg(long, value_enum, default_value = "gbn")]
    proto: Variant,

    /// 要发送的消息条数
    #[arg(long, default_value_t = 50)]
    msgs: u32,

    /// 相邻两次应用层发送的间隔（微秒）
    #[arg(long, default_value_t = 500)]
    send_gap_us: u64,

    /// 发送/接收窗口大小 N（停等协议忽略）
    #[arg(long, default_value_t = 8)]
    window: u32,

    /// 超时间隔（毫秒）：停等/GBN 连接定时器，SR 单包超时
    #[arg(long, default_value_t = 20)]
    timeout_ms: u64,

    /// SR 定时器表的轮询节拍（毫秒）
    #[arg(long, default_value_t = 1)]
    tick_ms: u64,

    /// 丢包概率 [0,1]
    #[arg(long, default_value_t = 0.1)]
    loss: f64,

    /// 损坏概率 [0,1]
    #[arg(long, default_value_t = 0.1)]
    corrupt: f64,

    /// 单向传播时延（毫秒）
    #[arg(long, default_value_t = 5)]
    latency_ms: u64,

    /// 时延抖动上界（微秒）；非零会引入乱序
    #[arg(long, default_value_t = 0)]
    jitter_us: u64,

    /// RNG 种子（同一种子完全复现同一次运行）
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// 仿真运行到多少毫秒
    #[arg(long, default_value_t = 10_000)]
    until_ms: u64,

    /// 输出协议事件轨迹 JSON；不填则不生成
    #[arg(long)]
    trace_json: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let arq_cfg = ArqConfig {
        window_size: args.window,
        timeout: SimTime::from_millis(args.timeout_ms),
        tick: SimTime::from_millis(args.tick_ms),
    };
    let chan_cfg = ChannelConfig {
        latency: SimTime::from_millis(args.latency_ms),
        jitter: SimTime::from_micros(args.jitter_us),
        loss_prob: args.loss,
        corrupt_prob: args.corrupt,
        seed: args.seed,
    };

    let mut sim = Simulator::default();
    let (a, b) = build_pair(args.proto, &arq_cfg);
    let mut chan = Channel::new(chan_cfg);

    if args.trace_json.is_some() {
        let mut trace = TraceLogger::default();
        trace.push(
            0,
            TraceEventKind::Meta {
                variant: args.proto.as_str().to_string(),
                window_size: args.window,
                loss_prob: args.loss,
                corrupt_prob: args.corrupt,
                seed: args.seed,
            },
        );
        chan.trace = Some(trace);
    }

    let mut world = ArqWorld::new(chan, a, b);
    world.init(&mut sim);

    // 以固定间隔调度应用层发送请求
    let sent: Vec<Msg> = (0..args.msgs)
        .map(|i| Msg::from(format!("message {i}").as_str()))
        .collect();
    for (i, msg) in sent.iter().enumerate() {
        let at = SimTime::from_micros(args.send_gap_us.saturating_mul(i as u64));
        sim.schedule(
            at,
            AppSend {
                to: arqsim_rs::chan::EndpointId::A,
                msg: *msg,
            },
        );
    }

    sim.run_until(SimTime::from_millis(args.until_ms), &mut world);

    if let Some(path) = args.trace_json {
        if let Some(t) = world.chan.trace.take() {
            let json = serde_json::to_string_pretty(&t.events).expect("serialize trace events");
            fs::write(&path, json).expect("write trace json");
            eprintln!("wrote trace events to {}", path.display());
        }
    }

    let delivered = world.chan.delivered(arqsim_rs::chan::EndpointId::B);
    let in_order = delivered.iter().eq(sent.iter().take(delivered.len()));
    let stats = &world.chan.stats;

    println!(
        "done @ {:?}\n  proto: {}, delivered_msgs={}/{}, in_order={}\n  chan: sent_pkts={}, retrans_pkts={}, dropped_pkts={}, corrupted_pkts={}, arrived_pkts={}, timer_fires={}",
        sim.now(),
        args.proto.as_str(),
        delivered.len(),
        args.msgs,
        in_order,
        stats.sent_pkts,
        stats.retrans_pkts,
        stats.dropped_pkts,
        stats.corrupted_pkts,
        stats.arrived_pkts,
        stats.timer_fires
    );
}
