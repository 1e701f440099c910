//! 不可靠信道
//!
//! 在两个端点之间传递数据包，按配置注入丢包、损坏与时延抖动。
//! 所有随机性来自一个带种子的 RNG，同一种子的两次运行完全一致。
//! 信道同时承载连接级单槽定时器原语与各端点的应用层收件箱。

use super::events::{DeliverPacket, TimerFired};
use super::id::EndpointId;
use super::stats::Stats;
use super::trace::{TraceEventKind, TraceLogger};
use crate::pkt::{Msg, Packet};
use crate::sim::{SimTime, Simulator};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

/// 信道配置
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// 单向传播时延
    pub latency: SimTime,
    /// 附加在时延上的均匀抖动上界；非零抖动可能导致乱序到达
    pub jitter: SimTime,
    /// 丢包概率 [0, 1]
    pub loss_prob: f64,
    /// 损坏概率 [0, 1]
    pub corrupt_prob: f64,
    /// RNG 种子
    pub seed: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            latency: SimTime::from_millis(5),
            jitter: SimTime::ZERO,
            loss_prob: 0.0,
            corrupt_prob: 0.0,
            seed: 0,
        }
    }
}

/// 不可靠信道
pub struct Channel {
    cfg: ChannelConfig,
    rng: StdRng,
    pub stats: Stats,
    pub trace: Option<TraceLogger>,
    inbox: [Vec<Msg>; 2],
    // 连接定时器槽位：取消只能显式进行，因此用代数标记使在途的
    // 触发事件在执行时被识别为过期。
    timer_gen: [u64; 2],
    timer_armed: [bool; 2],
}

impl Channel {
    pub fn new(cfg: ChannelConfig) -> Self {
        let rng = StdRng::seed_from_u64(cfg.seed);
        Self {
            cfg,
            rng,
            stats: Stats::default(),
            trace: None,
            inbox: [Vec::new(), Vec::new()],
            timer_gen: [0, 0],
            timer_armed: [false, false],
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.cfg
    }

    /// 端点把数据包交给信道。丢包直接吞掉；损坏在校验和计算之后
    /// 改写字节；否则按 `latency + U[0, jitter]` 调度到达事件。
    #[tracing::instrument(skip(self, pkt, sim), fields(seq = pkt.seq_num, ack = pkt.ack_num))]
    pub(crate) fn send_from(
        &mut self,
        from: EndpointId,
        mut pkt: Packet,
        sim: &mut Simulator,
        retrans: bool,
    ) {
        self.stats.sent_pkts += 1;
        if retrans {
            self.stats.retrans_pkts += 1;
        }
        let now = sim.now().0;
        if let Some(t) = self.trace.as_mut() {
            t.push(
                now,
                TraceEventKind::Send {
                    from,
                    seq: pkt.seq_num,
                    ack: pkt.ack_num,
                    retrans,
                },
            );
        }

        if self.rng.gen_range(0.0..1.0) < self.cfg.loss_prob {
            self.stats.dropped_pkts += 1;
            debug!("📉 信道丢弃数据包");
            if let Some(t) = self.trace.as_mut() {
                t.push(
                    now,
                    TraceEventKind::Drop {
                        from,
                        seq: pkt.seq_num,
                    },
                );
            }
            return;
        }

        if self.rng.gen_range(0.0..1.0) < self.cfg.corrupt_prob {
            self.corrupt(&mut pkt);
            self.stats.corrupted_pkts += 1;
            debug!("⚡ 信道改写数据包字节");
            if let Some(t) = self.trace.as_mut() {
                t.push(
                    now,
                    TraceEventKind::Corrupt {
                        from,
                        seq: pkt.seq_num,
                    },
                );
            }
        }

        let jitter = if self.cfg.jitter > SimTime::ZERO {
            SimTime(self.rng.gen_range(0..=self.cfg.jitter.0))
        } else {
            SimTime::ZERO
        };
        let arrive = sim.now().after(self.cfg.latency).after(jitter);
        trace!(?arrive, "调度数据包到达事件");
        sim.schedule(
            arrive,
            DeliverPacket {
                to: from.peer(),
                pkt,
            },
        );
    }

    /// 改写数据包的某个字段：多数情况下翻转载荷首字节，少数情况下
    /// 改写 seq 或 ack。改写发生在校验和之后，因此必然可被检出
    /// （加法校验和的抵消盲区除外）。
    fn corrupt(&mut self, pkt: &mut Packet) {
        let roll = self.rng.gen_range(0.0..1.0);
        if roll < 0.75 {
            pkt.payload[0] ^= 0xff;
        } else if roll < 0.875 {
            pkt.seq_num ^= 0x8000_0000;
        } else {
            pkt.ack_num ^= 0x8000_0000;
        }
    }

    /// 向上交付：写入端点收件箱。
    pub(crate) fn deliver_up(&mut self, at: EndpointId, msg: Msg, now: SimTime) {
        self.stats.delivered_msgs += 1;
        if let Some(t) = self.trace.as_mut() {
            t.push(now.0, TraceEventKind::Deliver { at });
        }
        self.inbox[at.index()].push(msg);
    }

    /// 某端点已收到的应用层消息，按交付顺序排列。
    pub fn delivered(&self, at: EndpointId) -> &[Msg] {
        &self.inbox[at.index()]
    }

    /// 启动（或重启）某端点的连接定时器。
    pub(crate) fn start_conn_timer(
        &mut self,
        at: EndpointId,
        interval: SimTime,
        sim: &mut Simulator,
    ) {
        let i = at.index();
        self.timer_gen[i] = self.timer_gen[i].wrapping_add(1);
        self.timer_armed[i] = true;
        let generation = self.timer_gen[i];
        trace!(?at, generation, ?interval, "启动连接定时器");
        sim.schedule(sim.now().after(interval), TimerFired { at, generation });
    }

    /// 停止某端点的连接定时器：在途的触发事件将因代数不匹配而失效。
    pub(crate) fn stop_conn_timer(&mut self, at: EndpointId) {
        let i = at.index();
        self.timer_gen[i] = self.timer_gen[i].wrapping_add(1);
        self.timer_armed[i] = false;
        trace!(?at, "停止连接定时器");
    }

    /// 触发事件是否仍然有效（未被停止或重启覆盖）。
    pub(crate) fn timer_is_current(&self, at: EndpointId, generation: u64) -> bool {
        let i = at.index();
        self.timer_armed[i] && self.timer_gen[i] == generation
    }

    /// 记录一次有效触发并解除武装。
    pub(crate) fn on_timer_fire(&mut self, at: EndpointId, now: SimTime) {
        self.timer_armed[at.index()] = false;
        self.stats.timer_fires += 1;
        if let Some(t) = self.trace.as_mut() {
            t.push(now.0, TraceEventKind::TimerFired { at });
        }
    }
}
