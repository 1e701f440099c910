//! Go-Back-N 协议
//!
//! 大小为 N 的滑动窗口加累积确认。发送方只维护一个连接定时器，
//! 超时后重传全部未确认数据包，这是 GBN 的代价所在。接收方只
//! 接受恰好按序到达的数据包，其余丢弃并重复最近的累积确认。

use super::endpoint::ArqEndpoint;
use crate::chan::EndpointCtx;
use crate::pkt::{Msg, Packet};
use crate::proto::ArqConfig;
use crate::sim::SimTime;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// GBN 发送方（A 侧）
///
/// 簿记变量沿用教科书记号：
/// - `base`：最老的未确认序号（窗口左沿）
/// - `next_seq_num`：下一个要发送的序号
/// - `[base, next_seq_num)`：已发送未确认
/// - `[next_seq_num, base + N)`：可立即发送
pub struct GbnSender {
    base: u32,
    next_seq_num: u32,
    window_size: u32,
    /// 已发送未确认的数据包，按序号升序
    unacked: VecDeque<Packet>,
    /// 窗口满时滞留的数据包，序号均 ≥ `next_seq_num`
    unsent: VecDeque<Packet>,
    timeout: SimTime,
}

impl GbnSender {
    pub fn new(cfg: &ArqConfig) -> Self {
        Self {
            base: 1,
            next_seq_num: 1,
            window_size: cfg.window_size,
            unacked: VecDeque::new(),
            unsent: VecDeque::new(),
            timeout: cfg.timeout,
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn next_seq_num(&self) -> u32 {
        self.next_seq_num
    }

    /// 未确认数据包的序号，升序。
    pub fn unacked_seqs(&self) -> Vec<u32> {
        self.unacked.iter().map(|p| p.seq_num).collect()
    }

    pub fn unsent_len(&self) -> usize {
        self.unsent.len()
    }

    /// 新数据包的序号：窗口滞留的包在入队时已预先编号。
    fn next_build_seq(&self) -> u32 {
        self.next_seq_num + self.unsent.len() as u32
    }

    fn window_open(&self) -> bool {
        self.next_seq_num < self.base + self.window_size
    }

    /// 发送一个已编号的数据包并重启连接定时器。
    fn transmit(&mut self, pkt: Packet, ctx: &mut EndpointCtx) {
        debug_assert_eq!(pkt.seq_num, self.next_seq_num);
        debug!(seq = pkt.seq_num, base = self.base, "发送数据包");
        ctx.to_channel(pkt.clone());
        self.unacked.push_back(pkt);
        self.next_seq_num += 1;
        // 任何新发送都重启连接定时器
        ctx.start_timer(self.timeout);
    }
}

impl ArqEndpoint for GbnSender {
    fn on_init(&mut self, _ctx: &mut EndpointCtx) {}

    fn on_send_request(&mut self, msg: Msg, ctx: &mut EndpointCtx) {
        let pkt = Packet::build(self.next_build_seq(), 0, msg);
        if self.window_open() && self.unsent.is_empty() {
            self.transmit(pkt, ctx);
        } else {
            trace!(seq = pkt.seq_num, "窗口已满，数据包滞留");
            self.unsent.push_back(pkt);
        }
    }

    fn on_packet_received(&mut self, pkt: Packet, ctx: &mut EndpointCtx) {
        if pkt.is_corrupt() {
            debug!("确认包损坏，丢弃");
            return;
        }
        let k = pkt.ack_num;
        if k < self.base {
            trace!(ack = k, base = self.base, "过期的累积确认，忽略");
            return;
        }
        if k >= self.next_seq_num {
            debug!(ack = k, next_seq_num = self.next_seq_num, "确认了未发送的序号，忽略");
            return;
        }
        debug!(ack = k, "收到累积确认");
        // 累积语义：k 及其之前的一切都已送达
        self.base = k + 1;
        while self.unacked.front().is_some_and(|p| p.seq_num <= k) {
            self.unacked.pop_front();
        }
        // 窗口右移后尽量放行滞留的数据包
        while self.window_open() {
            let Some(next) = self.unsent.pop_front() else {
                break;
            };
            self.transmit(next, ctx);
        }
        if self.unacked.is_empty() {
            ctx.stop_timer();
        } else {
            ctx.start_timer(self.timeout);
        }
    }

    fn on_timer_fired(&mut self, ctx: &mut EndpointCtx) {
        if self.unacked.is_empty() {
            return;
        }
        debug!(
            num_unacked = self.unacked.len(),
            base = self.base,
            "超时，重传全部未确认数据包"
        );
        for pkt in &self.unacked {
            ctx.resend_to_channel(pkt.clone());
        }
        ctx.start_timer(self.timeout);
    }
}

/// GBN 接收方（B 侧）
pub struct GbnReceiver {
    /// 期待的下一个序号；其余一概丢弃
    expected_seq_num: u32,
}

impl GbnReceiver {
    pub fn new() -> Self {
        Self { expected_seq_num: 1 }
    }

    pub fn expected_seq_num(&self) -> u32 {
        self.expected_seq_num
    }
}

impl Default for GbnReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl ArqEndpoint for GbnReceiver {
    fn on_init(&mut self, _ctx: &mut EndpointCtx) {}

    fn on_send_request(&mut self, _msg: Msg, _ctx: &mut EndpointCtx) {
        debug!("接收方不发送数据，忽略发送请求");
    }

    fn on_packet_received(&mut self, pkt: Packet, ctx: &mut EndpointCtx) {
        if pkt.is_corrupt() {
            debug!("数据包损坏，丢弃且不确认");
            return;
        }
        if pkt.seq_num != self.expected_seq_num {
            // 乱序或重复：丢弃，但重复最近一次按序确认，推动发送方窗口
            debug!(
                seq = pkt.seq_num,
                expected = self.expected_seq_num,
                "非期待序号，丢弃"
            );
            if self.expected_seq_num > 1 {
                ctx.to_channel(Packet::build_ack(self.expected_seq_num - 1));
            }
            return;
        }
        ctx.to_application(Msg(pkt.payload));
        ctx.to_channel(Packet::build_ack(self.expected_seq_num));
        self.expected_seq_num += 1;
    }

    fn on_timer_fired(&mut self, _ctx: &mut EndpointCtx) {}
}
