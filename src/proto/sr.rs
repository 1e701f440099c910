//! 选择重传协议
//!
//! 大小为 N 的滑动窗口加逐包确认与逐包定时器。超时只重传对应的
//! 那一个数据包，这是相对 GBN 的优势所在。发送方用连接定时器做周期
//! 轮询，每个节拍按序号升序触发全部到期的单包定时器，保证重传
//! 级联可复现。接收方缓存乱序到达的数据包，凑齐连续前缀后一次
//! 性按序交付。

use super::endpoint::ArqEndpoint;
use crate::chan::EndpointCtx;
use crate::pkt::{Msg, Packet};
use crate::proto::ArqConfig;
use crate::sim::SimTime;
use crate::timer::TimerTable;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, trace, warn};

/// SR 发送方（A 侧）
pub struct SrSender {
    base: u32,
    next_seq_num: u32,
    window_size: u32,
    /// 在途数据包，按序号索引
    unacked: BTreeMap<u32, Packet>,
    /// 窗口满时滞留的数据包，序号均 ≥ `next_seq_num`
    unsent: VecDeque<Packet>,
    /// 逐包定时器表
    timers: TimerTable,
    /// 单包超时间隔
    timeout: SimTime,
    /// 定时器表的轮询节拍
    tick: SimTime,
}

impl SrSender {
    pub fn new(cfg: &ArqConfig) -> Self {
        Self {
            base: 1,
            next_seq_num: 1,
            window_size: cfg.window_size,
            unacked: BTreeMap::new(),
            unsent: VecDeque::new(),
            timers: TimerTable::default(),
            timeout: cfg.timeout,
            tick: cfg.tick,
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
        self.unacked.keys().copied().collect()
    }

    pub fn unsent_len(&self) -> usize {
        self.unsent.len()
    }

    fn next_build_seq(&self) -> u32 {
        self.next_seq_num + self.unsent.len() as u32
    }

    fn window_open(&self) -> bool {
        self.next_seq_num < self.base + self.window_size
    }

    /// 发送一个已编号的数据包并武装其专属定时器。
    fn transmit(&mut self, pkt: Packet, ctx: &mut EndpointCtx) {
        debug_assert_eq!(pkt.seq_num, self.next_seq_num);
        let seq = pkt.seq_num;
        debug!(seq, base = self.base, "发送数据包");
        ctx.to_channel(pkt.clone());
        self.timers.new_timer(seq, self.timeout);
        self.timers.start(seq, ctx.now());
        self.unacked.insert(seq, pkt);
        self.next_seq_num += 1;
    }
}

impl ArqEndpoint for SrSender {
    fn on_init(&mut self, ctx: &mut EndpointCtx) {
        // 周期节拍驱动定时器表的协作轮询
        ctx.start_timer(self.tick);
    }

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
        if k < self.base || k >= self.base + self.window_size {
            trace!(ack = k, base = self.base, "窗口外的确认，忽略");
            return;
        }
        if self.unacked.remove(&k).is_none() {
            trace!(ack = k, "重复确认，忽略");
            return;
        }
        debug!(ack = k, "收到逐包确认");
        self.timers.destroy(k);
        if k == self.base {
            // 选择性滑动：跳到最小的仍未确认序号
            self.base = self
                .unacked
                .keys()
                .next()
                .copied()
                .unwrap_or(self.next_seq_num);
            trace!(base = self.base, "窗口左沿前移");
        }
        // 把滞留的数据包放进新腾出的窗口
        while self.window_open() {
            let Some(next) = self.unsent.pop_front() else {
                break;
            };
            self.transmit(next, ctx);
        }
    }

    fn on_timer_fired(&mut self, ctx: &mut EndpointCtx) {
        let now = ctx.now();
        for seq in self.timers.fire_expired(now) {
            match self.unacked.get(&seq) {
                Some(pkt) => {
                    debug!(seq, "单包超时，重传该数据包");
                    ctx.resend_to_channel(pkt.clone());
                    self.timers.start(seq, now);
                }
                None => {
                    // 已确认数据包的定时器应当随确认销毁
                    warn!(seq, "到期定时器没有对应的在途数据包");
                    self.timers.destroy(seq);
                }
            }
        }
        // 重启轮询节拍
        ctx.start_timer(self.tick);
    }
}

/// SR 接收方（B 侧）
pub struct SrReceiver {
    recv_base: u32,
    window_size: u32,
    /// 乱序到达、等待连续交付的数据包
    buffer: BTreeMap<u32, Packet>,
}

impl SrReceiver {
    pub fn new(cfg: &ArqConfig) -> Self {
        Self {
            recv_base: 1,
            window_size: cfg.window_size,
            buffer: BTreeMap::new(),
        }
    }

    pub fn recv_base(&self) -> u32 {
        self.recv_base
    }

    /// 重排缓冲区中的序号，升序。
    pub fn buffered_seqs(&self) -> Vec<u32> {
        self.buffer.keys().copied().collect()
    }
}

impl ArqEndpoint for SrReceiver {
    fn on_init(&mut self, _ctx: &mut EndpointCtx) {}

    fn on_send_request(&mut self, _msg: Msg, _ctx: &mut EndpointCtx) {
        debug!("接收方不发送数据，忽略发送请求");
    }

    fn on_packet_received(&mut self, pkt: Packet, ctx: &mut EndpointCtx) {
        if pkt.is_corrupt() {
            debug!("数据包损坏，丢弃且不确认");
            return;
        }
        let seq = pkt.seq_num;
        let dup_low = self.recv_base.saturating_sub(self.window_size);

        if seq >= dup_low && seq < self.recv_base {
            // 已交付数据包的重传：重新确认以推动发送方，绝不重复交付
            debug!(seq, recv_base = self.recv_base, "已交付的重复包，仅重新确认");
            ctx.to_channel(Packet::build_ack(seq));
            return;
        }
        if seq >= self.recv_base && seq < self.recv_base + self.window_size {
            ctx.to_channel(Packet::build_ack(seq));
            self.buffer.entry(seq).or_insert(pkt);
            if seq == self.recv_base {
                // 交付以 recv_base 起始的最长连续前缀
                let mut delivered = 0u32;
                while let Some(p) = self.buffer.remove(&self.recv_base) {
                    ctx.to_application(Msg(p.payload));
                    self.recv_base += 1;
                    delivered += 1;
                }
                debug!(delivered, recv_base = self.recv_base, "按序交付连续前缀");
            } else {
                trace!(seq, recv_base = self.recv_base, "乱序到达，缓存");
            }
            return;
        }
        // 发送方窗口约束下不应出现：调用方缺陷，记录后忽略
        warn!(seq, recv_base = self.recv_base, "接收窗口外的序号，忽略");
    }

    fn on_timer_fired(&mut self, _ctx: &mut EndpointCtx) {}
}
