//! 停等（交替位）协议
//!
//! 窗口恒为 1：任一时刻最多一个数据包在途。序号在 0/1 之间交替，
//! 用 `bool` 表示，非法的序号值在类型上不可表示。
//! 发送方在途期间收到的新消息进入 FIFO 队列，收到确认后补发一条。

use super::endpoint::ArqEndpoint;
use crate::chan::EndpointCtx;
use crate::pkt::{Msg, Packet};
use crate::proto::ArqConfig;
use crate::sim::SimTime;
use std::collections::VecDeque;
use tracing::{debug, trace, warn};

/// 停等发送方（A 侧）
pub struct AbtSender {
    /// 当前待确认的交替位
    bit: bool,
    /// 在途数据包；`None` 表示槽位空闲
    inflight: Option<Packet>,
    /// 在途期间到达的应用层消息
    pending: VecDeque<Msg>,
    timeout: SimTime,
}

impl AbtSender {
    pub fn new(cfg: &ArqConfig) -> Self {
        Self {
            bit: false,
            inflight: None,
            pending: VecDeque::new(),
            timeout: cfg.timeout,
        }
    }

    /// 是否有数据包等待确认。
    pub fn is_outstanding(&self) -> bool {
        self.inflight.is_some()
    }

    /// 排队待发的消息数。
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn transmit(&mut self, msg: Msg, ctx: &mut EndpointCtx) {
        let pkt = Packet::build(u32::from(self.bit), 0, msg);
        debug!(seq = pkt.seq_num, "发送数据包");
        ctx.to_channel(pkt.clone());
        self.inflight = Some(pkt);
        ctx.start_timer(self.timeout);
    }
}

impl ArqEndpoint for AbtSender {
    fn on_init(&mut self, _ctx: &mut EndpointCtx) {}

    fn on_send_request(&mut self, msg: Msg, ctx: &mut EndpointCtx) {
        if self.inflight.is_some() {
            trace!(queued = self.pending.len() + 1, "槽位占用，消息入队");
            self.pending.push_back(msg);
            return;
        }
        self.transmit(msg, ctx);
    }

    fn on_packet_received(&mut self, pkt: Packet, ctx: &mut EndpointCtx) {
        if pkt.is_corrupt() {
            debug!("确认包损坏，丢弃");
            return;
        }
        if self.inflight.is_none() {
            trace!(ack = pkt.ack_num, "没有在途数据包，忽略确认");
            return;
        }
        if pkt.ack_num != u32::from(self.bit) {
            debug!(
                ack = pkt.ack_num,
                expected = u32::from(self.bit),
                "确认位不符，忽略"
            );
            return;
        }
        debug!(ack = pkt.ack_num, "收到确认");
        ctx.stop_timer();
        self.bit = !self.bit;
        self.inflight = None;
        // 补发一条排队的消息（若有）
        if let Some(msg) = self.pending.pop_front() {
            self.transmit(msg, ctx);
        }
    }

    fn on_timer_fired(&mut self, ctx: &mut EndpointCtx) {
        let Some(pkt) = self.inflight.clone() else {
            return;
        };
        debug!(seq = pkt.seq_num, "超时，原样重传在途数据包");
        ctx.resend_to_channel(pkt);
        ctx.start_timer(self.timeout);
    }
}

/// 停等接收方（B 侧）
pub struct AbtReceiver {
    /// 最近一次向上交付的交替位；`None` 表示尚未收到任何包
    last_bit: Option<bool>,
}

impl AbtReceiver {
    pub fn new() -> Self {
        Self { last_bit: None }
    }
}

impl Default for AbtReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl ArqEndpoint for AbtReceiver {
    fn on_init(&mut self, _ctx: &mut EndpointCtx) {}

    fn on_send_request(&mut self, _msg: Msg, _ctx: &mut EndpointCtx) {
        debug!("接收方不发送数据，忽略发送请求");
    }

    fn on_packet_received(&mut self, pkt: Packet, ctx: &mut EndpointCtx) {
        if pkt.is_corrupt() {
            debug!("数据包损坏，丢弃且不确认");
            return;
        }
        let bit = match pkt.seq_num {
            0 => false,
            1 => true,
            other => {
                warn!(seq = other, "交替位之外的序号，忽略");
                return;
            }
        };
        if self.last_bit == Some(bit) {
            // 重复包：重新确认但不重复交付
            debug!(seq = pkt.seq_num, "重复数据包，仅重新确认");
            ctx.to_channel(Packet::build_ack(u32::from(bit)));
            return;
        }
        ctx.to_application(Msg(pkt.payload));
        self.last_bit = Some(bit);
        ctx.to_channel(Packet::build_ack(u32::from(bit)));
    }

    fn on_timer_fired(&mut self, _ctx: &mut EndpointCtx) {}
}
