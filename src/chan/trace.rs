//! 运行轨迹记录
//!
//! 把一次运行中的协议事件记录为可序列化的事件流，供实验脚本
//! 后处理。建议第一条为 `Meta`。

use super::id::EndpointId;
use serde::{Deserialize, Serialize};

/// 轨迹事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEventKind {
    /// 运行元信息（建议作为 t=0 的第一条事件）
    Meta {
        variant: String,
        window_size: u32,
        loss_prob: f64,
        corrupt_prob: f64,
        seed: u64,
    },
    /// 端点把数据包交给信道
    Send {
        from: EndpointId,
        seq: u32,
        ack: u32,
        retrans: bool,
    },
    /// 信道丢弃数据包
    Drop { from: EndpointId, seq: u32 },
    /// 信道改写数据包字节
    Corrupt { from: EndpointId, seq: u32 },
    /// 数据包到达对端
    Arrive { to: EndpointId, seq: u32, ack: u32 },
    /// 消息向上交付给应用层
    Deliver { at: EndpointId },
    /// 连接定时器触发
    TimerFired { at: EndpointId },
}

/// 一条轨迹事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    pub t_ns: u64,
    #[serde(flatten)]
    pub kind: TraceEventKind,
}

/// 轨迹记录器
#[derive(Debug, Default)]
pub struct TraceLogger {
    pub events: Vec<TraceEvent>,
}

impl TraceLogger {
    pub fn push(&mut self, t_ns: u64, kind: TraceEventKind) {
        self.events.push(TraceEvent { t_ns, kind });
    }
}
