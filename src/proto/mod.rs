//! ARQ 协议模块
//!
//! 三种可靠传输策略（停等 / Go-Back-N / 选择重传）的实现。
//! 三者共享同一套原语（编解码、窗口簿记、定时器），差别在于
//! 窗口大小、确认语义与定时器粒度。

mod abt;
mod endpoint;
mod gbn;
mod sr;

pub use abt::{AbtReceiver, AbtSender};
pub use endpoint::ArqEndpoint;
pub use gbn::{GbnReceiver, GbnSender};
pub use sr::{SrReceiver, SrSender};

use crate::sim::SimTime;
use serde::{Deserialize, Serialize};

/// 协议公共配置。窗口大小在构造端点时读取一次。
#[derive(Debug, Clone)]
pub struct ArqConfig {
    /// 发送/接收窗口大小 N（停等协议忽略，恒为 1）
    pub window_size: u32,
    /// 超时间隔：停等/GBN 的连接定时器间隔，SR 的单包超时
    pub timeout: SimTime,
    /// SR 定时器表的轮询周期
    pub tick: SimTime,
}

impl Default for ArqConfig {
    fn default() -> Self {
        Self {
            window_size: 8,
            timeout: SimTime::from_millis(20),
            tick: SimTime::from_millis(1),
        }
    }
}

/// 协议变体选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// 停等（交替位）
    Abt,
    /// Go-Back-N
    Gbn,
    /// 选择重传
    Sr,
}

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Abt => "abt",
            Variant::Gbn => "gbn",
            Variant::Sr => "sr",
        }
    }
}

/// 按变体构造一对端点：A 侧发送方与 B 侧接收方。
pub fn build_pair(variant: Variant, cfg: &ArqConfig) -> (Box<dyn ArqEndpoint>, Box<dyn ArqEndpoint>) {
    match variant {
        Variant::Abt => (
            Box::new(AbtSender::new(cfg)),
            Box::new(AbtReceiver::new()),
        ),
        Variant::Gbn => (
            Box::new(GbnSender::new(cfg)),
            Box::new(GbnReceiver::new()),
        ),
        Variant::Sr => (Box::new(SrSender::new(cfg)), Box::new(SrReceiver::new(cfg))),
    }
}
