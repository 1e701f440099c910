//! 端点标识
//!
//! 一条连接的两个端点。单向传输配置下 A 只发送，B 只接收。

use serde::{Deserialize, Serialize};

/// 端点标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointId {
    A,
    B,
}

impl EndpointId {
    /// 对端
    pub fn peer(self) -> EndpointId {
        match self {
            EndpointId::A => EndpointId::B,
            EndpointId::B => EndpointId::A,
        }
    }

    /// 槽位下标（A=0，B=1）
    pub fn index(self) -> usize {
        match self {
            EndpointId::A => 0,
            EndpointId::B => 1,
        }
    }
}
