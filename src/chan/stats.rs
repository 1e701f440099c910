//! 统计信息
//!
//! 信道与协议运行的计数器。

use serde::Serialize;

/// 信道统计信息
#[derive(Debug, Default, Serialize)]
pub struct Stats {
    /// 交给信道的数据包总数（含重传）
    pub sent_pkts: u64,
    /// 其中由超时路径触发的重传
    pub retrans_pkts: u64,
    /// 信道丢弃的数据包
    pub dropped_pkts: u64,
    /// 信道改写过字节的数据包
    pub corrupted_pkts: u64,
    /// 实际到达对端的数据包
    pub arrived_pkts: u64,
    /// 向上交付给应用层的消息
    pub delivered_msgs: u64,
    /// 连接定时器触发次数
    pub timer_fires: u64,
}
