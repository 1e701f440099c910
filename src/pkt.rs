//! 数据包编解码
//!
//! 定义固定长度的数据包、其规范字节序列化与加法校验和。
//! 校验和始终在规范序列化形式上计算（校验和字段置零），与内存布局无关。

use thiserror::Error;

/// 载荷长度（字节）。
pub const MSG_LEN: usize = 20;

/// 数据包规范序列化后的总长度（字节）：seq(4) + ack(4) + checksum(4) + payload(20)。
pub const PACKET_LEN: usize = 32;

// 规范序列化中各字段的字节偏移。
const OFF_SEQ: usize = 0;
const OFF_ACK: usize = 4;
const OFF_CHECKSUM: usize = 8;
const OFF_PAYLOAD: usize = 12;

/// 应用层消息：恰好 [`MSG_LEN`] 字节，较短的输入零填充。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Msg(pub [u8; MSG_LEN]);

impl Msg {
    pub fn as_bytes(&self) -> &[u8; MSG_LEN] {
        &self.0
    }
}

impl From<&[u8]> for Msg {
    /// 短拷贝：多余字节截断，不足零填充。
    fn from(data: &[u8]) -> Self {
        let mut buf = [0u8; MSG_LEN];
        let n = data.len().min(MSG_LEN);
        buf[..n].copy_from_slice(&data[..n]);
        Msg(buf)
    }
}

impl From<&str> for Msg {
    fn from(s: &str) -> Self {
        Msg::from(s.as_bytes())
    }
}

/// 解码错误。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PktError {
    #[error("packet must be {PACKET_LEN} bytes, got {0}")]
    BadLength(usize),
}

/// 网络数据包
///
/// 新构造的数据包总能通过自身校验和的验证；`is_corrupt` 只会在
/// 传输途中字节被改写后为真。加法校验和无法察觉相互抵消的
/// 位变化，这是有记录的已知弱点，而非缺陷。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub seq_num: u32,
    pub ack_num: u32,
    pub checksum: u32,
    pub payload: [u8; MSG_LEN],
}

impl Packet {
    /// 构造数据包：拷贝载荷、填入 seq/ack，最后计算校验和。
    pub fn build(seq_num: u32, ack_num: u32, msg: Msg) -> Packet {
        let mut pkt = Packet {
            seq_num,
            ack_num,
            checksum: 0,
            payload: msg.0,
        };
        pkt.checksum = pkt.compute_checksum();
        pkt
    }

    /// 构造纯 ACK 包（空载荷，seq 固定为 0）。
    pub fn build_ack(ack_num: u32) -> Packet {
        Packet::build(0, ack_num, Msg::default())
    }

    /// 规范序列化：大端序、字段顺序固定。
    pub fn encode(&self) -> [u8; PACKET_LEN] {
        let mut buf = [0u8; PACKET_LEN];
        buf[OFF_SEQ..OFF_SEQ + 4].copy_from_slice(&self.seq_num.to_be_bytes());
        buf[OFF_ACK..OFF_ACK + 4].copy_from_slice(&self.ack_num.to_be_bytes());
        buf[OFF_CHECKSUM..OFF_CHECKSUM + 4].copy_from_slice(&self.checksum.to_be_bytes());
        buf[OFF_PAYLOAD..].copy_from_slice(&self.payload);
        buf
    }

    /// 从规范序列化形式解码。不验证校验和：损坏判定属于协议层。
    pub fn decode(data: &[u8]) -> Result<Packet, PktError> {
        if data.len() != PACKET_LEN {
            return Err(PktError::BadLength(data.len()));
        }
        let word = |off: usize| {
            u32::from_be_bytes(data[off..off + 4].try_into().expect("4-byte slice"))
        };
        let mut payload = [0u8; MSG_LEN];
        payload.copy_from_slice(&data[OFF_PAYLOAD..]);
        Ok(Packet {
            seq_num: word(OFF_SEQ),
            ack_num: word(OFF_ACK),
            checksum: word(OFF_CHECKSUM),
            payload,
        })
    }

    /// 在校验和字段置零的序列化形式上逐字节求和（环绕加法）。
    pub fn compute_checksum(&self) -> u32 {
        let zeroed = Packet {
            checksum: 0,
            ..self.clone()
        };
        zeroed
            .encode()
            .iter()
            .fold(0u32, |sum, &b| sum.wrapping_add(b as u32))
    }

    /// 存储的校验和与重新计算的不一致即为损坏。
    pub fn is_corrupt(&self) -> bool {
        self.checksum != self.compute_checksum()
    }
}
