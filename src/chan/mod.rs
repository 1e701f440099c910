//! 不可靠信道模块
//!
//! 包含信道仿真的核心组件：端点标识、信道（丢包/损坏/时延注入）、
//! 事件、端点上下文、世界与统计。

// 子模块声明
mod channel;
mod ctx;
mod events;
mod id;
mod stats;
mod trace;
mod world;

// 重新导出公共接口
pub use channel::{Channel, ChannelConfig};
pub use ctx::EndpointCtx;
pub use events::{AppSend, DeliverPacket, TimerFired};
pub use id::EndpointId;
pub use stats::Stats;
pub use trace::{TraceEvent, TraceEventKind, TraceLogger};
pub use world::ArqWorld;
