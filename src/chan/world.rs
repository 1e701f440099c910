//! 仿真世界实现
//!
//! 持有信道与两个协议端点，把事件路由到对应端点的处理函数。

use super::channel::Channel;
use super::ctx::EndpointCtx;
use super::id::EndpointId;
use crate::proto::ArqEndpoint;
use crate::sim::{Simulator, World};
use std::any::Any;

/// ARQ 仿真世界：一条信道加一对端点。
pub struct ArqWorld {
    pub chan: Channel,
    endpoints: [Option<Box<dyn ArqEndpoint>>; 2],
}

impl ArqWorld {
    pub fn new(chan: Channel, a: Box<dyn ArqEndpoint>, b: Box<dyn ArqEndpoint>) -> Self {
        Self {
            chan,
            endpoints: [Some(a), Some(b)],
        }
    }

    /// 在任何其他事件之前调用一次：依次初始化两个端点。
    pub fn init(&mut self, sim: &mut Simulator) {
        for at in [EndpointId::A, EndpointId::B] {
            let mut ep = self.take_endpoint(at);
            let mut ctx = EndpointCtx::new(at, &mut self.chan, sim);
            ep.on_init(&mut ctx);
            self.put_endpoint(at, ep);
        }
    }

    /// 把端点从槽位中暂时取出，以便端点、信道与仿真器可以同时被
    /// 可变借用；处理完毕后用 [`put_endpoint`](Self::put_endpoint) 放回。
    pub(crate) fn take_endpoint(&mut self, at: EndpointId) -> Box<dyn ArqEndpoint> {
        self.endpoints[at.index()].take().expect("endpoint exists")
    }

    pub(crate) fn put_endpoint(&mut self, at: EndpointId, ep: Box<dyn ArqEndpoint>) {
        self.endpoints[at.index()] = Some(ep);
    }
}

impl World for ArqWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
