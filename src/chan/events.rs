//! 信道事件
//!
//! 端点只对三种外部事件作出反应：应用层发送请求、数据包到达、
//! 定时器中断。三者都由仿真器严格串行地交付。

use super::ctx::EndpointCtx;
use super::id::EndpointId;
use super::trace::TraceEventKind;
use super::world::ArqWorld;
use crate::pkt::{Msg, Packet};
use crate::sim::{Event, Simulator, World};
use tracing::{debug, info, trace};

/// 事件：应用层请求发送一条消息。
#[derive(Debug)]
pub struct AppSend {
    pub to: EndpointId,
    pub msg: Msg,
}

impl Event for AppSend {
    #[tracing::instrument(skip(self, sim, world), fields(to = ?self.to))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let AppSend { to, msg } = *self;

        debug!("📤 应用层发送请求");
        let w = world
            .as_any_mut()
            .downcast_mut::<ArqWorld>()
            .expect("world must be ArqWorld");

        let mut ep = w.take_endpoint(to);
        let mut ctx = EndpointCtx::new(to, &mut w.chan, sim);
        ep.on_send_request(msg, &mut ctx);
        w.put_endpoint(to, ep);
    }
}

/// 事件：数据包到达某端点。
#[derive(Debug)]
pub struct DeliverPacket {
    pub to: EndpointId,
    pub pkt: Packet,
}

impl Event for DeliverPacket {
    #[tracing::instrument(skip(self, sim, world), fields(to = ?self.to, seq = self.pkt.seq_num, ack = self.pkt.ack_num))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DeliverPacket { to, pkt } = *self;

        info!("📨 数据包到达端点");
        let w = world
            .as_any_mut()
            .downcast_mut::<ArqWorld>()
            .expect("world must be ArqWorld");

        w.chan.stats.arrived_pkts += 1;
        let now = sim.now().0;
        if let Some(t) = w.chan.trace.as_mut() {
            t.push(
                now,
                TraceEventKind::Arrive {
                    to,
                    seq: pkt.seq_num,
                    ack: pkt.ack_num,
                },
            );
        }

        let mut ep = w.take_endpoint(to);
        let mut ctx = EndpointCtx::new(to, &mut w.chan, sim);
        ep.on_packet_received(pkt, &mut ctx);
        w.put_endpoint(to, ep);
    }
}

/// 事件：连接定时器到期。
///
/// 停止或重启定时器会提升代数，使已在队列中的触发事件在执行时
/// 被识别为过期并忽略（显式取消是唯一的取消机制）。
#[derive(Debug)]
pub struct TimerFired {
    pub at: EndpointId,
    pub generation: u64,
}

impl Event for TimerFired {
    #[tracing::instrument(skip(self, sim, world), fields(at = ?self.at, generation = self.generation))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let TimerFired { at, generation } = *self;

        let w = world
            .as_any_mut()
            .downcast_mut::<ArqWorld>()
            .expect("world must be ArqWorld");

        if !w.chan.timer_is_current(at, generation) {
            trace!("过期的定时器触发事件，忽略");
            return;
        }

        info!("⏰ 连接定时器触发");
        w.chan.on_timer_fire(at, sim.now());

        let mut ep = w.take_endpoint(at);
        let mut ctx = EndpointCtx::new(at, &mut w.chan, sim);
        ep.on_timer_fired(&mut ctx);
        w.put_endpoint(at, ep);
    }
}
