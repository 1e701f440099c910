//! Collaborator surface handed to protocol endpoints.

use super::channel::Channel;
use super::id::EndpointId;
use crate::pkt::{Msg, Packet};
use crate::sim::{SimTime, Simulator};

/// Everything an ARQ endpoint may ask of the outside world while handling
/// one event: hand packets to the channel, deliver messages upward, drive
/// the connection-wide timer, and read the simulated clock.
///
/// Constructed per dispatch; endpoints never hold on to it.
pub struct EndpointCtx<'a> {
    side: EndpointId,
    pub chan: &'a mut Channel,
    pub sim: &'a mut Simulator,
}

impl<'a> EndpointCtx<'a> {
    pub fn new(side: EndpointId, chan: &'a mut Channel, sim: &'a mut Simulator) -> Self {
        Self { side, chan, sim }
    }

    pub fn side(&self) -> EndpointId {
        self.side
    }

    /// Monotonic simulated clock, read-only.
    pub fn now(&self) -> SimTime {
        self.sim.now()
    }

    /// Hand a packet to the unreliable channel.
    pub fn to_channel(&mut self, pkt: Packet) {
        self.chan.send_from(self.side, pkt, self.sim, false);
    }

    /// Same as [`to_channel`](Self::to_channel), counted as a
    /// timeout-driven retransmission.
    pub fn resend_to_channel(&mut self, pkt: Packet) {
        self.chan.send_from(self.side, pkt, self.sim, true);
    }

    /// Deliver a fully reassembled, in-order message upward.
    pub fn to_application(&mut self, msg: Msg) {
        let now = self.sim.now();
        self.chan.deliver_up(self.side, msg, now);
    }

    /// (Re)start this endpoint's single connection-wide timer.
    pub fn start_timer(&mut self, interval: SimTime) {
        self.chan.start_conn_timer(self.side, interval, self.sim);
    }

    /// Stop this endpoint's connection-wide timer.
    pub fn stop_timer(&mut self) {
        self.chan.stop_conn_timer(self.side);
    }
}
