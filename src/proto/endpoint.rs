//! Endpoint interface exposed to the channel/simulator.

use crate::chan::EndpointCtx;
use crate::pkt::{Msg, Packet};

/// One protocol endpoint (the A-side sender or the B-side receiver).
///
/// The simulator delivers exactly three external event kinds, strictly
/// sequentially; every handler runs to completion against the ctx and
/// never blocks. All state behind `&mut self` is private to this endpoint.
pub trait ArqEndpoint: Send {
    /// Called once before any other handler.
    fn on_init(&mut self, ctx: &mut EndpointCtx);

    /// The application hands over one message for reliable delivery.
    fn on_send_request(&mut self, msg: Msg, ctx: &mut EndpointCtx);

    /// A packet (data or ack, possibly corrupted) arrived from the channel.
    fn on_packet_received(&mut self, pkt: Packet, ctx: &mut EndpointCtx);

    /// This endpoint's connection-wide timer expired.
    fn on_timer_fired(&mut self, ctx: &mut EndpointCtx);
}
