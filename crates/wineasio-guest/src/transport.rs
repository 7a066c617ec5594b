//! The cross-world call channel's guest-side half (§4.1): a synchronous
//! request/reply call routed to exactly one handler on the native side.
//! MUST NOT be called from a real-time context — there is none on the guest
//! side, so that discipline is trivially kept here.

use wineasio_proto::{Reply, Request, TransportError};

/// Abstracts "somewhere that answers a [`Request`] with a [`Reply`]" so the
/// driver object's logic can be exercised against an in-process mock in
/// tests and against a real subprocess in production, the same way the
/// native session's `Backend` trait abstracts the JACK client.
pub trait Transport: Send {
    fn call(&mut self, request: Request) -> Result<Reply, TransportError>;
}
