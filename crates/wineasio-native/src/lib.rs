//! Native-side session host: JACK backend client, state machine, real-time
//! callback, and the transport server that drives it from the guest process.

pub mod backend;
pub mod backend_jack;
pub mod backend_mock;
pub mod channel;
pub mod handlers;
pub mod mailbox;
pub mod midi;
pub mod server;
pub mod session;

pub use backend::{Backend, BackendContext, SharedClock};
pub use backend_jack::JackBackend;
pub use backend_mock::MockBackend;
pub use channel::{Channel, SessionState};
pub use session::NativeSession;
