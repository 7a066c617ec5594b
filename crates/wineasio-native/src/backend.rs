use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU64, AtomicU8};
use std::sync::Arc;

use wineasio_proto::NativeError;

use crate::channel::Channel;
use crate::mailbox::Mailbox;
use crate::midi::{MidiConsumer, MidiProducer};

/// Clock/phase state shared between the handler side and the real-time
/// callback: session state, current double-buffer phase, running sample
/// position and system time. All plain atomics — no lock is needed because
/// each field has exactly one writer in steady state (the real-time thread
/// updates the clock fields; the handler side only writes `state` and only
/// outside a concurrent callback per §5's "no T3 active" precondition).
pub struct SharedClock {
    pub state: AtomicU8,
    pub phase: AtomicU8,
    pub sample_position: AtomicI64,
    pub system_time: AtomicI64,
    pub buffer_size: AtomicU32,
    sample_rate_bits: AtomicU64,
}

impl SharedClock {
    pub fn new(sample_rate: f64, buffer_size: u32) -> Self {
        SharedClock {
            state: AtomicU8::new(crate::channel::SessionState::Loaded as u8),
            phase: AtomicU8::new(0),
            sample_position: AtomicI64::new(0),
            system_time: AtomicI64::new(0),
            buffer_size: AtomicU32::new(buffer_size),
            sample_rate_bits: AtomicU64::new(sample_rate.to_bits()),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        f64::from_bits(self.sample_rate_bits.load(std::sync::atomic::Ordering::Acquire))
    }

    pub fn set_sample_rate(&self, rate: f64) {
        self.sample_rate_bits.store(rate.to_bits(), std::sync::atomic::Ordering::Release);
    }
}

impl Default for SharedClock {
    fn default() -> Self {
        SharedClock::new(48_000.0, 1024)
    }
}

/// Everything a concrete backend needs to wire its real-time callback up to
/// the rest of the session, handed to [`Backend::open`] in one bundle.
pub struct BackendContext {
    pub client_name: String,
    pub num_inputs: u32,
    pub num_outputs: u32,
    pub want_midi: bool,
    pub channels_in: Arc<Vec<Arc<Channel>>>,
    pub channels_out: Arc<Vec<Arc<Channel>>>,
    pub clock: Arc<SharedClock>,
    pub mailbox: Arc<Mailbox>,
    pub midi_in_producer: MidiProducer,
    pub midi_out_consumer: MidiConsumer,
}

/// Abstracts the backend client lifecycle (open, autoconnect, deactivate) so
/// the native session's state-machine and handler logic can be exercised in
/// tests without a running JACK server. `open` both registers ports and
/// activates the client, matching the original's ordering (`jack_activate`
/// runs inside `asio_init`, well before `Start`). The real-time callback
/// registration itself is internal to each implementation — there is no
/// attempt to make the per-cycle copy loop generic, since real backends only
/// ever need one concrete implementation and the interesting behaviour to
/// test lives in the handlers, not in the memcpy.
pub trait Backend: Send {
    fn open(ctx: BackendContext) -> Result<Self, NativeError>
    where
        Self: Sized;

    fn sample_rate(&self) -> f64;
    fn buffer_size(&self) -> u32;

    fn deactivate(&mut self);

    /// Connects registered ports to the backend's physical ports, up to
    /// `min(configured count, physical count)`. No-op if autoconnect was
    /// disabled in configuration.
    fn autoconnect(&self);

    /// Best-effort latency report; falls back to a buffer-size-derived
    /// estimate when the backend doesn't expose a precise figure.
    fn input_latency(&self) -> u32;
    fn output_latency(&self) -> u32;
}
