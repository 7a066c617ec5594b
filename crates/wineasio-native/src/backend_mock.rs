//! In-memory [`Backend`] used by tests and by the `S1`–`S6` scenario suite:
//! no real JACK client, just the config values a real backend would report,
//! plus a way for a test to step the real-time path explicitly.

use std::sync::Arc;

use wineasio_proto::NativeError;

use crate::backend::{Backend, BackendContext, SharedClock};
use crate::channel::Channel;
use crate::mailbox::Mailbox;
use crate::midi::{MidiConsumer, MidiProducer};

pub struct MockBackend {
    clock: Arc<SharedClock>,
    pub channels_in: Arc<Vec<Arc<Channel>>>,
    pub channels_out: Arc<Vec<Arc<Channel>>>,
    pub mailbox: Arc<Mailbox>,
    pub midi_in_producer: MidiProducer,
    pub midi_out_consumer: MidiConsumer,
}

impl MockBackend {
    /// Drives one real-time cycle exactly as `backend_jack::process` would,
    /// against plain in-memory port buffers. Used by tests that need
    /// deterministic phase/sample-position stepping (S2, S3 in the testable
    /// properties).
    pub fn run_cycle(&self, n_frames: u32, inputs: &[Vec<f32>], outputs: &mut [Vec<f32>]) {
        use std::sync::atomic::Ordering;

        let running =
            self.clock.state.load(Ordering::Acquire) == crate::channel::SessionState::Running as u8;
        let phase = self.clock.phase.load(Ordering::Acquire);

        if !running {
            for buf in outputs.iter_mut() {
                buf.iter_mut().for_each(|s| *s = 0.0);
            }
            return;
        }

        for (i, src) in inputs.iter().enumerate() {
            if let Some(channel) = self.channels_in.get(i) {
                if channel.is_active() {
                    unsafe {
                        if let Some(dst) = channel.phase_slice_mut(phase) {
                            let n = dst.len().min(src.len());
                            dst[..n].copy_from_slice(&src[..n]);
                        }
                    }
                }
            }
        }

        for (i, dst) in outputs.iter_mut().enumerate() {
            match self.channels_out.get(i) {
                Some(channel) if channel.is_active() => unsafe {
                    if let Some(src) = channel.phase_slice_mut(phase) {
                        let n = dst.len().min(src.len());
                        dst[..n].copy_from_slice(&src[..n]);
                    }
                },
                _ => dst.iter_mut().for_each(|s| *s = 0.0),
            }
        }

        let new_position = self.clock.sample_position.fetch_add(n_frames as i64, Ordering::AcqRel)
            + n_frames as i64;
        let system_time = self.clock.system_time.fetch_add(1, Ordering::AcqRel) + 1;
        self.mailbox.publish_switch(phase, new_position, system_time);
        self.clock.phase.store(1 - phase, Ordering::Release);
    }
}

impl Backend for MockBackend {
    fn open(ctx: BackendContext) -> Result<Self, NativeError> {
        ctx.clock.set_sample_rate(48_000.0);
        ctx.clock.buffer_size.store(1024, std::sync::atomic::Ordering::Release);
        Ok(MockBackend {
            clock: ctx.clock,
            channels_in: ctx.channels_in,
            channels_out: ctx.channels_out,
            mailbox: ctx.mailbox,
            midi_in_producer: ctx.midi_in_producer,
            midi_out_consumer: ctx.midi_out_consumer,
        })
    }

    fn sample_rate(&self) -> f64 {
        self.clock.sample_rate()
    }

    fn buffer_size(&self) -> u32 {
        self.clock.buffer_size.load(std::sync::atomic::Ordering::Acquire)
    }

    fn deactivate(&mut self) {}

    fn autoconnect(&self) {
        // Nothing to connect: there is no real port graph in the mock.
    }

    fn input_latency(&self) -> u32 {
        self.buffer_size()
    }

    fn output_latency(&self) -> u32 {
        self.buffer_size() * 2
    }
}
