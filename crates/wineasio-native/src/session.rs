use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::{debug, info, warn};
use wineasio_proto::{
    BufferBinding, BufferOffsets, ChannelInfo, Direction, NativeError, SampleType, SessionConfig,
    TimeInfo,
};
use wineasio_shm::BufferBlock;

use crate::backend::{Backend, BackendContext, SharedClock};
use crate::channel::{Channel, SessionState};
use crate::mailbox::Mailbox;
use crate::midi::midi_ring;

/// The native-side half of one driver instance: backend client, channel
/// table, buffer block, state machine. One per `Init`; destroyed on `Exit`.
pub struct NativeSession<B: Backend> {
    config: SessionConfig,
    clock: Arc<SharedClock>,
    mailbox: Arc<Mailbox>,
    channels_in: Arc<Vec<Arc<Channel>>>,
    channels_out: Arc<Vec<Arc<Channel>>>,
    buffer_block: Option<BufferBlock>,
    backend: Option<B>,
}

impl<B: Backend> NativeSession<B> {
    pub fn new() -> Self {
        NativeSession {
            config: SessionConfig::default(),
            clock: Arc::new(SharedClock::default()),
            mailbox: Arc::new(Mailbox::new()),
            channels_in: Arc::new(Vec::new()),
            channels_out: Arc::new(Vec::new()),
            buffer_block: None,
            backend: None,
        }
    }

    fn state(&self) -> SessionState {
        SessionState::from_u8(self.clock.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: SessionState) {
        self.clock.state.store(state as u8, Ordering::Release);
    }

    fn channel(&self, direction: Direction, index: i32) -> Option<&Arc<Channel>> {
        if index < 0 {
            return None;
        }
        let table = match direction {
            Direction::Input => &self.channels_in,
            Direction::Output => &self.channels_out,
        };
        table.get(index as usize)
    }

    /// §4.2 Init. Opens the backend, registers ports for every configured
    /// channel, and transitions Loaded → Initialised.
    pub fn init(&mut self, config: SessionConfig) -> Result<(i32, i32, f64), NativeError> {
        if self.state() != SessionState::Loaded {
            warn!("init called on an already-initialised session");
            return Err(NativeError::InvalidState { expected: "Loaded", found: "other" });
        }

        let config = config.normalized();
        let num_inputs = config.num_inputs as u32;
        let num_outputs = config.num_outputs as u32;

        let channels_in: Vec<Arc<Channel>> = (0..num_inputs as usize)
            .map(|i| Arc::new(Channel::new(Direction::Input, i, format!("in_{}", i + 1))))
            .collect();
        let channels_out: Vec<Arc<Channel>> = (0..num_outputs as usize)
            .map(|i| Arc::new(Channel::new(Direction::Output, i, format!("out_{}", i + 1))))
            .collect();

        let (midi_in_producer, midi_in_consumer) = midi_ring();
        let (midi_out_producer, midi_out_consumer) = midi_ring();
        // The output ring's producer side and the input ring's consumer side
        // have no feeder/reader anywhere in this core (see `midi` module
        // docs) and are simply held here so the rings stay valid.
        let _unused_midi_in_consumer = midi_in_consumer;
        let _unused_midi_out_producer = midi_out_producer;

        self.channels_in = Arc::new(channels_in);
        self.channels_out = Arc::new(channels_out);

        let ctx = BackendContext {
            client_name: config.client_name.clone(),
            num_inputs,
            num_outputs,
            want_midi: true,
            channels_in: Arc::clone(&self.channels_in),
            channels_out: Arc::clone(&self.channels_out),
            clock: Arc::clone(&self.clock),
            mailbox: Arc::clone(&self.mailbox),
            midi_in_producer,
            midi_out_consumer,
        };

        let backend = B::open(ctx)?;
        let sample_rate = backend.sample_rate();

        if config.autoconnect {
            backend.autoconnect();
        }

        self.config = config;
        self.backend = Some(backend);
        self.set_state(SessionState::Initialised);

        info!(
            inputs = num_inputs,
            outputs = num_outputs,
            sample_rate,
            "native session initialised"
        );

        Ok((num_inputs as i32, num_outputs as i32, sample_rate))
    }

    pub fn exit(&mut self) -> Result<(), NativeError> {
        if let Some(mut backend) = self.backend.take() {
            backend.deactivate();
        }
        self.buffer_block = None;
        self.set_state(SessionState::Loaded);
        Ok(())
    }

    pub fn get_channels(&self) -> (i32, i32) {
        (self.channels_in.len() as i32, self.channels_out.len() as i32)
    }

    /// Exposes the backend for tests that need to step the real-time path
    /// directly (`MockBackend::run_cycle`) instead of going through a real
    /// callback thread.
    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn get_latencies(&self) -> Result<(i32, i32), NativeError> {
        let backend = self.backend.as_ref().ok_or(NativeError::BackendUnavailable)?;
        Ok((backend.input_latency() as i32, backend.output_latency() as i32))
    }

    pub fn get_buffer_size(&self) -> Result<(i32, i32, i32, i32), NativeError> {
        let backend = self.backend.as_ref().ok_or(NativeError::BackendUnavailable)?;
        let current = backend.buffer_size() as i32;
        if self.config.fixed_bufsize {
            Ok((current, current, current, 0))
        } else {
            Ok((16, 8192, self.config.preferred_bufsize, 1))
        }
    }

    pub fn get_sample_rate(&self) -> Result<f64, NativeError> {
        let backend = self.backend.as_ref().ok_or(NativeError::BackendUnavailable)?;
        Ok(backend.sample_rate())
    }

    /// §4.2 CanSampleRate. Supported iff the floor matches the backend's
    /// current rate — the backend owns the clock.
    pub fn can_sample_rate(&self, rate: f64) -> Result<(), NativeError> {
        let current = self.get_sample_rate()?;
        if rate.floor() == current.floor() {
            Ok(())
        } else {
            Err(NativeError::UnsupportedSampleRate { requested: rate, current })
        }
    }

    pub fn set_sample_rate(&self, rate: f64) -> Result<(), NativeError> {
        self.can_sample_rate(rate)
    }

    pub fn get_channel_info(&self, direction: Direction, channel: i32) -> Result<ChannelInfo, NativeError> {
        let ch = self
            .channel(direction, channel)
            .ok_or(NativeError::InvalidParameter("channel index out of range"))?;
        Ok(ChannelInfo {
            channel,
            direction,
            is_active: ch.is_active(),
            channel_group: 0,
            sample_type: SampleType::Float32Lsb,
            name: ch.name.clone(),
        })
    }

    /// §4.2 CreateBuffers. Opens the buffer block the guest side already
    /// created at `shm_path` and re-publishes every requested channel's
    /// phase pointers into it; a prior buffer set is dropped only after the
    /// new one is ready (Prepared → Prepared re-registers per the Open
    /// Question resolved in `DESIGN.md`).
    pub fn create_buffers(
        &mut self,
        bindings: &[BufferBinding],
        buffer_size: i32,
        shm_path: String,
    ) -> Result<Vec<BufferOffsets>, NativeError> {
        let state = self.state();
        if state != SessionState::Initialised && state != SessionState::Prepared {
            return Err(NativeError::InvalidState { expected: "Initialised or Prepared", found: "other" });
        }
        if bindings.is_empty() || buffer_size <= 0 {
            return Err(NativeError::InvalidParameter("create_buffers requires n > 0"));
        }
        for b in bindings {
            if self.channel(b.direction, b.channel).is_none() {
                return Err(NativeError::InvalidParameter("channel index out of range"));
            }
        }

        let num_channels = self.channels_in.len() + self.channels_out.len();
        let descriptor = wineasio_shm::BufferBlockDescriptor {
            path: shm_path.into(),
            num_channels: num_channels as u32,
            buffer_size: buffer_size as u32,
        };
        let mut block =
            BufferBlock::open(descriptor).map_err(|_| NativeError::BufferAllocationFailed)?;

        let mut offsets = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let ch = self.channel(binding.direction, binding.channel).expect("validated above");
            let global_index = match binding.direction {
                Direction::Input => binding.channel as usize,
                Direction::Output => self.channels_in.len() + binding.channel as usize,
            };
            let phase0 = block.phase_slice_mut(global_index, 0).as_mut_ptr();
            let phase1 = block.phase_slice_mut(global_index, 1).as_mut_ptr();
            ch.publish(phase0, phase1, buffer_size as u32);
            offsets.push(BufferOffsets {
                phase0_offset: block.descriptor().phase_offset(global_index, 0),
                phase1_offset: block.descriptor().phase_offset(global_index, 1),
            });
        }

        self.buffer_block = Some(block);
        self.set_state(SessionState::Prepared);
        Ok(offsets)
    }

    /// §4.2 DisposeBuffers. Deactivates every channel; keeps the mapping
    /// alive until the next `CreateBuffers` or `Exit` (§4.2 rationale: the
    /// host cannot touch the buffers once this returns).
    pub fn dispose_buffers(&mut self) -> Result<(), NativeError> {
        let state = self.state();
        if state != SessionState::Prepared && state != SessionState::Running {
            return Err(NativeError::InvalidState { expected: "Prepared or Running", found: "other" });
        }
        for ch in self.channels_in.iter().chain(self.channels_out.iter()) {
            ch.deactivate();
        }
        self.set_state(SessionState::Initialised);
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), NativeError> {
        if self.state() != SessionState::Prepared {
            return Err(NativeError::InvalidState { expected: "Prepared", found: "other" });
        }
        self.clock.sample_position.store(0, Ordering::Release);
        self.clock.phase.store(0, Ordering::Release);
        self.set_state(SessionState::Running);
        debug!("native session started");
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), NativeError> {
        if self.state() != SessionState::Running {
            return Err(NativeError::InvalidState { expected: "Running", found: "other" });
        }
        self.set_state(SessionState::Prepared);
        debug!("native session stopped");
        Ok(())
    }

    pub fn output_ready(&self) -> Result<(), NativeError> {
        Err(NativeError::NotPresent)
    }

    pub fn get_sample_position(&self) -> (i64, i64) {
        (
            self.clock.sample_position.load(Ordering::Acquire),
            self.clock.system_time.load(Ordering::Acquire),
        )
    }

    /// §4.6 step 1. One-shot snapshot-and-clear of the notification mailbox.
    pub fn get_callback(&self) -> crate::mailbox::Notification {
        self.mailbox.take()
    }

    pub fn callback_done(&self) -> Result<(), NativeError> {
        Ok(())
    }

    /// §4.2 ControlPanel. No GUI lives in this process; the guest side is
    /// responsible for anything user-facing, so this is a no-op that always
    /// reports success, matching hosts that never call it in headless use.
    pub fn control_panel(&self) -> Result<(), NativeError> {
        debug!("control panel requested (no-op on the native side)");
        Ok(())
    }

    pub fn time_info_snapshot(&self) -> TimeInfo {
        let (sample_position, system_time) = self.get_sample_position();
        TimeInfo {
            speed: 1.0,
            system_time,
            sample_position,
            sample_rate: self.clock.sample_rate(),
            flags: 0x7,
        }
    }
}

impl<B: Backend> Default for NativeSession<B> {
    fn default() -> Self {
        Self::new()
    }
}
