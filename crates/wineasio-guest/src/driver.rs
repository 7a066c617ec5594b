//! The Guest Driver Object's per-session logic (§4.2): owns the transport,
//! the guest-side buffer block, and the notifier thread; translates ABI
//! calls into Transport round trips against the native session.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use wineasio_proto::{
    BufferBinding, ChannelInfo, Direction, Request, SessionConfig, StatusCode, TimeInfo,
};

use crate::abi::AsioDriver;
use crate::buffer::GuestBufferBlock;
use crate::callbacks::HostCallbacks;
use crate::notifier::Notifier;
use crate::transport::Transport;

pub struct GuestDriver<T: Transport> {
    transport: Arc<Mutex<T>>,
    config: SessionConfig,
    initialized: bool,
    num_inputs: i32,
    num_outputs: i32,
    sample_rate: f64,
    uses_time_info_mode: bool,
    buffer_block: Option<GuestBufferBlock>,
    callbacks: Option<Arc<Mutex<Box<dyn HostCallbacks>>>>,
    notifier: Option<Notifier>,
}

impl<T: Transport + 'static> GuestDriver<T> {
    /// Exposes the shared transport handle for tests that need to reach
    /// through to a fake native session's internals (e.g. stepping a
    /// `MockBackend` cycle directly) rather than going through the wire.
    pub fn transport(&self) -> &Arc<Mutex<T>> {
        &self.transport
    }

    pub fn new(transport: T) -> Self {
        GuestDriver {
            transport: Arc::new(Mutex::new(transport)),
            config: SessionConfig::default(),
            initialized: false,
            num_inputs: 0,
            num_outputs: 0,
            sample_rate: 0.0,
            uses_time_info_mode: false,
            buffer_block: None,
            callbacks: None,
            notifier: None,
        }
    }

    fn call(&self, request: Request) -> wineasio_proto::Reply {
        match self.transport.lock().call(request) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "transport call failed");
                error_reply_not_present()
            }
        }
    }

    /// Runs at reference count zero (`DriverObject::release`) and from
    /// `Exit`-adjacent teardown paths: joins the notifier, frees the buffer
    /// block, and tells the native side the session is gone.
    pub(crate) fn teardown(&mut self) {
        if let Some(notifier) = self.notifier.take() {
            notifier.stop();
        }
        if self.initialized {
            let _ = self.call(Request::Exit);
        }
        self.buffer_block = None;
        self.callbacks = None;
        self.initialized = false;
    }
}

impl<T: Transport + 'static> AsioDriver for GuestDriver<T> {
    fn init(&mut self, config: SessionConfig) -> bool {
        if self.initialized {
            warn!("init called on an already-initialised driver object");
            return false;
        }

        let reply = self.call(Request::Init { config: config.clone() });
        match reply {
            wineasio_proto::Reply::Init { result, input_channels, output_channels, sample_rate, .. }
                if result.is_ok() =>
            {
                self.config = config;
                self.num_inputs = input_channels;
                self.num_outputs = output_channels;
                self.sample_rate = sample_rate;
                self.initialized = true;
                info!(input_channels, output_channels, sample_rate, "driver object initialised");
                true
            }
            _ => false,
        }
    }

    fn driver_name(&self) -> &'static str {
        "WineASIO"
    }

    fn driver_version(&self) -> i32 {
        13
    }

    fn error_message(&self) -> &'static str {
        "No error"
    }

    fn start(&mut self) -> StatusCode {
        let Some(callbacks) = self.callbacks.clone() else {
            warn!("start called with no buffers created");
            return StatusCode::InvalidMode;
        };

        let reply = self.call(Request::Start);
        let result = reply_status(&reply);
        if !result.is_ok() {
            return result;
        }

        // Prime the host once on the calling thread before the notifier
        // thread takes over (§4.2 "Priming is part of the host ABI").
        {
            let mut guard = callbacks.lock();
            if self.uses_time_info_mode {
                let time_info = TimeInfo { speed: 1.0, system_time: 0, sample_position: 0, sample_rate: self.sample_rate, flags: 0x7 };
                let _ = guard.buffer_switch_time_info(time_info, 0, true);
            } else {
                guard.buffer_switch(0, true);
            }
        }

        self.notifier = Some(Notifier::spawn(Arc::clone(&self.transport), callbacks, self.uses_time_info_mode));
        StatusCode::Ok
    }

    fn stop(&mut self) -> StatusCode {
        if let Some(notifier) = self.notifier.take() {
            notifier.stop();
        }
        let reply = self.call(Request::Stop);
        reply_status(&reply)
    }

    fn get_channels(&mut self) -> Result<(i32, i32), StatusCode> {
        match self.call(Request::GetChannels) {
            wineasio_proto::Reply::GetChannels { result, num_inputs, num_outputs } if result.is_ok() => {
                Ok((num_inputs, num_outputs))
            }
            reply => Err(reply_status(&reply)),
        }
    }

    fn get_latencies(&mut self) -> Result<(i32, i32), StatusCode> {
        match self.call(Request::GetLatencies) {
            wineasio_proto::Reply::GetLatencies { result, input_latency, output_latency } if result.is_ok() => {
                Ok((input_latency, output_latency))
            }
            reply => Err(reply_status(&reply)),
        }
    }

    fn get_buffer_size(&mut self) -> Result<(i32, i32, i32, i32), StatusCode> {
        match self.call(Request::GetBufferSize) {
            wineasio_proto::Reply::GetBufferSize { result, min_size, max_size, preferred_size, granularity }
                if result.is_ok() =>
            {
                Ok((min_size, max_size, preferred_size, granularity))
            }
            reply => Err(reply_status(&reply)),
        }
    }

    fn can_sample_rate(&mut self, rate: f64) -> StatusCode {
        reply_status(&self.call(Request::CanSampleRate { sample_rate: rate }))
    }

    fn get_sample_rate(&mut self) -> Result<f64, StatusCode> {
        match self.call(Request::GetSampleRate) {
            wineasio_proto::Reply::GetSampleRate { result, sample_rate } if result.is_ok() => Ok(sample_rate),
            reply => Err(reply_status(&reply)),
        }
    }

    fn set_sample_rate(&mut self, rate: f64) -> StatusCode {
        reply_status(&self.call(Request::SetSampleRate { sample_rate: rate }))
    }

    fn get_clock_sources(&self) -> StatusCode {
        StatusCode::Ok
    }

    fn set_clock_source(&mut self, _source: i32) -> StatusCode {
        StatusCode::Ok
    }

    fn get_sample_position(&mut self) -> Result<(i64, i64), StatusCode> {
        match self.call(Request::GetSamplePosition) {
            wineasio_proto::Reply::GetSamplePosition { result, sample_position, system_time } if result.is_ok() => {
                Ok((sample_position, system_time))
            }
            reply => Err(reply_status(&reply)),
        }
    }

    fn get_channel_info(&mut self, direction: Direction, channel: i32) -> Result<ChannelInfo, StatusCode> {
        match self.call(Request::GetChannelInfo { direction, channel }) {
            wineasio_proto::Reply::GetChannelInfo { result, info: Some(info) } if result.is_ok() => Ok(info),
            reply => Err(reply_status(&reply)),
        }
    }

    fn create_buffers(
        &mut self,
        bindings: &[(Direction, i32)],
        buffer_size: i32,
        mut callbacks: Box<dyn HostCallbacks>,
    ) -> Result<Vec<u64>, StatusCode> {
        if bindings.is_empty() || buffer_size <= 0 {
            return Err(StatusCode::InvalidParameter);
        }

        // Capability query (§4.2 step 2): selector 1 is "can you do `value`?";
        // 14/15 are the time-info/time-code capability codes.
        self.uses_time_info_mode = callbacks.message(1, 14) != 0;
        let _can_time_code = callbacks.message(1, 15) != 0;
        let callbacks: Arc<Mutex<Box<dyn HostCallbacks>>> = Arc::new(Mutex::new(callbacks));

        let num_channels = (self.num_inputs + self.num_outputs) as u32;
        let mut block = GuestBufferBlock::create(num_channels, buffer_size as u32)
            .map_err(|_| StatusCode::NoMemory)?;

        let mut wire_bindings = Vec::with_capacity(bindings.len());
        let mut pointers = Vec::with_capacity(bindings.len());
        for &(direction, channel) in bindings {
            let global_index = match direction {
                Direction::Input => channel as usize,
                Direction::Output => self.num_inputs as usize + channel as usize,
            };
            let phase0_offset = block.phase_offset(global_index, 0);
            pointers.push(block.phase_ptr(global_index, 0));
            wire_bindings.push(BufferBinding { direction, channel, phase0_offset });
        }

        let reply = self.call(Request::CreateBuffers {
            bindings: wire_bindings,
            buffer_size,
            shm_path: block.shm_path(),
        });

        match reply {
            wineasio_proto::Reply::CreateBuffers { result, .. } if result.is_ok() => {
                self.buffer_block = Some(block);
                self.callbacks = Some(callbacks);
                Ok(pointers)
            }
            other => Err(reply_status(&other)),
        }
    }

    fn dispose_buffers(&mut self) -> StatusCode {
        if let Some(notifier) = self.notifier.take() {
            notifier.stop();
        }
        let status = reply_status(&self.call(Request::DisposeBuffers));
        // §4.2: DisposeBuffers clears the stored callbacks; a subsequent
        // Start with no intervening CreateBuffers must fail.
        self.callbacks = None;
        status
    }

    fn control_panel(&self) -> StatusCode {
        if crate::control_panel::launch() {
            StatusCode::Ok
        } else {
            StatusCode::NotPresent
        }
    }

    fn future(&mut self, selector: i32, opt: u64) -> StatusCode {
        debug!(selector, opt, "future selector forwarded to native session");
        reply_status(&self.call(Request::Future { selector, opt }))
    }

    fn output_ready(&mut self) -> StatusCode {
        reply_status(&self.call(Request::OutputReady))
    }
}

fn reply_status(reply: &wineasio_proto::Reply) -> StatusCode {
    reply.result()
}

fn error_reply_not_present() -> wineasio_proto::Reply {
    wineasio_proto::Reply::Init {
        result: StatusCode::NotPresent,
        handle: 0,
        input_channels: 0,
        output_channels: 0,
        sample_rate: 0.0,
    }
}
