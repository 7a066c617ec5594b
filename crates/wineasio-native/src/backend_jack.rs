//! Real JACK-backed implementation of [`Backend`].
//!
//! Port registration and callback wiring follow the same order as the
//! original `asio_init`: register audio ports, conditionally register MIDI
//! ports, install the process/buffer-size/sample-rate/latency callbacks,
//! activate, then autoconnect to physical ports.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use jack::{
    AudioIn, AudioOut, Client, ClientOptions, Control, Frames, LatencyType, MidiIn, MidiOut,
    NotificationHandler, Port, ProcessScope,
};
use once_cell::sync::Lazy;
use wineasio_proto::NativeError;

use crate::backend::{Backend, BackendContext, SharedClock};
use crate::channel::{Channel, SessionState};
use crate::mailbox::Mailbox;
use crate::midi::{push_dropping_newest, MidiConsumer, MidiEvent, MidiProducer};

static PROCESS_EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

fn monotonic_now_ns() -> i64 {
    PROCESS_EPOCH.elapsed().as_nanos() as i64
}

struct ProcessState {
    channels_in: Arc<Vec<Arc<Channel>>>,
    channels_out: Arc<Vec<Arc<Channel>>>,
    ports_in: Vec<Port<AudioIn>>,
    ports_out: Vec<Port<AudioOut>>,
    midi_in_port: Option<Port<MidiIn>>,
    midi_out_port: Option<Port<MidiOut>>,
    midi_in_producer: MidiProducer,
    midi_out_consumer: MidiConsumer,
    clock: Arc<SharedClock>,
    mailbox: Arc<Mailbox>,
}

fn process(state: &mut ProcessState, _: &Client, ps: &ProcessScope) -> Control {
    let n_frames = ps.n_frames();

    if let Some(port) = &state.midi_in_port {
        for event in port.iter(ps) {
            push_dropping_newest(
                &mut state.midi_in_producer,
                MidiEvent::from_slice(event.bytes, event.time),
            );
        }
    }
    if let Some(port) = &mut state.midi_out_port {
        let mut writer = port.writer(ps);
        while let Some(event) = state.midi_out_consumer.pop() {
            let time = if n_frames > 0 { event.time % n_frames } else { 0 };
            let _ = writer.write(&jack::RawMidi { time, bytes: event.as_slice() });
        }
    }

    let running = state.clock.state.load(Ordering::Acquire) == SessionState::Running as u8;
    let phase = state.clock.phase.load(Ordering::Acquire);

    if !running {
        for port in state.ports_out.iter_mut() {
            port.as_mut_slice(ps).fill(0.0);
        }
        return Control::Continue;
    }

    for (i, port) in state.ports_in.iter().enumerate() {
        if let Some(channel) = state.channels_in.get(i) {
            if channel.is_active() {
                let src = port.as_slice(ps);
                unsafe {
                    if let Some(dst) = channel.phase_slice_mut(phase) {
                        let n = dst.len().min(src.len());
                        dst[..n].copy_from_slice(&src[..n]);
                    }
                }
            }
        }
    }

    for (i, port) in state.ports_out.iter_mut().enumerate() {
        match state.channels_out.get(i) {
            Some(channel) if channel.is_active() => {
                let dst = port.as_mut_slice(ps);
                unsafe {
                    if let Some(src) = channel.phase_slice_mut(phase) {
                        let n = dst.len().min(src.len());
                        dst[..n].copy_from_slice(&src[..n]);
                    } else {
                        dst.fill(0.0);
                    }
                }
            }
            _ => port.as_mut_slice(ps).fill(0.0),
        }
    }

    let new_position = state.clock.sample_position.fetch_add(n_frames as i64, Ordering::AcqRel)
        + n_frames as i64;
    let now = monotonic_now_ns();
    state.clock.system_time.store(now, Ordering::Release);

    state.mailbox.publish_switch(phase, new_position, now);
    state.clock.phase.store(1 - phase, Ordering::Release);

    Control::Continue
}

fn buffer_change(state: &mut ProcessState, _: &Client, len: Frames) -> Control {
    state.clock.buffer_size.store(len, Ordering::Release);
    state.mailbox.publish_reset_request();
    Control::Continue
}

type ProcessHandler =
    jack::ClosureProcessHandler<ProcessState, fn(&mut ProcessState, &Client, &ProcessScope) -> Control, fn(&mut ProcessState, &Client, Frames) -> Control>;

struct Notifications {
    clock: Arc<SharedClock>,
    mailbox: Arc<Mailbox>,
}

impl NotificationHandler for Notifications {
    fn sample_rate(&mut self, _: &Client, srate: Frames) -> Control {
        let rate = srate as f64;
        self.clock.set_sample_rate(rate);
        self.mailbox.publish_sample_rate_changed(rate);
        Control::Continue
    }

    fn latency(&mut self, _: &Client, _mode: LatencyType) -> Control {
        self.mailbox.publish_latency_changed();
        Control::Continue
    }
}

pub struct JackBackend {
    clock: Arc<SharedClock>,
    num_inputs: u32,
    num_outputs: u32,
    physical_in: Vec<String>,
    physical_out: Vec<String>,
    in_port_names: Vec<String>,
    out_port_names: Vec<String>,
    async_client: Option<jack::AsyncClient<Notifications, ProcessHandler>>,
}

impl Backend for JackBackend {
    fn open(ctx: BackendContext) -> Result<Self, NativeError> {
        let (client, _status) = Client::new(&ctx.client_name, ClientOptions::NO_START_SERVER)
            .map_err(|_| NativeError::BackendUnavailable)?;

        let mut ports_in = Vec::with_capacity(ctx.num_inputs as usize);
        let mut in_port_names = Vec::with_capacity(ctx.num_inputs as usize);
        for i in 0..ctx.num_inputs {
            let name = format!("in_{}", i + 1);
            let port = client
                .register_port(&name, AudioIn::default())
                .map_err(|_| NativeError::PortRegistrationFailed { channel: i as usize })?;
            in_port_names.push(name);
            ports_in.push(port);
        }

        let mut ports_out = Vec::with_capacity(ctx.num_outputs as usize);
        let mut out_port_names = Vec::with_capacity(ctx.num_outputs as usize);
        for i in 0..ctx.num_outputs {
            let name = format!("out_{}", i + 1);
            let port = client
                .register_port(&name, AudioOut::default())
                .map_err(|_| NativeError::PortRegistrationFailed { channel: i as usize })?;
            out_port_names.push(name);
            ports_out.push(port);
        }

        let (midi_in_port, midi_out_port) = if ctx.want_midi {
            let in_port = client.register_port("midi_in", MidiIn::default()).ok();
            let out_port = client.register_port("midi_out", MidiOut::default()).ok();
            match (in_port, out_port) {
                (Some(i), Some(o)) => (Some(i), Some(o)),
                _ => (None, None),
            }
        } else {
            (None, None)
        };

        let physical_in: Vec<String> = client
            .ports(None, None, jack::PortFlags::IS_OUTPUT | jack::PortFlags::IS_PHYSICAL)
            .into_iter()
            .collect();
        let physical_out: Vec<String> = client
            .ports(None, None, jack::PortFlags::IS_INPUT | jack::PortFlags::IS_PHYSICAL)
            .into_iter()
            .collect();

        let clock = ctx.clock;
        clock.set_sample_rate(client.sample_rate() as f64);
        clock.buffer_size.store(client.buffer_size(), Ordering::Release);

        let process_state = ProcessState {
            channels_in: ctx.channels_in,
            channels_out: ctx.channels_out,
            ports_in,
            ports_out,
            midi_in_port,
            midi_out_port,
            midi_in_producer: ctx.midi_in_producer,
            midi_out_consumer: ctx.midi_out_consumer,
            clock: Arc::clone(&clock),
            mailbox: Arc::clone(&ctx.mailbox),
        };

        let process_fn: fn(&mut ProcessState, &Client, &ProcessScope) -> Control = process;
        let buffer_fn: fn(&mut ProcessState, &Client, Frames) -> Control = buffer_change;
        let process_handler = jack::ClosureProcessHandler::with_state(process_state, process_fn, buffer_fn);

        let notifications = Notifications { clock: Arc::clone(&clock), mailbox: Arc::clone(&ctx.mailbox) };

        let async_client = client
            .activate_async(notifications, process_handler)
            .map_err(|_| NativeError::HardwareMalfunction)?;

        Ok(JackBackend {
            clock,
            num_inputs: ctx.num_inputs,
            num_outputs: ctx.num_outputs,
            physical_in,
            physical_out,
            in_port_names,
            out_port_names,
            async_client: Some(async_client),
        })
    }

    fn sample_rate(&self) -> f64 {
        self.clock.sample_rate()
    }

    fn buffer_size(&self) -> u32 {
        self.clock.buffer_size.load(Ordering::Acquire)
    }

    fn deactivate(&mut self) {
        if let Some(async_client) = self.async_client.take() {
            let _ = async_client.deactivate();
        }
    }

    fn autoconnect(&self) {
        let Some(async_client) = &self.async_client else { return };
        let client = async_client.as_client();

        for (i, physical) in self.physical_in.iter().enumerate().take(self.num_inputs as usize) {
            if let Some(ours) = self.in_port_names.get(i) {
                let _ = client.connect_ports_by_name(physical, ours);
            }
        }
        for (i, physical) in self.physical_out.iter().enumerate().take(self.num_outputs as usize) {
            if let Some(ours) = self.out_port_names.get(i) {
                let _ = client.connect_ports_by_name(ours, physical);
            }
        }
    }

    fn input_latency(&self) -> u32 {
        self.buffer_size()
    }

    fn output_latency(&self) -> u32 {
        self.buffer_size() * 2
    }
}

impl Drop for JackBackend {
    fn drop(&mut self) {
        self.deactivate();
    }
}
