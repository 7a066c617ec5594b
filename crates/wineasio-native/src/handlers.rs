//! Maps each [`Request`] variant onto the matching [`NativeSession`] method
//! and wraps the result back up as the paired [`Reply`] variant. One match
//! arm per transport op (§4.3); this is the only place that touches both
//! the wire types and the session API.

use wineasio_proto::{ChannelInfo, FutureSelector, Reply, Request, StatusCode};

use crate::backend::Backend;
use crate::session::NativeSession;

/// Dispatches one request against a session, producing its reply. Never
/// panics: every session method already turns failure into a `NativeError`,
/// which this function folds into the reply's `result` field.
pub fn dispatch<B: Backend>(session: &mut NativeSession<B>, request: Request) -> Reply {
    match request {
        Request::Init { config } => match session.init(config) {
            Ok((input_channels, output_channels, sample_rate)) => Reply::Init {
                result: StatusCode::Ok,
                handle: 1,
                input_channels,
                output_channels,
                sample_rate,
            },
            Err(e) => Reply::Init {
                result: e.status(),
                handle: 0,
                input_channels: 0,
                output_channels: 0,
                sample_rate: 0.0,
            },
        },

        Request::Exit => Reply::Exit { result: status_of(session.exit()) },

        Request::Start => Reply::Start { result: status_of(session.start()) },

        Request::Stop => Reply::Stop { result: status_of(session.stop()) },

        Request::GetChannels => {
            let (num_inputs, num_outputs) = session.get_channels();
            Reply::GetChannels { result: StatusCode::Ok, num_inputs, num_outputs }
        }

        Request::GetLatencies => match session.get_latencies() {
            Ok((input_latency, output_latency)) => {
                Reply::GetLatencies { result: StatusCode::Ok, input_latency, output_latency }
            }
            Err(e) => Reply::GetLatencies { result: e.status(), input_latency: 0, output_latency: 0 },
        },

        Request::GetBufferSize => match session.get_buffer_size() {
            Ok((min_size, max_size, preferred_size, granularity)) => Reply::GetBufferSize {
                result: StatusCode::Ok,
                min_size,
                max_size,
                preferred_size,
                granularity,
            },
            Err(e) => Reply::GetBufferSize {
                result: e.status(),
                min_size: 0,
                max_size: 0,
                preferred_size: 0,
                granularity: 0,
            },
        },

        Request::CanSampleRate { sample_rate } => {
            Reply::CanSampleRate { result: status_of(session.can_sample_rate(sample_rate)) }
        }

        Request::GetSampleRate => match session.get_sample_rate() {
            Ok(sample_rate) => Reply::GetSampleRate { result: StatusCode::Ok, sample_rate },
            Err(e) => Reply::GetSampleRate { result: e.status(), sample_rate: 0.0 },
        },

        Request::SetSampleRate { sample_rate } => {
            Reply::SetSampleRate { result: status_of(session.set_sample_rate(sample_rate)) }
        }

        Request::GetChannelInfo { direction, channel } => match session.get_channel_info(direction, channel) {
            Ok(info) => Reply::GetChannelInfo { result: StatusCode::Ok, info: Some(info) },
            Err(e) => Reply::GetChannelInfo { result: e.status(), info: None::<ChannelInfo> },
        },

        Request::CreateBuffers { bindings, buffer_size, shm_path } => {
            match session.create_buffers(&bindings, buffer_size, shm_path) {
                Ok(offsets) => Reply::CreateBuffers { result: StatusCode::Ok, offsets },
                Err(e) => Reply::CreateBuffers { result: e.status(), offsets: Vec::new() },
            }
        }

        Request::DisposeBuffers => Reply::DisposeBuffers { result: status_of(session.dispose_buffers()) },

        Request::OutputReady => Reply::OutputReady { result: status_of(session.output_ready()) },

        Request::GetSamplePosition => {
            let (sample_position, system_time) = session.get_sample_position();
            Reply::GetSamplePosition { result: StatusCode::Ok, sample_position, system_time }
        }

        Request::GetCallback => {
            let n = session.get_callback();
            Reply::GetCallback {
                result: StatusCode::Ok,
                buffer_switch_ready: n.switch_pending,
                buffer_index: n.pending_phase as i32,
                time_info: session.time_info_snapshot(),
                sample_rate_changed: n.sample_rate_changed,
                new_sample_rate: n.new_sample_rate,
                reset_request: n.reset_request,
                latency_changed: n.latency_changed,
            }
        }

        Request::CallbackDone { phase: _ } => Reply::CallbackDone { result: status_of(session.callback_done()) },

        Request::ControlPanel => Reply::ControlPanel { result: status_of(session.control_panel()) },

        Request::Future { selector, opt } => {
            // §4.3: only the time-info/time-code capability query and its
            // enable/disable pair succeed; every other selector in the
            // closed enumeration reports "not present" rather than guessing.
            let result = FutureSelector::from_raw(selector).map(FutureSelector::handle).unwrap_or(StatusCode::NotPresent);
            Reply::Future { result, opt }
        }
    }
}

fn status_of(result: Result<(), wineasio_proto::NativeError>) -> StatusCode {
    match result {
        Ok(()) => StatusCode::Ok,
        Err(e) => e.status(),
    }
}
