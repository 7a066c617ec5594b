use serde::{Deserialize, Serialize};

use crate::status::StatusCode;
use crate::Direction;

/// Sample type tag, carried in `ChannelInfo` for parity with the original
/// `ASIOSampleType` enumeration. The core only ever produces `Float32Lsb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum SampleType {
    Float32Lsb = 19,
}

/// One entry of a `CreateBuffers` request: which channel to bind and the
/// shared-memory offset (in bytes, from the start of the buffer block) of its
/// phase-0 slot. The native side derives the phase-1 slot as `phase0 + buffer_size * 4`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferBinding {
    pub direction: Direction,
    pub channel: i32,
    pub phase0_offset: u64,
}

/// Per-channel buffer addresses returned after a successful `CreateBuffers`,
/// expressed as byte offsets into the shared buffer-block mapping (see
/// `wineasio-shm`). The guest side turns these back into real pointers by
/// adding its own mapping's base address.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BufferOffsets {
    pub phase0_offset: u64,
    pub phase1_offset: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub channel: i32,
    pub direction: Direction,
    pub is_active: bool,
    pub channel_group: i32,
    pub sample_type: SampleType,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeInfo {
    pub speed: f64,
    pub system_time: i64,
    pub sample_position: i64,
    pub sample_rate: f64,
    pub flags: u32,
}

/// Request payload for each of the 19 [`crate::TransportOp`] values. One
/// variant per op; field names mirror the corresponding `asio_*_params` struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Request {
    Init { config: crate::SessionConfig },
    Exit,
    Start,
    Stop,
    GetChannels,
    GetLatencies,
    GetBufferSize,
    CanSampleRate { sample_rate: f64 },
    GetSampleRate,
    SetSampleRate { sample_rate: f64 },
    GetChannelInfo { direction: Direction, channel: i32 },
    CreateBuffers {
        bindings: Vec<BufferBinding>,
        buffer_size: i32,
        shm_path: String,
    },
    DisposeBuffers,
    OutputReady,
    GetSamplePosition,
    GetCallback,
    CallbackDone { phase: u8 },
    ControlPanel,
    Future { selector: i32, opt: u64 },
}

/// Reply payload, paired one-to-one with [`Request`]. `result` is always
/// present, matching the original convention of a `result: HRESULT` field
/// on every parameter block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Reply {
    Init {
        result: StatusCode,
        handle: u64,
        input_channels: i32,
        output_channels: i32,
        sample_rate: f64,
    },
    Exit { result: StatusCode },
    Start { result: StatusCode },
    Stop { result: StatusCode },
    GetChannels { result: StatusCode, num_inputs: i32, num_outputs: i32 },
    GetLatencies { result: StatusCode, input_latency: i32, output_latency: i32 },
    GetBufferSize {
        result: StatusCode,
        min_size: i32,
        max_size: i32,
        preferred_size: i32,
        granularity: i32,
    },
    CanSampleRate { result: StatusCode },
    GetSampleRate { result: StatusCode, sample_rate: f64 },
    SetSampleRate { result: StatusCode },
    GetChannelInfo { result: StatusCode, info: Option<ChannelInfo> },
    CreateBuffers { result: StatusCode, offsets: Vec<BufferOffsets> },
    DisposeBuffers { result: StatusCode },
    OutputReady { result: StatusCode },
    GetSamplePosition { result: StatusCode, sample_position: i64, system_time: i64 },
    GetCallback {
        result: StatusCode,
        buffer_switch_ready: bool,
        buffer_index: i32,
        time_info: TimeInfo,
        sample_rate_changed: bool,
        new_sample_rate: f64,
        reset_request: bool,
        latency_changed: bool,
    },
    CallbackDone { result: StatusCode },
    ControlPanel { result: StatusCode },
    Future { result: StatusCode, opt: u64 },
}

impl Request {
    pub fn op(&self) -> crate::TransportOp {
        use crate::TransportOp as Op;
        match self {
            Request::Init { .. } => Op::Init,
            Request::Exit => Op::Exit,
            Request::Start => Op::Start,
            Request::Stop => Op::Stop,
            Request::GetChannels => Op::GetChannels,
            Request::GetLatencies => Op::GetLatencies,
            Request::GetBufferSize => Op::GetBufferSize,
            Request::CanSampleRate { .. } => Op::CanSampleRate,
            Request::GetSampleRate => Op::GetSampleRate,
            Request::SetSampleRate { .. } => Op::SetSampleRate,
            Request::GetChannelInfo { .. } => Op::GetChannelInfo,
            Request::CreateBuffers { .. } => Op::CreateBuffers,
            Request::DisposeBuffers => Op::DisposeBuffers,
            Request::OutputReady => Op::OutputReady,
            Request::GetSamplePosition => Op::GetSamplePosition,
            Request::GetCallback => Op::GetCallback,
            Request::CallbackDone { .. } => Op::CallbackDone,
            Request::ControlPanel => Op::ControlPanel,
            Request::Future { .. } => Op::Future,
        }
    }
}

impl Reply {
    pub fn op(&self) -> crate::TransportOp {
        use crate::TransportOp as Op;
        match self {
            Reply::Init { .. } => Op::Init,
            Reply::Exit { .. } => Op::Exit,
            Reply::Start { .. } => Op::Start,
            Reply::Stop { .. } => Op::Stop,
            Reply::GetChannels { .. } => Op::GetChannels,
            Reply::GetLatencies { .. } => Op::GetLatencies,
            Reply::GetBufferSize { .. } => Op::GetBufferSize,
            Reply::CanSampleRate { .. } => Op::CanSampleRate,
            Reply::GetSampleRate { .. } => Op::GetSampleRate,
            Reply::SetSampleRate { .. } => Op::SetSampleRate,
            Reply::GetChannelInfo { .. } => Op::GetChannelInfo,
            Reply::CreateBuffers { .. } => Op::CreateBuffers,
            Reply::DisposeBuffers { .. } => Op::DisposeBuffers,
            Reply::OutputReady { .. } => Op::OutputReady,
            Reply::GetSamplePosition { .. } => Op::GetSamplePosition,
            Reply::GetCallback { .. } => Op::GetCallback,
            Reply::CallbackDone { .. } => Op::CallbackDone,
            Reply::ControlPanel { .. } => Op::ControlPanel,
            Reply::Future { .. } => Op::Future,
        }
    }

    pub fn result(&self) -> StatusCode {
        match self {
            Reply::Init { result, .. }
            | Reply::Exit { result }
            | Reply::Start { result }
            | Reply::Stop { result }
            | Reply::GetChannels { result, .. }
            | Reply::GetLatencies { result, .. }
            | Reply::GetBufferSize { result, .. }
            | Reply::CanSampleRate { result }
            | Reply::GetSampleRate { result, .. }
            | Reply::SetSampleRate { result }
            | Reply::GetChannelInfo { result, .. }
            | Reply::CreateBuffers { result, .. }
            | Reply::DisposeBuffers { result }
            | Reply::OutputReady { result }
            | Reply::GetSamplePosition { result, .. }
            | Reply::GetCallback { result, .. }
            | Reply::CallbackDone { result }
            | Reply::ControlPanel { result }
            | Reply::Future { result, .. } => *result,
        }
    }
}
