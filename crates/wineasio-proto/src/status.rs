/// ASIO-style status taxonomy. Values match the original ASE_* codes exactly
/// so that round-tripping through logs or captured fixtures stays recognisable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[repr(i32)]
pub enum StatusCode {
    Ok = 0,
    Success = 0x3f4847a0,
    NotPresent = -1000,
    HwMalfunction = -999,
    InvalidParameter = -998,
    InvalidMode = -997,
    SpNotAdvancing = -996,
    NoClock = -995,
    NoMemory = -994,
}

impl StatusCode {
    pub fn is_ok(self) -> bool {
        matches!(self, StatusCode::Ok | StatusCode::Success)
    }
}

/// Internal error taxonomy for the native session and handlers. Every variant
/// maps onto exactly one [`StatusCode`] at the point a handler writes
/// `params.result` (see [`NativeError::status`]).
#[derive(Debug, thiserror::Error)]
pub enum NativeError {
    #[error("backend unavailable")]
    BackendUnavailable,
    #[error("backend hardware malfunction")]
    HardwareMalfunction,
    #[error("port registration failed for channel {channel}")]
    PortRegistrationFailed { channel: usize },
    #[error("invalid state: expected {expected}, found {found}")]
    InvalidState { expected: &'static str, found: &'static str },
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
    #[error("unsupported sample rate: requested {requested}, current {current}")]
    UnsupportedSampleRate { requested: f64, current: f64 },
    #[error("buffer allocation failed")]
    BufferAllocationFailed,
    #[error("not present")]
    NotPresent,
    #[error("transport io error: {0}")]
    TransportIo(#[from] std::io::Error),
    #[error("wire encoding error: {0}")]
    Encoding(#[from] bincode::Error),
}

impl NativeError {
    /// Maps an internal failure onto the status code carried in the reply.
    pub fn status(&self) -> StatusCode {
        match self {
            NativeError::BackendUnavailable => StatusCode::NotPresent,
            NativeError::HardwareMalfunction => StatusCode::HwMalfunction,
            NativeError::PortRegistrationFailed { .. } => StatusCode::InvalidParameter,
            NativeError::InvalidState { .. } => StatusCode::InvalidMode,
            NativeError::InvalidParameter(_) => StatusCode::InvalidParameter,
            NativeError::UnsupportedSampleRate { .. } => StatusCode::NoClock,
            NativeError::BufferAllocationFailed => StatusCode::NoMemory,
            NativeError::NotPresent => StatusCode::NotPresent,
            NativeError::TransportIo(_) | NativeError::Encoding(_) => StatusCode::NotPresent,
        }
    }
}

/// Errors that can escape `Transport::call` itself, as opposed to being
/// carried inside a reply's `result` field.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("native side is not present")]
    Unavailable,
    #[error("transport io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("wire encoding error: {0}")]
    Encoding(#[from] bincode::Error),
    #[error("reply did not match the request op")]
    UnexpectedReply,
}
