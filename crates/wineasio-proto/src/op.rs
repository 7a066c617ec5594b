/// The closed set of 19 cross-world transport operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TransportOp {
    Init,
    Exit,
    Start,
    Stop,
    GetChannels,
    GetLatencies,
    GetBufferSize,
    CanSampleRate,
    GetSampleRate,
    SetSampleRate,
    GetChannelInfo,
    CreateBuffers,
    DisposeBuffers,
    OutputReady,
    GetSamplePosition,
    GetCallback,
    CallbackDone,
    ControlPanel,
    Future,
}
