use crate::status::StatusCode;

/// Future-selector constants, carried over from the original wire contract.
/// Most of these are not implemented (see [`FutureSelector::handle`]); the
/// closed set is kept here so the enumeration stays total even though the
/// handler only special-cases a handful of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum FutureSelector {
    EnableTimeCodeRead = 1,
    DisableTimeCodeRead = 2,
    SetInputMonitor = 3,
    Transport = 4,
    SetInputGain = 5,
    GetInputMeter = 6,
    SetOutputGain = 7,
    GetOutputMeter = 8,
    CanInputMonitor = 9,
    CanTimeInfo = 10,
    CanTimeCode = 11,
    CanTransport = 12,
    CanInputGain = 13,
    CanInputMeter = 14,
    CanOutputGain = 15,
    CanOutputMeter = 16,
    OptionalOne = 17,
    SetIoFormat = 0x2311_1961,
    GetIoFormat = 0x2311_1983,
    CanDoIoFormat = 0x2311_2004,
    CanReportOverload = 0x2404_2012,
    GetInternalBufferSamples = 0x2504_2012,
    SupportsInputResampling = 0x2609_2017,
}

impl FutureSelector {
    pub fn from_raw(selector: i32) -> Option<Self> {
        use FutureSelector::*;
        Some(match selector {
            1 => EnableTimeCodeRead,
            2 => DisableTimeCodeRead,
            3 => SetInputMonitor,
            4 => Transport,
            5 => SetInputGain,
            6 => GetInputMeter,
            7 => SetOutputGain,
            8 => GetOutputMeter,
            9 => CanInputMonitor,
            10 => CanTimeInfo,
            11 => CanTimeCode,
            12 => CanTransport,
            13 => CanInputGain,
            14 => CanInputMeter,
            15 => CanOutputGain,
            16 => CanOutputMeter,
            17 => OptionalOne,
            0x2311_1961 => SetIoFormat,
            0x2311_1983 => GetIoFormat,
            0x2311_2004 => CanDoIoFormat,
            0x2404_2012 => CanReportOverload,
            0x2504_2012 => GetInternalBufferSamples,
            0x2609_2017 => SupportsInputResampling,
            _ => return None,
        })
    }

    /// §4.3's full selector table: only the time-info/time-code capability
    /// query and its enable/disable pair report success; everything else in
    /// the closed enumeration is acknowledged but not present.
    pub fn handle(self) -> StatusCode {
        use FutureSelector::*;
        match self {
            CanTimeInfo | CanTimeCode | EnableTimeCodeRead | DisableTimeCodeRead => StatusCode::Ok,
            _ => StatusCode::NotPresent,
        }
    }
}
