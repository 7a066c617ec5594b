//! The host's four audio-driver callbacks (§6), represented as a trait
//! object rather than raw function pointers: consistent with the ambient
//! stack's preference for trait objects over unsafe FFI tables wherever the
//! original's raw pointer was only ever used as a single-dispatch callback.

use wineasio_proto::TimeInfo;

/// Implemented by whatever embeds the guest driver object and owns the real
/// host-callback pointers (out of scope here per §1 — object-registration
/// plumbing is an external collaborator). Tests implement this directly to
/// observe what the notifier loop and `Start` priming deliver.
pub trait HostCallbacks: Send {
    /// Plain (non-time-info) buffer-switch notification.
    fn buffer_switch(&mut self, phase: u8, direct_process: bool);

    /// Invoked from the notifier thread when the backend's rate changes.
    fn sample_rate_did_change(&mut self, rate: f64);

    /// `selector == 1` is a capability query ("can you do `value`?"); other
    /// selectors are notifications (`3` = reset, `6` = latency changed).
    /// Returns a nonzero value for "yes"/"acknowledged".
    fn message(&mut self, selector: i32, value: i32) -> i32;

    /// Time-info variant of the buffer-switch callback. Returns `Some` time
    /// info when the host accepts it (mirroring the original's
    /// `ASIOTime*`-returning convention).
    fn buffer_switch_time_info(&mut self, time_info: TimeInfo, phase: u8, direct_process: bool) -> Option<TimeInfo>;
}
