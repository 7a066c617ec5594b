//! Host-ABI operations 4–24 (§6), represented as a plain trait with
//! ordinary `&self`/`&mut self` methods. The original's register-vs-stack
//! "this pointer" dispatch convention on 32-bit guests (§9) is a
//! compiler/ABI-lowering concern handled transparently by whatever lowers
//! this trait's methods to the guest's dispatch table — it has no bearing
//! on this trait's shape.

use wineasio_proto::{ChannelInfo, Direction, SessionConfig, StatusCode};

use crate::callbacks::HostCallbacks;

/// One ABI op per method, in the stable order of §6 (operations 4–24; the
/// reference-counting trio 1–3 lives on [`crate::object::DriverObject`]
/// instead, since it governs the object's lifetime rather than session
/// behaviour).
pub trait AsioDriver {
    /// Op 4. Idempotency: calling `init` on an already-initialised driver
    /// returns `false` without touching the transport.
    fn init(&mut self, config: SessionConfig) -> bool;

    /// Op 5. No transport call.
    fn driver_name(&self) -> &'static str;
    /// Op 6. No transport call.
    fn driver_version(&self) -> i32;
    /// Op 7. No transport call; no per-error message channel exists.
    fn error_message(&self) -> &'static str;

    /// Op 8. On success, spawns the notifier thread and primes the host
    /// callback once with `phase=0, direct_process=true`, using the
    /// callback set captured by the preceding `create_buffers`.
    fn start(&mut self) -> StatusCode;
    /// Op 9. Joins the notifier thread (≤5s) before the transport call.
    fn stop(&mut self) -> StatusCode;

    fn get_channels(&mut self) -> Result<(i32, i32), StatusCode>;
    fn get_latencies(&mut self) -> Result<(i32, i32), StatusCode>;
    fn get_buffer_size(&mut self) -> Result<(i32, i32, i32, i32), StatusCode>;
    fn can_sample_rate(&mut self, rate: f64) -> StatusCode;
    fn get_sample_rate(&mut self) -> Result<f64, StatusCode>;
    fn set_sample_rate(&mut self, rate: f64) -> StatusCode;

    /// Op 16. Always reports zero clock sources and OK — there is exactly
    /// one implicit clock (the backend) and this is how the original
    /// signals "no user-selectable clocks" (§9).
    fn get_clock_sources(&self) -> StatusCode;
    /// Op 17. Always OK, ignoring its argument.
    fn set_clock_source(&mut self, _source: i32) -> StatusCode;

    fn get_sample_position(&mut self) -> Result<(i64, i64), StatusCode>;
    fn get_channel_info(&mut self, direction: Direction, channel: i32) -> Result<ChannelInfo, StatusCode>;

    /// Op 20. `bindings` is the subset of registered channels to activate
    /// for this buffer set; `buffer_size` is frames per channel per phase.
    /// `callbacks` is captured for the lifetime of this buffer set: queried
    /// here for time-info/time-code support, then handed to the notifier
    /// thread (via `start`) once the session is running.
    fn create_buffers(
        &mut self,
        bindings: &[(Direction, i32)],
        buffer_size: i32,
        callbacks: Box<dyn HostCallbacks>,
    ) -> Result<Vec<u64>, StatusCode>;
    /// Op 21. Does not free the buffer block until the next `create_buffers`
    /// or teardown — the host cannot touch the buffers once this returns.
    fn dispose_buffers(&mut self) -> StatusCode;

    fn control_panel(&self) -> StatusCode;
    /// Op 23. See `wineasio_proto::FutureSelector` for the closed selector
    /// enumeration; every selector this core implements is documented in
    /// §4.3, everything else reports `NotPresent`.
    fn future(&mut self, selector: i32, opt: u64) -> StatusCode;
    /// Op 24. Always `NotPresent` — the backend drives timing.
    fn output_ready(&mut self) -> StatusCode;
}
