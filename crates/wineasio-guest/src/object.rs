//! The Driver Object's reference-counting shell (host-ABI ops 1–3, §4.1):
//! `query_interface`/`add_ref`/`release` wrap a [`GuestDriver`] the way the
//! original's COM-style dispatch table wraps the driver instance. Teardown
//! runs exactly once, when the count drops to zero.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;
use wineasio_proto::{SessionConfig, StatusCode};

use crate::abi::AsioDriver;
use crate::driver::GuestDriver;
use crate::transport::Transport;

/// The only identity this object answers to on `query_interface` (op 1).
/// Any other requested identity gets "no such interface" rather than a
/// fabricated match.
pub const ASIO_DRIVER_IID: u64 = 1;

pub struct DriverObject<T: Transport> {
    driver: GuestDriver<T>,
    refcount: AtomicUsize,
}

impl<T: Transport + 'static> DriverObject<T> {
    /// Starts life with a reference count of one, mirroring `CoCreateInstance`
    /// handing back an already-referenced object.
    pub fn new(transport: T) -> Self {
        DriverObject { driver: GuestDriver::new(transport), refcount: AtomicUsize::new(1) }
    }

    /// Op 1. `iid` identifies the requested interface; only [`ASIO_DRIVER_IID`]
    /// is ever satisfied by this object.
    pub fn query_interface(&self, iid: u64) -> StatusCode {
        if iid == ASIO_DRIVER_IID {
            self.add_ref();
            StatusCode::Ok
        } else {
            StatusCode::NotPresent
        }
    }

    /// Op 2.
    pub fn add_ref(&self) -> usize {
        self.refcount.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Op 3. Runs teardown exactly once, on the transition to zero.
    pub fn release(&mut self) -> usize {
        let previous = self.refcount.fetch_sub(1, Ordering::AcqRel);
        let remaining = previous.saturating_sub(1);
        if previous == 1 {
            debug!("driver object reference count reached zero, tearing down");
            self.driver.teardown();
        }
        remaining
    }

    pub fn driver_mut(&mut self) -> &mut GuestDriver<T> {
        &mut self.driver
    }

    pub fn driver(&self) -> &GuestDriver<T> {
        &self.driver
    }
}

impl<T: Transport + 'static> AsioDriver for DriverObject<T> {
    fn init(&mut self, config: SessionConfig) -> bool {
        self.driver.init(config)
    }
    fn driver_name(&self) -> &'static str {
        self.driver.driver_name()
    }
    fn driver_version(&self) -> i32 {
        self.driver.driver_version()
    }
    fn error_message(&self) -> &'static str {
        self.driver.error_message()
    }
    fn start(&mut self) -> StatusCode {
        self.driver.start()
    }
    fn stop(&mut self) -> StatusCode {
        self.driver.stop()
    }
    fn get_channels(&mut self) -> Result<(i32, i32), StatusCode> {
        self.driver.get_channels()
    }
    fn get_latencies(&mut self) -> Result<(i32, i32), StatusCode> {
        self.driver.get_latencies()
    }
    fn get_buffer_size(&mut self) -> Result<(i32, i32, i32, i32), StatusCode> {
        self.driver.get_buffer_size()
    }
    fn can_sample_rate(&mut self, rate: f64) -> StatusCode {
        self.driver.can_sample_rate(rate)
    }
    fn get_sample_rate(&mut self) -> Result<f64, StatusCode> {
        self.driver.get_sample_rate()
    }
    fn set_sample_rate(&mut self, rate: f64) -> StatusCode {
        self.driver.set_sample_rate(rate)
    }
    fn get_clock_sources(&self) -> StatusCode {
        self.driver.get_clock_sources()
    }
    fn set_clock_source(&mut self, source: i32) -> StatusCode {
        self.driver.set_clock_source(source)
    }
    fn get_sample_position(&mut self) -> Result<(i64, i64), StatusCode> {
        self.driver.get_sample_position()
    }
    fn get_channel_info(
        &mut self,
        direction: wineasio_proto::Direction,
        channel: i32,
    ) -> Result<wineasio_proto::ChannelInfo, StatusCode> {
        self.driver.get_channel_info(direction, channel)
    }
    fn create_buffers(
        &mut self,
        bindings: &[(wineasio_proto::Direction, i32)],
        buffer_size: i32,
        callbacks: Box<dyn crate::callbacks::HostCallbacks>,
    ) -> Result<Vec<u64>, StatusCode> {
        self.driver.create_buffers(bindings, buffer_size, callbacks)
    }
    fn dispose_buffers(&mut self) -> StatusCode {
        self.driver.dispose_buffers()
    }
    fn control_panel(&self) -> StatusCode {
        self.driver.control_panel()
    }
    fn future(&mut self, selector: i32, opt: u64) -> StatusCode {
        self.driver.future(selector, opt)
    }
    fn output_ready(&mut self) -> StatusCode {
        self.driver.output_ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wineasio_proto::{Reply, Request, StatusCode as SC, TransportError};

    struct NullTransport;
    impl Transport for NullTransport {
        fn call(&mut self, request: Request) -> Result<Reply, TransportError> {
            match request {
                Request::Exit => Ok(Reply::Exit { result: SC::Ok }),
                _ => Err(TransportError::Unavailable),
            }
        }
    }

    #[test]
    fn release_at_zero_tears_down_exactly_once() {
        let mut object = DriverObject::new(NullTransport);
        assert_eq!(object.add_ref(), 2);
        assert_eq!(object.release(), 1);
        assert_eq!(object.release(), 0);
    }

    #[test]
    fn query_interface_rejects_unknown_identities() {
        let object = DriverObject::new(NullTransport);
        assert_eq!(object.query_interface(ASIO_DRIVER_IID), SC::Ok);
        assert_eq!(object.query_interface(0xDEAD), SC::NotPresent);
    }
}
