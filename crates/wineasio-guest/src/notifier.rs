//! The guest-side notifier poll loop (T2, §4.6): polls "get callback" at
//! roughly 1 kHz, delivers rate/reset/latency notifications, and drives the
//! host's audio callback. Spawned on `Start`, joined on `Stop`/release.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;
use wineasio_proto::{Reply, Request};

use crate::callbacks::HostCallbacks;
use crate::transport::Transport;

const POLL_INTERVAL: Duration = Duration::from_millis(1);
const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Notifier {
    stop_flag: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Notifier {
    /// Spawns the poll loop against a transport shared with the driver
    /// object's own ABI calls (both T1 and T2 serialize through the same
    /// mutex; the transport itself is a single pipe to one subprocess).
    /// `callbacks` is shared with the driver rather than owned outright, so
    /// the same callback set survives a `Stop` followed by another `Start`.
    /// `uses_time_info_mode` mirrors the mode negotiated by `create_buffers`
    /// (§4.6 step 5): time-info hosts get `buffer_switch_time_info`, plain
    /// hosts get `buffer_switch`.
    pub fn spawn<T>(
        transport: Arc<Mutex<T>>,
        callbacks: Arc<Mutex<Box<dyn HostCallbacks>>>,
        uses_time_info_mode: bool,
    ) -> Self
    where
        T: Transport + 'static,
    {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let loop_flag = Arc::clone(&stop_flag);

        let handle = std::thread::spawn(move || {
            while !loop_flag.load(Ordering::Acquire) {
                let reply = match transport.lock().call(Request::GetCallback) {
                    Ok(r) => r,
                    Err(_) => break,
                };
                if loop_flag.load(Ordering::Acquire) {
                    break;
                }
                deliver(&reply, &mut **callbacks.lock(), uses_time_info_mode);
                std::thread::sleep(POLL_INTERVAL);
            }
        });

        Notifier { stop_flag, handle: Some(handle) }
    }

    /// Signals the loop to exit and joins it, waiting up to 5 seconds (§5);
    /// a join that doesn't complete in time is abandoned rather than
    /// blocking `Stop`/`Release` forever.
    pub fn stop(mut self) {
        self.stop_flag.store(true, Ordering::Release);
        let Some(handle) = self.handle.take() else { return };

        let (tx, rx) = crossbeam_channel::bounded(1);
        std::thread::spawn(move || {
            let _ = handle.join();
            let _ = tx.send(());
        });

        if rx.recv_timeout(STOP_JOIN_TIMEOUT).is_err() {
            debug!("notifier thread did not exit within the stop timeout; abandoning it");
        }
    }
}

fn deliver(reply: &Reply, callbacks: &mut dyn HostCallbacks, uses_time_info_mode: bool) {
    let Reply::GetCallback {
        buffer_switch_ready,
        buffer_index,
        time_info,
        sample_rate_changed,
        new_sample_rate,
        reset_request,
        latency_changed,
        ..
    } = *reply
    else {
        return;
    };

    if sample_rate_changed {
        debug!(rate = new_sample_rate, "sample rate changed");
        callbacks.sample_rate_did_change(new_sample_rate);
    }
    if reset_request {
        debug!("reset requested");
        callbacks.message(1, 3);
        callbacks.message(3, 0);
    }
    if latency_changed {
        debug!("latency changed");
        callbacks.message(1, 6);
        callbacks.message(6, 0);
    }
    if buffer_switch_ready {
        if uses_time_info_mode {
            let _ = callbacks.buffer_switch_time_info(time_info, buffer_index as u8, true);
        } else {
            callbacks.buffer_switch(buffer_index as u8, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc as StdArc;
    use wineasio_proto::{StatusCode, TimeInfo, TransportError};

    struct CountingTransport {
        calls: StdArc<Mutex<u32>>,
    }

    impl Transport for CountingTransport {
        fn call(&mut self, _request: Request) -> Result<Reply, TransportError> {
            *self.calls.lock() += 1;
            Ok(Reply::GetCallback {
                result: StatusCode::Ok,
                buffer_switch_ready: false,
                buffer_index: 0,
                time_info: TimeInfo { speed: 1.0, system_time: 0, sample_position: 0, sample_rate: 48_000.0, flags: 0 },
                sample_rate_changed: false,
                new_sample_rate: 0.0,
                reset_request: false,
                latency_changed: false,
            })
        }
    }

    struct RecordingCallbacks {
        switches: StdArc<Mutex<u32>>,
    }

    impl HostCallbacks for RecordingCallbacks {
        fn buffer_switch(&mut self, _phase: u8, _direct_process: bool) {}
        fn sample_rate_did_change(&mut self, _rate: f64) {}
        fn message(&mut self, _selector: i32, _value: i32) -> i32 {
            0
        }
        fn buffer_switch_time_info(&mut self, _time_info: TimeInfo, _phase: u8, _direct_process: bool) -> Option<TimeInfo> {
            *self.switches.lock() += 1;
            None
        }
    }

    /// A transport that always reports a pending buffer switch, so the
    /// loop actually delivers one every cycle instead of skipping the
    /// `if buffer_switch_ready` branch entirely.
    struct SwitchingTransport {
        calls: StdArc<Mutex<u32>>,
    }

    impl Transport for SwitchingTransport {
        fn call(&mut self, _request: Request) -> Result<Reply, TransportError> {
            *self.calls.lock() += 1;
            Ok(Reply::GetCallback {
                result: StatusCode::Ok,
                buffer_switch_ready: true,
                buffer_index: 1,
                time_info: TimeInfo { speed: 1.0, system_time: 0, sample_position: 0, sample_rate: 48_000.0, flags: 0 },
                sample_rate_changed: false,
                new_sample_rate: 0.0,
                reset_request: false,
                latency_changed: false,
            })
        }
    }

    struct PlainCallbacks {
        switches: StdArc<Mutex<Vec<(u8, bool)>>>,
        time_info_switches: StdArc<Mutex<u32>>,
    }

    impl HostCallbacks for PlainCallbacks {
        fn buffer_switch(&mut self, phase: u8, direct_process: bool) {
            self.switches.lock().push((phase, direct_process));
        }
        fn sample_rate_did_change(&mut self, _rate: f64) {}
        fn message(&mut self, _selector: i32, _value: i32) -> i32 {
            0
        }
        fn buffer_switch_time_info(&mut self, _time_info: TimeInfo, _phase: u8, _direct_process: bool) -> Option<TimeInfo> {
            *self.time_info_switches.lock() += 1;
            None
        }
    }

    #[test]
    fn stop_joins_promptly_once_transport_goes_unavailable() {
        let calls = StdArc::new(Mutex::new(0));
        let switches = StdArc::new(Mutex::new(0));
        let transport = StdArc::new(Mutex::new(CountingTransport { calls: StdArc::clone(&calls) }));
        let callbacks: Arc<Mutex<Box<dyn HostCallbacks>>> =
            StdArc::new(Mutex::new(Box::new(RecordingCallbacks { switches: StdArc::clone(&switches) })));

        let notifier = Notifier::spawn(transport, callbacks, true);
        std::thread::sleep(Duration::from_millis(20));
        notifier.stop();

        assert!(*calls.lock() > 0);
    }

    #[test]
    fn not_time_info_mode_delivers_the_plain_buffer_switch_callback() {
        let calls = StdArc::new(Mutex::new(0));
        let switches = StdArc::new(Mutex::new(Vec::new()));
        let time_info_switches = StdArc::new(Mutex::new(0));
        let transport = StdArc::new(Mutex::new(SwitchingTransport { calls: StdArc::clone(&calls) }));
        let callbacks: Arc<Mutex<Box<dyn HostCallbacks>>> = StdArc::new(Mutex::new(Box::new(PlainCallbacks {
            switches: StdArc::clone(&switches),
            time_info_switches: StdArc::clone(&time_info_switches),
        })));

        let notifier = Notifier::spawn(transport, callbacks, false);
        std::thread::sleep(Duration::from_millis(20));
        notifier.stop();

        assert!(!switches.lock().is_empty(), "plain buffer_switch should have been delivered");
        assert_eq!(*time_info_switches.lock(), 0, "time-info variant must not fire outside time-info mode");
        assert!(switches.lock().iter().all(|&(phase, direct_process)| phase == 1 && direct_process));
    }
}
