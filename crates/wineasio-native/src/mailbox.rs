use parking_lot::Mutex;

/// The native→guest notification mailbox: a single-writer/single-reader slot,
/// not a queue. The backend callback (writer) sets fields every cycle under
/// the mutex; the notifier's "get callback" transport call (reader) snapshots
/// and clears them under the same mutex. A pending notification not yet read
/// before the next cycle is overwritten — coalescing by design.
#[derive(Debug, Default, Clone, Copy)]
pub struct Notification {
    pub switch_pending: bool,
    pub pending_phase: u8,
    pub sample_position: i64,
    pub system_time: i64,
    pub sample_rate_changed: bool,
    pub new_sample_rate: f64,
    pub reset_request: bool,
    pub latency_changed: bool,
}

#[derive(Default)]
pub struct Mailbox {
    inner: Mutex<Notification>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called from the real-time callback. Held for a handful of stores only.
    pub fn publish_switch(&self, phase: u8, sample_position: i64, system_time: i64) {
        let mut n = self.inner.lock();
        n.switch_pending = true;
        n.pending_phase = phase;
        n.sample_position = sample_position;
        n.system_time = system_time;
    }

    pub fn publish_sample_rate_changed(&self, new_rate: f64) {
        let mut n = self.inner.lock();
        n.sample_rate_changed = true;
        n.new_sample_rate = new_rate;
    }

    pub fn publish_reset_request(&self) {
        self.inner.lock().reset_request = true;
    }

    pub fn publish_latency_changed(&self) {
        self.inner.lock().latency_changed = true;
    }

    /// Called from the "get callback" handler: atomically snapshots and
    /// clears every flag.
    pub fn take(&self) -> Notification {
        let mut n = self.inner.lock();
        let snapshot = *n;
        *n = Notification { sample_position: n.sample_position, system_time: n.system_time, ..Notification::default() };
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_clears_flags_but_not_the_clock() {
        let mailbox = Mailbox::new();
        mailbox.publish_switch(1, 256, 1000);
        mailbox.publish_sample_rate_changed(44100.0);

        let snapshot = mailbox.take();
        assert!(snapshot.switch_pending);
        assert_eq!(snapshot.pending_phase, 1);
        assert_eq!(snapshot.sample_position, 256);
        assert!(snapshot.sample_rate_changed);

        let second = mailbox.take();
        assert!(!second.switch_pending);
        assert!(!second.sample_rate_changed);
        // Clock fields are carried over, not reset to zero, so a
        // not-yet-consumed read still sees the most recent position.
        assert_eq!(second.sample_position, 256);
    }

    #[test]
    fn a_second_switch_before_take_coalesces() {
        let mailbox = Mailbox::new();
        mailbox.publish_switch(0, 0, 0);
        mailbox.publish_switch(1, 256, 1000);
        let snapshot = mailbox.take();
        assert_eq!(snapshot.pending_phase, 1);
        assert_eq!(snapshot.sample_position, 256);
    }
}
