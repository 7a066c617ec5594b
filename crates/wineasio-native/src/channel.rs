use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use wineasio_proto::Direction;

/// Native session state machine, §4.4. Stored as an `AtomicU8` so the
/// real-time callback can read it with a single load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Loaded = 0,
    Initialised = 1,
    Prepared = 2,
    Running = 3,
}

impl SessionState {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => SessionState::Loaded,
            1 => SessionState::Initialised,
            2 => SessionState::Prepared,
            3 => SessionState::Running,
            other => panic!("invalid session state byte {other}"),
        }
    }
}

/// One registered channel. Shared (via `Arc`) between the handler side,
/// which publishes buffer addresses at `CreateBuffers`, and the real-time
/// callback, which reads them every cycle without taking any lock — the
/// address fields are plain atomics, read with `Acquire` and written with
/// `Release`, mirroring the original's unsynchronized pointer-field update.
pub struct Channel {
    pub direction: Direction,
    pub index: usize,
    pub name: String,
    active: AtomicBool,
    phase_addr: [AtomicU64; 2],
    buffer_len: AtomicU32,
}

impl Channel {
    pub fn new(direction: Direction, index: usize, name: String) -> Self {
        Channel {
            direction,
            index,
            name,
            active: AtomicBool::new(false),
            phase_addr: [AtomicU64::new(0), AtomicU64::new(0)],
            buffer_len: AtomicU32::new(0),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Publishes this channel's phase-0/phase-1 addresses (byte offsets into
    /// a mapping the caller keeps alive) and marks it active. Called only
    /// from the handler side, and only before the session transitions to
    /// Running for the first time with this buffer set (§5).
    pub fn publish(&self, phase0: *mut f32, phase1: *mut f32, frames: u32) {
        self.phase_addr[0].store(phase0 as u64, Ordering::Release);
        self.phase_addr[1].store(phase1 as u64, Ordering::Release);
        self.buffer_len.store(frames, Ordering::Release);
        self.active.store(true, Ordering::Release);
    }

    /// Reconstructs the phase-`phase` sample slice. `None` if the channel is
    /// inactive or has never had buffers published — the real-time callback
    /// must skip the copy silently in that case (§4.7).
    ///
    /// # Safety
    /// The caller must ensure the memory behind the published address is
    /// still mapped (i.e. the owning `BufferBlock` has not been dropped).
    /// This holds for the lifetime of this `Channel` by construction: the
    /// native session re-publishes addresses at every `CreateBuffers` before
    /// freeing the previous mapping.
    pub unsafe fn phase_slice_mut(&self, phase: u8) -> Option<&mut [f32]> {
        if !self.is_active() {
            return None;
        }
        let addr = self.phase_addr[phase as usize].load(Ordering::Acquire);
        if addr == 0 {
            return None;
        }
        let len = self.buffer_len.load(Ordering::Acquire) as usize;
        Some(std::slice::from_raw_parts_mut(addr as *mut f32, len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_channel_has_no_phase_slice() {
        let ch = Channel::new(Direction::Input, 0, "in_1".into());
        assert!(!ch.is_active());
        unsafe {
            assert!(ch.phase_slice_mut(0).is_none());
        }
    }

    #[test]
    fn publish_then_read_round_trips() {
        let mut backing = vec![0.0f32; 512];
        let (phase0, phase1) = backing.split_at_mut(256);
        let ch = Channel::new(Direction::Output, 0, "out_1".into());
        ch.publish(phase0.as_mut_ptr(), phase1.as_mut_ptr(), 256);

        assert!(ch.is_active());
        unsafe {
            let slice = ch.phase_slice_mut(0).unwrap();
            slice[0] = 42.0;
        }
        assert_eq!(backing[0], 42.0);
    }
}
