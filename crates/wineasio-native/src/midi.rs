//! Per-direction MIDI ring buffers, confined to the native session.
//!
//! There is no guest-facing MIDI API in the core: the input ring is filled by
//! the real-time callback from the backend's MIDI input port and is never
//! drained anywhere else, faithfully reproducing the original's asymmetry
//! rather than inventing a consumer for it. The output ring is both filled
//! and drained entirely within the callback (fed from the backend side, not
//! from the guest).

use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

pub const MIDI_RING_CAPACITY: usize = 256;
pub const MAX_MIDI_EVENT_SIZE: usize = 256;

#[derive(Debug, Clone, Copy)]
pub struct MidiEvent {
    pub data: [u8; MAX_MIDI_EVENT_SIZE],
    pub size: usize,
    pub time: u32,
}

impl MidiEvent {
    pub fn from_slice(bytes: &[u8], time: u32) -> Self {
        let size = bytes.len().min(MAX_MIDI_EVENT_SIZE);
        let mut data = [0u8; MAX_MIDI_EVENT_SIZE];
        data[..size].copy_from_slice(&bytes[..size]);
        MidiEvent { data, size, time }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.size]
    }
}

pub type MidiProducer = HeapProducer<MidiEvent>;
pub type MidiConsumer = HeapConsumer<MidiEvent>;

/// Splits a fresh 256-slot ring into its producer/consumer halves.
pub fn midi_ring() -> (MidiProducer, MidiConsumer) {
    HeapRb::<MidiEvent>::new(MIDI_RING_CAPACITY).split()
}

/// Pushes an event, dropping it silently if the ring is full (drop-newest).
pub fn push_dropping_newest(producer: &mut MidiProducer, event: MidiEvent) {
    let _ = producer.push(event);
}
