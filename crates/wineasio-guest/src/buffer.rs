//! The Guest Driver Object's owned audio buffer block (§3 `BufferBlock`,
//! §10.2): the guest side creates the memory-mapped temp file and hands its
//! path to the native side on `CreateBuffers`; the native side opens the
//! same file read/write and the backend callback copies samples directly
//! into guest-visible memory.
//!
//! Both sides compute phase addresses with the same deterministic formula
//! (`wineasio_shm::BufferBlockDescriptor::phase_offset`, channels ordered
//! inputs-then-outputs), so no pointer ever crosses the wire — only the
//! shared file's path does.

use wineasio_shm::{BufferBlock, ShmError};

pub struct GuestBufferBlock {
    block: BufferBlock,
}

impl GuestBufferBlock {
    /// Allocates and zeroes a block sized for every channel registered at
    /// `Init`, not just the subset bound in a given `CreateBuffers` call —
    /// the layout must stay stable across repeated buffer creation with a
    /// varying channel subset.
    pub fn create(num_channels: u32, buffer_size: u32) -> Result<Self, ShmError> {
        let mut block = BufferBlock::create(num_channels, buffer_size)?;
        block.zero();
        Ok(GuestBufferBlock { block })
    }

    pub fn shm_path(&self) -> String {
        self.block.path().to_string_lossy().into_owned()
    }

    /// The guest-local address of channel `index`'s phase-`phase` slot —
    /// what the host driver contract hands back to the host inside its
    /// channel-info array.
    pub fn phase_ptr(&mut self, index: usize, phase: u8) -> u64 {
        self.block.phase_slice_mut(index, phase).as_mut_ptr() as u64
    }

    pub fn phase_offset(&self, index: usize, phase: u8) -> u64 {
        self.block.descriptor().phase_offset(index, phase)
    }
}
