//! The guest-owned double-buffer block.
//!
//! The original keeps this as a single heap allocation whose base address is
//! handed to the native side as a raw pointer, valid only because both
//! worlds share one address space. Across a real process boundary that trick
//! doesn't work, so the block is instead a single memory-mapped temp file:
//! the guest creates it, the native side opens the same path read/write, and
//! both sides address into it by byte offset rather than by pointer. This is
//! the direct descendant of the teacher's `SharedAudioRing` (mmap'd
//! `NamedTempFile`), generalised from a single audio ring to a phase/channel
//! addressed block.

use std::io;
use std::path::{Path, PathBuf};

use memmap2::{MmapMut, MmapOptions};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

pub const BYTES_PER_SAMPLE: usize = 4;

#[derive(Debug, Error)]
pub enum ShmError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("buffer block path not found: {0}")]
    Missing(PathBuf),
}

/// Identifies a buffer block to a second process: the file path plus the
/// dimensions needed to compute offsets. Serialized as part of a
/// `CreateBuffers` transport request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferBlockDescriptor {
    pub path: PathBuf,
    pub num_channels: u32,
    pub buffer_size: u32,
}

impl BufferBlockDescriptor {
    pub fn total_len(&self) -> usize {
        2 * self.num_channels as usize * self.buffer_size as usize * BYTES_PER_SAMPLE
    }

    /// Byte offset of channel `index`'s phase-`phase` slot.
    pub fn phase_offset(&self, index: usize, phase: u8) -> u64 {
        let slot = 2 * index + phase as usize;
        (slot * self.buffer_size as usize * BYTES_PER_SAMPLE) as u64
    }
}

/// A live mapping of a buffer block, owned by whichever side created or
/// opened it. Guest creates via [`BufferBlock::create`]; native opens the
/// same file via [`BufferBlock::open`].
pub struct BufferBlock {
    descriptor: BufferBlockDescriptor,
    // Kept alive only on the creating side; `None` when opened from an
    // existing path (the creator's handle is what keeps the file from being
    // unlinked out from under the mapping).
    _owner: Option<NamedTempFile>,
    mmap: MmapMut,
}

impl BufferBlock {
    /// Allocates a new, zeroed buffer block backed by a fresh temp file.
    pub fn create(num_channels: u32, buffer_size: u32) -> Result<Self, ShmError> {
        let descriptor = BufferBlockDescriptor { path: PathBuf::new(), num_channels, buffer_size };
        let total_len = descriptor.total_len();

        let file = tempfile::Builder::new()
            .prefix("wineasio-buffer-block")
            .tempfile()?;
        file.as_file().set_len(total_len as u64)?;

        let mmap = unsafe { MmapOptions::new().len(total_len).map_mut(file.as_file())? };

        let descriptor = BufferBlockDescriptor { path: file.path().to_path_buf(), ..descriptor };

        Ok(BufferBlock { descriptor, _owner: Some(file), mmap })
    }

    /// Opens an existing buffer block created by the other side of the
    /// transport. Used by the native session when handling `CreateBuffers`.
    pub fn open(descriptor: BufferBlockDescriptor) -> Result<Self, ShmError> {
        if !descriptor.path.exists() {
            return Err(ShmError::Missing(descriptor.path.clone()));
        }
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&descriptor.path)?;
        let mmap = unsafe { MmapOptions::new().len(descriptor.total_len()).map_mut(&file)? };
        Ok(BufferBlock { descriptor, _owner: None, mmap })
    }

    pub fn descriptor(&self) -> &BufferBlockDescriptor {
        &self.descriptor
    }

    pub fn path(&self) -> &Path {
        &self.descriptor.path
    }

    /// Immutable view of channel `index`'s phase-`phase` slot, as floats.
    pub fn phase_slice(&self, index: usize, phase: u8) -> &[f32] {
        let offset = self.descriptor.phase_offset(index, phase) as usize;
        let len = self.descriptor.buffer_size as usize;
        bytemuck_cast(&self.mmap[offset..offset + len * BYTES_PER_SAMPLE])
    }

    /// Mutable view of channel `index`'s phase-`phase` slot, as floats.
    pub fn phase_slice_mut(&mut self, index: usize, phase: u8) -> &mut [f32] {
        let offset = self.descriptor.phase_offset(index, phase) as usize;
        let len = self.descriptor.buffer_size as usize;
        bytemuck_cast_mut(&mut self.mmap[offset..offset + len * BYTES_PER_SAMPLE])
    }

    /// Zeroes the entire block, as done on `Start`.
    pub fn zero(&mut self) {
        self.mmap.fill(0);
    }
}

fn bytemuck_cast(bytes: &[u8]) -> &[f32] {
    debug_assert_eq!(bytes.len() % BYTES_PER_SAMPLE, 0);
    debug_assert_eq!(bytes.as_ptr() as usize % std::mem::align_of::<f32>(), 0);
    unsafe { std::slice::from_raw_parts(bytes.as_ptr().cast(), bytes.len() / BYTES_PER_SAMPLE) }
}

fn bytemuck_cast_mut(bytes: &mut [u8]) -> &mut [f32] {
    debug_assert_eq!(bytes.len() % BYTES_PER_SAMPLE, 0);
    debug_assert_eq!(bytes.as_ptr() as usize % std::mem::align_of::<f32>(), 0);
    unsafe { std::slice::from_raw_parts_mut(bytes.as_mut_ptr().cast(), bytes.len() / BYTES_PER_SAMPLE) }
}
