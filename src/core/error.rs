//! Error types untuk konstruksi buffer
//!
//! Hanya konstruksi yang bisa gagal secara fatal. Pelanggaran kapasitas saat
//! `offer`/`poll` dilaporkan lewat nilai sentinel (`0` / `None`), bukan error.

use std::fmt;
use std::io;

use thiserror::Error;

/// Separuh region mirror yang sedang di-map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    /// `[base, base + capacity)`
    Lower,
    /// `[base + capacity, base + 2 * capacity)`
    Upper,
}

impl fmt::Display for Half {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Half::Lower => f.write_str("lower"),
            Half::Upper => f.write_str("upper"),
        }
    }
}

/// Kegagalan fatal saat membangun mirrored region.
///
/// Ketika error ini dikembalikan, semua resource yang sempat diambil
/// (reservasi address space, mapping, file descriptor) sudah dilepas.
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("capacity {capacity} must be a non-zero multiple of the page size ({page_size})")]
    InvalidCapacity { capacity: usize, page_size: usize },

    #[error("failed to create backing object: {0}")]
    BackingObject(#[source] io::Error),

    #[error("failed to resize backing object to {capacity} bytes: {source}")]
    Resize {
        capacity: usize,
        #[source]
        source: io::Error,
    },

    #[error("failed to reserve {len} bytes of address space: {source}")]
    Reserve {
        len: usize,
        #[source]
        source: io::Error,
    },

    #[error("failed to map {half} half: {source}")]
    Map {
        half: Half,
        #[source]
        source: io::Error,
    },

    #[error("{half} half mapped at {actual:#x}, expected {expected:#x}")]
    Misplaced {
        half: Half,
        expected: usize,
        actual: usize,
    },
}
