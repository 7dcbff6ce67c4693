//! Cursor Accounting
//!
//! Read cursor (head) dan write cursor (tail) selalu berada di
//! `[0, capacity)`. Used/unused space dihitung ulang dari kedua cursor di
//! setiap panggilan, tidak pernah di-cache.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Jumlah bytes yang sudah ditulis tapi belum dibaca
#[inline(always)]
pub fn used_space(read: usize, write: usize, capacity: usize) -> usize {
    if write >= read {
        write - read
    } else {
        capacity - (read - write)
    }
}

/// `capacity - used_space`
#[inline(always)]
pub fn unused_space(read: usize, write: usize, capacity: usize) -> usize {
    capacity - used_space(read, write, capacity)
}

#[inline(always)]
pub fn is_empty(read: usize, write: usize) -> bool {
    read == write
}

/// Maju `len` bytes lalu dinormalisasi kembali ke `[0, capacity)`.
///
/// `len` tidak pernah lebih dari `capacity`, jadi satu pengurangan cukup.
#[inline(always)]
pub fn advance(cursor: usize, len: usize, capacity: usize) -> usize {
    debug_assert!(cursor < capacity && len <= capacity);
    let next = cursor + len;
    if next >= capacity {
        next - capacity
    } else {
        next
    }
}

/// Cursor di cache line sendiri supaya producer dan consumer tidak
/// saling false-sharing (64 bytes pada x86-64)
#[repr(C, align(64))]
pub struct Cursor {
    value: AtomicUsize,
}

impl Cursor {
    pub const fn new() -> Self {
        Self {
            value: AtomicUsize::new(0),
        }
    }

    /// Load cursor milik sisi sendiri
    #[inline(always)]
    pub fn load_own(&self) -> usize {
        self.value.load(Ordering::Relaxed)
    }

    /// Load cursor milik sisi lawan. Acquire berpasangan dengan `publish`.
    #[inline(always)]
    pub fn load_other(&self) -> usize {
        self.value.load(Ordering::Acquire)
    }

    /// Release: semua copy sebelum store ini visible bagi sisi lawan
    #[inline(always)]
    pub fn publish(&self, value: usize) {
        self.value.store(value, Ordering::Release);
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}
