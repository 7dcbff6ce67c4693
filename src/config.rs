//! Konfigurasi buffer
//!
//! Kapasitas mentah harus kelipatan page size. `BufferConfig` membulatkan
//! ke atas secara default supaya pemanggil bisa memakai angka apa pun.

use crate::core::round_to_page;

/// Default: 64KB
pub const DEFAULT_CAPACITY: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    /// Kapasitas yang diminta dalam bytes
    pub capacity: usize,
    /// Bulatkan `capacity` ke kelipatan page size
    pub round_to_page: bool,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            round_to_page: true,
        }
    }
}

impl BufferConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Pakai `capacity` apa adanya; konstruksi gagal kalau tidak sejajar page
    pub fn exact(mut self) -> Self {
        self.round_to_page = false;
        self
    }

    /// Kapasitas yang benar-benar dipakai saat konstruksi
    pub fn resolved_capacity(&self) -> usize {
        if self.round_to_page {
            round_to_page(self.capacity)
        } else {
            self.capacity
        }
    }
}
