//! Producer/Consumer handles untuk dua thread
//!
//! Tidak ada Mutex: producer hanya menulis write cursor, consumer hanya
//! menulis read cursor, dan masing-masing membaca cursor lawan dengan
//! Acquire.

use std::ops::Deref;
use std::sync::Arc;

use super::ring_buffer::Ring;

pub(crate) fn split(ring: Ring) -> (Producer, Consumer) {
    let ring = Arc::new(ring);
    (
        Producer {
            ring: Arc::clone(&ring),
        },
        Consumer { ring },
    )
}

/// Sisi tulis. Hanya ada satu per buffer dan tidak bisa di-clone.
pub struct Producer {
    ring: Arc<Ring>,
}

impl Producer {
    /// Lihat [`CircularBuffer::offer`](super::CircularBuffer::offer)
    #[inline(always)]
    pub fn offer(&mut self, data: &[u8]) -> usize {
        // SAFETY: &mut self pada satu-satunya Producer
        unsafe { self.ring.offer(data) }
    }

    /// Free space yang terlihat dari sisi producer. Bisa bertambah kapan
    /// saja karena consumer berjalan paralel.
    #[inline(always)]
    pub fn unused_space(&self) -> usize {
        self.ring.unused_space()
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

/// Sisi baca. Hanya ada satu per buffer.
pub struct Consumer {
    ring: Arc<Ring>,
}

impl Consumer {
    /// Lihat semua data yang sudah dipublish producer tanpa mengonsumsinya.
    ///
    /// Bytes di view tidak bisa ditimpa producer selama view hidup, karena
    /// read cursor baru maju lewat `poll`, yang butuh `&mut self`.
    #[inline(always)]
    pub fn peek(&self) -> Option<&[u8]> {
        // SAFETY: &self pada satu-satunya Consumer
        unsafe { self.ring.peek() }
    }

    /// Ambil `len` bytes dari head.
    ///
    /// Read cursor baru dipublish saat guard di-drop, jadi producer tidak
    /// bisa menimpa bytes yang masih dibaca. Returns `None` kalau kosong
    /// atau `len > used_space()`.
    #[inline(always)]
    pub fn poll(&mut self, len: usize) -> Option<PollGuard<'_>> {
        // SAFETY: &mut self pada satu-satunya Consumer
        let offset = unsafe { self.ring.pollable(len)? };
        Some(PollGuard {
            ring: &self.ring,
            offset,
            len,
        })
    }

    #[inline(always)]
    pub fn used_space(&self) -> usize {
        self.ring.used_space()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

/// View `len` bytes hasil `Consumer::poll`.
///
/// Bytes dikembalikan ke producer saat guard di-drop. Copy keluar apa pun
/// yang perlu disimpan lebih lama.
pub struct PollGuard<'a> {
    ring: &'a Ring,
    offset: usize,
    len: usize,
}

impl Deref for PollGuard<'_> {
    type Target = [u8];

    #[inline(always)]
    fn deref(&self) -> &[u8] {
        // SAFETY: offset/len divalidasi pollable dan belum di-release
        unsafe { self.ring.view(self.offset, self.len) }
    }
}

impl Drop for PollGuard<'_> {
    #[inline(always)]
    fn drop(&mut self) {
        // SAFETY: guard dipinjam dari &mut Consumer
        unsafe { self.ring.release(self.len) }
    }
}

impl std::fmt::Debug for PollGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollGuard")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish()
    }
}
