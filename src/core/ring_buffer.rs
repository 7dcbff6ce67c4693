//! Magic Ring Buffer: byte-oriented circular buffer di atas mirrored region
//!
//! Karena region di-map dua kali, setiap `offer` dan setiap view hasil
//! `peek`/`poll` adalah satu copy/slice linear, tanpa split di titik wrap.
//!
//! Protokol cursor (SPSC):
//! - Write cursor hanya diubah oleh producer, setelah bytes selesai di-copy
//!   (Release). Consumer membacanya dengan Acquire.
//! - Read cursor hanya diubah oleh consumer, setelah bytes selesai dibaca.
//! - Buffer tidak pernah penuh total: maksimum payload `capacity - 1`.

use tracing::trace;

use super::cursor::{self, Cursor};
use super::error::AllocationError;
use super::mirror::{page_size, MirroredRegion};
use super::spsc::{self, Consumer, Producer};
use crate::config::BufferConfig;

/// State bersama: region + kedua cursor.
///
/// Method `unsafe` di sini mengasumsikan pemanggil memegang peran yang
/// tepat (satu producer, satu consumer). `CircularBuffer` menjamin itu
/// lewat `&mut self`, `Producer`/`Consumer` lewat kepemilikan handle.
pub(crate) struct Ring {
    read: Cursor,
    write: Cursor,
    region: MirroredRegion,
}

impl Ring {
    fn new(capacity: usize) -> Result<Self, AllocationError> {
        Ok(Self {
            read: Cursor::new(),
            write: Cursor::new(),
            region: MirroredRegion::new(capacity)?,
        })
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.region.capacity()
    }

    #[inline(always)]
    pub(crate) fn used_space(&self) -> usize {
        let read = self.read.load_other();
        let write = self.write.load_other();
        cursor::used_space(read, write, self.capacity())
    }

    #[inline(always)]
    pub(crate) fn unused_space(&self) -> usize {
        self.capacity() - self.used_space()
    }

    #[inline(always)]
    pub(crate) fn is_empty(&self) -> bool {
        cursor::is_empty(self.read.load_other(), self.write.load_other())
    }

    /// Copy `data` ke tail lalu publish write cursor.
    ///
    /// # Safety
    /// Hanya boleh dipanggil dari satu producer pada satu waktu.
    #[inline(always)]
    pub(crate) unsafe fn offer(&self, data: &[u8]) -> usize {
        let capacity = self.capacity();
        let write = self.write.load_own();
        let read = self.read.load_other();
        let unused = cursor::unused_space(read, write, capacity);

        // >= bukan >: used_space == capacity tidak bisa dibedakan dari kosong
        if data.len() >= unused {
            trace!(requested = data.len(), unused, "offer rejected");
            return 0;
        }

        // Copy linear aman walaupun melewati titik wrap berkat upper half.
        self.region.write(write, data);
        self.write.publish(cursor::advance(write, data.len(), capacity));

        data.len()
    }

    /// View dari read cursor sepanjang `used_space`.
    ///
    /// # Safety
    /// Hanya boleh dipanggil dari sisi consumer.
    #[inline(always)]
    pub(crate) unsafe fn peek(&self) -> Option<&[u8]> {
        let read = self.read.load_own();
        let write = self.write.load_other();
        if cursor::is_empty(read, write) {
            return None;
        }

        let used = cursor::used_space(read, write, self.capacity());
        Some(self.region.slice(read, used))
    }

    /// Offset read cursor kalau `len` bytes tersedia untuk di-poll.
    ///
    /// # Safety
    /// Hanya boleh dipanggil dari sisi consumer.
    #[inline(always)]
    pub(crate) unsafe fn pollable(&self, len: usize) -> Option<usize> {
        let read = self.read.load_own();
        let write = self.write.load_other();
        if cursor::is_empty(read, write) {
            trace!(requested = len, "poll on empty buffer");
            return None;
        }

        let used = cursor::used_space(read, write, self.capacity());
        if len > used {
            trace!(requested = len, used, "poll rejected");
            return None;
        }

        Some(read)
    }

    /// # Safety
    /// `offset` harus berasal dari `pollable(len)` dan read cursor belum
    /// di-release sejak itu.
    #[inline(always)]
    pub(crate) unsafe fn view(&self, offset: usize, len: usize) -> &[u8] {
        self.region.slice(offset, len)
    }

    /// Kembalikan `len` bytes di head ke free space.
    ///
    /// # Safety
    /// Hanya dari sisi consumer, dengan `len` yang sudah divalidasi
    /// `pollable`.
    #[inline(always)]
    pub(crate) unsafe fn release(&self, len: usize) {
        let read = self.read.load_own();
        self.read.publish(cursor::advance(read, len, self.capacity()));
    }
}

/// Magic Ring Buffer untuk satu pemilik.
///
/// View yang dikembalikan `peek` dan `poll` meminjam buffer, jadi compiler
/// menolak `offer` (atau `poll` berikutnya) selama view masih dipakai.
/// Untuk producer dan consumer di thread berbeda, gunakan [`split`].
///
/// Buffer di-unmap saat di-drop.
///
/// [`split`]: CircularBuffer::split
pub struct CircularBuffer {
    ring: Ring,
}

impl CircularBuffer {
    /// Membuat buffer dengan kapasitas tepat `capacity` bytes.
    ///
    /// `capacity` harus kelipatan page size. Maksimum payload adalah
    /// `capacity - 1`.
    pub fn new(capacity: usize) -> Result<Self, AllocationError> {
        Ok(Self {
            ring: Ring::new(capacity)?,
        })
    }

    /// Membuat buffer dengan kapasitas minimal `min_capacity`, dibulatkan ke
    /// atas ke kelipatan page size
    pub fn with_min_capacity(min_capacity: usize) -> Result<Self, AllocationError> {
        Self::new(round_to_page(min_capacity))
    }

    pub fn from_config(config: &BufferConfig) -> Result<Self, AllocationError> {
        Self::new(config.resolved_capacity())
    }

    /// Copy `data` ke buffer.
    ///
    /// Returns jumlah bytes yang ditulis: `data.len()`, atau `0` kalau
    /// `data.len() >= unused_space()`.
    #[inline(always)]
    pub fn offer(&mut self, data: &[u8]) -> usize {
        // SAFETY: &mut self = satu-satunya producer
        unsafe { self.ring.offer(data) }
    }

    /// Lihat semua data yang belum dibaca tanpa mengonsumsinya.
    ///
    /// Returns `None` kalau buffer kosong.
    #[inline(always)]
    pub fn peek(&self) -> Option<&[u8]> {
        // SAFETY: tidak ada producer lain; offer butuh &mut self
        unsafe { self.ring.peek() }
    }

    /// Ambil `len` bytes dari head dan majukan read cursor.
    ///
    /// Returns `None` kalau buffer kosong atau `len > used_space()`; read
    /// cursor tidak berubah dalam kasus itu. View hanya valid sampai
    /// pemanggilan berikutnya yang butuh `&mut self`.
    #[inline(always)]
    pub fn poll(&mut self, len: usize) -> Option<&[u8]> {
        // SAFETY: &mut self = satu-satunya consumer, dan bytes yang di-release
        // tidak bisa ditimpa selama view meminjam self
        unsafe {
            let offset = self.ring.pollable(len)?;
            self.ring.release(len);
            Some(self.ring.view(offset, len))
        }
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    #[inline(always)]
    pub fn used_space(&self) -> usize {
        self.ring.used_space()
    }

    #[inline(always)]
    pub fn unused_space(&self) -> usize {
        self.ring.unused_space()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Pisah menjadi handle producer dan consumer untuk dua thread.
    ///
    /// Data yang sudah ada di buffer tetap ada. Region di-unmap saat handle
    /// terakhir di-drop.
    pub fn split(self) -> (Producer, Consumer) {
        spsc::split(self.ring)
    }
}

impl std::fmt::Debug for CircularBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircularBuffer")
            .field("capacity", &self.capacity())
            .field("used_space", &self.used_space())
            .finish()
    }
}

/// Bulatkan ke atas ke kelipatan page size (minimal satu page)
pub(crate) fn round_to_page(len: usize) -> usize {
    let page = page_size();
    len.max(1).div_ceil(page).saturating_mul(page)
}
