//! Mirrored Region: satu backing object di-mmap dua kali secara berurutan
//!
//! Layout virtual memory:
//! ┌──────────────────────────┬──────────────────────────┐
//! │ lower half (capacity)    │ upper half (capacity)    │
//! └──────────────────────────┴──────────────────────────┘
//!   ^ base                     ^ base + capacity
//!
//! Byte `i` dan `i + capacity` adalah alias dari byte fisik yang sama,
//! sehingga copy linear sepanjang <= capacity dari offset mana pun di
//! `[0, capacity)` tidak pernah keluar dari region.
//!
//! Semua manipulasi address yang `unsafe` dikumpulkan di modul ini:
//! `reserve`, `map_fixed`, `unmap`.

use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;
use std::ptr::{self, NonNull};

use tracing::{debug, warn};

use super::error::{AllocationError, Half};

/// Ukuran page sistem (`sysconf(_SC_PAGESIZE)`)
pub fn page_size() -> usize {
    // SAFETY: sysconf tidak punya precondition
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size <= 0 {
        4096
    } else {
        size as usize
    }
}

/// Region `2 * capacity` bytes yang kedua half-nya alias ke storage yang sama.
///
/// Region di-unmap tepat sekali saat di-drop.
pub struct MirroredRegion {
    base: NonNull<u8>,
    capacity: usize,
}

// SAFETY: Region hanya pointer ke mapping milik sendiri. Sinkronisasi akses
// ke isinya menjadi tanggung jawab pemakai (lihat cursor protocol di
// ring_buffer / spsc).
unsafe impl Send for MirroredRegion {}
unsafe impl Sync for MirroredRegion {}

impl MirroredRegion {
    /// Membuat region baru.
    ///
    /// `capacity` harus kelipatan page size dan bukan nol, karena half kedua
    /// di-map secara fixed pada `base + capacity`.
    pub fn new(capacity: usize) -> Result<Self, AllocationError> {
        let page_size = page_size();
        if capacity == 0 || capacity % page_size != 0 || capacity > isize::MAX as usize / 2 {
            warn!(capacity, page_size, "rejecting capacity for mirrored region");
            return Err(AllocationError::InvalidCapacity {
                capacity,
                page_size,
            });
        }

        let backing = backing_object()?;
        backing.set_len(capacity as u64).map_err(|source| {
            warn!(capacity, error = %source, "failed to resize backing object");
            AllocationError::Resize { capacity, source }
        })?;

        let reservation = Reservation::new(capacity * 2)?;
        let base = reservation.as_ptr();

        map_fixed(&backing, base, capacity, Half::Lower)?;
        // SAFETY: base + capacity masih di dalam reservasi 2 * capacity
        map_fixed(
            &backing,
            unsafe { base.add(capacity) },
            capacity,
            Half::Upper,
        )?;

        // Kedua mapping sudah menahan storage; fd tidak diperlukan lagi.
        drop(backing);

        let base = reservation.into_raw();
        debug!(capacity, base = ?base, "mirrored region mapped");

        Ok(Self { base, capacity })
    }

    /// Ukuran satu half dalam bytes
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pointer awal region (lower half)
    #[inline(always)]
    pub fn as_ptr(&self) -> *const u8 {
        self.base.as_ptr()
    }

    /// Slice `len` bytes mulai dari `offset`.
    ///
    /// # Safety
    /// `offset < capacity`, `len <= capacity`, dan tidak ada writer yang
    /// sedang menulis ke bytes tersebut selama slice hidup.
    #[inline(always)]
    pub unsafe fn slice(&self, offset: usize, len: usize) -> &[u8] {
        debug_assert!(offset < self.capacity && len <= self.capacity);
        std::slice::from_raw_parts(self.base.as_ptr().add(offset), len)
    }

    /// Copy `data` ke region mulai dari `offset` sebagai satu copy linear.
    ///
    /// # Safety
    /// `offset < capacity`, `data.len() <= capacity`, dan tidak ada reader
    /// yang sedang memegang slice ke bytes tujuan.
    #[inline(always)]
    pub unsafe fn write(&self, offset: usize, data: &[u8]) {
        debug_assert!(offset < self.capacity && data.len() <= self.capacity);
        ptr::copy_nonoverlapping(data.as_ptr(), self.base.as_ptr().add(offset), data.len());
    }
}

impl Drop for MirroredRegion {
    fn drop(&mut self) {
        // SAFETY: base..base + 2 * capacity adalah mapping milik region ini
        unsafe { unmap(self.base.as_ptr(), self.capacity * 2) };
    }
}

impl std::fmt::Debug for MirroredRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirroredRegion")
            .field("base", &self.base)
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Reservasi address space `PROT_NONE`. Di-unmap saat drop kecuali
/// di-`into_raw`, sehingga setiap jalur error melepas reservasi.
struct Reservation {
    ptr: NonNull<u8>,
    len: usize,
}

impl Reservation {
    fn new(len: usize) -> Result<Self, AllocationError> {
        // SAFETY: mapping anonim baru, tidak menyentuh memory yang ada
        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_NONE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            let source = io::Error::last_os_error();
            warn!(len, error = %source, "failed to reserve address space");
            return Err(AllocationError::Reserve { len, source });
        }

        match NonNull::new(addr.cast::<u8>()) {
            Some(ptr) => Ok(Self { ptr, len }),
            None => Err(AllocationError::Reserve {
                len,
                source: io::Error::new(io::ErrorKind::Other, "mmap returned null"),
            }),
        }
    }

    fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    fn into_raw(self) -> NonNull<u8> {
        let ptr = self.ptr;
        std::mem::forget(self);
        ptr
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        // SAFETY: reservasi (dan mapping fixed di dalamnya) milik guard ini
        unsafe { unmap(self.ptr.as_ptr(), self.len) };
    }
}

/// Map `backing` read/write di address `addr` yang sudah direservasi.
fn map_fixed(
    backing: &File,
    addr: *mut u8,
    len: usize,
    half: Half,
) -> Result<(), AllocationError> {
    // SAFETY: addr..addr + len berada di dalam reservasi milik pemanggil,
    // sehingga MAP_FIXED hanya menimpa halaman PROT_NONE milik kita sendiri.
    let actual = unsafe {
        libc::mmap(
            addr.cast(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_SHARED | libc::MAP_FIXED,
            backing.as_raw_fd(),
            0,
        )
    };

    if actual == libc::MAP_FAILED {
        let source = io::Error::last_os_error();
        warn!(%half, error = %source, "failed to map mirrored half");
        return Err(AllocationError::Map { half, source });
    }

    if actual.cast::<u8>() != addr {
        warn!(%half, "mirrored half landed at unexpected address");
        // SAFETY: mapping di luar reservasi, hasil mmap barusan
        unsafe { unmap(actual.cast(), len) };
        return Err(AllocationError::Misplaced {
            half,
            expected: addr as usize,
            actual: actual as usize,
        });
    }

    Ok(())
}

/// # Safety
/// `addr..addr + len` harus mapping milik pemanggil yang tidak lagi dipakai.
unsafe fn unmap(addr: *mut u8, len: usize) {
    if libc::munmap(addr.cast(), len) != 0 {
        warn!(len, error = %io::Error::last_os_error(), "munmap failed");
    }
}

/// Backing object anonim: memfd di Linux, temp file yang langsung di-unlink
/// di platform lain (atau kalau kernel belum punya memfd).
#[cfg(any(target_os = "linux", target_os = "android"))]
fn backing_object() -> Result<File, AllocationError> {
    use std::os::unix::io::FromRawFd;

    // SAFETY: nama adalah C string yang valid
    let fd = unsafe { libc::memfd_create(b"cirbuf\0".as_ptr().cast(), libc::MFD_CLOEXEC) };
    if fd >= 0 {
        // SAFETY: fd baru dan hanya dimiliki File ini
        return Ok(unsafe { File::from_raw_fd(fd) });
    }

    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ENOSYS) {
        debug!("memfd_create unavailable, falling back to unlinked temp file");
        return temp_backing_object();
    }

    warn!(error = %err, "memfd_create failed");
    Err(AllocationError::BackingObject(err))
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn backing_object() -> Result<File, AllocationError> {
    temp_backing_object()
}

/// Temp file tanpa nama di filesystem (`O_TMPFILE` atau create + unlink)
fn temp_backing_object() -> Result<File, AllocationError> {
    tempfile::tempfile().map_err(|err| {
        warn!(error = %err, "failed to create unlinked temp file");
        AllocationError::BackingObject(err)
    })
}
