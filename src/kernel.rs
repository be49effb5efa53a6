use std::{ops::Range, ptr::NonNull, sync::OnceLock};

use crate::{error::ArenaError, utils::align};

/// Virtual memory page size of the computer. This is usually 4096.
/// We can't make it a constant since we don't know the value at compile time.
static PAGE_SIZE: OnceLock<usize> = OnceLock::new();

/// Platform layer of the allocator. Here is where we request the backing
/// buffer of an arena and give it back once the arena is destroyed.
pub(crate) struct Kernel;

/// This trait provides an abstraction to handle low level memory operations
/// and syscalls. As the allocator, our top level view of this, has nothing
/// to do with the concrete implementations / APIs offered by each kernel.
trait PlatformMemory {
    /// Request a memory region of size `len`. It returns a Pointer to the
    /// given location or None if the underlying syscall fails.
    unsafe fn request_memory(len: usize) -> Option<NonNull<u8>>;

    /// Returns the memory of size `len` starting from `addr` back to the kernel.
    unsafe fn return_memory(addr: *mut u8, len: usize);

    /// Returns the virtual memory page size of the computer in bytes.
    unsafe fn page_size() -> usize;
}

/// Wrapper to calculate the computer's page size.
#[inline]
pub(crate) fn page_size() -> usize {
    *PAGE_SIZE.get_or_init(|| unsafe { Kernel::page_size() })
}

#[cfg(unix)]
mod unix {
    use super::{Kernel, PlatformMemory};

    use libc::{mmap, munmap, off_t, size_t};

    use std::{
        os::raw::{c_int, c_void},
        ptr::NonNull,
    };

    impl PlatformMemory for Kernel {
        unsafe fn request_memory(len: usize) -> Option<NonNull<u8>> {
            // mmap parameters.
            const ADDR: *mut c_void = std::ptr::null_mut::<c_void>();
            // Read-Write only memory.
            const PROT: c_int = libc::PROT_READ | libc::PROT_WRITE;
            const FLAGS: c_int = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS;
            const FD: c_int = -1;
            const OFFSET: off_t = 0;

            unsafe {
                let addr = mmap(ADDR, len as size_t, PROT, FLAGS, FD, OFFSET);

                match addr {
                    libc::MAP_FAILED => None,
                    addr => NonNull::new(addr.cast::<u8>()),
                }
            }
        }

        unsafe fn return_memory(addr: *mut u8, len: usize) {
            unsafe {
                munmap(addr as *mut c_void, len as size_t);
            }
        }

        unsafe fn page_size() -> usize {
            unsafe { libc::sysconf(libc::_SC_PAGE_SIZE) as usize }
        }
    }
}

#[cfg(windows)]
mod windows {
    use std::{mem::MaybeUninit, os::raw::c_void, ptr::NonNull};

    use super::{Kernel, PlatformMemory};

    use windows::Win32::System::{Memory, SystemInformation};

    impl PlatformMemory for Kernel {
        unsafe fn request_memory(len: usize) -> Option<NonNull<u8>> {
            // Read-Write only.
            let protection = Memory::PAGE_READWRITE;

            let flags = Memory::MEM_RESERVE | Memory::MEM_COMMIT;

            unsafe {
                let addr = Memory::VirtualAlloc(None, len, flags, protection);

                NonNull::new(addr.cast())
            }
        }

        unsafe fn return_memory(addr: *mut u8, _len: usize) {
            unsafe {
                let _ = Memory::VirtualFree(addr as *mut c_void, 0, Memory::MEM_RELEASE);
            }
        }

        unsafe fn page_size() -> usize {
            unsafe {
                let mut system_info = MaybeUninit::uninit();
                SystemInformation::GetSystemInfo(system_info.as_mut_ptr());

                system_info.assume_init().dwPageSize as usize
            }
        }
    }
}

/// The backing buffer of an arena: one contiguous, page aligned region that
/// we own exclusively until it is dropped.
///
/// Nothing outside this type touches the region through raw pointers. Every
/// access goes through a byte offset which is checked against the mapping
/// length, and only the bytes being read or written are ever borrowed, so
/// callers are free to keep using the payloads they were handed out.
pub(crate) struct Mapping {
    addr: NonNull<u8>,
    len: usize,
}

// The region is only reachable through the arena that owns the mapping, and
// the arena serializes every access behind its lock.
unsafe impl Send for Mapping {}

impl Mapping {
    /// Requests at least `size` bytes from the kernel and fills them with zeros.
    /// The request is rounded up to a whole number of pages, sizes that can't
    /// be rounded are rejected before anything is requested.
    pub fn new(size: usize) -> Result<Self, ArenaError> {
        let len = align(size.max(1), page_size()).ok_or(ArenaError::InvalidSize { size })?;

        let addr = unsafe { Kernel::request_memory(len) }
            .ok_or(ArenaError::MemoryRequestFailed { size: len })?;

        // Anonymous mappings already come zeroed on every platform we support,
        // but the arena relies on it so we don't leave it to chance.
        unsafe { addr.as_ptr().write_bytes(0, len) };

        Ok(Self { addr, len })
    }

    /// Pointer to the byte at `offset`.
    pub fn pointer_at(&self, offset: usize) -> NonNull<u8> {
        assert!(offset < self.len, "offset {offset} outside of mapping");
        unsafe { self.addr.add(offset) }
    }

    /// Inverse of [`Mapping::pointer_at`]. Returns `None` for pointers that
    /// don't belong to this mapping.
    pub fn offset_of(&self, ptr: *const u8) -> Option<usize> {
        ptr.addr()
            .checked_sub(self.addr.as_ptr().addr())
            .filter(|offset| *offset < self.len)
    }

    pub fn read_i64(&self, offset: usize) -> i64 {
        self.check(offset..offset + size_of::<i64>());
        unsafe { self.addr.as_ptr().add(offset).cast::<i64>().read_unaligned() }
    }

    pub fn write_i64(&mut self, offset: usize, value: i64) {
        self.check(offset..offset + size_of::<i64>());
        unsafe {
            self.addr
                .as_ptr()
                .add(offset)
                .cast::<i64>()
                .write_unaligned(value)
        }
    }

    pub fn zero(&mut self, range: Range<usize>) {
        self.check(range.clone());
        unsafe {
            self.addr
                .as_ptr()
                .add(range.start)
                .write_bytes(0, range.end - range.start)
        }
    }

    #[inline]
    fn check(&self, range: Range<usize>) {
        assert!(
            range.start <= range.end && range.end <= self.len,
            "range {range:?} outside of mapping of {} bytes",
            self.len
        );
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        unsafe { Kernel::return_memory(self.addr.as_ptr(), self.len) }
    }
}
