use std::mem;

use crate::kernel::Mapping;

/// Size of the in-band header that precedes every block's payload.
pub const HEADER_SIZE: usize = mem::size_of::<i64>();

/// Smallest gross size a block can have: its header plus one usable byte.
pub(crate) const MIN_BLOCK_SIZE: usize = HEADER_SIZE + 1;

/// Descriptor of a block inside an arena. The only thing we store is the
/// offset of its payload, everything else lives in the header right before it.
///
/// ```text
/// +---------------------+ <------ payload - HEADER_SIZE
/// |   gross size (i64)  |         -> Header
/// +---------------------+ <------ payload
/// |       Content       |        |
/// |         ...         |        | -> Addressable content
/// |         ...         |        |    (gross size - HEADER_SIZE bytes)
/// +---------------------+ <------+
/// ```
///
/// The header stores the *gross* size of the block, that is the header itself
/// plus the usable bytes. It is written in the platform's native byte order and
/// never leaves the arena, so it is not a wire format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Block {
    /// Offset of the first usable byte, relative to the start of the mapping.
    pub payload: usize,
}

impl Block {
    #[inline]
    pub fn new(payload: usize) -> Self {
        debug_assert!(payload >= HEADER_SIZE);
        Self { payload }
    }

    /// Offset of the block header.
    #[inline]
    pub fn header(&self) -> usize {
        self.payload - HEADER_SIZE
    }

    /// Gross size of the block as recorded in its header. A negative header
    /// is reported as zero, which every caller treats as corruption.
    pub fn size(&self, memory: &Mapping) -> usize {
        usize::try_from(memory.read_i64(self.header())).unwrap_or(0)
    }

    pub fn set_size(&self, memory: &mut Mapping, size: usize) {
        debug_assert!(size >= MIN_BLOCK_SIZE);
        memory.write_i64(self.header(), size as i64);
    }

    /// Number of bytes the caller can use.
    pub fn usable_size(&self, memory: &Mapping) -> usize {
        self.size(memory).saturating_sub(HEADER_SIZE)
    }

    /// Payload offset of whatever block starts right after this one.
    pub fn next_payload(&self, memory: &Mapping) -> usize {
        self.payload + self.size(memory)
    }

    /// Fills the usable bytes with zeros. The header stays untouched.
    pub fn zero_payload(&self, memory: &mut Mapping) {
        let end = self.payload + self.usable_size(memory);
        memory.zero(self.payload..end);
    }

    /// Wipes the header of a block that no longer exists.
    pub fn clear_header(&self, memory: &mut Mapping) {
        memory.zero(self.header()..self.payload);
    }
}
