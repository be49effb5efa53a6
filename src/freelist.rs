use crate::{
    block::Block,
    kernel::Mapping,
    list::{Link, List, NodeId},
};

/// Unordered collection of [`Block`] descriptors. The arena keeps two of
/// them, one for free blocks and one for outstanding allocations, and every
/// block is a member of exactly one.
///
/// ```text
///            Free Registry                         Allocated Registry
///
///    +------+    +------+    +------+             +------+    +------+
///    | 0x08 | -> | 0x90 | -> | 0x40 |             | 0x58 | -> | 0x20 |
///    +------+    +------+    +------+             +------+    +------+
///        |          |           |                     |           |
///  +-----v---+----+-v-----+---+-v------+---------+----v--+---------v---+
///  |  Free   |Alloc| Free  |...| Free   |   ...   | Alloc |   Alloc    |
///  +---------+-----+-------+---+--------+---------+-------+------------+
///                              Backing buffer
/// ```
///
/// Descriptors are kept in insertion order, which is the order first-fit
/// scans them in. The coalescing pass needs them ordered by address instead,
/// see [`Registry::sort_by_address`].
pub(crate) struct Registry {
    /// Nodes of the list
    blocks: List<Block>,
}

impl Registry {
    /// Creates a new empty Registry
    pub const fn new() -> Self {
        Self { blocks: List::new() }
    }

    /// Number of blocks in the registry.
    #[inline]
    pub fn count(&self) -> usize {
        self.blocks.len()
    }

    /// Appends `block` after every block already in the registry.
    pub fn insert_tail(&mut self, block: Block) -> NodeId {
        self.blocks.append(block)
    }

    /// Linear scan for the block whose payload starts at `payload`.
    pub fn find(&self, payload: usize) -> Option<NodeId> {
        self.blocks
            .iter()
            .find(|(_, block)| block.payload == payload)
            .map(|(node, _)| node)
    }

    /// Unlinks `node`. Returns `None` if it was not a member, callers are
    /// expected to have just found it.
    pub fn delete(&mut self, node: NodeId) -> Option<Block> {
        self.blocks.remove(node)
    }

    pub fn get(&self, node: NodeId) -> Option<Block> {
        self.blocks.get(node).copied()
    }

    /// Points `node` at a different block without moving it in the list.
    /// Splitting relies on this so the remainder keeps its scan position.
    pub fn replace(&mut self, node: NodeId, block: Block) -> Option<Block> {
        self.blocks
            .get_mut(node)
            .map(|current| std::mem::replace(current, block))
    }

    #[inline]
    pub fn first(&self) -> Link {
        self.blocks.first()
    }

    #[inline]
    pub fn next(&self, node: NodeId) -> Link {
        self.blocks.next(node)
    }

    /// Reorders the blocks by ascending payload address. Previously returned
    /// [`NodeId`] handles are invalidated.
    pub fn sort_by_address(&mut self) {
        self.blocks.sort_by_key(|block| block.payload);
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Block)> + '_ {
        self.blocks.iter().map(|(node, block)| (node, *block))
    }

    /// Iterates the usable size of every block.
    pub fn usable_sizes<'a>(&'a self, memory: &'a Mapping) -> impl Iterator<Item = usize> + 'a {
        self.blocks
            .iter()
            .map(move |(_, block)| block.usable_size(memory))
    }
}
