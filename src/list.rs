/// Handle to a node of a [`List`]. It stays valid until the node is removed
/// or the list is sorted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

/// Link to another node of the same list.
pub(crate) type Link = Option<NodeId>;

pub(crate) struct Node<T> {
    /// Next node of the list
    pub next: Link,
    /// Previous node of the list
    pub prev: Link,
    /// Element of the node
    pub data: T,
}

/// Doubly linked list whose nodes live in a slab instead of being scattered
/// across the heap. Links are slab indices, so the list never hands out raw
/// pointers and removed slots get recycled by later appends.
///
/// ```text
///          head                                   tail
///           |                                      |
///   +-------v-----+     +-------------+     +------v------+
///   | slot 2      | --> | slot 0      | --> | slot 3      |
///   | data        | <-- | data        | <-- | data        |
///   +-------------+     +-------------+     +-------------+
///
///   vacant: [1]
/// ```
///
/// Iteration always follows the links, so the order we observe is the order in
/// which elements were appended (or the order produced by [`List::sort_by_key`]),
/// never the slot order.
pub(crate) struct List<T> {
    nodes: Vec<Option<Node<T>>>,
    vacant: Vec<usize>,
    head: Link,
    tail: Link,
    len: usize,
}

pub(crate) struct Iter<'a, T> {
    list: &'a List<T>,
    current: Link,
    remaining: usize,
}

impl<T> List<T> {
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            vacant: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn first(&self) -> Link {
        self.head
    }

    #[inline]
    fn node(&self, id: NodeId) -> Option<&Node<T>> {
        self.nodes.get(id.0)?.as_ref()
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
        self.nodes.get_mut(id.0)?.as_mut()
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.node(id).map(|node| &node.data)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.node_mut(id).map(|node| &mut node.data)
    }

    /// Returns the node that follows `id`, if any.
    pub fn next(&self, id: NodeId) -> Link {
        self.node(id)?.next
    }

    /// Appends `data` after the current tail and returns the handle of its node.
    pub fn append(&mut self, data: T) -> NodeId {
        let node = Node {
            next: None,
            prev: self.tail,
            data,
        };

        let id = match self.vacant.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        };

        match self.tail {
            Some(tail) => {
                if let Some(tail) = self.node_mut(tail) {
                    tail.next = Some(id);
                }
            }
            None => self.head = Some(id),
        }

        self.tail = Some(id);
        self.len += 1;

        id
    }

    /// Unlinks the node `id` and gives back its element. Returns `None` when
    /// `id` is not a member of the list.
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        let node = self.nodes.get_mut(id.0)?.take()?;

        match node.prev {
            Some(prev) => {
                if let Some(prev) = self.node_mut(prev) {
                    prev.next = node.next;
                }
            }
            None => self.head = node.next,
        }

        match node.next {
            Some(next) => {
                if let Some(next) = self.node_mut(next) {
                    next.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }

        self.vacant.push(id.0);
        self.len -= 1;

        Some(node.data)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.vacant.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Reorders the elements by `key`. The sort is stable and every
    /// previously returned [`NodeId`] is invalidated.
    pub fn sort_by_key<K: Ord, F: FnMut(&T) -> K>(&mut self, key: F) {
        let mut items = Vec::with_capacity(self.len);
        let mut current = self.head;

        while let Some(id) = current {
            match self.nodes.get_mut(id.0).and_then(Option::take) {
                Some(node) => {
                    current = node.next;
                    items.push(node.data);
                }
                None => break,
            }
        }

        self.clear();
        items.sort_by_key(key);

        for item in items {
            self.append(item);
        }
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            current: self.head,
            remaining: self.len,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (NodeId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.list.node(id)?;

        self.current = node.next;
        self.remaining -= 1;

        Some((id, &node.data))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
