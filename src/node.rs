use core::fmt;
use core::mem;
use core::ops::{Index, IndexMut};

/// Handle to a node slot inside a tree's arena.
///
/// Handles stay valid across insertions and rotations, since nodes are relinked in
/// place. Any erase may vacate or repurpose slots, so a handle obtained before an erase
/// must be looked up again afterwards.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Slot 0: the shared terminator every absent child or parent link points to.
    pub(crate) const NIL: NodeId = NodeId(0);

    #[inline]
    pub(crate) fn is_nil(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub(crate) fn non_nil(self) -> Option<NodeId> {
        if self.is_nil() {
            None
        } else {
            Some(self)
        }
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            write!(f, "#nil")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

pub(crate) struct Node<K, V, M> {
    entry: Option<(K, V)>,
    pub(crate) parent: NodeId,
    pub(crate) left: NodeId,
    pub(crate) right: NodeId,
    pub(crate) meta: M,
}

impl<K, V, M> Node<K, V, M> {
    fn vacant(meta: M) -> Self {
        Node{entry: None, parent: NodeId::NIL, left: NodeId::NIL, right: NodeId::NIL, meta}
    }

    fn entry(&self) -> &(K, V) {
        match &self.entry {
            Some(entry) => entry,
            None => panic!("sentinel or vacated slot carries no entry"),
        }
    }

    pub(crate) fn key(&self) -> &K {
        &self.entry().0
    }

    pub(crate) fn value(&self) -> &V {
        &self.entry().1
    }

    pub(crate) fn value_mut(&mut self) -> &mut V {
        match &mut self.entry {
            Some(entry) => &mut entry.1,
            None => panic!("sentinel or vacated slot carries no entry"),
        }
    }

    pub(crate) fn key_value(&self) -> (&K, &V) {
        let (k, v) = self.entry();
        (k, v)
    }

    pub(crate) fn is_occupied(&self) -> bool {
        self.entry.is_some()
    }
}

/// Node storage. Children and parents are slot indices, so the tree owns every node
/// exactly once and parent links never keep anything alive.
pub(crate) struct Arena<K, V, M> {
    nodes: Vec<Node<K, V, M>>,
    vacated: Vec<NodeId>,
    sentinel: M,
}

impl<K, V, M: Copy> Arena<K, V, M> {
    pub(crate) fn new(sentinel: M) -> Self {
        Self{nodes: vec![Node::vacant(sentinel)], vacated: Vec::new(), sentinel}
    }

    pub(crate) fn alloc(&mut self, key: K, value: V, meta: M, parent: NodeId) -> NodeId {
        let node = Node{entry: Some((key, value)), parent, left: NodeId::NIL, right: NodeId::NIL, meta};
        match self.vacated.pop() {
            Some(id) => {
                self.nodes[id.0] = node;
                id
            },
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            },
        }
    }

    /// Vacates `id` and hands back its entry. The node must already be unlinked.
    pub(crate) fn release(&mut self, id: NodeId) -> (K, V) {
        assert!(!id.is_nil(), "the sentinel is never released");
        let sentinel = self.sentinel;
        let node = mem::replace(&mut self.nodes[id.0], Node::vacant(sentinel));
        self.vacated.push(id);
        match node.entry {
            Some(entry) => entry,
            None => panic!("released slot {:?} twice", id),
        }
    }

    /// Exchanges the key/value payloads of two live nodes, leaving links and metadata.
    pub(crate) fn swap_entries(&mut self, a: NodeId, b: NodeId) {
        assert!(!a.is_nil() && !b.is_nil());
        let a_entry = self.nodes[a.0].entry.take();
        let b_entry = mem::replace(&mut self.nodes[b.0].entry, a_entry);
        self.nodes[a.0].entry = b_entry;
    }

    pub(crate) fn reset(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0] = Node::vacant(self.sentinel);
        self.vacated.clear();
    }

    /// True for slots that currently hold a key; false for the sentinel, vacated slots
    /// and indices the arena never handed out.
    pub(crate) fn is_live(&self, id: NodeId) -> bool {
        !id.is_nil() && self.nodes.get(id.0).map_or(false, |n| n.is_occupied())
    }

    pub(crate) fn sentinel_meta(&self) -> M {
        self.nodes[0].meta
    }
}

impl<K, V, M> Index<NodeId> for Arena<K, V, M> {
    type Output = Node<K, V, M>;

    #[inline]
    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.0]
    }
}

impl<K, V, M> IndexMut<NodeId> for Arena<K, V, M> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        &mut self.nodes[id.0]
    }
}

#[test]
fn test_alloc_reuses_vacated_slots() {
    let mut a: Arena<u32, u32, u8> = Arena::new(0);

    let x = a.alloc(1, 10, 1, NodeId::NIL);
    let y = a.alloc(2, 20, 1, x);
    assert!(!x.is_nil() && !y.is_nil() && x != y);
    assert_eq!(a[y].parent, x);
    assert!(a.is_live(x));
    assert!(!a.is_live(NodeId::NIL));

    assert_eq!(a.release(x), (1, 10));
    assert!(!a.is_live(x));
    let z = a.alloc(3, 30, 1, NodeId::NIL);
    assert_eq!(z, x);
    assert_eq!(*a[z].key(), 3);
}

#[test]
fn test_swap_entries_keeps_links() {
    let mut a: Arena<u32, &str, u8> = Arena::new(0);

    let x = a.alloc(1, "one", 7, NodeId::NIL);
    let y = a.alloc(2, "two", 9, x);
    a[x].right = y;
    a.swap_entries(x, y);
    assert_eq!(a[x].key_value(), (&2, &"two"));
    assert_eq!(a[y].key_value(), (&1, &"one"));
    assert_eq!(a[x].meta, 7);
    assert_eq!(a[x].right, y);
    assert_eq!(a[y].parent, x);
}

#[test]
fn test_reset_restores_sentinel() {
    let mut a: Arena<u32, u32, u8> = Arena::new(5);

    let x = a.alloc(1, 1, 1, NodeId::NIL);
    a[NodeId::NIL].parent = x;
    a.reset();
    assert_eq!(a[NodeId::NIL].parent, NodeId::NIL);
    assert_eq!(a.sentinel_meta(), 5);
    assert!(!a.is_live(x));
}
