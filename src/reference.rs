use std::fmt;
use std::marker::PhantomData;

use crate::host::Host;
use crate::tree::TreeId;

/// Type-erased identity of a blackboard slot: either process-wide
/// (`Global`, minted from a shared `Host`) or tree-scoped (`Local`, minted
/// by one tree's own counter and tagged with that tree's id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotId {
    Global(u64),
    Local(TreeId, u64),
}

/// Common interface for `Reference<V>` and `Local<V>`: something that names
/// a typed slot in a `State`.
pub trait Slot {
    type Value: Clone + fmt::Debug + 'static;

    fn slot_id(&self) -> SlotId;
    fn name(&self) -> Option<&str>;
}

/// Process-wide typed identity, minted from a shared `Host`. Two references
/// are equal only if they carry the same minted id; the name is diagnostic
/// only.
pub struct Reference<V> {
    id: u64,
    name: Option<String>,
    _marker: PhantomData<fn() -> V>,
}

impl<V> Reference<V> {
    pub fn new(host: &dyn Host, name: Option<&str>) -> Self {
        Reference {
            id: host.next_id(),
            name: name.map(String::from),
            _marker: PhantomData,
        }
    }
}

impl<V> Clone for Reference<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Reference<V> {}

impl<V> PartialEq for Reference<V> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<V> Eq for Reference<V> {}

impl<V> fmt::Debug for Reference<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

impl<V: Clone + fmt::Debug + 'static> Slot for Reference<V> {
    type Value = V;

    fn slot_id(&self) -> SlotId {
        SlotId::Global(self.id)
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Tree-scoped typed identity. Its presence in a `State` is tied to the
/// owning tree's frame being active; when that frame unwinds, every `Local`
/// minted from it is pruned from the state.
pub struct Local<V> {
    tree: TreeId,
    id: u64,
    name: Option<String>,
    _marker: PhantomData<fn() -> V>,
}

impl<V> Local<V> {
    pub(crate) fn new(tree: TreeId, id: u64, name: Option<&str>) -> Self {
        Local {
            tree,
            id,
            name: name.map(String::from),
            _marker: PhantomData,
        }
    }

    pub fn tree(&self) -> TreeId {
        self.tree
    }
}

impl<V> Clone for Local<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Local<V> {}

impl<V> PartialEq for Local<V> {
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree && self.id == other.id
    }
}

impl<V> Eq for Local<V> {}

impl<V> fmt::Debug for Local<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Local")
            .field("tree", &self.tree)
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

impl<V: Clone + fmt::Debug + 'static> Slot for Local<V> {
    type Value = V;

    fn slot_id(&self) -> SlotId {
        SlotId::Local(self.tree, self.id)
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
