use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

use log::debug;

use crate::error::TreeError;
use crate::executor::Executor;
use crate::host::Host;
use crate::node::Node;
use crate::reference::{Local, Slot, SlotId};
use crate::state::State;
use crate::status::Status;

/// Process-wide identity of a `Tree`, minted from its `Host` when the tree
/// is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeId(u64);

/// Tree-scoped identity of a node. Carries its owning tree's id so a node
/// cannot be mistaken for one belonging to a different tree even if the
/// bare index happens to collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(TreeId, usize);

impl NodeId {
    pub fn tree(&self) -> TreeId {
        self.0
    }
}

/// Integer-keyed indirection slot inside a tree, dynamically bindable to a
/// sub-tree at runtime. Embedders wanting a different hashable key type are
/// out of scope for this crate (see the design notes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u64);

impl From<u64> for ChannelId {
    fn from(value: u64) -> Self {
        ChannelId(value)
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Wire {
    pub from: SlotId,
    pub to: SlotId,
}

pub(crate) type NodeSlot = Rc<RefCell<Box<dyn Node>>>;

/// Shared handle to a `Tree`. Sub-tree and channel assignment require
/// shared ownership, so trees are always passed around this way rather than
/// as a bare `Tree`.
pub type TreeHandle = Rc<RefCell<Tree>>;

/// The authored graph: nodes, parent-child structure, channels and their
/// sub-tree assignments, per-node wire tables, and tree-level locals and
/// constants.
pub struct Tree {
    id: TreeId,
    host: Rc<dyn Host>,
    self_handle: Weak<RefCell<Tree>>,
    nodes: Vec<NodeSlot>,
    root: Option<NodeId>,
    children: HashMap<NodeId, Vec<NodeId>>,
    channels: HashSet<ChannelId>,
    channel_nodes: HashMap<ChannelId, NodeId>,
    channel_assignments: HashMap<ChannelId, TreeHandle>,
    locals: HashSet<SlotId>,
    constants: HashSet<SlotId>,
    constant_values: State,
    node_inputs: HashMap<NodeId, Vec<Wire>>,
    node_outputs: HashMap<NodeId, Vec<Wire>>,
    inputs: HashSet<SlotId>,
    outputs: HashSet<SlotId>,
    local_counter: u64,
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("id", &self.id)
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .field("channels", &self.channels)
            .finish()
    }
}

impl Tree {
    /// Construct an empty tree against a shared host and return it already
    /// wrapped in the `Rc<RefCell<_>>` handle every other operation expects.
    pub fn new(host: Rc<dyn Host>) -> TreeHandle {
        let id = TreeId(host.next_id());
        let tree = Tree {
            id,
            host,
            self_handle: Weak::new(),
            nodes: Vec::new(),
            root: None,
            children: HashMap::new(),
            channels: HashSet::new(),
            channel_nodes: HashMap::new(),
            channel_assignments: HashMap::new(),
            locals: HashSet::new(),
            constants: HashSet::new(),
            constant_values: State::new(),
            node_inputs: HashMap::new(),
            node_outputs: HashMap::new(),
            inputs: HashSet::new(),
            outputs: HashSet::new(),
            local_counter: 0,
        };
        let handle = Rc::new(RefCell::new(tree));
        handle.borrow_mut().self_handle = Rc::downgrade(&handle);
        handle
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn host(&self) -> &Rc<dyn Host> {
        &self.host
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Read accessor for the root node; panics (contract violation) if the
    /// tree is empty.
    pub fn root_node(&self) -> NodeId {
        self.root.expect("Tree::root_node called on an empty tree")
    }

    pub fn children_of(&self, node: NodeId) -> &[NodeId] {
        self.children
            .get(&node)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn channels(&self) -> impl Iterator<Item = &ChannelId> {
        self.channels.iter()
    }

    pub fn channel_assignment(&self, channel: ChannelId) -> Option<TreeHandle> {
        self.channel_assignments.get(&channel).cloned()
    }

    fn contains(&self, id: NodeId) -> bool {
        id.0 == self.id && id.1 < self.nodes.len()
    }

    pub(crate) fn node_slot(&self, id: NodeId) -> Option<NodeSlot> {
        if id.0 != self.id {
            return None;
        }
        self.nodes.get(id.1).cloned()
    }

    fn push_node(&mut self, node: Box<dyn Node>) -> NodeId {
        let id = NodeId(self.id, self.nodes.len());
        self.nodes.push(Rc::new(RefCell::new(node)));
        id
    }

    /// Destroy nodes, children maps, wire maps, locals, constants, and
    /// channel state, in that order.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.children.clear();
        self.node_inputs.clear();
        self.node_outputs.clear();
        self.locals.clear();
        self.constants.clear();
        self.constant_values = State::new();
        self.channels.clear();
        self.channel_nodes.clear();
        self.channel_assignments.clear();
    }

    // ---- authoring surface ----

    pub fn root_with(&mut self, node: impl Node + 'static) -> NodeId {
        if !self.nodes.is_empty() {
            self.clear();
        }
        let id = self.push_node(Box::new(node));
        self.root = Some(id);
        id
    }

    pub fn root<N: Node + Default + 'static>(&mut self) -> NodeId {
        self.root_with(N::default())
    }

    pub fn try_child_with(
        &mut self,
        parent: NodeId,
        node: impl Node + 'static,
    ) -> Result<NodeId, TreeError> {
        if !self.contains(parent) {
            return Err(TreeError::NodeNotInTree);
        }
        let id = self.push_node(Box::new(node));
        self.children.entry(parent).or_default().push(id);
        Ok(id)
    }

    pub fn child_with(&mut self, parent: NodeId, node: impl Node + 'static) -> NodeId {
        self.try_child_with(parent, node)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn child<N: Node + Default + 'static>(&mut self, parent: NodeId) -> NodeId {
        self.child_with(parent, N::default())
    }

    pub fn try_child_tree(
        &mut self,
        parent: NodeId,
        subtree: TreeHandle,
    ) -> Result<NodeId, TreeError> {
        self.try_child_with(parent, TreeProxyNode { target: subtree })
    }

    pub fn child_tree(&mut self, parent: NodeId, subtree: TreeHandle) -> NodeId {
        self.try_child_tree(parent, subtree)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn try_child_channel(
        &mut self,
        parent: NodeId,
        channel: ChannelId,
    ) -> Result<NodeId, TreeError> {
        if self.channels.contains(&channel) {
            return Err(TreeError::DuplicateChannel(channel));
        }
        let owner = self.self_handle.clone();
        let id = self.try_child_with(parent, ChannelProxyNode { owner, channel })?;
        self.channels.insert(channel);
        self.channel_nodes.insert(channel, id);
        Ok(id)
    }

    pub fn child_channel(&mut self, parent: NodeId, channel: ChannelId) -> NodeId {
        self.try_child_channel(parent, channel)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Bind a sub-tree to a channel. Reassignment first unassigns.
    pub fn try_assign(&mut self, channel: ChannelId, subtree: TreeHandle) -> Result<(), TreeError> {
        if !self.channels.contains(&channel) {
            return Err(TreeError::UnknownChannel(channel));
        }
        if !Rc::ptr_eq(&self.host, &subtree.borrow().host) {
            return Err(TreeError::IncompatibleTree);
        }
        self.channel_assignments.insert(channel, subtree);
        Ok(())
    }

    pub fn assign(&mut self, channel: ChannelId, subtree: TreeHandle) {
        self.try_assign(channel, subtree)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn unassign(&mut self, channel: ChannelId) {
        self.channel_assignments.remove(&channel);
    }

    pub fn local<V: Clone + fmt::Debug + 'static>(&mut self, name: Option<&str>) -> Local<V> {
        let id = self.local_counter;
        self.local_counter += 1;
        let local = Local::new(self.id, id, name);
        self.locals.insert(local.slot_id());
        local
    }

    pub fn constant<V: Clone + fmt::Debug + 'static>(&mut self, value: V) -> Local<V> {
        let local = self.local(None);
        self.constants.insert(local.slot_id());
        self.constant_values.set(&local, value);
        local
    }

    pub fn declare_input(&mut self, slot: SlotId) {
        self.inputs.insert(slot);
    }

    pub fn declare_output(&mut self, slot: SlotId) {
        self.outputs.insert(slot);
    }

    pub fn try_input(&mut self, node: NodeId, from: SlotId, to: SlotId) -> Result<(), TreeError> {
        if !self.contains(node) {
            return Err(TreeError::NodeNotInTree);
        }
        self.node_inputs.entry(node).or_default().push(Wire { from, to });
        Ok(())
    }

    pub fn input(&mut self, node: NodeId, from: SlotId, to: SlotId) {
        self.try_input(node, from, to).unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn try_output(&mut self, node: NodeId, from: SlotId, to: SlotId) -> Result<(), TreeError> {
        if !self.contains(node) {
            return Err(TreeError::NodeNotInTree);
        }
        self.node_outputs.entry(node).or_default().push(Wire { from, to });
        Ok(())
    }

    pub fn output(&mut self, node: NodeId, from: SlotId, to: SlotId) {
        self.try_output(node, from, to).unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn input_channel(&mut self, channel: ChannelId, from: SlotId, to: SlotId) {
        let node = *self
            .channel_nodes
            .get(&channel)
            .unwrap_or_else(|| panic!("{}", TreeError::UnknownChannel(channel)));
        self.input(node, from, to);
    }

    pub fn output_channel(&mut self, channel: ChannelId, from: SlotId, to: SlotId) {
        let node = *self
            .channel_nodes
            .get(&channel)
            .unwrap_or_else(|| panic!("{}", TreeError::UnknownChannel(channel)));
        self.output(node, from, to);
    }

    // ---- execution surface ----

    /// Enter a tree frame, copy constants into the executor state, tick the
    /// root node, leave the tree frame, and return the root's status. An
    /// empty tree short-circuits to `Failure` without touching the executor.
    pub fn execute(handle: &TreeHandle, executor: &mut Executor) -> Status {
        if handle.borrow().is_empty() {
            debug!("execute on empty tree {:?}; returning Failure", handle.borrow().id());
            return Status::Failure;
        }

        executor.enter_tree(handle);
        {
            let tree_ref = handle.borrow();
            executor.state_mut().copy_all(&tree_ref.constant_values);
        }
        let root = handle.borrow().root_node();
        let status = executor.update(root);
        executor.leave_tree(handle);
        debug!("tree {:?} executed with status {:?}", handle.borrow().id(), status);
        status
    }

    /// Per-node driver: applies input wires, visits and ticks the node,
    /// applies output wires, then unsets every transient endpoint. Called by
    /// `Executor::update`, never directly by user code.
    pub fn update(handle: &TreeHandle, executor: &mut Executor, node: NodeId) -> Status {
        executor.enter_node(handle, node);

        let (inputs, outputs, slot) = {
            let tree_ref = handle.borrow();
            (
                tree_ref.node_inputs.get(&node).cloned().unwrap_or_default(),
                tree_ref.node_outputs.get(&node).cloned().unwrap_or_default(),
                tree_ref
                    .node_slot(node)
                    .expect("node belongs to the tree it is ticked through"),
            )
        };

        for wire in &inputs {
            executor.state_mut().copy_rename_same(wire.from, wire.to);
        }

        if !executor.current_node_visited() {
            executor.mark_current_visited();
            slot.borrow_mut().activated(executor);
        }

        if let Some(dbg) = executor.debug_mut() {
            dbg.before_update_node(node, &**slot.borrow());
        }
        let status = slot.borrow_mut().update(executor);
        if let Some(dbg) = executor.debug_mut() {
            dbg.after_update_node(node, &**slot.borrow(), status);
        }

        executor.leave_node(handle, node, status);

        for wire in &outputs {
            executor.state_mut().copy_rename_same(wire.from, wire.to);
        }
        for wire in &inputs {
            executor.state_mut().unset_id(wire.to);
        }
        for wire in &outputs {
            executor.state_mut().unset_id(wire.from);
        }

        status
    }
}

/// Ticks a sub-tree fixed at authoring time. See `ChannelProxyNode` for the
/// dynamically-rebindable variant.
struct TreeProxyNode {
    target: TreeHandle,
}

impl fmt::Debug for TreeProxyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeProxyNode")
            .field("target", &self.target.borrow().id())
            .finish()
    }
}

impl Node for TreeProxyNode {
    fn update(&mut self, executor: &mut Executor) -> Status {
        Tree::execute(&self.target, executor)
    }
}

/// Dispatches to whichever sub-tree is currently assigned to its channel in
/// the owning tree; `Failure` if nothing is assigned.
struct ChannelProxyNode {
    owner: Weak<RefCell<Tree>>,
    channel: ChannelId,
}

impl fmt::Debug for ChannelProxyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelProxyNode")
            .field("channel", &self.channel)
            .finish()
    }
}

impl Node for ChannelProxyNode {
    fn update(&mut self, executor: &mut Executor) -> Status {
        let owner = self
            .owner
            .upgrade()
            .expect("owner tree dropped while its channel proxy is still attached");
        let assignment = owner.borrow().channel_assignment(self.channel);
        match assignment {
            Some(subtree) => Tree::execute(&subtree, executor),
            None => Status::Failure,
        }
    }
}
