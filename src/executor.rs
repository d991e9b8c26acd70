use std::rc::Rc;

use log::{debug, trace};

use crate::debug::DebugPreview;
use crate::host::Host;
use crate::state::State;
use crate::status::Status;
use crate::tree::{NodeId, Tree, TreeHandle, TreeId};

#[derive(Debug)]
enum FrameKind {
    Root,
    Tree(TreeHandle),
    Node(TreeHandle, NodeId),
}

fn kind_matches(a: &FrameKind, b: &FrameKind) -> bool {
    match (a, b) {
        (FrameKind::Root, FrameKind::Root) => true,
        (FrameKind::Tree(t1), FrameKind::Tree(t2)) => Rc::ptr_eq(t1, t2),
        (FrameKind::Node(t1, n1), FrameKind::Node(t2, n2)) => {
            Rc::ptr_eq(t1, t2) && n1 == n2
        }
        _ => false,
    }
}

/// A retained shadow-tree node, shadowing one tree-entry or node-entry,
/// that gives the runtime its cross-tick memory of which branches were
/// active last tick.
#[derive(Debug)]
struct FrameNode {
    kind: FrameKind,
    parent: Option<usize>,
    /// Cursor into `children` used to reconcile the next `push_frame`.
    index: usize,
    children: Vec<usize>,
    /// Debounces `activated`/`deactivated` for node frames; unused by tree
    /// and root frames.
    visited: bool,
    /// The state's scope before this tree frame was entered, restored on
    /// leave. Unused by node and root frames.
    saved_scope: Option<TreeId>,
}

impl FrameNode {
    fn new(kind: FrameKind, parent: Option<usize>) -> Self {
        FrameNode {
            kind,
            parent,
            index: 0,
            children: Vec::new(),
            visited: false,
            saved_scope: None,
        }
    }
}

/// The tick engine. Owns the retained frame tree, drives enter/leave of
/// trees and nodes, applies wire-copy before/after each node, and invokes
/// the debug preview.
///
/// Frames live in a slab with a freelist rather than being individually
/// heap-allocated, so truncating an abandoned branch is just returning
/// indices to the freelist.
pub struct Executor {
    host: Rc<dyn Host>,
    state: State,
    frames: Vec<Option<FrameNode>>,
    free: Vec<usize>,
    current: usize,
    tree_stack: Vec<TreeHandle>,
    debug: Option<Box<dyn DebugPreview>>,
}

const ROOT: usize = 0;

impl Executor {
    pub fn new(host: Rc<dyn Host>) -> Self {
        Executor {
            host,
            state: State::new(),
            frames: vec![Some(FrameNode::new(FrameKind::Root, None))],
            free: Vec::new(),
            current: ROOT,
            tree_stack: Vec::new(),
            debug: None,
        }
    }

    pub fn with_debug(host: Rc<dyn Host>, debug: Box<dyn DebugPreview>) -> Self {
        let mut executor = Self::new(host);
        executor.debug = Some(debug);
        executor
    }

    pub fn set_debug(&mut self, debug: Option<Box<dyn DebugPreview>>) {
        self.debug = debug;
    }

    pub fn host(&self) -> &Rc<dyn Host> {
        &self.host
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    pub(crate) fn debug_mut(&mut self) -> Option<&mut dyn DebugPreview> {
        self.debug.as_deref_mut()
    }

    fn frame(&self, idx: usize) -> &FrameNode {
        self.frames[idx].as_ref().expect("frame slot is empty")
    }

    fn frame_mut(&mut self, idx: usize) -> &mut FrameNode {
        self.frames[idx].as_mut().expect("frame slot is empty")
    }

    fn alloc_frame(&mut self, node: FrameNode) -> usize {
        if let Some(idx) = self.free.pop() {
            self.frames[idx] = Some(node);
            idx
        } else {
            self.frames.push(Some(node));
            self.frames.len() - 1
        }
    }

    /// Reconcile the next child of the current frame against `kind`: reuse
    /// the cached child if it matches, otherwise truncate the stale tail
    /// (cascading deactivation) and allocate fresh.
    fn push_frame(&mut self, kind: FrameKind) -> usize {
        let current = self.current;
        let i = self.frame(current).index;
        self.frame_mut(current).index += 1;

        if i < self.frame(current).children.len() {
            let child_idx = self.frame(current).children[i];
            if kind_matches(&self.frame(child_idx).kind, &kind) {
                trace!("reusing frame {child_idx} at slot {i}");
                self.frame_mut(child_idx).index = 0;
                self.current = child_idx;
                return child_idx;
            }
            trace!("frame mismatch at slot {i}, truncating stale children");
            let stale: Vec<usize> = self.frame(current).children[i..].to_vec();
            self.frame_mut(current).children.truncate(i);
            for idx in stale {
                self.destroy_frame(idx);
            }
        }

        let new_idx = self.alloc_frame(FrameNode::new(kind, Some(current)));
        self.frame_mut(current).children.push(new_idx);
        self.current = new_idx;
        new_idx
    }

    /// Truncate any trailing cached children not visited this pass (cascading
    /// deactivation), reset the index, and return to the parent.
    fn leave_frame(&mut self) {
        let idx = self.current;
        let keep = self.frame(idx).index;
        let stale: Vec<usize> = self.frame(idx).children[keep..].to_vec();
        self.frame_mut(idx).children.truncate(keep);
        for s in stale {
            self.destroy_frame(s);
        }
        self.frame_mut(idx).index = 0;
        let parent = self.frame(idx).parent;
        self.current = parent.unwrap_or(idx);

        // Unwound all the way to depth 0: reset the root's cursor so the
        // next tick reconciles from the top.
        if self.frame(self.current).parent.is_none() {
            self.frame_mut(self.current).index = 0;
        }
    }

    /// Depth-first, post-order destruction: children first, then this
    /// frame's own lifecycle hook.
    fn destroy_frame(&mut self, idx: usize) {
        let frame = self.frames[idx].take().expect("frame exists");
        for child in &frame.children {
            self.destroy_frame(*child);
        }
        match &frame.kind {
            FrameKind::Root => {}
            FrameKind::Tree(handle) => {
                let tree_id = handle.borrow().id();
                self.state.invalidate_scope(tree_id);
            }
            FrameKind::Node(handle, node_id) => {
                if frame.visited {
                    let slot = handle.borrow().node_slot(*node_id);
                    if let Some(slot) = slot {
                        trace!("deactivating node {node_id:?} on frame collapse");
                        slot.borrow_mut().deactivated(self);
                    }
                }
            }
        }
        self.free.push(idx);
    }

    pub fn enter_tree(&mut self, handle: &TreeHandle) {
        if let Some(dbg) = self.debug.as_deref_mut() {
            dbg.before_enter_tree(&handle.borrow());
        }
        let idx = self.push_frame(FrameKind::Tree(handle.clone()));
        let tree_id = handle.borrow().id();
        let prev = self.state.enter_scope(tree_id);
        self.frame_mut(idx).saved_scope = prev;
        self.tree_stack.push(handle.clone());
        debug!("entered tree {tree_id:?}");
        if let Some(dbg) = self.debug.as_deref_mut() {
            dbg.after_enter_tree(&handle.borrow());
        }
    }

    pub fn leave_tree(&mut self, handle: &TreeHandle) {
        if let Some(dbg) = self.debug.as_deref_mut() {
            dbg.before_leave_tree(&handle.borrow());
        }
        let idx = self.current;
        debug_assert!(
            matches!(self.frame(idx).kind, FrameKind::Tree(_)),
            "leave_tree called without a matching tree frame current"
        );
        let prev = self.frame(idx).saved_scope;
        self.state.leave_scope(prev);
        self.tree_stack.pop();
        self.leave_frame();
        debug!("left tree {:?}", handle.borrow().id());
        if let Some(dbg) = self.debug.as_deref_mut() {
            dbg.after_leave_tree(&handle.borrow());
        }
    }

    /// Push a node frame. Driven by `Tree::update`; never called directly
    /// by user code.
    pub fn enter_node(&mut self, handle: &TreeHandle, node: NodeId) {
        self.push_frame(FrameKind::Node(handle.clone(), node));
    }

    /// Pop a node frame. Driven by `Tree::update`; never called directly by
    /// user code.
    pub fn leave_node(&mut self, _handle: &TreeHandle, node: NodeId, status: Status) {
        trace!("node {node:?} ticked with status {status:?}");
        self.leave_frame();
    }

    /// Asserts a tree frame is active, then delegates to the current
    /// tree's `Tree::update`.
    pub fn update(&mut self, node: NodeId) -> Status {
        let tree = self
            .tree_stack
            .last()
            .cloned()
            .expect("Executor::update called outside a tree frame");
        Tree::update(&tree, self, node)
    }

    /// Used for nodes that are traversed but not ticked: pushes a node
    /// frame, fires `activated` on first visit, then leaves.
    pub fn visit(&mut self, node: NodeId) {
        let tree = self
            .tree_stack
            .last()
            .cloned()
            .expect("Executor::visit called outside a tree frame");
        self.enter_node(&tree, node);
        let slot = tree
            .borrow()
            .node_slot(node)
            .expect("node belongs to the current tree");
        if !self.current_node_visited() {
            self.mark_current_visited();
            slot.borrow_mut().activated(self);
        }
        self.leave_node(&tree, node, Status::None);
    }

    pub(crate) fn current_node_visited(&self) -> bool {
        self.frame(self.current).visited
    }

    pub(crate) fn mark_current_visited(&mut self) {
        self.frame_mut(self.current).visited = true;
    }

    pub(crate) fn clear_current_visited(&mut self) {
        self.frame_mut(self.current).visited = false;
    }

    /// The node currently being ticked, derived from the current frame.
    /// Composite and decorator primitives use this (together with
    /// `current_tree`) instead of storing their own id, since the frame the
    /// executor just pushed for them names exactly that.
    pub fn current_node(&self) -> NodeId {
        match self.frame(self.current).kind {
            FrameKind::Node(_, node) => node,
            _ => panic!("Executor::current_node called outside a node frame"),
        }
    }

    pub fn current_tree(&self) -> Option<TreeHandle> {
        self.tree_stack.last().cloned()
    }

    /// Convenience used by the composite/decorator primitives: the
    /// authored children of the node currently being ticked.
    pub fn current_children(&self) -> Vec<NodeId> {
        let node = self.current_node();
        let tree = self
            .current_tree()
            .expect("current_children called outside a tree frame");
        tree.borrow().children_of(node).to_vec()
    }

    /// Truncate the current frame's children to zero, forcing
    /// re-initialization of any sub-state on their next entry.
    pub fn reset_children_of_current(&mut self) {
        let idx = self.current;
        let stale: Vec<usize> = self.frame(idx).children.clone();
        self.frame_mut(idx).children.clear();
        self.frame_mut(idx).index = 0;
        for s in stale {
            self.destroy_frame(s);
        }
    }

    /// Discard the entire frame cache except the root frame and clear the
    /// state.
    pub fn reset(&mut self) {
        self.current = ROOT;
        self.reset_children_of_current();
        self.state = State::new();
        self.tree_stack.clear();
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        self.reset();
    }
}
