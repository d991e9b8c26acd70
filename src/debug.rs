use crate::node::Node;
use crate::status::Status;
use crate::tree::{NodeId, Tree};

/// Optional observer registered on an `Executor`. Fired in order around
/// each tree frame push/pop and each node tick. Callbacks see shared
/// references only; they must not mutate the tree or state.
///
/// The coroutine-driven single-step UI some embedders build on top of this
/// contract is out of scope here; only the six callbacks are implemented.
pub trait DebugPreview {
    fn before_enter_tree(&mut self, tree: &Tree) {
        let _ = tree;
    }

    fn after_enter_tree(&mut self, tree: &Tree) {
        let _ = tree;
    }

    fn before_leave_tree(&mut self, tree: &Tree) {
        let _ = tree;
    }

    fn after_leave_tree(&mut self, tree: &Tree) {
        let _ = tree;
    }

    fn before_update_node(&mut self, node_id: NodeId, node: &dyn Node) {
        let _ = (node_id, node);
    }

    fn after_update_node(&mut self, node_id: NodeId, node: &dyn Node, status: Status) {
        let _ = (node_id, node, status);
    }
}
