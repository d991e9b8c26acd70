use crate::executor::Executor;
use crate::node::Node;
use crate::status::Status;

/// Forwards to its sole child. Remaps `Success` to `Failure`; every other
/// result (including `Working`) passes through unchanged. `Failure` if it
/// has no child.
#[derive(Debug, Default)]
pub struct ForceFailure;

impl Node for ForceFailure {
    fn update(&mut self, executor: &mut Executor) -> Status {
        match executor.current_children().first() {
            Some(&child) => match executor.update(child) {
                Status::Success => Status::Failure,
                other => other,
            },
            None => Status::Failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{DefaultHost, Host};
    use crate::nodes::invert::Invert;
    use crate::status::Status;
    use crate::tree::Tree;
    use crate::Executor;
    use std::rc::Rc;

    #[test]
    fn remaps_success_only() {
        let host: Rc<dyn Host> = Rc::new(DefaultHost::new());
        let tree = Tree::new(host.clone());
        let root = tree.borrow_mut().root::<ForceFailure>();
        // Invert with no child of its own returns Success, which
        // ForceFailure should remap to Failure.
        tree.borrow_mut().child::<Invert>(root);
        let mut executor = Executor::new(host);
        assert_eq!(Tree::execute(&tree, &mut executor), Status::Failure);
    }

    #[test]
    fn no_child_fails() {
        let host: Rc<dyn Host> = Rc::new(DefaultHost::new());
        let tree = Tree::new(host.clone());
        tree.borrow_mut().root::<ForceFailure>();
        let mut executor = Executor::new(host);
        assert_eq!(Tree::execute(&tree, &mut executor), Status::Failure);
    }
}
