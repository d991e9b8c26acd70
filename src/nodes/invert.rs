use crate::executor::Executor;
use crate::node::Node;
use crate::status::Status;

/// Forwards to its sole child, swapping `Success`/`Failure` and passing
/// `Working` through unchanged. `Success` if it has no child. Authoring
/// more than one child is not prevented; only the first is ticked.
#[derive(Debug, Default)]
pub struct Invert;

impl Node for Invert {
    fn update(&mut self, executor: &mut Executor) -> Status {
        match executor.current_children().first() {
            Some(&child) => match executor.update(child) {
                Status::Success => Status::Failure,
                Status::Failure => Status::Success,
                other => other,
            },
            None => Status::Success,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{DefaultHost, Host};
    use crate::status::Status;
    use crate::tree::Tree;
    use crate::Executor;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct AlwaysWorking;

    impl Node for AlwaysWorking {
        fn update(&mut self, _executor: &mut Executor) -> Status {
            Status::Working
        }
    }

    #[test]
    fn passes_working_through_unchanged() {
        let host: Rc<dyn Host> = Rc::new(DefaultHost::new());
        let tree = Tree::new(host.clone());
        let root = tree.borrow_mut().root::<Invert>();
        tree.borrow_mut().child::<AlwaysWorking>(root);
        let mut executor = Executor::new(host);
        assert_eq!(Tree::execute(&tree, &mut executor), Status::Working);
    }

    #[test]
    fn no_child_succeeds() {
        let host: Rc<dyn Host> = Rc::new(DefaultHost::new());
        let tree = Tree::new(host.clone());
        tree.borrow_mut().root::<Invert>();
        let mut executor = Executor::new(host);
        assert_eq!(Tree::execute(&tree, &mut executor), Status::Success);
    }
}
