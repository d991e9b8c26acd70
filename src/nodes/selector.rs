use crate::executor::Executor;
use crate::node::Node;
use crate::status::Status;

/// Ticks children in authoring order. Returns the first result that is not
/// `Failure`; `Failure` only once every child has failed, including on an
/// empty child list.
#[derive(Debug, Default)]
pub struct Selector;

impl Node for Selector {
    fn update(&mut self, executor: &mut Executor) -> Status {
        for child in executor.current_children() {
            match executor.update(child) {
                Status::Failure => continue,
                other => return other,
            }
        }
        Status::Failure
    }
}
