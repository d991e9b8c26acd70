use crate::executor::Executor;
use crate::node::Node;
use crate::status::Status;

/// Ticks children in authoring order. Returns `Failure` or `Working`
/// immediately on the first child that returns one; `Success` once every
/// child has succeeded, including on an empty child list.
#[derive(Debug, Default)]
pub struct Sequence;

impl Node for Sequence {
    fn update(&mut self, executor: &mut Executor) -> Status {
        for child in executor.current_children() {
            match executor.update(child) {
                Status::Success => continue,
                other => return other,
            }
        }
        Status::Success
    }
}
