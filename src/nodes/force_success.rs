use crate::executor::Executor;
use crate::node::Node;
use crate::status::Status;

/// Symmetric to `ForceFailure`: forwards to its sole child, remapping
/// `Failure` to `Success`; every other result passes through unchanged.
/// `Success` if it has no child.
#[derive(Debug, Default)]
pub struct ForceSuccess;

impl Node for ForceSuccess {
    fn update(&mut self, executor: &mut Executor) -> Status {
        match executor.current_children().first() {
            Some(&child) => match executor.update(child) {
                Status::Failure => Status::Success,
                other => other,
            },
            None => Status::Success,
        }
    }
}
