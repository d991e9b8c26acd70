/// Result of ticking a node.
///
/// `None` is the sentinel a node carries before it has ever been ticked; it
/// is never returned from `Node::update`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    None = 0,
    Success = 1,
    Failure = 2,
    Working = 3,
}

impl From<Status> for u8 {
    fn from(status: Status) -> u8 {
        status as u8
    }
}

impl TryFrom<u8> for Status {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Status::None),
            1 => Ok(Status::Success),
            2 => Ok(Status::Failure),
            3 => Ok(Status::Working),
            other => Err(other),
        }
    }
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Success | Status::Failure)
    }
}
