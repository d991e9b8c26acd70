use thiserror::Error;

use crate::tree::ChannelId;

/// Authoring-time failures a caller might reasonably want to recover from
/// (for instance a batch tool building many trees) rather than treat as a
/// hard stop. Contract violations reachable only from *within* a tick
/// (double-attach, unbalanced enter/leave, wiring against a foreign node)
/// are deliberately not part of this enum; they panic at the call site,
/// since threading a `Result` through every composite's `update` would
/// force every node author to handle errors that indicate a bug, not a
/// recoverable condition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("channel {0:?} is already registered in this tree")]
    DuplicateChannel(ChannelId),
    #[error("channel {0:?} has no node registered for it in this tree")]
    UnknownChannel(ChannelId),
    #[error("node does not belong to this tree")]
    NodeNotInTree,
    #[error("trees were not minted from the same host")]
    IncompatibleTree,
}

/// Recoverable read failures against a `State`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("no property present for slot {0}")]
    MissingProperty(String),
}
