//! A behavior-tree runtime for controlling agents: hierarchical decision
//! trees built out of primitive control-flow nodes (sequence, selector,
//! decorator, inverter) and user-defined leaves, ticked against a
//! blackboard [`State`] shared by the whole run.
//!
//! Four tightly coupled subsystems define the runtime semantics:
//!
//! - [`Tree`], the authored graph: nodes, channels, locals, constants, and
//!   per-edge wires.
//! - [`Executor`], the traversal engine, owning the retained frame tree
//!   that tracks activation across ticks.
//! - [`State`], the typed blackboard, including lexically-scoped locals.
//! - Wiring, the pre/post-tick copy discipline applied by [`Tree::update`]
//!   that lets composable sub-trees be authored against private names.

pub mod debug;
pub mod error;
pub mod executor;
pub mod host;
pub mod node;
pub mod nodes;
pub mod property;
pub mod reference;
pub mod state;
pub mod status;
pub mod tree;

pub use debug::DebugPreview;
pub use error::{StateError, TreeError};
pub use executor::Executor;
pub use host::{DefaultHost, Host};
pub use node::Node;
pub use property::ErasedProperty;
pub use reference::{Local, Reference, Slot, SlotId};
pub use state::State;
pub use status::Status;
pub use tree::{ChannelId, NodeId, Tree, TreeHandle, TreeId};
