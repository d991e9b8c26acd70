use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Capability object shared by every `Tree`, `State`, and `Executor` minted
/// within one run. Its only job is handing out globally-unique ids; it
/// replaces propagating a host/allocator type parameter through every
/// public surface (see the design notes for why).
pub trait Host: fmt::Debug {
    fn next_id(&self) -> u64;
}

/// `Host` backed by a plain atomic counter, suitable for production use and
/// for tests that don't need deterministic ids.
#[derive(Debug, Default)]
pub struct DefaultHost {
    counter: AtomicU64,
}

impl DefaultHost {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Host for DefaultHost {
    fn next_id(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }
}
