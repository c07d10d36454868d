//! Flow identifier sequencing.
//!
//! Every regeneration cycle is tagged with a monotonically increasing
//! flow id. There is no preemptive cancellation of in-flight work; once a
//! transform stage has started it always runs to completion. Instead,
//! every asynchronous continuation re-validates its captured flow id
//! against the live counter before touching visible state, and discards
//! its result when a newer flow has been issued since. The on-disk
//! artifact write is allowed to finish either way, since a later cycle
//! can reuse it.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of one logical regeneration cycle.
pub type FlowId = u64;

/// Issues and validates flow ids.
#[derive(Debug, Default)]
pub struct FlowSequencer {
    current: AtomicU64,
}

impl FlowSequencer {
    /// Creates a sequencer with no issued flows.
    #[must_use]
    pub const fn new() -> Self { Self { current: AtomicU64::new(0) } }

    /// Issues a new flow id, superseding all previously issued ones.
    pub fn issue(&self) -> FlowId { self.current.fetch_add(1, Ordering::SeqCst) + 1 }

    /// Returns the most recently issued flow id.
    #[must_use]
    pub fn current(&self) -> FlowId { self.current.load(Ordering::SeqCst) }

    /// Checks whether a captured flow id is still the active one.
    #[must_use]
    pub fn is_current(&self, id: FlowId) -> bool { self.current() == id }
}
