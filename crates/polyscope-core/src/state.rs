//! Frame scheduling state shared between quantities and the host application.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable handle used to ask the host for another frame.
///
/// Quantities hold a clone and call [`RedrawRequest::request`] whenever a
/// parameter edit changes what would be drawn. The host loop polls
/// [`RedrawRequest::take`] once per iteration.
#[derive(Debug, Clone, Default)]
pub struct RedrawRequest {
    pending: Arc<AtomicBool>,
}

impl RedrawRequest {
    /// Creates a handle with no pending request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a redraw as pending.
    pub fn request(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Returns whether a redraw is pending, without clearing it.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Returns whether a redraw was pending and clears the flag.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
}
