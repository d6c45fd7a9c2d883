//! Status outputs, published once per tick for readers on other threads.

use std::sync::Arc;

use parking_lot::RwLock;

/// Snapshot of the externally visible status levels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStatus {
    /// Live generation tag.
    pub generation: u16,
    /// Row currently being issued.
    pub issuing_row: usize,
    /// Frame incomplete, an engine active, or a bank in use.
    pub render_busy: bool,
    /// The live generation's frame has been fully computed.
    pub frame_complete: bool,
    /// Tick the snapshot was taken on.
    pub tick: u64,
}

/// Shared slot holding the latest [`RenderStatus`].
///
/// Cloning shares the same slot.
#[derive(Clone, Debug, Default)]
pub struct StatusBoard {
    inner: Arc<RwLock<RenderStatus>>,
}

impl StatusBoard {
    /// Creates a board holding the default status.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the published status.
    pub fn publish(&self, status: RenderStatus) {
        *self.inner.write() = status;
    }

    /// Latest published status.
    #[must_use]
    pub fn snapshot(&self) -> RenderStatus {
        *self.inner.read()
    }
}
