// Frame scheduling: the window loop asks this whether a frame is due.
// At most one frame request is ever outstanding, and cancelling releases it.

use tracing::trace;

/// Ticket for one requested frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHandle(u64);

#[derive(Default)]
pub struct FrameLoop {
    pending: Option<FrameHandle>,
    next_id: u64,
    issued: u64,
    cancelled: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for the next frame. Re-requesting while one is pending returns the same handle.
    pub fn request(&mut self) -> FrameHandle {
        if let Some(h) = self.pending {
            return h;
        }
        let h = FrameHandle(self.next_id);
        self.next_id += 1;
        self.issued += 1;
        self.pending = Some(h);
        trace!(id = h.0, "frame requested");
        h
    }

    /// Drop the pending request, if any. Returns whether there was one.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(h) => {
                self.cancelled += 1;
                trace!(id = h.0, "frame cancelled");
                true
            }
            None => false,
        }
    }

    /// Hand the pending frame to the caller, who must run it now.
    pub fn take_due(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }

    pub fn is_scheduled(&self) -> bool {
        self.pending.is_some()
    }

    /// (issued, cancelled) totals since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.issued, self.cancelled)
    }
}
