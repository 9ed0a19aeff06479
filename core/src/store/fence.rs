//! Request generations for fetchable resources.
//!
//! Every `begin_*` call issues a `Ticket`. Only the most recently issued
//! ticket may apply its result; anything older lost the race to a forced
//! refresh or was outstanding across a reset.

/// Proof that a fetch was started. Hand it back to the matching `finish_*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Default)]
pub(crate) struct Fence {
    latest: u64,
}

impl Fence {
    pub(crate) fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    /// Make every outstanding ticket stale.
    pub(crate) fn invalidate(&mut self) {
        self.latest += 1;
    }

    pub(crate) fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }
}
