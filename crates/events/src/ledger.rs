//! Pending domain-event ledger embedded in aggregate roots.

/// Accumulates the domain events an aggregate records during a unit of work.
///
/// Events stay in recording order. `take` drains the ledger; the persistence
/// layer calls it only after the owning mutation has committed, so events are
/// never visible downstream before their transaction. `remove` supports the
/// rare case where a recorded event must be withdrawn before commit.
#[derive(Debug, Clone, PartialEq)]
pub struct EventLedger<E> {
    events: Vec<E>,
}

impl<E> EventLedger<E> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Append an event to the ledger.
    pub fn record(&mut self, event: E) {
        self.events.push(event);
    }

    /// Drain all pending events, leaving the ledger empty.
    pub fn take(&mut self) -> Vec<E> {
        std::mem::take(&mut self.events)
    }

    pub fn as_slice(&self) -> &[E] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<E: PartialEq> EventLedger<E> {
    /// Withdraw the first pending event equal to `event`.
    ///
    /// Returns whether anything was removed.
    pub fn remove(&mut self, event: &E) -> bool {
        match self.events.iter().position(|e| e == event) {
            Some(pos) => {
                self.events.remove(pos);
                true
            }
            None => false,
        }
    }
}

impl<E> Default for EventLedger<E> {
    fn default() -> Self {
        Self::new()
    }
}
