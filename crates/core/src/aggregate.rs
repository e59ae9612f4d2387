//! Entity and aggregate-root traits, plus optimistic-concurrency primitives.

use crate::error::{DomainError, DomainResult};

/// A domain entity: identity plus continuity across state changes.
///
/// Entities are compared by identifier, never by attribute values. A payment
/// method whose alias changes is still the same stored card; an order line
/// keeps its identity through discount and unit updates.
pub trait Entity {
    /// Strongly-typed entity identifier (`OrderId`, `BuyerId`, ...).
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}

/// Aggregate root marker + the pending domain-event protocol.
///
/// An aggregate root is the single consistency boundary for its owned
/// entities. Mutations record domain events on an internal ledger; the
/// persistence layer drains that ledger (`take_domain_events`) only after the
/// owning mutation has committed, and the drained events are what gets
/// translated into integration events for other bounded contexts.
pub trait AggregateRoot: Entity {
    /// Domain-event type recorded by this aggregate.
    type DomainEvent;

    /// Events recorded since the last drain, in recording order.
    fn domain_events(&self) -> &[Self::DomainEvent];

    /// Drain pending events, leaving the ledger empty.
    fn take_domain_events(&mut self) -> Vec<Self::DomainEvent>;
}

/// Optimistic concurrency expectation for an aggregate save.
///
/// The version token counts committed saves; a fresh aggregate is at 0. A
/// writer that loaded at version `v` expects the store to still be at `v`;
/// anything else means a concurrent writer got there first.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (migrations, replays).
    Any,
    /// Require the stored aggregate to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_version_mismatch_is_a_conflict() {
        assert!(ExpectedVersion::Exact(3).check(3).is_ok());
        assert!(ExpectedVersion::Any.check(7).is_ok());

        let err = ExpectedVersion::Exact(3).check(4).unwrap_err();
        match err {
            DomainError::Conflict(_) => {}
            other => panic!("expected Conflict, got {other:?}"),
        }
    }
}
