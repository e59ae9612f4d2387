//! Domain-event machinery: the per-aggregate pending-event ledger, the
//! integration-event envelope published after commit, and the pub/sub bus
//! abstraction used to distribute those envelopes.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod ledger;

pub use bus::{EventBus, Subscription};
pub use envelope::IntegrationEvent;
pub use event::DomainEvent;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use ledger::EventLedger;
