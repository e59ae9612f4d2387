//! Collaborator contracts consumed by the command handlers.
//!
//! The core owns no wire format and no storage engine; it talks to a
//! persistence store, a request-dedup record, and an integration-event
//! publisher exclusively through the traits below. In-memory adapters live in
//! `ordering-infra`; production backends implement the same contracts.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use thiserror::Error;

use ordering_buyers::{Buyer, BuyerDomainEvent};
use ordering_core::{OrderId, RequestId};
use ordering_orders::{Order, OrderDomainEvent};

/// Store operation error.
///
/// Infrastructure failures, as opposed to domain errors: a concurrency
/// conflict is retryable by reloading; a duplicate request means another
/// writer already committed the same command identifier.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("request {0} was already recorded")]
    DuplicateRequest(RequestId),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Integration-event publication error.
#[derive(Debug, Error)]
#[error("integration event publication failed: {0}")]
pub struct PublishError(pub String);

/// An aggregate paired with the version token it was loaded at.
///
/// The token counts committed saves; a fresh aggregate is at 0. `commit`
/// expects the store to still hold exactly this version and bumps it by one,
/// so a conflicting concurrent writer fails instead of being silently
/// overwritten.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub aggregate: T,
    pub version: u64,
}

impl<T> Versioned<T> {
    /// Wrap a newly created aggregate (version 0, nothing stored yet).
    pub fn new(aggregate: T) -> Self {
        Self {
            aggregate,
            version: 0,
        }
    }

    /// Wrap an aggregate loaded at a known version.
    pub fn at(aggregate: T, version: u64) -> Self {
        Self { aggregate, version }
    }
}

/// Dedup record mapping a command identifier to "seen".
///
/// Created the first time an identifier is processed, never mutated. The
/// payload is a small result summary for idempotent replay; it must never
/// contain card data.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRecord {
    pub request_id: RequestId,
    pub command_name: String,
    pub payload: JsonValue,
}

impl RequestRecord {
    pub fn new(request_id: RequestId, command_name: impl Into<String>) -> Self {
        Self {
            request_id,
            command_name: command_name.into(),
            payload: JsonValue::Null,
        }
    }

    pub fn with_payload(mut self, payload: JsonValue) -> Self {
        self.payload = payload;
        self
    }
}

/// One atomic unit: the aggregate mutations of a command plus the dedup
/// record that guards them.
///
/// Either everything in the unit commits or nothing does. A crash can
/// therefore never leave an executed command unrecorded (re-executable) or a
/// recorded command unexecuted (silently dropped retry).
#[derive(Debug, Default)]
pub struct UnitOfWork {
    pub order: Option<Versioned<Order>>,
    pub buyer: Option<Versioned<Buyer>>,
    pub request: Option<RequestRecord>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_order(mut self, order: Versioned<Order>) -> Self {
        self.order = Some(order);
        self
    }

    pub fn save_buyer(mut self, buyer: Versioned<Buyer>) -> Self {
        self.buyer = Some(buyer);
        self
    }

    pub fn record_request(mut self, record: RequestRecord) -> Self {
        self.request = Some(record);
        self
    }
}

/// Domain events drained from the aggregates of a committed unit of work.
///
/// These become integration events; they are only ever handed out after the
/// commit succeeded.
#[derive(Debug, Default)]
pub struct CommittedEvents {
    pub order_events: Vec<OrderDomainEvent>,
    pub buyer_events: Vec<BuyerDomainEvent>,
}

/// Tracks previously seen command identifiers.
pub trait RequestManager: Send + Sync {
    /// Whether `request_id` has been recorded before.
    fn exists(&self, request_id: RequestId) -> Result<bool, StoreError>;
}

/// Persistence contract for the ordering aggregates and dedup records.
///
/// Implementations must make `commit` atomic: version checks, the duplicate
/// request check, and all writes succeed or fail as one. Loads return `None`
/// for unknown aggregates.
pub trait OrderingStore: RequestManager {
    fn load_order(&self, order_id: OrderId) -> Result<Option<Versioned<Order>>, StoreError>;

    /// Look up a buyer by the authenticated identity string.
    fn load_buyer(&self, identity: &str) -> Result<Option<Versioned<Buyer>>, StoreError>;

    /// Atomically persist everything in `work`, returning the drained
    /// pending events of the committed aggregates.
    fn commit(&self, work: UnitOfWork) -> Result<CommittedEvents, StoreError>;
}

/// Fire-and-forget publisher invoked after commit (at-least-once).
pub trait IntegrationEventPublisher: Send + Sync {
    fn publish(&self, event: ordering_events::IntegrationEvent) -> Result<(), PublishError>;
}

impl<T> RequestManager for Arc<T>
where
    T: RequestManager + ?Sized,
{
    fn exists(&self, request_id: RequestId) -> Result<bool, StoreError> {
        (**self).exists(request_id)
    }
}

impl<T> OrderingStore for Arc<T>
where
    T: OrderingStore + ?Sized,
{
    fn load_order(&self, order_id: OrderId) -> Result<Option<Versioned<Order>>, StoreError> {
        (**self).load_order(order_id)
    }

    fn load_buyer(&self, identity: &str) -> Result<Option<Versioned<Buyer>>, StoreError> {
        (**self).load_buyer(identity)
    }

    fn commit(&self, work: UnitOfWork) -> Result<CommittedEvents, StoreError> {
        (**self).commit(work)
    }
}

impl<T> IntegrationEventPublisher for Arc<T>
where
    T: IntegrationEventPublisher + ?Sized,
{
    fn publish(&self, event: ordering_events::IntegrationEvent) -> Result<(), PublishError> {
        (**self).publish(event)
    }
}
