//! In-memory ordering store.
//!
//! Intended for tests/dev. Commits run under a single write lock, which
//! gives the required atomicity: the optimistic version checks, the
//! duplicate-request check, and all writes of one unit of work happen
//! together or not at all.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use ordering_application::{
    CommittedEvents, OrderingStore, RequestManager, RequestRecord, StoreError, UnitOfWork, Versioned,
};
use ordering_buyers::Buyer;
use ordering_core::{AggregateRoot, BuyerId, ExpectedVersion, OrderId, RequestId};
use ordering_orders::Order;

use super::retention::RequestRetention;

#[derive(Debug, Clone)]
struct StoredAggregate<T> {
    aggregate: T,
    version: u64,
}

#[derive(Debug, Clone)]
struct StoredRequest {
    record: RequestRecord,
    recorded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct StoreState {
    orders: HashMap<OrderId, StoredAggregate<Order>>,
    buyers: HashMap<BuyerId, StoredAggregate<Buyer>>,
    buyer_identities: HashMap<String, BuyerId>,
    requests: HashMap<RequestId, StoredRequest>,
}

/// RwLock'd map-backed implementation of the ordering persistence contract.
#[derive(Debug, Default)]
pub struct InMemoryOrderingStore {
    state: RwLock<StoreState>,
    retention: RequestRetention,
}

impl InMemoryOrderingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store with an explicit dedup-record retention policy.
    pub fn with_retention(retention: RequestRetention) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            retention,
        }
    }

    /// Number of orders currently stored.
    pub fn order_count(&self) -> usize {
        self.state.read().map(|s| s.orders.len()).unwrap_or(0)
    }

    /// Number of dedup records currently retained.
    pub fn request_count(&self) -> usize {
        self.state.read().map(|s| s.requests.len()).unwrap_or(0)
    }

    /// The dedup record stored for an identifier, if any.
    pub fn request_record(&self, request_id: RequestId) -> Option<RequestRecord> {
        self.state
            .read()
            .ok()?
            .requests
            .get(&request_id)
            .map(|stored| stored.record.clone())
    }

    fn purge_expired(&self, state: &mut StoreState) {
        if let RequestRetention::Ttl(window) = self.retention {
            let cutoff = Utc::now() - window;
            state.requests.retain(|_, stored| stored.recorded_at >= cutoff);
        }
    }
}

impl RequestManager for InMemoryOrderingStore {
    fn exists(&self, request_id: RequestId) -> Result<bool, StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;
        self.purge_expired(&mut state);
        Ok(state.requests.contains_key(&request_id))
    }
}

impl OrderingStore for InMemoryOrderingStore {
    fn load_order(&self, order_id: OrderId) -> Result<Option<Versioned<Order>>, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;
        Ok(state
            .orders
            .get(&order_id)
            .map(|stored| Versioned::at(stored.aggregate.clone(), stored.version)))
    }

    fn load_buyer(&self, identity: &str) -> Result<Option<Versioned<Buyer>>, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;
        Ok(state
            .buyer_identities
            .get(identity)
            .and_then(|buyer_id| state.buyers.get(buyer_id))
            .map(|stored| Versioned::at(stored.aggregate.clone(), stored.version)))
    }

    fn commit(&self, work: UnitOfWork) -> Result<CommittedEvents, StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;
        self.purge_expired(&mut state);

        // Validate everything before touching anything; the write lock makes
        // the whole unit atomic with respect to other writers.
        if let Some(request) = &work.request {
            if state.requests.contains_key(&request.request_id) {
                return Err(StoreError::DuplicateRequest(request.request_id));
            }
        }
        if let Some(order) = &work.order {
            let current = state
                .orders
                .get(&order.aggregate.id_typed())
                .map(|stored| stored.version)
                .unwrap_or(0);
            ExpectedVersion::Exact(order.version)
                .check(current)
                .map_err(|e| StoreError::Concurrency(e.to_string()))?;
        }
        if let Some(buyer) = &work.buyer {
            let buyer_id = buyer.aggregate.id_typed();
            let current = state
                .buyers
                .get(&buyer_id)
                .map(|stored| stored.version)
                .unwrap_or(0);
            ExpectedVersion::Exact(buyer.version)
                .check(current)
                .map_err(|e| StoreError::Concurrency(e.to_string()))?;

            // Buyer identities are unique; a fresh aggregate for an already
            // indexed identity lost a creation race.
            if buyer.version == 0
                && state
                    .buyer_identities
                    .get(buyer.aggregate.identity())
                    .is_some_and(|existing| *existing != buyer_id)
            {
                return Err(StoreError::Concurrency(format!(
                    "buyer identity {} is already registered",
                    buyer.aggregate.identity()
                )));
            }
        }

        let mut committed = CommittedEvents::default();
        if let Some(mut versioned) = work.order {
            committed.order_events = versioned.aggregate.take_domain_events();
            let order_id = versioned.aggregate.id_typed();
            state.orders.insert(
                order_id,
                StoredAggregate {
                    aggregate: versioned.aggregate,
                    version: versioned.version + 1,
                },
            );
        }
        if let Some(mut versioned) = work.buyer {
            committed.buyer_events = versioned.aggregate.take_domain_events();
            let buyer_id = versioned.aggregate.id_typed();
            state
                .buyer_identities
                .insert(versioned.aggregate.identity().to_string(), buyer_id);
            state.buyers.insert(
                buyer_id,
                StoredAggregate {
                    aggregate: versioned.aggregate,
                    version: versioned.version + 1,
                },
            );
        }
        if let Some(record) = work.request {
            tracing::debug!(request_id = %record.request_id, command = %record.command_name, "request recorded");
            state.requests.insert(
                record.request_id,
                StoredRequest {
                    record,
                    recorded_at: Utc::now(),
                },
            );
        }

        Ok(committed)
    }
}
