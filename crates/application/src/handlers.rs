//! Command handlers (application-level orchestration).
//!
//! Each handler implements the same pipeline against the collaborator ports:
//!
//! ```text
//! Command
//!   |
//! 1. Load (or create) the aggregates involved
//!   |
//! 2. Mutate them through their domain operations (events queue on ledgers)
//!   |
//! 3. Commit one unit of work: aggregates + the dedup record, atomically
//!   |
//! 4. Publish the drained events to the integration bus (after commit only)
//! ```
//!
//! Dispatch is typed and resolved at compile time: a command type maps to its
//! handler type, no runtime reflection. Handlers return `bool` (the original
//! API's convention): `false` means "target order not found", errors carry
//! everything else.

use serde_json::json;

use chrono::Utc;
use ordering_buyers::Buyer;
use ordering_core::{DomainResult, OrderId, RequestId};
use ordering_events::IntegrationEvent;
use ordering_orders::{Address, Order};

use crate::commands::{
    CancelOrderCommand, CreateOrderCommand, SetPaidOrderStatusCommand,
    SetStockConfirmedOrderStatusCommand, SetStockRejectedOrderStatusCommand, ShipOrderCommand,
};
use crate::error::CommandError;
use crate::ports::{
    CommittedEvents, IntegrationEventPublisher, OrderingStore, RequestRecord, UnitOfWork, Versioned,
};

/// Per-dispatch context threaded into every handler.
///
/// Carries the dedup identifier (if the command came in through the
/// identified wrapper) so the handler can record it atomically with the
/// aggregate mutation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandContext {
    request_id: Option<RequestId>,
}

impl CommandContext {
    /// Context for a command with no dedup identifier.
    pub fn unidentified() -> Self {
        Self { request_id: None }
    }

    /// Context for a command guarded by a request identifier.
    pub fn identified(request_id: RequestId) -> Self {
        Self {
            request_id: Some(request_id),
        }
    }

    pub fn request_id(&self) -> Option<RequestId> {
        self.request_id
    }
}

/// Handles a typed command and produces a typed output.
pub trait CommandHandler {
    type Command;
    type Output;

    fn handle(
        &self,
        command: Self::Command,
        ctx: &CommandContext,
    ) -> Result<Self::Output, CommandError>;
}

/// Translate committed domain events into integration envelopes and publish
/// them.
///
/// Must only be called with events returned by a successful commit; a
/// publication failure leaves the commit intact and surfaces as
/// `CommandError::Publish` (retrying may duplicate delivery).
pub fn publish_committed<P>(publisher: &P, committed: &CommittedEvents) -> Result<(), CommandError>
where
    P: IntegrationEventPublisher,
{
    for event in &committed.order_events {
        let envelope = IntegrationEvent::from_domain(event.order_id().into(), "ordering.order", event)
            .map_err(|e| CommandError::Publish(e.to_string()))?;
        publisher.publish(envelope)?;
    }
    for event in &committed.buyer_events {
        let envelope = IntegrationEvent::from_domain(event.buyer_id().into(), "ordering.buyer", event)
            .map_err(|e| CommandError::Publish(e.to_string()))?;
        publisher.publish(envelope)?;
    }
    Ok(())
}

/// Shared pipeline for commands that apply one status transition to an
/// existing order.
fn transition_order<S, P, F>(
    store: &S,
    publisher: &P,
    ctx: &CommandContext,
    order_id: OrderId,
    command_name: &str,
    apply: F,
) -> Result<bool, CommandError>
where
    S: OrderingStore,
    P: IntegrationEventPublisher,
    F: FnOnce(&mut Order) -> DomainResult<()>,
{
    let Some(mut order) = store.load_order(order_id)? else {
        tracing::warn!(%order_id, command = command_name, "order not found");
        return Ok(false);
    };

    apply(&mut order.aggregate)?;
    tracing::info!(%order_id, command = command_name, status = %order.aggregate.status(), "order status updated");

    let mut work = UnitOfWork::new().save_order(order);
    if let Some(request_id) = ctx.request_id() {
        work = work.record_request(
            RequestRecord::new(request_id, command_name)
                .with_payload(json!({ "order_id": order_id, "succeeded": true })),
        );
    }

    let committed = store.commit(work)?;
    publish_committed(publisher, &committed)?;
    Ok(true)
}

/// Handler: create an order (and the buyer, on first sight of the identity).
#[derive(Debug)]
pub struct CreateOrderCommandHandler<S, P> {
    store: S,
    publisher: P,
}

impl<S, P> CreateOrderCommandHandler<S, P> {
    pub fn new(store: S, publisher: P) -> Self {
        Self { store, publisher }
    }
}

impl<S, P> CommandHandler for CreateOrderCommandHandler<S, P>
where
    S: OrderingStore,
    P: IntegrationEventPublisher,
{
    type Command = CreateOrderCommand;
    type Output = bool;

    fn handle(&self, command: Self::Command, ctx: &CommandContext) -> Result<bool, CommandError> {
        if command.buyer_identity.trim().is_empty() {
            return Err(CommandError::Unauthorized);
        }

        let address = Address::new(
            &command.street,
            &command.city,
            &command.state,
            &command.country,
            &command.zip_code,
        );
        let mut order = Order::new(
            &command.buyer_identity,
            &command.buyer_name,
            address,
            command.card_type_id,
            &command.card_number,
            &command.card_holder_name,
            command.card_expiration,
        );
        for item in &command.items {
            order.add_order_item(
                item.product_id,
                &item.product_name,
                item.unit_price,
                item.discount,
                &item.picture_url,
                item.units,
            )?;
        }
        let order_id = order.id_typed();

        let mut buyer = match self.store.load_buyer(&command.buyer_identity)? {
            Some(existing) => existing,
            None => Versioned::new(Buyer::new(
                command.buyer_identity.clone(),
                command.buyer_name.clone(),
            )?),
        };

        let payment_method_id = buyer
            .aggregate
            .verify_or_add_payment_method(
                command.card_type_id,
                &format!("Payment method on {}", Utc::now().format("%Y-%m-%d")),
                &command.card_number,
                &command.card_security_number,
                &command.card_holder_name,
                command.card_expiration,
                order_id,
            )?
            .id_typed();

        order.set_payment_verified(buyer.aggregate.id_typed(), payment_method_id)?;

        tracing::info!(
            %order_id,
            buyer_identity = %command.buyer_identity,
            items = command.items.len(),
            "creating order"
        );

        let mut work = UnitOfWork::new()
            .save_buyer(buyer)
            .save_order(Versioned::new(order));
        if let Some(request_id) = ctx.request_id() {
            work = work.record_request(
                RequestRecord::new(request_id, "CreateOrderCommand")
                    .with_payload(json!({ "order_id": order_id, "succeeded": true })),
            );
        }

        let committed = self.store.commit(work)?;
        publish_committed(&self.publisher, &committed)?;
        Ok(true)
    }
}

/// Handler: cancel an order.
#[derive(Debug)]
pub struct CancelOrderCommandHandler<S, P> {
    store: S,
    publisher: P,
}

impl<S, P> CancelOrderCommandHandler<S, P> {
    pub fn new(store: S, publisher: P) -> Self {
        Self { store, publisher }
    }
}

impl<S, P> CommandHandler for CancelOrderCommandHandler<S, P>
where
    S: OrderingStore,
    P: IntegrationEventPublisher,
{
    type Command = CancelOrderCommand;
    type Output = bool;

    fn handle(&self, command: Self::Command, ctx: &CommandContext) -> Result<bool, CommandError> {
        transition_order(
            &self.store,
            &self.publisher,
            ctx,
            command.order_id,
            "CancelOrderCommand",
            Order::cancel,
        )
    }
}

/// Handler: mark a paid order as shipped.
#[derive(Debug)]
pub struct ShipOrderCommandHandler<S, P> {
    store: S,
    publisher: P,
}

impl<S, P> ShipOrderCommandHandler<S, P> {
    pub fn new(store: S, publisher: P) -> Self {
        Self { store, publisher }
    }
}

impl<S, P> CommandHandler for ShipOrderCommandHandler<S, P>
where
    S: OrderingStore,
    P: IntegrationEventPublisher,
{
    type Command = ShipOrderCommand;
    type Output = bool;

    fn handle(&self, command: Self::Command, ctx: &CommandContext) -> Result<bool, CommandError> {
        transition_order(
            &self.store,
            &self.publisher,
            ctx,
            command.order_id,
            "ShipOrderCommand",
            Order::ship,
        )
    }
}

/// Handler: stock confirmation signal from the stock service.
#[derive(Debug)]
pub struct SetStockConfirmedOrderStatusCommandHandler<S, P> {
    store: S,
    publisher: P,
}

impl<S, P> SetStockConfirmedOrderStatusCommandHandler<S, P> {
    pub fn new(store: S, publisher: P) -> Self {
        Self { store, publisher }
    }
}

impl<S, P> CommandHandler for SetStockConfirmedOrderStatusCommandHandler<S, P>
where
    S: OrderingStore,
    P: IntegrationEventPublisher,
{
    type Command = SetStockConfirmedOrderStatusCommand;
    type Output = bool;

    fn handle(&self, command: Self::Command, ctx: &CommandContext) -> Result<bool, CommandError> {
        transition_order(
            &self.store,
            &self.publisher,
            ctx,
            command.order_id,
            "SetStockConfirmedOrderStatusCommand",
            Order::confirm_stock,
        )
    }
}

/// Handler: stock rejection signal carrying the unavailable products.
#[derive(Debug)]
pub struct SetStockRejectedOrderStatusCommandHandler<S, P> {
    store: S,
    publisher: P,
}

impl<S, P> SetStockRejectedOrderStatusCommandHandler<S, P> {
    pub fn new(store: S, publisher: P) -> Self {
        Self { store, publisher }
    }
}

impl<S, P> CommandHandler for SetStockRejectedOrderStatusCommandHandler<S, P>
where
    S: OrderingStore,
    P: IntegrationEventPublisher,
{
    type Command = SetStockRejectedOrderStatusCommand;
    type Output = bool;

    fn handle(&self, command: Self::Command, ctx: &CommandContext) -> Result<bool, CommandError> {
        transition_order(
            &self.store,
            &self.publisher,
            ctx,
            command.order_id,
            "SetStockRejectedOrderStatusCommand",
            |order| order.reject_stock(command.rejected_product_ids.clone()),
        )
    }
}

/// Handler: payment success signal.
#[derive(Debug)]
pub struct SetPaidOrderStatusCommandHandler<S, P> {
    store: S,
    publisher: P,
}

impl<S, P> SetPaidOrderStatusCommandHandler<S, P> {
    pub fn new(store: S, publisher: P) -> Self {
        Self { store, publisher }
    }
}

impl<S, P> CommandHandler for SetPaidOrderStatusCommandHandler<S, P>
where
    S: OrderingStore,
    P: IntegrationEventPublisher,
{
    type Command = SetPaidOrderStatusCommand;
    type Output = bool;

    fn handle(&self, command: Self::Command, ctx: &CommandContext) -> Result<bool, CommandError> {
        transition_order(
            &self.store,
            &self.publisher,
            ctx,
            command.order_id,
            "SetPaidOrderStatusCommand",
            Order::mark_paid,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use chrono::{DateTime, Duration};
    use ordering_core::{DomainError, ProductId};
    use ordering_orders::{OrderDomainEvent, OrderStatus};

    use crate::commands::BasketItem;
    use crate::ports::{PublishError, RequestManager, StoreError};

    #[derive(Default)]
    struct MockStore {
        state: Mutex<MockState>,
    }

    #[derive(Default)]
    struct MockState {
        orders: HashMap<OrderId, Versioned<Order>>,
        buyers: HashMap<String, Versioned<Buyer>>,
        requests: HashSet<RequestId>,
    }

    impl MockStore {
        fn single_order_id(&self) -> OrderId {
            let state = self.state.lock().unwrap();
            assert_eq!(state.orders.len(), 1);
            *state.orders.keys().next().unwrap()
        }

        fn order_count(&self) -> usize {
            self.state.lock().unwrap().orders.len()
        }

        fn buyer_count(&self) -> usize {
            self.state.lock().unwrap().buyers.len()
        }
    }

    impl RequestManager for MockStore {
        fn exists(&self, request_id: RequestId) -> Result<bool, StoreError> {
            Ok(self.state.lock().unwrap().requests.contains(&request_id))
        }
    }

    impl OrderingStore for MockStore {
        fn load_order(&self, order_id: OrderId) -> Result<Option<Versioned<Order>>, StoreError> {
            Ok(self.state.lock().unwrap().orders.get(&order_id).cloned())
        }

        fn load_buyer(&self, identity: &str) -> Result<Option<Versioned<Buyer>>, StoreError> {
            Ok(self.state.lock().unwrap().buyers.get(identity).cloned())
        }

        fn commit(&self, work: UnitOfWork) -> Result<CommittedEvents, StoreError> {
            use ordering_core::AggregateRoot;

            let mut state = self.state.lock().unwrap();
            if let Some(request) = &work.request {
                if state.requests.contains(&request.request_id) {
                    return Err(StoreError::DuplicateRequest(request.request_id));
                }
            }

            let mut committed = CommittedEvents::default();
            if let Some(mut versioned) = work.order {
                committed.order_events = versioned.aggregate.take_domain_events();
                versioned.version += 1;
                state.orders.insert(versioned.aggregate.id_typed(), versioned);
            }
            if let Some(mut versioned) = work.buyer {
                committed.buyer_events = versioned.aggregate.take_domain_events();
                versioned.version += 1;
                state
                    .buyers
                    .insert(versioned.aggregate.identity().to_string(), versioned);
            }
            if let Some(request) = work.request {
                state.requests.insert(request.request_id);
            }
            Ok(committed)
        }
    }

    #[derive(Default)]
    struct CollectingPublisher {
        events: Mutex<Vec<IntegrationEvent>>,
    }

    impl CollectingPublisher {
        fn event_types(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.event_type.clone())
                .collect()
        }
    }

    impl IntegrationEventPublisher for &CollectingPublisher {
        fn publish(&self, event: IntegrationEvent) -> Result<(), PublishError> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    fn future_expiration() -> DateTime<Utc> {
        Utc::now() + Duration::days(365)
    }

    fn basket_item(units: i64, unit_price: i64, discount: i64) -> BasketItem {
        BasketItem {
            product_id: ProductId::new(),
            product_name: "cup".to_string(),
            unit_price,
            discount,
            picture_url: String::new(),
            units,
        }
    }

    fn create_command() -> CreateOrderCommand {
        CreateOrderCommand {
            items: vec![basket_item(1, 1000, 0)],
            buyer_identity: "1234".to_string(),
            buyer_name: "fakeUser".to_string(),
            street: "fakeStreet".to_string(),
            city: "FakeCity".to_string(),
            state: "fakeState".to_string(),
            country: "fakeCountry".to_string(),
            zip_code: "FakeZipCode".to_string(),
            card_type_id: 1,
            card_number: "4012888888881881".to_string(),
            card_holder_name: "FakeName".to_string(),
            card_expiration: future_expiration(),
            card_security_number: "123".to_string(),
        }
    }

    fn created_order(store: &MockStore, publisher: &CollectingPublisher) -> OrderId {
        let handler = CreateOrderCommandHandler::new(store, publisher);
        assert!(handler.handle(create_command(), &CommandContext::unidentified()).unwrap());
        store.single_order_id()
    }

    impl<T: OrderingStore> OrderingStore for &T {
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

    impl<T: RequestManager> RequestManager for &T {
        fn exists(&self, request_id: RequestId) -> Result<bool, StoreError> {
            (**self).exists(request_id)
        }
    }

    #[test]
    fn create_order_rejects_anonymous_identity() {
        let store = MockStore::default();
        let publisher = CollectingPublisher::default();
        let handler = CreateOrderCommandHandler::new(&store, &publisher);

        let mut command = create_command();
        command.buyer_identity = String::new();

        let err = handler.handle(command, &CommandContext::unidentified()).unwrap_err();
        match err {
            CommandError::Unauthorized => {}
            other => panic!("expected Unauthorized, got {other:?}"),
        }
        assert_eq!(store.order_count(), 0);
        assert!(publisher.event_types().is_empty());
    }

    #[test]
    fn create_order_persists_aggregates_and_publishes_after_commit() {
        let store = MockStore::default();
        let publisher = CollectingPublisher::default();
        let order_id = created_order(&store, &publisher);

        let stored = store.load_order(order_id).unwrap().unwrap();
        assert_eq!(stored.aggregate.status(), OrderStatus::AwaitingValidation);
        assert_eq!(stored.aggregate.total(), 1000);
        assert!(stored.aggregate.domain_events().is_empty());

        let buyer = store.load_buyer("1234").unwrap().unwrap();
        assert_eq!(buyer.aggregate.payment_methods().len(), 1);

        assert_eq!(
            publisher.event_types(),
            [
                "ordering.order.started",
                "ordering.order.awaiting_validation",
                "ordering.buyer.payment_method_verified",
            ]
        );
    }

    #[test]
    fn create_order_reuses_the_buyer_and_stored_card_on_later_orders() {
        let store = MockStore::default();
        let publisher = CollectingPublisher::default();
        let handler = CreateOrderCommandHandler::new(&store, &publisher);

        handler.handle(create_command(), &CommandContext::unidentified()).unwrap();
        handler.handle(create_command(), &CommandContext::unidentified()).unwrap();

        assert_eq!(store.order_count(), 2);
        assert_eq!(store.buyer_count(), 1);
        let buyer = store.load_buyer("1234").unwrap().unwrap();
        assert_eq!(buyer.aggregate.payment_methods().len(), 1);

        // Second create verifies against the stored card, so only the first
        // publishes a payment_method_verified event.
        let verified = publisher
            .event_types()
            .iter()
            .filter(|t| t.as_str() == "ordering.buyer.payment_method_verified")
            .count();
        assert_eq!(verified, 1);
    }

    #[test]
    fn create_order_surfaces_basket_validation_errors() {
        let store = MockStore::default();
        let publisher = CollectingPublisher::default();
        let handler = CreateOrderCommandHandler::new(&store, &publisher);

        let mut command = create_command();
        command.items = vec![basket_item(1, 12, 15)];

        let err = handler.handle(command, &CommandContext::unidentified()).unwrap_err();
        match err {
            CommandError::Domain(DomainError::Validation(_)) => {}
            other => panic!("expected Domain(Validation), got {other:?}"),
        }
        assert_eq!(store.order_count(), 0);
    }

    #[test]
    fn cancel_returns_false_for_an_unknown_order() {
        let store = MockStore::default();
        let publisher = CollectingPublisher::default();
        let handler = CancelOrderCommandHandler::new(&store, &publisher);

        let handled = handler
            .handle(CancelOrderCommand { order_id: OrderId::new() }, &CommandContext::unidentified())
            .unwrap();
        assert!(!handled);
    }

    #[test]
    fn ship_before_payment_is_a_status_change_error() {
        let store = MockStore::default();
        let publisher = CollectingPublisher::default();
        let order_id = created_order(&store, &publisher);

        let handler = ShipOrderCommandHandler::new(&store, &publisher);
        let err = handler
            .handle(ShipOrderCommand { order_id }, &CommandContext::unidentified())
            .unwrap_err();
        match err {
            CommandError::Domain(DomainError::StatusChange { .. }) => {}
            other => panic!("expected StatusChange, got {other:?}"),
        }
    }

    #[test]
    fn status_signals_drive_the_order_to_shipped() {
        let store = MockStore::default();
        let publisher = CollectingPublisher::default();
        let order_id = created_order(&store, &publisher);

        let confirm = SetStockConfirmedOrderStatusCommandHandler::new(&store, &publisher);
        assert!(confirm
            .handle(SetStockConfirmedOrderStatusCommand { order_id }, &CommandContext::unidentified())
            .unwrap());

        let paid = SetPaidOrderStatusCommandHandler::new(&store, &publisher);
        assert!(paid
            .handle(SetPaidOrderStatusCommand { order_id }, &CommandContext::unidentified())
            .unwrap());

        let ship = ShipOrderCommandHandler::new(&store, &publisher);
        assert!(ship
            .handle(ShipOrderCommand { order_id }, &CommandContext::unidentified())
            .unwrap());

        let stored = store.load_order(order_id).unwrap().unwrap();
        assert_eq!(stored.aggregate.status(), OrderStatus::Shipped);
        assert_eq!(stored.version, 4);
    }

    #[test]
    fn stock_rejection_signal_records_the_products() {
        let store = MockStore::default();
        let publisher = CollectingPublisher::default();
        let order_id = created_order(&store, &publisher);

        let rejected_id = {
            let stored = store.load_order(order_id).unwrap().unwrap();
            stored.aggregate.order_items()[0].product_id()
        };

        let handler = SetStockRejectedOrderStatusCommandHandler::new(&store, &publisher);
        assert!(handler
            .handle(
                SetStockRejectedOrderStatusCommand {
                    order_id,
                    rejected_product_ids: vec![rejected_id],
                },
                &CommandContext::unidentified(),
            )
            .unwrap());

        let stored = store.load_order(order_id).unwrap().unwrap();
        assert_eq!(stored.aggregate.status(), OrderStatus::StockRejected);
        assert_eq!(stored.aggregate.rejected_product_ids(), [rejected_id]);
        assert!(matches!(
            publisher.events.lock().unwrap().last().map(|e| e.event_type.clone()),
            Some(t) if t == "ordering.order.stock_rejected"
        ));
    }

    #[test]
    fn committed_stock_rejected_event_deserializes_back() {
        let store = MockStore::default();
        let publisher = CollectingPublisher::default();
        let order_id = created_order(&store, &publisher);

        let handler = SetStockRejectedOrderStatusCommandHandler::new(&store, &publisher);
        handler
            .handle(
                SetStockRejectedOrderStatusCommand {
                    order_id,
                    rejected_product_ids: vec![ProductId::new()],
                },
                &CommandContext::unidentified(),
            )
            .unwrap();

        let events = publisher.events.lock().unwrap();
        let envelope = events.last().unwrap();
        let decoded: OrderDomainEvent = serde_json::from_value(envelope.payload.clone()).unwrap();
        match decoded {
            OrderDomainEvent::StockRejected(e) => assert_eq!(e.order_id, order_id),
            other => panic!("expected StockRejected, got {other:?}"),
        }
    }
}
