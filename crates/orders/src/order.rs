use chrono::{DateTime, Utc};

use ordering_core::{
    AggregateRoot, BuyerId, DomainError, DomainResult, Entity, OrderId, PaymentMethodId, ProductId,
    mask_pan,
};
use ordering_events::EventLedger;

use crate::address::Address;
use crate::events::{
    OrderCancelled, OrderDomainEvent, OrderShipped, OrderStarted,
    OrderStatusChangedToAwaitingValidation, OrderStatusChangedToPaid,
    OrderStatusChangedToStockConfirmed, OrderStatusChangedToStockRejected, OrderStockItem,
};
use crate::order_item::OrderItem;
use crate::status::OrderStatus;

/// Aggregate root: Order.
///
/// Owns its order lines and drives the status state machine. Every transition
/// method validates the current state first and leaves the aggregate
/// untouched on rejection. Orders are never deleted; terminal outcomes live
/// in `status`. Only a masked card number is kept, and no security number
/// ever reaches this type.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    id: OrderId,
    buyer_id: Option<BuyerId>,
    payment_method_id: Option<PaymentMethodId>,
    order_date: DateTime<Utc>,
    address: Address,
    status: OrderStatus,
    description: String,
    order_items: Vec<OrderItem>,
    rejected_product_ids: Vec<ProductId>,
    card_type_id: i32,
    masked_card_number: String,
    card_holder_name: String,
    card_expiration: DateTime<Utc>,
    events: EventLedger<OrderDomainEvent>,
}

impl Order {
    /// Create a new order in `Submitted`, recording `OrderStarted`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        buyer_identity: &str,
        buyer_name: &str,
        address: Address,
        card_type_id: i32,
        card_number: &str,
        card_holder_name: &str,
        card_expiration: DateTime<Utc>,
    ) -> Self {
        let id = OrderId::new();
        let order_date = Utc::now();
        let masked_card_number = mask_pan(card_number);

        let mut order = Self {
            id,
            buyer_id: None,
            payment_method_id: None,
            order_date,
            address,
            status: OrderStatus::Submitted,
            description: String::new(),
            order_items: Vec::new(),
            rejected_product_ids: Vec::new(),
            card_type_id,
            masked_card_number: masked_card_number.clone(),
            card_holder_name: card_holder_name.to_string(),
            card_expiration,
            events: EventLedger::new(),
        };

        order.events.record(OrderDomainEvent::Started(OrderStarted {
            order_id: id,
            buyer_identity: buyer_identity.to_string(),
            buyer_name: buyer_name.to_string(),
            card_type_id,
            masked_card_number,
            card_holder_name: card_holder_name.to_string(),
            card_expiration,
            occurred_at: order_date,
        }));

        order
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn buyer_id(&self) -> Option<BuyerId> {
        self.buyer_id
    }

    pub fn payment_method_id(&self) -> Option<PaymentMethodId> {
        self.payment_method_id
    }

    pub fn order_date(&self) -> DateTime<Utc> {
        self.order_date
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Human-readable status description; never contains payment data.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn order_items(&self) -> &[OrderItem] {
        &self.order_items
    }

    pub fn rejected_product_ids(&self) -> &[ProductId] {
        &self.rejected_product_ids
    }

    pub fn card_type_id(&self) -> i32 {
        self.card_type_id
    }

    pub fn masked_card_number(&self) -> &str {
        &self.masked_card_number
    }

    pub fn card_holder_name(&self) -> &str {
        &self.card_holder_name
    }

    pub fn card_expiration(&self) -> DateTime<Utc> {
        self.card_expiration
    }

    /// Sum of the line totals.
    pub fn total(&self) -> i64 {
        self.order_items.iter().map(OrderItem::line_total).sum()
    }

    /// Append an order line.
    ///
    /// Lines for the same product are kept separate and their totals sum;
    /// there is no automatic merge. Items can only be added while the order
    /// is still `Submitted`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_order_item(
        &mut self,
        product_id: ProductId,
        product_name: impl Into<String>,
        unit_price: i64,
        discount: i64,
        picture_url: impl Into<String>,
        units: i64,
    ) -> DomainResult<()> {
        if self.status != OrderStatus::Submitted {
            return Err(DomainError::invariant(format!(
                "order items cannot be added once the order is {}",
                self.status
            )));
        }

        let item = OrderItem::new(product_id, product_name, unit_price, discount, picture_url, units)?;
        self.order_items.push(item);
        Ok(())
    }

    /// Attach the verified buyer and payment method: `Submitted ->
    /// AwaitingValidation`.
    pub fn set_payment_verified(
        &mut self,
        buyer_id: BuyerId,
        payment_method_id: PaymentMethodId,
    ) -> DomainResult<()> {
        if self.status != OrderStatus::Submitted {
            return Err(self.status_change_error(OrderStatus::AwaitingValidation));
        }

        self.buyer_id = Some(buyer_id);
        self.payment_method_id = Some(payment_method_id);
        self.status = OrderStatus::AwaitingValidation;
        self.events
            .record(OrderDomainEvent::AwaitingValidation(OrderStatusChangedToAwaitingValidation {
                order_id: self.id,
                buyer_id,
                payment_method_id,
                stock_items: self.stock_items(),
                occurred_at: Utc::now(),
            }));
        Ok(())
    }

    /// Stock confirmation signal: `AwaitingValidation -> StockConfirmed`.
    pub fn confirm_stock(&mut self) -> DomainResult<()> {
        if self.status != OrderStatus::AwaitingValidation {
            return Err(self.status_change_error(OrderStatus::StockConfirmed));
        }

        self.status = OrderStatus::StockConfirmed;
        self.description = "All the items were confirmed with available stock.".to_string();
        self.events
            .record(OrderDomainEvent::StockConfirmed(OrderStatusChangedToStockConfirmed {
                order_id: self.id,
                occurred_at: Utc::now(),
            }));
        Ok(())
    }

    /// Stock rejection signal: `AwaitingValidation -> StockRejected`,
    /// recording which products were unavailable.
    pub fn reject_stock(&mut self, rejected_product_ids: Vec<ProductId>) -> DomainResult<()> {
        if self.status != OrderStatus::AwaitingValidation {
            return Err(self.status_change_error(OrderStatus::StockRejected));
        }

        let rejected_names: Vec<&str> = self
            .order_items
            .iter()
            .filter(|item| rejected_product_ids.contains(&item.product_id()))
            .map(|item| item.product_name())
            .collect();

        self.status = OrderStatus::StockRejected;
        self.description = format!(
            "The product items don't have stock: ({}).",
            rejected_names.join(", ")
        );
        self.rejected_product_ids = rejected_product_ids.clone();
        self.events
            .record(OrderDomainEvent::StockRejected(OrderStatusChangedToStockRejected {
                order_id: self.id,
                rejected_product_ids,
                occurred_at: Utc::now(),
            }));
        Ok(())
    }

    /// Payment success signal: `StockConfirmed -> Paid`.
    pub fn mark_paid(&mut self) -> DomainResult<()> {
        if self.status != OrderStatus::StockConfirmed {
            return Err(self.status_change_error(OrderStatus::Paid));
        }

        self.status = OrderStatus::Paid;
        self.description =
            "The payment was performed at a simulated \"American Bank checking bank account ending on XX35071\""
                .to_string();
        self.events.record(OrderDomainEvent::Paid(OrderStatusChangedToPaid {
            order_id: self.id,
            stock_items: self.stock_items(),
            occurred_at: Utc::now(),
        }));
        Ok(())
    }

    /// Shipment signal: `Paid -> Shipped`. Terminal.
    pub fn ship(&mut self) -> DomainResult<()> {
        if self.status != OrderStatus::Paid {
            return Err(self.status_change_error(OrderStatus::Shipped));
        }

        self.status = OrderStatus::Shipped;
        self.description = "The order was shipped.".to_string();
        self.events.record(OrderDomainEvent::Shipped(OrderShipped {
            order_id: self.id,
            occurred_at: Utc::now(),
        }));
        Ok(())
    }

    /// Explicit cancellation, allowed from any non-terminal state.
    pub fn cancel(&mut self) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(self.status_change_error(OrderStatus::Cancelled));
        }

        self.status = OrderStatus::Cancelled;
        self.description = "The order was cancelled.".to_string();
        self.events.record(OrderDomainEvent::Cancelled(OrderCancelled {
            order_id: self.id,
            occurred_at: Utc::now(),
        }));
        Ok(())
    }

    pub fn record_domain_event(&mut self, event: OrderDomainEvent) {
        self.events.record(event);
    }

    pub fn remove_domain_event(&mut self, event: &OrderDomainEvent) -> bool {
        self.events.remove(event)
    }

    fn stock_items(&self) -> Vec<OrderStockItem> {
        self.order_items
            .iter()
            .map(|item| OrderStockItem {
                product_id: item.product_id(),
                units: item.units(),
            })
            .collect()
    }

    fn status_change_error(&self, target: OrderStatus) -> DomainError {
        DomainError::status_change(self.status, target)
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for Order {
    type DomainEvent = OrderDomainEvent;

    fn domain_events(&self) -> &[Self::DomainEvent] {
        self.events.as_slice()
    }

    fn take_domain_events(&mut self) -> Vec<Self::DomainEvent> {
        self.events.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn fake_address() -> Address {
        Address::new("fakeStreet", "FakeCity", "fakeState", "fakeCountry", "FakeZipCode")
    }

    fn fake_order() -> Order {
        Order::new(
            "1",
            "fakeName",
            fake_address(),
            5,
            "12",
            "FakeName",
            Utc::now() + Duration::days(365),
        )
    }

    fn order_in_awaiting_validation() -> Order {
        let mut order = fake_order();
        order
            .add_order_item(ProductId::new(), "cup", 1000, 0, "", 1)
            .unwrap();
        order.set_payment_verified(BuyerId::new(), PaymentMethodId::new()).unwrap();
        order
    }

    #[test]
    fn new_order_is_submitted_and_raises_order_started() {
        let order = fake_order();
        assert_eq!(order.status(), OrderStatus::Submitted);
        assert_eq!(order.domain_events().len(), 1);
        match &order.domain_events()[0] {
            OrderDomainEvent::Started(e) => {
                assert_eq!(e.order_id, order.id_typed());
                assert_eq!(e.buyer_identity, "1");
                assert_eq!(e.masked_card_number, order.masked_card_number());
            }
            other => panic!("expected Started, got {other:?}"),
        }
    }

    #[test]
    fn adding_the_same_item_twice_sums_both_lines() {
        let mut order = fake_order();
        let product_id = ProductId::new();
        order.add_order_item(product_id, "cup", 1000, 0, "", 1).unwrap();
        order.add_order_item(product_id, "cup", 1000, 0, "", 1).unwrap();

        assert_eq!(order.order_items().len(), 2);
        assert_eq!(order.total(), 2000);
    }

    #[test]
    fn invalid_item_is_rejected_and_not_added() {
        let mut order = fake_order();
        let err = order
            .add_order_item(ProductId::new(), "cup", 12, 15, "", 1)
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation, got {other:?}"),
        }
        assert!(order.order_items().is_empty());
    }

    #[test]
    fn items_cannot_be_added_after_submission() {
        let mut order = order_in_awaiting_validation();
        let err = order
            .add_order_item(ProductId::new(), "cup", 1000, 0, "", 1)
            .unwrap_err();
        match err {
            DomainError::InvariantViolation(_) => {}
            other => panic!("expected InvariantViolation, got {other:?}"),
        }
        assert_eq!(order.order_items().len(), 1);
    }

    #[test]
    fn record_and_remove_domain_event_explicitly() {
        let mut order = fake_order();
        let extra = OrderDomainEvent::Shipped(OrderShipped {
            order_id: order.id_typed(),
            occurred_at: Utc::now(),
        });

        order.record_domain_event(extra.clone());
        assert_eq!(order.domain_events().len(), 2);

        assert!(order.remove_domain_event(&extra));
        assert_eq!(order.domain_events().len(), 1);
    }

    #[test]
    fn payment_verified_moves_submitted_to_awaiting_validation() {
        let mut order = fake_order();
        order
            .add_order_item(ProductId::new(), "cup", 1000, 0, "", 2)
            .unwrap();
        let buyer_id = BuyerId::new();
        let payment_method_id = PaymentMethodId::new();

        order.set_payment_verified(buyer_id, payment_method_id).unwrap();

        assert_eq!(order.status(), OrderStatus::AwaitingValidation);
        assert_eq!(order.buyer_id(), Some(buyer_id));
        assert_eq!(order.payment_method_id(), Some(payment_method_id));
        match order.domain_events().last().unwrap() {
            OrderDomainEvent::AwaitingValidation(e) => {
                assert_eq!(e.stock_items.len(), 1);
                assert_eq!(e.stock_items[0].units, 2);
            }
            other => panic!("expected AwaitingValidation, got {other:?}"),
        }
    }

    #[test]
    fn full_happy_path_reaches_shipped() {
        let mut order = order_in_awaiting_validation();

        order.confirm_stock().unwrap();
        assert_eq!(order.status(), OrderStatus::StockConfirmed);

        order.mark_paid().unwrap();
        assert_eq!(order.status(), OrderStatus::Paid);

        order.ship().unwrap();
        assert_eq!(order.status(), OrderStatus::Shipped);
        assert_eq!(order.description(), "The order was shipped.");
        assert_eq!(order.domain_events().len(), 5);
    }

    #[test]
    fn stock_rejection_records_the_rejected_products() {
        let mut order = fake_order();
        let missing = ProductId::new();
        order.add_order_item(missing, "cup", 1000, 0, "", 1).unwrap();
        order.add_order_item(ProductId::new(), "mug", 500, 0, "", 1).unwrap();
        order.set_payment_verified(BuyerId::new(), PaymentMethodId::new()).unwrap();

        order.reject_stock(vec![missing]).unwrap();

        assert_eq!(order.status(), OrderStatus::StockRejected);
        assert_eq!(order.rejected_product_ids(), [missing]);
        assert!(order.description().contains("cup"));
        assert!(!order.description().contains("mug"));
        match order.domain_events().last().unwrap() {
            OrderDomainEvent::StockRejected(e) => assert_eq!(e.rejected_product_ids, vec![missing]),
            other => panic!("expected StockRejected, got {other:?}"),
        }
    }

    #[test]
    fn illegal_transitions_fail_and_leave_status_unchanged() {
        // Shipping an order that was never paid.
        let mut order = order_in_awaiting_validation();
        let err = order.ship().unwrap_err();
        match err {
            DomainError::StatusChange { from, to } => {
                assert_eq!(from, "awaiting_validation");
                assert_eq!(to, "shipped");
            }
            other => panic!("expected StatusChange, got {other:?}"),
        }
        assert_eq!(order.status(), OrderStatus::AwaitingValidation);

        // Re-validating a shipped order.
        let mut order = order_in_awaiting_validation();
        order.confirm_stock().unwrap();
        order.mark_paid().unwrap();
        order.ship().unwrap();
        let events_before = order.domain_events().len();

        assert!(order.set_payment_verified(BuyerId::new(), PaymentMethodId::new()).is_err());
        assert!(order.confirm_stock().is_err());
        assert_eq!(order.status(), OrderStatus::Shipped);
        assert_eq!(order.domain_events().len(), events_before);
    }

    #[test]
    fn cancel_is_allowed_from_any_non_terminal_state() {
        let mut submitted = fake_order();
        submitted.cancel().unwrap();
        assert_eq!(submitted.status(), OrderStatus::Cancelled);
        assert_eq!(submitted.description(), "The order was cancelled.");

        let mut paid = order_in_awaiting_validation();
        paid.confirm_stock().unwrap();
        paid.mark_paid().unwrap();
        paid.cancel().unwrap();
        assert_eq!(paid.status(), OrderStatus::Cancelled);

        let mut rejected = order_in_awaiting_validation();
        rejected.reject_stock(vec![]).unwrap();
        rejected.cancel().unwrap();
        assert_eq!(rejected.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn cancel_is_rejected_once_terminal() {
        let mut shipped = order_in_awaiting_validation();
        shipped.confirm_stock().unwrap();
        shipped.mark_paid().unwrap();
        shipped.ship().unwrap();

        let err = shipped.cancel().unwrap_err();
        match err {
            DomainError::StatusChange { from, to } => {
                assert_eq!(from, "shipped");
                assert_eq!(to, "cancelled");
            }
            other => panic!("expected StatusChange, got {other:?}"),
        }
        assert_eq!(shipped.status(), OrderStatus::Shipped);

        let mut cancelled = fake_order();
        cancelled.cancel().unwrap();
        assert!(cancelled.cancel().is_err());
        assert_eq!(cancelled.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn total_is_zero_for_an_empty_order() {
        assert_eq!(fake_order().total(), 0);
    }
}
