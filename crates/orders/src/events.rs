use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ordering_core::{BuyerId, OrderId, PaymentMethodId, ProductId};
use ordering_events::DomainEvent;

/// Stock line carried by validation and payment events, for downstream
/// availability checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStockItem {
    pub product_id: ProductId,
    pub units: i64,
}

/// Event: an order was created and entered `Submitted`.
///
/// Carries the buyer and payment context needed to verify-or-add the payment
/// method. The card number is masked and the security number never appears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStarted {
    pub order_id: OrderId,
    pub buyer_identity: String,
    pub buyer_name: String,
    pub card_type_id: i32,
    pub masked_card_number: String,
    pub card_holder_name: String,
    pub card_expiration: DateTime<Utc>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: buyer and payment method were attached; the order now waits for
/// stock validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedToAwaitingValidation {
    pub order_id: OrderId,
    pub buyer_id: BuyerId,
    pub payment_method_id: PaymentMethodId,
    pub stock_items: Vec<OrderStockItem>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: all items were confirmed available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedToStockConfirmed {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: one or more items were reported out of stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedToStockRejected {
    pub order_id: OrderId,
    pub rejected_product_ids: Vec<ProductId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: payment succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedToPaid {
    pub order_id: OrderId,
    pub stock_items: Vec<OrderStockItem>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: the order was shipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderShipped {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: the order was cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDomainEvent {
    Started(OrderStarted),
    AwaitingValidation(OrderStatusChangedToAwaitingValidation),
    StockConfirmed(OrderStatusChangedToStockConfirmed),
    StockRejected(OrderStatusChangedToStockRejected),
    Paid(OrderStatusChangedToPaid),
    Shipped(OrderShipped),
    Cancelled(OrderCancelled),
}

impl OrderDomainEvent {
    /// The order aggregate this event belongs to.
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderDomainEvent::Started(e) => e.order_id,
            OrderDomainEvent::AwaitingValidation(e) => e.order_id,
            OrderDomainEvent::StockConfirmed(e) => e.order_id,
            OrderDomainEvent::StockRejected(e) => e.order_id,
            OrderDomainEvent::Paid(e) => e.order_id,
            OrderDomainEvent::Shipped(e) => e.order_id,
            OrderDomainEvent::Cancelled(e) => e.order_id,
        }
    }
}

impl DomainEvent for OrderDomainEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderDomainEvent::Started(_) => "ordering.order.started",
            OrderDomainEvent::AwaitingValidation(_) => "ordering.order.awaiting_validation",
            OrderDomainEvent::StockConfirmed(_) => "ordering.order.stock_confirmed",
            OrderDomainEvent::StockRejected(_) => "ordering.order.stock_rejected",
            OrderDomainEvent::Paid(_) => "ordering.order.paid",
            OrderDomainEvent::Shipped(_) => "ordering.order.shipped",
            OrderDomainEvent::Cancelled(_) => "ordering.order.cancelled",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderDomainEvent::Started(e) => e.occurred_at,
            OrderDomainEvent::AwaitingValidation(e) => e.occurred_at,
            OrderDomainEvent::StockConfirmed(e) => e.occurred_at,
            OrderDomainEvent::StockRejected(e) => e.occurred_at,
            OrderDomainEvent::Paid(e) => e.occurred_at,
            OrderDomainEvent::Shipped(e) => e.occurred_at,
            OrderDomainEvent::Cancelled(e) => e.occurred_at,
        }
    }
}
