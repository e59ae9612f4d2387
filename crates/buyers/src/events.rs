use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ordering_core::{BuyerId, OrderId, PaymentMethodId};
use ordering_events::DomainEvent;

/// Event: a payment method was verified (newly added) for a buyer.
///
/// Carries the originating order id so downstream processing can attach the
/// verified method to the order that triggered it. Only the masked card
/// number crosses this boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodVerified {
    pub buyer_id: BuyerId,
    pub payment_method_id: PaymentMethodId,
    pub card_type_id: i32,
    pub masked_card_number: String,
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuyerDomainEvent {
    PaymentMethodVerified(PaymentMethodVerified),
}

impl BuyerDomainEvent {
    /// The buyer aggregate this event belongs to.
    pub fn buyer_id(&self) -> BuyerId {
        match self {
            BuyerDomainEvent::PaymentMethodVerified(e) => e.buyer_id,
        }
    }
}

impl DomainEvent for BuyerDomainEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BuyerDomainEvent::PaymentMethodVerified(_) => "ordering.buyer.payment_method_verified",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            BuyerDomainEvent::PaymentMethodVerified(e) => e.occurred_at,
        }
    }
}
