use chrono::{DateTime, Utc};

use ordering_core::{AggregateRoot, BuyerId, DomainError, DomainResult, Entity, OrderId};
use ordering_events::EventLedger;

use crate::events::{BuyerDomainEvent, PaymentMethodVerified};
use crate::payment_method::PaymentMethod;

/// Aggregate root: Buyer.
///
/// Created on the first order for a previously unknown identity. Owns the
/// buyer's payment methods; `verify_or_add_payment_method` is the single
/// dedup point keeping a buyer from accumulating duplicate stored cards.
/// Identity is immutable after construction; uniqueness per identity is the
/// persistence layer's concern.
#[derive(Debug, Clone, PartialEq)]
pub struct Buyer {
    id: BuyerId,
    identity: String,
    name: String,
    payment_methods: Vec<PaymentMethod>,
    events: EventLedger<BuyerDomainEvent>,
}

impl Buyer {
    pub fn new(identity: impl Into<String>, name: impl Into<String>) -> DomainResult<Self> {
        let identity = identity.into();
        if identity.trim().is_empty() {
            return Err(DomainError::validation("buyer identity is required"));
        }

        Ok(Self {
            id: BuyerId::new(),
            identity,
            name: name.into(),
            payment_methods: Vec::new(),
            events: EventLedger::new(),
        })
    }

    pub fn id_typed(&self) -> BuyerId {
        self.id
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stored payment methods in insertion order.
    pub fn payment_methods(&self) -> &[PaymentMethod] {
        &self.payment_methods
    }

    /// Return the stored method matching the raw identifying fields, or
    /// verify and add a new one.
    ///
    /// The reuse path returns the existing method unchanged and records no
    /// event. The add path validates the expiration, masks the card number,
    /// appends the method, and records a `PaymentMethodVerified` event
    /// referencing the originating order.
    #[allow(clippy::too_many_arguments)]
    pub fn verify_or_add_payment_method(
        &mut self,
        card_type_id: i32,
        alias: &str,
        card_number: &str,
        security_number: &str,
        card_holder_name: &str,
        expiration: DateTime<Utc>,
        order_id: OrderId,
    ) -> DomainResult<&PaymentMethod> {
        if let Some(pos) = self
            .payment_methods
            .iter()
            .position(|m| m.is_equal_to(card_type_id, card_number, expiration))
        {
            return Ok(&self.payment_methods[pos]);
        }

        let method = PaymentMethod::new(
            card_type_id,
            alias,
            card_number,
            security_number,
            card_holder_name,
            expiration,
        )?;

        self.events
            .record(BuyerDomainEvent::PaymentMethodVerified(PaymentMethodVerified {
                buyer_id: self.id,
                payment_method_id: method.id_typed(),
                card_type_id,
                masked_card_number: method.masked_card_number().to_string(),
                order_id,
                occurred_at: Utc::now(),
            }));

        let added = self.payment_methods.len();
        self.payment_methods.push(method);
        Ok(&self.payment_methods[added])
    }

    pub fn record_domain_event(&mut self, event: BuyerDomainEvent) {
        self.events.record(event);
    }

    pub fn remove_domain_event(&mut self, event: &BuyerDomainEvent) -> bool {
        self.events.remove(event)
    }
}

impl Entity for Buyer {
    type Id = BuyerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for Buyer {
    type DomainEvent = BuyerDomainEvent;

    fn domain_events(&self) -> &[Self::DomainEvent] {
        self.events.as_slice()
    }

    fn take_domain_events(&mut self) -> Vec<Self::DomainEvent> {
        self.events.take()
    }
}
