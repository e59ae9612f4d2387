use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use ordering_core::{DomainError, DomainResult, Entity, PaymentMethodId, mask_pan};

/// Card networks known to the ordering context.
///
/// The ids line up with the card-type catalog other services seed; unknown
/// ids are still accepted on payment methods, they just have no display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Amex,
    Visa,
    MasterCard,
}

impl CardType {
    pub fn id(self) -> i32 {
        match self {
            CardType::Amex => 1,
            CardType::Visa => 2,
            CardType::MasterCard => 3,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(CardType::Amex),
            2 => Some(CardType::Visa),
            3 => Some(CardType::MasterCard),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CardType::Amex => "Amex",
            CardType::Visa => "Visa",
            CardType::MasterCard => "MasterCard",
        }
    }
}

/// A card stored against a buyer.
///
/// The full PAN is never kept: the number is masked at construction, and a
/// SHA-256 fingerprint over the identifying fields (card type, PAN,
/// expiration) stands in for it in the is-same-method comparison. The
/// security number is only inspected transiently and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    id: PaymentMethodId,
    card_type_id: i32,
    alias: String,
    masked_card_number: String,
    fingerprint: String,
    card_holder_name: String,
    expiration: DateTime<Utc>,
}

impl PaymentMethod {
    pub fn new(
        card_type_id: i32,
        alias: impl Into<String>,
        card_number: &str,
        security_number: &str,
        card_holder_name: impl Into<String>,
        expiration: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if card_number.trim().is_empty() {
            return Err(DomainError::validation("card number is required"));
        }
        if security_number.trim().is_empty() {
            return Err(DomainError::validation("card security number is required"));
        }
        if expiration <= Utc::now() {
            return Err(DomainError::validation("payment method is expired"));
        }

        Ok(Self {
            id: PaymentMethodId::new(),
            card_type_id,
            alias: alias.into(),
            masked_card_number: mask_pan(card_number),
            fingerprint: card_fingerprint(card_type_id, card_number, expiration),
            card_holder_name: card_holder_name.into(),
            expiration,
        })
    }

    /// Whether this stored method is the *same card* as the raw identifying
    /// fields describe.
    ///
    /// This is the dedup comparison (card type + full PAN + expiration), not
    /// structural equality; it works against the stored fingerprint so the
    /// PAN itself does not have to be retained.
    pub fn is_equal_to(&self, card_type_id: i32, card_number: &str, expiration: DateTime<Utc>) -> bool {
        self.fingerprint == card_fingerprint(card_type_id, card_number, expiration)
    }

    pub fn id_typed(&self) -> PaymentMethodId {
        self.id
    }

    pub fn card_type_id(&self) -> i32 {
        self.card_type_id
    }

    pub fn card_type(&self) -> Option<CardType> {
        CardType::from_id(self.card_type_id)
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn masked_card_number(&self) -> &str {
        &self.masked_card_number
    }

    pub fn card_holder_name(&self) -> &str {
        &self.card_holder_name
    }

    pub fn expiration(&self) -> DateTime<Utc> {
        self.expiration
    }
}

impl Entity for PaymentMethod {
    type Id = PaymentMethodId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn card_fingerprint(card_type_id: i32, card_number: &str, expiration: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(card_type_id.to_le_bytes());
    hasher.update(card_number.as_bytes());
    hasher.update(expiration.timestamp_millis().to_le_bytes());
    hex::encode(hasher.finalize())
}
