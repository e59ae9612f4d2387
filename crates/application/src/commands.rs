//! Command types accepted by the ordering core.
//!
//! Commands carry intent and are transient; the buyer identity is threaded
//! explicitly through `CreateOrderCommand` rather than read from an ambient
//! accessor. The card security number crosses only as part of the in-flight
//! command and is never persisted anywhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ordering_core::{OrderId, ProductId};

/// Basket line crossing into order creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketItem {
    pub product_id: ProductId,
    pub product_name: String,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: i64,
    pub discount: i64,
    pub picture_url: String,
    pub units: i64,
}

/// Command: create an order for the authenticated buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderCommand {
    pub items: Vec<BasketItem>,
    /// Authenticated buyer identity; empty means anonymous and is rejected.
    pub buyer_identity: String,
    pub buyer_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    pub card_type_id: i32,
    pub card_number: String,
    pub card_holder_name: String,
    pub card_expiration: DateTime<Utc>,
    /// Used transiently for verification; never stored.
    pub card_security_number: String,
}

/// Command: cancel an order (allowed from any non-terminal status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrderCommand {
    pub order_id: OrderId,
}

/// Command: mark a paid order as shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipOrderCommand {
    pub order_id: OrderId,
}

/// Command: stock service confirmed all items are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetStockConfirmedOrderStatusCommand {
    pub order_id: OrderId,
}

/// Command: stock service reported items out of stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetStockRejectedOrderStatusCommand {
    pub order_id: OrderId,
    pub rejected_product_ids: Vec<ProductId>,
}

/// Command: payment service reported a successful payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPaidOrderStatusCommand {
    pub order_id: OrderId,
}
