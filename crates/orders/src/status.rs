use serde::{Deserialize, Serialize};

/// Order status lifecycle.
///
/// Transitions are monotonic and validated by the aggregate:
///
/// ```text
/// Submitted -> AwaitingValidation -> StockConfirmed -> Paid -> Shipped
///                     |
///                     +-> StockRejected
/// ```
///
/// `Cancelled` is reachable from any non-terminal state. `Shipped` and
/// `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Submitted,
    AwaitingValidation,
    StockConfirmed,
    StockRejected,
    Paid,
    Shipped,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Submitted => "submitted",
            OrderStatus::AwaitingValidation => "awaiting_validation",
            OrderStatus::StockConfirmed => "stock_confirmed",
            OrderStatus::StockRejected => "stock_rejected",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states admit no further transition, not even cancellation.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Shipped | OrderStatus::Cancelled)
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
