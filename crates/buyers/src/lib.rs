//! Buyer aggregate: the customer who places orders, owning their verified
//! payment methods.

pub mod buyer;
pub mod events;
pub mod payment_method;

pub use buyer::Buyer;
pub use events::{BuyerDomainEvent, PaymentMethodVerified};
pub use payment_method::{CardType, PaymentMethod};
