//! Command side of the ordering core: command types, their handlers, the
//! collaborator ports they depend on, and the generic at-most-once
//! (identified) dispatch wrapper.

pub mod commands;
pub mod error;
pub mod handlers;
pub mod identified;
pub mod ports;

pub use commands::{
    BasketItem, CancelOrderCommand, CreateOrderCommand, SetPaidOrderStatusCommand,
    SetStockConfirmedOrderStatusCommand, SetStockRejectedOrderStatusCommand, ShipOrderCommand,
};
pub use error::CommandError;
pub use handlers::{
    CancelOrderCommandHandler, CommandContext, CommandHandler, CreateOrderCommandHandler,
    SetPaidOrderStatusCommandHandler, SetStockConfirmedOrderStatusCommandHandler,
    SetStockRejectedOrderStatusCommandHandler, ShipOrderCommandHandler, publish_committed,
};
pub use identified::{DuplicateRequestResult, IdentifiedCommand, IdentifiedCommandHandler};
pub use ports::{
    CommittedEvents, IntegrationEventPublisher, OrderingStore, PublishError, RequestManager,
    RequestRecord, StoreError, UnitOfWork, Versioned,
};
