//! Execution core of an algorithmic trading platform: the subsystem that
//! accepts commands from trading strategies, routes them to a broker/
//! exchange gateway, ingests fill and account events returned by that
//! gateway, and maintains an authoritative in-memory picture of every
//! order, position, and account under management.
//!
//! Strategy implementations, the wire-level execution client protocol,
//! persistence backends, portfolio analytics, and market-data ingestion are
//! external collaborators, referenced only through the interfaces they
//! expose: [`strategy::StrategyHandler`], [`client::ExecutionClient`],
//! [`portfolio::PortfolioSink`].
//!
//! Dependency order (leaves first): value types -> events -> orders/
//! positions -> clock -> account -> execution database -> execution engine
//! -> execution client.

pub mod account;
pub mod clock;
pub mod client;
pub mod config;
pub mod database;
pub mod engine;
pub mod errors;
pub mod events;
pub mod identifiers;
pub mod logging;
pub mod order;
pub mod portfolio;
pub mod position;
pub mod strategy;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use account::Account;
pub use client::{Command, ExecutionClient};
pub use clock::{Clock, LiveClock, TestClock};
pub use config::EngineConfig;
pub use database::ExecutionDatabase;
pub use engine::ExecutionEngine;
pub use errors::{EngineError, PreconditionError};
pub use events::{AccountStateEvent, Event, OrderCancelReject, OrderEvent, PositionEvent};
pub use identifiers::{
    AccountId, Brokerage, ExecutionId, Guid, IdentifierTag, Label, OrderId, PositionId, StrategyId,
    Symbol, Timestamp, TraderId,
};
pub use order::{AtomicOrder, Order, OrderFactory, OrderState, OrderType, Purpose, Side, TimeInForce};
pub use portfolio::PortfolioSink;
pub use position::Position;
pub use strategy::{EngineHandle, StrategyHandler};

/// Convenience re-export of everything a strategy implementation typically
/// needs in scope.
pub mod prelude {
    pub use crate::account::Account;
    pub use crate::client::{
        AccountInquiry, CancelOrder, Command, ExecutionClient, ModifyOrder, SubmitAtomicOrder,
        SubmitOrder,
    };
    pub use crate::clock::{Clock, LiveClock, TestClock};
    pub use crate::engine::ExecutionEngine;
    pub use crate::errors::{EngineError, PreconditionError};
    pub use crate::events::{AccountStateEvent, Event, OrderCancelReject, OrderEvent, PositionEvent};
    pub use crate::identifiers::{
        AccountId, Brokerage, ExecutionId, Guid, IdentifierTag, Label, OrderId, PositionId,
        StrategyId, Symbol, Timestamp, TraderId,
    };
    pub use crate::order::{AtomicOrder, Order, OrderFactory, OrderState, OrderType, Purpose, Side, TimeInForce};
    pub use crate::portfolio::PortfolioSink;
    pub use crate::position::Position;
    pub use crate::strategy::{EngineHandle, StrategyHandler};
}
