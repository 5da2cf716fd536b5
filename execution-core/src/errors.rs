//! Error taxonomy for the execution core (§7).
//!
//! Two families, matching the spec's split between programmer errors and
//! operational anomalies:
//!
//! - [`PreconditionError`] — bad arguments, duplicate ids, impossible state
//!   transitions. Call sites at the factory and database boundary treat
//!   construction of one of these as fatal and `panic!` with the formatted
//!   message; the error type itself never panics.
//! - [`EngineError`] — failures inside command handling that must propagate
//!   back to the calling strategy rather than halt the engine.
//!
//! Reference misses and account mismatches (event for an unknown order,
//! event for the wrong account) are not modeled as error types at all — per
//! §7 they are absorbed at the call site via `tracing::error!`/`tracing::warn!`
//! plus an early return, never surfaced as a `Result`.

use thiserror::Error;

use crate::identifiers::{AccountId, OrderId, PositionId, StrategyId};
use crate::order::OrderType;

/// Programmer errors: invalid arguments or state that should never occur
/// outside of a bug. Fail loudly and halt the offending operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("order {order_id} rejected event addressed to order {event_order_id}")]
    OrderIdMismatch {
        order_id: OrderId,
        event_order_id: OrderId,
    },

    #[error("order {order_id} has account {existing} but event carries account {incoming}")]
    AccountIdMismatch {
        order_id: OrderId,
        existing: AccountId,
        incoming: AccountId,
    },

    #[error("quantity must be strictly positive, got {0}")]
    NonPositiveQuantity(u64),

    #[error("order type {0:?} requires a price")]
    MissingPrice(OrderType),

    #[error("order type {0:?} does not take a price")]
    UnexpectedPrice(OrderType),

    #[error("time in force GTD requires an expire_time after timestamp {timestamp}")]
    InvalidExpireTime { timestamp: i64 },

    #[error("duplicate order id {0} inserted into execution database")]
    DuplicateOrderId(OrderId),

    #[error("duplicate position id {0} inserted into execution database")]
    DuplicatePositionId(PositionId),

    #[error(
        "position {position_id} is mapped to strategy {existing} but order maps it to {incoming}"
    )]
    PositionStrategyMismatch {
        position_id: PositionId,
        existing: StrategyId,
        incoming: StrategyId,
    },
}

/// Errors that propagate to the strategy that issued a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("strategy {0} is not registered with this engine")]
    UnknownStrategy(StrategyId),

    #[error("order construction rejected: {0}")]
    InvalidOrder(#[from] PreconditionError),

    #[error("command channel is closed")]
    ChannelClosed,
}
