//! The event taxonomy (§6): everything that can re-enter the engine from the
//! execution client, plus the position/account events the engine derives
//! internally. Modeled as a tagged variant (sum type) per REDESIGN FLAG #2 —
//! the engine's event path is an exhaustive match, so no variant can be
//! silently dropped at compile time.

use rust_decimal::Decimal;

use crate::identifiers::{AccountId, ExecutionId, Guid, OrderId, PositionId, StrategyId, Timestamp};

/// Events addressed to a specific order, applied via `Order::apply`.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderEvent {
    Initialized {
        event_id: Guid,
        order_id: OrderId,
        timestamp: Timestamp,
    },
    Invalid {
        event_id: Guid,
        order_id: OrderId,
        timestamp: Timestamp,
        reason: String,
    },
    Denied {
        event_id: Guid,
        order_id: OrderId,
        timestamp: Timestamp,
        reason: String,
    },
    Submitted {
        event_id: Guid,
        order_id: OrderId,
        account_id: AccountId,
        timestamp: Timestamp,
    },
    Accepted {
        event_id: Guid,
        order_id: OrderId,
        account_id: AccountId,
        id_broker: String,
        timestamp: Timestamp,
    },
    Rejected {
        event_id: Guid,
        order_id: OrderId,
        account_id: AccountId,
        timestamp: Timestamp,
        reason: String,
    },
    Working {
        event_id: Guid,
        order_id: OrderId,
        account_id: AccountId,
        id_broker: String,
        timestamp: Timestamp,
    },
    Modified {
        event_id: Guid,
        order_id: OrderId,
        account_id: AccountId,
        timestamp: Timestamp,
        quantity: u64,
        price: Option<Decimal>,
    },
    Cancelled {
        event_id: Guid,
        order_id: OrderId,
        account_id: AccountId,
        timestamp: Timestamp,
    },
    Expired {
        event_id: Guid,
        order_id: OrderId,
        account_id: AccountId,
        timestamp: Timestamp,
    },
    Fill {
        event_id: Guid,
        order_id: OrderId,
        account_id: AccountId,
        timestamp: Timestamp,
        execution_id: ExecutionId,
        position_id_broker: Option<String>,
        last_quantity: u64,
        last_price: Decimal,
    },
}

impl OrderEvent {
    pub fn order_id(&self) -> &OrderId {
        match self {
            OrderEvent::Initialized { order_id, .. }
            | OrderEvent::Invalid { order_id, .. }
            | OrderEvent::Denied { order_id, .. }
            | OrderEvent::Submitted { order_id, .. }
            | OrderEvent::Accepted { order_id, .. }
            | OrderEvent::Rejected { order_id, .. }
            | OrderEvent::Working { order_id, .. }
            | OrderEvent::Modified { order_id, .. }
            | OrderEvent::Cancelled { order_id, .. }
            | OrderEvent::Expired { order_id, .. }
            | OrderEvent::Fill { order_id, .. } => order_id,
        }
    }

    pub fn account_id(&self) -> Option<&AccountId> {
        match self {
            OrderEvent::Initialized { .. } | OrderEvent::Invalid { .. } | OrderEvent::Denied { .. } => {
                None
            }
            OrderEvent::Submitted { account_id, .. }
            | OrderEvent::Accepted { account_id, .. }
            | OrderEvent::Rejected { account_id, .. }
            | OrderEvent::Working { account_id, .. }
            | OrderEvent::Modified { account_id, .. }
            | OrderEvent::Cancelled { account_id, .. }
            | OrderEvent::Expired { account_id, .. }
            | OrderEvent::Fill { account_id, .. } => Some(account_id),
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        match self {
            OrderEvent::Initialized { timestamp, .. }
            | OrderEvent::Invalid { timestamp, .. }
            | OrderEvent::Denied { timestamp, .. }
            | OrderEvent::Submitted { timestamp, .. }
            | OrderEvent::Accepted { timestamp, .. }
            | OrderEvent::Rejected { timestamp, .. }
            | OrderEvent::Working { timestamp, .. }
            | OrderEvent::Modified { timestamp, .. }
            | OrderEvent::Cancelled { timestamp, .. }
            | OrderEvent::Expired { timestamp, .. }
            | OrderEvent::Fill { timestamp, .. } => *timestamp,
        }
    }

    pub fn is_fill(&self) -> bool {
        matches!(self, OrderEvent::Fill { .. })
    }
}

/// Events derived by the engine when a fill opens, changes, or closes a
/// position. Never originate at the execution client.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Opened {
        event_id: Guid,
        position_id: PositionId,
        strategy_id: StrategyId,
        timestamp: Timestamp,
    },
    Modified {
        event_id: Guid,
        position_id: PositionId,
        strategy_id: StrategyId,
        timestamp: Timestamp,
    },
    Closed {
        event_id: Guid,
        position_id: PositionId,
        strategy_id: StrategyId,
        timestamp: Timestamp,
        realized_return: Decimal,
    },
}

impl PositionEvent {
    pub fn position_id(&self) -> &PositionId {
        match self {
            PositionEvent::Opened { position_id, .. }
            | PositionEvent::Modified { position_id, .. }
            | PositionEvent::Closed { position_id, .. } => position_id,
        }
    }

    pub fn strategy_id(&self) -> &StrategyId {
        match self {
            PositionEvent::Opened { strategy_id, .. }
            | PositionEvent::Modified { strategy_id, .. }
            | PositionEvent::Closed { strategy_id, .. } => strategy_id,
        }
    }
}

/// Authoritative account snapshot reported by the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountStateEvent {
    pub event_id: Guid,
    pub account_id: AccountId,
    pub timestamp: Timestamp,
    pub equity: Decimal,
    pub balance: Decimal,
    pub margin_used: Decimal,
    pub margin_call: bool,
    pub currency: String,
}

/// Response to a rejected `ModifyOrder`/`CancelOrder`. Forwarded to the
/// strategy as a warning; never mutates order state (§7).
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCancelReject {
    pub event_id: Guid,
    pub order_id: OrderId,
    pub timestamp: Timestamp,
    pub reason: String,
}

/// Everything that can be handed to `ExecutionEngine::handle_event`.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Order(OrderEvent),
    Position(PositionEvent),
    Account(AccountStateEvent),
    OrderCancelReject(OrderCancelReject),
}

impl From<OrderEvent> for Event {
    fn from(e: OrderEvent) -> Self {
        Event::Order(e)
    }
}

impl From<PositionEvent> for Event {
    fn from(e: PositionEvent) -> Self {
        Event::Position(e)
    }
}

impl From<AccountStateEvent> for Event {
    fn from(e: AccountStateEvent) -> Self {
        Event::Account(e)
    }
}

impl From<OrderCancelReject> for Event {
    fn from(e: OrderCancelReject) -> Self {
        Event::OrderCancelReject(e)
    }
}
