//! The order entity and its state machine (§3, §4.1).

use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::errors::PreconditionError;
use crate::events::OrderEvent;
use crate::identifiers::{AccountId, ExecutionId, Guid, Label, OrderId, StrategyId, Symbol, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderType {
    Market,
    Limit,
    StopMarket,
    StopLimit,
    Mit,
}

impl OrderType {
    /// Priced order types carry a `price`; only `Market` does not.
    pub fn is_priced(self) -> bool {
        matches!(
            self,
            OrderType::Limit | OrderType::StopMarket | OrderType::StopLimit | OrderType::Mit
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    None,
    Entry,
    StopLoss,
    TakeProfit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeInForce {
    Day,
    Gtc,
    Gtd,
    Foc,
    Ioc,
}

/// States an order can occupy. `Modified`, `PartiallyFilled` re-enter
/// themselves (marked `↻` in §3) rather than being one-shot transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderState {
    Initialized,
    Invalid,
    Denied,
    Submitted,
    Rejected,
    Accepted,
    Working,
    Cancelled,
    Expired,
    Modified,
    PartiallyFilled,
    Filled,
    OverFilled,
}

impl OrderState {
    pub fn is_completed(self) -> bool {
        matches!(
            self,
            OrderState::Invalid
                | OrderState::Denied
                | OrderState::Rejected
                | OrderState::Cancelled
                | OrderState::Expired
                | OrderState::Filled
                | OrderState::OverFilled
        )
    }

    /// `Modified` is included: per §3, a modify rewrites `quantity`/`price`
    /// in place and "does not leave WORKING" — a still-live order that was
    /// just modified remains working, not neither-working-nor-completed.
    pub fn is_working(self) -> bool {
        matches!(
            self,
            OrderState::Working | OrderState::PartiallyFilled | OrderState::Modified
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub purpose: Purpose,
    pub quantity: u64,
    pub price: Option<Decimal>,
    pub label: Label,
    pub time_in_force: TimeInForce,
    pub expire_time: Option<Timestamp>,
    pub timestamp: Timestamp,
    pub init_id: Guid,

    pub state: OrderState,
    pub filled_quantity: u64,
    pub average_price: Option<Decimal>,
    pub slippage: Option<Decimal>,
    pub execution_ids: HashSet<ExecutionId>,
    pub events: Vec<OrderEvent>,

    pub id_broker: Option<String>,
    pub account_id: Option<AccountId>,
    pub position_id_broker: Option<String>,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: OrderId,
        symbol: Symbol,
        side: Side,
        order_type: OrderType,
        purpose: Purpose,
        quantity: u64,
        price: Option<Decimal>,
        label: Label,
        time_in_force: TimeInForce,
        expire_time: Option<Timestamp>,
        timestamp: Timestamp,
    ) -> Self {
        let init_id = Guid::new();
        Self {
            id: id.clone(),
            symbol,
            side,
            order_type,
            purpose,
            quantity,
            price,
            label,
            time_in_force,
            expire_time,
            timestamp,
            init_id,
            state: OrderState::Initialized,
            filled_quantity: 0,
            average_price: None,
            slippage: None,
            execution_ids: HashSet::new(),
            events: vec![OrderEvent::Initialized {
                event_id: init_id,
                order_id: id,
                timestamp,
            }],
            id_broker: None,
            account_id: None,
            position_id_broker: None,
        }
    }

    pub fn is_working(&self) -> bool {
        self.state.is_working()
    }

    pub fn is_completed(&self) -> bool {
        self.state.is_completed()
    }

    pub fn remaining_quantity(&self) -> u64 {
        self.quantity.saturating_sub(self.filled_quantity)
    }

    pub fn last_event(&self) -> Option<&OrderEvent> {
        self.events.last()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// The sole mutator (§4.1). Appends to the event log, advances the state
    /// machine, and — for fills — updates `filled_quantity`, `average_price`,
    /// `execution_ids`, `position_id_broker`, and recomputes slippage.
    ///
    /// Fails if `event.order_id != self.id`, or if `self.account_id` is
    /// already set and differs from the event's account id. Both are
    /// precondition violations: the caller (the engine) treats construction
    /// of this error as fatal and panics with the formatted message.
    pub fn apply(&mut self, event: OrderEvent) -> Result<(), PreconditionError> {
        if event.order_id() != &self.id {
            return Err(PreconditionError::OrderIdMismatch {
                order_id: self.id.clone(),
                event_order_id: event.order_id().clone(),
            });
        }
        if let (Some(existing), Some(incoming)) = (&self.account_id, event.account_id()) {
            if existing != incoming {
                return Err(PreconditionError::AccountIdMismatch {
                    order_id: self.id.clone(),
                    existing: existing.clone(),
                    incoming: incoming.clone(),
                });
            }
        }
        if self.account_id.is_none() {
            if let Some(account_id) = event.account_id() {
                self.account_id = Some(account_id.clone());
            }
        }

        match &event {
            OrderEvent::Initialized { .. } => {}
            OrderEvent::Invalid { .. } => self.state = OrderState::Invalid,
            OrderEvent::Denied { .. } => self.state = OrderState::Denied,
            OrderEvent::Submitted { .. } => self.state = OrderState::Submitted,
            OrderEvent::Accepted { id_broker, .. } => {
                self.id_broker = Some(id_broker.clone());
                self.state = OrderState::Accepted;
            }
            OrderEvent::Rejected { .. } => self.state = OrderState::Rejected,
            OrderEvent::Working { id_broker, .. } => {
                self.id_broker = Some(id_broker.clone());
                self.state = OrderState::Working;
            }
            OrderEvent::Modified {
                quantity, price, ..
            } => {
                self.quantity = *quantity;
                self.price = *price;
                self.state = OrderState::Modified;
                self.reassess_fill_state();
            }
            OrderEvent::Cancelled { .. } => self.state = OrderState::Cancelled,
            OrderEvent::Expired { .. } => self.state = OrderState::Expired,
            OrderEvent::Fill {
                execution_id,
                position_id_broker,
                last_quantity,
                last_price,
                ..
            } => {
                self.apply_fill(*execution_id, position_id_broker.clone(), *last_quantity, *last_price);
            }
        }

        self.events.push(event);
        Ok(())
    }

    fn apply_fill(
        &mut self,
        execution_id: ExecutionId,
        position_id_broker: Option<String>,
        last_quantity: u64,
        last_price: Decimal,
    ) {
        let is_new_execution = self.execution_ids.insert(execution_id);
        if is_new_execution {
            let prior_notional = self
                .average_price
                .map(|p| Decimal::from(self.filled_quantity) * p)
                .unwrap_or(Decimal::ZERO);
            let fill_notional = Decimal::from(last_quantity) * last_price;
            self.filled_quantity += last_quantity;
            if self.filled_quantity > 0 {
                self.average_price =
                    Some((prior_notional + fill_notional) / Decimal::from(self.filled_quantity));
            }
        }
        if position_id_broker.is_some() {
            self.position_id_broker = position_id_broker;
        }
        self.recompute_slippage();
        self.reassess_fill_state();
    }

    fn reassess_fill_state(&mut self) {
        use std::cmp::Ordering;
        match self.filled_quantity.cmp(&self.quantity) {
            Ordering::Less if self.filled_quantity > 0 => {
                self.state = OrderState::PartiallyFilled;
            }
            Ordering::Equal if self.filled_quantity > 0 => {
                self.state = OrderState::Filled;
            }
            Ordering::Greater => {
                self.state = OrderState::OverFilled;
            }
            _ => {}
        }
    }

    fn recompute_slippage(&mut self) {
        let (Some(order_price), Some(avg)) = (self.price, self.average_price) else {
            return;
        };
        if !self.order_type.is_priced() {
            return;
        }
        self.slippage = Some(match self.side {
            Side::Buy => avg - order_price,
            Side::Sell => order_price - avg,
        });
    }
}
