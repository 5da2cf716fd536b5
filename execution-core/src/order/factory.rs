//! Order factory: validates construction and hands out monotonic order ids
//! scoped per `(trader_tag, strategy_tag)` (§4.1).

use rust_decimal::Decimal;

use crate::errors::PreconditionError;
use crate::identifiers::{IdentifierTag, Label, OrderId, Symbol, Timestamp};

use super::atomic::AtomicOrder;
use super::order::{Order, OrderType, Purpose, Side, TimeInForce};

/// Strategy-owned; produces every order type with precondition validation
/// and assigns ids from an internal monotonic counter.
#[derive(Debug, Clone)]
pub struct OrderFactory {
    tag: IdentifierTag,
    counter: u64,
}

impl OrderFactory {
    pub fn new(tag: IdentifierTag) -> Self {
        Self { tag, counter: 0 }
    }

    fn next_id(&mut self) -> OrderId {
        self.counter += 1;
        OrderId::new(format!("O-{}-{}-{}", self.tag.trader_tag, self.tag.strategy_tag, self.counter))
    }

    fn validate(
        order_type: OrderType,
        quantity: u64,
        price: Option<Decimal>,
        time_in_force: TimeInForce,
        expire_time: Option<Timestamp>,
        timestamp: Timestamp,
    ) -> Result<(), PreconditionError> {
        if quantity == 0 {
            return Err(PreconditionError::NonPositiveQuantity(quantity));
        }
        if order_type.is_priced() && price.is_none() {
            return Err(PreconditionError::MissingPrice(order_type));
        }
        if !order_type.is_priced() && price.is_some() {
            return Err(PreconditionError::UnexpectedPrice(order_type));
        }
        if time_in_force == TimeInForce::Gtd {
            match expire_time {
                Some(expire) if expire > timestamp => {}
                _ => return Err(PreconditionError::InvalidExpireTime { timestamp }),
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn try_build(
        &mut self,
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
    ) -> Result<Order, PreconditionError> {
        Self::validate(order_type, quantity, price, time_in_force, expire_time, timestamp)?;
        let id = self.next_id();
        Ok(Order::new(
            id,
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
        ))
    }

    /// Fallible entry point — precondition violations are returned rather
    /// than panicking, so callers can test boundary behaviors directly.
    #[allow(clippy::too_many_arguments)]
    pub fn try_order(
        &mut self,
        symbol: Symbol,
        side: Side,
        order_type: OrderType,
        quantity: u64,
        price: Option<Decimal>,
        label: Label,
        time_in_force: TimeInForce,
        expire_time: Option<Timestamp>,
        timestamp: Timestamp,
    ) -> Result<Order, PreconditionError> {
        self.try_build(
            symbol,
            side,
            order_type,
            Purpose::None,
            quantity,
            price,
            label,
            time_in_force,
            expire_time,
            timestamp,
        )
    }

    /// Convenience entry point matching §9's "fail loudly": a precondition
    /// violation is a programmer error and halts construction immediately.
    #[allow(clippy::too_many_arguments)]
    pub fn order(
        &mut self,
        symbol: Symbol,
        side: Side,
        order_type: OrderType,
        quantity: u64,
        price: Option<Decimal>,
        label: Label,
        time_in_force: TimeInForce,
        expire_time: Option<Timestamp>,
        timestamp: Timestamp,
    ) -> Order {
        self.try_order(
            symbol,
            side,
            order_type,
            quantity,
            price,
            label,
            time_in_force,
            expire_time,
            timestamp,
        )
        .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Builds `{entry, stop_loss, take_profit?}` under one logical submission
    /// (§3, §4.1). `entry` is produced first so its label and quantity seed
    /// the children; `stop_loss` and `take_profit` take the opposite side,
    /// matching quantity, and `TimeInForce::Gtc`.
    pub fn atomic_order(
        &mut self,
        symbol: Symbol,
        side: Side,
        entry_type: OrderType,
        quantity: u64,
        entry_price: Option<Decimal>,
        stop_loss_price: Decimal,
        take_profit_price: Option<Decimal>,
        label: Label,
        timestamp: Timestamp,
    ) -> AtomicOrder {
        let entry = self.order(
            symbol.clone(),
            side,
            entry_type,
            quantity,
            entry_price,
            Label::new(format!("{label}_E")),
            TimeInForce::Gtc,
            None,
            timestamp,
        );

        let child_side = side.opposite();
        let mut stop_loss = self.order(
            symbol.clone(),
            child_side,
            OrderType::StopMarket,
            quantity,
            Some(stop_loss_price),
            Label::new(format!("{label}_SL")),
            TimeInForce::Gtc,
            None,
            timestamp,
        );
        stop_loss.purpose = Purpose::StopLoss;

        let take_profit = take_profit_price.map(|tp_price| {
            let mut tp = self.order(
                symbol,
                child_side,
                OrderType::Limit,
                quantity,
                Some(tp_price),
                Label::new(format!("{label}_TP")),
                TimeInForce::Gtc,
                None,
                timestamp,
            );
            tp.purpose = Purpose::TakeProfit;
            tp
        });

        let mut entry = entry;
        entry.purpose = Purpose::Entry;

        AtomicOrder::new(entry, stop_loss, take_profit)
    }
}
