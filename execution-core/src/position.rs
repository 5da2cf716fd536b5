//! Position model (§3). The engine treats positions as an opaque collaborator
//! that obeys `apply(fill)` and `is_closed` — the shape below is grounded on
//! the teacher's `risk/types.rs::Position`, trimmed of the risk-limit and
//! daily-PnL bookkeeping that belongs to the portfolio/risk layer this core
//! does not own.

use rust_decimal::Decimal;

use crate::identifiers::{PositionId, StrategyId, Symbol, Timestamp};
use crate::order::Side;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub id: PositionId,
    pub symbol: Symbol,
    pub strategy_id: StrategyId,
    /// Signed net quantity: positive is long, negative is short.
    pub quantity: i64,
    pub avg_price: Decimal,
    pub realized_pnl: Decimal,
    /// Entry notional of the quantity `realized_pnl` was realized against,
    /// accumulated alongside it so `return_realized` can express the close
    /// as a return (pnl / notional) rather than a bare dollar amount.
    realized_notional: Decimal,
    pub opened_at: Timestamp,
    closed: bool,
}

impl Position {
    /// Created by the engine on the first fill for a not-yet-seen `PositionId`.
    pub fn new(
        id: PositionId,
        symbol: Symbol,
        strategy_id: StrategyId,
        side: Side,
        quantity: u64,
        price: Decimal,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            symbol,
            strategy_id,
            quantity: signed(side, quantity),
            avg_price: price,
            realized_pnl: Decimal::ZERO,
            realized_notional: Decimal::ZERO,
            opened_at: timestamp,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_flat(&self) -> bool {
        self.quantity == 0
    }

    pub fn is_long(&self) -> bool {
        self.quantity > 0
    }

    pub fn is_short(&self) -> bool {
        self.quantity < 0
    }

    pub fn unrealized_pnl(&self, market_price: Decimal) -> Decimal {
        Decimal::from(self.quantity) * (market_price - self.avg_price)
    }

    /// Applies one fill. Same-direction fills widen the position and
    /// recompute the volume-weighted average price; opposite-direction
    /// fills realize PnL on the closed portion and, if the fill overshoots
    /// the existing exposure, flip the position to the new side at the
    /// fill price.
    pub fn apply(&mut self, side: Side, quantity: u64, price: Decimal) {
        let incoming = signed(side, quantity);
        let widening = self.quantity == 0 || self.quantity.signum() == incoming.signum();

        if widening {
            let prior_notional = Decimal::from(self.quantity.unsigned_abs()) * self.avg_price;
            let fill_notional = Decimal::from(quantity) * price;
            self.quantity += incoming;
            if self.quantity != 0 {
                self.avg_price = (prior_notional + fill_notional) / Decimal::from(self.quantity.unsigned_abs());
            }
        } else {
            let closing_quantity = quantity.min(self.quantity.unsigned_abs());
            let pnl_per_unit = if self.quantity > 0 {
                price - self.avg_price
            } else {
                self.avg_price - price
            };
            self.realized_pnl += pnl_per_unit * Decimal::from(closing_quantity);
            self.realized_notional += self.avg_price * Decimal::from(closing_quantity);

            let remaining_fill = quantity - closing_quantity;
            self.quantity += incoming;
            if remaining_fill > 0 {
                self.avg_price = price;
            }
        }

        if self.quantity == 0 {
            self.closed = true;
        }
    }

    /// Drains and returns the realized return — realized PnL divided by the
    /// entry notional of the quantity it was realized against — accumulated
    /// since it was last drained. Called by the engine exactly once, at
    /// `PositionClosed`.
    pub fn return_realized(&mut self) -> Decimal {
        let pnl = std::mem::replace(&mut self.realized_pnl, Decimal::ZERO);
        let notional = std::mem::replace(&mut self.realized_notional, Decimal::ZERO);
        if notional.is_zero() {
            Decimal::ZERO
        } else {
            pnl / notional
        }
    }
}

fn signed(side: Side, quantity: u64) -> i64 {
    match side {
        Side::Buy => quantity as i64,
        Side::Sell => -(quantity as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn position(side: Side, qty: u64, price: Decimal) -> Position {
        Position::new(
            PositionId::new("P1"),
            Symbol::new("AAPL"),
            StrategyId::new("S1"),
            side,
            qty,
            price,
            0,
        )
    }

    #[test]
    fn opens_long_on_buy_fill() {
        let p = position(Side::Buy, 10, dec!(100.00));
        assert!(p.is_long());
        assert!(!p.is_closed());
    }

    #[test]
    fn closes_when_net_quantity_returns_to_zero() {
        let mut p = position(Side::Buy, 10, dec!(100.00));
        p.apply(Side::Sell, 10, dec!(101.00));
        assert!(p.is_closed());
        assert!(p.is_flat());
        assert_eq!(p.return_realized(), dec!(0.01));
    }

    #[test]
    fn realized_pnl_reported_once_then_drained() {
        let mut p = position(Side::Buy, 10, dec!(100.00));
        p.apply(Side::Sell, 10, dec!(99.00));
        assert_eq!(p.return_realized(), dec!(-0.01));
        assert_eq!(p.return_realized(), Decimal::ZERO);
    }

    #[test]
    fn atomic_order_close_scenario_c() {
        // Entry BUY 10 @ 100.00, stop-loss SELL 10 @ 99.00: realized return
        // is the fractional pnl/notional, not the dollar pnl (-10.00).
        let mut p = position(Side::Buy, 10, dec!(100.00));
        p.apply(Side::Sell, 10, dec!(99.00));
        assert!(p.is_closed());
        assert_eq!(p.return_realized(), dec!(-0.01));
    }

    #[test]
    fn partial_close_keeps_position_open_and_widens_recomputes_average() {
        let mut p = position(Side::Buy, 10, dec!(100.00));
        p.apply(Side::Buy, 10, dec!(110.00));
        assert_eq!(p.avg_price, dec!(105.00));
        assert_eq!(p.quantity, 20);

        p.apply(Side::Sell, 5, dec!(120.00));
        assert!(!p.is_closed());
        assert_eq!(p.quantity, 15);
        // pnl = (120.00 - 105.00) * 5 = 75.00 against a notional of
        // 105.00 * 5 = 525.00, i.e. a return of 75/525 = 1/7.
        let realized_return = p.return_realized();
        assert!((realized_return - dec!(1) / dec!(7)).abs() < dec!(0.0000001));
    }

    #[test]
    fn fill_overshooting_exposure_flips_position() {
        let mut p = position(Side::Buy, 10, dec!(100.00));
        p.apply(Side::Sell, 15, dec!(90.00));
        assert!(p.is_short());
        assert_eq!(p.quantity, -5);
        assert_eq!(p.avg_price, dec!(90.00));
    }
}
