//! Portfolio sink: the narrow outbound port the engine reports realized
//! returns and account transactions to (§4.3, §6). Named but not specified
//! beyond "the portfolio analyzer" and "the portfolio" — modeled the same
//! way as [`crate::client::ExecutionClient`]: an abstract collaborator the
//! engine calls into, never the other way around.

use rust_decimal::Decimal;

use crate::events::AccountStateEvent;
use crate::identifiers::{AccountId, PositionId, StrategyId};

pub trait PortfolioSink {
    /// Called exactly once per position close, with the realized return
    /// drained from the position at `PositionClosed` (§8 invariant 4).
    fn on_realized_return(&mut self, position_id: &PositionId, strategy_id: &StrategyId, realized_return: Decimal);

    /// Called whenever an `AccountStateEvent` is accepted and applied.
    fn on_account_transaction(&mut self, account_id: &AccountId, event: &AccountStateEvent);
}
