//! Execution client: the abstract outbound port to the broker/exchange
//! gateway (§6). Protocol details are not specified — only the operation
//! set and the non-blocking contract.

use rust_decimal::Decimal;

use crate::identifiers::{AccountId, OrderId, PositionId, StrategyId};
use crate::order::{AtomicOrder, Order};

#[derive(Debug, Clone, PartialEq)]
pub struct AccountInquiry {
    pub account_id: AccountId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOrder {
    pub order: Order,
    pub strategy_id: StrategyId,
    pub position_id: PositionId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitAtomicOrder {
    pub atomic: AtomicOrder,
    pub strategy_id: StrategyId,
    pub position_id: PositionId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModifyOrder {
    pub order_id: OrderId,
    pub quantity: Option<u64>,
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CancelOrder {
    pub order_id: OrderId,
}

/// Everything a strategy can hand to the execution engine (§4.3).
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AccountInquiry(AccountInquiry),
    SubmitOrder(SubmitOrder),
    SubmitAtomicOrder(SubmitAtomicOrder),
    ModifyOrder(ModifyOrder),
    CancelOrder(CancelOrder),
}

/// Outbound port to the broker. None of these operations may block the
/// engine's dispatch thread (§5) — an implementation that talks to a real
/// venue is expected to hand off internally to its own I/O thread/task and
/// return immediately; results come back later through
/// `ExecutionEngine::handle_event`.
pub trait ExecutionClient {
    fn connect(&mut self);
    fn disconnect(&mut self);
    fn dispose(&mut self);

    fn account_inquiry(&mut self, cmd: &AccountInquiry);
    fn submit_order(&mut self, cmd: &SubmitOrder);
    fn submit_atomic_order(&mut self, cmd: &SubmitAtomicOrder);
    fn modify_order(&mut self, cmd: &ModifyOrder);
    fn cancel_order(&mut self, cmd: &CancelOrder);

    fn reset(&mut self);
}
