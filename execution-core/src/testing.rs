//! Test doubles for exercising the full command -> event -> position
//! pipeline without a real broker connection. Ported from the teacher's
//! `testing/helpers.rs` convention of shipping mock collaborators alongside
//! the crate rather than leaving integration tests to hand-roll their own.

use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;

use crate::client::{AccountInquiry, CancelOrder, Command, ExecutionClient, ModifyOrder, SubmitAtomicOrder, SubmitOrder};
use crate::events::{AccountStateEvent, Event};
use crate::identifiers::{AccountId, PositionId, StrategyId};
use crate::portfolio::PortfolioSink;
use crate::strategy::{EngineHandle, StrategyHandler};

/// Records every command it is handed rather than forwarding it anywhere.
/// `connect`/`disconnect`/`reset` are tracked only as call counts.
#[derive(Default)]
pub struct MockExecutionClient {
    pub account_inquiries: Vec<AccountInquiry>,
    pub submitted_orders: Vec<SubmitOrder>,
    pub submitted_atomic_orders: Vec<SubmitAtomicOrder>,
    pub modified_orders: Vec<ModifyOrder>,
    pub cancelled_orders: Vec<CancelOrder>,
    pub connect_calls: u32,
    pub disconnect_calls: u32,
    pub dispose_calls: u32,
    pub reset_calls: u32,
}

impl MockExecutionClient {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExecutionClient for MockExecutionClient {
    fn connect(&mut self) {
        self.connect_calls += 1;
    }

    fn disconnect(&mut self) {
        self.disconnect_calls += 1;
    }

    fn dispose(&mut self) {
        self.dispose_calls += 1;
    }

    fn account_inquiry(&mut self, cmd: &AccountInquiry) {
        self.account_inquiries.push(cmd.clone());
    }

    fn submit_order(&mut self, cmd: &SubmitOrder) {
        self.submitted_orders.push(cmd.clone());
    }

    fn submit_atomic_order(&mut self, cmd: &SubmitAtomicOrder) {
        self.submitted_atomic_orders.push(cmd.clone());
    }

    fn modify_order(&mut self, cmd: &ModifyOrder) {
        self.modified_orders.push(cmd.clone());
    }

    fn cancel_order(&mut self, cmd: &CancelOrder) {
        self.cancelled_orders.push(cmd.clone());
    }

    fn reset(&mut self) {
        self.reset_calls += 1;
    }
}

/// Records every command submitted through its `EngineHandle` and every
/// event it is handed, instead of implementing real trading logic.
pub struct RecordingStrategy {
    id: StrategyId,
    engine: Option<EngineHandle>,
    pub received_events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingStrategy {
    pub fn new(id: StrategyId) -> Self {
        Self {
            id,
            engine: None,
            received_events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn submit(&self, command: Command) {
        self.engine
            .as_ref()
            .expect("strategy not yet registered with an engine")
            .submit(command)
            .expect("command channel closed");
    }

    pub fn events(&self) -> Vec<Event> {
        self.received_events.lock().unwrap().clone()
    }
}

impl StrategyHandler for RecordingStrategy {
    fn identifier(&self) -> StrategyId {
        self.id.clone()
    }

    fn register_execution_engine(&mut self, engine: EngineHandle) {
        self.engine = Some(engine);
    }

    fn handle_event(&mut self, event: &Event) {
        self.received_events.lock().unwrap().push(event.clone());
    }
}

/// Records realized returns and account transactions instead of forwarding
/// them to a real portfolio analyzer.
#[derive(Default)]
pub struct RecordingPortfolio {
    pub realized_returns: Vec<(PositionId, StrategyId, Decimal)>,
    pub account_transactions: Vec<(AccountId, AccountStateEvent)>,
}

impl RecordingPortfolio {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PortfolioSink for RecordingPortfolio {
    fn on_realized_return(&mut self, position_id: &PositionId, strategy_id: &StrategyId, realized_return: Decimal) {
        self.realized_returns
            .push((position_id.clone(), strategy_id.clone(), realized_return));
    }

    fn on_account_transaction(&mut self, account_id: &AccountId, event: &AccountStateEvent) {
        self.account_transactions.push((account_id.clone(), event.clone()));
    }
}
