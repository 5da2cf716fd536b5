//! Execution engine (§4.3): the only mutator of database state. Dispatches
//! commands outbound to the execution client and events inbound to
//! strategies, preserving the invariants in §3/§8.
//!
//! Generic over `C: ExecutionClient` and `P: PortfolioSink` rather than
//! `Box<dyn _>` (REDESIGN FLAG #1 — dispatch by value, not by class
//! identity). The strategy registry is the one place `Box<dyn _>` remains,
//! because distinct registered strategies genuinely are distinct concrete
//! types (REDESIGN FLAG #3).

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, SyncSender};

use tracing::{error, warn};

use crate::account::Account;
use crate::client::{Command, ExecutionClient};
use crate::config::EngineConfig;
use crate::database::ExecutionDatabase;
use crate::errors::EngineError;
use crate::events::{AccountStateEvent, Event, OrderCancelReject, OrderEvent, PositionEvent};
use crate::identifiers::{Guid, StrategyId};
use crate::order::Order;
use crate::portfolio::PortfolioSink;
use crate::position::Position;
use crate::strategy::{EngineHandle, StrategyHandler};

pub struct ExecutionEngine<C: ExecutionClient, P: PortfolioSink> {
    client: C,
    portfolio: P,
    database: ExecutionDatabase,
    account: Account,
    strategies: HashMap<StrategyId, Box<dyn StrategyHandler>>,

    command_count: u64,
    event_count: u64,

    commands_tx: SyncSender<Command>,
    commands_rx: Receiver<Command>,
    events_tx: SyncSender<Event>,
    events_rx: Receiver<Event>,
}

impl<C: ExecutionClient, P: PortfolioSink> ExecutionEngine<C, P> {
    /// Channel capacities come from `config` (§5, §9 ambient configuration):
    /// producers (strategies, the execution client's own event-relay thread)
    /// block once a queue fills rather than growing it unboundedly.
    pub fn new(client: C, portfolio: P, config: EngineConfig) -> Self {
        let (commands_tx, commands_rx) = mpsc::sync_channel(config.command_queue_capacity);
        let (events_tx, events_rx) = mpsc::sync_channel(config.event_queue_capacity);
        Self {
            client,
            portfolio,
            database: ExecutionDatabase::new(),
            account: Account::new(),
            strategies: HashMap::new(),
            command_count: 0,
            event_count: 0,
            commands_tx,
            commands_rx,
            events_tx,
            events_rx,
        }
    }

    pub fn command_count(&self) -> u64 {
        self.command_count
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    pub fn database(&self) -> &ExecutionDatabase {
        &self.database
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// A narrow command-submission handle to hand to strategies and other
    /// multi-threaded command producers (§5). The engine itself is the sole
    /// consumer: producers enqueue, `drain_commands` dequeues and dispatches
    /// on whatever thread calls it.
    pub fn command_handle(&self) -> EngineHandle {
        EngineHandle::new(self.commands_tx.clone())
    }

    /// A narrow event-submission handle for an `ExecutionClient`
    /// implementation running on its own thread to hand fills/acks back to
    /// the engine without needing a reference to it.
    pub fn event_sender(&self) -> SyncSender<Event> {
        self.events_tx.clone()
    }

    /// Registers a strategy: records it in the database and gives it a
    /// command handle, per §9's registry pattern.
    pub fn register_strategy(&mut self, mut strategy: Box<dyn StrategyHandler>) {
        let strategy_id = strategy.identifier();
        strategy.register_execution_engine(self.command_handle());
        self.database.add_strategy(strategy_id.clone());
        self.strategies.insert(strategy_id, strategy);
    }

    /// Drains every command queued on the command channel, dispatching each
    /// synchronously. Returns the number of commands processed.
    pub fn drain_commands(&mut self) -> usize {
        let mut n = 0;
        while let Ok(command) = self.commands_rx.try_recv() {
            if let Err(e) = self.handle_command(command) {
                warn!(error = %e, "command rejected");
            }
            n += 1;
        }
        n
    }

    /// Drains every event queued on the event channel, dispatching each
    /// synchronously. Returns the number of events processed.
    pub fn drain_events(&mut self) -> usize {
        let mut n = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            n += 1;
        }
        n
    }

    // -- command path (§4.3) -----------------------------------------------

    pub fn handle_command(&mut self, command: Command) -> Result<(), EngineError> {
        match command {
            Command::AccountInquiry(cmd) => {
                self.client.account_inquiry(&cmd);
            }
            Command::SubmitOrder(cmd) => {
                if !self.database.is_strategy_registered(&cmd.strategy_id) {
                    return Err(EngineError::UnknownStrategy(cmd.strategy_id));
                }
                self.database
                    .add_order(cmd.order.clone(), cmd.strategy_id.clone(), cmd.position_id.clone());
                self.client.submit_order(&cmd);
            }
            Command::SubmitAtomicOrder(cmd) => {
                if !self.database.is_strategy_registered(&cmd.strategy_id) {
                    return Err(EngineError::UnknownStrategy(cmd.strategy_id));
                }
                self.database.add_order(
                    cmd.atomic.entry.clone(),
                    cmd.strategy_id.clone(),
                    cmd.position_id.clone(),
                );
                self.database.add_order(
                    cmd.atomic.stop_loss.clone(),
                    cmd.strategy_id.clone(),
                    cmd.position_id.clone(),
                );
                if let Some(take_profit) = &cmd.atomic.take_profit {
                    self.database.add_order(
                        take_profit.clone(),
                        cmd.strategy_id.clone(),
                        cmd.position_id.clone(),
                    );
                }
                self.client.submit_atomic_order(&cmd);
            }
            Command::ModifyOrder(cmd) => {
                // Database mutation deferred until the corresponding event
                // returns (§4.3).
                self.client.modify_order(&cmd);
            }
            Command::CancelOrder(cmd) => {
                self.client.cancel_order(&cmd);
            }
        }
        self.command_count += 1;
        Ok(())
    }

    // -- event path (§4.3) ----------------------------------------------------

    pub fn handle_event(&mut self, event: Event) {
        self.event_count += 1;
        match event {
            Event::Order(order_event) => self.handle_order_event(order_event),
            Event::Position(position_event) => self.handle_position_event(position_event),
            Event::Account(account_event) => self.handle_account_event(account_event),
            Event::OrderCancelReject(reject) => self.handle_cancel_reject(reject),
        }
    }

    fn handle_order_event(&mut self, event: OrderEvent) {
        let order_id = event.order_id().clone();
        let Some(mut order) = self.database.order(&order_id).cloned() else {
            error!(%order_id, "event for unknown order, dropping");
            return;
        };

        let is_fill = event.is_fill();
        order
            .apply(event.clone())
            .unwrap_or_else(|e| panic!("{e}"));
        self.database.update_order(order.clone());

        let Some(strategy_id) = self.database.get_strategy_for_order(&order_id).cloned() else {
            error!(%order_id, "no strategy mapped to order, dropping");
            return;
        };

        if is_fill {
            self.handle_fill(&order, &strategy_id, &event);
        } else {
            self.dispatch_to_strategy(&strategy_id, Event::Order(event));
        }
    }

    /// The fill sub-protocol (§4.3): opens or updates the position the fill
    /// belongs to, forwards the fill, then recursively runs the derived
    /// position event through the event path. Recursion is bounded to depth
    /// 2 (fill -> position event -> strategy), matching §5.
    fn handle_fill(&mut self, order: &Order, strategy_id: &StrategyId, event: &OrderEvent) {
        let OrderEvent::Fill {
            last_quantity,
            last_price,
            timestamp,
            ..
        } = event
        else {
            unreachable!("handle_fill called with a non-fill event")
        };

        let Some(position_id) = self.database.get_position_id(&order.id).cloned() else {
            error!(order_id = %order.id, "fill for order with no position mapping, dropping");
            return;
        };

        let position_event = if !self.database.position_exists(&position_id) {
            let position = Position::new(
                position_id.clone(),
                order.symbol.clone(),
                strategy_id.clone(),
                order.side,
                *last_quantity,
                *last_price,
                *timestamp,
            );
            self.database.add_position(position, strategy_id.clone());
            PositionEvent::Opened {
                event_id: Guid::new(),
                position_id: position_id.clone(),
                strategy_id: strategy_id.clone(),
                timestamp: *timestamp,
            }
        } else {
            let mut position = self
                .database
                .position(&position_id)
                .cloned()
                .expect("existence checked above");
            position.apply(order.side, *last_quantity, *last_price);
            let closed = position.is_closed();
            let realized_return = closed.then(|| position.return_realized());
            self.database.update_position(position);

            match realized_return {
                Some(realized_return) => PositionEvent::Closed {
                    event_id: Guid::new(),
                    position_id: position_id.clone(),
                    strategy_id: strategy_id.clone(),
                    timestamp: *timestamp,
                    realized_return,
                },
                None => PositionEvent::Modified {
                    event_id: Guid::new(),
                    position_id: position_id.clone(),
                    strategy_id: strategy_id.clone(),
                    timestamp: *timestamp,
                },
            }
        };

        self.dispatch_to_strategy(strategy_id, Event::Order(event.clone()));
        self.handle_event(Event::Position(position_event));
    }

    fn handle_position_event(&mut self, event: PositionEvent) {
        self.dispatch_to_strategy(&event.strategy_id().clone(), Event::Position(event.clone()));
        if let PositionEvent::Closed {
            position_id,
            strategy_id,
            realized_return,
            ..
        } = &event
        {
            self.portfolio
                .on_realized_return(position_id, strategy_id, *realized_return);
        }
    }

    fn handle_account_event(&mut self, event: AccountStateEvent) {
        if !self.account.accepts(&event) {
            warn!(account_id = %event.account_id, "account id mismatch, dropping");
            return;
        }
        self.portfolio.on_account_transaction(&event.account_id, &event);
        self.database.update_account(&event);
        self.account.apply(event);
    }

    fn handle_cancel_reject(&mut self, reject: OrderCancelReject) {
        let Some(strategy_id) = self.database.get_strategy_for_order(&reject.order_id).cloned() else {
            warn!(order_id = %reject.order_id, "cancel reject for order with no strategy mapping, dropping");
            return;
        };
        warn!(order_id = %reject.order_id, reason = %reject.reason, "order cancel/modify rejected");
        self.dispatch_to_strategy(&strategy_id, Event::OrderCancelReject(reject));
    }

    fn dispatch_to_strategy(&mut self, strategy_id: &StrategyId, event: Event) {
        match self.strategies.get_mut(strategy_id) {
            Some(handler) => handler.handle_event(&event),
            None => error!(%strategy_id, "strategy not registered, dropping event"),
        }
    }

    pub fn check_residuals_and_shutdown(&mut self) {
        self.database.check_residuals();
        self.client.dispose();
    }
}
