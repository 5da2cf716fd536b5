//! Scenario tests from the concrete walkthroughs: simple fills, partial
//! fills, atomic-order closes, unknown-order drops, clock advances, and
//! account mismatches. Mirrors the teacher's
//! `tests/end_to_end_integration_tests.rs` layout: integration tests that
//! exercise the full command -> event -> position pipeline through the
//! crate's public API and test doubles rather than internals.

use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use execution_core::client::{Command, SubmitAtomicOrder, SubmitOrder};
use execution_core::clock::{Clock, TestClock};
use execution_core::config::EngineConfig;
use execution_core::engine::ExecutionEngine;
use execution_core::events::{AccountStateEvent, Event, OrderEvent};
use execution_core::identifiers::{AccountId, Guid, IdentifierTag, Label, PositionId, StrategyId, Symbol};
use execution_core::order::{OrderFactory, OrderState, OrderType, Side, TimeInForce};
use execution_core::testing::{MockExecutionClient, RecordingPortfolio, RecordingStrategy};

fn new_engine() -> ExecutionEngine<MockExecutionClient, RecordingPortfolio> {
    ExecutionEngine::new(MockExecutionClient::new(), RecordingPortfolio::new(), EngineConfig::new())
}

fn register(
    engine: &mut ExecutionEngine<MockExecutionClient, RecordingPortfolio>,
    strategy_id: &str,
) -> std::sync::Arc<std::sync::Mutex<Vec<Event>>> {
    let strategy = RecordingStrategy::new(StrategyId::new(strategy_id));
    let events_handle = strategy.received_events.clone();
    engine.register_strategy(Box::new(strategy));
    events_handle
}

fn account_id() -> AccountId {
    AccountId::new("ACC1")
}

// -- Scenario A: simple market buy fill -------------------------------------

#[test]
fn scenario_a_simple_market_buy_fill() -> Result<()> {
    let mut engine = new_engine();
    let events = register(&mut engine, "S1");

    let mut factory = OrderFactory::new(IdentifierTag::new("T1", "S1"));
    let order = factory.order(
        Symbol::new("AAPL"),
        Side::Buy,
        OrderType::Market,
        100,
        None,
        Label::new("entry"),
        TimeInForce::Day,
        None,
        0,
    );
    let order_id = order.id.clone();
    let position_id = PositionId::new("P1");

    engine.handle_command(Command::SubmitOrder(SubmitOrder {
        order,
        strategy_id: StrategyId::new("S1"),
        position_id: position_id.clone(),
    }))?;

    engine.handle_event(Event::Order(OrderEvent::Submitted {
        event_id: Guid::new(),
        order_id: order_id.clone(),
        account_id: account_id(),
        timestamp: 1,
    }));
    engine.handle_event(Event::Order(OrderEvent::Accepted {
        event_id: Guid::new(),
        order_id: order_id.clone(),
        account_id: account_id(),
        id_broker: "B-1".into(),
        timestamp: 2,
    }));
    engine.handle_event(Event::Order(OrderEvent::Fill {
        event_id: Guid::new(),
        order_id: order_id.clone(),
        account_id: account_id(),
        timestamp: 3,
        execution_id: "E1".into(),
        position_id_broker: Some("PB1".into()),
        last_quantity: 100,
        last_price: dec!(150.00),
    }));

    let stored = engine.database().order(&order_id).unwrap();
    assert_eq!(stored.state, OrderState::Filled);
    assert!(stored.is_completed());
    assert_eq!(stored.average_price, Some(dec!(150.00)));

    assert!(engine.database().position_exists(&position_id));
    assert!(engine.database().positions_open().contains(&position_id));

    let received = events.lock().unwrap().clone();
    let saw_fill = received.iter().any(|e| matches!(e, Event::Order(OrderEvent::Fill { .. })));
    let saw_opened = received
        .iter()
        .any(|e| matches!(e, Event::Position(p) if p.position_id() == &position_id));
    assert!(saw_fill, "strategy should receive the fill");
    assert!(saw_opened, "strategy should receive PositionOpened");
    Ok(())
}

// -- Scenario B: partial fills ------------------------------------------------

#[test]
fn scenario_b_partial_fills_compute_volume_weighted_average() -> Result<()> {
    let mut engine = new_engine();
    register(&mut engine, "S1");

    let mut factory = OrderFactory::new(IdentifierTag::new("T1", "S1"));
    let order = factory.order(
        Symbol::new("AAPL"),
        Side::Sell,
        OrderType::Limit,
        100,
        Some(dec!(150.00)),
        Label::new("exit"),
        TimeInForce::Day,
        None,
        0,
    );
    let order_id = order.id.clone();
    let position_id = PositionId::new("P1");

    engine.handle_command(Command::SubmitOrder(SubmitOrder {
        order,
        strategy_id: StrategyId::new("S1"),
        position_id,
    }))?;

    engine.handle_event(Event::Order(OrderEvent::Fill {
        event_id: Guid::new(),
        order_id: order_id.clone(),
        account_id: account_id(),
        timestamp: 1,
        execution_id: "E1".into(),
        position_id_broker: None,
        last_quantity: 40,
        last_price: dec!(150.10),
    }));

    let after_first = engine.database().order(&order_id).unwrap();
    assert_eq!(after_first.state, OrderState::PartiallyFilled);
    assert!(after_first.is_working());

    engine.handle_event(Event::Order(OrderEvent::Fill {
        event_id: Guid::new(),
        order_id: order_id.clone(),
        account_id: account_id(),
        timestamp: 2,
        execution_id: "E2".into(),
        position_id_broker: None,
        last_quantity: 60,
        last_price: dec!(150.20),
    }));

    let after_second = engine.database().order(&order_id).unwrap();
    assert_eq!(after_second.state, OrderState::Filled);
    assert_eq!(after_second.average_price, Some(dec!(150.16)));
    assert_eq!(after_second.slippage, Some(dec!(0.16)));
    Ok(())
}

// -- Scenario C: atomic order close ------------------------------------------

#[test]
fn scenario_c_atomic_order_entry_then_stop_loss_closes_position() -> Result<()> {
    let mut engine = new_engine();
    let events = register(&mut engine, "S1");

    let mut factory = OrderFactory::new(IdentifierTag::new("T1", "S1"));
    let atomic = factory.atomic_order(
        Symbol::new("AAPL"),
        Side::Buy,
        OrderType::Market,
        10,
        None,
        dec!(99.00),
        Some(dec!(101.00)),
        Label::new("br1"),
        0,
    );
    let entry_id = atomic.entry.id.clone();
    let stop_loss_id = atomic.stop_loss.id.clone();
    let position_id = PositionId::new("P2");

    engine.handle_command(Command::SubmitAtomicOrder(SubmitAtomicOrder {
        atomic,
        strategy_id: StrategyId::new("S1"),
        position_id: position_id.clone(),
    }))?;

    // Entry fills first, opening the position.
    engine.handle_event(Event::Order(OrderEvent::Fill {
        event_id: Guid::new(),
        order_id: entry_id.clone(),
        account_id: account_id(),
        timestamp: 1,
        execution_id: "E-ENTRY".into(),
        position_id_broker: Some("PB2".into()),
        last_quantity: 10,
        last_price: dec!(100.00),
    }));
    assert!(engine.database().positions_open().contains(&position_id));

    // Stop-loss fills, closing the position at a loss.
    engine.handle_event(Event::Order(OrderEvent::Fill {
        event_id: Guid::new(),
        order_id: stop_loss_id.clone(),
        account_id: account_id(),
        timestamp: 2,
        execution_id: "E-SL".into(),
        position_id_broker: Some("PB2".into()),
        last_quantity: 10,
        last_price: dec!(99.00),
    }));

    assert!(!engine.database().positions_open().contains(&position_id));
    assert!(engine.database().positions_closed().contains(&position_id));

    let received = events.lock().unwrap().clone();
    let closes: Vec<Decimal> = received
        .iter()
        .filter_map(|e| match e {
            Event::Position(execution_core::events::PositionEvent::Closed {
                position_id: closed_id,
                realized_return,
                ..
            }) if closed_id == &position_id => Some(*realized_return),
            _ => None,
        })
        .collect();
    assert_eq!(closes.len(), 1, "PositionClosed reported exactly once");
    // Entry BUY 10 @ 100.00, stop-loss SELL 10 @ 99.00: realized return is
    // the fractional pnl/notional, (99.00 - 100.00) * 10 / (100.00 * 10) =
    // -0.01, per spec Scenario C.
    assert_eq!(closes[0], dec!(-0.01), "stop-loss exit realizes a return of -0.01");
    Ok(())
}

// -- Scenario D: event for unknown order --------------------------------------

#[test]
fn scenario_d_fill_for_unknown_order_is_dropped() {
    let mut engine = new_engine();
    register(&mut engine, "S1");

    let unknown_order_id = execution_core::identifiers::OrderId::new("O-GHOST");
    engine.handle_event(Event::Order(OrderEvent::Fill {
        event_id: Guid::new(),
        order_id: unknown_order_id.clone(),
        account_id: account_id(),
        timestamp: 1,
        execution_id: "E1".into(),
        position_id_broker: None,
        last_quantity: 10,
        last_price: dec!(1.00),
    }));

    assert_eq!(engine.event_count(), 1);
    assert!(!engine.database().order_exists(&unknown_order_id));
    assert_eq!(engine.database().order_count(), 0);
    assert_eq!(engine.database().position_count(), 0);
}

// -- Scenario E: test clock advance -------------------------------------------

#[test]
fn scenario_e_clock_advance_fires_alert_and_timer_in_order() -> Result<()> {
    let mut clock = TestClock::new();
    let noop: execution_core::clock::Handler = std::sync::Arc::new(|_event| {});
    clock.set_time_alert("alert", 10, Some(noop.clone()))?;
    clock.set_timer("timer", 3, Some(0), Some(9), Some(noop))?;

    let fired = clock.advance_time(10);
    let timestamps: Vec<i64> = fired.iter().map(|(e, _)| e.timestamp).collect();
    assert_eq!(timestamps, vec![3, 6, 9, 10]);
    assert_eq!(clock.time_now(), 10);
    assert_eq!(clock.timer_count(), 0);
    Ok(())
}

// -- Scenario F: account mismatch --------------------------------------------

#[test]
fn scenario_f_account_mismatch_is_dropped_not_applied() {
    let mut engine = new_engine();
    register(&mut engine, "S1");

    engine.handle_event(Event::Account(AccountStateEvent {
        event_id: Guid::new(),
        account_id: AccountId::new("ACC1"),
        timestamp: 1,
        equity: dec!(100_000.00),
        balance: dec!(100_000.00),
        margin_used: Decimal::ZERO,
        margin_call: false,
        currency: "USD".into(),
    }));
    assert!(engine.account().is_initialized());
    assert_eq!(engine.account().id, Some(AccountId::new("ACC1")));

    engine.handle_event(Event::Account(AccountStateEvent {
        event_id: Guid::new(),
        account_id: AccountId::new("ACC2"),
        timestamp: 2,
        equity: dec!(1.00),
        balance: dec!(1.00),
        margin_used: Decimal::ZERO,
        margin_call: false,
        currency: "USD".into(),
    }));

    // Account state is untouched by the mismatched event.
    assert_eq!(engine.account().id, Some(AccountId::new("ACC1")));
    assert_eq!(engine.account().equity, dec!(100_000.00));
}
