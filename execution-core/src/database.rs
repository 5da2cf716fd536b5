//! Execution database (§3, §4.2): the sole owner of every order and
//! position, plus every index derived from them. A pure indexed store with
//! no side-effecting logic — the engine is the only mutator.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::errors::PreconditionError;
use crate::events::AccountStateEvent;
use crate::identifiers::{OrderId, PositionId, StrategyId};
use crate::order::Order;
use crate::position::Position;

#[derive(Default)]
pub struct ExecutionDatabase {
    orders: HashMap<OrderId, Order>,
    positions: HashMap<PositionId, Position>,
    strategies: HashSet<StrategyId>,

    order_to_strategy: HashMap<OrderId, StrategyId>,
    order_to_position: HashMap<OrderId, PositionId>,
    position_to_strategy: HashMap<PositionId, StrategyId>,
    position_to_orders: HashMap<PositionId, HashSet<OrderId>>,
    strategy_to_orders: HashMap<StrategyId, HashSet<OrderId>>,
    strategy_to_positions: HashMap<StrategyId, HashSet<PositionId>>,

    orders_working: HashSet<OrderId>,
    orders_completed: HashSet<OrderId>,
    positions_open: HashSet<PositionId>,
    positions_closed: HashSet<PositionId>,
}

impl ExecutionDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    // -- strategy registration -------------------------------------------------

    pub fn add_strategy(&mut self, strategy_id: StrategyId) {
        self.strategies.insert(strategy_id);
    }

    /// Detaches strategy-indexed sets; does not remove the strategy's
    /// orders or positions from their owning stores.
    pub fn delete_strategy(&mut self, strategy_id: &StrategyId) {
        self.strategies.remove(strategy_id);
        self.strategy_to_orders.remove(strategy_id);
        self.strategy_to_positions.remove(strategy_id);
    }

    pub fn is_strategy_registered(&self, strategy_id: &StrategyId) -> bool {
        self.strategies.contains(strategy_id)
    }

    // -- insertion --------------------------------------------------------------

    fn try_add_order(
        &mut self,
        order: Order,
        strategy_id: StrategyId,
        position_id: PositionId,
    ) -> Result<(), PreconditionError> {
        if self.orders.contains_key(&order.id) {
            return Err(PreconditionError::DuplicateOrderId(order.id.clone()));
        }
        if let Some(existing) = self.position_to_strategy.get(&position_id) {
            if existing != &strategy_id {
                return Err(PreconditionError::PositionStrategyMismatch {
                    position_id,
                    existing: existing.clone(),
                    incoming: strategy_id,
                });
            }
        }

        let order_id = order.id.clone();
        self.reindex_order_partition(&order);
        self.orders.insert(order_id.clone(), order);
        self.order_to_strategy.insert(order_id.clone(), strategy_id.clone());
        self.order_to_position.insert(order_id.clone(), position_id.clone());
        self.position_to_strategy
            .entry(position_id.clone())
            .or_insert_with(|| strategy_id.clone());
        self.position_to_orders
            .entry(position_id)
            .or_default()
            .insert(order_id.clone());
        self.strategy_to_orders
            .entry(strategy_id)
            .or_default()
            .insert(order_id);
        Ok(())
    }

    /// Asserts the order id is new across every index; fails loudly
    /// (panics) on violation, per §4.2's "programming error" classification.
    pub fn add_order(&mut self, order: Order, strategy_id: StrategyId, position_id: PositionId) {
        self.try_add_order(order, strategy_id, position_id)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    fn try_add_position(
        &mut self,
        position: Position,
        strategy_id: StrategyId,
    ) -> Result<(), PreconditionError> {
        if self.positions.contains_key(&position.id) {
            return Err(PreconditionError::DuplicatePositionId(position.id.clone()));
        }
        let position_id = position.id.clone();
        self.positions.insert(position_id.clone(), position);
        self.position_to_strategy
            .insert(position_id.clone(), strategy_id.clone());
        self.strategy_to_positions
            .entry(strategy_id)
            .or_default()
            .insert(position_id.clone());
        self.positions_open.insert(position_id);
        Ok(())
    }

    pub fn add_position(&mut self, position: Position, strategy_id: StrategyId) {
        self.try_add_position(position, strategy_id)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    // -- updates ------------------------------------------------------------

    fn reindex_order_partition(&mut self, order: &Order) {
        self.orders_working.remove(&order.id);
        self.orders_completed.remove(&order.id);
        if order.is_working() {
            self.orders_working.insert(order.id.clone());
        } else if order.is_completed() {
            self.orders_completed.insert(order.id.clone());
        }
    }

    /// Re-partitions the order between `orders_working`/`orders_completed`
    /// based on its current flags, and writes the (already-mutated) order
    /// back into the owning store.
    pub fn update_order(&mut self, order: Order) {
        self.reindex_order_partition(&order);
        self.orders.insert(order.id.clone(), order);
    }

    pub fn update_position(&mut self, position: Position) {
        if position.is_closed() {
            self.positions_open.remove(&position.id);
            self.positions_closed.insert(position.id.clone());
        }
        self.positions.insert(position.id.clone(), position);
    }

    /// No-op for the in-memory variant; retained for durable implementations
    /// to override (§4.2).
    pub fn update_account(&mut self, _event: &AccountStateEvent) {}

    // -- queries --------------------------------------------------------------

    pub fn order(&self, order_id: &OrderId) -> Option<&Order> {
        self.orders.get(order_id)
    }

    pub fn order_mut(&mut self, order_id: &OrderId) -> Option<&mut Order> {
        self.orders.get_mut(order_id)
    }

    pub fn position(&self, position_id: &PositionId) -> Option<&Position> {
        self.positions.get(position_id)
    }

    pub fn position_mut(&mut self, position_id: &PositionId) -> Option<&mut Position> {
        self.positions.get_mut(position_id)
    }

    pub fn order_exists(&self, order_id: &OrderId) -> bool {
        self.orders.contains_key(order_id)
    }

    pub fn position_exists(&self, position_id: &PositionId) -> bool {
        self.positions.contains_key(position_id)
    }

    pub fn get_strategy_for_order(&self, order_id: &OrderId) -> Option<&StrategyId> {
        self.order_to_strategy.get(order_id)
    }

    pub fn get_strategy_for_position(&self, position_id: &PositionId) -> Option<&StrategyId> {
        self.position_to_strategy.get(position_id)
    }

    pub fn get_position_id(&self, order_id: &OrderId) -> Option<&PositionId> {
        self.order_to_position.get(order_id)
    }

    /// Defensive copy: callers cannot observe or mutate internal state
    /// through this handle (§5).
    pub fn orders_for_strategy(&self, strategy_id: &StrategyId) -> HashSet<OrderId> {
        self.strategy_to_orders.get(strategy_id).cloned().unwrap_or_default()
    }

    pub fn positions_for_strategy(&self, strategy_id: &StrategyId) -> HashSet<PositionId> {
        self.strategy_to_positions
            .get(strategy_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn orders_for_position(&self, position_id: &PositionId) -> HashSet<OrderId> {
        self.position_to_orders.get(position_id).cloned().unwrap_or_default()
    }

    pub fn orders_working(&self) -> HashSet<OrderId> {
        self.orders_working.clone()
    }

    pub fn orders_completed(&self) -> HashSet<OrderId> {
        self.orders_completed.clone()
    }

    pub fn positions_open(&self) -> HashSet<PositionId> {
        self.positions_open.clone()
    }

    pub fn positions_closed(&self) -> HashSet<PositionId> {
        self.positions_closed.clone()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Logs (does not mutate) any still-working orders or still-open
    /// positions. §9's open question on this policy: log-only, matching the
    /// source; a durable variant may choose to escalate.
    pub fn check_residuals(&self) {
        for order_id in &self.orders_working {
            warn!(%order_id, "residual working order at shutdown");
        }
        for position_id in &self.positions_open {
            warn!(%position_id, "residual open position at shutdown");
        }
    }

    /// Clears every index and owning store; the database remains usable.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Debug-only invariant check walking §3 invariants 1-3. Compiled out of
    /// release builds, mirroring the teacher's scattered `debug_assert!`
    /// defense-in-depth checks in `core/order_fsm.rs`/`core/types.rs`.
    #[cfg(debug_assertions)]
    pub fn debug_assert_consistent(&self) {
        for order_id in self.order_to_strategy.keys() {
            debug_assert!(self.orders.contains_key(order_id), "dangling order index entry {order_id}");
        }
        for position_id in self.position_to_strategy.keys() {
            debug_assert!(
                self.positions.contains_key(position_id),
                "dangling position index entry {position_id}"
            );
        }
        for order_id in &self.orders_working {
            debug_assert!(
                !self.orders_completed.contains(order_id),
                "order {order_id} in both working and completed partitions"
            );
        }
        for (position_id, order_ids) in &self.position_to_orders {
            let Some(position_strategy) = self.position_to_strategy.get(position_id) else {
                continue;
            };
            for order_id in order_ids {
                if let Some(order_strategy) = self.order_to_strategy.get(order_id) {
                    debug_assert!(
                        order_strategy == position_strategy,
                        "order {order_id} strategy disagrees with position {position_id} strategy"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::{Label, Symbol};
    use crate::order::{OrderState, OrderType, Purpose, Side, TimeInForce};

    fn sample_order(id: &str) -> Order {
        Order {
            id: OrderId::new(id),
            symbol: Symbol::new("AAPL"),
            side: Side::Buy,
            order_type: OrderType::Market,
            purpose: Purpose::None,
            quantity: 10,
            price: None,
            label: Label::new("l"),
            time_in_force: TimeInForce::Day,
            expire_time: None,
            timestamp: 0,
            init_id: crate::identifiers::Guid::new(),
            state: OrderState::Working,
            filled_quantity: 0,
            average_price: None,
            slippage: None,
            execution_ids: HashSet::new(),
            events: Vec::new(),
            id_broker: None,
            account_id: None,
            position_id_broker: None,
        }
    }

    #[test]
    fn add_order_populates_every_index() {
        let mut db = ExecutionDatabase::new();
        let strategy_id = StrategyId::new("S1");
        let position_id = PositionId::new("P1");
        db.add_strategy(strategy_id.clone());
        db.add_order(sample_order("O1"), strategy_id.clone(), position_id.clone());

        assert!(db.order_exists(&OrderId::new("O1")));
        assert_eq!(db.get_strategy_for_order(&OrderId::new("O1")), Some(&strategy_id));
        assert_eq!(db.get_position_id(&OrderId::new("O1")), Some(&position_id));
        assert!(db.orders_working().contains(&OrderId::new("O1")));
        assert!(db.orders_for_strategy(&strategy_id).contains(&OrderId::new("O1")));
    }

    #[test]
    #[should_panic(expected = "duplicate order id")]
    fn duplicate_order_id_panics() {
        let mut db = ExecutionDatabase::new();
        let strategy_id = StrategyId::new("S1");
        let position_id = PositionId::new("P1");
        db.add_order(sample_order("O1"), strategy_id.clone(), position_id.clone());
        db.add_order(sample_order("O1"), strategy_id, position_id);
    }

    #[test]
    #[should_panic(expected = "mapped to strategy")]
    fn position_strategy_mismatch_panics() {
        let mut db = ExecutionDatabase::new();
        let position_id = PositionId::new("P1");
        db.add_order(sample_order("O1"), StrategyId::new("S1"), position_id.clone());
        db.add_order(sample_order("O2"), StrategyId::new("S2"), position_id);
    }

    #[test]
    fn update_order_moves_between_partitions() {
        let mut db = ExecutionDatabase::new();
        let strategy_id = StrategyId::new("S1");
        let position_id = PositionId::new("P1");
        db.add_order(sample_order("O1"), strategy_id, position_id);

        let mut order = db.order(&OrderId::new("O1")).unwrap().clone();
        order.state = OrderState::Filled;
        db.update_order(order);

        assert!(!db.orders_working().contains(&OrderId::new("O1")));
        assert!(db.orders_completed().contains(&OrderId::new("O1")));
    }

    #[test]
    fn reset_clears_every_index() {
        let mut db = ExecutionDatabase::new();
        db.add_order(sample_order("O1"), StrategyId::new("S1"), PositionId::new("P1"));
        db.reset();
        assert_eq!(db.order_count(), 0);
        assert!(!db.order_exists(&OrderId::new("O1")));
    }

    #[test]
    fn delete_strategy_detaches_but_keeps_orders() {
        let mut db = ExecutionDatabase::new();
        let strategy_id = StrategyId::new("S1");
        db.add_strategy(strategy_id.clone());
        db.add_order(sample_order("O1"), strategy_id.clone(), PositionId::new("P1"));
        db.delete_strategy(&strategy_id);

        assert!(!db.is_strategy_registered(&strategy_id));
        assert!(db.order_exists(&OrderId::new("O1")));
        assert!(db.orders_for_strategy(&strategy_id).is_empty());
    }
}
