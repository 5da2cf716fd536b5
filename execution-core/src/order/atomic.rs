//! Atomic (bracket) orders: `{entry, stop_loss, take_profit?}` (§3).

use crate::identifiers::OrderId;

use super::order::Order;

#[derive(Debug, Clone, PartialEq)]
pub struct AtomicOrder {
    pub id: OrderId,
    pub entry: Order,
    pub stop_loss: Order,
    pub take_profit: Option<Order>,
}

impl AtomicOrder {
    pub fn new(entry: Order, stop_loss: Order, take_profit: Option<Order>) -> Self {
        let id = OrderId::new(format!("A{}", entry.id));
        Self {
            id,
            entry,
            stop_loss,
            take_profit,
        }
    }

    pub fn orders(&self) -> Vec<&Order> {
        let mut orders = vec![&self.entry, &self.stop_loss];
        if let Some(tp) = &self.take_profit {
            orders.push(tp);
        }
        orders
    }
}
