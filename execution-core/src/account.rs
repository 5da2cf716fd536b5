//! Account model (§3): last-known state from the broker's `AccountStateEvent`
//! stream, plus the append-only log of every event applied.

use rust_decimal::Decimal;

use crate::events::AccountStateEvent;
use crate::identifiers::{AccountId, Timestamp};

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: Option<AccountId>,
    pub equity: Decimal,
    pub balance: Decimal,
    pub margin_used: Decimal,
    pub margin_call: bool,
    pub currency: String,
    pub last_updated: Option<Timestamp>,
    pub events: Vec<AccountStateEvent>,
    initialized: bool,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            id: None,
            equity: Decimal::ZERO,
            balance: Decimal::ZERO,
            margin_used: Decimal::ZERO,
            margin_call: false,
            currency: String::new(),
            last_updated: None,
            events: Vec::new(),
            initialized: false,
        }
    }
}

impl Account {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// True if this event may be applied: the account has no identity yet,
    /// or the event's `account_id` matches the one already on file.
    pub fn accepts(&self, event: &AccountStateEvent) -> bool {
        match &self.id {
            None => true,
            Some(id) => id == &event.account_id,
        }
    }

    /// Applies an already-accepted event. Callers must check [`Self::accepts`]
    /// first — mismatched events are an operational anomaly the engine logs
    /// and drops, not a condition this method defends against.
    pub fn apply(&mut self, event: AccountStateEvent) {
        self.id = Some(event.account_id.clone());
        self.equity = event.equity;
        self.balance = event.balance;
        self.margin_used = event.margin_used;
        self.margin_call = event.margin_call;
        self.currency = event.currency.clone();
        self.last_updated = Some(event.timestamp);
        self.initialized = true;
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::Guid;
    use rust_decimal_macros::dec;

    fn event(account_id: &str, timestamp: Timestamp) -> AccountStateEvent {
        AccountStateEvent {
            event_id: Guid::new(),
            account_id: AccountId::new(account_id),
            timestamp,
            equity: dec!(10_000.00),
            balance: dec!(10_000.00),
            margin_used: Decimal::ZERO,
            margin_call: false,
            currency: "USD".into(),
        }
    }

    #[test]
    fn first_event_initializes_account() {
        let mut account = Account::new();
        assert!(account.accepts(&event("ACC1", 1)));
        account.apply(event("ACC1", 1));
        assert!(account.is_initialized());
        assert_eq!(account.id, Some(AccountId::new("ACC1")));
    }

    #[test]
    fn mismatched_account_id_is_rejected_not_applied() {
        let mut account = Account::new();
        account.apply(event("ACC1", 1));
        let mismatch = event("ACC2", 2);
        assert!(!account.accepts(&mismatch));
        // Engine would log+drop here; state is untouched.
        assert_eq!(account.id, Some(AccountId::new("ACC1")));
        assert_eq!(account.events.len(), 1);
    }
}
