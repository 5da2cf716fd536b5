//! Opaque, value-typed identifiers used throughout the execution core.
//!
//! Every identifier is equal by content and hashable; none carry behavior of
//! their own. `Guid` is the one exception — it is backed by a `uuid::Uuid`
//! rather than a caller-supplied string, since every event needs one
//! generated fresh rather than assigned by a caller.

use std::fmt;

use uuid::Uuid;

macro_rules! id_type {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_type!(TraderId, "Identifies the trader account a strategy runs under.");
id_type!(StrategyId, "Identifies one registered strategy instance.");
id_type!(OrderId, "Identifies one order, assigned by the factory at construction.");
id_type!(PositionId, "Identifies one position, shared by every order that contributes to it.");
id_type!(AccountId, "Identifies the brokerage account an execution client reports against.");
id_type!(Brokerage, "Names the venue/broker an execution client connects to.");
id_type!(Label, "A free-text tag a strategy attaches to an order for its own bookkeeping.");
id_type!(Symbol, "The tradeable instrument an order targets.");
id_type!(ExecutionId, "Identifies one fill, assigned by the broker.");

/// Globally unique identifier stamped on every event.
///
/// Backed by a UUIDv4 rather than a hand-rolled generator, following the
/// convention used throughout the example corpus for opaque event ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Guid(Uuid);

impl Guid {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Guid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic identifier scope: one counter per `(trader_tag, strategy_tag)`
/// pair, as required by the order factory (§4.1).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentifierTag {
    pub trader_tag: String,
    pub strategy_tag: String,
}

impl IdentifierTag {
    pub fn new(trader_tag: impl Into<String>, strategy_tag: impl Into<String>) -> Self {
        Self {
            trader_tag: trader_tag.into(),
            strategy_tag: strategy_tag.into(),
        }
    }
}

/// UTC timestamp, nanoseconds since the Unix epoch.
pub type Timestamp = i64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_compare_by_content() {
        let a = OrderId::new("O-1");
        let b = OrderId::new("O-1");
        let c = OrderId::new("O-2");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn guids_are_unique() {
        let a = Guid::new();
        let b = Guid::new();
        assert_ne!(a, b);
    }

    #[test]
    fn id_displays_as_inner_string() {
        let id = Symbol::new("AAPL");
        assert_eq!(id.to_string(), "AAPL");
        assert_eq!(id.as_str(), "AAPL");
    }
}
