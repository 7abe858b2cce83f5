use serde::{Deserialize, Serialize};
use std::fmt;

/// Order ID, unique within one ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn sequential(n: u64) -> Self {
        Self(format!("ORD-{n:06}"))
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade ID, unique within one portfolio's trade log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TradeId(pub String);

impl TradeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn sequential(n: u64) -> Self {
        Self(format!("TRD-{n:06}"))
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic counter for sequential IDs.
#[derive(Debug, Clone, Default)]
pub struct IdGen {
    next: u64,
}

impl IdGen {
    pub fn next_id(&mut self) -> u64 {
        self.next += 1;
        self.next
    }

    /// Generator whose next id is `last + 1`.
    #[cfg(test)]
    pub(crate) fn resume_after(last: u64) -> Self {
        Self { next: last }
    }
}
