use super::order::Action;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trading intent produced by a strategy's pure analysis path (`Strategy::run`).
///
/// Carries no portfolio side effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub action: Action,
    pub price: f64,
    pub time: DateTime<Utc>,
    pub quantity: f64,
}
