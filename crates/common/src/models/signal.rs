use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    Short,
    Avoid,
    LongAfterDump,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "SHORT",
            Self::Avoid => "AVOID",
            Self::LongAfterDump => "LONG_AFTER_DUMP",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation about a token as published by the signal backend.
///
/// Scores are passed through untouched; range checks belong to whoever
/// displays them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub token: String,
    pub signal: SignalType,
    pub uis_score: f64,
    pub confidence: f64, // percent, nominally 0..=100
    pub expected_move_pct: f64,
    pub reason: String,
}
