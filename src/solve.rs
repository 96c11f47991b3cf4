use crate::puzzle::PuzzleVariant;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a solve, derived from its creation time in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolveId(pub i64);

impl SolveId {
    /// Id for a record created at `at`, kept strictly above `previous`
    pub fn next_after(at: DateTime<Local>, previous: Option<SolveId>) -> Self {
        let candidate = at.timestamp_millis();
        match previous {
            Some(SolveId(prev)) if candidate <= prev => SolveId(prev + 1),
            _ => SolveId(candidate),
        }
    }
}

impl fmt::Display for SolveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One completed timing attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRecord {
    pub id: SolveId,
    pub elapsed_millis: u64,
    pub display_time: String,
    pub scramble: String,
    pub puzzle_variant: PuzzleVariant,
    pub created_at: DateTime<Local>,
}

impl SolveRecord {
    pub fn new(
        id: SolveId,
        elapsed_millis: u64,
        scramble: String,
        puzzle_variant: PuzzleVariant,
        created_at: DateTime<Local>,
    ) -> Self {
        Self {
            id,
            elapsed_millis,
            display_time: format_time(elapsed_millis),
            scramble,
            puzzle_variant,
            created_at,
        }
    }
}

/// `seconds.millis` with three-digit millisecond padding, e.g. `7.005s`
pub fn format_time(elapsed_millis: u64) -> String {
    format!("{}.{:03}s", elapsed_millis / 1000, elapsed_millis % 1000)
}
