use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Puzzle categories the timer keeps separate histories for
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    ValueEnum,
    Serialize,
    Deserialize,
    Default,
    strum_macros::Display,
)]
pub enum PuzzleVariant {
    #[value(name = "2x2")]
    #[serde(rename = "2x2")]
    #[strum(to_string = "2x2")]
    TwoByTwo,
    #[value(name = "3x3")]
    #[serde(rename = "3x3")]
    #[strum(to_string = "3x3")]
    #[default]
    ThreeByThree,
    #[value(name = "3x3oh")]
    #[serde(rename = "3x3oh")]
    #[strum(to_string = "3x3 OH")]
    ThreeByThreeOneHanded,
    #[value(name = "pyraminx")]
    #[serde(rename = "pyraminx")]
    #[strum(to_string = "Pyraminx")]
    Pyraminx,
}

impl PuzzleVariant {
    pub const ALL: [PuzzleVariant; 4] = [
        PuzzleVariant::TwoByTwo,
        PuzzleVariant::ThreeByThree,
        PuzzleVariant::ThreeByThreeOneHanded,
        PuzzleVariant::Pyraminx,
    ];

    /// Number of moves in a scramble for this puzzle
    pub fn scramble_length(&self) -> usize {
        match self {
            PuzzleVariant::TwoByTwo => 10,
            PuzzleVariant::ThreeByThree | PuzzleVariant::ThreeByThreeOneHanded => 23,
            PuzzleVariant::Pyraminx => 12,
        }
    }

    /// Stable identifier used for storage keys and exports
    pub fn key(&self) -> &'static str {
        match self {
            PuzzleVariant::TwoByTwo => "2x2",
            PuzzleVariant::ThreeByThree => "3x3",
            PuzzleVariant::ThreeByThreeOneHanded => "3x3oh",
            PuzzleVariant::Pyraminx => "pyraminx",
        }
    }

    /// Next variant in display order, wrapping around
    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|v| v == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}
