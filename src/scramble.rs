use crate::puzzle::PuzzleVariant;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Six faces, each clockwise and counterclockwise
pub const MOVES: [&str; 12] = [
    "R", "R'", "L", "L'", "U", "U'", "D", "D'", "F", "F'", "B", "B'",
];

/// Produces random move sequences for each puzzle variant.
///
/// Moves are drawn independently, so repeats and cancelling pairs are allowed.
#[derive(Debug)]
pub struct Scrambler {
    rng: StdRng,
}

impl Scrambler {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator, for tests and reproducible sessions
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn generate(&mut self, variant: PuzzleVariant) -> String {
        self.generate_len(variant.scramble_length())
    }

    pub fn generate_len(&mut self, length: usize) -> String {
        (0..length)
            .filter_map(|_| MOVES.choose(&mut self.rng).copied())
            .collect::<Vec<&str>>()
            .join(" ")
    }
}

impl Default for Scrambler {
    fn default() -> Self {
        Self::new()
    }
}
