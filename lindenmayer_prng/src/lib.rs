// Random sources for stochastic productions.
//
// The rewrite engine never reaches for a global generator: it owns a boxed
// `RandomSource` and draws exactly one value per stochastic production
// evaluated. Two implementations live here:
// - `SeededRng`: xoshiro256++ (Blackman & Vigna, 2019) expanded from a `u64`
//   seed with SplitMix64. The default source for every engine.
// - `ScriptedSource`: replays a fixed list of draws, cycling. Used by tests
//   that need a specific stochastic branch to be picked.
//
// **Critical constraint: determinism.** Given the same seed, `SeededRng`
// yields the same stream on every platform and optimization level. The core
// generator uses integer arithmetic only; the float conversion is a single
// exact division by a power of two.

use serde::{Deserialize, Serialize};

/// Uniform source of draws in `[0, 1)`.
///
/// Implement this to plug a custom generator into the engine (for example
/// one shared with a renderer so a whole scene replays from one seed).
pub trait RandomSource {
    /// Next uniform value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;
}

/// Xoshiro256++ PRNG seeded from a single `u64`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeededRng {
    s: [u64; 4],
}

impl SeededRng {
    /// Create a generator from `seed`.
    ///
    /// Two generators created with the same seed produce identical
    /// sequences.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Next raw `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }
}

impl RandomSource for SeededRng {
    /// Upper 53 bits of the next `u64`, scaled into `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Replays a fixed script of draws, wrapping around at the end.
///
/// Values are clamped into `[0, 1)` on construction so a script can never
/// push a stochastic pick past the last candidate.
#[derive(Clone, Debug)]
pub struct ScriptedSource {
    draws: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    /// Panics if `draws` is empty.
    pub fn new(draws: Vec<f64>) -> Self {
        assert!(!draws.is_empty(), "ScriptedSource needs at least one draw");
        let draws = draws
            .into_iter()
            .map(|d| d.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        Self { draws, cursor: 0 }
    }

    /// Number of draws handed out so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedSource {
    fn next_f64(&mut self) -> f64 {
        let value = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        value
    }
}

/// SplitMix64, used only to expand the seed into xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
