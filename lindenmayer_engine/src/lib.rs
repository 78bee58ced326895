// Lindenmayer-system rewriting engine.
//
// Rewrites an axiom (a sequence of bare characters or parametric tokens)
// through a table of productions, one generation at a time, then runs a
// final pass of per-symbol actions over the result. Supports deterministic,
// context-sensitive (branch-aware), stochastic, and parametric systems.
//
// Architecture:
// - `token.rs`: `Symbol`, `Token`, `Axiom` and its representation kind
// - `matcher.rs`: branch-aware left/right context matching
// - `production.rs`: the `Successor` union and its guarded/alternative forms
// - `resolver.rs`: evaluates a successor at one position
// - `engine.rs`: `LSystem`, the tables and the generation step
// - `finals.rs`: final actions for the terminal pass
// - `classic.rs`: helpers for classic `L<P>R` and `A(1,2)` notation
// - `config.rs` / `presets.rs`: JSON system descriptions and embedded presets
// - `error.rs`: `LSystemError`
//
// Determinism: the only randomness is the engine's `RandomSource`
// (`lindenmayer_prng`), seeded from the configuration. Same seed, same
// productions, same output.

pub mod classic;
pub mod config;
pub mod engine;
pub mod error;
pub mod finals;
pub mod matcher;
pub mod presets;
pub mod production;
pub mod resolver;
pub mod token;

pub use config::{
    AxiomConfig, ContextConfig, LiteralConfig, RuleConfig, SuccessorConfig, SystemConfig,
};
pub use engine::{EngineOptions, LSystem};
pub use error::{BoxError, LSystemError, Result};
pub use finals::{FinalAction, FinalContext};
pub use matcher::{BranchSymbols, Direction, IgnoredSymbols, MatchResult, Matcher, Pattern};
pub use production::{Alternatives, Guarded, ProductionContext, Successor};
pub use token::{Axiom, AxiomKind, Symbol, Token};

pub use lindenmayer_prng::{RandomSource, ScriptedSource, SeededRng};
