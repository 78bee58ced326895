// Production entries: what a symbol rewrites to.
//
// A `Successor` is a tagged union chosen once, when the production is built:
// - `Literal`: a fixed sequence of symbols (a single symbol is a one-element
//   sequence; an empty one erases the predecessor).
// - `Function`: a user callback producing symbols from a `ProductionContext`.
// - `Guarded`: a condition and/or left/right context wrapped around an inner
//   successor.
// - `Alternatives`: an ordered list of guarded candidates, optionally
//   weighted for stochastic choice.
//
// Entries nest freely, so an alternative may itself be guarded or hold
// further alternatives. Evaluation lives in `resolver.rs`.
//
// Callbacks are `Arc`ed so productions can be cloned into several tables,
// and `Send + Sync` so an engine can be handed to another thread between
// generations.

use std::fmt;
use std::sync::Arc;

use crate::error::BoxError;
use crate::matcher::{Direction, MatchResult, Matcher, Pattern};
use crate::token::{Axiom, Symbol, Token, chars};

/// Successor callback. `Ok(None)` means "no result": the symbol is left
/// unchanged (or, inside alternatives, the next candidate is tried).
pub type SuccessorFn =
    Arc<dyn Fn(&ProductionContext<'_>) -> Result<Option<Vec<Symbol>>, BoxError> + Send + Sync>;

/// Guard callback.
pub type ConditionFn = Arc<dyn Fn(&ProductionContext<'_>) -> Result<bool, BoxError> + Send + Sync>;

/// What a guard or successor callback gets to see.
///
/// `axiom` is always the pre-step axiom: positions refer to the generation
/// being rewritten, never to the one under construction.
pub struct ProductionContext<'a> {
    pub index: usize,
    pub axiom: &'a Axiom,
    /// The symbol being rewritten (`axiom[index]`).
    pub part: &'a Symbol,
    /// Number of generations the engine has completed so far.
    pub generation: u64,
    pub matcher: Matcher<'a>,
}

impl ProductionContext<'_> {
    /// Parameters of the symbol being rewritten.
    pub fn params(&self) -> &[f64] {
        self.part.params()
    }

    /// Context-match around the current position with the engine's branch
    /// and ignored-symbol settings.
    pub fn matches(&self, pattern: &Pattern, direction: Direction) -> MatchResult {
        self.matcher
            .scan(self.axiom.symbols(), pattern, direction, self.index)
    }
}

#[derive(Clone)]
pub enum Successor {
    Literal(Vec<Symbol>),
    Function(SuccessorFn),
    Guarded(Box<Guarded>),
    Alternatives(Alternatives),
}

impl Successor {
    /// A literal of bare characters: `Successor::literal("F+F")`.
    pub fn literal(s: &str) -> Self {
        Successor::Literal(chars(s))
    }

    pub fn tokens(tokens: Vec<Token>) -> Self {
        Successor::Literal(tokens.into_iter().map(Symbol::Token).collect())
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&ProductionContext<'_>) -> Result<Option<Vec<Symbol>>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        Successor::Function(Arc::new(f))
    }

    /// First candidate that yields a result wins.
    pub fn ordered(candidates: Vec<Guarded>) -> Self {
        Successor::Alternatives(Alternatives::ordered(candidates))
    }

    /// Weighted random choice; candidates without a weight count as 1.
    pub fn weighted(candidates: Vec<Guarded>) -> Self {
        Successor::Alternatives(Alternatives::weighted(candidates))
    }

    /// Turn every bare character in literals into a parameterless token.
    pub(crate) fn into_tokens(self) -> Self {
        match self {
            Successor::Literal(symbols) => Successor::Literal(
                symbols
                    .into_iter()
                    .map(|s| Symbol::Token(s.into_token()))
                    .collect(),
            ),
            Successor::Function(f) => Successor::Function(f),
            Successor::Guarded(mut g) => {
                g.successor = g.successor.into_tokens();
                Successor::Guarded(g)
            }
            Successor::Alternatives(mut alts) => {
                alts.candidates = alts
                    .candidates
                    .into_iter()
                    .map(|mut g| {
                        g.successor = g.successor.into_tokens();
                        g
                    })
                    .collect();
                Successor::Alternatives(alts)
            }
        }
    }

    /// Every explicit weight anywhere in this entry.
    pub(crate) fn weights(&self) -> Vec<f64> {
        let mut out = Vec::new();
        self.collect_weights(&mut out);
        out
    }

    fn collect_weights(&self, out: &mut Vec<f64>) {
        match self {
            Successor::Literal(_) | Successor::Function(_) => {}
            Successor::Guarded(g) => {
                out.extend(g.weight);
                g.successor.collect_weights(out);
            }
            Successor::Alternatives(alts) => {
                for g in &alts.candidates {
                    out.extend(g.weight);
                    g.successor.collect_weights(out);
                }
            }
        }
    }
}

impl From<&str> for Successor {
    fn from(s: &str) -> Self {
        Successor::literal(s)
    }
}

impl From<Vec<Symbol>> for Successor {
    fn from(symbols: Vec<Symbol>) -> Self {
        Successor::Literal(symbols)
    }
}

impl From<Guarded> for Successor {
    fn from(g: Guarded) -> Self {
        Successor::Guarded(Box::new(g))
    }
}

impl fmt::Debug for Successor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Successor::Literal(symbols) => f.debug_tuple("Literal").field(symbols).finish(),
            Successor::Function(_) => f.write_str("Function(..)"),
            Successor::Guarded(g) => f.debug_tuple("Guarded").field(g).finish(),
            Successor::Alternatives(a) => f.debug_tuple("Alternatives").field(a).finish(),
        }
    }
}

/// A successor that only applies when its guards pass.
///
/// Guards are checked in order: `condition` first, then left context, then
/// right context. `weight` is only read when this entry is a candidate of a
/// weighted `Alternatives`.
#[derive(Clone)]
pub struct Guarded {
    pub condition: Option<ConditionFn>,
    pub left_ctx: Option<Pattern>,
    pub right_ctx: Option<Pattern>,
    pub weight: Option<f64>,
    pub successor: Successor,
}

impl Guarded {
    pub fn new(successor: impl Into<Successor>) -> Self {
        Self {
            condition: None,
            left_ctx: None,
            right_ctx: None,
            weight: None,
            successor: successor.into(),
        }
    }

    pub fn when<F>(mut self, condition: F) -> Self
    where
        F: Fn(&ProductionContext<'_>) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    pub fn left(mut self, pattern: impl Into<Pattern>) -> Self {
        self.left_ctx = Some(pattern.into());
        self
    }

    pub fn right(mut self, pattern: impl Into<Pattern>) -> Self {
        self.right_ctx = Some(pattern.into());
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Unwrap a guarded successor, or wrap any other kind without guards.
    pub fn from_successor(successor: Successor) -> Self {
        match successor {
            Successor::Guarded(g) => *g,
            other => Guarded::new(other),
        }
    }
}

impl fmt::Debug for Guarded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guarded")
            .field("condition", &self.condition.as_ref().map(|_| ".."))
            .field("left_ctx", &self.left_ctx)
            .field("right_ctx", &self.right_ctx)
            .field("weight", &self.weight)
            .field("successor", &self.successor)
            .finish()
    }
}

/// Candidate list for one symbol.
#[derive(Clone, Debug)]
pub struct Alternatives {
    candidates: Vec<Guarded>,
    stochastic: bool,
    weight_sum: f64,
}

impl Alternatives {
    pub fn ordered(candidates: Vec<Guarded>) -> Self {
        Self {
            candidates,
            stochastic: false,
            weight_sum: 0.0,
        }
    }

    pub fn weighted(candidates: Vec<Guarded>) -> Self {
        let mut alts = Self {
            candidates,
            stochastic: true,
            weight_sum: 0.0,
        };
        alts.recompute_weight_sum();
        alts
    }

    pub fn candidates(&self) -> &[Guarded] {
        &self.candidates
    }

    pub fn is_stochastic(&self) -> bool {
        self.stochastic
    }

    pub fn weight_sum(&self) -> f64 {
        self.weight_sum
    }

    /// Append a candidate, keeping the list's mode.
    pub fn push(&mut self, candidate: Guarded) {
        self.candidates.push(candidate);
        if self.stochastic {
            self.recompute_weight_sum();
        }
    }

    // Summed in candidate order so the resolver's running total lands on
    // exactly the same value at the last candidate.
    fn recompute_weight_sum(&mut self) {
        self.weight_sum = self
            .candidates
            .iter()
            .fold(0.0, |acc, c| acc + c.weight.unwrap_or(1.0));
    }
}

/// Merge `addition` into an existing table entry (append mode).
///
/// An existing ordered list grows by one. Any other entry, a weighted list
/// included, becomes the first candidate of a new ordered list, so its own
/// distribution is left as it was.
pub(crate) fn append(existing: Successor, addition: Successor) -> Successor {
    let addition = Guarded::from_successor(addition);
    match existing {
        Successor::Alternatives(mut alts) if !alts.is_stochastic() => {
            alts.push(addition);
            Successor::Alternatives(alts)
        }
        other => Successor::ordered(vec![Guarded::from_successor(other), addition]),
    }
}
