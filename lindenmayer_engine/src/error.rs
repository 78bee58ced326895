// Error type shared by every engine operation.
//
// Configuration mistakes (bad direction strings, unbound final actions,
// unreadable classic syntax, malformed JSON) fail at the call that made them.
// Errors raised inside user guards, successors, and final actions travel
// through `Callback` untouched so callers can downcast to their own type.

use thiserror::Error;

/// Error type user callbacks return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum LSystemError {
    /// A direction string other than `left` or `right`.
    #[error("'{0}' is not a valid direction for matching (expected 'left' or 'right')")]
    InvalidDirection(String),

    /// A token axiom holds a bare character, so it has no symbol field to
    /// render.
    #[error(
        "axiom position {index} is a bare character inside a token axiom; \
         productions on token axioms must return tokens"
    )]
    MissingSymbol { index: usize },

    /// A final action was declared by name but never bound to a callback.
    #[error("final action '{name}' for symbol '{symbol}' is declared but not invocable")]
    NotInvocable { symbol: String, name: String },

    #[error("production has an empty predecessor")]
    EmptyPredecessor,

    #[error("cannot read classic syntax '{input}': {reason}")]
    ClassicSyntax { input: String, reason: String },

    #[error("weight {weight} on a stochastic successor of '{symbol}' must be finite and non-negative")]
    InvalidWeight { symbol: String, weight: f64 },

    #[error("invalid system description: {0}")]
    InvalidConfig(String),

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),

    /// Raised by a user-supplied guard, successor, or final action.
    #[error(transparent)]
    Callback(BoxError),

    #[error("malformed system description: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LSystemError>;
