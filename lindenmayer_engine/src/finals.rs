// Final actions: the terminal, side-effecting pass after rewriting.
//
// After the last generation, a renderer walks the axiom once, left to right,
// and runs the action registered for each symbol (draw a segment, turn,
// push/pop a turtle state, ...). The engine does not know what the actions
// do; it only dispatches them.
//
// Actions may be declared by name before a callback exists (system
// descriptions are plain JSON and cannot carry code). Dispatching a declared
// but unbound action is a configuration error raised at that position.

use std::fmt;

use crate::error::BoxError;
use crate::token::Symbol;

/// What a final action gets to see.
#[derive(Debug)]
pub struct FinalContext<'a> {
    pub index: usize,
    pub symbol: &'a Symbol,
}

pub type FinalFn = Box<dyn FnMut(&FinalContext<'_>) -> Result<(), BoxError> + Send>;

pub enum FinalAction {
    Callback(FinalFn),
    /// Named in a system description, not yet bound to a callback.
    Declared(String),
}

impl FinalAction {
    pub fn callback<F>(f: F) -> Self
    where
        F: FnMut(&FinalContext<'_>) -> Result<(), BoxError> + Send + 'static,
    {
        FinalAction::Callback(Box::new(f))
    }

    /// The declared name, if this action is still unbound.
    pub fn declared_name(&self) -> Option<&str> {
        match self {
            FinalAction::Declared(name) => Some(name),
            FinalAction::Callback(_) => None,
        }
    }
}

impl fmt::Debug for FinalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalAction::Callback(_) => f.write_str("Callback(..)"),
            FinalAction::Declared(name) => f.debug_tuple("Declared").field(name).finish(),
        }
    }
}
