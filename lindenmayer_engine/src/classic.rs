// Classic (ABOP) notation helpers.
//
// The engine itself only consumes structured productions and axioms. These
// pure functions translate the textual conventions of "The Algorithmic
// Beauty of Plants" into those structures:
// - `L<P>R` context-sensitive production keys,
// - `A(1,2)B(3)` parametric axioms,
// - lists of equally likely successors.
//
// The engine calls `transform_cs_production` when `allow_classic_syntax` is
// on and `parse_parametric_axiom` when `classic_parametric_syntax` is on;
// both are also usable on their own.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{LSystemError, Result};
use crate::matcher::Pattern;
use crate::production::{Guarded, Successor};
use crate::token::Token;

static LEFT_CONTEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(.+)<(.)").unwrap());
static RIGHT_CONTEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(.)>(.+)").unwrap());
static PARAMETER_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.+\)").unwrap());
static PARAMETRIC_SYMBOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([^(),])(?:\(([^()]*)\))?").unwrap());

/// Split a classic context-sensitive key into its predecessor and a guarded
/// successor.
///
/// `"B<C>D"` becomes `("C", Guarded { left_ctx: "B", right_ctx: "D", .. })`.
/// Keys without `<` or `>` context markers come back unchanged. If
/// `successor` is already guarded, its condition and weight are kept and the
/// contexts are filled in.
pub fn transform_cs_production(key: &str, successor: Successor) -> Result<(String, Successor)> {
    let left = LEFT_CONTEXT.captures(key);
    let right = RIGHT_CONTEXT.captures(key);
    if left.is_none() && right.is_none() {
        return Ok((key.to_string(), successor));
    }

    let mut guarded = Guarded::from_successor(successor);
    let mut predecessor: Option<&str> = None;

    if let Some(caps) = &left {
        predecessor = caps.get(2).map(|m| m.as_str());
        guarded.left_ctx = caps.get(1).map(|m| Pattern::from(m.as_str()));
    }
    if let Some(caps) = &right {
        let strict = caps.get(1).map(|m| m.as_str());
        if predecessor.is_some() && predecessor != strict {
            return Err(LSystemError::ClassicSyntax {
                input: key.to_string(),
                reason: "left and right context disagree on the predecessor".to_string(),
            });
        }
        predecessor = strict;
        guarded.right_ctx = caps.get(2).map(|m| Pattern::from(m.as_str()));
    }

    match predecessor {
        Some(p) => Ok((p.to_string(), guarded.into())),
        None => Err(LSystemError::EmptyPredecessor),
    }
}

/// Whether `axiom` uses parenthesised parameter groups.
pub fn test_parametric_syntax(axiom: &str) -> bool {
    PARAMETER_GROUP.is_match(axiom)
}

/// Decode `A(1,2)B(3)` into tokens. Whitespace is ignored; a symbol without
/// a parameter group gets no parameters.
pub fn parse_parametric_axiom(axiom: &str) -> Result<Vec<Token>> {
    let compact: String = axiom.chars().filter(|c| !c.is_whitespace()).collect();
    let syntax_error = |reason: String| LSystemError::ClassicSyntax {
        input: axiom.to_string(),
        reason,
    };

    let mut tokens = Vec::new();
    let mut offset = 0;
    for caps in PARAMETRIC_SYMBOL.captures_iter(&compact) {
        let (Some(whole), Some(symbol)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() != offset {
            return Err(syntax_error(format!(
                "unexpected '{}'",
                &compact[offset..whole.start()]
            )));
        }
        offset = whole.end();

        let params = match caps.get(2) {
            Some(group) => parse_params(group.as_str()).map_err(syntax_error)?,
            None => Vec::new(),
        };
        tokens.push(Token::new(symbol.as_str(), params));
    }

    if offset != compact.len() {
        return Err(syntax_error(format!("unexpected '{}'", &compact[offset..])));
    }
    Ok(tokens)
}

fn parse_params(group: &str) -> std::result::Result<Vec<f64>, String> {
    if group.is_empty() {
        return Ok(Vec::new());
    }
    group
        .split(',')
        .map(|p| {
            p.parse::<f64>()
                .map_err(|_| format!("'{p}' is not a number"))
        })
        .collect()
}

/// Equally likely choice between `successors`.
pub fn stochastic_productions(successors: Vec<Successor>) -> Successor {
    Successor::weighted(
        successors
            .into_iter()
            .map(|s| Guarded::from_successor(s).weight(1.0))
            .collect(),
    )
}
