// Production resolution for a single axiom position.
//
// `resolve()` walks a `Successor` tree and returns the replacement symbols,
// or `None` when nothing applies (a guard vetoed, a callback declined, or no
// alternative was accepted). The engine turns a top-level `None` into the
// identity rewrite, so a symbol is never dropped by accident.
//
// Weighted alternatives draw exactly one value per evaluation from the
// caller's `RandomSource`, scaled by the weight sum. Candidates are walked in
// registration order with a running weight total; the first candidate whose
// total reaches the draw *and* whose own guards pass is taken. A guard
// failure past the threshold falls through to the next candidate.
//
// The resolver only reads the axiom and production table.

use lindenmayer_prng::RandomSource;
use tracing::{debug, trace};

use crate::error::{LSystemError, Result};
use crate::matcher::Direction;
use crate::production::{Alternatives, Guarded, ProductionContext, Successor};
use crate::token::Symbol;

/// Replacement for `ctx.part`, or `None` when no successor applies.
pub fn resolve(
    successor: &Successor,
    ctx: &ProductionContext<'_>,
    rng: &mut dyn RandomSource,
) -> Result<Option<Vec<Symbol>>> {
    match successor {
        Successor::Literal(symbols) => Ok(Some(symbols.clone())),
        Successor::Function(f) => f(ctx).map_err(LSystemError::Callback),
        Successor::Guarded(g) => resolve_guarded(g, ctx, rng),
        Successor::Alternatives(alts) => resolve_alternatives(alts, ctx, rng),
    }
}

/// Whether `g`'s condition and contexts all accept the current position.
///
/// Both context checks use the same ignored-symbol set as the engine.
pub fn guards_pass(g: &Guarded, ctx: &ProductionContext<'_>) -> Result<bool> {
    let condition_ok = match &g.condition {
        Some(condition) => condition(ctx).map_err(LSystemError::Callback)?,
        None => true,
    };
    if !condition_ok {
        return Ok(false);
    }
    let left_ok = g
        .left_ctx
        .as_ref()
        .is_none_or(|p| ctx.matches(p, Direction::Left).matched);
    let right_ok = left_ok
        && g.right_ctx
            .as_ref()
            .is_none_or(|p| ctx.matches(p, Direction::Right).matched);
    Ok(right_ok)
}

fn resolve_guarded(
    g: &Guarded,
    ctx: &ProductionContext<'_>,
    rng: &mut dyn RandomSource,
) -> Result<Option<Vec<Symbol>>> {
    if !guards_pass(g, ctx)? {
        return Ok(None);
    }
    resolve(&g.successor, ctx, rng)
}

fn resolve_alternatives(
    alts: &Alternatives,
    ctx: &ProductionContext<'_>,
    rng: &mut dyn RandomSource,
) -> Result<Option<Vec<Symbol>>> {
    let threshold = if alts.is_stochastic() {
        let draw = rng.next_f64() * alts.weight_sum();
        trace!(index = ctx.index, draw, total = alts.weight_sum(), "stochastic draw");
        Some(draw)
    } else {
        None
    };

    let mut cumulative = 0.0;
    for candidate in alts.candidates() {
        if let Some(threshold) = threshold {
            cumulative += candidate.weight.unwrap_or(1.0);
            if cumulative < threshold {
                continue;
            }
        }
        if let Some(out) = resolve_guarded(candidate, ctx, rng)? {
            return Ok(Some(out));
        }
    }

    if threshold.is_some() {
        debug!(index = ctx.index, symbol = %ctx.part.name(), "no stochastic candidate accepted");
    }
    Ok(None)
}
