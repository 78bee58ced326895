// The L-system: axiom, production table, final table, and the step loop.
//
// `LSystem` owns everything it needs (no process-wide tables): the current
// axiom, the productions keyed by predecessor symbol, the final actions, the
// context-matching settings, the syntax toggles, and its random source.
//
// Step protocol (`apply_productions`):
// 1. Build a `Matcher` from the branch pair and ignored set.
// 2. For every position of the *current* axiom, look up the production for
//    its symbol. No production, or a production that resolves to nothing,
//    keeps the symbol as it is.
// 3. Splice every replacement into a new sequence of the same `AxiomKind`.
// 4. Only when every position resolved without error: swap the new axiom in
//    and bump the generation counter. A failing step leaves both untouched.
//
// Productions and finals may be reconfigured between generations; `&mut
// self` on every mutating call keeps them fixed during a step.

use std::collections::BTreeMap;

use lindenmayer_prng::{RandomSource, SeededRng};
use tracing::{debug, trace};

use crate::classic;
use crate::error::{BoxError, LSystemError, Result};
use crate::finals::{FinalAction, FinalContext};
use crate::matcher::{BranchSymbols, Direction, IgnoredSymbols, MatchResult, Matcher, Pattern};
use crate::production::{self, ProductionContext, Successor};
use crate::resolver::resolve;
use crate::token::{Axiom, AxiomKind};

/// Construction-time settings.
#[derive(Clone, Debug)]
pub struct EngineOptions {
    /// `None` disables branch handling in context matching.
    pub branch_symbols: Option<BranchSymbols>,
    pub ignored_symbols: IgnoredSymbols,
    /// Translate `L<P>R` production keys into guarded productions.
    pub allow_classic_syntax: bool,
    /// Decode `A(1,2)B(3)` string axioms into tokens.
    pub classic_parametric_syntax: bool,
    /// Store string axioms and literal successors as tokens.
    pub force_objects: bool,
    /// Seed for the default random source.
    pub seed: u64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            branch_symbols: Some(BranchSymbols::brackets()),
            ignored_symbols: IgnoredSymbols::default(),
            allow_classic_syntax: true,
            classic_parametric_syntax: false,
            force_objects: false,
            seed: 0,
        }
    }
}

pub struct LSystem {
    axiom: Axiom,
    productions: BTreeMap<String, Successor>,
    finals: BTreeMap<String, FinalAction>,
    options: EngineOptions,
    rng: Box<dyn RandomSource + Send>,
    generation: u64,
}

impl LSystem {
    /// An engine over `axiom` with default options.
    pub fn new(axiom: Axiom) -> Self {
        let mut system = Self::with_options(EngineOptions::default());
        system.set_axiom(axiom);
        system
    }

    /// An engine with an empty plain axiom.
    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            axiom: Axiom::plain(""),
            productions: BTreeMap::new(),
            finals: BTreeMap::new(),
            rng: Box::new(SeededRng::new(options.seed)),
            options,
            generation: 0,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Replace the random source used for stochastic productions.
    pub fn set_random_source(&mut self, rng: impl RandomSource + Send + 'static) {
        self.rng = Box::new(rng);
    }

    // -----------------------------------------------------------------------
    // Axiom
    // -----------------------------------------------------------------------

    pub fn axiom(&self) -> &Axiom {
        &self.axiom
    }

    /// Replace the axiom wholesale.
    pub fn set_axiom(&mut self, axiom: Axiom) {
        self.axiom = axiom;
    }

    /// Replace the axiom from text, honoring the syntax toggles:
    /// `force_objects` gives one token per character,
    /// `classic_parametric_syntax` decodes `A(1,2)` groups, otherwise the
    /// text becomes a plain character axiom.
    pub fn set_axiom_str(&mut self, axiom: &str) -> Result<()> {
        self.axiom = if self.options.classic_parametric_syntax
            && classic::test_parametric_syntax(axiom)
        {
            Axiom::tokens(classic::parse_parametric_axiom(axiom)?)
        } else if self.options.force_objects {
            Axiom::bare_tokens(axiom)
        } else {
            Axiom::plain(axiom)
        };
        Ok(())
    }

    /// The axiom as a string of symbol names (`only_symbols`), or as JSON
    /// including parameters.
    pub fn get_string(&self, only_symbols: bool) -> Result<String> {
        if only_symbols {
            self.axiom.to_symbol_string()
        } else {
            self.axiom.to_json()
        }
    }

    // -----------------------------------------------------------------------
    // Productions
    // -----------------------------------------------------------------------

    /// Register a production for `predecessor`.
    ///
    /// With `allow_classic_syntax`, keys like `B<C>D` register a guarded
    /// production on `C`. With `append`, an existing entry for the same
    /// symbol is kept and the new one is added after it as an ordered
    /// alternative; otherwise it is replaced.
    pub fn set_production(
        &mut self,
        predecessor: &str,
        successor: impl Into<Successor>,
        append: bool,
    ) -> Result<()> {
        let successor = successor.into();
        let (symbol, successor) = if self.options.allow_classic_syntax {
            classic::transform_cs_production(predecessor, successor)?
        } else {
            (predecessor.to_string(), successor)
        };
        if symbol.is_empty() {
            return Err(LSystemError::EmptyPredecessor);
        }
        if let Some(&weight) = successor
            .weights()
            .iter()
            .find(|w| !w.is_finite() || **w < 0.0)
        {
            return Err(LSystemError::InvalidWeight { symbol, weight });
        }
        let successor = if self.options.force_objects {
            successor.into_tokens()
        } else {
            successor
        };

        trace!(symbol = %symbol, append, "registering production");
        let entry = match self.productions.remove(&symbol) {
            Some(existing) if append => production::append(existing, successor),
            _ => successor,
        };
        self.productions.insert(symbol, entry);
        Ok(())
    }

    /// Replace the whole table. Entries are registered in append mode, so
    /// `"B<C>D"` and `"C"` both end up as alternatives for `C`.
    pub fn set_productions<K, S>(&mut self, productions: impl IntoIterator<Item = (K, S)>) -> Result<()>
    where
        K: AsRef<str>,
        S: Into<Successor>,
    {
        self.clear_productions();
        for (predecessor, successor) in productions {
            self.set_production(predecessor.as_ref(), successor, true)?;
        }
        Ok(())
    }

    pub fn clear_productions(&mut self) {
        self.productions.clear();
    }

    pub fn production(&self, symbol: &str) -> Option<&Successor> {
        self.productions.get(symbol)
    }

    // -----------------------------------------------------------------------
    // Finals
    // -----------------------------------------------------------------------

    pub fn set_final(&mut self, symbol: impl Into<String>, action: FinalAction) {
        self.finals.insert(symbol.into(), action);
    }

    /// Replace the whole final table.
    pub fn set_finals<K: Into<String>>(&mut self, finals: impl IntoIterator<Item = (K, FinalAction)>) {
        self.finals.clear();
        for (symbol, action) in finals {
            self.set_final(symbol, action);
        }
    }

    /// Bind a callback to `symbol`, replacing a declared or earlier action.
    pub fn bind_final<F>(&mut self, symbol: impl Into<String>, f: F)
    where
        F: FnMut(&FinalContext<'_>) -> std::result::Result<(), BoxError> + Send + 'static,
    {
        self.set_final(symbol, FinalAction::callback(f));
    }

    /// Symbols whose final action is declared by `name` but still unbound.
    pub fn declared_finals(&self) -> impl Iterator<Item = (&str, &str)> {
        self.finals
            .iter()
            .filter_map(|(symbol, action)| action.declared_name().map(|n| (symbol.as_str(), n)))
    }

    // -----------------------------------------------------------------------
    // Rewriting
    // -----------------------------------------------------------------------

    /// Number of generations applied over the engine's lifetime.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Rewrite every position once, in parallel semantics, and return the
    /// new axiom.
    pub fn apply_productions(&mut self) -> Result<&Axiom> {
        let matcher = Matcher::new(
            self.options.branch_symbols.as_ref(),
            &self.options.ignored_symbols,
        );
        let mut next = Vec::with_capacity(self.axiom.len());

        for (index, part) in self.axiom.symbols().iter().enumerate() {
            let Some(successor) = self.productions.get(part.name().as_ref()) else {
                next.push(part.clone());
                continue;
            };
            let ctx = ProductionContext {
                index,
                axiom: &self.axiom,
                part,
                generation: self.generation,
                matcher,
            };
            match resolve(successor, &ctx, self.rng.as_mut())? {
                Some(replacement) => next.extend(replacement),
                None => next.push(part.clone()),
            }
        }

        debug!(
            generation = self.generation + 1,
            before = self.axiom.len(),
            after = next.len(),
            "applied productions"
        );
        self.axiom = Axiom::from_symbols(self.axiom.kind(), next);
        self.generation += 1;
        Ok(&self.axiom)
    }

    /// Apply `n` generations in sequence.
    pub fn iterate(&mut self, n: usize) -> Result<&Axiom> {
        for _ in 0..n {
            self.apply_productions()?;
        }
        Ok(&self.axiom)
    }

    /// Run the final action of every position, left to right.
    ///
    /// Symbols without an action are skipped. If any symbol in the axiom has
    /// a declared but unbound action, the pass fails with `NotInvocable`
    /// before a single action runs.
    pub fn final_pass(&mut self) -> Result<()> {
        self.check_finals_invocable()?;
        for (index, symbol) in self.axiom.symbols().iter().enumerate() {
            if let Some(FinalAction::Callback(f)) = self.finals.get_mut(symbol.name().as_ref()) {
                f(&FinalContext { index, symbol }).map_err(LSystemError::Callback)?;
            }
        }
        Ok(())
    }

    // First unbound action in axiom order.
    fn check_finals_invocable(&self) -> Result<()> {
        for symbol in self.axiom.symbols() {
            let name = symbol.name();
            if let Some(FinalAction::Declared(action_name)) = self.finals.get(name.as_ref()) {
                return Err(LSystemError::NotInvocable {
                    symbol: name.into_owned(),
                    name: action_name.clone(),
                });
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Matching
    // -----------------------------------------------------------------------

    /// Context-match around `index` of the current axiom with the engine's
    /// branch and ignored-symbol settings.
    pub fn match_context(&self, pattern: &Pattern, direction: Direction, index: usize) -> MatchResult {
        self.matcher().scan(self.axiom.symbols(), pattern, direction, index)
    }

    /// The engine's matching settings, for probing other sequences or
    /// overriding the ignored set.
    pub fn matcher(&self) -> Matcher<'_> {
        Matcher::new(
            self.options.branch_symbols.as_ref(),
            &self.options.ignored_symbols,
        )
    }

    pub fn axiom_kind(&self) -> AxiomKind {
        self.axiom.kind()
    }
}

impl std::fmt::Debug for LSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LSystem")
            .field("axiom", &self.axiom)
            .field("productions", &self.productions)
            .field("finals", &self.finals)
            .field("options", &self.options)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
