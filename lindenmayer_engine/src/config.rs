// Data-driven system descriptions.
//
// A whole L-system (axiom, productions, final action names, matching
// settings, syntax toggles, seed, iteration count) can be described in JSON
// and loaded with `SystemConfig::from_json`, then turned into a running
// engine with `LSystem::from_config`. Every field has a default, so
// `{"axiom": "F", "productions": {"F": "F+F"}}` is a complete description.
//
// Successor descriptions are untagged:
// - `"F+F"`: a literal.
// - `["F[+F]F", "F[-F]F"]`: equally likely stochastic choice.
// - `{"successor": "Z", "left_ctx": "B", "right_ctx": "D", "weight": 2}`:
//   a guarded rule; `"successors": [...]` instead of `"successor"` nests a
//   candidate list, weighted when every entry carries a weight and ordered
//   otherwise.
//
// Productions keep document order: `set_productions` registers them in
// append mode, so `{"C>D": "Z", "C": "Y"}` tries the context rule first.
//
// Contexts are a string (one symbol per character) or a list of symbol
// names for token systems: `"left_ctx": ["stem", "node"]`.
//
// Final actions cannot be code in JSON, so `finals` maps symbols to action
// names that are registered as `FinalAction::Declared` and bound later.
//
// See also: `presets.rs` for the descriptions embedded from `data/`.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::classic;
use crate::engine::{EngineOptions, LSystem};
use crate::error::{LSystemError, Result};
use crate::finals::FinalAction;
use crate::matcher::{BranchSymbols, IgnoredSymbols, Pattern};
use crate::production::{Guarded, Successor};
use crate::token::{Axiom, Symbol, Token};

/// A complete, serializable L-system description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub axiom: AxiomConfig,
    /// Predecessor key (classic `L<P>R` keys allowed) to successor, in
    /// registration order.
    pub productions: IndexMap<String, SuccessorConfig>,
    /// Symbol to final action name.
    pub finals: BTreeMap<String, String>,
    /// Two-character delimiter pair. `null`, or anything that is not exactly
    /// two characters, disables branch handling.
    pub branch_symbols: Option<String>,
    /// One ignored symbol per character.
    pub ignored_symbols: String,
    pub allow_classic_syntax: bool,
    pub classic_parametric_syntax: bool,
    pub force_objects: bool,
    pub seed: u64,
    /// Generations a runner should apply; the engine itself does not read
    /// this.
    pub iterations: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            axiom: AxiomConfig::Text(String::new()),
            productions: IndexMap::new(),
            finals: BTreeMap::new(),
            branch_symbols: Some("[]".to_string()),
            ignored_symbols: String::new(),
            allow_classic_syntax: true,
            classic_parametric_syntax: false,
            force_objects: false,
            seed: 0,
            iterations: 1,
        }
    }
}

impl SystemConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Engine options derived from this description.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            branch_symbols: self.branch_symbols.as_deref().and_then(BranchSymbols::parse),
            ignored_symbols: IgnoredSymbols::from_chars(&self.ignored_symbols),
            allow_classic_syntax: self.allow_classic_syntax,
            classic_parametric_syntax: self.classic_parametric_syntax,
            force_objects: self.force_objects,
            seed: self.seed,
        }
    }
}

/// The axiom as text (subject to the syntax toggles) or as explicit tokens.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxiomConfig {
    Text(String),
    Tokens(Vec<Token>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SuccessorConfig {
    Literal(String),
    Stochastic(Vec<String>),
    Rule(RuleConfig),
}

/// A successor that is either text or an explicit symbol list
/// (`["F", {"symbol": "A", "params": [1]}]`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralConfig {
    Text(String),
    Symbols(Vec<Symbol>),
}

/// A context pattern: `"BC"` (one symbol per character) or
/// `["stem", "node"]` (one symbol per entry).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextConfig {
    Chars(String),
    Names(Vec<String>),
}

impl ContextConfig {
    pub fn to_pattern(&self) -> Pattern {
        match self {
            ContextConfig::Chars(text) => Pattern::from(text.as_str()),
            ContextConfig::Names(names) => Pattern::from_names(names.iter().cloned()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successor: Option<LiteralConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub successors: Vec<SuccessorConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_ctx: Option<ContextConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_ctx: Option<ContextConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl SuccessorConfig {
    pub fn to_successor(&self) -> Result<Successor> {
        match self {
            SuccessorConfig::Literal(text) => Ok(Successor::literal(text)),
            SuccessorConfig::Stochastic(list) => {
                if list.is_empty() {
                    return Err(LSystemError::InvalidConfig(
                        "stochastic successor list is empty".to_string(),
                    ));
                }
                Ok(classic::stochastic_productions(
                    list.iter().map(|s| Successor::literal(s.as_str())).collect(),
                ))
            }
            SuccessorConfig::Rule(rule) => rule.to_successor(),
        }
    }
}

impl RuleConfig {
    pub fn to_successor(&self) -> Result<Successor> {
        let inner = match (&self.successor, self.successors.is_empty()) {
            (Some(LiteralConfig::Text(text)), true) => Successor::literal(text),
            (Some(LiteralConfig::Symbols(symbols)), true) => Successor::Literal(symbols.clone()),
            (None, false) => {
                let candidates = self
                    .successors
                    .iter()
                    .map(|s| s.to_successor().map(Guarded::from_successor))
                    .collect::<Result<Vec<_>>>()?;
                if candidates.iter().all(|c| c.weight.is_some()) {
                    Successor::weighted(candidates)
                } else {
                    Successor::ordered(candidates)
                }
            }
            (Some(_), false) => {
                return Err(LSystemError::InvalidConfig(
                    "rule has both 'successor' and 'successors'".to_string(),
                ));
            }
            (None, true) => {
                return Err(LSystemError::InvalidConfig(
                    "rule has neither 'successor' nor 'successors'".to_string(),
                ));
            }
        };

        if self.left_ctx.is_none() && self.right_ctx.is_none() && self.weight.is_none() {
            return Ok(inner);
        }
        Ok(Guarded {
            condition: None,
            left_ctx: self.left_ctx.as_ref().map(ContextConfig::to_pattern),
            right_ctx: self.right_ctx.as_ref().map(ContextConfig::to_pattern),
            weight: self.weight,
            successor: inner,
        }
        .into())
    }
}

impl LSystem {
    /// Build an engine from a description: options, axiom, productions, and
    /// declared finals.
    pub fn from_config(config: &SystemConfig) -> Result<Self> {
        let mut system = LSystem::with_options(config.engine_options());
        match &config.axiom {
            AxiomConfig::Text(text) => system.set_axiom_str(text)?,
            AxiomConfig::Tokens(tokens) => system.set_axiom(Axiom::tokens(tokens.clone())),
        }
        let productions = config
            .productions
            .iter()
            .map(|(key, succ)| succ.to_successor().map(|s| (key.as_str(), s)))
            .collect::<Result<Vec<_>>>()?;
        system.set_productions(productions)?;
        system.set_finals(
            config
                .finals
                .iter()
                .map(|(symbol, name)| (symbol.clone(), FinalAction::Declared(name.clone()))),
        );
        Ok(system)
    }
}
