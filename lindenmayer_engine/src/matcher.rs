// Branch-aware context matching.
//
// Context-sensitive productions ask whether the neighbourhood of a position
// looks like a pattern, reading either forwards (right context) or backwards
// (left context) from it. Two things make this more than a substring test:
//
// - Branches. Text between a branch-open and branch-close delimiter is a side
//   branch. A branch the pattern does not mention is skipped wholesale, so
//   `A[B]C` has `C` as the right neighbour of `A`. A pattern that spells out
//   delimiters (`[B]C`) walks into the branch explicitly instead.
// - Ignored symbols (typically turtle commands like `+` and `-`) are stepped
//   over as if they were not there.
//
// Two depth counters drive the scan: `branch_count` tracks every branch
// entered, `explicit_count` only those entered because the pattern asked for
// them. Reading backwards swaps the roles of the two delimiters.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LSystemError;
use crate::token::Symbol;

/// Which way to read from the position being matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Backwards from `index - 1`, consuming the pattern right to left.
    Left,
    /// Forwards from `index + 1`, consuming the pattern left to right.
    Right,
}

impl FromStr for Direction {
    type Err = LSystemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(LSystemError::InvalidDirection(other.to_string())),
        }
    }
}

/// An (open, close) delimiter pair marking side branches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchSymbols {
    pub open: String,
    pub close: String,
}

impl BranchSymbols {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// The usual `[` / `]` pair.
    pub fn brackets() -> Self {
        Self::new("[", "]")
    }

    /// Read a two-character string such as `"[]"`.
    ///
    /// Anything other than exactly two characters yields `None`: branch
    /// handling is only active with a complete pair.
    pub fn parse(s: &str) -> Option<Self> {
        let mut it = s.chars();
        match (it.next(), it.next(), it.next()) {
            (Some(open), Some(close), None) => Some(Self::new(open, close)),
            _ => None,
        }
    }
}

/// Symbols stepped over during context matching.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IgnoredSymbols(BTreeSet<String>);

impl IgnoredSymbols {
    /// One ignored symbol per character, e.g. `"+-F"`.
    pub fn from_chars(s: &str) -> Self {
        Self(s.chars().map(|c| c.to_string()).collect())
    }

    pub fn insert(&mut self, symbol: impl Into<String>) {
        self.0.insert(symbol.into());
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.0.contains(symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for IgnoredSymbols {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// A context pattern: an ordered list of symbol names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern(Vec<String>);

impl Pattern {
    /// A pattern of multi-character symbol names (for token systems).
    pub fn from_names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

/// One symbol per character: `Pattern::from("DE")` is `["D", "E"]`.
impl From<&str> for Pattern {
    fn from(s: &str) -> Self {
        Self(s.chars().map(|c| c.to_string()).collect())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub matched: bool,
    /// Axiom positions that matched ordinary pattern symbols, in scan order.
    /// Delimiters consumed by an explicit branch are not listed.
    pub indices: Vec<usize>,
}

/// Matching settings: the branch pair and the ignored set.
///
/// Cheap to copy; the engine builds one per generation and every production
/// context carries it.
#[derive(Clone, Copy, Debug)]
pub struct Matcher<'a> {
    branches: Option<&'a BranchSymbols>,
    ignored: &'a IgnoredSymbols,
}

impl<'a> Matcher<'a> {
    pub fn new(branches: Option<&'a BranchSymbols>, ignored: &'a IgnoredSymbols) -> Self {
        Self { branches, ignored }
    }

    /// The same settings with a different ignored set.
    pub fn with_ignored(self, ignored: &'a IgnoredSymbols) -> Self {
        Self { ignored, ..self }
    }

    /// Check whether the context of `axiom[index]` in `direction` matches
    /// `pattern`. An empty pattern always matches.
    pub fn scan(
        &self,
        axiom: &[Symbol],
        pattern: &Pattern,
        direction: Direction,
        index: usize,
    ) -> MatchResult {
        let mut indices = Vec::new();
        if pattern.is_empty() {
            return MatchResult {
                matched: true,
                indices,
            };
        }

        let (open, close) = match self.branches {
            Some(b) => (Some(b.open.as_str()), Some(b.close.as_str())),
            None => (None, None),
        };
        let (step, branch_start, branch_end, mut cursor, overflow): (isize, _, _, isize, isize) =
            match direction {
                Direction::Right => (1, open, close, 0, pattern.len() as isize),
                Direction::Left => (-1, close, open, pattern.len() as isize - 1, -1),
            };

        let mut branch_count = 0usize;
        let mut explicit_count = 0usize;
        let mut pos = index as isize + step;

        while pos >= 0 && (pos as usize) < axiom.len() {
            let symbol = &axiom[pos as usize];
            let wanted = pattern.0[cursor as usize].as_str();
            let opens = branch_start.is_some_and(|b| symbol.is(b));
            let closes = branch_end.is_some_and(|b| symbol.is(b));

            if symbol.is(wanted) {
                if branch_count == 0 || explicit_count > 0 {
                    if opens {
                        explicit_count += 1;
                        branch_count += 1;
                        cursor += step;
                    } else if closes {
                        explicit_count = explicit_count.saturating_sub(1);
                        branch_count = branch_count.saturating_sub(1);
                        // The pattern's close delimiter is only consumed once
                        // every nested branch inside it has closed too.
                        if explicit_count == 0 {
                            cursor += step;
                        }
                    } else {
                        indices.push(pos as usize);
                        cursor += step;
                    }
                }

                if cursor == overflow {
                    return MatchResult {
                        matched: true,
                        indices,
                    };
                }
            } else if opens {
                branch_count += 1;
                if explicit_count > 0 {
                    explicit_count += 1;
                }
            } else if closes {
                branch_count = branch_count.saturating_sub(1);
                if explicit_count > 0 {
                    explicit_count = explicit_count.saturating_sub(1);
                }
            } else {
                let outside_foreign_branch = branch_count == 0
                    || (explicit_count > 0 && branch_end != Some(wanted));
                if outside_foreign_branch && !self.ignored.contains(&symbol.name()) {
                    return MatchResult {
                        matched: false,
                        indices,
                    };
                }
            }

            pos += step;
        }

        MatchResult {
            matched: false,
            indices,
        }
    }
}
