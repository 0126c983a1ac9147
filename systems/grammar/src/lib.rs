#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grammar engine that rewrites axioms using the catalogued rule sets.
//!
//! Rewriting is plain parallel text substitution: every character that owns a
//! rule is replaced by the rule's successor, every other character passes
//! through unchanged. [`expand`] returns an [`Expansion`] that performs one
//! pass per step so callers can either drain it synchronously or pace it
//! across scheduler ticks.

use std::fmt::Write as _;

use arbor_core::RuleSetId;

/// Axiom shared by every catalogued rule set.
pub const AXIOM: &str = "F";

/// Single production rewriting `predecessor` into `successor`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rule {
    predecessor: char,
    successor: &'static str,
}

impl Rule {
    /// Creates a production.
    #[must_use]
    pub const fn new(predecessor: char, successor: &'static str) -> Self {
        Self {
            predecessor,
            successor,
        }
    }

    /// Symbol rewritten by the rule.
    #[must_use]
    pub const fn predecessor(&self) -> char {
        self.predecessor
    }

    /// Replacement emitted for the predecessor.
    #[must_use]
    pub const fn successor(&self) -> &'static str {
        self.successor
    }
}

/// Immutable rule set looked up from the catalogue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuleSet {
    id: RuleSetId,
    axiom: &'static str,
    rules: &'static [Rule],
}

impl RuleSet {
    /// Identifier the rule set was selected with.
    #[must_use]
    pub const fn id(&self) -> RuleSetId {
        self.id
    }

    /// Starting string for expansion.
    #[must_use]
    pub const fn axiom(&self) -> &'static str {
        self.axiom
    }

    /// Productions in catalogue order. Empty for unknown identifiers.
    #[must_use]
    pub const fn rules(&self) -> &'static [Rule] {
        self.rules
    }

    /// Reports whether the rule set performs any rewriting.
    #[must_use]
    pub const fn is_identity(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the successor for `symbol`, if the rule set rewrites it.
    #[must_use]
    pub fn successor(&self, symbol: char) -> Option<&'static str> {
        self.rules
            .iter()
            .find(|rule| rule.predecessor == symbol)
            .map(Rule::successor)
    }

    /// Human-readable description shown next to the rule-set selector.
    #[must_use]
    pub fn describe(&self) -> String {
        if self.is_identity() {
            return String::from("Default Rules");
        }

        let mut description = format!("Axiom: {}", self.axiom);
        for (index, rule) in self.rules.iter().enumerate() {
            let _ = write!(
                description,
                "\nRule{}: {} \u{2192} {}",
                index + 1,
                rule.predecessor,
                rule.successor
            );
        }
        description
    }

    /// Applies a single parallel rewrite pass to `input`.
    #[must_use]
    pub fn rewrite(&self, input: &str) -> String {
        let mut output = String::with_capacity(input.len());
        for symbol in input.chars() {
            match self.successor(symbol) {
                Some(successor) => output.push_str(successor),
                None => output.push(symbol),
            }
        }
        output
    }
}

macro_rules! rule {
    ($predecessor:literal => $successor:literal) => {
        Rule {
            predecessor: $predecessor,
            successor: $successor,
        }
    };
}

const CATALOGUE: [RuleSet; 9] = [
    catalogued(1, &[rule!('F' => "FF-[-F+F+F]+[+F-F-F]")]),
    catalogued(2, &[rule!('F' => "F[+F]F[-F]F")]),
    catalogued(3, &[rule!('F' => "F[+F]F[-F][F]")]),
    catalogued(4, &[rule!('F' => "F[+F][-F]F")]),
    catalogued(5, &[rule!('F' => "G[+F]G[-F]+F"), rule!('G' => "GG")]),
    catalogued(6, &[rule!('F' => "G[+F][-F]GF"), rule!('G' => "GG")]),
    catalogued(
        7,
        &[rule!('F' => "G-[[F]+F]+G[+GF]-F"), rule!('G' => "GG")],
    ),
    catalogued(
        8,
        &[
            rule!('F' => "[G[-F+G[+GF]][*-F+G[+GF]][/-F+G[+GF]-F]]"),
            rule!('G' => "GG"),
        ],
    ),
    catalogued(9, &[rule!('F' => "[*+GF]F[+GF][/+G-GF]"), rule!('G' => "GG")]),
];

const fn catalogued(id: u32, rules: &'static [Rule]) -> RuleSet {
    RuleSet {
        id: RuleSetId::new(id),
        axiom: AXIOM,
        rules,
    }
}

/// Looks up a rule set by identifier.
///
/// Identifiers outside the catalogue degrade to an identity rule set that
/// keeps the axiom unchanged.
#[must_use]
pub fn select_rule_set(id: RuleSetId) -> RuleSet {
    CATALOGUE
        .iter()
        .find(|rule_set| rule_set.id == id)
        .copied()
        .unwrap_or(RuleSet {
            id,
            axiom: AXIOM,
            rules: &[],
        })
}

/// Iterates over every catalogued rule set in identifier order.
pub fn catalogue() -> impl Iterator<Item = RuleSet> {
    CATALOGUE.iter().copied()
}

/// Starts expanding `axiom` with `rule_set` for `iterations` passes.
#[must_use]
pub fn expand(axiom: &str, rule_set: RuleSet, iterations: u32) -> Expansion {
    Expansion {
        rule_set,
        current: axiom.to_owned(),
        completed: 0,
        iterations,
    }
}

/// Finite, ordered sequence of rewrite passes.
///
/// Each step rewrites the current string once. The sequence cannot be
/// restarted; a new one must be created through [`expand`].
#[derive(Clone, Debug)]
pub struct Expansion {
    rule_set: RuleSet,
    current: String,
    completed: u32,
    iterations: u32,
}

impl Expansion {
    /// Performs the next rewrite pass and returns the resulting string.
    pub fn advance(&mut self) -> Option<&str> {
        if self.is_finished() {
            return None;
        }

        self.current = self.rule_set.rewrite(&self.current);
        self.completed += 1;
        Some(&self.current)
    }

    /// String produced by the most recent pass, or the axiom before any pass.
    #[must_use]
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Number of passes performed so far.
    #[must_use]
    pub const fn completed(&self) -> u32 {
        self.completed
    }

    /// Number of passes requested.
    #[must_use]
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Reports whether every requested pass has been performed.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.completed >= self.iterations
    }

    /// Performs all remaining passes and returns the final string.
    #[must_use]
    pub fn finish(mut self) -> String {
        while self.advance().is_some() {}
        self.current
    }

    /// Consumes the expansion, returning the current string without further passes.
    #[must_use]
    pub fn into_current(self) -> String {
        self.current
    }
}

impl Iterator for Expansion {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().map(str::to_owned)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.iterations.saturating_sub(self.completed))
            .unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}
