//! Shared domain types: the term/argument algebra, patterns, facts, and queries.

use std::collections::HashMap;

/// A ground, fact-side argument value. Produced by the Fact Parser; consumed
/// by the Encoder and by pattern matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// An unquoted, identifier-like value, taken verbatim.
    Atom(String),
    /// A double-quoted value, after escape processing.
    String(String),
}

impl Arg {
    /// The textual content of this argument, independent of its tag.
    /// Pattern matching and binding always compare/carry this, never the tag.
    pub fn text(&self) -> &str {
        match self {
            Arg::Atom(s) | Arg::String(s) => s,
        }
    }
}

/// A query-side term: a superset of `Arg` that also admits variables and the
/// wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// An unquoted, identifier-like constant.
    Atom(String),
    /// A double-quoted constant, after escape processing.
    String(String),
    /// A variable, identified by an uppercase initial letter.
    Var(String),
    /// `_` — matches anything, binds nothing.
    Wildcard,
}

impl Term {
    /// `true` if this term is a constant (not a `Var` or `Wildcard`) — the
    /// selectivity signal the optimizer sorts on.
    pub fn is_constant(&self) -> bool {
        matches!(self, Term::Atom(_) | Term::String(_))
    }
}

/// A named term tuple. Doubles as a ground fact (no `Var`/`Wildcard` terms)
/// and as a query pattern (may contain either).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// Predicate name; `[a-z0-9_]+`, non-empty, when produced by the query parser.
    pub name: String,
    /// Ordered argument terms.
    pub terms: Vec<Term>,
}

/// A single ground fact, as produced by the Fact Parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    /// Predicate name as written on the source line (the compile pipeline
    /// ignores this in favor of the file-derived predicate name).
    pub name: String,
    /// Ordered argument values.
    pub args: Vec<Arg>,
}

/// A parsed, optimized conjunctive query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    /// Patterns forming an implicit conjunction, in optimizer-reordered order.
    pub patterns: Vec<Pattern>,
    /// Distinct variable names, in first-occurrence order after reordering.
    pub variables: Vec<String>,
}

/// A complete or partial variable binding produced during query execution.
pub type Binding = HashMap<String, String>;

/// A concrete matcher handed to `query_predicate`: each position is either a
/// literal textual content to match, or `None` for the wildcard.
pub type Matcher = Vec<Option<String>>;

/// Resolve a pattern's terms against a (possibly partial) binding into a
/// concrete matcher, per the binding protocol: `Atom`/`String` resolve to
/// their content, `Wildcard` resolves to the wildcard, and `Var` resolves to
/// its bound value if bound, else the wildcard.
pub fn resolve_pattern(terms: &[Term], bindings: &Binding) -> Matcher {
    terms
        .iter()
        .map(|t| match t {
            Term::Atom(s) | Term::String(s) => Some(s.clone()),
            Term::Wildcard => None,
            Term::Var(name) => bindings.get(name).cloned(),
        })
        .collect()
}
