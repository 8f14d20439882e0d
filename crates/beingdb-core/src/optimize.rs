//! Pattern reordering (selectivity heuristic), spec §4.5.
//!
//! Patterns with more constant (non-variable, non-wildcard) terms are
//! assumed to cut the result tree earlier, so they run first.

use std::collections::HashSet;

use crate::types::{Pattern, Query};

/// Stable-sort `query.patterns` descending by constant-term count, then
/// recompute `variables` in first-occurrence order over the reordered
/// patterns. Calling this twice is a no-op (an already-sorted sequence
/// sorted again by the same key, stably, is unchanged), so it is safe for
/// both the query parser and the query engine to apply it.
pub fn optimize_query(query: Query) -> Query {
    let mut patterns = query.patterns;
    patterns.sort_by_key(|p| std::cmp::Reverse(selectivity(p)));
    let variables = first_occurrence_variables(&patterns);
    Query { patterns, variables }
}

fn selectivity(pattern: &Pattern) -> usize {
    pattern.terms.iter().filter(|t| t.is_constant()).count()
}

fn first_occurrence_variables(patterns: &[Pattern]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut vars = Vec::new();
    for pattern in patterns {
        for term in &pattern.terms {
            if let crate::types::Term::Var(name) = term {
                if seen.insert(name.clone()) {
                    vars.push(name.clone());
                }
            }
        }
    }
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Term;

    fn pattern(name: &str, terms: Vec<Term>) -> Pattern {
        Pattern { name: name.to_string(), terms }
    }

    #[test]
    fn sorts_by_constant_count_descending() {
        let q = Query {
            patterns: vec![
                pattern("p", vec![Term::Var("X".into())]),
                pattern("q", vec![Term::Atom("a".into()), Term::Atom("b".into())]),
            ],
            variables: Vec::new(),
        };
        let optimized = optimize_query(q);
        assert_eq!(optimized.patterns[0].name, "q");
        assert_eq!(optimized.patterns[1].name, "p");
    }

    #[test]
    fn ties_preserve_source_order() {
        let q = Query {
            patterns: vec![
                pattern("first", vec![Term::Var("X".into())]),
                pattern("second", vec![Term::Var("Y".into())]),
            ],
            variables: Vec::new(),
        };
        let optimized = optimize_query(q);
        assert_eq!(optimized.patterns[0].name, "first");
        assert_eq!(optimized.patterns[1].name, "second");
    }

    #[test]
    fn is_idempotent() {
        let q = Query {
            patterns: vec![
                pattern("p", vec![Term::Var("X".into())]),
                pattern("q", vec![Term::Atom("a".into())]),
            ],
            variables: Vec::new(),
        };
        let once = optimize_query(q);
        let twice = optimize_query(once.clone());
        assert_eq!(once, twice);
    }
}
