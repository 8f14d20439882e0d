//! Query Parser (spec §4.2): lexes a query string into an optimized `Query`.

use super::tokenize::{split_top_level, unescape_quoted};
use crate::optimize::optimize_query;
use crate::types::{Pattern, Query, Term};

/// Parse a query string into an optimized `Query`.
///
/// Patterns are split on top-level commas (outside parens and quoted
/// strings); a pattern segment that doesn't parse (no name, no `(`) is
/// dropped rather than failing the whole query. Returns `None` only when
/// zero patterns parsed successfully.
pub fn parse_query(input: &str) -> Option<Query> {
    let segments = split_patterns(input);

    let patterns: Vec<Pattern> = segments.iter().filter_map(|seg| parse_pattern(seg)).collect();

    if patterns.is_empty() {
        return None;
    }

    Some(optimize_query(Query { patterns, variables: Vec::new() }))
}

/// Split a query string into pattern segments on commas that are at paren
/// depth zero and outside of a quoted string.
fn split_patterns(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape = false;

    for c in input.chars() {
        if escape {
            current.push(c);
            escape = false;
            continue;
        }
        match c {
            '\\' if in_string => {
                current.push(c);
                escape = true;
            }
            '"' => {
                in_string = !in_string;
                current.push(c);
            }
            '(' if !in_string => {
                depth += 1;
                current.push(c);
            }
            ')' if !in_string => {
                depth -= 1;
                current.push(c);
            }
            ',' if !in_string && depth <= 0 => {
                parts.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    parts.push(current.trim().to_string());
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

fn parse_pattern(segment: &str) -> Option<Pattern> {
    let trimmed = segment.trim();
    let paren_idx = trimmed.find('(')?;
    let name = trimmed[..paren_idx].trim().to_string();
    if name.is_empty() {
        return None;
    }

    let mut rest = trimmed[paren_idx + 1..].trim();
    rest = rest.strip_suffix(')').unwrap_or(rest).trim();

    let terms = if rest.is_empty() {
        Vec::new()
    } else {
        split_top_level(rest).into_iter().map(|tok| classify_term(&tok)).collect()
    };

    Some(Pattern { name, terms })
}

fn classify_term(token: &str) -> Term {
    if token == "_" {
        return Term::Wildcard;
    }
    if token.starts_with('"') {
        return match unescape_quoted(token) {
            Some(content) => Term::String(content),
            None => Term::Atom(token.to_string()),
        };
    }
    match token.chars().next() {
        Some(c) if c.is_ascii_uppercase() => Term::Var(token.to_string()),
        _ => Term::Atom(token.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_pattern_with_var() {
        let q = parse_query("created(tina_keane, Work)").unwrap();
        assert_eq!(q.patterns.len(), 1);
        assert_eq!(q.variables, vec!["Work".to_string()]);
    }

    #[test]
    fn parses_join_and_orders_variables_by_first_occurrence() {
        let q = parse_query("created(tina_keane, Work), shown_in(Work, E)").unwrap();
        assert_eq!(q.variables, vec!["Work".to_string(), "E".to_string()]);
    }

    #[test]
    fn wildcard_is_not_a_variable() {
        let q = parse_query("p(_, X)").unwrap();
        assert_eq!(q.variables, vec!["X".to_string()]);
    }

    #[test]
    fn string_term_is_recognized() {
        let q = parse_query(r#"keyword(Doc, "neural networks")"#).unwrap();
        assert_eq!(q.patterns[0].terms[1], Term::String("neural networks".into()));
    }

    #[test]
    fn comma_inside_quoted_string_does_not_split_patterns() {
        let q = parse_query(r#"keyword(Doc, "neural, networks")"#).unwrap();
        assert_eq!(q.patterns.len(), 1);
        assert_eq!(q.patterns[0].terms[1], Term::String("neural, networks".into()));
    }

    #[test]
    fn zero_patterns_yields_none() {
        assert_eq!(parse_query(""), None);
        assert_eq!(parse_query("not_a_pattern"), None);
    }

    #[test]
    fn optimizer_reorders_more_selective_pattern_first() {
        let q = parse_query("p(X), q(a, b)").unwrap();
        assert_eq!(q.patterns[0].name, "q");
        assert_eq!(q.patterns[1].name, "p");
    }
}
