//! Fact Parser (spec §4.1): lexes one source line into `(name, [Arg])`.

use super::tokenize::{split_top_level, unescape_quoted};
use crate::types::{Arg, Fact};

/// Parse one line of predicate source.
///
/// Returns `None` for blank lines, `%`/`#` comments, and lines with no `(`.
/// Otherwise lenient: a malformed argument token round-trips as `Arg::Atom`
/// of its raw text rather than failing the whole line.
pub fn parse_fact_line(line: &str) -> Option<Fact> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('%') || trimmed.starts_with('#') {
        return None;
    }

    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed).trim_end();

    let paren_idx = trimmed.find('(')?;
    let name = trimmed[..paren_idx].trim().to_string();

    let mut rest = trimmed[paren_idx + 1..].trim();
    rest = rest.strip_suffix(')').unwrap_or(rest).trim();

    let args = if rest.is_empty() {
        Vec::new()
    } else {
        split_top_level(rest).into_iter().map(|tok| parse_arg_token(&tok)).collect()
    };

    Some(Fact { name, args })
}

fn parse_arg_token(token: &str) -> Arg {
    if token.starts_with('"') {
        if let Some(content) = unescape_quoted(token) {
            return Arg::String(content);
        }
    }
    Arg::Atom(token.to_string())
}
