//! String-aware tokenizing shared by the Fact Parser and Query Parser.

/// Split `input` on commas that are outside of a double-quoted string,
/// trimming each resulting token. A `"` toggles an in-string flag; a `\`
/// while in-string escapes the following character so it can't end the
/// string or be mistaken for a delimiter.
///
/// Used both for a fact/pattern's top-level argument list and (by the query
/// parser) for splitting a query string into patterns.
pub fn split_top_level(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
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
            ',' if !in_string => {
                parts.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    parts.push(current.trim().to_string());
    parts
}

/// Parse a single token that begins with `"` as a quoted string, honoring
/// the escape set `\n \t \r \\ \"`. Returns `None` if the token has no
/// matching unescaped closing quote (an unterminated string) — callers fall
/// back to treating the raw token as an atom.
pub fn unescape_quoted(token: &str) -> Option<String> {
    let mut chars = token.chars();
    if chars.next() != Some('"') {
        return None;
    }

    let mut out = String::new();
    let mut escape = false;
    let mut closed = false;

    for c in chars {
        if escape {
            match c {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '\\' => out.push('\\'),
                '"' => out.push('"'),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
            escape = false;
            continue;
        }
        match c {
            '\\' => escape = true,
            '"' => {
                closed = true;
                break;
            }
            _ => out.push(c),
        }
    }

    if closed {
        Some(out)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_top_level_commas() {
        assert_eq!(split_top_level("a, b, c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn keeps_commas_inside_strings() {
        assert_eq!(
            split_top_level(r#"doc_456, "neural networks, more""#),
            vec!["doc_456", r#""neural networks, more""#]
        );
    }

    #[test]
    fn escaped_quote_does_not_end_string() {
        let parts = split_top_level(r#""she said \"hi\"", b"#);
        assert_eq!(parts, vec![r#""she said \"hi\"""#, "b"]);
    }

    #[test]
    fn unescapes_known_escapes() {
        assert_eq!(
            unescape_quoted(r#""a\nb\tc\r\\\"d""#).unwrap(),
            "a\nb\tc\r\\\"d"
        );
    }

    #[test]
    fn unterminated_quote_returns_none() {
        assert_eq!(unescape_quoted(r#""no closing quote"#), None);
    }
}
