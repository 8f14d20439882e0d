//! The typed fact encoding (spec §4.3): a two-level key scheme mapping a
//! ground argument list to `(encoded_args, value_blob)`.
//!
//! Atoms are length-prefixed and inlined into the path segment so they may
//! contain arbitrary characters, including `:`. Strings are offloaded into
//! the value blob (indexed by position) so the path segment stays compact.
//! `decode` is total: it never panics, even on adversarial input, and
//! degrades by truncating the decoded list on structural violations.

use crate::types::Arg;

/// Maximum atom length accepted while decoding a path segment. Guards
/// against treating a corrupted/adversarial length prefix as an enormous
/// allocation request.
const MAX_ATOM_LEN: usize = 1_000_000;

/// Encode a ground argument list into `(encoded_args, value_blob)`.
pub fn encode(args: &[Arg]) -> (String, Vec<u8>) {
    let mut path_parts = Vec::with_capacity(args.len());
    let mut strings: Vec<&str> = Vec::new();

    for arg in args {
        match arg {
            Arg::Atom(s) => path_parts.push(format!("{}:{}", s.len(), s)),
            Arg::String(s) => {
                let idx = strings.len();
                strings.push(s);
                path_parts.push(format!("$:{idx}"));
            }
        }
    }

    let encoded_args = path_parts.join(":");

    let mut value_blob = Vec::new();
    for s in strings {
        value_blob.extend_from_slice(s.len().to_string().as_bytes());
        value_blob.push(b':');
        value_blob.extend_from_slice(s.as_bytes());
    }

    (encoded_args, value_blob)
}

/// Decode `(encoded_args, value_blob)` back into an argument list.
///
/// Total: never panics. On a structural violation in an atom's length
/// framing (bad length, missing separator, insufficient bytes) decoding
/// stops and returns whatever was decoded so far. An out-of-range/
/// non-integer/negative string placeholder index does not abort decoding —
/// it yields the literal `Arg::Atom("$:<raw>")` and decoding continues.
pub fn decode(encoded_args: &str, value_blob: &[u8]) -> Vec<Arg> {
    let strings = split_blob_strings(value_blob);
    let bytes = encoded_args.as_bytes();
    let mut pos = 0usize;
    let mut out = Vec::new();

    while pos < bytes.len() {
        if bytes[pos..].starts_with(b"$:") {
            pos += 2;
            let start = pos;
            while pos < bytes.len() && bytes[pos] != b':' {
                pos += 1;
            }
            let raw = &encoded_args[start..pos];
            match raw.parse::<i64>() {
                Ok(idx) if idx >= 0 && (idx as usize) < strings.len() => {
                    out.push(Arg::String(strings[idx as usize].clone()));
                }
                _ => out.push(Arg::Atom(format!("$:{raw}"))),
            }
        } else {
            let start = pos;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            if pos == start {
                break;
            }
            let len: usize = match encoded_args[start..pos].parse() {
                Ok(n) if n <= MAX_ATOM_LEN => n,
                _ => break,
            };
            if pos >= bytes.len() || bytes[pos] != b':' {
                break;
            }
            pos += 1;
            if pos + len > bytes.len() {
                break;
            }
            let content = String::from_utf8_lossy(&bytes[pos..pos + len]).into_owned();
            out.push(Arg::Atom(content));
            pos += len;
        }

        if pos >= bytes.len() {
            break;
        }
        if bytes[pos] != b':' {
            break;
        }
        pos += 1;
    }

    out
}

/// Parse the `value_blob`'s length-prefixed string list. Same framing as an
/// atom's path part (`"<len>:<bytes>"`), concatenated with no separator
/// since the length prefix alone is enough to find each boundary.
fn split_blob_strings(blob: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    let mut pos = 0usize;

    while pos < blob.len() {
        let start = pos;
        while pos < blob.len() && blob[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos == start {
            break;
        }
        let len: usize = match std::str::from_utf8(&blob[start..pos]).ok().and_then(|s| s.parse().ok()) {
            Some(n) => n,
            None => break,
        };
        if pos >= blob.len() || blob[pos] != b':' {
            break;
        }
        pos += 1;
        if pos + len > blob.len() {
            break;
        }
        out.push(String::from_utf8_lossy(&blob[pos..pos + len]).into_owned());
        pos += len;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_atoms_only() {
        let args = vec![Arg::Atom("tina_keane".into()), Arg::Atom("she".into())];
        let (encoded_args, blob) = encode(&args);
        assert_eq!(decode(&encoded_args, &blob), args);
    }

    #[test]
    fn round_trips_mixed_atom_and_string() {
        let args = vec![Arg::Atom("doc_456".into()), Arg::String("neural networks".into())];
        let (encoded_args, blob) = encode(&args);
        assert_eq!(encoded_args, "7:doc_456:$:0");
        assert_eq!(blob, b"15:neural networks");
        assert_eq!(decode(&encoded_args, &blob), args);
    }

    #[test]
    fn atom_may_contain_colons() {
        let args = vec![Arg::Atom("a:b:c".into())];
        let (encoded_args, blob) = encode(&args);
        assert_eq!(decode(&encoded_args, &blob), args);
    }

    #[test]
    fn arity_zero_round_trips() {
        let args: Vec<Arg> = Vec::new();
        let (encoded_args, blob) = encode(&args);
        assert_eq!(encoded_args, "");
        assert!(blob.is_empty());
        assert_eq!(decode(&encoded_args, &blob), args);
    }

    #[test]
    fn empty_atom_round_trips() {
        let args = vec![Arg::Atom(String::new())];
        let (encoded_args, blob) = encode(&args);
        assert_eq!(encoded_args, "0:");
        assert_eq!(decode(&encoded_args, &blob), args);
    }

    #[test]
    fn out_of_range_placeholder_yields_literal_atom() {
        let decoded = decode("$:7", b"");
        assert_eq!(decoded, vec![Arg::Atom("$:7".into())]);
    }

    #[test]
    fn negative_placeholder_yields_literal_atom() {
        let decoded = decode("$:-1:3:abc", b"");
        assert_eq!(decoded, vec![Arg::Atom("$:-1".into()), Arg::Atom("abc".into())]);
    }

    #[test]
    fn non_integer_placeholder_yields_literal_atom() {
        let decoded = decode("$:nope", b"");
        assert_eq!(decoded, vec![Arg::Atom("$:nope".into())]);
    }

    #[test]
    fn truncated_atom_length_stops_decoding() {
        // Declares 100 bytes but none follow: decode stops, returns nothing.
        assert_eq!(decode("100:", b""), Vec::new());
    }

    #[test]
    fn missing_separator_stops_decoding() {
        assert_eq!(decode("3abc", b""), Vec::new());
    }

    #[test]
    fn decode_never_panics_on_arbitrary_bytes() {
        for sample in ["", ":", "$", "$:", "abc", "999999999999999999999:x", "5:ab"] {
            let _ = decode(sample, b"\xff\xfe");
        }
    }
}
