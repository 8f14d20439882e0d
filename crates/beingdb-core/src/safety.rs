//! Query safety budget validation (spec §4.5 "Safety budget").
//!
//! Checked once, before optimization-aware execution begins. Deadline and
//! intermediate-result-cap enforcement happen during execution instead (see
//! [`crate::engine`]); this module only covers the checks that can be made
//! statically against the parsed query and the request's pagination params.

use std::collections::HashSet;

use crate::error::{BeingDbError, BeingDbResult};
use crate::types::Query;

/// Validate a query and its pagination parameters, in the order spec.md
/// §4.5 lists: offset, limit, predicate name charset, then duplicate
/// predicates (Cartesian product).
pub fn validate_query(query: &Query, offset: Option<i64>, limit: Option<i64>) -> BeingDbResult<()> {
    if let Some(o) = offset {
        if o < 0 {
            return Err(BeingDbError::InvalidOffset(o));
        }
    }
    if let Some(l) = limit {
        if l <= 0 {
            return Err(BeingDbError::InvalidLimit(l));
        }
    }

    for pattern in &query.patterns {
        if !is_valid_predicate_name(&pattern.name) {
            return Err(BeingDbError::InvalidPredicateName(pattern.name.clone()));
        }
    }

    let mut seen = HashSet::new();
    for pattern in &query.patterns {
        if !seen.insert(pattern.name.as_str()) {
            return Err(BeingDbError::CartesianProduct(pattern.name.clone()));
        }
    }

    Ok(())
}

/// `[a-z0-9_]+`, non-empty.
pub fn is_valid_predicate_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}
