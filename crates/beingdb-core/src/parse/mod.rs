//! Source-text parsing: the Fact Parser (§4.1) and Query Parser (§4.2).
//!
//! Both share the same string-aware comma splitting and quoted-string
//! un-escaping rules, factored into [`tokenize`].

mod fact;
mod query;
mod tokenize;

pub use fact::parse_fact_line;
pub use query::parse_query;
pub use tokenize::{split_top_level, unescape_quoted};
