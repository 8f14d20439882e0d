//! `beingdb-core`: the fact store's core logic — parsing, encoding, pack
//! storage, the compile pipeline, and the conjunctive query engine.
//!
//! No networking, no CLI parsing; those live in `beingdb-server` and
//! `beingdb-cli`. This crate only consumes a directory of predicate source
//! files and a pack directory on disk.

pub mod compile;
pub mod encode;
pub mod engine;
pub mod error;
pub mod optimize;
pub mod pack;
pub mod parse;
pub mod safety;
pub mod types;

pub use compile::{compile, CompileReport, PredicateOutcome};
pub use encode::{decode, encode as encode_args};
pub use engine::{Engine, ExecutionConfig, ExecutionResult};
pub use error::{BeingDbError, BeingDbResult};
pub use pack::{Pack, PackWriter};
pub use parse::{parse_fact_line, parse_query};
pub use safety::validate_query;
pub use types::{Arg, Binding, Fact, Matcher, Pattern, Query, Term};
