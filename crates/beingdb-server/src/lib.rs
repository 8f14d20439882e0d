//! `beingdb-server`: the HTTP surface, admission gate, and per-request state
//! machine wrapping `beingdb-core`'s engine (spec §6, §5, and §4.5).
//!
//! Process-level concerns (binding the listener, signal handling, tracing
//! subscriber installation) live in `beingdb-cli`'s `serve` subcommand; this
//! crate only builds the `axum` router and the state it closes over.

pub mod admission;
pub mod config;
pub mod protocol;
pub mod routes;

pub use admission::AdmissionGate;
pub use config::ServerConfig;
pub use routes::{build_router, AppState};
