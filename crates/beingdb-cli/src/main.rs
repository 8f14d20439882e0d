//! BeingDB CLI.
//!
//! `compile` turns a directory of predicate source files into a fresh pack
//! snapshot; `serve` opens a pack read-only and exposes it over HTTP until
//! SIGTERM/SIGINT (spec §6 "CLI surface").

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use beingdb_core::{Engine, ExecutionConfig, Pack};
use beingdb_server::{build_router, AppState, ServerConfig};

/// BeingDB - a read-mostly fact store with a conjunctive query language.
#[derive(Parser, Debug)]
#[command(name = "beingdb", version, about = "Compile predicate sources and serve conjunctive queries over a pack")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a directory of predicate source files into a fresh pack.
    Compile {
        /// Directory containing one file per predicate.
        #[arg(long)]
        source: PathBuf,

        /// Pack directory to (re)create.
        #[arg(long)]
        pack: PathBuf,
    },

    /// Serve a compiled pack over HTTP.
    Serve {
        /// Pack directory previously produced by `compile`.
        #[arg(long)]
        pack: PathBuf,

        /// TCP port to bind. Overrides `BEINGDB_PORT` and the compiled-in default.
        #[arg(long)]
        port: Option<u16>,

        /// Server-wide ceiling on returned results per request.
        #[arg(long)]
        max_results: Option<usize>,

        /// Maximum concurrently executing query handlers.
        #[arg(long)]
        max_concurrent: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_env_filter(&cli.log_level).with_writer(std::io::stderr).init();

    match cli.command {
        Commands::Compile { source, pack } => run_compile(&source, &pack).await,
        Commands::Serve { pack, port, max_results, max_concurrent } => {
            run_serve(&pack, port, max_results, max_concurrent).await
        }
    }
}

async fn run_compile(source: &std::path::Path, pack: &std::path::Path) -> Result<()> {
    tracing::info!(source = %source.display(), pack = %pack.display(), "compiling predicate sources");

    let report = beingdb_core::compile(source, pack).await?;

    for predicate in &report.predicates {
        if let Some(samples) = &predicate.arity_violation {
            tracing::error!(predicate = %predicate.predicate, samples = ?samples, "arity violation");
        } else {
            tracing::info!(
                predicate = %predicate.predicate,
                facts = predicate.facts_written,
                malformed = predicate.malformed_lines,
                "predicate compiled"
            );
        }
    }

    println!(
        "compiled {} predicates, {} facts written, {} failed",
        report.predicates.len(),
        report.total_facts_written(),
        report.failed_predicates().len()
    );

    if !report.is_success() {
        eprintln!("failed predicates: {}", report.failed_predicates().join(", "));
        std::process::exit(1);
    }

    Ok(())
}

async fn run_serve(
    pack_dir: &std::path::Path,
    port: Option<u16>,
    max_results: Option<usize>,
    max_concurrent: Option<usize>,
) -> Result<()> {
    let mut config = ServerConfig::load();
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(max_results) = max_results {
        config.max_results = max_results;
    }
    if let Some(max_concurrent) = max_concurrent {
        config.max_concurrent = max_concurrent;
    }

    let pack = Pack::open(pack_dir)?;
    let exec_config = ExecutionConfig {
        query_timeout: config.query_timeout(),
        max_intermediate_results: config.max_intermediate_results,
    };
    let engine = Engine::new(Arc::new(pack), exec_config);
    let state = AppState::new(engine, &config);
    let router = build_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, pack = %pack_dir.display(), "starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let mut signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        signal.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received SIGINT"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
