//! Compile Pipeline (spec §4.4): turns a directory of predicate source files
//! into a fresh pack snapshot.
//!
//! One file per predicate; the predicate name is the file's stem when the
//! file name ends in `.pl`, and the bare file name otherwise (the "flat
//! directory importer" decision from spec §9, see `SPEC_FULL.md` §4).
//! Subdirectories of `source_dir` are ignored.

use std::path::Path;

use tracing::{error, warn};

use crate::encode::encode;
use crate::error::{BeingDbError, BeingDbResult};
use crate::pack::PackWriter;
use crate::parse::parse_fact_line;

const MAX_ARITY_SAMPLES: usize = 5;

/// Outcome for a single predicate file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateOutcome {
    /// Predicate name derived from the file name.
    pub predicate: String,
    /// Number of facts written for this predicate (0 if it failed).
    pub facts_written: usize,
    /// Number of lines the Fact Parser rejected outright (no `(`, blank, comment aside).
    pub malformed_lines: usize,
    /// `Some(samples)` if the file mixed arities; the predicate was then skipped entirely.
    pub arity_violation: Option<Vec<String>>,
}

impl PredicateOutcome {
    fn failed(&self) -> bool {
        self.arity_violation.is_some()
    }
}

/// Summary of one `compile` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileReport {
    /// One entry per file found directly inside `source_dir`.
    pub predicates: Vec<PredicateOutcome>,
}

impl CompileReport {
    /// Total facts written across all predicates.
    pub fn total_facts_written(&self) -> usize {
        self.predicates.iter().map(|p| p.facts_written).sum()
    }

    /// Names of predicates that failed arity validation.
    pub fn failed_predicates(&self) -> Vec<&str> {
        self.predicates.iter().filter(|p| p.failed()).map(|p| p.predicate.as_str()).collect()
    }

    /// `true` if every predicate compiled cleanly; callers exit non-zero otherwise.
    pub fn is_success(&self) -> bool {
        self.failed_predicates().is_empty()
    }
}

/// Derive a predicate name from a source file name (spec §9 decision:
/// strip a `.pl` suffix if present, use the bare file name otherwise).
pub fn predicate_name_for(file_name: &str) -> String {
    file_name.strip_suffix(".pl").unwrap_or(file_name).to_string()
}

/// Compile `source_dir` into a fresh pack at `pack_dir`.
///
/// Discards any prior contents of `pack_dir` before writing (spec §4.4: "the
/// pack must be opened in fresh mode"). A predicate whose file mixes arities
/// contributes zero facts to the pack and is reported in
/// [`CompileReport::failed_predicates`]; callers map a non-empty list to a
/// non-zero process exit.
pub async fn compile(source_dir: &Path, pack_dir: &Path) -> BeingDbResult<CompileReport> {
    let source_dir = source_dir.to_path_buf();
    let pack_dir = pack_dir.to_path_buf();

    tokio::task::spawn_blocking(move || compile_blocking(&source_dir, &pack_dir))
        .await
        .map_err(|e| crate::error::BeingDbError::Internal(format!("compile task panicked: {e}")))?
}

fn compile_blocking(source_dir: &Path, pack_dir: &Path) -> BeingDbResult<CompileReport> {
    let writer = PackWriter::create_fresh(pack_dir)?;
    let mut predicates = Vec::new();

    let mut entries: Vec<_> = std::fs::read_dir(source_dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let predicate = predicate_name_for(file_name);
        let outcome = compile_predicate_file(&writer, &predicate, &path)?;
        predicates.push(outcome);
    }

    writer.commit()?;
    Ok(CompileReport { predicates })
}

fn compile_predicate_file(writer: &PackWriter, predicate: &str, path: &Path) -> BeingDbResult<PredicateOutcome> {
    let source = std::fs::read_to_string(path)?;

    let mut valid = Vec::new();
    let mut malformed_lines = 0usize;

    for line in source.lines() {
        match parse_fact_line(line) {
            Some(fact) => valid.push((fact.args, line.to_string())),
            None => {
                let trimmed = line.trim();
                if !trimmed.is_empty() && !trimmed.starts_with('%') && !trimmed.starts_with('#') {
                    warn!(predicate, line = trimmed, "skipping malformed fact line");
                    malformed_lines += 1;
                }
            }
        }
    }

    let mut arities: Vec<usize> = valid.iter().map(|(args, _)| args.len()).collect();
    arities.sort_unstable();
    arities.dedup();

    if arities.len() > 1 {
        let samples: Vec<String> = valid.iter().take(MAX_ARITY_SAMPLES).map(|(_, line)| line.clone()).collect();
        let violation = BeingDbError::ArityViolation { predicate: predicate.to_string(), samples: samples.clone() };
        error!(arities = ?arities, "{violation}");
        return Ok(PredicateOutcome {
            predicate: predicate.to_string(),
            facts_written: 0,
            malformed_lines,
            arity_violation: Some(samples),
        });
    }

    writer.register_predicate(predicate)?;
    for (args, _) in &valid {
        let (encoded_args, value_blob) = encode(args);
        writer.put_fact(predicate, &encoded_args, &value_blob)?;
    }

    Ok(PredicateOutcome {
        predicate: predicate.to_string(),
        facts_written: valid.len(),
        malformed_lines,
        arity_violation: None,
    })
}
