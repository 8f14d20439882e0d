//! Pack storage: a concrete adapter over the external Pack contract (spec §6).
//!
//! spec.md treats the underlying content-addressed KV as an assumed external
//! collaborator and explicitly puts it out of scope. This module supplies the
//! minimal concrete backend this crate actually runs against, grounded in the
//! teacher's own storage wrapper (`omni-core::index::MetadataIndex`): a
//! `rusqlite` connection, WAL pragmas, and a schema bootstrapped from
//! `include_str!`. The two-level key `(predicate, encoded_args)` is the
//! sqlite primary key, which gives the deterministic "pack key order" the
//! join engine's streaming semantics rely on. A separate `predicates` table
//! registers a predicate name independently of whether it ever gets a fact
//! written, so a predicate with zero facts still appears in
//! `list_predicates`/`list_predicates_with_arity` with arity 0.
//!
//! [`PackWriter`] is the single-writer, fresh-mode handle used only by the
//! compile pipeline. [`Pack`] is the read-only handle used only by the query
//! engine; every call opens a short-lived read-only connection inside
//! `spawn_blocking`, so from the engine's perspective each one is a
//! suspension point, and concurrent readers never contend with each other.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags};

use crate::error::{BeingDbError, BeingDbResult};

const DB_FILE_NAME: &str = "facts.db";

/// Fresh-mode handle for (re)building a pack from scratch. Owned exclusively
/// by the compile pipeline; never opened concurrently with a [`Pack`] reader
/// of the same directory mid-write (readers only ever see a prior commit or
/// the next one, never a half-written one, because the file is created under
/// a fresh name-then-rename-free path: old contents are removed before the
/// new connection is opened).
pub struct PackWriter {
    conn: Connection,
}

impl PackWriter {
    /// Create a fresh pack at `pack_dir`, discarding any prior contents
    /// atomically before writes begin.
    pub fn create_fresh(pack_dir: &Path) -> BeingDbResult<Self> {
        std::fs::create_dir_all(pack_dir)?;
        let db_path = pack_dir.join(DB_FILE_NAME);

        for candidate in [db_path.clone(), sidecar(&db_path, "-wal"), sidecar(&db_path, "-shm")] {
            if candidate.exists() {
                std::fs::remove_file(&candidate)?;
            }
        }

        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.execute_batch(include_str!("schema.sql"))?;

        Ok(Self { conn })
    }

    /// Write one fact's encoded key/value pair. Registers `predicate` as a
    /// side effect, so a predicate with at least one fact always appears in
    /// [`Pack::list_predicates`] without a separate call.
    pub fn put_fact(&self, predicate: &str, encoded_args: &str, value_blob: &[u8]) -> BeingDbResult<()> {
        self.register_predicate(predicate)?;
        self.conn.execute(
            "INSERT INTO facts (predicate, encoded_args, value_blob) VALUES (?1, ?2, ?3)",
            params![predicate, encoded_args, value_blob],
        )?;
        Ok(())
    }

    /// Register `predicate` as present in the pack even if it never gets a
    /// fact written (spec §4.5: `list_predicates_with_arity` reports such
    /// predicates with arity 0). Idempotent — a predicate the compile
    /// pipeline later writes facts for is unaffected by an earlier call.
    pub fn register_predicate(&self, predicate: &str) -> BeingDbResult<()> {
        self.conn.execute("INSERT OR IGNORE INTO predicates (predicate) VALUES (?1)", params![predicate])?;
        Ok(())
    }

    /// Checkpoint the WAL and release the writer. After this returns, a
    /// `Pack::open` on the same directory observes every written fact.
    pub fn commit(self) -> BeingDbResult<()> {
        self.conn.pragma_update(None, "wal_checkpoint", "TRUNCATE")?;
        Ok(())
    }
}

/// Read-only handle onto a committed pack. Safe to share (via `Arc`) across
/// any number of concurrent query handlers — it holds no connection, only a
/// path, and opens one read-only connection per call.
pub struct Pack {
    db_path: PathBuf,
}

impl Pack {
    /// Open a pack directory previously committed by [`PackWriter`].
    pub fn open(pack_dir: &Path) -> BeingDbResult<Self> {
        let db_path = pack_dir.join(DB_FILE_NAME);
        if !db_path.exists() {
            return Err(BeingDbError::Internal(format!(
                "no pack found at {} (did compile run?)",
                pack_dir.display()
            )));
        }
        Ok(Self { db_path })
    }

    fn open_reader(db_path: &Path) -> BeingDbResult<Connection> {
        Ok(Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?)
    }

    /// All registered predicate names, in sorted order — including a
    /// predicate the compile pipeline registered but never wrote a fact for
    /// (spec §4.5: "empty predicates report arity 0").
    pub async fn list_predicates(&self) -> BeingDbResult<Vec<String>> {
        let db_path = self.db_path.clone();
        spawn_blocking_result(move || {
            let conn = Self::open_reader(&db_path)?;
            let mut stmt = conn.prepare("SELECT predicate FROM predicates ORDER BY predicate")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
        .await
    }

    /// Each predicate paired with its arity (spec §4.5: "fetch any one fact
    /// and report its arity; empty predicates report arity 0").
    pub async fn list_predicates_with_arity(&self) -> BeingDbResult<Vec<(String, usize)>> {
        let predicates = self.list_predicates().await?;
        let mut out = Vec::with_capacity(predicates.len());
        for predicate in predicates {
            let arity = match self.first_fact(&predicate).await? {
                Some((encoded_args, value_blob)) => crate::encode::decode(&encoded_args, &value_blob).len(),
                None => 0,
            };
            out.push((predicate, arity));
        }
        Ok(out)
    }

    /// Fetch any single fact under `predicate`, in pack key order, or `None`
    /// if the predicate has no facts.
    pub async fn first_fact(&self, predicate: &str) -> BeingDbResult<Option<(String, Vec<u8>)>> {
        let db_path = self.db_path.clone();
        let predicate = predicate.to_string();
        spawn_blocking_result(move || {
            let conn = Self::open_reader(&db_path)?;
            let mut stmt = conn.prepare(
                "SELECT encoded_args, value_blob FROM facts WHERE predicate = ?1 ORDER BY encoded_args LIMIT 1",
            )?;
            let mut rows = stmt.query(params![predicate])?;
            match rows.next()? {
                Some(row) => Ok(Some((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))),
                None => Ok(None),
            }
        })
        .await
    }

    /// All facts under `predicate`, in pack key order (the `(predicate,
    /// encoded_args)` primary key's byte ordering).
    pub async fn facts(&self, predicate: &str) -> BeingDbResult<Vec<(String, Vec<u8>)>> {
        let db_path = self.db_path.clone();
        let predicate = predicate.to_string();
        spawn_blocking_result(move || {
            let conn = Self::open_reader(&db_path)?;
            let mut stmt = conn.prepare(
                "SELECT encoded_args, value_blob FROM facts WHERE predicate = ?1 ORDER BY encoded_args",
            )?;
            let rows = stmt.query_map(params![predicate], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
            })?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
        .await
    }

    /// Release this handle. The pack itself is untouched — closing just
    /// drops the (path-only) handle, since each call opens its own
    /// short-lived connection.
    pub fn close(self) {}
}

fn sidecar(db_path: &Path, suffix: &str) -> PathBuf {
    let mut name = db_path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

async fn spawn_blocking_result<T, F>(f: F) -> BeingDbResult<T>
where
    F: FnOnce() -> BeingDbResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| BeingDbError::Internal(format!("pack task panicked: {e}")))?
}
