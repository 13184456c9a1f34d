//! SQLite metadata store
//!
//! A single connection guarded by a mutex. Every multi-row operation runs in
//! one transaction; version numbers come from a per-model counter column so
//! a deleted number is never handed out again.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::types::{FromSqlError, Type};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info};

use common::error::{Error, Result};
use common::models::{Model, ModelId, NewModel, NewVersion, RuntimeArtifact, Task, Version, VersionPatch};

use crate::store::{MetadataStore, VersionDeletion};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS models (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    namespace    TEXT NOT NULL,
    name         TEXT NOT NULL,
    task         INTEGER NOT NULL,
    last_version INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    UNIQUE (namespace, name)
);

CREATE TABLE IF NOT EXISTS versions (
    model_id    INTEGER NOT NULL REFERENCES models(id) ON DELETE CASCADE,
    number      INTEGER NOT NULL,
    status      TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    PRIMARY KEY (model_id, number)
);

CREATE TABLE IF NOT EXISTS artifacts (
    name            TEXT PRIMARY KEY,
    model_id        INTEGER NOT NULL,
    version         INTEGER NOT NULL,
    runtime_version INTEGER NOT NULL,
    ensemble        INTEGER NOT NULL,
    FOREIGN KEY (model_id, version) REFERENCES versions(model_id, number) ON DELETE CASCADE
);
"#;

const MODEL_COLUMNS: &str = "id, namespace, name, task, created_at, updated_at";
const VERSION_COLUMNS: &str = "model_id, number, status, description, created_at, updated_at";
const ARTIFACT_COLUMNS: &str = "name, model_id, version, runtime_version, ensemble";

/// Metadata store backed by a SQLite database
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (creating if needed) a database file
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(db_error)?;
        info!("Opened metadata database at {:?}", path);

        Self::init(conn)
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_error)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;").map_err(db_error)?;
        conn.execute_batch(SCHEMA).map_err(db_error)?;

        debug!("Metadata schema ready");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs a closure against the connection. The lock is never held across
    /// an await point.
    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> rusqlite::Result<T>) -> Result<T> {
        let mut conn = self.conn.lock();
        f(&mut conn).map_err(db_error)
    }
}

fn db_error(e: rusqlite::Error) -> Error {
    if is_constraint_violation(&e) {
        Error::Conflict(e.to_string())
    } else {
        Error::Database(e.to_string())
    }
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation)
}

fn model_not_found(id: ModelId) -> Error {
    Error::NotFound(format!("Model not found: {}", id))
}

fn version_not_found(model_id: ModelId, number: u32) -> Error {
    Error::NotFound(format!("Version {} not found for model {}", number, model_id))
}

fn model_from_row(row: &Row<'_>) -> rusqlite::Result<Model> {
    let code: i32 = row.get(3)?;
    let task = Task::from_code(code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(3, Type::Integer, Box::new(FromSqlError::OutOfRange(code.into())))
    })?;

    Ok(Model {
        id: row.get(0)?,
        namespace: row.get(1)?,
        name: row.get(2)?,
        task,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn version_from_row(row: &Row<'_>) -> rusqlite::Result<Version> {
    let status: String = row.get(2)?;
    let status = status
        .parse()
        .map_err(|e: Error| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

    Ok(Version {
        model_id: row.get(0)?,
        number: row.get(1)?,
        status,
        description: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn artifact_from_row(row: &Row<'_>) -> rusqlite::Result<RuntimeArtifact> {
    Ok(RuntimeArtifact {
        name: row.get(0)?,
        model_id: row.get(1)?,
        version: row.get(2)?,
        runtime_version: row.get(3)?,
        ensemble: row.get(4)?,
    })
}

fn select_version(conn: &Connection, model_id: ModelId, number: u32) -> rusqlite::Result<Option<Version>> {
    conn.query_row(
        &format!("SELECT {} FROM versions WHERE model_id = ?1 AND number = ?2", VERSION_COLUMNS),
        params![model_id, number],
        version_from_row,
    )
    .optional()
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn insert_model(&self, new: &NewModel) -> Result<Model> {
        let now = Utc::now();

        let id = self
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO models (namespace, name, task, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
                    params![new.namespace, new.name, new.task.code(), now],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .map_err(|e| match e {
                Error::Conflict(_) => Error::Conflict(format!(
                    "The name {} is existing in namespace {}",
                    new.name, new.namespace
                )),
                other => other,
            })?;

        Ok(Model {
            id,
            namespace: new.namespace.clone(),
            name: new.name.clone(),
            task: new.task,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_model(&self, id: ModelId) -> Result<Model> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM models WHERE id = ?1", MODEL_COLUMNS),
                params![id],
                model_from_row,
            )
            .optional()
        })?
        .ok_or_else(|| model_not_found(id))
    }

    async fn find_model(&self, namespace: &str, name: &str) -> Result<Option<Model>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM models WHERE namespace = ?1 AND name = ?2", MODEL_COLUMNS),
                params![namespace, name],
                model_from_row,
            )
            .optional()
        })
    }

    async fn list_models(&self, namespace: &str) -> Result<Vec<Model>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM models WHERE namespace = ?1 ORDER BY id",
                MODEL_COLUMNS
            ))?;
            let rows = stmt.query_map(params![namespace], model_from_row)?;
            rows.collect()
        })
    }

    async fn delete_model(&self, id: ModelId) -> Result<()> {
        let deleted = self.with_conn(|conn| conn.execute("DELETE FROM models WHERE id = ?1", params![id]))?;

        if deleted == 0 {
            return Err(model_not_found(id));
        }

        Ok(())
    }

    async fn insert_version(&self, model_id: ModelId, new: &NewVersion) -> Result<Version> {
        let now = Utc::now();

        let number = self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let bumped = tx.execute(
                "UPDATE models SET last_version = last_version + 1, updated_at = ?2 WHERE id = ?1",
                params![model_id, now],
            )?;
            if bumped == 0 {
                return Ok(None);
            }

            let number: u32 = tx.query_row(
                "SELECT last_version FROM models WHERE id = ?1",
                params![model_id],
                |row| row.get(0),
            )?;
            tx.execute(
                "INSERT INTO versions (model_id, number, status, description, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![model_id, number, new.status.as_str(), new.description, now],
            )?;

            tx.commit()?;
            Ok(Some(number))
        })?;

        let number = number.ok_or_else(|| model_not_found(model_id))?;

        Ok(Version {
            model_id,
            number,
            status: new.status,
            description: new.description.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_version(&self, model_id: ModelId, number: u32) -> Result<Version> {
        self.with_conn(|conn| select_version(conn, model_id, number))?
            .ok_or_else(|| version_not_found(model_id, number))
    }

    async fn list_versions(&self, model_id: ModelId) -> Result<Vec<Version>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM versions WHERE model_id = ?1 ORDER BY number",
                VERSION_COLUMNS
            ))?;
            let rows = stmt.query_map(params![model_id], version_from_row)?;
            rows.collect()
        })
    }

    async fn latest_version(&self, model_id: ModelId) -> Result<Option<Version>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {} FROM versions WHERE model_id = ?1 ORDER BY number DESC LIMIT 1",
                    VERSION_COLUMNS
                ),
                params![model_id],
                version_from_row,
            )
            .optional()
        })
    }

    async fn update_version(&self, model_id: ModelId, number: u32, patch: &VersionPatch) -> Result<Version> {
        let now = Utc::now();
        let status = patch.status.map(|s| s.as_str());

        self.with_conn(|conn| {
            let tx = conn.transaction()?;

            let changed = tx.execute(
                "UPDATE versions SET status = COALESCE(?3, status), description = COALESCE(?4, description), \
                 updated_at = ?5 WHERE model_id = ?1 AND number = ?2",
                params![model_id, number, status, patch.description, now],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            tx.execute(
                "UPDATE models SET updated_at = ?2 WHERE id = ?1",
                params![model_id, now],
            )?;

            let version = select_version(&tx, model_id, number)?;
            tx.commit()?;
            Ok(version)
        })?
        .ok_or_else(|| version_not_found(model_id, number))
    }

    async fn delete_version(&self, model_id: ModelId, number: u32) -> Result<VersionDeletion> {
        self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let deleted = tx.execute(
                "DELETE FROM versions WHERE model_id = ?1 AND number = ?2",
                params![model_id, number],
            )?;
            if deleted == 0 {
                return Ok(None);
            }

            let remaining: i64 = tx.query_row(
                "SELECT COUNT(*) FROM versions WHERE model_id = ?1",
                params![model_id],
                |row| row.get(0),
            )?;
            let model_deleted = remaining == 0;
            if model_deleted {
                tx.execute("DELETE FROM models WHERE id = ?1", params![model_id])?;
            }

            tx.commit()?;
            Ok(Some(VersionDeletion {
                remaining: remaining as usize,
                model_deleted,
            }))
        })?
        .ok_or_else(|| version_not_found(model_id, number))
    }

    async fn insert_artifact(&self, artifact: &RuntimeArtifact) -> Result<()> {
        let inserted = self.with_conn(|conn| {
            let tx = conn.transaction()?;

            if select_version(&tx, artifact.model_id, artifact.version)?.is_none() {
                return Ok(false);
            }
            tx.execute(
                &format!("INSERT INTO artifacts ({}) VALUES (?1, ?2, ?3, ?4, ?5)", ARTIFACT_COLUMNS),
                params![
                    artifact.name,
                    artifact.model_id,
                    artifact.version,
                    artifact.runtime_version,
                    artifact.ensemble
                ],
            )?;

            tx.commit()?;
            Ok(true)
        })?;

        if !inserted {
            return Err(version_not_found(artifact.model_id, artifact.version));
        }

        Ok(())
    }

    async fn list_artifacts(&self, model_id: ModelId) -> Result<Vec<RuntimeArtifact>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM artifacts WHERE model_id = ?1 ORDER BY version, name",
                ARTIFACT_COLUMNS
            ))?;
            let rows = stmt.query_map(params![model_id], artifact_from_row)?;
            rows.collect()
        })
    }

    async fn list_version_artifacts(&self, model_id: ModelId, number: u32) -> Result<Vec<RuntimeArtifact>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM artifacts WHERE model_id = ?1 AND version = ?2 ORDER BY name",
                ARTIFACT_COLUMNS
            ))?;
            let rows = stmt.query_map(params![model_id, number], artifact_from_row)?;
            rows.collect()
        })
    }
}
