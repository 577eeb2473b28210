// ABOUTME: Table-partitioned persistent key-value store backed by a single SQLite file.
// ABOUTME: Holds lock records, deployment history, and cached webhook payloads.

mod records;

pub use records::{DeploymentRecord, DeploymentStatus, LockRecord};

use chrono::Utc;
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Logical tables sharing the backing file. Tables do not share keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Locks,
    Deployments,
    Webhooks,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::Locks => "locks",
            Table::Deployments => "deployments",
            Table::Webhooks => "webhooks",
        }
    }
}

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("record serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("record not found: {0}")]
    NotFound(String),
}

/// Persistent record store shared by every component that needs durable state.
///
/// Writers are linearized by SQLite's file-level locking, so a lock record
/// written here excludes concurrent deployments across separate server
/// processes sharing the same file. Each upsert is one committed transaction.
#[derive(Clone)]
pub struct RecordStore {
    db: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore").finish()
    }
}

const TABLES: [Table; 3] = [Table::Locks, Table::Deployments, Table::Webhooks];

impl RecordStore {
    /// Open (or create) the store at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = Connection::open(path)?;
        Self::init(db)
    }

    /// Open an in-memory store. Used by tests.
    pub fn in_memory() -> Result<Self, StoreError> {
        let db = Connection::open_in_memory()?;
        Self::init(db)
    }

    fn init(db: Connection) -> Result<Self, StoreError> {
        for table in TABLES {
            db.execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS {} (
                        key TEXT PRIMARY KEY,
                        value TEXT NOT NULL
                    )",
                    table.name()
                ),
                [],
            )?;
        }
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Fetch a raw record by key. Returns `None` when the key is absent.
    pub async fn get_raw(&self, table: Table, key: &str) -> Result<Option<String>, StoreError> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(&format!(
            "SELECT value FROM {} WHERE key = ?1",
            table.name()
        ))?;
        let mut rows = stmt.query_map(params![key], |row| row.get::<_, String>(0))?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Insert or overwrite a record. One committed transaction per call.
    pub async fn upsert_raw(&self, table: Table, key: &str, value: &str) -> Result<(), StoreError> {
        let db = self.db.lock().await;
        db.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (key, value) VALUES (?1, ?2)",
                table.name()
            ),
            params![key, value],
        )?;
        Ok(())
    }

    /// Fetch every record in a table. Order is unspecified; callers sort.
    pub async fn all_raw(&self, table: Table) -> Result<Vec<(String, String)>, StoreError> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(&format!("SELECT key, value FROM {}", table.name()))?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    // === Typed accessors ===

    /// Look up the lock record for a project key.
    pub async fn lock_record(&self, key: &str) -> Result<Option<LockRecord>, StoreError> {
        match self.get_raw(Table::Locks, key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Write the lock record for a project key.
    pub async fn put_lock_record(&self, key: &str, record: &LockRecord) -> Result<(), StoreError> {
        let raw = serde_json::to_string(record)?;
        self.upsert_raw(Table::Locks, key, &raw).await
    }

    /// Look up a deployment record by its `project@commit` key.
    pub async fn deployment(&self, key: &str) -> Result<Option<DeploymentRecord>, StoreError> {
        match self.get_raw(Table::Deployments, key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Write a deployment record. Later writes with the same key overwrite.
    pub async fn put_deployment(&self, record: &DeploymentRecord) -> Result<(), StoreError> {
        let raw = serde_json::to_string(record)?;
        self.upsert_raw(Table::Deployments, &record.key(), &raw).await
    }

    /// List deployment records, newest first, optionally filtered by project
    /// key. Returns at most `page_size` records plus the total matching count.
    pub async fn deployments(
        &self,
        project: Option<&str>,
        page_size: usize,
    ) -> Result<(Vec<DeploymentRecord>, usize), StoreError> {
        let mut records = Vec::new();
        for (_, raw) in self.all_raw(Table::Deployments).await? {
            let record: DeploymentRecord = serde_json::from_str(&raw)?;
            if project.is_none_or(|p| record.project == p) {
                records.push(record);
            }
        }

        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let total = records.len();
        records.truncate(page_size);
        Ok((records, total))
    }

    /// Cache a webhook payload verbatim, keyed by project key, for replay.
    pub async fn cache_webhook(&self, key: &str, raw_payload: &str) -> Result<(), StoreError> {
        self.upsert_raw(Table::Webhooks, key, raw_payload).await
    }

    /// Fetch the cached webhook payload for a project key.
    pub async fn cached_webhook(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.get_raw(Table::Webhooks, key).await
    }

    /// Force stale `In-Progress` records to `Failure`. Records are stale when
    /// older than `max_age`. Returns the number of records swept.
    pub async fn fail_stale_in_progress(
        &self,
        max_age: chrono::Duration,
    ) -> Result<usize, StoreError> {
        let cutoff = Utc::now() - max_age;
        let mut swept = 0;

        for (_, raw) in self.all_raw(Table::Deployments).await? {
            let mut record: DeploymentRecord = serde_json::from_str(&raw)?;
            if record.status == DeploymentStatus::InProgress && record.timestamp < cutoff {
                record.status = DeploymentStatus::Failure;
                record.log.push_str("\nmarked failed by stale-deployment sweep");
                self.put_deployment(&record).await?;
                swept += 1;
            }
        }
        Ok(swept)
    }
}
