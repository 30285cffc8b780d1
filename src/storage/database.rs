//! SQLite Store
//!
//! Embedded persistence for archetypes, test runs, persona responses and
//! aggregated results, using rusqlite with r2d2 connection pooling.
//! Nested data is stored as JSON columns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use focus_panel_core::TestStatus;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, TransactionBehavior};
use tracing::debug;

use crate::models::{
    AggregatedResult, Archetype, PersonaResponse, StatusUpdate, TestConfig, TestRun,
};
use crate::storage::store::Store;
use crate::utils::error::{PanelError, PanelResult};
use crate::utils::paths::database_path;

/// Type alias for the connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Raw test run row from the database
#[derive(Debug, Clone)]
struct TestRunRow {
    id: String,
    config: String,
    status: String,
    created_at: String,
    started_at: Option<String>,
    completed_at: Option<String>,
    error_message: Option<String>,
}

/// SQLite-backed [`Store`]
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    /// Create an in-memory store for testing.
    ///
    /// A single pooled connection keeps every caller on the same in-memory
    /// database.
    pub fn new_in_memory() -> PanelResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| PanelError::database(format!("Failed to create connection pool: {}", e)))?;

        let store = Self { pool };
        store.init_schema()?;
        Ok(store)
    }

    /// Open the store at `~/.focus-panel/panel.db`
    pub fn new() -> PanelResult<Self> {
        let db_path = database_path()?;

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(8)
            .build(manager)
            .map_err(|e| PanelError::database(format!("Failed to create connection pool: {}", e)))?;

        let store = Self { pool };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> PanelResult<()> {
        let conn = self.get_connection()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS archetypes (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                data TEXT NOT NULL,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS test_runs (
                id TEXT PRIMARY KEY,
                config TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'draft',
                created_at TEXT NOT NULL,
                started_at TEXT,
                completed_at TEXT,
                error_message TEXT
            );

            CREATE TABLE IF NOT EXISTS persona_responses (
                id TEXT PRIMARY KEY,
                test_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                archetype_id TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (test_id) REFERENCES test_runs(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_persona_responses_test
                ON persona_responses(test_id, position);

            CREATE TABLE IF NOT EXISTS aggregated_results (
                test_id TEXT PRIMARY KEY,
                data TEXT NOT NULL,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (test_id) REFERENCES test_runs(id) ON DELETE CASCADE
            );",
        )?;

        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> PanelResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| PanelError::database(format!("Failed to get connection: {}", e)))
    }

    /// Check if the database is healthy
    pub fn is_healthy(&self) -> bool {
        if let Ok(conn) = self.pool.get() {
            conn.query_row("SELECT 1", [], |_| Ok(())).is_ok()
        } else {
            false
        }
    }

    fn row_to_test_run(row: TestRunRow) -> PanelResult<TestRun> {
        let config: TestConfig = serde_json::from_str(&row.config)?;
        let status = row
            .status
            .parse()
            .map_err(|e: focus_panel_core::CoreError| PanelError::database(e.to_string()))?;

        Ok(TestRun {
            id: row.id,
            config,
            status,
            created_at: parse_timestamp(&row.created_at)?,
            started_at: row.started_at.as_deref().map(parse_timestamp).transpose()?,
            completed_at: row.completed_at.as_deref().map(parse_timestamp).transpose()?,
            error_message: row.error_message,
        })
    }
}

fn parse_timestamp(value: &str) -> PanelResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PanelError::database(format!("Invalid timestamp '{}': {}", value, e)))
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_archetype(&self, id: &str) -> PanelResult<Archetype> {
        let conn = self.get_connection()?;
        let result = conn.query_row(
            "SELECT data FROM archetypes WHERE id = ?1",
            params![id],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(PanelError::not_found(format!("archetype '{}'", id)))
            }
            Err(e) => Err(PanelError::database(e.to_string())),
        }
    }

    async fn get_test_run(&self, test_id: &str) -> PanelResult<TestRun> {
        let conn = self.get_connection()?;
        let result = conn.query_row(
            "SELECT id, config, status, created_at, started_at, completed_at, error_message
             FROM test_runs WHERE id = ?1",
            params![test_id],
            |row| {
                Ok(TestRunRow {
                    id: row.get(0)?,
                    config: row.get(1)?,
                    status: row.get(2)?,
                    created_at: row.get(3)?,
                    started_at: row.get(4)?,
                    completed_at: row.get(5)?,
                    error_message: row.get(6)?,
                })
            },
        );

        match result {
            Ok(row) => Self::row_to_test_run(row),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(PanelError::not_found(format!("test '{}'", test_id)))
            }
            Err(e) => Err(PanelError::database(e.to_string())),
        }
    }

    async fn set_test_status(&self, test_id: &str, update: StatusUpdate) -> PanelResult<()> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: String = match tx.query_row(
            "SELECT status FROM test_runs WHERE id = ?1",
            params![test_id],
            |row| row.get(0),
        ) {
            Ok(status) => status,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(PanelError::not_found(format!("test '{}'", test_id)))
            }
            Err(e) => return Err(e.into()),
        };
        let current: TestStatus = current
            .parse()
            .map_err(|e: focus_panel_core::CoreError| PanelError::database(e.to_string()))?;

        if !current.can_transition_to(update.status) {
            return Err(PanelError::invalid_state(format!(
                "test '{}' is {}, cannot move to {}",
                test_id, current, update.status
            )));
        }

        // The status guard makes concurrent starts of the same test race on
        // this row: only one sees the prior status it expects.
        let changed = tx.execute(
            "UPDATE test_runs SET status = ?2,
                started_at = COALESCE(?3, started_at),
                completed_at = COALESCE(?4, completed_at),
                error_message = COALESCE(?5, error_message)
             WHERE id = ?1 AND status = ?6",
            params![
                test_id,
                update.status.as_str(),
                update.started_at.map(|t| t.to_rfc3339()),
                update.completed_at.map(|t| t.to_rfc3339()),
                update.error_message,
                current.as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(PanelError::invalid_state(format!(
                "test '{}' changed status concurrently",
                test_id
            )));
        }
        tx.commit()?;

        debug!(test_id, from = current.as_str(), to = update.status.as_str(), "test status written");
        Ok(())
    }

    async fn insert_persona_responses(
        &self,
        test_id: &str,
        responses: &[PersonaResponse],
    ) -> PanelResult<()> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM persona_responses WHERE test_id = ?1",
            params![test_id],
        )?;
        for (position, response) in responses.iter().enumerate() {
            tx.execute(
                "INSERT INTO persona_responses (id, test_id, position, archetype_id, data, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    response.id,
                    test_id,
                    position as i64,
                    response.archetype_id,
                    serde_json::to_string(response)?,
                    response.created_at.to_rfc3339(),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn insert_aggregated_result(
        &self,
        test_id: &str,
        result: &AggregatedResult,
    ) -> PanelResult<()> {
        let conn = self.get_connection()?;
        conn.execute(
            "INSERT OR REPLACE INTO aggregated_results (test_id, data, created_at)
             VALUES (?1, ?2, CURRENT_TIMESTAMP)",
            params![test_id, serde_json::to_string(result)?],
        )?;
        Ok(())
    }

    async fn create_test_run(&self, run: &TestRun) -> PanelResult<()> {
        let conn = self.get_connection()?;
        conn.execute(
            "INSERT OR REPLACE INTO test_runs
                (id, config, status, created_at, started_at, completed_at, error_message)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run.id,
                serde_json::to_string(&run.config)?,
                run.status.as_str(),
                run.created_at.to_rfc3339(),
                run.started_at.map(|t| t.to_rfc3339()),
                run.completed_at.map(|t| t.to_rfc3339()),
                run.error_message,
            ],
        )?;
        Ok(())
    }

    async fn upsert_archetype(&self, archetype: &Archetype) -> PanelResult<()> {
        let conn = self.get_connection()?;
        conn.execute(
            "INSERT INTO archetypes (id, name, data, updated_at)
             VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)
             ON CONFLICT(id) DO UPDATE SET name = ?2, data = ?3, updated_at = CURRENT_TIMESTAMP",
            params![
                archetype.id,
                archetype.name,
                serde_json::to_string(archetype)?
            ],
        )?;
        Ok(())
    }

    async fn list_persona_responses(&self, test_id: &str) -> PanelResult<Vec<PersonaResponse>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(
            "SELECT data FROM persona_responses WHERE test_id = ?1 ORDER BY position ASC",
        )?;
        let rows = stmt
            .query_map(params![test_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.iter()
            .map(|data| serde_json::from_str(data).map_err(PanelError::from))
            .collect()
    }

    async fn get_aggregated_result(&self, test_id: &str) -> PanelResult<Option<AggregatedResult>> {
        let conn = self.get_connection()?;
        let result = conn.query_row(
            "SELECT data FROM aggregated_results WHERE test_id = ?1",
            params![test_id],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(data) => Ok(Some(serde_json::from_str(&data)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(PanelError::database(e.to_string())),
        }
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("pool_size", &self.pool.state().connections)
            .finish()
    }
}
