use chrono::{DateTime, Utc};
use ferret_core::error::AppError;
use ferret_core::models::{RunResult, RunStats, SourcedContact};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite, SqlitePool};

/// A run as stored in the `runs` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRun {
    pub id: i64,
    pub name: String,
    pub contacts: Vec<SourcedContact>,
    pub stats: RunStats,
    pub cancelled: bool,
    pub created_at: DateTime<Utc>,
}

/// Repository for run persistence in SQLite.
#[derive(Clone)]
pub struct RunRepository {
    pool: Pool<Sqlite>,
}

impl RunRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Save a finished run. Returns the generated row id.
    pub async fn save(&self, run: &RunResult) -> Result<i64, AppError> {
        let data = RunData {
            name: run.run_name.clone(),
            contacts: run.contacts.clone(),
            stats: run.stats.clone(),
            cancelled: run.cancelled,
        };
        let data_json = serde_json::to_string(&data)?;

        let result = sqlx::query("INSERT INTO runs (name, data_json, created_at) VALUES (?, ?, ?)")
            .bind(&run.run_name)
            .bind(&data_json)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let id = result.last_insert_rowid();
        tracing::debug!(%id, name = %run.run_name, contacts = run.contacts.len(), "Saved run");
        Ok(id)
    }

    /// All stored runs, newest first.
    pub async fn list(&self) -> Result<Vec<StoredRun>, AppError> {
        let rows = sqlx::query_as::<_, RunRow>(
            r#"
            SELECT id, name, data_json, created_at
            FROM runs
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(StoredRun::try_from).collect()
    }

    pub async fn get(&self, id: i64) -> Result<Option<StoredRun>, AppError> {
        let row = sqlx::query_as::<_, RunRow>(
            "SELECT id, name, data_json, created_at FROM runs WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        row.map(StoredRun::try_from).transpose()
    }

    /// Replace a run's name and contacts. Stats and flags are kept.
    ///
    /// Returns false if no run has this id.
    pub async fn update(
        &self,
        id: i64,
        name: &str,
        contacts: &[SourcedContact],
    ) -> Result<bool, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let existing: Option<(String,)> = sqlx::query_as("SELECT data_json FROM runs WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let Some((data_json,)) = existing else {
            return Ok(false);
        };

        let mut data: RunData = serde_json::from_str(&data_json)?;
        data.name = name.to_string();
        data.contacts = contacts.to_vec();

        sqlx::query("UPDATE runs SET name = ?, data_json = ? WHERE id = ?")
            .bind(name)
            .bind(serde_json::to_string(&data)?)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(true)
    }

    /// Delete a run. Returns whether a row was removed.
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM runs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

// -- Stored JSON document --

#[derive(Debug, Serialize, Deserialize)]
struct RunData {
    name: String,
    contacts: Vec<SourcedContact>,
    #[serde(default)]
    stats: RunStats,
    #[serde(default)]
    cancelled: bool,
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct RunRow {
    id: i64,
    name: String,
    data_json: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RunRow> for StoredRun {
    type Error = AppError;

    fn try_from(row: RunRow) -> Result<Self, Self::Error> {
        let data: RunData = serde_json::from_str(&row.data_json)?;
        Ok(StoredRun {
            id: row.id,
            name: row.name,
            contacts: data.contacts,
            stats: data.stats,
            cancelled: data.cancelled,
            created_at: row.created_at,
        })
    }
}

// -- Trait implementation --

impl ferret_core::traits::RunSink for RunRepository {
    async fn save(&self, run: &RunResult) -> Result<Option<i64>, AppError> {
        self.save(run).await.map(Some)
    }
}
