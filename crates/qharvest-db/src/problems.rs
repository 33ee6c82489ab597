//! Database operations for the `problems` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qharvest_core::{NewProblem, ProblemRecord, ProblemStore, StoreError};
use sqlx::SqlitePool;

use crate::DbError;

/// A row from the `problems` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProblemRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    /// JSON-encoded `Vec<String>`.
    pub tags: String,
    /// JSON-encoded `Vec<i64>`.
    pub related_book_ids: String,
    pub created_at: DateTime<Utc>,
}

impl ProblemRow {
    fn into_record(self) -> Result<ProblemRecord, DbError> {
        Ok(ProblemRecord {
            id: self.id,
            title: self.title,
            content: self.content,
            category: self.category,
            tags: serde_json::from_str(&self.tags)?,
            related_book_ids: serde_json::from_str(&self.related_book_ids)?,
        })
    }
}

/// Problem store over a shared sqlite pool.
#[derive(Clone)]
pub struct SqliteProblemStore {
    pool: SqlitePool,
}

impl SqliteProblemStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Lists every problem row, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the query fails.
    pub async fn list_rows(&self) -> Result<Vec<ProblemRow>, DbError> {
        let rows = sqlx::query_as::<_, ProblemRow>(
            "SELECT id, title, content, category, tags, related_book_ids, created_at \
             FROM problems \
             ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Inserts a problem and returns its generated id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the insert fails, or [`DbError::Json`]
    /// if a list column cannot be encoded.
    pub async fn insert_row(&self, problem: &NewProblem) -> Result<i64, DbError> {
        let tags = serde_json::to_string(&problem.tags)?;
        let related_book_ids = serde_json::to_string(&problem.related_book_ids)?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO problems (title, content, category, tags, related_book_ids) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             RETURNING id",
        )
        .bind(&problem.title)
        .bind(&problem.content)
        .bind(&problem.category)
        .bind(tags)
        .bind(related_book_ids)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }
}

#[async_trait]
impl ProblemStore for SqliteProblemStore {
    async fn list_all(&self) -> Result<Vec<ProblemRecord>, StoreError> {
        let rows = self
            .list_rows()
            .await
            .map_err(|e| StoreError(e.to_string()))?;
        rows.into_iter()
            .map(|row| row.into_record().map_err(|e| StoreError(e.to_string())))
            .collect()
    }

    async fn insert(&self, problem: NewProblem) -> Result<i64, StoreError> {
        self.insert_row(&problem)
            .await
            .map_err(|e| StoreError(e.to_string()))
    }
}
