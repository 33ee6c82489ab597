//! Database operations for the `answers` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qharvest_core::{AnswerStore, NewAnswer, StoreError};
use sqlx::SqlitePool;

use crate::DbError;

/// A row from the `answers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnswerRow {
    pub id: i64,
    pub problem_id: i64,
    pub content: String,
    pub author: Option<String>,
    pub upvotes: i64,
    pub downvotes: i64,
    pub quality_score: f64,
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Answer store over a shared sqlite pool.
#[derive(Clone)]
pub struct SqliteAnswerStore {
    pool: SqlitePool,
}

impl SqliteAnswerStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts an answer and returns its generated id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the insert fails.
    pub async fn insert_row(&self, answer: &NewAnswer) -> Result<i64, DbError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO answers \
                 (problem_id, content, author, upvotes, downvotes, quality_score, source_url) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             RETURNING id",
        )
        .bind(answer.problem_id)
        .bind(&answer.content)
        .bind(&answer.author)
        .bind(i64::from(answer.upvotes))
        .bind(i64::from(answer.downvotes))
        .bind(answer.quality_score)
        .bind(&answer.source_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Lists a problem's answers, highest quality first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the query fails.
    pub async fn list_for_problem(&self, problem_id: i64) -> Result<Vec<AnswerRow>, DbError> {
        let rows = sqlx::query_as::<_, AnswerRow>(
            "SELECT id, problem_id, content, author, upvotes, downvotes, \
                    quality_score, source_url, created_at \
             FROM answers \
             WHERE problem_id = ?1 \
             ORDER BY quality_score DESC, upvotes DESC",
        )
        .bind(problem_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl AnswerStore for SqliteAnswerStore {
    async fn insert(&self, answer: NewAnswer) -> Result<i64, StoreError> {
        self.insert_row(&answer)
            .await
            .map_err(|e| StoreError(e.to_string()))
    }
}
