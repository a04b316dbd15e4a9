//! PostgreSQL implementation of the document store.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use thinq_types::{Document, Fields, Filter, StoreError, WriteOp};

use super::pg_commit::atomic_commit_impl;
use super::pg_helpers::{
    fields_to_json, limit_param, map_sqlx_err, row_to_document, DOCUMENT_COLUMNS,
};
use super::pg_listen::subscribe_impl;
use super::{CommitSummary, DocumentStore, StoreResult, Subscription};

/// PostgreSQL-backed document store.
pub struct PostgresStore {
    /// Database connection pool.
    pool: PgPool,
}

impl PostgresStore {
    /// Create store with existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to database and create store.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(300))
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|err| StoreError::unavailable(err.to_string()))
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn subscribe(&self, collection: &str) -> StoreResult<Subscription> {
        subscribe_impl(&self.pool, collection).await
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Document> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM documents WHERE collection = $1 AND id = $2",
            DOCUMENT_COLUMNS
        ))
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .ok_or_else(|| StoreError::not_found(collection, id))?;
        row_to_document(&row)
    }

    async fn query(
        &self,
        collection: &str,
        filter: &Filter,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Document>> {
        // Equality on scalar values is expressed as JSONB containment.
        let Some(containment) = filter.containment() else {
            return Ok(Vec::new());
        };
        let rows = sqlx::query(&format!(
            "SELECT {} FROM documents WHERE collection = $1 AND fields @> $2 ORDER BY id LIMIT $3",
            DOCUMENT_COLUMNS
        ))
        .bind(collection)
        .bind(containment)
        .bind(limit_param(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        rows.iter().map(row_to_document).collect()
    }

    async fn atomic_commit(&self, ops: Vec<WriteOp>) -> StoreResult<CommitSummary> {
        atomic_commit_impl(&self.pool, ops).await
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<Document> {
        let row = sqlx::query(&format!(
            r#"INSERT INTO documents (collection, id, fields, updated_at)
               VALUES ($1, $2, $3, NOW())
               ON CONFLICT (collection, id)
               DO UPDATE SET fields = EXCLUDED.fields, updated_at = NOW()
               RETURNING {}"#,
            DOCUMENT_COLUMNS
        ))
        .bind(collection)
        .bind(id)
        .bind(fields_to_json(&fields))
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        row_to_document(&row)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<Document> {
        let row = sqlx::query(&format!(
            r#"UPDATE documents SET fields = fields || $3, updated_at = NOW()
               WHERE collection = $1 AND id = $2
               RETURNING {}"#,
            DOCUMENT_COLUMNS
        ))
        .bind(collection)
        .bind(id)
        .bind(fields_to_json(&fields))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .ok_or_else(|| StoreError::not_found(collection, id))?;
        row_to_document(&row)
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }
}
