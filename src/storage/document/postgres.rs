//! Persistent document store using PostgreSQL.
//!
//! Every collection lives in one `portfolio_documents` table keyed by
//! `(collection, id)`; the document body is a JSONB column.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use super::{new_document_id, DocumentStore, Fields, Record};
use crate::error::StoreError;

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS portfolio_documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    fields JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (collection, id)
)";

/// A document store that uses a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Connects to `database_url` and makes sure the documents table exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Self::new_with_pool(pool).await
    }

    pub async fn new_with_pool(pool: PgPool) -> Result<Self, StoreError> {
        sqlx::query(CREATE_TABLE_SQL).execute(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn list_all(
        &self,
        collection: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Record>, StoreError> {
        // LIMIT NULL means no limit in Postgres.
        let rows = sqlx::query(
            "SELECT id, fields FROM portfolio_documents
             WHERE collection = $1
             ORDER BY created_at ASC, id ASC
             LIMIT $2",
        )
        .bind(collection)
        .bind(limit.map(i64::from))
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id")?;
            let Json(fields): Json<Fields> = row.try_get("fields")?;
            records.push(Record::new(id, fields));
        }
        Ok(records)
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let id = new_document_id();
        sqlx::query("INSERT INTO portfolio_documents (collection, id, fields) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(&id)
            .bind(Json(&fields))
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE portfolio_documents SET fields = fields || $3::jsonb
             WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(&fields))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM portfolio_documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
