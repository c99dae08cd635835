//! PostgreSQL + pgvector backend.
//!
//! Schema (created by [`PgVectorIndex::ensure_schema`]):
//! ```sql
//! CREATE EXTENSION IF NOT EXISTS vector;
//! CREATE TABLE IF NOT EXISTS poems (
//!     id        BIGSERIAL PRIMARY KEY,
//!     title     TEXT NOT NULL,
//!     author    TEXT NOT NULL,
//!     excerpt   TEXT NOT NULL,
//!     source    TEXT NOT NULL,
//!     embedding vector(1536) NOT NULL
//! );
//! ```
//! Vectors travel as text literals cast to `vector` on the server side.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::literal::{parse_vector_literal, to_vector_literal};
use crate::query::{check_dimension, check_k, sort_hits};
use crate::{
    validate_table_name, IndexError, NewPoem, PoemId, PoemRecord, ScoredPoem, SimilarityResult,
    VectorIndex,
};

type PoemRow = (i64, String, String, String, String, String, f64);

/// pgvector-backed index sharing one connection pool.
#[derive(Debug, Clone)]
pub struct PgVectorIndex {
    pool: PgPool,
    table: String,
    dimension: usize,
}

impl PgVectorIndex {
    pub async fn connect(
        url: &str,
        table: &str,
        max_connections: u32,
        dimension: usize,
    ) -> Result<Self, IndexError> {
        validate_table_name(table)?;
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self::with_pool(pool, table, dimension))
    }

    /// Wraps an existing pool. `table` must already be a valid identifier.
    pub fn with_pool(pool: PgPool, table: &str, dimension: usize) -> Self {
        Self {
            pool,
            table: table.to_string(),
            dimension,
        }
    }

    pub async fn ensure_schema(&self) -> Result<(), IndexError> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id        BIGSERIAL PRIMARY KEY,
                title     TEXT NOT NULL,
                author    TEXT NOT NULL,
                excerpt   TEXT NOT NULL,
                source    TEXT NOT NULL,
                embedding vector({}) NOT NULL
            )",
            self.table, self.dimension
        );
        sqlx::query(&ddl).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for PgVectorIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn insert(&self, poem: NewPoem) -> Result<PoemRecord, IndexError> {
        check_dimension(self.dimension, &poem.embedding)?;
        let sql = format!(
            "INSERT INTO {} (title, author, excerpt, source, embedding)
             VALUES ($1, $2, $3, $4, $5::vector) RETURNING id",
            self.table
        );
        let id = sqlx::query_scalar::<_, i64>(&sql)
            .bind(&poem.title)
            .bind(&poem.author)
            .bind(&poem.excerpt)
            .bind(&poem.source)
            .bind(to_vector_literal(&poem.embedding))
            .fetch_one(&self.pool)
            .await?;
        Ok(PoemRecord::from_new(PoemId(id), poem))
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<SimilarityResult, IndexError> {
        check_k(k)?;
        check_dimension(self.dimension, query)?;
        let sql = format!(
            "SELECT id, title, author, excerpt, source, embedding::text, embedding <#> $1::vector
             FROM {}
             ORDER BY embedding <#> $1::vector, id ASC
             LIMIT $2",
            self.table
        );
        let rows = sqlx::query_as::<_, PoemRow>(&sql)
            .bind(to_vector_literal(query))
            .bind(k as i64)
            .fetch_all(&self.pool)
            .await?;
        // k > 0, so no rows means no records.
        if rows.is_empty() {
            return Err(IndexError::EmptyIndex);
        }

        let mut hits = rows
            .into_iter()
            .map(|(id, title, author, excerpt, source, embedding, neg_ip)| {
                Ok(ScoredPoem {
                    record: PoemRecord {
                        id: PoemId(id),
                        title,
                        author,
                        excerpt,
                        source,
                        embedding: parse_vector_literal(&embedding)?,
                    },
                    distance: (1.0 + neg_ip) as f32,
                })
            })
            .collect::<Result<Vec<_>, IndexError>>()?;
        // f64 -> f32 can collapse near-ties; keep the store's order stable.
        sort_hits(&mut hits);
        Ok(hits)
    }

    async fn len(&self) -> Result<usize, IndexError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let count = sqlx::query_scalar::<_, i64>(&sql).fetch_one(&self.pool).await?;
        Ok(count.max(0) as usize)
    }

    async fn close(&self) -> Result<(), IndexError> {
        self.pool.close().await;
        Ok(())
    }
}
