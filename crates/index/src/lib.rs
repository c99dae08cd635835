//! # photopoem index
//!
//! Append-only storage for the poem corpus with exact nearest-neighbour
//! search. Every record carries a fixed-dimension embedding; similarity is the
//! inner-product distance `1 - <e, q>`, which is the cosine distance when the
//! embeddings are unit length.
//!
//! Two backends implement [`VectorIndex`]:
//!
//! - [`InMemoryIndex`] keeps records in a `RwLock<Vec<_>>`. Used by tests and the
//!   offline demo.
//! - `PgVectorIndex` (feature `backend-postgres`, on by default) stores rows in
//!   PostgreSQL and lets pgvector's `<#>` operator do the ordering.
//!
//! Both return hits sorted by ascending distance with ties broken by id, never
//! more than `k`, never the same id twice.
//!
//! ```
//! use index::{open_index, IndexConfig, NewPoem};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), index::IndexError> {
//! let index = open_index(&IndexConfig::new(2)).await?;
//! index
//!     .insert(NewPoem {
//!         title: "서시".into(),
//!         author: "윤동주".into(),
//!         excerpt: "죽는 날까지 하늘을 우러러".into(),
//!         source: "하늘과 바람과 별과 시 (1948)".into(),
//!         embedding: vec![1.0, 0.0],
//!     })
//!     .await?;
//! let hits = index.search(&[1.0, 0.0], 3).await?;
//! assert_eq!(hits[0].record.title, "서시");
//! # Ok(())
//! # }
//! ```

mod backend;
mod error;
mod literal;
mod memory;
#[cfg(feature = "backend-postgres")]
mod postgres;
mod query;
mod record;

pub use backend::{open_index, BackendConfig, IndexConfig, VectorIndex};
pub use error::IndexError;
pub use literal::{parse_vector_literal, to_vector_literal};
pub use memory::InMemoryIndex;
#[cfg(feature = "backend-postgres")]
pub use postgres::PgVectorIndex;
pub use query::inner_product_distance;
pub use record::{NewPoem, PoemId, PoemRecord, ScoredPoem, SimilarityResult};

/// Accepts `name` or `schema.name` made of ASCII letters, digits and underscores.
pub fn validate_table_name(table: &str) -> Result<(), IndexError> {
    let valid_part = |part: &str| {
        !part.is_empty()
            && part.len() <= 63
            && part
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    let parts: Vec<&str> = table.split('.').collect();
    if parts.len() <= 2 && parts.iter().all(|p| valid_part(p)) {
        Ok(())
    } else {
        Err(IndexError::InvalidConfig(format!(
            "invalid table name `{table}`"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names() {
        assert!(validate_table_name("poems").is_ok());
        assert!(validate_table_name("public.poems_v2").is_ok());
        assert!(validate_table_name("_t").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("1poems").is_err());
        assert!(validate_table_name("a.b.c").is_err());
        assert!(validate_table_name("poems\"; --").is_err());
    }
}
