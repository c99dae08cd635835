use serde::{Deserialize, Serialize};

use crate::{IngestConfig, IngestError};

/// A poem as submitted for ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoemSubmission {
    pub title: String,
    pub author: String,
    pub excerpt: String,
    pub source: String,
}

impl PoemSubmission {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        excerpt: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            excerpt: excerpt.into(),
            source: source.into(),
        }
    }

    /// Trims every field, normalizes excerpt line endings to `\n`, applies the
    /// byte limits. Fields are checked in declaration order.
    pub fn normalize(self, cfg: &IngestConfig) -> Result<Self, IngestError> {
        let title = clean_field("title", &self.title, cfg.max_field_bytes, cfg, false)?;
        let author = clean_field("author", &self.author, cfg.max_field_bytes, cfg, false)?;
        let excerpt = self.excerpt.replace("\r\n", "\n").replace('\r', "\n");
        let excerpt = clean_field("excerpt", &excerpt, cfg.max_excerpt_bytes, cfg, true)?;
        let source = clean_field("source", &self.source, cfg.max_field_bytes, cfg, false)?;
        Ok(Self {
            title,
            author,
            excerpt,
            source,
        })
    }
}

fn clean_field(
    field: &'static str,
    value: &str,
    limit: usize,
    cfg: &IngestConfig,
    multiline: bool,
) -> Result<String, IngestError> {
    let stripped: String = if cfg.strip_control_chars {
        value
            .chars()
            .filter(|c| !c.is_ascii_control() || (multiline && matches!(c, '\n' | '\t')))
            .collect()
    } else {
        value.to_string()
    };
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        return Err(IngestError::EmptyField { field });
    }
    if trimmed.len() > limit {
        return Err(IngestError::FieldTooLarge {
            field,
            limit,
            actual: trimmed.len(),
        });
    }
    Ok(trimmed.to_string())
}
