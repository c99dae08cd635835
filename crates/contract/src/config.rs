use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Phrases that mark a partial excerpt, as the writer is instructed to phrase them.
pub const DEFAULT_DISCLOSURE_MARKERS: &[&str] = &[
    "시가 너무 길어 첫 연만",
    "첫 연만 보여",
    "일부만 보여",
    "일부만 발췌",
    "excerpt truncated",
    "only a partial excerpt",
    "only the first stanza",
];

/// Personal attributes that must never show up in an explanation.
pub const DEFAULT_IDENTITY_TERMS: &[&str] = &[
    "얼굴", "나이", "성별", "남성", "여성", "인종", "외모", "피부색",
    "face", "faces", "age", "aged", "gender", "male", "female", "ethnicity", "race",
    "skin tone",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid contract config: {0}")]
pub struct ContractConfigError(pub String);

/// Matching rules for the output contract.
///
/// Matching is case-insensitive and runs on NFC-normalized text. ASCII terms
/// match whole words only; other terms (Hangul) match as substrings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    pub disclosure_markers: Vec<String>,
    pub identity_terms: Vec<String>,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            disclosure_markers: DEFAULT_DISCLOSURE_MARKERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            identity_terms: DEFAULT_IDENTITY_TERMS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ContractConfig {
    pub fn with_disclosure_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disclosure_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_identity_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identity_terms = terms.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), ContractConfigError> {
        if self.disclosure_markers.is_empty() {
            return Err(ContractConfigError(
                "at least one disclosure marker is required".into(),
            ));
        }
        if self.disclosure_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(ContractConfigError("disclosure markers must not be blank".into()));
        }
        if self.identity_terms.iter().any(|t| t.trim().is_empty()) {
            return Err(ContractConfigError("identity terms must not be blank".into()));
        }
        Ok(())
    }
}
