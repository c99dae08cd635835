use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a generated text was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    /// No blank line separates the poem from the explanation.
    #[error("no blank line between poem and explanation")]
    MissingSeparator,
    /// The poem part has fewer than three non-empty lines (title, author, body).
    #[error("poem part has {lines} non-empty line(s); title, author and body are required")]
    MalformedHead { lines: usize },
    /// The explanation segment has no actual text.
    #[error("explanation is empty")]
    EmptyExplanation,
    /// An excerpt disclosure appears before the separator.
    #[error("excerpt disclosure `{marker}` appears outside the explanation")]
    MisplacedDisclosure { marker: String },
    /// The explanation mentions a personal attribute.
    #[error("explanation mentions a personal attribute")]
    PersonalInfoLeak { term: String },
    /// An explanation line repeats the title or author line verbatim.
    #[error("explanation repeats the title or author line")]
    HeadEcho { line: String },
}

/// Stable, payload-free name of a [`ContractViolation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    MissingSeparator,
    MalformedHead,
    EmptyExplanation,
    MisplacedDisclosure,
    PersonalInfoLeak,
    HeadEcho,
}

impl ViolationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationKind::MissingSeparator => "MISSING_SEPARATOR",
            ViolationKind::MalformedHead => "MALFORMED_HEAD",
            ViolationKind::EmptyExplanation => "EMPTY_EXPLANATION",
            ViolationKind::MisplacedDisclosure => "MISPLACED_DISCLOSURE",
            ViolationKind::PersonalInfoLeak => "PERSONAL_INFO_LEAK",
            ViolationKind::HeadEcho => "HEAD_ECHO",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ContractViolation {
    pub fn kind(&self) -> ViolationKind {
        match self {
            ContractViolation::MissingSeparator => ViolationKind::MissingSeparator,
            ContractViolation::MalformedHead { .. } => ViolationKind::MalformedHead,
            ContractViolation::EmptyExplanation => ViolationKind::EmptyExplanation,
            ContractViolation::MisplacedDisclosure { .. } => ViolationKind::MisplacedDisclosure,
            ContractViolation::PersonalInfoLeak { .. } => ViolationKind::PersonalInfoLeak,
            ContractViolation::HeadEcho { .. } => ViolationKind::HeadEcho,
        }
    }

    /// Leaks are never relaxed into a degraded response.
    pub fn is_identity_leak(&self) -> bool {
        matches!(self, ContractViolation::PersonalInfoLeak { .. })
    }
}
