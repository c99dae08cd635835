//! Output contract for generated recommendations.
//!
//! The writer model is asked to answer in a fixed layout:
//!
//! ```text
//! <title>
//! <author>
//! <body line>
//! <body line>
//!
//! <body line of the next stanza>
//!
//! <explanation ... trailing citation sentence.>
//! ```
//!
//! It does not always comply. [`OutputContractValidator::validate`] is the one
//! place that parses that text: it either returns a [`RecommendationResponse`]
//! or a [`ContractViolation`] saying what went wrong. It never rewrites the
//! text it is given.
//!
//! Checks run in order: split into poem/explanation, parse the poem part,
//! reject an excerpt disclosure in the poem part or standing alone as the first
//! explanation paragraph, reject personal attributes in the explanation, reject
//! an explanation that repeats the title or author.
//!
//! ```
//! use contract::{ContractConfig, OutputContractValidator};
//!
//! let validator = OutputContractValidator::new(&ContractConfig::default()).unwrap();
//! let response = validator
//!     .validate("title\nauthor\nline1\n\nline2\n\n\nexplanation text")
//!     .unwrap();
//! assert_eq!(response.title, "title");
//! assert_eq!(response.body.len(), 2);
//! assert!(!response.truncated);
//! ```

mod config;
mod matcher;
mod response;
mod segment;
mod violation;

pub use config::{
    ContractConfig, ContractConfigError, DEFAULT_DISCLOSURE_MARKERS, DEFAULT_IDENTITY_TERMS,
};
pub use response::RecommendationResponse;
pub use violation::{ContractViolation, ViolationKind};

use matcher::TermMatcher;
use segment::{
    extract_citation, is_single_sentence, normalize_newlines, paragraphs, parse_head,
    split_head_tail,
};

/// Validates raw writer output against the output contract.
#[derive(Debug, Clone)]
pub struct OutputContractValidator {
    disclosure: TermMatcher,
    identity: TermMatcher,
}

impl OutputContractValidator {
    pub fn new(cfg: &ContractConfig) -> Result<Self, ContractConfigError> {
        cfg.validate()?;
        let disclosure = TermMatcher::new(&cfg.disclosure_markers)
            .map_err(|e| ContractConfigError(format!("disclosure markers: {e}")))?;
        let identity = TermMatcher::new(&cfg.identity_terms)
            .map_err(|e| ContractConfigError(format!("identity terms: {e}")))?;
        Ok(Self {
            disclosure,
            identity,
        })
    }

    pub fn validate(&self, raw: &str) -> Result<RecommendationResponse, ContractViolation> {
        let result = self.validate_inner(raw);
        match &result {
            Ok(resp) => tracing::debug!(
                stanzas = resp.body.len(),
                truncated = resp.truncated,
                "generation accepted"
            ),
            Err(violation) => tracing::debug!(violation = %violation.kind(), "generation rejected"),
        }
        result
    }

    fn validate_inner(&self, raw: &str) -> Result<RecommendationResponse, ContractViolation> {
        let normalized = normalize_newlines(raw);
        let text = normalized.trim();

        let (head_lines, tail_lines) = split_head_tail(text)?;
        let explanation = tail_lines.join("\n").trim().to_string();
        if !explanation.chars().any(char::is_alphanumeric) {
            return Err(ContractViolation::EmptyExplanation);
        }

        let head = parse_head(&head_lines)?;

        if let Some(marker) = self.disclosure.find(&head_lines.join("\n")) {
            return Err(ContractViolation::MisplacedDisclosure { marker });
        }

        // A disclosure standing alone as the first paragraph is a heading, not
        // part of the explanation.
        let tail_paragraphs = paragraphs(&tail_lines);
        if let [opening, _, ..] = tail_paragraphs.as_slice() {
            if is_single_sentence(opening) {
                if let Some(marker) = self.disclosure.find(opening) {
                    return Err(ContractViolation::MisplacedDisclosure { marker });
                }
            }
        }

        if let Some(term) = self.identity.find(&explanation) {
            return Err(ContractViolation::PersonalInfoLeak { term });
        }

        if let Some(line) = explanation
            .lines()
            .map(str::trim)
            .find(|line| *line == head.title || *line == head.author)
        {
            return Err(ContractViolation::HeadEcho {
                line: line.to_string(),
            });
        }

        let truncated = self.disclosure.find(&explanation).is_some();
        let citation = extract_citation(&explanation);

        Ok(RecommendationResponse {
            title: head.title,
            author: head.author,
            body: head.body,
            explanation,
            citation,
            truncated,
        })
    }

    /// Returns the first personal-attribute term found in `text`.
    pub fn scan_identity(&self, text: &str) -> Option<String> {
        self.identity.find(text)
    }
}
