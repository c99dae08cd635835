use serde::{Deserialize, Serialize};

/// A generated recommendation that passed the output contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub title: String,
    pub author: String,
    /// Stanzas in order, each a list of lines. Never empty.
    pub body: Vec<Vec<String>>,
    /// Full explanation segment, citation included.
    pub explanation: String,
    /// Trailing sentence of the explanation naming the source.
    pub citation: String,
    /// Whether the explanation discloses that only part of the poem is shown.
    pub truncated: bool,
}

impl RecommendationResponse {
    pub fn line_count(&self) -> usize {
        self.body.iter().map(Vec::len).sum()
    }

    /// Renders back to contract layout: title, author, body, one blank line, explanation.
    pub fn render(&self) -> String {
        let body = self
            .body
            .iter()
            .map(|stanza| stanza.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\n");
        format!(
            "{}\n{}\n{}\n\n{}",
            self.title, self.author, body, self.explanation
        )
    }
}
