use serde::{Deserialize, Serialize};

/// The three heterogeneous signals a recommendation is derived from.
///
/// Every field is optional; a field that is empty after trimming counts as
/// absent. Fusion order is fixed: caption, then free text, then mood tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySignals {
    /// Caption produced from the user's photograph.
    #[serde(default)]
    pub image_caption: Option<String>,
    /// Free-form narrative text ("story").
    #[serde(default)]
    pub free_text: Option<String>,
    /// Coarse mood tag such as `"그리움"` or `"calm"`.
    #[serde(default)]
    pub mood_tag: Option<String>,
}

impl QuerySignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.image_caption = Some(caption.into());
        self
    }

    pub fn with_free_text(mut self, text: impl Into<String>) -> Self {
        self.free_text = Some(text.into());
        self
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood_tag = Some(mood.into());
        self
    }

    /// Trimmed caption, `None` when absent or blank.
    pub fn caption(&self) -> Option<&str> {
        present(self.image_caption.as_deref())
    }

    /// Trimmed free text, `None` when absent or blank.
    pub fn text(&self) -> Option<&str> {
        present(self.free_text.as_deref())
    }

    /// Trimmed mood tag, `None` when absent or blank.
    pub fn mood(&self) -> Option<&str> {
        present(self.mood_tag.as_deref())
    }

    /// Present signals in fusion order.
    pub fn present_fields(&self) -> impl Iterator<Item = &str> {
        [self.caption(), self.text(), self.mood()]
            .into_iter()
            .flatten()
    }

    /// Whether at least one signal survives trimming.
    pub fn is_empty(&self) -> bool {
        self.present_fields().next().is_none()
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Fused query string used to derive the retrieval embedding.
///
/// Only [`crate::fuse`] constructs one, so a `CompositeQuery` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CompositeQuery(String);

impl CompositeQuery {
    pub(crate) fn new(text: String) -> Self {
        debug_assert!(!text.is_empty());
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for CompositeQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CompositeQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_absent() {
        let signals = QuerySignals {
            image_caption: Some("   ".into()),
            free_text: Some("\n\t".into()),
            mood_tag: None,
        };
        assert!(signals.caption().is_none());
        assert!(signals.text().is_none());
        assert!(signals.is_empty());
    }

    #[test]
    fn accessors_trim() {
        let signals = QuerySignals::new().with_mood("  calm ");
        assert_eq!(signals.mood(), Some("calm"));
        assert!(!signals.is_empty());
    }

    #[test]
    fn deserializes_with_missing_fields() {
        let signals: QuerySignals = serde_json::from_str(r#"{"mood_tag":"설렘"}"#).unwrap();
        assert_eq!(signals.mood(), Some("설렘"));
        assert!(signals.image_caption.is_none());
    }
}
