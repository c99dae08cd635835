use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// NFC + lowercase, the form every match runs on.
pub(crate) fn fold(text: &str) -> String {
    text.nfc().collect::<String>().to_lowercase()
}

/// Case-insensitive term list. ASCII terms match whole words, the rest substrings.
#[derive(Debug, Clone)]
pub(crate) struct TermMatcher {
    words: Option<Regex>,
    substrings: Vec<(String, String)>,
}

impl TermMatcher {
    pub(crate) fn new<S: AsRef<str>>(terms: &[S]) -> Result<Self, regex::Error> {
        let mut word_parts = Vec::new();
        let mut substrings = Vec::new();
        for term in terms {
            let term = term.as_ref().trim();
            if term.is_empty() {
                continue;
            }
            let folded = fold(term);
            if term.is_ascii() {
                word_parts.push(regex::escape(&folded));
            } else {
                substrings.push((folded, term.to_string()));
            }
        }
        let words = if word_parts.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(r"\b(?:{})\b", word_parts.join("|")))?)
        };
        Ok(Self { words, substrings })
    }

    /// First matching term, if any.
    pub(crate) fn find(&self, text: &str) -> Option<String> {
        let folded = fold(text);
        if let Some(m) = self.words.as_ref().and_then(|re| re.find(&folded)) {
            return Some(m.as_str().to_string());
        }
        self.substrings
            .iter()
            .find(|(needle, _)| folded.contains(needle.as_str()))
            .map(|(_, original)| original.clone())
    }
}
