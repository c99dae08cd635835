//! Line-level segmentation of generated text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ContractViolation;

/// Sentence end followed by whitespace: `.`, `!`, `?`, `…` or `。`, optionally
/// followed by closing quotes or brackets.
static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.!?…。]["'”’)\]」』]*\s+"#).expect("valid sentence regex"));

/// Where a citation starts when it is labelled.
static CITATION_ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)출처|\bsource\b").expect("valid citation regex"));

pub(crate) fn normalize_newlines(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "\n")
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Splits `text` into head (poem) and tail (explanation) at the separator.
///
/// The separator is the first run of two or more blank lines. Without one, the
/// last single blank line is used, so stanza breaks inside the poem never end
/// the head early when the explanation is a single paragraph.
pub(crate) fn split_head_tail(text: &str) -> Result<(Vec<&str>, Vec<&str>), ContractViolation> {
    let lines: Vec<&str> = text.split('\n').collect();

    let mut runs: Vec<(usize, usize)> = Vec::new();
    let mut idx = 0;
    while idx < lines.len() {
        if is_blank(lines[idx]) {
            let start = idx;
            while idx < lines.len() && is_blank(lines[idx]) {
                idx += 1;
            }
            runs.push((start, idx - start));
        } else {
            idx += 1;
        }
    }

    let (start, len) = runs
        .iter()
        .copied()
        .find(|&(_, len)| len >= 2)
        .or_else(|| runs.last().copied())
        .ok_or(ContractViolation::MissingSeparator)?;

    Ok((lines[..start].to_vec(), lines[start + len..].to_vec()))
}

pub(crate) struct Head {
    pub title: String,
    pub author: String,
    pub body: Vec<Vec<String>>,
}

/// First line title, second line author, the rest stanzas split on blank lines.
pub(crate) fn parse_head(lines: &[&str]) -> Result<Head, ContractViolation> {
    let non_empty = lines.iter().filter(|l| !is_blank(l)).count();
    if non_empty < 3 || lines.len() < 3 || is_blank(lines[0]) || is_blank(lines[1]) {
        return Err(ContractViolation::MalformedHead { lines: non_empty });
    }

    let mut body: Vec<Vec<String>> = Vec::new();
    let mut stanza: Vec<String> = Vec::new();
    for line in &lines[2..] {
        if is_blank(line) {
            if !stanza.is_empty() {
                body.push(std::mem::take(&mut stanza));
            }
        } else {
            stanza.push(line.trim_end().to_string());
        }
    }
    if !stanza.is_empty() {
        body.push(stanza);
    }
    if body.is_empty() {
        return Err(ContractViolation::MalformedHead { lines: non_empty });
    }

    Ok(Head {
        title: lines[0].trim().to_string(),
        author: lines[1].trim().to_string(),
        body,
    })
}

/// Paragraphs of `lines` split on blank lines, each joined by a space.
pub(crate) fn paragraphs(lines: &[&str]) -> Vec<String> {
    lines
        .split(|l| is_blank(l))
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| chunk.iter().map(|l| l.trim()).collect::<Vec<_>>().join(" "))
        .collect()
}

/// True when `text` holds no sentence boundary before its end.
pub(crate) fn is_single_sentence(text: &str) -> bool {
    !SENTENCE_BOUNDARY.is_match(text.trim())
}

/// A period right after a lone capital (`R. Frost`) ends an initial.
fn is_initial(line: &str, at: usize) -> bool {
    if !line[at..].starts_with('.') {
        return false;
    }
    let word = line[..at]
        .rsplit(|c: char| c.is_whitespace() || c == '(' || c == ',')
        .next()
        .unwrap_or_default();
    word.len() == 1 && word.chars().all(|c| c.is_ascii_uppercase())
}

/// The trailing citation of the explanation's last line.
///
/// A labelled citation (`출처:` / `Source:`) runs from its last label to the
/// end of the line. Otherwise the last sentence is taken, not counting
/// periods after initials.
pub(crate) fn extract_citation(explanation: &str) -> String {
    let last_line = explanation
        .lines()
        .rev()
        .find(|l| !is_blank(l))
        .unwrap_or_default()
        .trim();
    if let Some(anchor) = CITATION_ANCHOR.find_iter(last_line).last() {
        return last_line[anchor.start()..].trim().to_string();
    }
    let boundary = SENTENCE_BOUNDARY
        .find_iter(last_line)
        .filter(|m| !is_initial(last_line, m.start()))
        .last();
    match boundary {
        Some(m) if m.end() < last_line.len() => last_line[m.end()..].trim().to_string(),
        _ => last_line.to_string(),
    }
}
