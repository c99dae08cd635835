//! Instruction text for the writer model.
//!
//! The writer sees the signals, a numbered candidate list and a fixed set of
//! output rules. Everything it returns is still checked by the output
//! contract; these rules only make a compliant answer likely.

use fusion::QuerySignals;
use index::ScoredPoem;
use serde::{Deserialize, Serialize};

use crate::{ExcerptPolicy, GenerationConfig, Tone};

/// Sentence the writer must put in the explanation when it shortens a poem.
pub const DISCLOSURE_SENTENCE: &str = "시가 너무 길어 첫 연만 보여드립니다.";

/// Placeholder for a missing signal.
const NONE_MARKER: &str = "없음";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

pub fn build_messages(
    signals: &QuerySignals,
    candidates: &[ScoredPoem],
    cfg: &GenerationConfig,
) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt(candidates.len())),
        ChatMessage::user(user_prompt(signals, candidates, cfg)),
    ]
}

fn system_prompt(count: usize) -> String {
    format!(
        "너는 한국 시에 정통한 전문가야. 아래 조건들을 고려해 {count}개의 시 중에서 \
         입력 정보에 가장 잘 어울리는 하나를 선택해."
    )
}

pub(crate) fn signal_summary(signals: &QuerySignals) -> String {
    format!(
        "사진 설명: {}\n사연 또는 텍스트: {}\n기분 태그: {}",
        signals.caption().unwrap_or(NONE_MARKER),
        signals.text().unwrap_or(NONE_MARKER),
        signals.mood().unwrap_or(NONE_MARKER),
    )
}

pub(crate) fn candidate_list(candidates: &[ScoredPoem]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(idx, hit)| {
            let poem = &hit.record;
            format!(
                "({}) 시 제목: {}, 시인: {}\n내용: {}\n출처: {}",
                idx + 1,
                poem.title,
                poem.author,
                poem.excerpt,
                poem.source
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub(crate) fn excerpt_rules(policy: ExcerptPolicy, max_lines: usize) -> String {
    let shortened = format!(
        "첫 연만(최대 {max_lines}행) 그대로 출력하고, 설명 안에 \"{DISCLOSURE_SENTENCE}\"라는 문장을 넣을 것. \
         이 문장은 제목, 본문, 본문과 설명 사이 등 설명 밖에는 절대 쓰지 말 것."
    );
    match policy {
        ExcerptPolicy::FullText => {
            "- 시 본문은 생략이나 축약 없이 전문을 그대로 출력할 것.".to_string()
        }
        ExcerptPolicy::FirstStanzaWhenProtected { cutoff_year } => format!(
            "- 시인이 {cutoff_year}년 이전에 세상을 떠났거나 {cutoff_year}년 이전에 발표된 시는 전문을 그대로 출력할 것.\n\
             - 그 밖의 시는 {shortened}"
        ),
        ExcerptPolicy::FirstStanzaAlways => format!("- 시 본문은 {shortened}"),
    }
}

pub(crate) fn tone_rules(tone: Tone) -> &'static str {
    match tone {
        Tone::Playful => {
            "설명은 귀엽고 다정한 어린아이 말투의 반말로 작성할 것. \
             예: \"이 시는 말이지, 사진이랑 기분이랑 너무 잘 어울리는 것 같아서 골랐어!\" \
             '사용자'라는 말은 쓰지 말고 바로 말을 거는 느낌으로 써줘."
        }
        Tone::Warm => {
            "설명은 따뜻하고 다정한 존댓말로 작성할 것. '사용자'라는 말은 쓰지 말고 바로 말을 거는 느낌으로 써줘."
        }
        Tone::Plain => "설명은 담백하고 차분한 존댓말로 작성할 것. '사용자'라는 말은 쓰지 말 것.",
    }
}

fn user_prompt(signals: &QuerySignals, candidates: &[ScoredPoem], cfg: &GenerationConfig) -> String {
    let mut out = String::with_capacity(2048);
    out.push_str("입력 정보는 다음과 같아:\n\n");
    out.push_str(&signal_summary(signals));
    out.push_str(&format!("\n\n아래는 추천된 {}개의 시야:\n\n", candidates.len()));
    out.push_str(&candidate_list(candidates));
    out.push_str(
        "\n\n이 중에서 가장 어울리는 시 하나만 골라줘. 목록에 없는 시를 새로 짓거나 지어내지 말 것.\
         \n\n제목, 시인, 본문은 추천된 시 그대로 옮길 것 (바꿔 쓰거나 요약하지 말 것). \
         아래의 출력 순서를 철저히 지킬 것. 출력 순서가 어긋나면 오답으로 간주한다:\n\
         - 첫 줄: 시 제목 (시 제목만)\n\
         - 둘째 줄: 시인 이름 (시인 이름만)\n\
         - 셋째 줄부터: 시 본문 (각 행은 \\n 으로 줄바꿈, 연과 연 사이는 반드시 \\n\\n 으로 구분)\n\
         - 시 본문이 끝나면 반드시 빈 줄 한 줄\n\
         - 그 다음: 왜 이 시를 골랐는지 설명. 사진, 사연, 기분을 자연스럽게 엮되 '사진 설명', '사연 또는 텍스트', '기분 태그' 같은 항목 이름은 쓰지 말 것.\n\
         - 설명 마지막 문장에 출처를 자연스럽게 이어붙일 것. 출처만 따로 떼어 한 줄로 쓰지 말 것.\n\
         - 설명에 시 제목이나 시인 이름만 있는 줄을 다시 쓰지 말 것.\n\
         - 얼굴, 나이, 성별 같은 개인적인 특징은 설명에 절대 언급하지 말 것.\n",
    );
    out.push_str(&excerpt_rules(cfg.excerpt_policy, cfg.max_excerpt_lines));
    out.push_str("\n\n");
    out.push_str(tone_rules(cfg.tone));
    out
}
