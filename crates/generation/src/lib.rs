//! Generation collaborators for photopoem.
//!
//! - [`CandidateSelector`] hands the retrieved candidates to a [`PoemWriter`]
//!   together with the signal summary and the output rules, and returns
//!   whatever text comes back as a [`RawGenerationOutput`]. Callers must run
//!   the output contract before trusting its structure.
//! - [`Captioner`] turns a photo URL into a short Korean caption.
//!
//! Both talk to an OpenAI-compatible chat completions endpoint by default
//! ([`ChatCompletionsWriter`], [`VisionCaptioner`]); tests substitute their
//! own trait implementations.

mod caption;
mod config;
mod error;
mod http;
mod prompt;
mod selector;
mod writer;

pub use caption::{Captioner, VisionCaptioner};
pub use config::{ExcerptPolicy, GenerationConfig, Tone};
pub use error::GenerationError;
pub use prompt::{build_messages, ChatMessage, Role, DISCLOSURE_SENTENCE};
pub use selector::{CandidateSelector, RawGenerationOutput};
pub use writer::{ChatCompletionsWriter, PoemWriter};
