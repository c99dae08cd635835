//! Signal fusion for photo-to-poem retrieval.
//!
//! A recommendation request carries up to three signals: a caption generated
//! from the user's photograph, free narrative text, and a coarse mood tag.
//! Retrieval needs exactly one embedding, so the signals are folded into one
//! [`CompositeQuery`] first.
//!
//! ## Rules
//!
//! - Fixed order: caption, free text, mood tag. The caption leads whenever
//!   it is present.
//! - Each field is trimmed; a field that is blank after trimming is dropped.
//! - Surviving fields are joined with a single ASCII space. Inner whitespace
//!   is left alone so the query text stays byte-comparable with the corpus.
//!
//! Pure function: no I/O, same signals in, same query out.
//!
//! ```rust
//! use fusion::{fuse, QuerySignals};
//!
//! let signals = QuerySignals::new()
//!     .with_caption("바닷가에 선 두 사람")
//!     .with_mood("그리움");
//! let query = fuse(&signals).unwrap();
//! assert_eq!(query.as_str(), "바닷가에 선 두 사람 그리움");
//! ```

mod error;
mod signals;

pub use crate::error::FusionError;
pub use crate::signals::{CompositeQuery, QuerySignals};

/// Fuse the present signals into a composite query string.
///
/// Fails with [`FusionError::InvalidSignals`] when every field is absent or
/// whitespace-only.
pub fn fuse(signals: &QuerySignals) -> Result<CompositeQuery, FusionError> {
    let mut out = String::new();
    for field in signals.present_fields() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(field);
    }
    if out.is_empty() {
        return Err(FusionError::InvalidSignals);
    }
    Ok(CompositeQuery::new(out))
}
