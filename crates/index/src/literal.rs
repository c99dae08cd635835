//! pgvector text format: `[0.01,-0.02,...]`.

use crate::IndexError;

/// Encodes `v` as a bracketed, comma-separated literal.
pub fn to_vector_literal(v: &[f32]) -> String {
    let mut out = String::with_capacity(v.len() * 10 + 2);
    out.push('[');
    for (idx, value) in v.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        out.push_str(&value.to_string());
    }
    out.push(']');
    out
}

/// Parses a literal produced by [`to_vector_literal`] or by `vector::text`.
pub fn parse_vector_literal(s: &str) -> Result<Vec<f32>, IndexError> {
    let inner = s
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| IndexError::backend(format!("malformed vector literal: {s:.32}")))?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .map_err(|e| IndexError::backend(format!("bad vector component `{part}`: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_bracketed_comma_separated() {
        assert_eq!(to_vector_literal(&[0.01, -0.02, 1.0]), "[0.01,-0.02,1]");
        assert_eq!(to_vector_literal(&[]), "[]");
    }

    #[test]
    fn parses_store_output() {
        let v = parse_vector_literal("[0.5, -0.25,1e-3]").unwrap();
        assert_eq!(v, vec![0.5, -0.25, 0.001]);
        assert!(parse_vector_literal("[]").unwrap().is_empty());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_vector_literal("0.5,0.25").is_err());
        assert!(parse_vector_literal("[0.5,abc]").is_err());
    }

    #[test]
    fn literal_survives_a_trip_through_text() {
        let v = vec![0.123_456_7f32, -0.000_1, 42.0];
        assert_eq!(parse_vector_literal(&to_vector_literal(&v)).unwrap(), v);
    }
}
