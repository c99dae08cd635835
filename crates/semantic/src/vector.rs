use serde_json::Value;

use crate::SemanticError;

/// Validates a raw embedding value and converts it to `f32`.
///
/// Accepts a JSON array of exactly `dimension` finite numbers. Some providers
/// return the array JSON-encoded inside a string; that string is parsed once
/// and the result goes through the same checks. Anything else is a
/// [`SemanticError::Format`].
pub fn validate_embedding(value: Value, dimension: usize) -> Result<Vec<f32>, SemanticError> {
    match value {
        Value::String(encoded) => {
            let decoded: Value = serde_json::from_str(&encoded).map_err(|e| {
                SemanticError::Format(format!("embedding string is not valid JSON: {e}"))
            })?;
            match decoded {
                Value::Array(items) => collect_numbers(items, dimension),
                other => Err(SemanticError::Format(format!(
                    "embedding string must decode to an array, got {}",
                    kind_of(&other)
                ))),
            }
        }
        Value::Array(items) => collect_numbers(items, dimension),
        other => Err(SemanticError::Format(format!(
            "embedding must be an array, got {}",
            kind_of(&other)
        ))),
    }
}

/// Checks an already-numeric vector: right length, every value finite.
pub fn check_vector(vector: &[f32], dimension: usize) -> Result<(), SemanticError> {
    if vector.len() != dimension {
        return Err(SemanticError::Format(format!(
            "expected {dimension} values, got {}",
            vector.len()
        )));
    }
    if let Some(pos) = vector.iter().position(|v| !v.is_finite()) {
        return Err(SemanticError::Format(format!(
            "non-finite value at position {pos}"
        )));
    }
    Ok(())
}

fn collect_numbers(items: Vec<Value>, dimension: usize) -> Result<Vec<f32>, SemanticError> {
    if items.len() != dimension {
        return Err(SemanticError::Format(format!(
            "expected {dimension} values, got {}",
            items.len()
        )));
    }
    let vector = items
        .into_iter()
        .enumerate()
        .map(|(pos, entry)| match entry {
            Value::Number(num) => num.as_f64().map(|f| f as f32).ok_or_else(|| {
                SemanticError::Format(format!("unrepresentable number at position {pos}"))
            }),
            other => Err(SemanticError::Format(format!(
                "embedding entries must be numbers, got {} at position {pos}",
                kind_of(&other)
            ))),
        })
        .collect::<Result<Vec<f32>, _>>()?;
    check_vector(&vector, dimension)?;
    Ok(vector)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_numeric_array_of_exact_dimension() {
        let v = validate_embedding(json!([0.1, -0.2, 0.3]), 3).unwrap();
        assert_eq!(v.len(), 3);
        assert!((v[1] + 0.2).abs() < 1e-6);
    }

    #[test]
    fn json_encoded_string_is_parsed_once() {
        let v = validate_embedding(json!("[1, 2, 3, 4]"), 4).unwrap();
        assert_eq!(v, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn doubly_encoded_string_is_rejected() {
        let inner = serde_json::to_string("[1, 2]").unwrap();
        let err = validate_embedding(Value::String(inner), 2).unwrap_err();
        assert!(matches!(err, SemanticError::Format(_)));
    }

    #[test]
    fn wrong_length_is_a_format_error() {
        let err = validate_embedding(json!([1.0, 2.0]), 3).unwrap_err();
        assert_eq!(
            err,
            SemanticError::Format("expected 3 values, got 2".into())
        );
    }

    #[test]
    fn non_numeric_entries_are_rejected() {
        assert!(validate_embedding(json!([1.0, "2", 3.0]), 3).is_err());
        assert!(validate_embedding(json!([1.0, null, 3.0]), 3).is_err());
        assert!(validate_embedding(json!({"x": 1}), 1).is_err());
        assert!(validate_embedding(json!("not json"), 1).is_err());
    }

    #[test]
    fn check_vector_catches_nan() {
        assert!(check_vector(&[0.0, f32::NAN], 2).is_err());
        assert!(check_vector(&[0.0, 1.0], 2).is_ok());
        assert!(check_vector(&[0.0], 2).is_err());
    }
}
