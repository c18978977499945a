use std::collections::HashMap;

use crate::error::ApiError;
use crate::validator::Validator;

/// Parse an `:id` path segment. Anything that is not a positive integer is
/// treated as a missing resource.
pub fn read_id(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(ApiError::NotFound),
    }
}

pub fn read_string(qs: &HashMap<String, String>, key: &str, default: &str) -> String {
    match qs.get(key) {
        Some(value) if !value.is_empty() => value.clone(),
        _ => default.to_string(),
    }
}

/// Comma separated values, e.g. `?genres=crime,drama`.
pub fn read_csv(qs: &HashMap<String, String>, key: &str, default: &[&str]) -> Vec<String> {
    match qs.get(key) {
        Some(value) if !value.is_empty() => value.split(',').map(str::to_string).collect(),
        _ => default.iter().map(|s| s.to_string()).collect(),
    }
}

/// Integer value for `key`, or `default` when absent. A value that does not
/// parse is recorded on the validator and `default` is returned.
pub fn read_int(qs: &HashMap<String, String>, key: &str, default: i64, v: &mut Validator) -> i64 {
    match qs.get(key) {
        Some(value) if !value.is_empty() => match value.parse::<i64>() {
            Ok(n) => n,
            Err(_) => {
                v.add_error(key, "must be an integer value");
                default
            }
        },
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(read_id("42").unwrap(), 42);
        for raw in ["0", "-1", "abc", "1.5", ""] {
            assert!(matches!(read_id(raw), Err(ApiError::NotFound)), "{}", raw);
        }
    }

    #[test]
    fn strings_and_csv_fall_back_to_defaults() {
        let q = qs(&[("title", "moana"), ("genres", "crime,drama"), ("empty", "")]);
        assert_eq!(read_string(&q, "title", ""), "moana");
        assert_eq!(read_string(&q, "missing", "id"), "id");
        assert_eq!(read_string(&q, "empty", "id"), "id");
        assert_eq!(read_csv(&q, "genres", &[]), vec!["crime", "drama"]);
        assert!(read_csv(&q, "missing", &[]).is_empty());
    }

    #[test]
    fn bad_integers_are_validation_errors() {
        let q = qs(&[("page", "two"), ("page_size", "5")]);
        let mut v = Validator::new();
        assert_eq!(read_int(&q, "page", 1, &mut v), 1);
        assert_eq!(read_int(&q, "page_size", 20, &mut v), 5);
        assert_eq!(read_int(&q, "missing", 7, &mut v), 7);
        assert_eq!(
            v.errors().get("page").map(String::as_str),
            Some("must be an integer value")
        );
        assert_eq!(v.errors().len(), 1);
    }
}
