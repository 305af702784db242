//! Shared Serde helpers
//!
//! Default value functions and lenient deserializers for query strings and
//! config values, where booleans arrive as `"1"`, `"yes"` or `"true"`.

use serde::{Deserialize, Deserializer};

// ============================================================================
// Default Value Functions (for serde #[serde(default = "...")] attributes)
// ============================================================================

/// Default value: true
pub fn bool_true() -> bool {
    true
}

/// Default value: false
pub fn bool_false() -> bool {
    false
}

// ============================================================================
// Custom Deserializers
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrStringOrInt {
    Bool(bool),
    Int(i64),
    String(String),
}

fn parse_flexible(value: BoolOrStringOrInt) -> Result<Option<bool>, String> {
    match value {
        BoolOrStringOrInt::Bool(b) => Ok(Some(b)),
        BoolOrStringOrInt::Int(0) => Ok(Some(false)),
        BoolOrStringOrInt::Int(1) => Ok(Some(true)),
        BoolOrStringOrInt::Int(i) => Err(format!("Invalid integer value {}, expected 0 or 1", i)),
        BoolOrStringOrInt::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                Ok(None)
            } else if t == "1" || t.eq_ignore_ascii_case("true") || t.eq_ignore_ascii_case("yes")
            {
                Ok(Some(true))
            } else if t == "0" || t.eq_ignore_ascii_case("false") || t.eq_ignore_ascii_case("no")
            {
                Ok(Some(false))
            } else {
                Err(format!(
                    "Invalid boolean value '{}', expected true/false, 1/0 or yes/no",
                    s
                ))
            }
        },
    }
}

/// Boolean that accepts native booleans, 0/1, and "true"/"false"/"yes"/"no"
/// (case-insensitive). An empty string is `false`.
pub fn deserialize_bool_flexible<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = BoolOrStringOrInt::deserialize(deserializer)?;
    parse_flexible(value)
        .map(|b| b.unwrap_or(false))
        .map_err(D::Error::custom)
}

/// Optional variant of [`deserialize_bool_flexible`]; empty strings map to `None`
pub fn deserialize_optional_bool_flexible<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<BoolOrStringOrInt>::deserialize(deserializer)? {
        None => Ok(None),
        Some(value) => parse_flexible(value).map_err(D::Error::custom),
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Flag {
        #[serde(deserialize_with = "deserialize_bool_flexible")]
        value: bool,
    }

    #[derive(Deserialize)]
    struct MaybeFlag {
        #[serde(default, deserialize_with = "deserialize_optional_bool_flexible")]
        value: Option<bool>,
    }

    fn flag(json: &str) -> Result<bool, serde_json::Error> {
        serde_json::from_str::<Flag>(json).map(|f| f.value)
    }

    #[test]
    fn test_bool_flexible() {
        assert!(flag(r#"{"value": true}"#).unwrap());
        assert!(flag(r#"{"value": 1}"#).unwrap());
        assert!(flag(r#"{"value": "YES"}"#).unwrap());
        assert!(!flag(r#"{"value": "0"}"#).unwrap());
        assert!(!flag(r#"{"value": ""}"#).unwrap());
        assert!(flag(r#"{"value": 2}"#).is_err());
        assert!(flag(r#"{"value": "maybe"}"#).is_err());
    }

    #[test]
    fn test_optional_bool_flexible() {
        let parse = |json: &str| serde_json::from_str::<MaybeFlag>(json).unwrap().value;
        assert_eq!(parse(r#"{}"#), None);
        assert_eq!(parse(r#"{"value": null}"#), None);
        assert_eq!(parse(r#"{"value": ""}"#), None);
        assert_eq!(parse(r#"{"value": "true"}"#), Some(true));
        assert_eq!(parse(r#"{"value": false}"#), Some(false));
    }
}
