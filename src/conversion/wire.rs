// Wire Coercion - canonical codec adapted to the API layer's scalar lifecycle

use serde_json::Value;
use std::any::Any;
use std::fmt;
use tracing::debug;

use crate::conversion::codec::{Canonical, Codec};
use crate::error::{AppError, AppResult};

/// A literal as handed over by the request parser, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum WireLiteral {
    Null,
    String(String),
    /// Any other literal kind; carries its rendering for error messages.
    Other(String),
}

impl From<&Value> for WireLiteral {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => WireLiteral::Null,
            Value::String(s) => WireLiteral::String(s.clone()),
            other => WireLiteral::Other(other.to_string()),
        }
    }
}

impl fmt::Display for WireLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireLiteral::Null => write!(f, "null"),
            WireLiteral::String(s) => write!(f, "{:?}", s),
            WireLiteral::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Named API scalar backed by the canonical encoding of `T`.
pub struct WireScalar<T> {
    name: &'static str,
    codec: Codec<T>,
}

impl<T: Canonical> WireScalar<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            codec: Codec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Emit the canonical string literal for a value produced internally.
    pub fn serialize(&self, result: &dyn Any) -> AppResult<String> {
        match result.downcast_ref::<T>() {
            Some(value) => self.codec.encode(value),
            None => Err(AppError::SerializationError(format!(
                "Not a valid {} ({})",
                self.name,
                T::type_name()
            ))),
        }
    }

    /// Coerce a transmitted value.
    ///
    /// A string is first read as the canonical encoding and otherwise as the
    /// value itself; structured input is decoded directly.
    pub fn parse_value(&self, input: &Value) -> AppResult<T> {
        let decoded = match input {
            Value::String(raw) => self
                .codec
                .decode(raw)
                .or_else(|_| self.codec.decode_value(input)),
            other => self.codec.decode_value(other),
        };

        decoded.map_err(|_| {
            AppError::InvalidInput(format!(
                "{} is not a valid representation of {}!",
                input, self.name
            ))
        })
    }

    /// Coerce a literal from a request document.
    ///
    /// An undecodable string literal yields `None` rather than an error. Any
    /// non-string, non-null literal is rejected.
    pub fn parse_literal(&self, input: &WireLiteral) -> AppResult<Option<T>> {
        match input {
            WireLiteral::Null => Ok(None),
            WireLiteral::String(raw) => match self.codec.decode(raw) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    debug!(scalar = self.name, error = %e, "ignoring undecodable string literal");
                    Ok(None)
                }
            },
            WireLiteral::Other(_) => Err(AppError::InvalidLiteral(format!(
                "{} is not a valid representation of {}!",
                input, self.name
            ))),
        }
    }
}

impl<T> fmt::Debug for WireScalar<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireScalar").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Rule {
        icon: String,
        text: String,
    }

    crate::canonical!(Rule);

    const RULES: WireScalar<Vec<Rule>> = WireScalar::new("Rules");
    const INSTANT: WireScalar<DateTime<Utc>> = WireScalar::new("Instant");

    fn no_smoking() -> Vec<Rule> {
        vec![Rule {
            icon: "smoke".to_string(),
            text: "No smoking inside".to_string(),
        }]
    }

    #[test]
    fn test_serialize_emits_canonical_literal() {
        let literal = RULES.serialize(&no_smoking()).unwrap();
        assert_eq!(literal, r#"[{"icon":"smoke","text":"No smoking inside"}]"#);
    }

    #[test]
    fn test_serialize_rejects_other_types() {
        let result = RULES.serialize(&"not rules".to_string());
        assert!(matches!(result, Err(AppError::SerializationError(_))));
    }

    #[test]
    fn test_parse_value_accepts_canonical_string_and_structured_input() {
        let canonical = json!(r#"[{"icon":"smoke","text":"No smoking inside"}]"#);
        assert_eq!(RULES.parse_value(&canonical).unwrap(), no_smoking());

        let structured = json!([{"icon": "smoke", "text": "No smoking inside"}]);
        assert_eq!(RULES.parse_value(&structured).unwrap(), no_smoking());

        let at = Utc.with_ymd_and_hms(2024, 6, 1, 21, 30, 0).unwrap();
        assert_eq!(INSTANT.parse_value(&json!("2024-06-01T21:30:00Z")).unwrap(), at);
        assert_eq!(INSTANT.parse_value(&json!("\"2024-06-01T21:30:00Z\"")).unwrap(), at);
    }

    #[test]
    fn test_parse_value_rejects_garbage() {
        for input in [json!("not json"), json!(null), json!(42), json!([{"icon": "x"}])] {
            assert!(
                matches!(RULES.parse_value(&input), Err(AppError::InvalidInput(_))),
                "{} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(RULES.parse_literal(&WireLiteral::Null).unwrap(), None);

        let literal = WireLiteral::String(r#"[{"icon":"smoke","text":"No smoking inside"}]"#.into());
        assert_eq!(RULES.parse_literal(&literal).unwrap(), Some(no_smoking()));

        let garbage = WireLiteral::String("not json".to_string());
        assert_eq!(RULES.parse_literal(&garbage).unwrap(), None);

        let number = WireLiteral::from(&json!(12));
        assert!(matches!(RULES.parse_literal(&number), Err(AppError::InvalidLiteral(_))));
    }

    #[test]
    fn test_literal_from_json() {
        assert_eq!(WireLiteral::from(&json!(null)), WireLiteral::Null);
        assert_eq!(WireLiteral::from(&json!("x")), WireLiteral::String("x".into()));
        assert_eq!(WireLiteral::from(&json!([1])), WireLiteral::Other("[1]".into()));
        assert_eq!(RULES.name(), "Rules");
    }
}
