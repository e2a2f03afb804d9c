//! CorrectionValue - The value a field correction writes
//!
//! "Set this field to null" is an explicit variant, distinct from any
//! notion of an omitted argument.

use serde_json::Value;

/// The replacement written at a correction path.
#[derive(Debug, Clone, PartialEq)]
pub enum CorrectionValue {
    /// Write an explicit null.
    Null,
    /// Write this (non-null) JSON value.
    Set(Value),
}

impl CorrectionValue {
    /// Builds a value, normalizing JSON null to `CorrectionValue::Null`.
    pub fn set(value: impl Into<Value>) -> Self {
        match value.into() {
            Value::Null => CorrectionValue::Null,
            other => CorrectionValue::Set(other),
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, CorrectionValue::Null)
    }

    /// The JSON written at the path.
    pub fn to_json(&self) -> Value {
        match self {
            CorrectionValue::Null => Value::Null,
            CorrectionValue::Set(v) => v.clone(),
        }
    }
}

impl From<Value> for CorrectionValue {
    fn from(value: Value) -> Self {
        CorrectionValue::set(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_is_normalized() {
        assert_eq!(CorrectionValue::from(Value::Null), CorrectionValue::Null);
        assert!(CorrectionValue::set(Value::Null).is_null());
    }

    #[test]
    fn test_set_keeps_value() {
        let v = CorrectionValue::set(json!({"city": "Oslo"}));
        assert_eq!(v.to_json(), json!({"city": "Oslo"}));
        assert!(!v.is_null());
    }
}
