//! Attribute constraints and their evaluation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Comparison operators for attribute constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    /// Attribute equals value
    Eq,
    /// Attribute does not equal value
    Ne,
    /// Attribute contains value (substring or array element)
    Contains,
    /// Attribute is numerically greater than value
    Gt,
    /// Attribute is numerically less than value
    Lt,
    /// Attribute is present, value ignored
    Exists,
}

impl CompareOp {
    /// Parse an operator, accepting the symbolic forms of the legacy API.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "=" | "==" | "EQ" => Some(Self::Eq),
            "!=" | "<>" | "NE" => Some(Self::Ne),
            "LIKE" | "CONTAINS" => Some(Self::Contains),
            ">" | "GT" => Some(Self::Gt),
            "<" | "LT" => Some(Self::Lt),
            "EXISTS" => Some(Self::Exists),
            _ => None,
        }
    }
}

/// A key/operator/value constraint on an item's attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeFilter {
    /// Attribute name
    pub key: String,
    /// Comparison operation
    pub op: CompareOp,
    /// Value to compare against
    #[serde(default)]
    pub value: Value,
}

impl AttributeFilter {
    /// Create an equality filter.
    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, CompareOp::Eq, value)
    }

    /// Create a not-equal filter.
    pub fn ne(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, CompareOp::Ne, value)
    }

    /// Create a contains filter.
    pub fn contains(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, CompareOp::Contains, value)
    }

    /// Create an existence filter.
    pub fn exists(key: impl Into<String>) -> Self {
        Self::new(key, CompareOp::Exists, Value::Null)
    }

    pub fn new(key: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            op,
            value: value.into(),
        }
    }

    /// Check if an attribute map satisfies this filter.
    ///
    /// Stored attributes often arrive as strings, so equality falls back to
    /// comparing string renderings when the JSON types differ.
    pub fn matches(&self, attributes: &BTreeMap<String, Value>) -> bool {
        let field_value = attributes.get(&self.key);

        match &self.op {
            CompareOp::Exists => field_value.is_some(),
            CompareOp::Eq => match field_value {
                Some(v) => loose_eq(v, &self.value),
                None => self.value.is_null(),
            },
            CompareOp::Ne => match field_value {
                Some(v) => !loose_eq(v, &self.value),
                None => !self.value.is_null(),
            },
            CompareOp::Contains => match field_value {
                Some(Value::String(s)) => match &self.value {
                    Value::String(needle) => s.to_lowercase().contains(&needle.to_lowercase()),
                    _ => false,
                },
                Some(Value::Array(arr)) => arr.iter().any(|v| loose_eq(v, &self.value)),
                _ => false,
            },
            CompareOp::Gt => compare_numbers(field_value, &self.value).is_some_and(|o| o.is_gt()),
            CompareOp::Lt => compare_numbers(field_value, &self.value).is_some_and(|o| o.is_lt()),
        }
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (as_text(a), as_text(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn compare_numbers(field: Option<&Value>, value: &Value) -> Option<std::cmp::Ordering> {
    let left = as_number(field?)?;
    let right = as_number(value)?;
    left.partial_cmp(&right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> BTreeMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_filter_eq_matches() {
        let filter = AttributeFilter::eq("color", "red");
        assert!(filter.matches(&attrs(json!({"color": "red"}))));
        assert!(!filter.matches(&attrs(json!({"color": "blue"}))));
    }

    #[test]
    fn test_filter_eq_string_number_coercion() {
        let filter = AttributeFilter::eq("rating", 5);
        assert!(filter.matches(&attrs(json!({"rating": "5"}))));
    }

    #[test]
    fn test_filter_eq_null_matches_missing() {
        let filter = AttributeFilter::eq("field", Value::Null);
        assert!(filter.matches(&BTreeMap::new()));
    }

    #[test]
    fn test_filter_ne() {
        let filter = AttributeFilter::ne("color", "red");
        assert!(filter.matches(&attrs(json!({"color": "blue"}))));
        assert!(!filter.matches(&attrs(json!({"color": "red"}))));
        assert!(filter.matches(&BTreeMap::new()));
    }

    #[test]
    fn test_filter_contains_string_case_insensitive() {
        let filter = AttributeFilter::contains("subtitle", "RUST");
        assert!(filter.matches(&attrs(json!({"subtitle": "learning rust daily"}))));
    }

    #[test]
    fn test_filter_contains_array() {
        let filter = AttributeFilter::contains("tags", "featured");
        assert!(filter.matches(&attrs(json!({"tags": ["featured", "news"]}))));
        assert!(!filter.matches(&attrs(json!({"tags": ["news"]}))));
    }

    #[test]
    fn test_filter_numeric_comparisons() {
        let gt = AttributeFilter::new("price", CompareOp::Gt, 10);
        let lt = AttributeFilter::new("price", CompareOp::Lt, 10);
        let record = attrs(json!({"price": "12.5"}));
        assert!(gt.matches(&record));
        assert!(!lt.matches(&record));
        assert!(!gt.matches(&attrs(json!({"price": "n/a"}))));
    }

    #[test]
    fn test_filter_exists() {
        let filter = AttributeFilter::exists("hero_image");
        assert!(filter.matches(&attrs(json!({"hero_image": null}))));
        assert!(!filter.matches(&BTreeMap::new()));
    }

    #[test]
    fn test_compare_op_parse() {
        assert_eq!(CompareOp::parse("="), Some(CompareOp::Eq));
        assert_eq!(CompareOp::parse("!="), Some(CompareOp::Ne));
        assert_eq!(CompareOp::parse("like"), Some(CompareOp::Contains));
        assert_eq!(CompareOp::parse("EXISTS"), Some(CompareOp::Exists));
        assert_eq!(CompareOp::parse("BETWEEN"), None);
    }
}
