//! Field declarations: name, semantic type, role, and display metadata.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Semantic type of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Free text.
    Str,
    /// True/false.
    Bool,
    /// Integer.
    Int,
    /// Floating point number.
    Float,
    /// List of strings.
    StrList,
    /// List of `(question, response)` string pairs.
    ContextLog,
}

impl FieldType {
    /// Type name as written in signature strings and prompts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::StrList => "list[str]",
            Self::ContextLog => "list[tuple[str, str]]",
        }
    }

    /// Parses a type annotation from a signature string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        match normalized.to_lowercase().as_str() {
            "str" | "string" => Some(Self::Str),
            "bool" | "boolean" => Some(Self::Bool),
            "int" | "integer" => Some(Self::Int),
            "float" | "number" => Some(Self::Float),
            "list[str]" | "list" => Some(Self::StrList),
            "context" | "list[tuple[str,str]]" => Some(Self::ContextLog),
            _ => None,
        }
    }

    /// Coerces a value produced by a model into this type.
    ///
    /// Models frequently answer `"true"` for booleans or `"1.3e9"` for
    /// numbers; those are accepted. Returns `None` if the value cannot be
    /// interpreted as this type.
    #[must_use]
    pub fn coerce(self, value: &Value) -> Option<Value> {
        match (self, value) {
            (Self::Str, Value::String(_)) => Some(value.clone()),
            (Self::Str, Value::Number(n)) => Some(Value::String(n.to_string())),
            (Self::Str, Value::Bool(b)) => Some(Value::String(b.to_string())),

            (Self::Bool, Value::Bool(_)) => Some(value.clone()),
            (Self::Bool, Value::String(s)) => parse_bool(s).map(Value::Bool),
            (Self::Bool, Value::Number(n)) => match whole_number(n) {
                Some(0) => Some(Value::Bool(false)),
                Some(1) => Some(Value::Bool(true)),
                _ => None,
            },

            (Self::Int, Value::Number(n)) if n.is_i64() || n.is_u64() => Some(value.clone()),
            (Self::Int, Value::Number(n)) => whole_number(n).map(Value::from),
            (Self::Int, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),

            (Self::Float, Value::Number(n)) => n.as_f64().and_then(float_value),
            (Self::Float, Value::String(s)) => s
                .trim()
                .replace(',', "")
                .parse::<f64>()
                .ok()
                .and_then(float_value),

            (Self::StrList, Value::Array(items)) if items.iter().all(Value::is_string) => {
                Some(value.clone())
            }
            (Self::StrList, Value::String(s)) => Some(Value::Array(vec![Value::String(s.clone())])),

            (Self::ContextLog, Value::Array(items)) if items.iter().all(is_string_pair) => {
                Some(value.clone())
            }

            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().trim_end_matches('.').to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// `3` and `3.0` alike; `None` for fractional or out-of-range numbers.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]
fn whole_number(n: &Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn float_value(f: f64) -> Option<Value> {
    Number::from_f64(f).map(Value::Number)
}

fn is_string_pair(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|pair| pair.len() == 2 && pair.iter().all(Value::is_string))
}

/// Whether a field is consumed or produced by an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldRole {
    /// Supplied to the agent.
    Input,
    /// Produced by the agent.
    Output,
}

/// A single named, typed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name, unique within a contract.
    pub name: String,
    /// Semantic type.
    #[serde(rename = "type")]
    pub ty: FieldType,
    /// Input or output.
    pub role: FieldRole,
    /// Display prefix used when rendering prompts (e.g. `"Question:"`).
    pub prefix: String,
    /// Human-readable description.
    pub description: String,
}

impl Field {
    fn new(name: impl Into<String>, ty: FieldType, role: FieldRole) -> Self {
        let name = name.into();
        Self {
            prefix: infer_prefix(&name),
            description: format!("${{{name}}}"),
            name,
            ty,
            role,
        }
    }

    /// Declares an input field with an inferred prefix and placeholder description.
    #[must_use]
    pub fn input(name: impl Into<String>, ty: FieldType) -> Self {
        Self::new(name, ty, FieldRole::Input)
    }

    /// Declares an output field with an inferred prefix and placeholder description.
    #[must_use]
    pub fn output(name: impl Into<String>, ty: FieldType) -> Self {
        Self::new(name, ty, FieldRole::Output)
    }

    /// Overrides the display prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Overrides the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether this is an input field.
    #[must_use]
    pub fn is_input(&self) -> bool {
        self.role == FieldRole::Input
    }

    /// Whether this is an output field.
    #[must_use]
    pub fn is_output(&self) -> bool {
        self.role == FieldRole::Output
    }
}

/// Derives a display prefix from a field name: `follow_up_question` →
/// `Follow Up Question:`.
#[must_use]
pub fn infer_prefix(name: &str) -> String {
    let words: Vec<String> = name
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect();
    format!("{}:", words.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(json!(true), Some(true); "native bool")]
    #[test_case(json!("True"), Some(true); "capitalized string")]
    #[test_case(json!("yes"), Some(true); "yes")]
    #[test_case(json!("false."), Some(false); "trailing period")]
    #[test_case(json!(0), Some(false); "zero")]
    #[test_case(json!(1.0), Some(true); "whole float one")]
    #[test_case(json!(0.0), Some(false); "whole float zero")]
    #[test_case(json!(0.5), None; "fractional float")]
    #[test_case(json!("maybe"), None; "unrecognized word")]
    #[test_case(json!(["true"]), None; "array")]
    fn test_bool_coercion(value: Value, expected: Option<bool>) {
        let coerced = FieldType::Bool.coerce(&value);
        assert_eq!(coerced.and_then(|v| v.as_bool()), expected);
    }

    #[test_case(json!(3), Some(3); "integer")]
    #[test_case(json!(3.0), Some(3); "whole float")]
    #[test_case(json!("7"), Some(7); "numeric string")]
    #[test_case(json!(3.5), None; "fractional float")]
    fn test_int_coercion(value: Value, expected: Option<i64>) {
        let coerced = FieldType::Int.coerce(&value);
        assert_eq!(coerced.and_then(|v| v.as_i64()), expected);
    }

    #[test_case(json!("1.3e9"), Some(1.3e9); "scientific string")]
    #[test_case(json!("1,000"), Some(1000.0); "thousands separator")]
    #[test_case(json!(42), Some(42.0); "integer")]
    #[test_case(json!("about ten"), None; "prose")]
    fn test_float_coercion(value: Value, expected: Option<f64>) {
        let coerced = FieldType::Float.coerce(&value);
        assert_eq!(coerced.and_then(|v| v.as_f64()), expected);
    }

    #[test]
    fn test_context_log_coercion() {
        let ok = json!([["q", "a"], ["q2", "a2"]]);
        assert_eq!(FieldType::ContextLog.coerce(&ok), Some(ok));
        assert_eq!(FieldType::ContextLog.coerce(&json!([["q"]])), None);
    }

    #[test]
    fn test_str_accepts_numbers() {
        assert_eq!(FieldType::Str.coerce(&json!(3.5)), Some(json!("3.5")));
        assert_eq!(FieldType::Str.coerce(&json!(null)), None);
    }

    #[test_case("str", Some(FieldType::Str))]
    #[test_case("float", Some(FieldType::Float))]
    #[test_case("list[ str ]", Some(FieldType::StrList))]
    #[test_case("Bool", Some(FieldType::Bool))]
    #[test_case("dict", None)]
    fn test_parse_type(s: &str, expected: Option<FieldType>) {
        assert_eq!(FieldType::parse(s), expected);
    }

    #[test]
    fn test_infer_prefix() {
        assert_eq!(infer_prefix("question"), "Question:");
        assert_eq!(infer_prefix("follow_up_question"), "Follow Up Question:");
        assert_eq!(infer_prefix("privileged-context"), "Privileged Context:");
    }

    #[test]
    fn test_default_description_placeholder() {
        let field = Field::input("unit", FieldType::Str);
        assert_eq!(field.description, "${unit}");
        assert_eq!(field.prefix, "Unit:");
        assert!(field.is_input());
    }
}
