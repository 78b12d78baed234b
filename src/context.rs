//! The per-call log of follow-up questions and oracle responses.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One oracle round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct ContextEntry {
    /// Follow-up question produced by the query agent.
    pub question: String,
    /// The oracle's answer to it.
    pub response: String,
}

impl From<(String, String)> for ContextEntry {
    fn from((question, response): (String, String)) -> Self {
        Self { question, response }
    }
}

impl From<ContextEntry> for (String, String) {
    fn from(entry: ContextEntry) -> Self {
        (entry.question, entry.response)
    }
}

/// Ordered, append-only sequence of `(question, response)` pairs.
///
/// Serialized as a JSON array of two-element arrays, which is how the
/// `context` field travels inside agent records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextLog {
    entries: Vec<ContextEntry>,
}

impl ContextLog {
    /// Creates an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a round-trip.
    pub fn push(&mut self, question: impl Into<String>, response: impl Into<String>) {
        self.entries.push(ContextEntry {
            question: question.into(),
            response: response.into(),
        });
    }

    /// Entries in the order they were produced.
    #[must_use]
    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }

    /// Iterates over entries in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ContextEntry> {
        self.entries.iter()
    }

    /// Number of round-trips recorded.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON form used in agent records: `[[question, response], ...]`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Array(
            self.entries
                .iter()
                .map(|e| {
                    Value::Array(vec![
                        Value::String(e.question.clone()),
                        Value::String(e.response.clone()),
                    ])
                })
                .collect(),
        )
    }

    /// Reads a log back from its record form. Returns `None` if the value
    /// is not an array of string pairs.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

impl<'a> IntoIterator for &'a ContextLog {
    type Item = &'a ContextEntry;
    type IntoIter = std::slice::Iter<'a, ContextEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for ContextLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str("(no follow-up questions asked yet)");
        }
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(
                f,
                "[{n}] Q: {q}\n[{n}] A: {a}",
                n = i + 1,
                q = entry.question,
                a = entry.response
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_keeps_order() {
        let mut log = ContextLog::new();
        log.push("first?", "1");
        log.push("second?", "2");
        let questions: Vec<&str> = log.iter().map(|e| e.question.as_str()).collect();
        assert_eq!(questions, ["first?", "second?"]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_value_form_is_pairs() {
        let mut log = ContextLog::new();
        log.push("What is the volume of the oceans?", "1.3e9");
        assert_eq!(
            log.to_value(),
            json!([["What is the volume of the oceans?", "1.3e9"]])
        );
        assert_eq!(ContextLog::from_value(&log.to_value()), Some(log));
    }

    #[test]
    fn test_from_value_rejects_non_pairs() {
        assert!(ContextLog::from_value(&json!(["just a string"])).is_none());
        assert!(ContextLog::from_value(&json!({"q": "a"})).is_none());
        assert_eq!(ContextLog::from_value(&json!([])), Some(ContextLog::new()));
    }

    #[test]
    fn test_display() {
        let mut log = ContextLog::new();
        assert!(log.to_string().contains("no follow-up"));
        log.push("q", "a");
        assert_eq!(log.to_string(), "[1] Q: q\n[1] A: a");
    }
}
