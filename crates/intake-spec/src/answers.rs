use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::spec::question::QuestionDefinition;

/// One captured answer (a "patient response" on the wire).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    pub patient_id: String,
    pub base_question_id: String,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_meta: Option<BTreeMap<String, Value>>,
}

/// Responses keyed by base-question id; a second write for the same id replaces the first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseSet {
    records: BTreeMap<String, ResponseRecord>,
}

impl ResponseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites, returning the record that was replaced.
    pub fn upsert(&mut self, record: ResponseRecord) -> Option<ResponseRecord> {
        self.records.insert(record.base_question_id.clone(), record)
    }

    pub fn get(&self, base_question_id: &str) -> Option<&ResponseRecord> {
        self.records.get(base_question_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Records in questionnaire order, skipping questions without an answer.
    pub fn ordered_by(&self, questions: &[QuestionDefinition]) -> Vec<ResponseRecord> {
        questions
            .iter()
            .filter_map(|question| self.records.get(question.response_key()))
            .cloned()
            .collect()
    }
}

/// Why a candidate answer was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    Required,
    NotANumber,
    BelowMin,
    AboveMax,
    TooShort,
    TooLong,
    InvalidFormat,
    InvalidOption,
    InvalidBoolean,
    OffStep,
    UnsupportedType,
}

impl ValidationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationKind::Required => "required",
            ValidationKind::NotANumber => "not a number",
            ValidationKind::BelowMin => "below min",
            ValidationKind::AboveMax => "above max",
            ValidationKind::TooShort => "too short",
            ValidationKind::TooLong => "too long",
            ValidationKind::InvalidFormat => "invalid format",
            ValidationKind::InvalidOption => "invalid option",
            ValidationKind::InvalidBoolean => "invalid boolean",
            ValidationKind::OffStep => "off step",
            ValidationKind::UnsupportedType => "unsupported question type",
        }
    }
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failure shown next to the offending field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Error)]
#[error("{message}")]
pub struct ValidationError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub kind: ValidationKind,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, kind: ValidationKind, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            kind,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, response: &str) -> ResponseRecord {
        ResponseRecord {
            patient_id: "p1".into(),
            base_question_id: id.into(),
            response: response.into(),
            response_meta: None,
        }
    }

    #[test]
    fn upsert_keeps_latest_value() {
        let mut set = ResponseSet::new();
        assert!(set.upsert(record("bq1", "first")).is_none());
        let replaced = set.upsert(record("bq1", "second")).expect("replaced");
        assert_eq!(replaced.response, "first");
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("bq1").map(|r| r.response.as_str()), Some("second"));
    }

    #[test]
    fn record_serializes_camel_case() {
        let value = serde_json::to_value(record("bq1", "yes")).expect("json");
        assert_eq!(value["patientId"], "p1");
        assert_eq!(value["baseQuestionId"], "bq1");
        assert!(value.get("responseMeta").is_none());
    }
}
