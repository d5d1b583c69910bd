use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Input modality declared by a base question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    Text,
    MultipleChoice,
    Boolean,
    Number,
    Date,
    Time,
    Datetime,
    File,
    Scale,
    /// Any tag this client does not know about.
    #[serde(other)]
    Unknown,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Text => "TEXT",
            QuestionType::MultipleChoice => "MULTIPLE_CHOICE",
            QuestionType::Boolean => "BOOLEAN",
            QuestionType::Number => "NUMBER",
            QuestionType::Date => "DATE",
            QuestionType::Time => "TIME",
            QuestionType::Datetime => "DATETIME",
            QuestionType::File => "FILE",
            QuestionType::Scale => "SCALE",
            QuestionType::Unknown => "UNKNOWN",
        }
    }
}

/// Datatype the backend expects for the captured answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseDataType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    Time,
    Datetime,
    Json,
    Blob,
    #[serde(other)]
    Unknown,
}

/// Declarative constraints attached to a base question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_message: Option<String>,
    #[serde(default)]
    pub multiline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_label: Option<String>,
    /// Keys this client does not interpret, kept so they survive a round trip.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One selectable entry of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChoiceOption {
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    pub label: String,
}

/// Free-form metadata bag; `options` is the only key the engine reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChoiceOption>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Language-independent question identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BaseQuestion {
    pub id: String,
    #[serde(default)]
    pub internal_code: String,
    pub question_type: QuestionType,
    pub response_data_type: ResponseDataType,
    #[serde(default)]
    pub validation_rules: ValidationRules,
    #[serde(default)]
    pub metadata: QuestionMetadata,
}

/// Localized rendering of a base question, as served by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDefinition {
    pub id: String,
    pub base_question_id: String,
    #[serde(default)]
    pub question_set_id: String,
    pub language_code: String,
    pub question_text: String,
    pub base_question: BaseQuestion,
}

impl QuestionDefinition {
    /// Key under which responses to this question are recorded.
    pub fn response_key(&self) -> &str {
        &self.base_question.id
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.base_question.validation_rules
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "option value must be a string or number, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_question_type_deserializes() {
        let kind: QuestionType = serde_json::from_value(json!("SIGNATURE")).expect("kind");
        assert_eq!(kind, QuestionType::Unknown);
    }

    #[test]
    fn numeric_option_values_become_strings() {
        let metadata: QuestionMetadata = serde_json::from_value(json!({
            "options": [{ "value": 1, "label": "One" }, { "value": "b", "label": "Bee" }],
            "layout": "vertical"
        }))
        .expect("metadata");
        assert_eq!(metadata.options[0].value, "1");
        assert_eq!(metadata.options[1].value, "b");
        assert_eq!(metadata.extra["layout"], "vertical");
    }

    #[test]
    fn rules_keep_unknown_keys() {
        let rules: ValidationRules = serde_json::from_value(json!({
            "required": true,
            "minLength": 2,
            "placeholder": "Your answer"
        }))
        .expect("rules");
        assert!(rules.required);
        assert_eq!(rules.min_length, Some(2));
        assert_eq!(rules.extra["placeholder"], "Your answer");
    }
}
