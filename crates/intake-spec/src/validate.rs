use regex::Regex;
use tracing::warn;

use crate::answers::{ValidationError, ValidationKind};
use crate::spec::question::{QuestionDefinition, QuestionType, ResponseDataType, ValidationRules};

/// Scale bounds used when the rule bag leaves them out.
pub const DEFAULT_SCALE_MIN: f64 = 0.0;
pub const DEFAULT_SCALE_MAX: f64 = 10.0;
pub const DEFAULT_SCALE_STEP: f64 = 1.0;

const STEP_TOLERANCE: f64 = 1e-9;

/// Checks a string-encoded candidate answer against the question's declared rules.
///
/// Order: unsupported modality, required, datatype rules, then modality membership
/// (choice options, boolean literals, scale range and step). Empty optional answers
/// skip everything after the required check.
pub fn validate(question: &QuestionDefinition, candidate: &str) -> Result<(), ValidationError> {
    let rules = question.rules();

    if !is_supported(question.base_question.question_type) {
        return Err(base_error(
            question,
            ValidationKind::UnsupportedType,
            format!(
                "Unsupported question type {}",
                question.base_question.question_type.as_str()
            ),
        ));
    }

    if rules.required && candidate.trim().is_empty() {
        return Err(base_error(
            question,
            ValidationKind::Required,
            "This question is required",
        ));
    }

    if candidate.is_empty() {
        return Ok(());
    }

    match question.base_question.response_data_type {
        ResponseDataType::Integer => check_number(question, candidate, rules)?,
        ResponseDataType::String => check_text(question, candidate, rules)?,
        _ => {}
    }

    check_modality(question, candidate)
}

/// Modalities that have a widget contract; everything else renders a placeholder.
pub fn is_supported(kind: QuestionType) -> bool {
    matches!(
        kind,
        QuestionType::Text
            | QuestionType::MultipleChoice
            | QuestionType::Boolean
            | QuestionType::Scale
            | QuestionType::Date
    )
}

fn check_number(
    question: &QuestionDefinition,
    candidate: &str,
    rules: &ValidationRules,
) -> Result<(), ValidationError> {
    let value = parse_number(question, candidate)?;

    if let Some(min) = rules.min
        && value < min
    {
        return Err(base_error(
            question,
            ValidationKind::BelowMin,
            format!("Min value is {}", min),
        ));
    }

    if let Some(max) = rules.max
        && value > max
    {
        return Err(base_error(
            question,
            ValidationKind::AboveMax,
            format!("Max value is {}", max),
        ));
    }

    Ok(())
}

fn check_text(
    question: &QuestionDefinition,
    candidate: &str,
    rules: &ValidationRules,
) -> Result<(), ValidationError> {
    let length = candidate.chars().count();

    if let Some(min_length) = rules.min_length
        && length < min_length
    {
        return Err(base_error(
            question,
            ValidationKind::TooShort,
            format!("Text must be at least {} characters", min_length),
        ));
    }

    if let Some(max_length) = rules.max_length
        && length > max_length
    {
        return Err(base_error(
            question,
            ValidationKind::TooLong,
            format!("Text should not exceed {} characters", max_length),
        ));
    }

    if let Some(pattern) = &rules.pattern {
        match Regex::new(pattern) {
            Ok(regex) if !regex.is_match(candidate) => {
                let message = rules
                    .pattern_message
                    .clone()
                    .unwrap_or_else(|| ValidationKind::InvalidFormat.as_str().to_string());
                return Err(base_error(question, ValidationKind::InvalidFormat, message));
            }
            Ok(_) => {}
            Err(err) => {
                warn!(
                    question = %question.id,
                    pattern = %pattern,
                    error = %err,
                    "ignoring unparsable validation pattern"
                );
            }
        }
    }

    Ok(())
}

fn check_modality(question: &QuestionDefinition, candidate: &str) -> Result<(), ValidationError> {
    let base = &question.base_question;
    match base.question_type {
        QuestionType::MultipleChoice => {
            if base
                .metadata
                .options
                .iter()
                .any(|option| option.value == candidate)
            {
                Ok(())
            } else {
                Err(base_error(
                    question,
                    ValidationKind::InvalidOption,
                    "Please choose one of the listed options",
                ))
            }
        }
        QuestionType::Boolean => match candidate {
            "true" | "false" => Ok(()),
            _ => Err(base_error(
                question,
                ValidationKind::InvalidBoolean,
                "Please answer yes or no",
            )),
        },
        QuestionType::Scale => check_scale(question, candidate),
        _ => Ok(()),
    }
}

fn check_scale(question: &QuestionDefinition, candidate: &str) -> Result<(), ValidationError> {
    let bounds = ScaleBounds::from_rules(question.rules());
    let value = parse_number(question, candidate)?;

    if value < bounds.min {
        return Err(base_error(
            question,
            ValidationKind::BelowMin,
            format!("Min value is {}", bounds.min),
        ));
    }
    if value > bounds.max {
        return Err(base_error(
            question,
            ValidationKind::AboveMax,
            format!("Max value is {}", bounds.max),
        ));
    }

    if bounds.step > 0.0 {
        let steps = (value - bounds.min) / bounds.step;
        if (steps - steps.round()).abs() > STEP_TOLERANCE {
            return Err(base_error(
                question,
                ValidationKind::OffStep,
                format!("Value must move in steps of {}", bounds.step),
            ));
        }
    }

    Ok(())
}

/// Resolved range of a SCALE question.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ScaleBounds {
    pub fn from_rules(rules: &ValidationRules) -> Self {
        Self {
            min: rules.min.unwrap_or(DEFAULT_SCALE_MIN),
            max: rules.max.unwrap_or(DEFAULT_SCALE_MAX),
            step: rules.step.unwrap_or(DEFAULT_SCALE_STEP),
        }
    }
}

fn parse_number(question: &QuestionDefinition, candidate: &str) -> Result<f64, ValidationError> {
    candidate
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| {
            base_error(
                question,
                ValidationKind::NotANumber,
                "Please enter a valid number",
            )
        })
}

fn base_error(
    question: &QuestionDefinition,
    kind: ValidationKind,
    message: impl Into<String>,
) -> ValidationError {
    ValidationError::new(question.response_key(), kind, message)
}
