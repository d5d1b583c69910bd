use crate::answers::{ResponseSet, ValidationError};
use crate::spec::question::{ChoiceOption, QuestionDefinition, QuestionType};
use crate::validate::{ScaleBounds, validate};

/// Input contract the host must render for a question.
#[derive(Debug, Clone, PartialEq)]
pub enum InputWidget {
    SingleLineText,
    MultiLineText,
    /// Exactly one of the listed options, in server order.
    SingleChoice { options: Vec<ChoiceOption> },
    /// Literal `"true"` / `"false"`.
    YesNo,
    Scale {
        min: f64,
        max: f64,
        step: f64,
        min_label: Option<String>,
        max_label: Option<String>,
    },
    /// Calendar date; formatting belongs to the host's date picker.
    DatePicker,
    /// No widget exists for this modality; answering is refused.
    Unsupported { question_type: QuestionType },
}

impl InputWidget {
    pub fn kind(&self) -> &'static str {
        match self {
            InputWidget::SingleLineText => "text",
            InputWidget::MultiLineText => "textarea",
            InputWidget::SingleChoice { .. } => "choice",
            InputWidget::YesNo => "yes_no",
            InputWidget::Scale { .. } => "scale",
            InputWidget::DatePicker => "date",
            InputWidget::Unsupported { .. } => "unsupported",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, InputWidget::Unsupported { .. })
    }
}

/// Picks the widget for a question from its modality tag.
pub fn select_input(question: &QuestionDefinition) -> InputWidget {
    let base = &question.base_question;
    let rules = &base.validation_rules;
    match base.question_type {
        QuestionType::Text if rules.multiline => InputWidget::MultiLineText,
        QuestionType::Text => InputWidget::SingleLineText,
        QuestionType::MultipleChoice => InputWidget::SingleChoice {
            options: base.metadata.options.clone(),
        },
        QuestionType::Boolean => InputWidget::YesNo,
        QuestionType::Scale => {
            let bounds = ScaleBounds::from_rules(rules);
            InputWidget::Scale {
                min: bounds.min,
                max: bounds.max,
                step: bounds.step,
                min_label: rules.min_label.clone(),
                max_label: rules.max_label.clone(),
            }
        }
        QuestionType::Date => InputWidget::DatePicker,
        other => InputWidget::Unsupported {
            question_type: other,
        },
    }
}

/// Answer that passed local validation, ready to be recorded in the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub base_question_id: String,
    pub value: String,
}

/// Outcome of pressing "Next" on a mounted question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Freshly validated; the caller records it and advances.
    Accepted(Answer),
    /// The session already holds an answer; the caller only advances.
    AlreadyRecorded,
}

/// Per-question editing state: draft, last error and submitted flag.
#[derive(Debug, Clone)]
pub struct QuestionView {
    question: QuestionDefinition,
    widget: InputWidget,
    draft: String,
    last_error: Option<ValidationError>,
    submitted: bool,
}

impl QuestionView {
    /// Mounts a question. A response already recorded for it is shown read-only.
    pub fn mount(question: &QuestionDefinition, responses: &ResponseSet) -> Self {
        let widget = select_input(question);
        let (draft, submitted) = match responses.get(question.response_key()) {
            Some(record) => (record.response.clone(), true),
            None => (String::new(), false),
        };
        Self {
            question: question.clone(),
            widget,
            draft,
            last_error: None,
            submitted,
        }
    }

    /// Seeds the draft from a cached value unless an answer was already recorded.
    pub fn restore_draft(&mut self, cached: Option<String>) {
        if self.submitted {
            return;
        }
        if let Some(value) = cached {
            self.draft = value;
        }
    }

    /// Replaces the draft and clears the previous error. Ignored once submitted.
    pub fn set_draft(&mut self, value: impl Into<String>) -> bool {
        if self.submitted {
            return false;
        }
        self.draft = value.into();
        self.last_error = None;
        true
    }

    pub fn submit(&mut self) -> Result<Submission, ValidationError> {
        if self.submitted {
            return Ok(Submission::AlreadyRecorded);
        }
        let value = self.normalized();
        match validate(&self.question, &value) {
            Ok(()) => {
                self.last_error = None;
                self.submitted = true;
                Ok(Submission::Accepted(Answer {
                    base_question_id: self.question.response_key().to_string(),
                    value,
                }))
            }
            Err(err) => {
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    fn normalized(&self) -> String {
        match self.widget {
            InputWidget::SingleLineText | InputWidget::MultiLineText => self.draft.clone(),
            _ => self.draft.trim().to_string(),
        }
    }

    pub fn question(&self) -> &QuestionDefinition {
        &self.question
    }

    pub fn widget(&self) -> &InputWidget {
        &self.widget
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn last_error(&self) -> Option<&ValidationError> {
        self.last_error.as_ref()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }
}
