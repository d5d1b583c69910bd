use serde_json::{Map, Value, json};

use crate::progress::Progress;
use crate::widget::{InputWidget, QuestionView};

/// Status labels returned by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// The question is waiting for an answer.
    NeedInput,
    /// An answer is recorded and shown read-only.
    Answered,
    /// No widget exists for the question type.
    Unsupported,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Answered => "answered",
            RenderStatus::Unsupported => "unsupported",
        }
    }
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub question_id: String,
    pub base_question_id: String,
    pub text: String,
    pub required: bool,
    pub widget: InputWidget,
    pub draft: String,
    pub error: Option<String>,
    pub status: RenderStatus,
    pub progress: Progress,
}

pub fn build_render_payload(view: &QuestionView, progress: Progress) -> RenderPayload {
    let question = view.question();
    let status = if !view.widget().is_supported() {
        RenderStatus::Unsupported
    } else if view.is_submitted() {
        RenderStatus::Answered
    } else {
        RenderStatus::NeedInput
    };

    RenderPayload {
        question_id: question.id.clone(),
        base_question_id: question.response_key().to_string(),
        text: question.question_text.clone(),
        required: question.rules().required,
        widget: view.widget().clone(),
        draft: view.draft().to_string(),
        error: view.last_error().map(|err| err.message.clone()),
        status,
        progress,
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    json!({
        "question_id": payload.question_id,
        "base_question_id": payload.base_question_id,
        "text": payload.text,
        "required": payload.required,
        "status": payload.status.as_str(),
        "input": widget_json(&payload.widget),
        "value": payload.draft,
        "error": payload.error,
        "read_only": payload.status == RenderStatus::Answered,
        "progress": {
            "current": payload.progress.current,
            "total": payload.progress.total,
            "percentage": payload.progress.percentage(),
        },
    })
}

fn widget_json(widget: &InputWidget) -> Value {
    let mut map = Map::new();
    map.insert("type".into(), Value::String(widget.kind().to_string()));
    match widget {
        InputWidget::SingleChoice { options } => {
            let options = options
                .iter()
                .map(|option| json!({ "value": option.value, "label": option.label }))
                .collect::<Vec<_>>();
            map.insert("options".into(), Value::Array(options));
        }
        InputWidget::YesNo => {
            map.insert(
                "options".into(),
                json!([
                    { "value": "true", "label": "Yes" },
                    { "value": "false", "label": "No" }
                ]),
            );
        }
        InputWidget::Scale {
            min,
            max,
            step,
            min_label,
            max_label,
        } => {
            map.insert("min".into(), json!(min));
            map.insert("max".into(), json!(max));
            map.insert("step".into(), json!(step));
            map.insert(
                "min_label".into(),
                Value::String(min_label.clone().unwrap_or_else(|| format_number(*min))),
            );
            map.insert(
                "max_label".into(),
                Value::String(max_label.clone().unwrap_or_else(|| format_number(*max))),
            );
        }
        InputWidget::Unsupported { question_type } => {
            map.insert(
                "question_type".into(),
                Value::String(question_type.as_str().to_string()),
            );
        }
        InputWidget::SingleLineText | InputWidget::MultiLineText | InputWidget::DatePicker => {}
    }
    Value::Object(map)
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} ({}%)",
        payload.progress.label(),
        payload.progress.percentage()
    ));

    let mut title = payload.text.clone();
    if payload.required {
        title.push_str(" *");
    }
    lines.push(title);

    match &payload.widget {
        InputWidget::SingleLineText => {}
        InputWidget::MultiLineText => lines.push("  (multi-line answer)".to_string()),
        InputWidget::SingleChoice { options } => {
            for (position, option) in options.iter().enumerate() {
                lines.push(format!("  {}) {}", position + 1, option.label));
            }
        }
        InputWidget::YesNo => lines.push("  (yes/no)".to_string()),
        InputWidget::Scale {
            min,
            max,
            step,
            min_label,
            max_label,
        } => {
            let low = min_label.clone().unwrap_or_else(|| format_number(*min));
            let high = max_label.clone().unwrap_or_else(|| format_number(*max));
            lines.push(format!(
                "  {} [{} .. {}, step {}] {}",
                low,
                format_number(*min),
                format_number(*max),
                format_number(*step),
                high
            ));
        }
        InputWidget::DatePicker => lines.push("  (date, YYYY-MM-DD)".to_string()),
        InputWidget::Unsupported { question_type } => lines.push(format!(
            "  Unsupported question type: {}",
            question_type.as_str()
        )),
    }

    if payload.status == RenderStatus::Answered {
        lines.push(format!("Response saved: {}", display_value(payload)));
    } else if !payload.draft.is_empty() {
        lines.push(format!("Current value: {}", display_value(payload)));
    }

    if let Some(error) = &payload.error {
        lines.push(format!("Error: {}", error));
    }

    lines.join("\n")
}

fn display_value(payload: &RenderPayload) -> String {
    match &payload.widget {
        InputWidget::SingleChoice { options } => options
            .iter()
            .find(|option| option.value == payload.draft)
            .map(|option| option.label.clone())
            .unwrap_or_else(|| payload.draft.clone()),
        InputWidget::YesNo => match payload.draft.as_str() {
            "true" => "Yes".to_string(),
            "false" => "No".to_string(),
            other => other.to_string(),
        },
        _ => payload.draft.clone(),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
