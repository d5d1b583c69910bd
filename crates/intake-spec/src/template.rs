use handlebars::Handlebars;
use serde_json::json;
use thiserror::Error;

pub const COMPLETION_HEADING: &str = "Thank you for completing the questionnaire!";

pub const DEFAULT_COMPLETION_TEMPLATE: &str = "{{patient}}, your answers have been successfully recorded. \
A representative from {{organization}} may contact you soon.";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to render completion message: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// Renders the message shown on the completion screen.
pub struct CompletionTemplate {
    source: String,
}

impl Default for CompletionTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_COMPLETION_TEMPLATE)
    }
}

impl CompletionTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn render(&self, patient: &str, organization: &str) -> Result<String, TemplateError> {
        let mut engine = Handlebars::new();
        engine.set_strict_mode(true);
        engine.register_escape_fn(handlebars::no_escape);
        let ctx = json!({
            "patient": patient,
            "organization": organization,
        });
        Ok(engine.render_template(&self.source, &ctx)?)
    }
}
