use clap::ValueEnum;
use intake_spec::{
    COMPLETION_HEADING, CompletionTemplate, InputWidget, Organization, Progress, QuestionView,
    SessionError, ValidationError, build_render_payload, render_json_ui, render_text,
};

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: question prompts only.
    Clean,
    /// Verbose output: input hints, question ids, error details.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RenderMode {
    Text,
    Json,
}

/// Prints the wizard screens: organization picker, questions, banners, completion.
pub struct WizardPresenter {
    verbosity: Verbosity,
    format: RenderMode,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, format: RenderMode) -> Self {
        Self { verbosity, format }
    }

    pub fn show_organizations(&self, organizations: &[Organization]) {
        println!("Pick your organization");
        for (position, organization) in organizations.iter().enumerate() {
            println!(
                " {}) {} (default language: {})",
                position + 1,
                organization.name,
                organization.default_language
            );
        }
    }

    pub fn show_question(&self, view: &QuestionView, progress: Progress) {
        let payload = build_render_payload(view, progress);
        match self.format {
            RenderMode::Text => {
                println!();
                println!("{}", render_text(&payload));
                if self.verbosity.is_verbose() {
                    println!("  [{} / {}]", payload.question_id, payload.base_question_id);
                }
            }
            RenderMode::Json => println!("{}", render_json_ui(&payload)),
        }
        if let Some(hint) = input_hint(view) {
            println!("{}", hint);
        }
    }

    pub fn show_validation_error(&self, error: &ValidationError) {
        eprintln!("Invalid answer: {}", error.message);
        if self.verbosity.is_verbose() {
            eprintln!("  Reason: {}", error.kind);
        }
    }

    pub fn show_upstream_error(&self, error: &SessionError) {
        eprintln!("Something went wrong: {}", error);
    }

    pub fn show_completion(&self, patient: &str, organization: &str) {
        println!();
        println!("{}", COMPLETION_HEADING);
        match CompletionTemplate::default().render(patient, organization) {
            Ok(message) => println!("{}", message),
            Err(err) => eprintln!("Failed to render completion message: {}", err),
        }
    }
}

fn input_hint(view: &QuestionView) -> Option<String> {
    if view.is_submitted() {
        return Some("(press Enter to continue, 'back' to go back)".to_string());
    }
    let hint = match view.widget() {
        InputWidget::SingleChoice { .. } => "(enter the option number)",
        InputWidget::YesNo => "(yes/no, y/n, true/false)",
        InputWidget::MultiLineText => "(finish with an empty line)",
        InputWidget::Unsupported { .. } => "(this question cannot be answered here; type 'exit' to stop)",
        _ => return None,
    };
    Some(hint.to_string())
}
