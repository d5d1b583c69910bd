mod wizard;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use intake_client::config::API_URL_VAR;
use intake_client::{ClientConfig, HttpBackend};
use intake_spec::session::FALLBACK_LANGUAGE;
use intake_spec::{
    BasicInfo, DEFAULT_DRAFT_FILE, DraftStore, FileDraftStore, InputWidget, IntakeBackend,
    Language, MemoryDraftStore, Organization, Patient, Progress, QuestionDefinition, QuestionView,
    ResponseRecord, ResponseSet, Session, SessionError, SessionState, Submission, ValidationError,
    ValidationKind, active_organizations, build_render_payload, render_json_ui, render_text,
    validate,
};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wizard::{RenderMode, Verbosity, WizardPresenter};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const DRAFTS_PATH_VAR: &str = "INTAKE_DRAFTS_PATH";
const DEFAULT_LOG_FILTER: &str = "patient_intake=warn,intake_client=warn,intake_spec=warn";
const VERBOSE_LOG_FILTER: &str = "patient_intake=debug,intake_client=debug,intake_spec=debug";
const GENDERS: [&str; 4] = ["male", "female", "other", "prefer_not_to_say"];
const MAX_AGE: u32 = 120;
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Patient intake questionnaire wizard",
    long_about = "Runs the intake questionnaire against the backend, plus offline helpers to validate and render question definitions"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone, Default)]
struct ApiArgs {
    /// Backend base URL (defaults to INTAKE_API_URL / INTAKE_API_URL_FOR_DOCKER).
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,
    /// API version path segment (defaults to INTAKE_API_VERSION or v1).
    #[arg(long, value_name = "VERSION")]
    api_version: Option<String>,
    /// Request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the intake questionnaire in a text shell.
    Wizard {
        #[command(flatten)]
        api: ApiArgs,
        /// File caching in-progress answers (defaults to INTAKE_DRAFTS_PATH; in-memory when unset).
        #[arg(long, value_name = "FILE")]
        drafts: Option<PathBuf>,
        /// Show hints, question ids and debug logs.
        #[arg(long, alias = "debug")]
        verbose: bool,
        /// Output mode for question screens.
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// List the active organizations.
    Organizations {
        #[command(flatten)]
        api: ApiArgs,
    },
    /// List the available questionnaire languages.
    Languages {
        #[command(flatten)]
        api: ApiArgs,
    },
    /// Validate a candidate answer against a question definition.
    Validate {
        /// Path to the question definition JSON.
        #[arg(long, value_name = "QUESTION")]
        question: PathBuf,
        /// Candidate answer, string-encoded.
        #[arg(long, value_name = "VALUE", default_value = "")]
        value: String,
    },
    /// Render a question definition the way the wizard shows it.
    Render {
        /// Path to the question definition JSON.
        #[arg(long, value_name = "QUESTION")]
        question: PathBuf,
        /// Optional JSON array of recorded responses.
        #[arg(long, value_name = "RESPONSES")]
        responses: Option<PathBuf>,
        /// Draft value to show in the input.
        #[arg(long, value_name = "VALUE")]
        value: Option<String>,
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Print the JSON schema of a question definition.
    Schema,
}

#[tokio::main]
async fn main() -> CliResult<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let verbose = matches!(cli.command, Command::Wizard { verbose: true, .. });
    init_tracing(verbose);

    match cli.command {
        Command::Wizard {
            api,
            drafts,
            verbose,
            format,
        } => run_wizard(api, drafts, verbose, format).await,
        Command::Organizations { api } => run_organizations(api).await,
        Command::Languages { api } => run_languages(api).await,
        Command::Validate { question, value } => run_validate(question, value),
        Command::Render {
            question,
            responses,
            value,
            format,
        } => run_render(question, responses, value, format),
        Command::Schema => run_schema(),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn connect(api: &ApiArgs) -> CliResult<HttpBackend> {
    let mut config = ClientConfig::from_lookup(|key| match &api.api_url {
        Some(url) if key == API_URL_VAR => Some(url.clone()),
        _ => env::var(key).ok(),
    })?;
    if let Some(version) = &api.api_version {
        config = config.with_api_version(version.clone());
    }
    if let Some(secs) = api.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    Ok(HttpBackend::new(&config)?)
}

async fn run_organizations(api: ApiArgs) -> CliResult<()> {
    let backend = connect(&api)?;
    let organizations = active_organizations(&backend).await?;
    if organizations.is_empty() {
        println!("No organizations found.");
    }
    for organization in organizations {
        println!(
            "{}\t{}\t{}",
            organization.id, organization.name, organization.default_language
        );
    }
    Ok(())
}

async fn run_languages(api: ApiArgs) -> CliResult<()> {
    let backend = connect(&api)?;
    for language in backend.list_languages().await? {
        println!("{}\t{}", language.code, language.name);
    }
    Ok(())
}

async fn run_wizard(
    api: ApiArgs,
    drafts_path: Option<PathBuf>,
    verbose: bool,
    format: RenderMode,
) -> CliResult<()> {
    let backend = connect(&api)?;
    let presenter = WizardPresenter::new(Verbosity::from_verbose(verbose), format);
    let mut drafts = open_drafts(drafts_path);
    let mut session = Session::new();

    let organizations = active_organizations(&backend).await?;
    if organizations.is_empty() {
        println!("No organizations found.");
        return Ok(());
    }
    presenter.show_organizations(&organizations);
    let organization = prompt_organization(&organizations)?;
    session.select_organization(organization.clone());

    let languages = backend.list_languages().await.unwrap_or_else(|err| {
        warn!(error = %err, "language list unavailable; using the organization default");
        Vec::new()
    });

    loop {
        let candidate = prompt_patient(&organization, &languages)?;
        match session.register_patient(&backend, candidate).await {
            Ok(_) => break,
            Err(SessionError::Validation(err)) => presenter.show_validation_error(&err),
            Err(err @ SessionError::Upstream { .. }) => {
                presenter.show_upstream_error(&err);
                if !prompt_bool("Try again?", true)? {
                    return Err(err.into());
                }
            }
            Err(err) => return Err(err.into()),
        }
    }

    loop {
        match session.state() {
            SessionState::Answering { .. } => {
                answer_current(&mut session, &backend, &presenter, &mut *drafts).await?;
            }
            SessionState::Submitting if session.questions().is_empty() => {
                println!("There are no questions to answer for this organization.");
                return Ok(());
            }
            SessionState::Submitting if session.responses().is_empty() => {
                println!("No answers were given, so nothing was submitted.");
                return Ok(());
            }
            SessionState::Submitting => {
                if !prompt_bool("Retry submitting your answers?", true)? {
                    return Err("responses were not submitted".into());
                }
                match session.retry_submission(&backend).await {
                    Ok(_) => {}
                    Err(err @ SessionError::Upstream { .. }) => presenter.show_upstream_error(&err),
                    Err(err) => return Err(err.into()),
                }
            }
            SessionState::Completed => {
                drafts.forget_all();
                let patient = session
                    .patient()
                    .map(|patient| patient.basic_info.name.clone())
                    .unwrap_or_default();
                presenter.show_completion(&patient, &organization.name);
                return Ok(());
            }
            other => return Err(format!("unexpected wizard state: {}", other).into()),
        }
    }
}

fn open_drafts(path: Option<PathBuf>) -> Box<dyn DraftStore> {
    let path = path.or_else(|| env::var_os(DRAFTS_PATH_VAR).map(PathBuf::from));
    match path {
        Some(path) if path.is_dir() => Box::new(FileDraftStore::open(path.join(DEFAULT_DRAFT_FILE))),
        Some(path) => Box::new(FileDraftStore::open(path)),
        None => Box::new(MemoryDraftStore::new()),
    }
}

async fn answer_current(
    session: &mut Session,
    backend: &HttpBackend,
    presenter: &WizardPresenter,
    drafts: &mut dyn DraftStore,
) -> CliResult<()> {
    let mut view = session
        .mount_current()
        .ok_or("wizard has no current question")?;
    view.restore_draft(drafts.load(view.question().response_key()));

    loop {
        presenter.show_question(&view, session.progress());
        let input = match read_answer(view.widget())? {
            WizardInput::Exit => return Err("wizard aborted by user".into()),
            WizardInput::Back => {
                session.retreat()?;
                return Ok(());
            }
            WizardInput::Answer(input) => input,
        };

        if !view.is_submitted() && !(input.is_empty() && !view.draft().is_empty()) {
            view.set_draft(translate_answer(view.widget(), &input));
            drafts.remember(view.question().response_key(), view.draft());
        }

        if !view.is_submitted()
            && let Err(err) = check_host_format(&view)
        {
            presenter.show_validation_error(&err);
            continue;
        }

        match view.submit() {
            Ok(Submission::Accepted(answer)) => {
                session.record_response(&answer.base_question_id, answer.value, None)?;
            }
            Ok(Submission::AlreadyRecorded) => {}
            Err(err) => {
                presenter.show_validation_error(&err);
                continue;
            }
        }

        return match session.advance(backend).await {
            Ok(_) => Ok(()),
            Err(err @ SessionError::Upstream { .. }) => {
                presenter.show_upstream_error(&err);
                Ok(())
            }
            Err(err) => Err(err.into()),
        };
    }
}

/// Format checks owned by the terminal widgets rather than the question rules.
fn check_host_format(view: &QuestionView) -> Result<(), ValidationError> {
    let value = view.draft().trim();
    if value.is_empty() {
        return Ok(());
    }
    match view.widget() {
        InputWidget::DatePicker => NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map(|_| ())
            .map_err(|_| {
                ValidationError::new(
                    view.question().response_key(),
                    ValidationKind::InvalidFormat,
                    "Please enter a date as YYYY-MM-DD",
                )
            }),
        _ => Ok(()),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum WizardInput {
    Answer(String),
    Back,
    Exit,
}

fn classify_input(raw: &str) -> WizardInput {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("exit") {
        WizardInput::Exit
    } else if trimmed.eq_ignore_ascii_case("back") || trimmed == "<" {
        WizardInput::Back
    } else {
        WizardInput::Answer(raw.trim_end_matches(['\r', '\n']).to_string())
    }
}

fn read_answer(widget: &InputWidget) -> CliResult<WizardInput> {
    print!("> ");
    io::stdout().flush()?;
    let first = read_line()?;
    let input = classify_input(&first);
    if !matches!(widget, InputWidget::MultiLineText) {
        return Ok(input);
    }
    let first = match input {
        WizardInput::Answer(first) => first,
        other => return Ok(other),
    };
    if first.is_empty() {
        return Ok(WizardInput::Answer(first));
    }

    let mut lines = vec![first];
    loop {
        let line = read_line()?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }
        lines.push(line.to_string());
    }
    Ok(WizardInput::Answer(lines.join("\n")))
}

/// Maps shell-friendly input onto the literal values the question expects.
fn translate_answer(widget: &InputWidget, raw: &str) -> String {
    let trimmed = raw.trim();
    match widget {
        InputWidget::YesNo => match trimmed.to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => "true".to_string(),
            "false" | "f" | "no" | "n" | "0" => "false".to_string(),
            _ => trimmed.to_string(),
        },
        InputWidget::SingleChoice { options } => {
            if let Ok(position) = trimmed.parse::<usize>()
                && (1..=options.len()).contains(&position)
            {
                return options[position - 1].value.clone();
            }
            options
                .iter()
                .find(|option| {
                    option.value.eq_ignore_ascii_case(trimmed)
                        || option.label.eq_ignore_ascii_case(trimmed)
                })
                .map(|option| option.value.clone())
                .unwrap_or_else(|| trimmed.to_string())
        }
        InputWidget::SingleLineText | InputWidget::MultiLineText => raw.to_string(),
        _ => trimmed.to_string(),
    }
}

fn prompt_organization(organizations: &[Organization]) -> CliResult<Organization> {
    loop {
        let raw = prompt_line("Organization number", None)?;
        match parse_selection(&raw, organizations.len()) {
            Some(position) => return Ok(organizations[position].clone()),
            None => println!("Choose a number between 1 and {}.", organizations.len()),
        }
    }
}

fn parse_selection(raw: &str, count: usize) -> Option<usize> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .filter(|position| (1..=count).contains(position))
        .map(|position| position - 1)
}

fn prompt_patient(organization: &Organization, languages: &[Language]) -> CliResult<Patient> {
    println!();
    println!("Patient information");
    let name = prompt_line(&mark_required("Full name"), None)?;
    let email = prompt_optional("Email (optional)")?;
    let phone = prompt_optional("Phone number (optional)")?;
    let age = loop {
        let raw = prompt_optional("Age (optional)")?;
        match raw.as_deref().map(parse_age).transpose() {
            Ok(age) => break age,
            Err(message) => println!("{}", message),
        }
    };
    let gender = loop {
        let raw = prompt_optional(&format!("Gender ({}, optional)", GENDERS.join("/")))?;
        match raw {
            Some(value) if !GENDERS.contains(&value.as_str()) => {
                println!("Choose one of: {}.", GENDERS.join(", "));
            }
            other => break other,
        }
    };
    let language = prompt_language(organization, languages)?;

    let basic_info = BasicInfo {
        name,
        email,
        phone,
        age,
        gender,
    };
    Ok(Patient::draft(organization.id.clone(), basic_info).with_language(language))
}

fn parse_age(raw: &str) -> Result<u32, String> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|age| *age <= MAX_AGE)
        .ok_or_else(|| format!("Age must be a whole number between 0 and {}.", MAX_AGE))
}

fn prompt_language(organization: &Organization, languages: &[Language]) -> CliResult<String> {
    let default = if organization.default_language.trim().is_empty() {
        FALLBACK_LANGUAGE.to_string()
    } else {
        organization.default_language.clone()
    };
    if languages.is_empty() {
        return Ok(default);
    }
    let codes = languages
        .iter()
        .map(|language| format!("{} ({})", language.code, language.name))
        .collect::<Vec<_>>();
    println!("Languages: {}", codes.join(", "));
    loop {
        let code = prompt_line("Preferred language", Some(&default))?;
        if languages.iter().any(|language| language.code == code) || code == default {
            return Ok(code);
        }
        println!("Choose one of the listed language codes.");
    }
}

fn run_validate(question_path: PathBuf, value: String) -> CliResult<()> {
    let question = load_question(&question_path)?;
    match validate(&question, &value) {
        Ok(()) => {
            println!("Validation result: valid");
            Ok(())
        }
        Err(err) => {
            println!("Validation result: invalid");
            println!("  {} - {} ({})", question.response_key(), err.message, err.kind);
            Err("validation failed".into())
        }
    }
}

fn run_render(
    question_path: PathBuf,
    responses_path: Option<PathBuf>,
    value: Option<String>,
    format: RenderMode,
) -> CliResult<()> {
    let question = load_question(&question_path)?;
    let mut responses = ResponseSet::new();
    if let Some(path) = responses_path {
        let records: Vec<ResponseRecord> = serde_json::from_str(&fs::read_to_string(path)?)?;
        for record in records {
            responses.upsert(record);
        }
    }

    let mut view = QuestionView::mount(&question, &responses);
    if let Some(value) = value {
        view.set_draft(value);
    }
    let payload = build_render_payload(&view, Progress::new(1, 1));
    match format {
        RenderMode::Text => println!("{}", render_text(&payload)),
        RenderMode::Json => println!("{}", serde_json::to_string_pretty(&render_json_ui(&payload))?),
    }
    Ok(())
}

fn run_schema() -> CliResult<()> {
    let schema = schemars::schema_for!(QuestionDefinition);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn load_question(path: &PathBuf) -> CliResult<QuestionDefinition> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn read_line() -> CliResult<String> {
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Err("unexpected end of input".into());
    }
    Ok(line)
}

fn prompt_line(prompt: &str, default: Option<&str>) -> CliResult<String> {
    if let Some(default_value) = default {
        print!("{} [{}]: ", prompt, default_value);
    } else {
        print!("{}: ", prompt);
    }
    io::stdout().flush()?;
    let line = read_line()?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Ok(default.unwrap_or_default().to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

fn prompt_optional(prompt: &str) -> CliResult<Option<String>> {
    let value = prompt_line(prompt, None)?;
    if value.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(value))
    }
}

fn prompt_bool(prompt: &str, default: bool) -> CliResult<bool> {
    let default_label = if default { "Y/n" } else { "y/N" };
    loop {
        let raw = prompt_line(&format!("{} ({})", prompt, default_label), None)?;
        match raw.to_lowercase().as_str() {
            "" => return Ok(default),
            "y" | "yes" | "true" | "1" => return Ok(true),
            "n" | "no" | "false" | "0" => return Ok(false),
            _ => println!("Please answer yes or no."),
        }
    }
}

fn mark_required(prompt: &str) -> String {
    let trimmed = prompt.trim();
    if trimmed.to_lowercase().contains("required") {
        trimmed.to_string()
    } else {
        format!("{} (required)", trimmed)
    }
}
