use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::answers::{ResponseRecord, ResponseSet, ValidationError, ValidationKind};
use crate::backend::{BackendError, IntakeBackend};
use crate::error::SessionError;
use crate::progress::Progress;
use crate::spec::directory::{Organization, Patient};
use crate::spec::question::QuestionDefinition;
use crate::widget::QuestionView;

/// Language used when neither the patient nor the organization names one.
pub const FALLBACK_LANGUAGE: &str = "en";

/// Where the wizard currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoOrganization,
    OrganizationSelected,
    /// Answering the question at `index` (0-based).
    Answering { index: usize },
    /// Every question was passed; the response set is being or waiting to be submitted.
    Submitting,
    Completed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::NoOrganization => f.write_str("no organization selected"),
            SessionState::OrganizationSelected => f.write_str("organization selected"),
            SessionState::Answering { index } => write!(f, "answering question {}", index),
            SessionState::Submitting => f.write_str("submitting"),
            SessionState::Completed => f.write_str("completed"),
        }
    }
}

/// Single owner of the wizard's mutable data.
///
/// Collaborator calls borrow the session mutably for their whole duration, so no
/// other mutation can interleave with an outstanding request.
#[derive(Debug, Default)]
pub struct Session {
    organization: Option<Organization>,
    patient: Option<Patient>,
    questions: Vec<QuestionDefinition>,
    index: usize,
    responses: ResponseSet,
    submitting: bool,
    completed: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        match (&self.organization, &self.patient) {
            (None, _) => SessionState::NoOrganization,
            (Some(_), None) => SessionState::OrganizationSelected,
            (Some(_), Some(_)) if self.completed => SessionState::Completed,
            (Some(_), Some(_)) if self.index >= self.questions.len() => SessionState::Submitting,
            (Some(_), Some(_)) => SessionState::Answering { index: self.index },
        }
    }

    /// Chooses an organization and drops everything that depended on the previous one.
    pub fn select_organization(&mut self, organization: Organization) {
        info!(organization = %organization.id, "organization selected");
        self.clear_questionnaire();
        self.organization = Some(organization);
    }

    /// Returns to the start screen.
    pub fn reset(&mut self) {
        self.clear_questionnaire();
        self.organization = None;
    }

    fn clear_questionnaire(&mut self) {
        self.patient = None;
        self.questions.clear();
        self.index = 0;
        self.responses.clear();
        self.submitting = false;
        self.completed = false;
    }

    /// Creates the patient upstream and loads its questionnaire.
    ///
    /// Both calls must succeed; on failure the session stays in
    /// `OrganizationSelected` and keeps no trace of the created patient.
    pub async fn register_patient<B>(
        &mut self,
        backend: &B,
        candidate: Patient,
    ) -> Result<SessionState, SessionError>
    where
        B: IntakeBackend + ?Sized,
    {
        let state = self.state();
        let organization = match (&self.organization, state) {
            (Some(organization), SessionState::OrganizationSelected) => organization,
            _ => {
                return Err(SessionError::invalid_state(format!(
                    "cannot register a patient while {}",
                    state
                )));
            }
        };

        if candidate.basic_info.name.trim().is_empty() {
            return Err(SessionError::Validation(ValidationError::new(
                "name",
                ValidationKind::Required,
                "Please enter your name.",
            )));
        }

        let language = resolve_language(&candidate.preferred_language, organization);
        let draft = Patient {
            id: None,
            organization_id: organization.id.clone(),
            preferred_language: language.clone(),
            ..candidate
        };

        let created = backend.create_patient(&draft).await.map_err(|err| {
            error!(organization = %draft.organization_id, error = %err, "patient creation failed");
            SessionError::upstream("error creating patient", err)
        })?;

        if created.id.as_deref().is_none_or(str::is_empty) {
            return Err(SessionError::upstream(
                "error creating patient",
                BackendError::decode("created patient carries no id"),
            ));
        }

        let organization_id = non_empty_or(&created.organization_id, &draft.organization_id);
        let language_code = non_empty_or(&created.preferred_language, &language);
        let questions = backend
            .fetch_questions(&organization_id, &language_code)
            .await
            .map_err(|err| {
                error!(
                    organization = %organization_id,
                    language = %language_code,
                    error = %err,
                    "question fetch failed"
                );
                SessionError::upstream("error fetching questions", err)
            })?;

        info!(
            patient = created.id.as_deref().unwrap_or_default(),
            questions = questions.len(),
            "patient registered"
        );
        self.patient = Some(created);
        self.questions = questions;
        self.index = 0;

        if self.questions.is_empty() {
            warn!("organization has no questions configured");
            return self.submit(backend).await;
        }
        Ok(self.state())
    }

    /// Stores (or overwrites) the answer for a base question. No I/O.
    pub fn record_response(
        &mut self,
        base_question_id: &str,
        raw_value: impl Into<String>,
        meta: Option<BTreeMap<String, Value>>,
    ) -> Result<(), SessionError> {
        let patient_id = match &self.patient {
            Some(patient) => patient.id.clone().unwrap_or_default(),
            None => {
                return Err(SessionError::invalid_state(
                    "cannot record a response before a patient is registered",
                ));
            }
        };
        if self.completed {
            return Err(SessionError::invalid_state(
                "responses are closed once the questionnaire is completed",
            ));
        }
        if !self
            .questions
            .iter()
            .any(|question| question.response_key() == base_question_id)
        {
            return Err(SessionError::invalid_state(format!(
                "base question '{}' is not part of this questionnaire",
                base_question_id
            )));
        }

        self.responses.upsert(ResponseRecord {
            patient_id,
            base_question_id: base_question_id.to_string(),
            response: raw_value.into(),
            response_meta: meta,
        });
        Ok(())
    }

    /// Moves to the next question, submitting once the last one is passed.
    pub async fn advance<B>(&mut self, backend: &B) -> Result<SessionState, SessionError>
    where
        B: IntakeBackend + ?Sized,
    {
        match self.state() {
            SessionState::Answering { .. } => {}
            other => {
                return Err(SessionError::invalid_state(format!(
                    "cannot advance while {}",
                    other
                )));
            }
        }

        self.index += 1;
        if self.index == self.questions.len() {
            info!(responses = self.responses.len(), "last question answered");
            return self.submit(backend).await;
        }
        Ok(self.state())
    }

    /// Steps back one question. At the first question this changes nothing.
    pub fn retreat(&mut self) -> Result<SessionState, SessionError> {
        match self.state() {
            SessionState::Answering { index: 0 } => Ok(self.state()),
            SessionState::Answering { .. } => {
                self.index -= 1;
                Ok(self.state())
            }
            other => Err(SessionError::invalid_state(format!(
                "cannot go back while {}",
                other
            ))),
        }
    }

    /// Re-sends the response set after a failed submission.
    pub async fn retry_submission<B>(&mut self, backend: &B) -> Result<SessionState, SessionError>
    where
        B: IntakeBackend + ?Sized,
    {
        match self.state() {
            SessionState::Submitting => self.submit(backend).await,
            other => Err(SessionError::invalid_state(format!(
                "nothing to retry while {}",
                other
            ))),
        }
    }

    async fn submit<B>(&mut self, backend: &B) -> Result<SessionState, SessionError>
    where
        B: IntakeBackend + ?Sized,
    {
        if self.completed {
            return Err(SessionError::invalid_state("responses were already submitted"));
        }
        if self.submitting {
            return Err(SessionError::invalid_state("a submission is already in flight"));
        }
        if self.responses.is_empty() {
            warn!("no responses recorded; submission suppressed");
            return Ok(self.state());
        }
        let patient_id = self
            .patient
            .as_ref()
            .and_then(|patient| patient.id.clone())
            .ok_or_else(|| SessionError::invalid_state("no registered patient to submit for"))?;

        let records = self.responses.ordered_by(&self.questions);
        self.submitting = true;
        let result = backend.submit_responses(&patient_id, &records).await;
        self.submitting = false;

        match result {
            Ok(()) => {
                self.completed = true;
                info!(patient = %patient_id, responses = records.len(), "responses submitted");
                Ok(self.state())
            }
            Err(err) => {
                error!(patient = %patient_id, error = %err, "response submission failed");
                Err(SessionError::upstream("error submitting responses", err))
            }
        }
    }

    pub fn current_question(&self) -> Option<&QuestionDefinition> {
        match self.state() {
            SessionState::Answering { index } => self.questions.get(index),
            _ => None,
        }
    }

    /// Mounts the current question, pre-filled with any answer already recorded.
    pub fn mount_current(&self) -> Option<QuestionView> {
        self.current_question()
            .map(|question| QuestionView::mount(question, &self.responses))
    }

    pub fn progress(&self) -> Progress {
        let total = self.questions.len();
        Progress::new((self.index + 1).min(total), total)
    }

    pub fn organization(&self) -> Option<&Organization> {
        self.organization.as_ref()
    }

    pub fn patient(&self) -> Option<&Patient> {
        self.patient.as_ref()
    }

    pub fn questions(&self) -> &[QuestionDefinition] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn responses(&self) -> &ResponseSet {
        &self.responses
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

fn resolve_language(requested: &str, organization: &Organization) -> String {
    [requested, organization.default_language.as_str()]
        .into_iter()
        .map(str::trim)
        .find(|code| !code.is_empty())
        .unwrap_or(FALLBACK_LANGUAGE)
        .to_string()
}

fn non_empty_or(primary: &str, fallback: &str) -> String {
    if primary.trim().is_empty() {
        fallback.to_string()
    } else {
        primary.to_string()
    }
}
