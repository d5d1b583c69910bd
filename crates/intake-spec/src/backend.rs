use async_trait::async_trait;
use thiserror::Error;

use crate::answers::ResponseRecord;
use crate::spec::directory::{Language, Organization, Patient, active_only};
use crate::spec::question::QuestionDefinition;

/// Failure reported by a backend collaborator.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection, DNS or timeout failure.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The backend answered with a non-success status.
    #[error("backend returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("could not decode backend response: {message}")]
    Decode { message: String },

    #[error("invalid backend configuration: {message}")]
    Config { message: String },
}

impl BackendError {
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn api<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn decode<S: Into<String>>(message: S) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// The four REST calls (plus language listing) the intake flow consumes.
#[async_trait]
pub trait IntakeBackend: Send + Sync {
    async fn list_organizations(&self) -> Result<Vec<Organization>, BackendError>;

    async fn list_languages(&self) -> Result<Vec<Language>, BackendError>;

    /// Creates the patient; the returned record carries the server-assigned id.
    async fn create_patient(&self, draft: &Patient) -> Result<Patient, BackendError>;

    /// Questions in answering order.
    async fn fetch_questions(
        &self,
        organization_id: &str,
        language_code: &str,
    ) -> Result<Vec<QuestionDefinition>, BackendError>;

    async fn submit_responses(
        &self,
        patient_id: &str,
        responses: &[ResponseRecord],
    ) -> Result<(), BackendError>;
}

/// Organizations offered for selection.
pub async fn active_organizations<B>(backend: &B) -> Result<Vec<Organization>, BackendError>
where
    B: IntakeBackend + ?Sized,
{
    backend.list_organizations().await.map(active_only)
}
