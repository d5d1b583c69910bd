use thiserror::Error;

use crate::answers::ValidationError;
use crate::backend::BackendError;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Operation invoked outside the state it is valid in.
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    /// A collaborator call failed; the session kept its pre-call state.
    #[error("{reason}: {source}")]
    Upstream {
        reason: String,
        #[source]
        source: BackendError,
    },
}

impl SessionError {
    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        SessionError::InvalidState(message.into())
    }

    pub(crate) fn upstream(reason: impl Into<String>, source: BackendError) -> Self {
        SessionError::Upstream {
            reason: reason.into(),
            source,
        }
    }
}
