#![allow(missing_docs)]

pub mod answers;
pub mod backend;
pub mod draft;
pub mod error;
pub mod progress;
pub mod render;
pub mod session;
pub mod spec;
pub mod template;
pub mod validate;
pub mod widget;

pub use answers::{ResponseRecord, ResponseSet, ValidationError, ValidationKind};
pub use backend::{BackendError, IntakeBackend, active_organizations};
pub use draft::{DEFAULT_DRAFT_FILE, DraftStore, FileDraftStore, MemoryDraftStore};
pub use error::SessionError;
pub use progress::Progress;
pub use render::{RenderPayload, RenderStatus, build_render_payload, render_json_ui, render_text};
pub use session::{Session, SessionState};
pub use spec::{
    BaseQuestion, BasicInfo, ChoiceOption, Language, Organization, Patient, QuestionDefinition,
    QuestionMetadata, QuestionType, ResponseDataType, ValidationRules,
};
pub use template::{COMPLETION_HEADING, CompletionTemplate, TemplateError};
pub use validate::{ScaleBounds, is_supported, validate};
pub use widget::{Answer, InputWidget, QuestionView, Submission, select_input};
