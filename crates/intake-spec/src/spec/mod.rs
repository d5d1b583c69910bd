pub mod directory;
pub mod question;

pub use directory::{BasicInfo, Language, Organization, Patient, active_only};
pub use question::{
    BaseQuestion, ChoiceOption, QuestionDefinition, QuestionMetadata, QuestionType,
    ResponseDataType, ValidationRules,
};
