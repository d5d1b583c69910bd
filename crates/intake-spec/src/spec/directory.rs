use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Organization (a "client" on the wire) a patient registers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_ehr: Option<String>,
    pub default_language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub is_active: bool,
}

/// Language offered for questionnaire localization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Language {
    #[serde(default)]
    pub id: String,
    pub code: String,
    pub name: String,
}

/// Demographics captured by the patient form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BasicInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

/// Patient record. `id` stays empty until the backend has created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "clientId")]
    pub organization_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub basic_info: BasicInfo,
    #[serde(default)]
    pub preferred_language: String,
}

impl Patient {
    /// Builds an unsaved patient for the given organization.
    pub fn draft(organization_id: impl Into<String>, basic_info: BasicInfo) -> Self {
        Self {
            id: None,
            organization_id: organization_id.into(),
            external_id: None,
            basic_info,
            preferred_language: String::new(),
        }
    }

    pub fn with_language(mut self, code: impl Into<String>) -> Self {
        self.preferred_language = code.into();
        self
    }
}

/// Keeps only organizations flagged active, preserving order.
pub fn active_only(organizations: Vec<Organization>) -> Vec<Organization> {
    organizations
        .into_iter()
        .filter(|organization| organization.is_active)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patient_draft_serializes_client_id_without_id() {
        let patient = Patient::draft(
            "c1",
            BasicInfo {
                name: "Jane Doe".into(),
                ..Default::default()
            },
        )
        .with_language("en");
        let value = serde_json::to_value(&patient).expect("json");
        assert_eq!(
            value,
            json!({
                "clientId": "c1",
                "basicInfo": { "name": "Jane Doe" },
                "preferredLanguage": "en"
            })
        );
    }

    #[test]
    fn active_only_filters_inactive() {
        let organizations: Vec<Organization> = serde_json::from_value(json!([
            { "id": "a", "name": "A", "defaultLanguage": "en", "isActive": true },
            { "id": "b", "name": "B", "defaultLanguage": "fr", "isActive": false }
        ]))
        .expect("organizations");
        let active = active_only(organizations);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "a");
    }
}
