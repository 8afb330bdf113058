use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ValidationError;

/// Hanford ids are fixed-width site identifiers.
pub const HANFORD_ID_LEN: usize = 7;

/// The document being routed for approval.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingDocument {
    #[serde(default)]
    pub file_extension: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Base64 encoded binary content.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub xsl_style_sheet: Option<String>,
    #[serde(default)]
    pub ascii_content: Option<String>,
}

/// Everything needed to instantiate a new routing in the legacy service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingItem {
    pub document_type_name: String,
    /// Item id of the source application.
    pub application_item_id: Option<i64>,
    pub document_id: String,
    pub document_title: String,
    #[serde(default)]
    pub document_edit_url: Option<String>,
    pub originator_hanford_id: String,
    pub beneficiary_hanford_id: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub create_date_time: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_change_date_time: Option<OffsetDateTime>,
    pub submit_user_hanford_id: String,
    #[serde(default)]
    pub records_container: Option<String>,
    #[serde(default)]
    pub records_classification: Option<String>,
    #[serde(default)]
    pub document: Option<RoutingDocument>,
    #[serde(default)]
    pub string_fields: BTreeMap<String, String>,
    #[serde(default)]
    pub int_fields: BTreeMap<String, i64>,
    /// Replicated-activity data, passed through to the routing service as-is.
    #[serde(default)]
    pub list_fields: BTreeMap<String, serde_json::Value>,
}

impl RoutingItem {
    /// Check every required field, reporting all failures at once.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();

        require(&mut errors, "DocumentTypeName", &self.document_type_name);
        if self.application_item_id.is_none() {
            errors.push(ValidationError::Required {
                field: "ApplicationItemId",
            });
        }
        require(&mut errors, "DocumentId", &self.document_id);
        require(&mut errors, "DocumentTitle", &self.document_title);
        require_hanford_id(
            &mut errors,
            "OriginatorHanfordId",
            &self.originator_hanford_id,
        );
        require_hanford_id(
            &mut errors,
            "BeneficiaryHanfordId",
            &self.beneficiary_hanford_id,
        );
        require_hanford_id(
            &mut errors,
            "SubmitUserHanfordId",
            &self.submit_user_hanford_id,
        );

        ValidationError::collect(errors)
    }
}

fn require(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.push(ValidationError::Required { field });
        return false;
    }
    true
}

fn require_hanford_id(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if require(errors, field, value) && value.chars().count() != HANFORD_ID_LEN {
        errors.push(ValidationError::HanfordIdLength {
            field,
            expected: HANFORD_ID_LEN,
        });
    }
}
