//! JSON shapes exchanged with the enrollment API.
use crate::enrollment::{ApplicationStatus, EnrollmentStatus, ErrorMap, LivelihoodCategory};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Existing enrollment as returned by the lookup endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RemoteEnrollment {
    #[serde(rename = "beneficiaryDetail", default)]
    pub beneficiary_detail: RemoteBeneficiary,
    #[serde(rename = "farmProfile", default)]
    pub farm_profile: Option<RemoteFarmProfile>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RemoteBeneficiary {
    #[serde(rename = "beneficiaryLivelihoods", default)]
    pub livelihoods: Vec<RemoteLivelihood>,
    /// Detail fields, merged by name into the local draft.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RemoteFarmProfile {
    #[serde(default)]
    pub livelihood_category_id: Option<LivelihoodCategory>,
    /// Present only for categories that declare parcels.
    #[serde(rename = "farmParcels", default)]
    pub farm_parcels: Option<Vec<Value>>,
}

/// One livelihood record; activity sub-documents are keyed, not positional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RemoteLivelihood {
    #[serde(default)]
    pub livelihood_category_id: Option<LivelihoodCategory>,
    #[serde(default)]
    pub farmer_activity: Option<Value>,
    #[serde(default)]
    pub fisherfolk_activity: Option<Value>,
    #[serde(default)]
    pub farmworker_activity: Option<Value>,
    #[serde(default)]
    pub agri_youth_activity: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApplicationStatusResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub has_active_enrollment: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApplicationStatusResponse {
    pub fn into_status(self) -> ApplicationStatus {
        let status = match self.status.as_deref().map(str::trim) {
            Some("pending") => EnrollmentStatus::Pending,
            Some("approved") => EnrollmentStatus::Approved,
            Some("rejected") => EnrollmentStatus::Rejected,
            Some("under_review") | Some("under review") => EnrollmentStatus::UnderReview,
            _ => EnrollmentStatus::None,
        };
        ApplicationStatus {
            has_active_enrollment: self.has_active_enrollment,
            status,
            message: self.message,
        }
    }
}

/// Reply to submit and save-draft calls.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SubmissionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "validationErrors")]
    pub errors: Option<Value>,
}

impl SubmissionResponse {
    /// Human-readable failure text, falling back to a generic message.
    pub fn error_message(&self, fallback: &str) -> String {
        self.error
            .as_deref()
            .or(self.message.as_deref())
            .filter(|text| !text.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    }

    /// Backend field errors, keeping the first message per field.
    pub fn field_errors(&self) -> ErrorMap {
        let Some(Value::Object(fields)) = &self.errors else {
            return ErrorMap::new();
        };
        fields
            .iter()
            .filter_map(|(field, messages)| {
                let message = match messages {
                    Value::String(text) => Some(text.clone()),
                    Value::Array(items) => items.iter().find_map(|item| item.as_str()).map(str::to_string),
                    _ => None,
                }?;
                Some((field.clone(), message))
            })
            .collect()
    }
}
