//! Folding an existing remote enrollment into the local draft.
//!
//! Remote values win over the locally restored draft wherever both are set.
//! Parcels and livelihood activities only exist remotely for some categories,
//! so each part is merged only when present.
use super::merge::overlay;
use super::types::{Commodity, EnrollmentDraft, LivelihoodSelection, Parcel, Section};
use crate::backend::{RemoteEnrollment, RemoteLivelihood};
use serde_json::Value;

/// What happened when the existing enrollment was looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Remote data was merged into the draft.
    Merged,
    /// No enrollment exists yet; the form stays as restored.
    NewApplicant,
    /// Lookup failed; the message is kept as a recoverable load error.
    Failed(String),
    /// The session was torn down before the reply arrived.
    Detached,
}

impl LoadOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            LoadOutcome::Merged => "merged",
            LoadOutcome::NewApplicant => "new_applicant",
            LoadOutcome::Failed(_) => "failed",
            LoadOutcome::Detached => "detached",
        }
    }
}

/// Merge `remote` into a copy of `draft`.
pub fn merge_remote(
    draft: &EnrollmentDraft,
    remote: &RemoteEnrollment,
) -> Result<EnrollmentDraft, serde_json::Error> {
    let mut merged = serde_json::to_value(draft)?;

    if let Some(details) = merged.get_mut(Section::BeneficiaryDetails.as_str()) {
        overlay(
            details,
            &Value::Object(remote.beneficiary_detail.fields.clone()),
        );
    }

    if let Some(profile) = &remote.farm_profile {
        if let Some(category) = profile.livelihood_category_id {
            merged[Section::FarmProfile.as_str()]["livelihood_category"] =
                Value::from(category.code());
            merged["livelihoodSelection"] = serde_json::to_value(vec![LivelihoodSelection {
                livelihood_category_id: category,
            }])?;
        }
        if let Some(parcels) = profile.farm_parcels.as_ref().filter(|list| !list.is_empty()) {
            merged["farmParcels"] = remote_parcels(parcels)?;
        }
    }

    let livelihoods = &remote.beneficiary_detail.livelihoods;
    for (section, pick) in ACTIVITY_KEYS {
        if let Some(activity) = livelihoods.iter().find_map(|entry| pick(entry).as_ref()) {
            if let Some(slot) = merged.get_mut(section.as_str()) {
                overlay(slot, activity);
            }
        }
    }

    serde_json::from_value(merged)
}

type ActivityPick = fn(&RemoteLivelihood) -> &Option<Value>;

const ACTIVITY_KEYS: [(Section, ActivityPick); 4] = [
    (Section::FarmerActivities, |entry| &entry.farmer_activity),
    (Section::FisherfolkActivities, |entry| &entry.fisherfolk_activity),
    (Section::FarmworkerActivities, |entry| &entry.farmworker_activity),
    (Section::AgriYouthActivities, |entry| &entry.agri_youth_activity),
];

/// Each remote parcel and commodity is laid over a default one, so unset or
/// `null` remote values keep their defaults.
fn remote_parcels(parcels: &[Value]) -> Result<Value, serde_json::Error> {
    let parcel_template = serde_json::to_value(Parcel::default())?;
    let commodity_template = serde_json::to_value(Commodity::default())?;
    let merged = parcels
        .iter()
        .map(|remote| {
            let mut parcel = over_template(&parcel_template, remote);
            if let Some(commodities) = remote.get("commodities").and_then(Value::as_array) {
                parcel["commodities"] = commodities
                    .iter()
                    .map(|commodity| over_template(&commodity_template, commodity))
                    .collect();
            }
            parcel
        })
        .collect();
    Ok(Value::Array(merged))
}

fn over_template(template: &Value, remote: &Value) -> Value {
    let mut merged = template.clone();
    overlay(&mut merged, remote);
    merged
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
