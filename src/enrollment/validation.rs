//! Validation rules for the enrollment form.
//!
//! `validate` is pure: it maps a draft to field-path errors and never fails.
//! Submission and the submit-readiness check share this one rule set.
use super::types::{EnrollmentDraft, ErrorMap, LivelihoodCategory, Section};
use std::panic::{self, AssertUnwindSafe};

/// Key used when the rules themselves fail.
pub const GENERAL_ERROR_KEY: &str = "general";
pub const GENERAL_ERROR_MESSAGE: &str = "A validation error occurred. Please try again.";
/// Error key for the parcel list as a whole.
pub const FARM_PARCELS_KEY: &str = "farmParcels";

const REQUIRED_DETAILS: [(&str, &str); 7] = [
    ("barangay", "Barangay is required"),
    ("contact_number", "Contact number is required"),
    ("birth_date", "Birth date is required"),
    ("sex", "Sex is required"),
    ("municipality", "Municipality is required"),
    ("province", "Province is required"),
    ("region", "Region is required"),
];

/// Validate the draft, returning an empty map when it may be submitted.
pub fn validate(draft: &EnrollmentDraft) -> ErrorMap {
    guarded(|| collect_errors(draft))
}

/// Convenience wrapper used by readiness checks.
pub fn is_valid(draft: &EnrollmentDraft) -> bool {
    validate(draft).is_empty()
}

/// Run a rule set, turning a panic into a single general error.
pub(crate) fn guarded<F>(rules: F) -> ErrorMap
where
    F: FnOnce() -> ErrorMap,
{
    match panic::catch_unwind(AssertUnwindSafe(rules)) {
        Ok(errors) => errors,
        Err(_) => {
            tracing::error!("enrollment validation panicked");
            let mut errors = ErrorMap::new();
            errors.insert(
                GENERAL_ERROR_KEY.to_string(),
                GENERAL_ERROR_MESSAGE.to_string(),
            );
            errors
        }
    }
}

/// Read a required beneficiary detail by field name.
pub(crate) fn required_detail<'a>(draft: &'a EnrollmentDraft, field: &str) -> &'a str {
    let details = &draft.beneficiary_details;
    match field {
        "barangay" => &details.barangay,
        "contact_number" => &details.contact_number,
        "birth_date" => &details.birth_date,
        "sex" => &details.sex,
        "municipality" => &details.municipality,
        "province" => &details.province,
        "region" => &details.region,
        _ => "",
    }
}

/// Names of the required beneficiary detail fields.
pub fn required_detail_fields() -> impl Iterator<Item = &'static str> {
    REQUIRED_DETAILS.iter().map(|(field, _)| *field)
}

pub(crate) fn detail_path(field: &str) -> String {
    format!("{}.{field}", Section::BeneficiaryDetails.as_str())
}

pub(crate) fn parcel_path(index: usize, field: &str) -> String {
    format!("{FARM_PARCELS_KEY}.{index}.{field}")
}

pub(crate) fn commodity_path(parcel: usize, commodity: usize, field: &str) -> String {
    format!("{FARM_PARCELS_KEY}.{parcel}.commodities.{commodity}.{field}")
}

fn collect_errors(draft: &EnrollmentDraft) -> ErrorMap {
    let mut errors = ErrorMap::new();

    for (field, message) in REQUIRED_DETAILS {
        if required_detail(draft, field).trim().is_empty() {
            errors.insert(detail_path(field), message.to_string());
        }
    }

    let Some(category) = draft.livelihood_category() else {
        errors.insert(
            format!("{}.livelihood_category", Section::FarmProfile.as_str()),
            "Please select a livelihood category".to_string(),
        );
        return errors;
    };

    if category.requires_farm_data() {
        check_parcels(draft, &mut errors);
    }
    check_activities(draft, category, &mut errors);
    errors
}

fn check_parcels(draft: &EnrollmentDraft, errors: &mut ErrorMap) {
    if draft.farm_parcels.is_empty() {
        errors.insert(
            FARM_PARCELS_KEY.to_string(),
            "At least one farm parcel is required".to_string(),
        );
        return;
    }

    for (index, parcel) in draft.farm_parcels.iter().enumerate() {
        if parcel.barangay.trim().is_empty() {
            errors.insert(
                parcel_path(index, "barangay"),
                "Parcel barangay is required".to_string(),
            );
        }
        if parcel.tenure_type.is_none() {
            errors.insert(
                parcel_path(index, "tenure_type"),
                "Tenure type is required".to_string(),
            );
        }
        if !parcel.has_valid_area() {
            errors.insert(
                parcel_path(index, "total_farm_area"),
                "Total farm area must be greater than 0".to_string(),
            );
        }
        if parcel.commodities.is_empty() {
            errors.insert(
                parcel_path(index, "commodities"),
                "At least one commodity is required".to_string(),
            );
        }
        for (commodity_index, commodity) in parcel.commodities.iter().enumerate() {
            if commodity.commodity_id.is_none() {
                errors.insert(
                    commodity_path(index, commodity_index, "commodity_id"),
                    "Commodity is required".to_string(),
                );
            }
        }
    }
}

fn check_activities(draft: &EnrollmentDraft, category: LivelihoodCategory, errors: &mut ErrorMap) {
    if draft.active_activity_satisfied() {
        return;
    }
    let message = match category {
        LivelihoodCategory::Farmer => "Please select at least one farming activity",
        LivelihoodCategory::Fisherfolk => "Please select at least one fishing activity",
        LivelihoodCategory::FarmWorker => "Please select at least one type of farm work",
        LivelihoodCategory::AgriYouth => "Please confirm agri-youth participation",
    };
    errors.insert(
        category.activity_section().as_str().to_string(),
        message.to_string(),
    );
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;
