//! Field store: the mutable form document plus per-path errors.
//!
//! Leaf updates go through the section's JSON form so any named field can be
//! replaced without hand-written setters, while the typed draft stays the
//! source of truth.
use super::types::{
    Commodity, EnrollmentDraft, ErrorMap, LivelihoodCategory, LivelihoodSelection, Parcel, Section,
};
use super::validation::{commodity_path, parcel_path, FARM_PARCELS_KEY};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Field name that links the farm profile to the livelihood selection.
pub const LIVELIHOOD_CATEGORY_FIELD: &str = "livelihood_category";

/// Rejected field-store mutation. The draft is left untouched.
#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("unknown field {field:?} in {scope}")]
    UnknownField { scope: String, field: String },
    #[error("invalid value for {path}: {message}")]
    InvalidValue { path: String, message: String },
    #[error("no parcel at index {0}")]
    ParcelOutOfRange(usize),
    #[error("no commodity at index {commodity} in parcel {parcel}")]
    CommodityOutOfRange { parcel: usize, commodity: usize },
    #[error("the form is read-only while an enrollment is active")]
    ReadOnly,
}

/// Holds the draft and the validation errors recorded against it.
#[derive(Debug, Clone, Default)]
pub struct FieldStore {
    draft: EnrollmentDraft,
    errors: ErrorMap,
}

impl FieldStore {
    pub fn new(draft: EnrollmentDraft) -> Self {
        Self {
            draft,
            errors: ErrorMap::new(),
        }
    }

    pub fn draft(&self) -> &EnrollmentDraft {
        &self.draft
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub(crate) fn set_errors(&mut self, errors: ErrorMap) {
        self.errors = errors;
    }

    pub(crate) fn replace_draft(&mut self, draft: EnrollmentDraft) {
        self.draft = draft;
    }

    /// Replace one leaf inside a section.
    pub fn update_field(
        &mut self,
        section: Section,
        field: &str,
        value: Value,
    ) -> Result<(), FieldError> {
        let scope = section.as_str();
        let draft = &mut self.draft;
        match section {
            Section::BeneficiaryDetails => {
                patch_leaf(&mut draft.beneficiary_details, scope, field, value)?
            }
            Section::FarmProfile => patch_leaf(&mut draft.farm_profile, scope, field, value)?,
            Section::FarmerActivities => {
                patch_leaf(&mut draft.farmer_activities, scope, field, value)?
            }
            Section::FisherfolkActivities => {
                patch_leaf(&mut draft.fisherfolk_activities, scope, field, value)?
            }
            Section::FarmworkerActivities => {
                patch_leaf(&mut draft.farmworker_activities, scope, field, value)?
            }
            Section::AgriYouthActivities => {
                patch_leaf(&mut draft.agri_youth_activities, scope, field, value)?
            }
        }

        if section == Section::FarmProfile && field == LIVELIHOOD_CATEGORY_FIELD {
            self.relink_livelihood(self.draft.livelihood_category());
        }
        self.clear_error(&format!("{scope}.{field}"));
        if matches!(
            section,
            Section::FarmerActivities
                | Section::FisherfolkActivities
                | Section::FarmworkerActivities
                | Section::AgriYouthActivities
        ) {
            self.clear_error(scope);
        }
        Ok(())
    }

    /// Convenience for the category setter, which also relinks activities.
    pub fn set_livelihood_category(&mut self, category: LivelihoodCategory) {
        self.draft.farm_profile.livelihood_category = Some(category);
        self.relink_livelihood(Some(category));
        self.clear_error(&format!(
            "{}.{LIVELIHOOD_CATEGORY_FIELD}",
            Section::FarmProfile.as_str()
        ));
    }

    /// Append an empty parcel, returning its index.
    pub fn add_parcel(&mut self) -> usize {
        let municipality = self.draft.beneficiary_details.municipality.clone();
        self.draft.farm_parcels.push(Parcel {
            municipality,
            ..Parcel::default()
        });
        self.clear_error(FARM_PARCELS_KEY);
        self.draft.farm_parcels.len() - 1
    }

    pub fn remove_parcel(&mut self, index: usize) -> Result<Parcel, FieldError> {
        if index >= self.draft.farm_parcels.len() {
            return Err(FieldError::ParcelOutOfRange(index));
        }
        let removed = self.draft.farm_parcels.remove(index);
        // Later parcels shift down, so their recorded paths are stale too.
        self.clear_errors_under(FARM_PARCELS_KEY);
        Ok(removed)
    }

    pub fn update_parcel(
        &mut self,
        index: usize,
        field: &str,
        value: Value,
    ) -> Result<(), FieldError> {
        if field == "commodities" {
            return Err(FieldError::InvalidValue {
                path: parcel_path(index, field),
                message: "edit commodities individually".to_string(),
            });
        }
        let parcel = self
            .draft
            .farm_parcels
            .get_mut(index)
            .ok_or(FieldError::ParcelOutOfRange(index))?;
        let scope = format!("{FARM_PARCELS_KEY}.{index}");
        patch_leaf(parcel, &scope, field, value)?;
        self.clear_error(&parcel_path(index, field));
        Ok(())
    }

    /// Append an empty commodity to a parcel, returning its index.
    pub fn add_commodity(&mut self, parcel: usize) -> Result<usize, FieldError> {
        let target = self
            .draft
            .farm_parcels
            .get_mut(parcel)
            .ok_or(FieldError::ParcelOutOfRange(parcel))?;
        target.commodities.push(Commodity::default());
        let index = target.commodities.len() - 1;
        self.clear_error(&parcel_path(parcel, "commodities"));
        Ok(index)
    }

    pub fn update_commodity(
        &mut self,
        parcel: usize,
        commodity: usize,
        field: &str,
        value: Value,
    ) -> Result<(), FieldError> {
        let target = self
            .draft
            .farm_parcels
            .get_mut(parcel)
            .ok_or(FieldError::ParcelOutOfRange(parcel))?
            .commodities
            .get_mut(commodity)
            .ok_or(FieldError::CommodityOutOfRange { parcel, commodity })?;
        let scope = format!("{FARM_PARCELS_KEY}.{parcel}.commodities.{commodity}");
        patch_leaf(target, &scope, field, value)?;
        self.clear_error(&commodity_path(parcel, commodity, field));
        Ok(())
    }

    pub fn remove_commodity(
        &mut self,
        parcel: usize,
        commodity: usize,
    ) -> Result<Commodity, FieldError> {
        let commodities = &mut self
            .draft
            .farm_parcels
            .get_mut(parcel)
            .ok_or(FieldError::ParcelOutOfRange(parcel))?
            .commodities;
        if commodity >= commodities.len() {
            return Err(FieldError::CommodityOutOfRange { parcel, commodity });
        }
        let removed = commodities.remove(commodity);
        self.clear_errors_under(&parcel_path(parcel, "commodities"));
        Ok(removed)
    }

    fn relink_livelihood(&mut self, category: Option<LivelihoodCategory>) {
        self.draft.livelihood_selection = category
            .map(|livelihood_category_id| {
                vec![LivelihoodSelection {
                    livelihood_category_id,
                }]
            })
            .unwrap_or_default();
    }

    fn clear_error(&mut self, path: &str) {
        self.errors.remove(path);
    }

    fn clear_errors_under(&mut self, prefix: &str) {
        let nested = format!("{prefix}.");
        self.errors
            .retain(|path, _| path != prefix && !path.starts_with(&nested));
    }
}

/// Replace `field` inside `target` through its JSON object form.
fn patch_leaf<T>(target: &mut T, scope: &str, field: &str, value: Value) -> Result<(), FieldError>
where
    T: Serialize + DeserializeOwned,
{
    let path = format!("{scope}.{field}");
    let invalid = |message: String| FieldError::InvalidValue {
        path: path.clone(),
        message,
    };
    let mut object = serde_json::to_value(&*target).map_err(|err| invalid(err.to_string()))?;
    let slot = object
        .as_object_mut()
        .and_then(|map| map.get_mut(field))
        .ok_or_else(|| FieldError::UnknownField {
            scope: scope.to_string(),
            field: field.to_string(),
        })?;
    if slot.is_array() || slot.is_object() {
        return Err(invalid("not a leaf field".to_string()));
    }
    *slot = value;
    *target = serde_json::from_value(object).map_err(|err| invalid(err.to_string()))?;
    Ok(())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
