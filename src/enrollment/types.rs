//! Typed form document for an RSBSA enrollment.
//!
//! These types mirror the JSON stored in the draft slot and sent to the
//! backend, so every field carries `serde(default)` and older drafts keep
//! loading after fields are added.
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Field-path keyed error messages. Empty means valid.
pub type ErrorMap = BTreeMap<String, String>;

/// Applicant category selected in the farm profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum LivelihoodCategory {
    Farmer = 1,
    FarmWorker = 2,
    Fisherfolk = 3,
    AgriYouth = 4,
}

impl LivelihoodCategory {
    pub const ALL: [LivelihoodCategory; 4] = [
        LivelihoodCategory::Farmer,
        LivelihoodCategory::FarmWorker,
        LivelihoodCategory::Fisherfolk,
        LivelihoodCategory::AgriYouth,
    ];

    /// Numeric code used by the backend.
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LivelihoodCategory::Farmer => "farmer",
            LivelihoodCategory::FarmWorker => "farmworker",
            LivelihoodCategory::Fisherfolk => "fisherfolk",
            LivelihoodCategory::AgriYouth => "agri_youth",
        }
    }

    /// Farmers and fisherfolk must declare parcels and commodities.
    pub fn requires_farm_data(self) -> bool {
        matches!(
            self,
            LivelihoodCategory::Farmer | LivelihoodCategory::Fisherfolk
        )
    }

    /// Section holding the activity flags for this category.
    pub fn activity_section(self) -> Section {
        match self {
            LivelihoodCategory::Farmer => Section::FarmerActivities,
            LivelihoodCategory::FarmWorker => Section::FarmworkerActivities,
            LivelihoodCategory::Fisherfolk => Section::FisherfolkActivities,
            LivelihoodCategory::AgriYouth => Section::AgriYouthActivities,
        }
    }
}

impl TryFrom<u8> for LivelihoodCategory {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(LivelihoodCategory::Farmer),
            2 => Ok(LivelihoodCategory::FarmWorker),
            3 => Ok(LivelihoodCategory::Fisherfolk),
            4 => Ok(LivelihoodCategory::AgriYouth),
            other => Err(format!("unknown livelihood category {other}")),
        }
    }
}

impl From<LivelihoodCategory> for u8 {
    fn from(category: LivelihoodCategory) -> Self {
        category.code()
    }
}

impl FromStr for LivelihoodCategory {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if let Ok(code) = raw.parse::<u8>() {
            return LivelihoodCategory::try_from(code);
        }
        LivelihoodCategory::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(raw))
            .ok_or_else(|| format!("unknown livelihood category {raw:?}"))
    }
}

impl fmt::Display for LivelihoodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named sections of the draft that accept `update_field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    BeneficiaryDetails,
    FarmProfile,
    FarmerActivities,
    FisherfolkActivities,
    FarmworkerActivities,
    AgriYouthActivities,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::BeneficiaryDetails,
        Section::FarmProfile,
        Section::FarmerActivities,
        Section::FisherfolkActivities,
        Section::FarmworkerActivities,
        Section::AgriYouthActivities,
    ];

    /// Stable key used in JSON and in error paths.
    pub fn as_str(self) -> &'static str {
        match self {
            Section::BeneficiaryDetails => "beneficiaryDetails",
            Section::FarmProfile => "farmProfile",
            Section::FarmerActivities => "farmerActivities",
            Section::FisherfolkActivities => "fisherfolkActivities",
            Section::FarmworkerActivities => "farmworkerActivities",
            Section::AgriYouthActivities => "agriYouthActivities",
        }
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| format!("unknown section {raw:?}"))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accept decimals as numbers or numeric strings; blank strings mean unset.
fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(value)) => Ok(Some(value)),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Personal, contact, government-ID, association, and household details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeneficiaryDetails {
    pub rsbsa_reference_number: String,
    pub barangay: String,
    pub municipality: String,
    pub province: String,
    pub region: String,
    pub contact_number: String,
    pub landline_number: String,
    pub birth_date: String,
    pub place_of_birth: String,
    pub sex: String,
    pub civil_status: String,
    pub name_of_spouse: String,
    pub highest_education: String,
    pub religion: String,
    pub is_pwd: bool,
    pub has_government_id: bool,
    pub government_id_type: String,
    pub government_id_number: String,
    pub is_association_member: bool,
    pub association_name: String,
    pub mothers_maiden_name: String,
    pub is_household_head: bool,
    pub household_head_name: String,
    pub household_head_relationship: String,
    pub household_members_count: Option<u32>,
    pub emergency_contact_name: String,
    pub emergency_contact_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmProfile {
    pub livelihood_category: Option<LivelihoodCategory>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenureType {
    RegisteredOwner,
    Tenant,
    Lessee,
    Others,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FarmType {
    Irrigated,
    RainfedUpland,
    RainfedLowland,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Commodity {
    pub commodity_id: Option<u64>,
    #[serde(deserialize_with = "lenient_decimal")]
    pub size_hectares: Option<f64>,
    pub number_of_heads: Option<u32>,
    pub farm_type: Option<FarmType>,
    pub is_organic: bool,
    pub remarks: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parcel {
    pub barangay: String,
    pub municipality: String,
    pub tenure_type: Option<TenureType>,
    pub landowner_name: String,
    pub ownership_document_number: String,
    pub is_ancestral_domain: bool,
    pub is_agrarian_reform_beneficiary: bool,
    #[serde(deserialize_with = "lenient_decimal")]
    pub total_farm_area: Option<f64>,
    pub remarks: String,
    pub commodities: Vec<Commodity>,
}

impl Parcel {
    /// A finite area above zero.
    pub fn has_valid_area(&self) -> bool {
        self.total_farm_area
            .is_some_and(|area| area.is_finite() && area > 0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmerActivities {
    pub rice: bool,
    pub corn: bool,
    pub other_crops: bool,
    pub other_crops_specify: String,
    pub livestock: bool,
    pub livestock_specify: String,
    pub poultry: bool,
    pub poultry_specify: String,
}

impl FarmerActivities {
    pub fn any_selected(&self) -> bool {
        self.rice || self.corn || self.other_crops || self.livestock || self.poultry
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FisherfolkActivities {
    pub fish_capture: bool,
    pub aquaculture: bool,
    pub gleaning: bool,
    pub fish_processing: bool,
    pub fish_vending: bool,
    pub others: bool,
    pub others_specify: String,
}

impl FisherfolkActivities {
    pub fn any_selected(&self) -> bool {
        self.fish_capture
            || self.aquaculture
            || self.gleaning
            || self.fish_processing
            || self.fish_vending
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmworkerActivities {
    pub land_preparation: bool,
    pub planting: bool,
    pub cultivation: bool,
    pub harvesting: bool,
    pub others: bool,
    pub others_specify: String,
}

impl FarmworkerActivities {
    pub fn any_selected(&self) -> bool {
        self.land_preparation || self.planting || self.cultivation || self.harvesting || self.others
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgriYouthActivities {
    pub is_agri_youth: bool,
    pub is_part_of_farming_household: bool,
    pub is_formal_agri_course: bool,
    pub is_nonformal_agri_course: bool,
    pub is_agri_program_participant: bool,
    pub others: bool,
    pub others_specify: String,
}

/// One entry of the livelihood selection linkage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivelihoodSelection {
    pub livelihood_category_id: LivelihoodCategory,
}

/// Location values pre-filled into a fresh draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationDefaults {
    pub municipality: String,
    pub province: String,
    pub region: String,
}

impl Default for LocationDefaults {
    fn default() -> Self {
        Self {
            municipality: "Opol".to_string(),
            province: "Misamis Oriental".to_string(),
            region: "Region X (Northern Mindanao)".to_string(),
        }
    }
}

/// Root aggregate of the enrollment form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnrollmentDraft {
    pub beneficiary_details: BeneficiaryDetails,
    pub farm_profile: FarmProfile,
    pub farm_parcels: Vec<Parcel>,
    pub farmer_activities: FarmerActivities,
    pub fisherfolk_activities: FisherfolkActivities,
    pub farmworker_activities: FarmworkerActivities,
    pub agri_youth_activities: AgriYouthActivities,
    pub livelihood_selection: Vec<LivelihoodSelection>,
}

impl EnrollmentDraft {
    /// Fresh draft with location fields pre-filled.
    pub fn with_defaults(defaults: &LocationDefaults) -> Self {
        let mut draft = Self::default();
        draft.beneficiary_details.municipality = defaults.municipality.clone();
        draft.beneficiary_details.province = defaults.province.clone();
        draft.beneficiary_details.region = defaults.region.clone();
        draft
    }

    pub fn livelihood_category(&self) -> Option<LivelihoodCategory> {
        self.farm_profile.livelihood_category
    }

    /// False until a category that needs parcels is selected.
    pub fn requires_farm_data(&self) -> bool {
        self.livelihood_category()
            .is_some_and(LivelihoodCategory::requires_farm_data)
    }

    /// Whether the activity variant for the current category has a qualifying flag.
    pub fn active_activity_satisfied(&self) -> bool {
        match self.livelihood_category() {
            Some(LivelihoodCategory::Farmer) => self.farmer_activities.any_selected(),
            Some(LivelihoodCategory::Fisherfolk) => self.fisherfolk_activities.any_selected(),
            Some(LivelihoodCategory::FarmWorker) => self.farmworker_activities.any_selected(),
            Some(LivelihoodCategory::AgriYouth) => self.agri_youth_activities.is_agri_youth,
            None => false,
        }
    }
}

/// Backend-reported enrollment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    #[default]
    None,
    Pending,
    Approved,
    Rejected,
    UnderReview,
}

impl EnrollmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EnrollmentStatus::None => "none",
            EnrollmentStatus::Pending => "pending",
            EnrollmentStatus::Approved => "approved",
            EnrollmentStatus::Rejected => "rejected",
            EnrollmentStatus::UnderReview => "under_review",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of the applicant's enrollment standing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationStatus {
    pub has_active_enrollment: bool,
    pub status: EnrollmentStatus,
    pub message: Option<String>,
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
