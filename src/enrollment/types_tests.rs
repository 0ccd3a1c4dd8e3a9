use super::*;

#[test]
fn livelihood_category_round_trips_as_integer_code() {
    let profile = FarmProfile {
        livelihood_category: Some(LivelihoodCategory::Fisherfolk),
    };
    let value = serde_json::to_value(&profile).expect("serialize profile");
    assert_eq!(value["livelihood_category"], serde_json::json!(3));

    let parsed: FarmProfile =
        serde_json::from_value(serde_json::json!({ "livelihood_category": 4 }))
            .expect("parse profile");
    assert_eq!(parsed.livelihood_category, Some(LivelihoodCategory::AgriYouth));
}

#[test]
fn livelihood_category_rejects_unknown_codes() {
    let result: Result<FarmProfile, _> =
        serde_json::from_value(serde_json::json!({ "livelihood_category": 9 }));
    assert!(result.is_err());
}

#[test]
fn livelihood_category_parses_names_and_codes() {
    assert_eq!(
        "2".parse::<LivelihoodCategory>(),
        Ok(LivelihoodCategory::FarmWorker)
    );
    assert_eq!(
        "Fisherfolk".parse::<LivelihoodCategory>(),
        Ok(LivelihoodCategory::Fisherfolk)
    );
    assert!("rancher".parse::<LivelihoodCategory>().is_err());
}

#[test]
fn only_farmers_and_fisherfolk_require_farm_data() {
    let required: Vec<_> = LivelihoodCategory::ALL
        .into_iter()
        .filter(|category| category.requires_farm_data())
        .collect();
    assert_eq!(
        required,
        vec![LivelihoodCategory::Farmer, LivelihoodCategory::Fisherfolk]
    );
    assert!(!EnrollmentDraft::default().requires_farm_data());
}

#[test]
fn draft_defaults_prefill_location() {
    let defaults = LocationDefaults {
        municipality: "Tagoloan".to_string(),
        province: "Misamis Oriental".to_string(),
        region: "Region X".to_string(),
    };
    let draft = EnrollmentDraft::with_defaults(&defaults);
    assert_eq!(draft.beneficiary_details.municipality, "Tagoloan");
    assert_eq!(draft.beneficiary_details.region, "Region X");
    assert!(draft.beneficiary_details.barangay.is_empty());
    assert!(draft.farm_parcels.is_empty());
}

#[test]
fn draft_loads_with_missing_sections() {
    let draft: EnrollmentDraft = serde_json::from_value(serde_json::json!({
        "beneficiaryDetails": { "barangay": "Poblacion" }
    }))
    .expect("parse partial draft");
    assert_eq!(draft.beneficiary_details.barangay, "Poblacion");
    assert_eq!(draft.farm_profile.livelihood_category, None);
}

#[test]
fn parcel_areas_accept_numeric_strings() {
    let parcel: Parcel = serde_json::from_value(serde_json::json!({
        "total_farm_area": "1.50",
        "commodities": [{ "commodity_id": 3, "size_hectares": "" }]
    }))
    .expect("parse parcel");
    assert_eq!(parcel.total_farm_area, Some(1.5));
    assert_eq!(parcel.commodities[0].size_hectares, None);

    let bad: Result<Parcel, _> =
        serde_json::from_value(serde_json::json!({ "total_farm_area": "abc" }));
    assert!(bad.is_err());
}
