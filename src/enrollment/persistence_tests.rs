use super::*;
use crate::enrollment::types::{LivelihoodCategory, LocationDefaults};
use crate::storage::MemorySessionStore;

#[test]
fn writer_fires_only_after_the_quiet_period() {
    let start = Instant::now();
    let mut writer = DebouncedWriter::new(Duration::from_millis(400));

    writer.schedule(start);
    writer.schedule(start + Duration::from_millis(300));

    assert!(!writer.take_due(start + Duration::from_millis(500)));
    assert!(writer.is_pending());
    assert!(writer.take_due(start + Duration::from_millis(700)));
    assert!(!writer.is_pending());
    assert!(!writer.take_due(start + Duration::from_millis(900)));
}

#[test]
fn cancel_drops_the_pending_write() {
    let mut writer = DebouncedWriter::default();
    writer.schedule(Instant::now());
    writer.cancel();
    assert!(!writer.take_pending());
}

#[test]
fn stored_draft_overlays_onto_defaults() {
    let base = EnrollmentDraft::with_defaults(&LocationDefaults::default());
    let mut edited = base.clone();
    edited.beneficiary_details.barangay = "Luyong Bonbon".to_string();
    edited.farm_profile.livelihood_category = Some(LivelihoodCategory::Farmer);

    let raw = encode_draft(&edited).expect("encode draft");
    let decoded = decode_draft(&raw, &base).expect("decode draft");

    assert_eq!(decoded, edited);
}

#[test]
fn partial_stored_draft_keeps_base_values() {
    let base = EnrollmentDraft::with_defaults(&LocationDefaults::default());
    let raw = serde_json::json!({
        "schema_version": DRAFT_SCHEMA_VERSION,
        "saved_at_epoch_ms": 0,
        "draft": { "beneficiaryDetails": { "sex": "female" } }
    })
    .to_string();

    let decoded = decode_draft(&raw, &base).expect("decode partial draft");

    assert_eq!(decoded.beneficiary_details.sex, "female");
    assert_eq!(decoded.beneficiary_details.province, "Misamis Oriental");
}

#[test]
fn malformed_and_foreign_slots_are_parse_errors() {
    let base = EnrollmentDraft::default();
    assert!(matches!(
        decode_draft("{not json", &base),
        Err(ParseError::Json(_))
    ));

    let future = serde_json::json!({
        "schema_version": 99,
        "saved_at_epoch_ms": 0,
        "draft": {}
    })
    .to_string();
    assert!(matches!(
        decode_draft(&future, &base),
        Err(ParseError::SchemaVersion(99))
    ));
}

#[test]
fn load_stored_draft_reports_absent_slot() {
    let store = MemorySessionStore::new();
    let loaded = load_stored_draft(&store, &EnrollmentDraft::default()).expect("load draft");
    assert!(loaded.is_none());
}
