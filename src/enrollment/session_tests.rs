use super::*;
use crate::backend::RemoteEnrollment;
use crate::enrollment::clock::ManualClock;
use crate::enrollment::persistence::{decode_draft, ParseError};
use crate::enrollment::types::TenureType;
use crate::storage::MemorySessionStore;
use serde_json::json;
use std::sync::Mutex;

enum Lookup {
    Found(serde_json::Value),
    NotFound,
    Fail,
}

struct FakeBackend {
    calls: Mutex<Vec<&'static str>>,
    lookup: Lookup,
    active: bool,
    reply: Option<SubmissionResponse>,
}

impl FakeBackend {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            lookup: Lookup::NotFound,
            active: false,
            reply: Some(SubmissionResponse {
                success: true,
                data: Some(json!({ "id": 501 })),
                ..SubmissionResponse::default()
            }),
        }
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().expect("calls lock").push(call);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn submission_reply(&self) -> Result<SubmissionResponse, BackendError> {
        self.reply.clone().ok_or_else(|| BackendError::Transport {
            url: "http://backend.test".to_string(),
            message: "connection refused".to_string(),
        })
    }
}

impl EnrollmentBackend for FakeBackend {
    fn get_enrollment(&self, _applicant_id: &str) -> Result<EnrollmentLookup, BackendError> {
        self.record("get_enrollment");
        match &self.lookup {
            Lookup::Found(value) => {
                let remote: RemoteEnrollment =
                    serde_json::from_value(value.clone()).expect("remote fixture");
                Ok(EnrollmentLookup::Found(Box::new(remote)))
            }
            Lookup::NotFound => Ok(EnrollmentLookup::NotFound),
            Lookup::Fail => Err(BackendError::Server {
                status: 500,
                message: "Internal Server Error".to_string(),
            }),
        }
    }

    fn get_application_status(
        &self,
        _applicant_id: &str,
    ) -> Result<ApplicationStatusResponse, BackendError> {
        self.record("get_application_status");
        Ok(ApplicationStatusResponse {
            success: true,
            has_active_enrollment: self.active,
            status: Some(if self.active { "pending" } else { "none" }.to_string()),
            message: None,
        })
    }

    fn submit_enrollment(
        &self,
        _draft: &EnrollmentDraft,
        _applicant_id: &str,
    ) -> Result<SubmissionResponse, BackendError> {
        self.record("submit_enrollment");
        self.submission_reply()
    }

    fn save_draft(
        &self,
        _draft: &EnrollmentDraft,
        _applicant_id: &str,
    ) -> Result<SubmissionResponse, BackendError> {
        self.record("save_draft");
        self.submission_reply()
    }
}

type TestSession = EnrollmentSession<FakeBackend, MemorySessionStore>;

fn session_with(backend: FakeBackend, storage: MemorySessionStore) -> (TestSession, ManualClock) {
    let clock = ManualClock::new();
    let session = EnrollmentSession::new(backend, storage, SessionOptions::default())
        .with_clock(clock.clone());
    (session, clock)
}

fn session() -> (TestSession, ManualClock) {
    session_with(FakeBackend::new(), MemorySessionStore::new())
}

fn fill_details(session: &mut TestSession) {
    for (field, value) in [
        ("barangay", "Taboc"),
        ("contact_number", "09171234567"),
        ("birth_date", "1990-01-01"),
        ("sex", "male"),
    ] {
        session
            .update_field(Section::BeneficiaryDetails, field, json!(value))
            .expect("update detail");
    }
}

/// A farmer draft that passes validation.
fn complete_farmer(session: &mut TestSession) {
    fill_details(session);
    session
        .set_livelihood_category(LivelihoodCategory::Farmer)
        .expect("set category");
    session
        .update_field(Section::FarmerActivities, "rice", json!(true))
        .expect("select rice");
    let parcel = session.add_parcel().expect("add parcel");
    session
        .update_parcel(parcel, "barangay", json!("Taboc"))
        .expect("parcel barangay");
    session
        .update_parcel(parcel, "tenure_type", json!("registered_owner"))
        .expect("tenure");
    session
        .update_parcel(parcel, "total_farm_area", json!(1.5))
        .expect("area");
    let commodity = session.add_commodity(parcel).expect("add commodity");
    session
        .update_commodity(parcel, commodity, "commodity_id", json!(3))
        .expect("commodity id");
}

#[test]
fn rapid_updates_produce_one_write_with_the_final_state() {
    let (mut session, clock) = session();

    for digit in 0..10 {
        session
            .update_field(
                Section::BeneficiaryDetails,
                "contact_number",
                json!(format!("0917123456{digit}")),
            )
            .expect("update contact number");
        clock.advance(Duration::from_millis(100));
        assert!(!session.poll_persistence());
    }
    assert_eq!(session.storage().write_count(DRAFT_KEY), 0);

    clock.advance(Duration::from_millis(300));
    assert!(session.poll_persistence());

    assert_eq!(session.storage().write_count(DRAFT_KEY), 1);
    let raw = session
        .storage()
        .get(DRAFT_KEY)
        .expect("read slot")
        .expect("draft stored");
    let stored = decode_draft(&raw, &EnrollmentDraft::default()).expect("decode stored draft");
    assert_eq!(stored.beneficiary_details.contact_number, "09171234569");
}

#[test]
fn flush_writes_a_pending_draft_immediately() {
    let (mut session, _clock) = session();
    session
        .update_field(Section::BeneficiaryDetails, "sex", json!("female"))
        .expect("update sex");

    assert!(session.has_pending_write());
    assert!(session.flush_draft());
    assert!(!session.has_pending_write());
    assert!(!session.flush_draft());
    assert_eq!(session.storage().write_count(DRAFT_KEY), 1);
}

#[test]
fn malformed_stored_draft_is_discarded_once() {
    let mut storage = MemorySessionStore::new();
    storage.set(DRAFT_KEY, "{not json").expect("seed slot");
    let (mut session, _clock) = session_with(FakeBackend::new(), storage);

    assert!(matches!(
        session.restore_draft(),
        DraftRestore::Discarded(ParseError::Json(_))
    ));
    assert!(matches!(session.restore_draft(), DraftRestore::AlreadyAttempted));
    assert_eq!(session.draft().beneficiary_details.municipality, "Opol");
}

#[test]
fn stored_draft_and_step_are_restored() {
    let mut draft = EnrollmentDraft::with_defaults(&LocationDefaults::default());
    draft.beneficiary_details.barangay = "Bagocboc".to_string();
    let mut storage = MemorySessionStore::new();
    storage
        .set(DRAFT_KEY, &encode_draft(&draft).expect("encode"))
        .expect("seed draft");
    storage.set(STEP_KEY, "3").expect("seed step");
    let (mut session, _clock) = session_with(FakeBackend::new(), storage);

    assert!(matches!(session.restore_draft(), DraftRestore::Restored));
    assert_eq!(session.draft().beneficiary_details.barangay, "Bagocboc");
    assert_eq!(session.navigator().current(), 3);
}

#[test]
fn active_enrollment_blocks_submit_without_network_calls() {
    let mut backend = FakeBackend::new();
    backend.active = true;
    let (mut session, _clock) = session_with(backend, MemorySessionStore::new());
    assert!(matches!(
        session.check_application_status("7"),
        StatusCheck::Updated(_)
    ));

    assert_eq!(session.submit_form("7"), SubmitOutcome::Conflict);
    assert_eq!(session.save_draft("7"), SubmitOutcome::Conflict);

    assert_eq!(session.backend().calls(), vec!["get_application_status"]);
    assert_eq!(
        session.submission().backend_errors.message.as_deref(),
        Some(CONFLICT_MESSAGE)
    );
    assert!(session.should_hide_form());
    assert_eq!(
        session.update_field(Section::BeneficiaryDetails, "sex", json!("male")),
        Err(FieldError::ReadOnly)
    );
}

#[test]
fn invalid_draft_is_not_sent() {
    let (mut session, _clock) = session();
    fill_details(&mut session);

    let outcome = session.submit_form("7");

    let SubmitOutcome::Invalid(errors) = outcome else {
        panic!("expected invalid outcome, got {outcome:?}");
    };
    assert!(errors.contains_key("farmProfile.livelihood_category"));
    assert_eq!(session.errors(), &errors);
    assert!(session.backend().calls().is_empty());
    assert!(!session.submission().is_submitting);
}

#[test]
fn missing_commodity_id_blocks_can_submit() {
    let (mut session, _clock) = session();
    complete_farmer(&mut session);
    assert!(session.can_submit());

    session
        .update_commodity(0, 0, "commodity_id", serde_json::Value::Null)
        .expect("clear commodity id");

    assert!(!session.can_submit());
}

#[test]
fn successful_submit_clears_the_draft_and_locks_the_form() {
    let (mut session, _clock) = session();
    complete_farmer(&mut session);
    assert!(session.flush_draft());
    assert!(session.storage().contains(DRAFT_KEY));

    assert_eq!(session.submit_form("7"), SubmitOutcome::Submitted);

    assert!(!session.storage().contains(DRAFT_KEY));
    assert!(session.should_hide_form());
    assert!(!session.can_submit());
    assert_eq!(
        session.application_status().status,
        EnrollmentStatus::Pending
    );
    assert_eq!(session.submission().message.as_deref(), Some(SUBMITTED_MESSAGE));
    assert_eq!(session.submission().last_result, Some(json!({ "id": 501 })));
    assert_eq!(session.add_parcel(), Err(FieldError::ReadOnly));
}

#[test]
fn last_known_status_keeps_the_next_session_read_only() {
    let (mut session, _clock) = session();
    complete_farmer(&mut session);
    assert_eq!(session.submit_form("7"), SubmitOutcome::Submitted);
    assert!(session.storage().contains(STATUS_KEY));

    let (mut reopened, _clock) = session_with(FakeBackend::new(), session.storage().clone());
    assert!(!reopened.should_hide_form());
    reopened.restore_draft();

    assert!(reopened.should_hide_form());
    assert_eq!(reopened.application_status().status, EnrollmentStatus::Pending);
    assert_eq!(
        reopened.update_field(Section::BeneficiaryDetails, "sex", json!("female")),
        Err(FieldError::ReadOnly)
    );
    assert_eq!(reopened.save_draft("7"), SubmitOutcome::Conflict);
    assert!(reopened.backend().calls().is_empty());

    assert!(matches!(
        reopened.check_application_status("7"),
        StatusCheck::Updated(_)
    ));
    assert!(!reopened.should_hide_form());
    reopened
        .update_field(Section::BeneficiaryDetails, "sex", json!("female"))
        .expect("editable once the backend reports no enrollment");
}

#[test]
fn malformed_status_slot_is_ignored() {
    let mut storage = MemorySessionStore::new();
    storage.set(STATUS_KEY, "{\"has_active_enrollment\": ").expect("seed slot");
    let (mut session, _clock) = session_with(FakeBackend::new(), storage);

    session.restore_draft();

    assert!(!session.should_hide_form());
}

#[test]
fn backend_rejection_records_field_errors() {
    let mut backend = FakeBackend::new();
    backend.reply = Some(
        serde_json::from_value(json!({
            "success": false,
            "message": "The given data was invalid.",
            "errors": { "contact_number": ["Contact number already registered."] }
        }))
        .expect("reply fixture"),
    );
    let (mut session, _clock) = session_with(backend, MemorySessionStore::new());
    complete_farmer(&mut session);

    let outcome = session.submit_form("7");

    assert_eq!(
        outcome,
        SubmitOutcome::Rejected("The given data was invalid.".to_string())
    );
    let errors = &session.submission().backend_errors;
    assert_eq!(
        errors.fields["contact_number"],
        "Contact number already registered."
    );
    assert!(session.errors().is_empty());
    assert!(!session.can_submit());
    assert!(!session.submission().is_submitting);

    session
        .update_field(Section::BeneficiaryDetails, "sex", json!("female"))
        .expect("unrelated edit");
    let errors = &session.submission().backend_errors;
    assert_eq!(errors.message, None);
    assert!(errors.fields.contains_key("contact_number"));
    assert!(!session.can_submit());

    session
        .update_field(
            Section::BeneficiaryDetails,
            "contact_number",
            json!("09179999999"),
        )
        .expect("fix contact number");
    assert!(session.submission().backend_errors.is_empty());
    assert!(session.can_submit());
}

#[test]
fn editing_after_a_failure_allows_resubmission() {
    let mut backend = FakeBackend::new();
    backend.reply = Some(SubmissionResponse {
        success: false,
        message: Some("bad".to_string()),
        ..SubmissionResponse::default()
    });
    let (mut session, _clock) = session_with(backend, MemorySessionStore::new());
    complete_farmer(&mut session);

    assert_eq!(session.submit_form("7"), SubmitOutcome::Rejected("bad".to_string()));
    assert!(!session.can_submit());

    session
        .update_commodity(0, 0, "remarks", json!("hybrid seed"))
        .expect("edit commodity");
    assert!(session.can_submit());
}

#[test]
fn dotted_backend_errors_clear_with_their_subtree() {
    let mut backend = FakeBackend::new();
    backend.reply = Some(
        serde_json::from_value(json!({
            "success": false,
            "errors": {
                "farmParcels.0.barangay": ["Unknown barangay."],
                "farmParcels.0.commodities.0.commodity_id": ["Unknown commodity."]
            }
        }))
        .expect("reply fixture"),
    );
    let (mut session, _clock) = session_with(backend, MemorySessionStore::new());
    complete_farmer(&mut session);
    assert!(matches!(session.submit_form("7"), SubmitOutcome::Rejected(_)));

    session
        .update_parcel(0, "barangay", json!("Patag"))
        .expect("fix barangay");
    let fields = &session.submission().backend_errors.fields;
    assert!(!fields.contains_key("farmParcels.0.barangay"));
    assert!(fields.contains_key("farmParcels.0.commodities.0.commodity_id"));

    session.remove_parcel(0).expect("remove parcel");
    assert!(session.submission().backend_errors.is_empty());
}

#[test]
fn transport_failure_is_normalized() {
    let mut backend = FakeBackend::new();
    backend.reply = None;
    let (mut session, _clock) = session_with(backend, MemorySessionStore::new());

    let outcome = session.save_draft("7");

    assert_eq!(
        outcome,
        SubmitOutcome::Failed(NETWORK_FAILURE_MESSAGE.to_string())
    );
    assert!(outcome.reached_backend());
    assert!(!session.submission().is_saving_draft);
}

#[test]
fn busy_flags_guard_each_kind_independently() {
    let (mut session, _clock) = session();
    complete_farmer(&mut session);

    let pending = session
        .begin_submission(SubmissionKind::Submit, "7")
        .expect("first submit starts");
    assert!(matches!(
        session.begin_submission(SubmissionKind::Submit, "7"),
        Err(SubmitOutcome::Busy)
    ));
    assert!(!session.can_submit());

    let draft = session
        .begin_submission(SubmissionKind::SaveDraft, "7")
        .expect("save draft is not blocked by submit");
    assert!(session.submission().is_submitting);
    assert!(session.submission().is_saving_draft);

    let saved = session.complete_submission(
        draft,
        Ok(SubmissionResponse {
            success: true,
            ..SubmissionResponse::default()
        }),
    );
    assert_eq!(saved, SubmitOutcome::DraftSaved);
    assert!(session.submission().is_submitting);

    let submitted = session.complete_submission(
        pending,
        Ok(SubmissionResponse {
            success: true,
            ..SubmissionResponse::default()
        }),
    );
    assert_eq!(submitted, SubmitOutcome::Submitted);
    assert!(!session.submission().is_submitting);
}

#[test]
fn results_after_teardown_are_dropped() {
    let (mut session, _clock) = session();
    complete_farmer(&mut session);
    let handle = session.teardown_handle();

    let pending = session
        .begin_submission(SubmissionKind::Submit, "7")
        .expect("submit starts");
    handle.teardown();
    let outcome = session.complete_submission(
        pending,
        Ok(SubmissionResponse {
            success: true,
            ..SubmissionResponse::default()
        }),
    );

    assert_eq!(outcome, SubmitOutcome::Detached);
    assert!(!session.application_status().has_active_enrollment);
    assert!(session.submission().message.is_none());
    assert!(matches!(
        session.load_existing_enrollment("7"),
        LoadOutcome::Detached
    ));
    assert!(!session.flush_draft());
    assert_eq!(session.storage().write_count(DRAFT_KEY), 0);
}

#[test]
fn startup_prefers_remote_values_over_the_local_draft() {
    let mut draft = EnrollmentDraft::with_defaults(&LocationDefaults::default());
    draft.beneficiary_details.barangay = "Local".to_string();
    draft.beneficiary_details.birth_date = "1985-05-05".to_string();
    let mut storage = MemorySessionStore::new();
    storage
        .set(DRAFT_KEY, &encode_draft(&draft).expect("encode"))
        .expect("seed draft");

    let mut backend = FakeBackend::new();
    backend.lookup = Lookup::Found(json!({
        "beneficiaryDetail": { "barangay": "Remote", "birth_date": null },
        "farmProfile": {
            "livelihood_category_id": 1,
            "farmParcels": [{ "barangay": "Remote", "tenure_type": "tenant", "total_farm_area": 2 }]
        }
    }));
    let (mut session, _clock) = session_with(backend, storage);

    let report = session.startup("7");

    assert!(matches!(report.restore, DraftRestore::Restored));
    assert_eq!(report.load, LoadOutcome::Merged);
    assert!(matches!(report.status, StatusCheck::Updated(_)));
    let details = &session.draft().beneficiary_details;
    assert_eq!(details.barangay, "Remote");
    assert_eq!(details.birth_date, "1985-05-05");
    assert_eq!(session.draft().farm_parcels[0].tenure_type, Some(TenureType::Tenant));
    let mut calls = session.backend().calls();
    calls.sort_unstable();
    assert_eq!(calls, vec!["get_application_status", "get_enrollment"]);
}

#[test]
fn not_found_is_a_new_applicant_and_failures_keep_the_form_usable() {
    let (mut session, _clock) = session();
    assert_eq!(session.load_existing_enrollment("7"), LoadOutcome::NewApplicant);
    assert!(session.submission().load_error.is_none());

    let mut backend = FakeBackend::new();
    backend.lookup = Lookup::Fail;
    let (mut failing, _clock) = session_with(backend, MemorySessionStore::new());
    assert_eq!(
        failing.load_existing_enrollment("7"),
        LoadOutcome::Failed(LOAD_FAILURE_MESSAGE.to_string())
    );
    assert_eq!(
        failing.submission().load_error.as_deref(),
        Some(LOAD_FAILURE_MESSAGE)
    );
    failing
        .update_field(Section::BeneficiaryDetails, "barangay", json!("Igpit"))
        .expect("form stays editable");
}

#[test]
fn completion_denominator_depends_on_the_category() {
    let (mut session, _clock) = session();
    assert_eq!(session.completion_percentage(), 33);

    fill_details(&mut session);
    session
        .set_livelihood_category(LivelihoodCategory::FarmWorker)
        .expect("set category");
    session
        .update_field(Section::FarmworkerActivities, "planting", json!(true))
        .expect("select planting");
    assert_eq!(session.completion_percentage(), 100);

    session
        .set_livelihood_category(LivelihoodCategory::Farmer)
        .expect("set category");
    session
        .update_field(Section::FarmerActivities, "corn", json!(true))
        .expect("select corn");
    assert_eq!(session.completion_percentage(), 64);
}

#[test]
fn infinite_area_counts_as_missing_everywhere() {
    let (mut session, _clock) = session();
    complete_farmer(&mut session);
    assert_eq!(session.completion_percentage(), 100);

    session
        .update_parcel(0, "total_farm_area", json!("inf"))
        .expect("lenient area");

    assert_eq!(session.completion_percentage(), 92);
    assert!(session
        .validate_form()
        .contains_key("farmParcels.0.total_farm_area"));
    assert!(!session.can_submit());
}

#[test]
fn reset_clears_storage_and_restarts_from_defaults() {
    let (mut session, _clock) = session();
    complete_farmer(&mut session);
    assert!(session.flush_draft());
    assert!(session.go_to_step(4));
    assert!(session.storage().contains(STEP_KEY));

    session.reset_form();

    assert!(!session.storage().contains(DRAFT_KEY));
    assert!(!session.storage().contains(STEP_KEY));
    assert!(!session.has_pending_write());
    assert_eq!(session.navigator().current(), 1);
    assert_eq!(
        session.draft(),
        &EnrollmentDraft::with_defaults(&LocationDefaults::default())
    );
}
