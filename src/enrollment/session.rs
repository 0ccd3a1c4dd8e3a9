//! Enrollment session: the form state machine a front end drives.
//!
//! The session owns the field store, the step navigator, the debounced draft
//! writer, and the submission state. It is single-threaded; the only
//! parallelism is the pair of startup lookups, which run on scoped threads
//! against a shared `&B`.
//!
//! Submissions are split into [`EnrollmentSession::begin_submission`] and
//! [`EnrollmentSession::complete_submission`] so a caller can issue the network
//! call elsewhere. The convenience wrappers `submit_form` and `save_draft` run
//! both halves back to back.
use super::clock::{Clock, SystemClock};
use super::loader::{merge_remote, LoadOutcome};
use super::navigator::StepNavigator;
use super::persistence::{encode_draft, load_stored_draft, DebouncedWriter, DraftRestore};
use super::store::{FieldError, FieldStore, LIVELIHOOD_CATEGORY_FIELD};
use super::types::{
    ApplicationStatus, Commodity, EnrollmentDraft, EnrollmentStatus, ErrorMap,
    LivelihoodCategory, LocationDefaults, Parcel, Section,
};
use super::validation::{
    commodity_path, parcel_path, required_detail, required_detail_fields, validate,
    FARM_PARCELS_KEY,
};
use crate::backend::{
    ApplicationStatusResponse, BackendError, EnrollmentBackend, EnrollmentLookup,
    SubmissionResponse,
};
use crate::storage::{SessionStore, DRAFT_KEY, STATUS_KEY, STEP_KEY};
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};

pub const CONFLICT_MESSAGE: &str =
    "You already have an active enrollment. You cannot submit a new application.";
pub const SUBMITTED_MESSAGE: &str =
    "Enrollment submitted successfully! Your application is now pending review.";
pub const DRAFT_SAVED_MESSAGE: &str = "Draft saved successfully.";
pub const NETWORK_FAILURE_MESSAGE: &str =
    "Unable to reach the enrollment service. Please try again.";
pub const LOAD_FAILURE_MESSAGE: &str = "Failed to load existing enrollment data.";

/// Tunables taken from the client config.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub debounce: Duration,
    pub location_defaults: LocationDefaults,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            debounce: super::persistence::DEFAULT_DEBOUNCE,
            location_defaults: LocationDefaults::default(),
        }
    }
}

/// Errors reported by the backend, kept apart from validation errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BackendErrors {
    pub message: Option<String>,
    pub fields: ErrorMap,
}

impl BackendErrors {
    pub fn is_empty(&self) -> bool {
        self.message.is_none() && self.fields.is_empty()
    }

    /// Forget the general message and any field error at or below `paths`.
    fn clear_edited(&mut self, paths: &[&str]) {
        self.message = None;
        for &path in paths {
            let nested = format!("{path}.");
            self.fields
                .retain(|key, _| key != path && !key.starts_with(&nested));
        }
    }
}

/// Busy flags plus everything the backend has told us.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubmissionState {
    pub is_submitting: bool,
    pub is_saving_draft: bool,
    pub backend_errors: BackendErrors,
    pub application_status: ApplicationStatus,
    pub load_error: Option<String>,
    pub message: Option<String>,
    pub last_result: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Submit,
    SaveDraft,
}

impl SubmissionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionKind::Submit => "submit",
            SubmissionKind::SaveDraft => "save_draft",
        }
    }
}

/// Result of a submit or save-draft attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted,
    DraftSaved,
    /// Local validation failed; nothing was sent.
    Invalid(ErrorMap),
    /// An active enrollment already exists; nothing was sent.
    Conflict,
    /// The backend answered with a failure.
    Rejected(String),
    /// The request never produced a usable answer.
    Failed(String),
    /// The same kind of request is already in flight.
    Busy,
    /// The session was torn down while the request was in flight.
    Detached,
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted | SubmitOutcome::DraftSaved)
    }

    /// Whether the attempt produced a backend round trip.
    pub fn reached_backend(&self) -> bool {
        matches!(
            self,
            SubmitOutcome::Submitted
                | SubmitOutcome::DraftSaved
                | SubmitOutcome::Rejected(_)
                | SubmitOutcome::Failed(_)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubmitOutcome::Submitted => "submitted",
            SubmitOutcome::DraftSaved => "draft_saved",
            SubmitOutcome::Invalid(_) => "invalid",
            SubmitOutcome::Conflict => "conflict",
            SubmitOutcome::Rejected(_) => "rejected",
            SubmitOutcome::Failed(_) => "failed",
            SubmitOutcome::Busy => "busy",
            SubmitOutcome::Detached => "detached",
        }
    }
}

/// A request that passed the local gates and now needs a backend answer.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    kind: SubmissionKind,
    applicant_id: String,
    draft: EnrollmentDraft,
}

impl PendingSubmission {
    pub fn kind(&self) -> SubmissionKind {
        self.kind
    }

    pub fn applicant_id(&self) -> &str {
        &self.applicant_id
    }

    pub fn draft(&self) -> &EnrollmentDraft {
        &self.draft
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusCheck {
    Updated(ApplicationStatus),
    Failed(String),
    Detached,
}

/// Everything `startup` did, for callers that report it.
#[derive(Debug)]
pub struct StartupReport {
    pub restore: DraftRestore,
    pub load: LoadOutcome,
    pub status: StatusCheck,
}

/// Flips the session's mounted flag from outside the owner.
#[derive(Debug, Clone)]
pub struct TeardownHandle {
    mounted: Arc<AtomicBool>,
}

impl TeardownHandle {
    pub fn teardown(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }
}

pub struct EnrollmentSession<B, S> {
    backend: B,
    storage: S,
    clock: Box<dyn Clock>,
    fields: FieldStore,
    navigator: StepNavigator,
    writer: DebouncedWriter,
    defaults: LocationDefaults,
    restore_attempted: bool,
    mounted: Arc<AtomicBool>,
    submission: SubmissionState,
}

impl<B: EnrollmentBackend, S: SessionStore> EnrollmentSession<B, S> {
    pub fn new(backend: B, storage: S, options: SessionOptions) -> Self {
        Self {
            backend,
            storage,
            clock: Box::new(SystemClock),
            fields: FieldStore::new(EnrollmentDraft::with_defaults(&options.location_defaults)),
            navigator: StepNavigator::new(),
            writer: DebouncedWriter::new(options.debounce),
            defaults: options.location_defaults,
            restore_attempted: false,
            mounted: Arc::new(AtomicBool::new(true)),
            submission: SubmissionState::default(),
        }
    }

    /// Swap the time source used by the draft writer.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn draft(&self) -> &EnrollmentDraft {
        self.fields.draft()
    }

    /// Validation errors currently recorded against the form.
    pub fn errors(&self) -> &ErrorMap {
        self.fields.errors()
    }

    pub fn navigator(&self) -> &StepNavigator {
        &self.navigator
    }

    pub fn submission(&self) -> &SubmissionState {
        &self.submission
    }

    pub fn application_status(&self) -> &ApplicationStatus {
        &self.submission.application_status
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn has_pending_write(&self) -> bool {
        self.writer.is_pending()
    }

    pub fn teardown_handle(&self) -> TeardownHandle {
        TeardownHandle {
            mounted: Arc::clone(&self.mounted),
        }
    }

    /// Stop accepting results and drop any pending draft write.
    pub fn teardown(&mut self) {
        self.mounted.store(false, Ordering::SeqCst);
        self.writer.cancel();
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// One-time restore of the local draft and step slots.
    pub fn restore_draft(&mut self) -> DraftRestore {
        if self.restore_attempted {
            return DraftRestore::AlreadyAttempted;
        }
        self.restore_attempted = true;
        self.restore_step();
        self.restore_status();

        let base = EnrollmentDraft::with_defaults(&self.defaults);
        match load_stored_draft(&self.storage, &base) {
            Ok(Some(draft)) => {
                self.fields.replace_draft(draft);
                tracing::debug!("restored local draft");
                DraftRestore::Restored
            }
            Ok(None) => DraftRestore::Absent,
            Err(err) => {
                tracing::debug!(error = %err, "ignoring unusable local draft");
                DraftRestore::Discarded(err)
            }
        }
    }

    fn restore_step(&mut self) {
        match self.storage.get(STEP_KEY) {
            Ok(Some(raw)) => {
                let step = raw.trim().parse::<u8>().unwrap_or(1);
                self.navigator = StepNavigator::at(step);
            }
            Ok(None) => {}
            Err(err) => tracing::debug!(error = %err, "ignoring unreadable step slot"),
        }
    }

    /// The last known status keeps the form read-only across runs until the
    /// backend is asked again.
    fn restore_status(&mut self) {
        let raw = match self.storage.get(STATUS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(err) => {
                tracing::debug!(error = %err, "ignoring unreadable status slot");
                return;
            }
        };
        match serde_json::from_str::<ApplicationStatus>(&raw) {
            Ok(status) => self.submission.application_status = status,
            Err(err) => tracing::debug!(error = %err, "ignoring malformed status slot"),
        }
    }

    fn set_application_status(&mut self, status: ApplicationStatus) {
        match serde_json::to_string(&status) {
            Ok(encoded) => {
                if let Err(err) = self.storage.set(STATUS_KEY, &encoded) {
                    tracing::warn!(error = %err, "could not store application status");
                }
            }
            Err(err) => tracing::warn!(error = %err, "could not encode application status"),
        }
        self.submission.application_status = status;
    }

    /// Restore the draft, then run both remote lookups side by side.
    pub fn startup(&mut self, applicant_id: &str) -> StartupReport {
        let restore = self.restore_draft();
        let start = Instant::now();
        let backend = &self.backend;
        let (status, enrollment) = thread::scope(|scope| {
            let status = scope.spawn(|| backend.get_application_status(applicant_id));
            let enrollment = scope.spawn(|| backend.get_enrollment(applicant_id));
            (join_lookup(status), join_lookup(enrollment))
        });
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            applicant_id = %applicant_id,
            "startup lookups complete"
        );
        let status = self.apply_status(status);
        let load = self.apply_enrollment(enrollment);
        StartupReport {
            restore,
            load,
            status,
        }
    }

    pub fn load_existing_enrollment(&mut self, applicant_id: &str) -> LoadOutcome {
        let result = self.backend.get_enrollment(applicant_id);
        self.apply_enrollment(result)
    }

    pub fn check_application_status(&mut self, applicant_id: &str) -> StatusCheck {
        let result = self.backend.get_application_status(applicant_id);
        self.apply_status(result)
    }

    fn apply_enrollment(&mut self, result: Result<EnrollmentLookup, BackendError>) -> LoadOutcome {
        if !self.is_mounted() {
            return LoadOutcome::Detached;
        }
        match result {
            Ok(EnrollmentLookup::Found(remote)) => match merge_remote(self.fields.draft(), &remote) {
                Ok(merged) => {
                    self.fields.replace_draft(merged);
                    self.submission.load_error = None;
                    self.writer.schedule(self.clock.now());
                    tracing::info!("merged existing enrollment into draft");
                    LoadOutcome::Merged
                }
                Err(err) => {
                    tracing::warn!(error = %err, "existing enrollment could not be merged");
                    self.load_failed(LOAD_FAILURE_MESSAGE.to_string())
                }
            },
            Ok(EnrollmentLookup::NotFound) => {
                self.submission.load_error = None;
                LoadOutcome::NewApplicant
            }
            Err(err) => {
                tracing::warn!(error = %err, "existing enrollment lookup failed");
                self.load_failed(LOAD_FAILURE_MESSAGE.to_string())
            }
        }
    }

    fn load_failed(&mut self, message: String) -> LoadOutcome {
        self.submission.load_error = Some(message.clone());
        LoadOutcome::Failed(message)
    }

    fn apply_status(
        &mut self,
        result: Result<ApplicationStatusResponse, BackendError>,
    ) -> StatusCheck {
        if !self.is_mounted() {
            return StatusCheck::Detached;
        }
        match result {
            Ok(response) => {
                let status = response.into_status();
                tracing::info!(
                    has_active_enrollment = status.has_active_enrollment,
                    status = %status.status,
                    "application status updated"
                );
                self.set_application_status(status.clone());
                StatusCheck::Updated(status)
            }
            Err(err) => {
                tracing::warn!(error = %err, "application status lookup failed");
                StatusCheck::Failed(failure_message(&err))
            }
        }
    }

    /// While an enrollment is active the form is read-only.
    pub fn should_hide_form(&self) -> bool {
        self.submission.application_status.has_active_enrollment
    }

    pub fn can_submit(&self) -> bool {
        !self.should_hide_form()
            && !self.submission.is_submitting
            && self.submission.backend_errors.is_empty()
            && validate(self.fields.draft()).is_empty()
    }

    /// Validate and record the errors against the form.
    pub fn validate_form(&mut self) -> ErrorMap {
        let errors = validate(self.fields.draft());
        self.fields.set_errors(errors.clone());
        errors
    }

    pub fn update_field(
        &mut self,
        section: Section,
        field: &str,
        value: Value,
    ) -> Result<(), FieldError> {
        // The backend may key section fields by their bare name.
        let path = format!("{section}.{field}");
        self.mutate(&[path.as_str(), field], |fields| {
            fields.update_field(section, field, value)
        })
    }

    pub fn set_livelihood_category(
        &mut self,
        category: LivelihoodCategory,
    ) -> Result<(), FieldError> {
        let path = format!("{}.{LIVELIHOOD_CATEGORY_FIELD}", Section::FarmProfile);
        self.mutate(&[path.as_str(), LIVELIHOOD_CATEGORY_FIELD], |fields| {
            fields.set_livelihood_category(category);
            Ok(())
        })
    }

    pub fn add_parcel(&mut self) -> Result<usize, FieldError> {
        self.mutate(&[FARM_PARCELS_KEY], |fields| Ok(fields.add_parcel()))
    }

    pub fn remove_parcel(&mut self, index: usize) -> Result<Parcel, FieldError> {
        self.mutate(&[FARM_PARCELS_KEY], |fields| fields.remove_parcel(index))
    }

    pub fn update_parcel(
        &mut self,
        index: usize,
        field: &str,
        value: Value,
    ) -> Result<(), FieldError> {
        let path = parcel_path(index, field);
        self.mutate(&[path.as_str()], |fields| fields.update_parcel(index, field, value))
    }

    pub fn add_commodity(&mut self, parcel: usize) -> Result<usize, FieldError> {
        let path = parcel_path(parcel, "commodities");
        self.mutate(&[path.as_str()], |fields| fields.add_commodity(parcel))
    }

    pub fn update_commodity(
        &mut self,
        parcel: usize,
        commodity: usize,
        field: &str,
        value: Value,
    ) -> Result<(), FieldError> {
        let path = commodity_path(parcel, commodity, field);
        self.mutate(&[path.as_str()], |fields| {
            fields.update_commodity(parcel, commodity, field, value)
        })
    }

    pub fn remove_commodity(
        &mut self,
        parcel: usize,
        commodity: usize,
    ) -> Result<Commodity, FieldError> {
        let path = parcel_path(parcel, "commodities");
        self.mutate(&[path.as_str()], |fields| fields.remove_commodity(parcel, commodity))
    }

    /// Apply a change touching `paths`. Backend errors for those paths and the
    /// general backend message no longer describe the form afterwards.
    fn mutate<T>(
        &mut self,
        paths: &[&str],
        change: impl FnOnce(&mut FieldStore) -> Result<T, FieldError>,
    ) -> Result<T, FieldError> {
        if self.should_hide_form() {
            return Err(FieldError::ReadOnly);
        }
        // A write that came due before this change carries the older state.
        self.poll_persistence();
        let value = change(&mut self.fields)?;
        self.submission.backend_errors.clear_edited(paths);
        self.writer.schedule(self.clock.now());
        Ok(value)
    }

    /// Write the draft if its quiet period has elapsed. Returns whether it wrote.
    pub fn poll_persistence(&mut self) -> bool {
        if self.writer.take_due(self.clock.now()) {
            return self.write_draft();
        }
        false
    }

    /// Write any pending draft immediately.
    pub fn flush_draft(&mut self) -> bool {
        if self.writer.take_pending() {
            return self.write_draft();
        }
        false
    }

    fn write_draft(&mut self) -> bool {
        if !self.is_mounted() {
            return false;
        }
        let encoded = match encode_draft(self.fields.draft()) {
            Ok(encoded) => encoded,
            Err(err) => {
                tracing::warn!(error = %err, "could not encode draft");
                return false;
            }
        };
        match self.storage.set(DRAFT_KEY, &encoded) {
            Ok(()) => {
                tracing::debug!(bytes = encoded.len(), "draft persisted");
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not persist draft");
                false
            }
        }
    }

    pub fn next_step(&mut self) -> bool {
        let moved = self.navigator.next();
        self.persist_step(moved)
    }

    pub fn prev_step(&mut self) -> bool {
        let moved = self.navigator.prev();
        self.persist_step(moved)
    }

    pub fn go_to_step(&mut self, step: u8) -> bool {
        let moved = self.navigator.go_to(step);
        self.persist_step(moved)
    }

    fn persist_step(&mut self, moved: bool) -> bool {
        if moved {
            let step = self.navigator.current().to_string();
            if let Err(err) = self.storage.set(STEP_KEY, &step) {
                tracing::warn!(error = %err, "could not persist step");
            }
        }
        moved
    }

    /// Discard the draft and start over from the location defaults.
    pub fn reset_form(&mut self) {
        self.writer.cancel();
        for key in [DRAFT_KEY, STEP_KEY] {
            if let Err(err) = self.storage.clear(key) {
                tracing::warn!(error = %err, key, "could not clear slot");
            }
        }
        self.fields = FieldStore::new(EnrollmentDraft::with_defaults(&self.defaults));
        self.navigator = StepNavigator::new();
        self.submission.backend_errors = BackendErrors::default();
        self.submission.message = None;
        tracing::info!("enrollment form reset");
    }

    /// Share of the required checklist that is filled in, from 0 to 100.
    pub fn completion_percentage(&self) -> u8 {
        let draft = self.fields.draft();
        let mut slots: Vec<bool> = required_detail_fields()
            .map(|field| !required_detail(draft, field).trim().is_empty())
            .collect();
        slots.push(draft.livelihood_category().is_some());
        slots.push(draft.active_activity_satisfied());

        if draft.requires_farm_data() {
            let parcels = &draft.farm_parcels;
            let every = |check: fn(&Parcel) -> bool| !parcels.is_empty() && parcels.iter().all(check);
            slots.push(!parcels.is_empty());
            slots.push(every(|parcel: &Parcel| !parcel.barangay.trim().is_empty()));
            slots.push(every(|parcel: &Parcel| parcel.tenure_type.is_some()));
            slots.push(every(Parcel::has_valid_area));
            slots.push(every(|parcel: &Parcel| {
                !parcel.commodities.is_empty()
                    && parcel
                        .commodities
                        .iter()
                        .all(|commodity| commodity.commodity_id.is_some())
            }));
        }

        let filled = slots.iter().filter(|slot| **slot).count();
        u8::try_from(filled * 100 / slots.len()).unwrap_or(100)
    }

    /// Run the local gates for a submission.
    pub fn begin_submission(
        &mut self,
        kind: SubmissionKind,
        applicant_id: &str,
    ) -> Result<PendingSubmission, SubmitOutcome> {
        if self.busy_flag(kind) {
            return Err(SubmitOutcome::Busy);
        }
        if self.should_hide_form() {
            self.submission.backend_errors = BackendErrors {
                message: Some(CONFLICT_MESSAGE.to_string()),
                fields: ErrorMap::new(),
            };
            return Err(SubmitOutcome::Conflict);
        }
        if kind == SubmissionKind::Submit {
            let errors = self.validate_form();
            if !errors.is_empty() {
                tracing::info!(error_count = errors.len(), "submission blocked by validation");
                return Err(SubmitOutcome::Invalid(errors));
            }
        }

        *self.busy_flag_mut(kind) = true;
        self.submission.backend_errors = BackendErrors::default();
        self.submission.message = None;
        Ok(PendingSubmission {
            kind,
            applicant_id: applicant_id.to_string(),
            draft: self.fields.draft().clone(),
        })
    }

    /// Apply the backend's answer to a pending submission.
    pub fn complete_submission(
        &mut self,
        pending: PendingSubmission,
        result: Result<SubmissionResponse, BackendError>,
    ) -> SubmitOutcome {
        if !self.is_mounted() {
            tracing::debug!(kind = pending.kind.as_str(), "dropping result after teardown");
            return SubmitOutcome::Detached;
        }
        *self.busy_flag_mut(pending.kind) = false;

        match result {
            Ok(response) if response.success => {
                self.submission.last_result = response.data;
                match pending.kind {
                    SubmissionKind::Submit => {
                        self.writer.cancel();
                        if let Err(err) = self.storage.clear(DRAFT_KEY) {
                            tracing::warn!(error = %err, "could not clear submitted draft");
                        }
                        self.set_application_status(ApplicationStatus {
                            has_active_enrollment: true,
                            status: EnrollmentStatus::Pending,
                            message: Some(SUBMITTED_MESSAGE.to_string()),
                        });
                        self.submission.message = Some(SUBMITTED_MESSAGE.to_string());
                        tracing::info!(applicant_id = %pending.applicant_id, "enrollment submitted");
                        SubmitOutcome::Submitted
                    }
                    SubmissionKind::SaveDraft => {
                        self.submission.message = Some(DRAFT_SAVED_MESSAGE.to_string());
                        tracing::info!(applicant_id = %pending.applicant_id, "draft saved remotely");
                        SubmitOutcome::DraftSaved
                    }
                }
            }
            Ok(response) => {
                let fallback = match pending.kind {
                    SubmissionKind::Submit => "Failed to submit enrollment.",
                    SubmissionKind::SaveDraft => "Failed to save draft.",
                };
                let message = response.error_message(fallback);
                self.submission.backend_errors = BackendErrors {
                    message: Some(message.clone()),
                    fields: response.field_errors(),
                };
                tracing::warn!(kind = pending.kind.as_str(), message = %message, "backend rejected request");
                SubmitOutcome::Rejected(message)
            }
            Err(err) => {
                let message = failure_message(&err);
                self.submission.backend_errors = BackendErrors {
                    message: Some(message.clone()),
                    fields: ErrorMap::new(),
                };
                tracing::warn!(kind = pending.kind.as_str(), error = %err, "backend request failed");
                SubmitOutcome::Failed(message)
            }
        }
    }

    pub fn submit_form(&mut self, applicant_id: &str) -> SubmitOutcome {
        self.run_submission(SubmissionKind::Submit, applicant_id)
    }

    pub fn save_draft(&mut self, applicant_id: &str) -> SubmitOutcome {
        self.run_submission(SubmissionKind::SaveDraft, applicant_id)
    }

    fn run_submission(&mut self, kind: SubmissionKind, applicant_id: &str) -> SubmitOutcome {
        let pending = match self.begin_submission(kind, applicant_id) {
            Ok(pending) => pending,
            Err(outcome) => return outcome,
        };
        let result = match kind {
            SubmissionKind::Submit => self
                .backend
                .submit_enrollment(pending.draft(), pending.applicant_id()),
            SubmissionKind::SaveDraft => {
                self.backend.save_draft(pending.draft(), pending.applicant_id())
            }
        };
        self.complete_submission(pending, result)
    }

    fn busy_flag(&self, kind: SubmissionKind) -> bool {
        match kind {
            SubmissionKind::Submit => self.submission.is_submitting,
            SubmissionKind::SaveDraft => self.submission.is_saving_draft,
        }
    }

    fn busy_flag_mut(&mut self, kind: SubmissionKind) -> &mut bool {
        match kind {
            SubmissionKind::Submit => &mut self.submission.is_submitting,
            SubmissionKind::SaveDraft => &mut self.submission.is_saving_draft,
        }
    }
}

fn join_lookup<T>(
    handle: ScopedJoinHandle<'_, Result<T, BackendError>>,
) -> Result<T, BackendError> {
    handle.join().unwrap_or(Err(BackendError::Interrupted))
}

/// Normalize a backend failure into text a user can act on.
fn failure_message(err: &BackendError) -> String {
    match err {
        BackendError::Server { message, .. } if !message.trim().is_empty() => message.clone(),
        _ => NETWORK_FAILURE_MESSAGE.to_string(),
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
