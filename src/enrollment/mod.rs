//! Multi-step enrollment form state machine.
//!
//! Leaf modules hold the data model, validation rules, field store, draft
//! persistence, and step navigation; [`EnrollmentSession`] ties them to a
//! backend and a key-value store.
mod clock;
mod loader;
mod merge;
mod navigator;
mod persistence;
mod session;
mod store;
mod types;
mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use loader::{merge_remote, LoadOutcome};
pub use merge::overlay;
pub use navigator::{StepNavigator, TOTAL_STEPS};
pub use persistence::{
    decode_draft, encode_draft, load_stored_draft, DebouncedWriter, DraftRestore, ParseError,
    StoredDraft, DEFAULT_DEBOUNCE, DRAFT_SCHEMA_VERSION,
};
pub use session::{
    BackendErrors, EnrollmentSession, PendingSubmission, SessionOptions, StartupReport,
    StatusCheck, SubmissionKind, SubmissionState, SubmitOutcome, TeardownHandle,
    CONFLICT_MESSAGE, DRAFT_SAVED_MESSAGE, LOAD_FAILURE_MESSAGE, NETWORK_FAILURE_MESSAGE,
    SUBMITTED_MESSAGE,
};
pub use store::{FieldError, FieldStore, LIVELIHOOD_CATEGORY_FIELD};
pub use types::{
    AgriYouthActivities, ApplicationStatus, BeneficiaryDetails, Commodity, EnrollmentDraft,
    EnrollmentStatus, ErrorMap, FarmProfile, FarmType, FarmerActivities, FarmworkerActivities,
    FisherfolkActivities, LivelihoodCategory, LivelihoodSelection, LocationDefaults, Parcel,
    Section, TenureType,
};
pub use validation::{
    is_valid, required_detail_fields, validate, FARM_PARCELS_KEY, GENERAL_ERROR_KEY,
    GENERAL_ERROR_MESSAGE,
};
