//! REST boundary for enrollment lookups and submissions.
//!
//! The session only sees [`EnrollmentBackend`]; the HTTP implementation lives
//! in [`http`] and tests substitute an in-process fake.
mod http;
mod wire;

pub use http::HttpBackend;
pub use wire::{
    ApplicationStatusResponse, RemoteBeneficiary, RemoteEnrollment, RemoteFarmProfile,
    RemoteLivelihood, SubmissionResponse,
};

use crate::enrollment::EnrollmentDraft;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("request was interrupted before a reply arrived")]
    Interrupted,
}

/// Result of looking up an applicant's existing enrollment.
#[derive(Debug, Clone)]
pub enum EnrollmentLookup {
    Found(Box<RemoteEnrollment>),
    NotFound,
}

/// Backend operations the enrollment session depends on.
///
/// `Sync` because the startup lookups run side by side.
pub trait EnrollmentBackend: Sync {
    fn get_enrollment(&self, applicant_id: &str) -> Result<EnrollmentLookup, BackendError>;

    fn get_application_status(
        &self,
        applicant_id: &str,
    ) -> Result<ApplicationStatusResponse, BackendError>;

    fn submit_enrollment(
        &self,
        draft: &EnrollmentDraft,
        applicant_id: &str,
    ) -> Result<SubmissionResponse, BackendError>;

    fn save_draft(
        &self,
        draft: &EnrollmentDraft,
        applicant_id: &str,
    ) -> Result<SubmissionResponse, BackendError>;
}

/// Whether a backend message means "no enrollment yet".
pub fn is_not_found_message(message: &str) -> bool {
    message.to_ascii_lowercase().contains("not found")
}
