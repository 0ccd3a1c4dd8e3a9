//! `ureq` implementation of the enrollment API.
use super::wire::{ApplicationStatusResponse, RemoteEnrollment, SubmissionResponse};
use super::{is_not_found_message, BackendError, EnrollmentBackend, EnrollmentLookup};
use crate::enrollment::EnrollmentDraft;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use ureq::Agent;

/// Blocking HTTP client for the enrollment endpoints.
pub struct HttpBackend {
    agent: Agent,
    base_url: String,
    token: Option<String>,
}

/// Raw HTTP reply before it is interpreted per endpoint.
struct Reply {
    url: String,
    status: u16,
    body: String,
}

impl Reply {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn json<T: DeserializeOwned>(&self) -> Result<T, BackendError> {
        serde_json::from_str(&self.body).map_err(|err| BackendError::Decode {
            url: self.url.clone(),
            message: err.to_string(),
        })
    }
}

#[derive(Deserialize)]
struct LookupEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<RemoteEnrollment>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
struct SubmissionBody<'a> {
    #[serde(flatten)]
    draft: &'a EnrollmentDraft,
    user_id: &'a str,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration, token: Option<String>) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get(&self, path: &str) -> Result<Reply, BackendError> {
        let url = self.url(path);
        let start = Instant::now();
        let mut request = self.agent.get(&url).header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        let result = request.call();
        self.finish(url, start, result)
    }

    fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Reply, BackendError> {
        let url = self.url(path);
        let start = Instant::now();
        let mut request = self.agent.post(&url).header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        let result = request.send_json(body);
        self.finish(url, start, result)
    }

    fn finish(
        &self,
        url: String,
        start: Instant,
        result: Result<ureq::http::Response<ureq::Body>, ureq::Error>,
    ) -> Result<Reply, BackendError> {
        let mut response = result.map_err(|err| BackendError::Transport {
            url: url.clone(),
            message: err.to_string(),
        })?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|err| BackendError::Transport {
                url: url.clone(),
                message: err.to_string(),
            })?;
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            status,
            response_bytes = body.len(),
            url = %url,
            "enrollment api call complete"
        );
        Ok(Reply { url, status, body })
    }

    fn submission(
        &self,
        path: &str,
        draft: &EnrollmentDraft,
        applicant_id: &str,
    ) -> Result<SubmissionResponse, BackendError> {
        let reply = self.post(
            path,
            &SubmissionBody {
                draft,
                user_id: applicant_id,
            },
        )?;
        match reply.json::<SubmissionResponse>() {
            Ok(parsed) => Ok(parsed),
            // Error pages that are not JSON still count as a backend rejection.
            Err(_) if !reply.is_success() => Err(BackendError::Server {
                status: reply.status,
                message: "request was rejected".to_string(),
            }),
            Err(err) => Err(err),
        }
    }
}

impl EnrollmentBackend for HttpBackend {
    fn get_enrollment(&self, applicant_id: &str) -> Result<EnrollmentLookup, BackendError> {
        let reply = self.get(&format!("rsbsa/enrollments/user/{applicant_id}"))?;
        if reply.status == 404 {
            return Ok(EnrollmentLookup::NotFound);
        }
        let envelope: LookupEnvelope = reply.json()?;
        let message = envelope.message.unwrap_or_default();
        if !envelope.success || !reply.is_success() {
            if is_not_found_message(&message) {
                return Ok(EnrollmentLookup::NotFound);
            }
            return Err(BackendError::Server {
                status: reply.status,
                message,
            });
        }
        Ok(match envelope.data {
            Some(enrollment) => EnrollmentLookup::Found(Box::new(enrollment)),
            None => EnrollmentLookup::NotFound,
        })
    }

    fn get_application_status(
        &self,
        applicant_id: &str,
    ) -> Result<ApplicationStatusResponse, BackendError> {
        let reply = self.get(&format!("rsbsa/enrollments/user/{applicant_id}/status"))?;
        if !reply.is_success() {
            let message = reply
                .json::<ApplicationStatusResponse>()
                .ok()
                .and_then(|parsed| parsed.message)
                .unwrap_or_else(|| "status lookup failed".to_string());
            return Err(BackendError::Server {
                status: reply.status,
                message,
            });
        }
        reply.json()
    }

    fn submit_enrollment(
        &self,
        draft: &EnrollmentDraft,
        applicant_id: &str,
    ) -> Result<SubmissionResponse, BackendError> {
        self.submission("rsbsa/enrollments/submit", draft, applicant_id)
    }

    fn save_draft(
        &self,
        draft: &EnrollmentDraft,
        applicant_id: &str,
    ) -> Result<SubmissionResponse, BackendError> {
        self.submission("rsbsa/enrollments/draft", draft, applicant_id)
    }
}
