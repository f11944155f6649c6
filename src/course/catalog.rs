//! Course catalog
//!
//! In-memory course set plus the batch fetch that fills it. Every refresh
//! replaces the whole set: existing courses are cleared before the new
//! batch lands, last write wins, no incremental diffing.

use crate::course::Course;
use crate::error::{remote_message, ApiError};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

/// The locally held course set.
#[derive(Debug, Default)]
pub struct CourseCatalog {
    courses: Vec<Course>,
}

impl CourseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire course set with a freshly decoded batch.
    pub fn replace_all(&mut self, courses: Vec<Course>) {
        debug!(
            previous = self.courses.len(),
            incoming = courses.len(),
            "Replacing course catalog"
        );
        self.courses = courses;
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn get(&self, code: &str) -> Option<&Course> {
        self.courses.iter().find(|course| course.code == code)
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

/// Bearer-authenticated client for the course batch endpoint.
pub struct CatalogClient {
    client: reqwest::Client,
    base: String,
}

impl CatalogClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.into(),
        }
    }

    /// Fetch the full course batch from `<base>/my/course`.
    pub async fn fetch_courses(&self, token: &SecretString) -> Result<Vec<Course>, ApiError> {
        let url = format!("{}/my/course", self.base);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(ApiError::Remote {
                status: status.as_u16(),
                message: remote_message(&body),
            });
        }
        let courses: Vec<Course> = serde_json::from_slice(&body)?;
        info!(count = courses.len(), "Fetched course batch");
        Ok(courses)
    }

    /// Ask the server to reindex one course, `GET <base>/my/course/<code>`.
    ///
    /// Only meaningful for courses whose [`Course::can_update`] flag is set;
    /// the refreshed resource forest arrives with the next batch fetch.
    pub async fn request_reindex(&self, code: &str, token: &SecretString) -> Result<(), ApiError> {
        let url = format!("{}/my/course/{}", self.base, code);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .bytes()
                .await
                .map_err(|e| ApiError::Transport(e.to_string()))?;
            return Err(ApiError::Remote {
                status: status.as_u16(),
                message: remote_message(&body),
            });
        }
        info!(course = %code, "Reindex requested");
        Ok(())
    }
}
