//! In-memory job settings keyed by job identifier.

use crate::run::domain::JobId;
use crate::run::ports::{JobSettings, JobSettingsResult};
use async_trait::async_trait;
use std::collections::HashMap;

/// Static job settings populated at construction.
///
/// Jobs without an entry fall back to the default limit, which itself
/// defaults to unlimited.
#[derive(Debug, Clone, Default)]
pub struct InMemoryJobSettings {
    limits: HashMap<JobId, u32>,
    default_limit: Option<u32>,
}

impl InMemoryJobSettings {
    /// Creates settings with no limits configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the concurrency ceiling applied to jobs without an explicit
    /// entry.
    #[must_use]
    pub const fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = Some(limit);
        self
    }

    /// Sets the concurrency ceiling for one job.
    #[must_use]
    pub fn with_limit(mut self, job_id: JobId, limit: u32) -> Self {
        self.limits.insert(job_id, limit);
        self
    }
}

#[async_trait]
impl JobSettings for InMemoryJobSettings {
    async fn concurrency_limit(&self, job_id: &JobId) -> JobSettingsResult<Option<u32>> {
        Ok(self.limits.get(job_id).copied().or(self.default_limit))
    }
}
