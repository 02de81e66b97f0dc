//! Tunables for one pipeline run.

use std::time::Duration;

use crate::generate::RetryPolicy;

/// Configuration shared by the crawler, the design fetcher and the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Page budget for the site crawl.
    pub max_pages: usize,
    /// Deadline for one crawled page fetch.
    pub page_timeout: Duration,
    /// Deadline for the design-document fetch.
    pub design_timeout: Duration,
    /// Timeouts, retries and pacing of generation calls.
    pub retry: RetryPolicy,
    /// Token limit passed to the model.
    pub max_tokens: u32,
    /// Substitute hostname-derived pages when the crawl root cannot be fetched.
    pub hint_fallback: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_pages: 30,
            page_timeout: Duration::from_secs(10),
            design_timeout: Duration::from_secs(20),
            retry: RetryPolicy::default(),
            max_tokens: 4096,
            hint_fallback: false,
        }
    }
}
