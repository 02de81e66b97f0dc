//! The generate module drives the model through a fixed, ordered sequence of
//! calls and gathers the artifacts parsed from every response.

use chrono::Datelike;
use llm::chat::{ChatMessage, ChatProvider};
use llm::error::LLMError;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use rate_guard::{RateLimit, StdTokenBucket, TokenBucketBuilder};
use regex::Regex;
use std::collections::HashSet;
use std::time::Duration;

use crate::constants::{HTML_BATCH_SIZE, THINK_STRIPPER};
use crate::crawl::SiteFacts;
use crate::design::DesignFacts;
use crate::error::{GenerationError, PipelineError};
use crate::output::{GeneratedArtifact, parse_files};
use crate::progress::ProgressSender;
use crate::prompts::{DesignSummary, html_batch_prompt, site_assets_prompt, site_context};

static THINK_STRIPPER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(THINK_STRIPPER).expect("Failed to compile THINK_STRIPPER regex"));

static RATE_LIMIT_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:429|503|529)|rate[ _]limit|overloaded|too many requests")
        .expect("Failed to compile rate limit regex")
});

const HTML_PROGRESS_START: u8 = 25;
const HTML_PROGRESS_END: u8 = 75;

/// Deadline, retry and pacing rules applied to every generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt on rate-limit or overload answers.
    pub max_retries: u32,
    /// Delay before the first retry; each further retry doubles it.
    pub base_delay: Duration,
    /// Hard deadline of a single attempt.
    pub call_timeout: Duration,
    /// Pause between two consecutive calls of a sequence.
    pub pacing: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 4,
            base_delay: Duration::from_secs(8),
            call_timeout: Duration::from_secs(25),
            pacing: Duration::from_millis(800),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based): base, 2×base, 4×base, …
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(retry))
    }
}

/// Shared data for one orchestrated run.
pub struct GenerateContext<'a> {
    /// Model answering every call
    pub model: &'a dyn ChatProvider,
    /// Optional cap on requests per minute
    pub rate_limiter: Option<&'a StdTokenBucket>,
    pub policy: &'a RetryPolicy,
}

/// The structured input of a run; the variant selects the call sequence.
#[derive(Debug, Clone)]
pub enum FactSet {
    Site(SiteFacts),
    Design(DesignFacts),
}

/// One step of a call sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationCall {
    pub label: String,
    pub prompt: String,
    /// Status announced when the call starts.
    pub status: String,
    pub progress: u8,
    /// Status announced after the call succeeded.
    pub done: Option<(String, u8)>,
}

impl GenerationCall {
    fn new(label: &str, prompt: String, status: String, progress: u8) -> Self {
        Self {
            label: label.to_owned(),
            prompt,
            status,
            progress,
            done: None,
        }
    }

    fn then(mut self, message: &str, progress: u8) -> Self {
        self.done = Some((message.to_owned(), progress));
        self
    }
}

/// Token bucket allowing `rpm` generation calls per minute.
pub fn rate_limiter(rpm: u32) -> Option<StdTokenBucket> {
    let capacity = u64::from(rpm.max(1));
    let refill_interval = Duration::from_secs_f64(60.0 / capacity as f64);

    TokenBucketBuilder::builder()
        .capacity(capacity)
        .refill_amount(1_u64)
        .refill_every(refill_interval)
        .with_time(rate_guard::StdTimeSource::new())
        .with_precision::<rate_guard::Nanos>()
        .build()
        .ok()
}

/// Whether a model error signals throttling or overload.
pub fn is_rate_limited(error: &LLMError) -> bool {
    RATE_LIMIT_MARKER.is_match(&error.to_string())
}

async fn wait_for_rate_limiter(ctx: &GenerateContext<'_>) {
    if let Some(limiter) = ctx.rate_limiter {
        loop {
            match limiter.try_acquire(1) {
                Ok(()) => break,
                Err(_) => {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }
}

/// Sends one prompt and returns the response text.
///
/// Each attempt runs under the policy's call timeout. Rate-limit and overload
/// answers are retried with doubling delays; anything else fails at once.
///
/// # Errors
///
/// Returns an error if:
/// * The call times out
/// * The model keeps answering with rate-limit errors after every retry
/// * The model fails for any other reason
pub async fn ask(prompt: &str, ctx: &GenerateContext<'_>) -> Result<String, GenerationError> {
    let messages = vec![ChatMessage::user().content(prompt).build()];
    let mut retries = 0;

    loop {
        wait_for_rate_limiter(ctx).await;

        let attempt = tokio::time::timeout(ctx.policy.call_timeout, ctx.model.chat(&messages)).await;
        match attempt {
            Err(_) => {
                return Err(GenerationError::Timeout {
                    secs: ctx.policy.call_timeout.as_secs(),
                });
            }
            Ok(Ok(response)) => {
                let text = response.text().unwrap_or_else(|| response.to_string());
                return Ok(THINK_STRIPPER_REGEX
                    .replace_all(&text, "")
                    .trim()
                    .to_owned());
            }
            Ok(Err(err)) if is_rate_limited(&err) => {
                if retries >= ctx.policy.max_retries {
                    return Err(GenerationError::RateLimited {
                        attempts: retries + 1,
                        message: err.to_string(),
                    });
                }
                let delay = ctx.policy.backoff_delay(retries);
                retries += 1;
                warn!(
                    "Rate limited, retrying in {:.1}s (attempt {retries}/{})",
                    delay.as_secs_f64(),
                    ctx.policy.max_retries
                );
                tokio::time::sleep(delay).await;
            }
            Ok(Err(err)) => return Err(GenerationError::Api(err.to_string())),
        }
    }
}

/// Call sequence for a crawled site: HTML pages in batches, then shared assets.
pub fn plan_site_calls(project_name: &str, facts: &SiteFacts, year: i32) -> Vec<GenerationCall> {
    let shared = site_context(project_name, facts, year);
    let total = facts.pages.len();
    let batches: Vec<_> = facts.pages.chunks(HTML_BATCH_SIZE).collect();
    let span = u32::from(HTML_PROGRESS_END - HTML_PROGRESS_START);

    let mut calls: Vec<GenerationCall> = batches
        .iter()
        .enumerate()
        .map(|(index, batch)| {
            let ratio = index as f64 / batches.len() as f64;
            let progress = HTML_PROGRESS_START + (ratio * f64::from(span)).round() as u8;
            let first = index * HTML_BATCH_SIZE + 1;
            let last = (first + batch.len() - 1).min(total);
            GenerationCall::new(
                &format!("html-batch-{}", index + 1),
                html_batch_prompt(&shared, batch),
                format!("Generating HTML pages {first}–{last} of {total}…"),
                progress,
            )
        })
        .collect();

    if let Some(last) = calls.last_mut() {
        last.done = Some(("All HTML pages generated ✓".to_owned(), 77));
    }

    calls.push(GenerationCall::new(
        "site-assets",
        site_assets_prompt(project_name, facts),
        "Generating design system and JavaScript…".to_owned(),
        80,
    ));

    calls
}

/// Call sequence for a design document: tokens before the templates that use them.
pub fn plan_theme_calls(project_name: &str, facts: &DesignFacts) -> Vec<GenerationCall> {
    let summary = DesignSummary::new(project_name, facts);

    vec![
        GenerationCall::new(
            "design-system",
            summary.design_system_prompt(),
            "Generating design system from the design's colours & typography…".to_owned(),
            28,
        )
        .then("Design system complete ✓", 45),
        GenerationCall::new(
            "layout-templates",
            summary.layout_prompt(),
            "Generating functions.php, header.php, footer.php…".to_owned(),
            48,
        )
        .then("Layout templates done ✓", 55),
        GenerationCall::new(
            "page-templates",
            summary.templates_prompt(),
            "Generating page.php, single.php, archive.php, index.php…".to_owned(),
            57,
        )
        .then("Page templates done ✓", 63),
        GenerationCall::new(
            "utility-templates",
            summary.utility_prompt(),
            "Generating search.php, 404.php, card-post.php…".to_owned(),
            65,
        )
        .then("Utility templates done ✓", 70),
        GenerationCall::new(
            "theme-config",
            summary.config_prompt(),
            "Generating ACF field groups and JavaScript…".to_owned(),
            73,
        ),
    ]
}

/// Runs `calls` strictly in order and merges their artifacts.
///
/// Artifacts keep the order in which their names first appeared; a later
/// artifact with an already-seen name is dropped. Any failed call ends the
/// run and discards everything produced so far.
///
/// # Errors
///
/// Returns an error if any call fails, or `PipelineError::EmptyResult` if no
/// response contained a recognizable artifact.
pub async fn run_calls(
    calls: &[GenerationCall],
    ctx: &GenerateContext<'_>,
    progress: &mut ProgressSender,
) -> Result<Vec<GeneratedArtifact>, PipelineError> {
    let mut artifacts: Vec<GeneratedArtifact> = Vec::new();
    let mut names: HashSet<String> = HashSet::new();

    for (index, call) in calls.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(ctx.policy.pacing).await;
        }

        progress.status(call.status.as_str(), call.progress);
        info!("Call {}/{}: {}", index + 1, calls.len(), call.label);

        let response = ask(&call.prompt, ctx).await?;
        let parsed = parse_files(&response);
        debug!("{} returned {} artifacts", call.label, parsed.len());
        if parsed.is_empty() {
            warn!("{} returned no recognizable files", call.label);
        }

        for artifact in parsed {
            if names.insert(artifact.name.clone()) {
                artifacts.push(artifact);
            } else {
                warn!("Ignoring repeated artifact {}", artifact.name);
            }
        }

        if let Some((message, pct)) = &call.done {
            progress.status(message.as_str(), *pct);
        }
    }

    if artifacts.is_empty() {
        return Err(PipelineError::EmptyResult);
    }

    Ok(artifacts)
}

/// Runs the call sequence matching `facts`.
///
/// # Errors
///
/// See [`run_calls`].
pub async fn run(
    project_name: &str,
    facts: &FactSet,
    ctx: &GenerateContext<'_>,
    progress: &mut ProgressSender,
) -> Result<Vec<GeneratedArtifact>, PipelineError> {
    let calls = match facts {
        FactSet::Site(site) => {
            plan_site_calls(project_name, site, chrono::Utc::now().year())
        }
        FactSet::Design(design) => plan_theme_calls(project_name, design),
    };

    let artifacts = run_calls(&calls, ctx, progress).await?;
    progress.status("All files generated ✓", 95);
    info!("Generated {} files in {} calls", artifacts.len(), calls.len());

    Ok(artifacts)
}
