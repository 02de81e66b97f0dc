//! The pipeline module turns one inbound request into a progress stream ending
//! in exactly one `complete` or `error` event.

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::crawl::{PageFetcher, SiteFacts, crawl, normalize_root_url};
use crate::design::{DesignFacts, DesignSource, extract_design, extract_document_key};
use crate::error::{DesignFetchError, PipelineError};
use crate::generate::{self, FactSet, GenerateContext};
use crate::output::GeneratedArtifact;
use crate::progress::ProgressSender;

/// Kind of raw input a request carries.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// A live website to crawl
    #[default]
    Url,
    /// A design document to turn into a theme
    #[serde(alias = "figma")]
    Design,
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_lowercase().as_str() {
            "url" => Ok(Mode::Url),
            "design" | "figma" => Ok(Mode::Design),
            _ => Err(format!("Invalid mode: {input}")),
        }
    }
}

/// Inbound request: `{ mode, source, authToken?, projectName }`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub mode: Mode,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    pub project_name: String,
}

/// External collaborators the pipeline reads raw input from.
#[derive(Clone)]
pub struct Sources {
    pub pages: Arc<dyn PageFetcher>,
    pub designs: Arc<dyn DesignSource>,
}

/// Runs one request to completion.
///
/// Every outcome, including input errors found before any I/O, is reported
/// through `progress` as its single terminal event. The same outcome is
/// returned for the caller's own bookkeeping.
///
/// # Errors
///
/// Returns the error that was reported as the terminal `error` event.
pub async fn run(
    request: &GenerateRequest,
    config: &PipelineConfig,
    sources: &Sources,
    ctx: &GenerateContext<'_>,
    mut progress: ProgressSender,
) -> Result<(), PipelineError> {
    match execute(request, config, sources, ctx, &mut progress).await {
        Ok(files) => {
            for file in &files {
                info!("{} ({:?}, {})", file.name, file.kind(), file.display_size());
            }
            progress.complete(files);
            Ok(())
        }
        Err(err) => {
            error!("{err}");
            progress.fail(err.to_string());
            Err(err)
        }
    }
}

async fn execute(
    request: &GenerateRequest,
    config: &PipelineConfig,
    sources: &Sources,
    ctx: &GenerateContext<'_>,
    progress: &mut ProgressSender,
) -> Result<Vec<GeneratedArtifact>, PipelineError> {
    let project_name = request.project_name.trim();
    if project_name.is_empty() {
        return Err(PipelineError::Input("A project name is required.".to_owned()));
    }

    let facts = match request.mode {
        Mode::Url => FactSet::Site(site_facts(request, config, sources, progress).await?),
        Mode::Design => FactSet::Design(design_facts(request, sources, progress).await?),
    };

    generate::run(project_name, &facts, ctx, progress).await
}

async fn site_facts(
    request: &GenerateRequest,
    config: &PipelineConfig,
    sources: &Sources,
    progress: &mut ProgressSender,
) -> Result<SiteFacts, PipelineError> {
    let root = normalize_root_url(&request.source)?;
    progress.status(format!("Connecting to {}…", root.host_str().unwrap_or_default()), 5);

    let crawled = {
        let mut report = |message: &str| progress.status(message, 12);
        let sink: &mut (dyn FnMut(&str) + Send) = &mut report;
        crawl(Arc::clone(&sources.pages), &root, config.max_pages, Some(sink)).await
    };

    let facts = match crawled {
        Ok(facts) => facts,
        Err(err) if config.hint_fallback => {
            warn!("Crawl of {root} failed ({err}); using hostname-derived pages");
            progress.status("Site unreachable, using a standard page structure…", 12);
            SiteFacts::from_url_hints(&root)
        }
        Err(source) => {
            return Err(PipelineError::RootFetch {
                url: root.to_string(),
                source,
            });
        }
    };

    progress.status(
        format!(
            "Crawled {} pages · {} colours · {} fonts ✓",
            facts.pages.len(),
            facts.colors.len(),
            facts.fonts.len()
        ),
        22,
    );

    Ok(facts)
}

async fn design_facts(
    request: &GenerateRequest,
    sources: &Sources,
    progress: &mut ProgressSender,
) -> Result<DesignFacts, PipelineError> {
    let token = request
        .auth_token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            PipelineError::Input("A design access token is required for design mode.".to_owned())
        })?;
    let key = extract_document_key(&request.source)
        .ok_or_else(|| PipelineError::Input(DesignFetchError::MalformedKey.to_string()))?;

    progress.status("Connecting to the design API…", 5);
    progress.status(format!("Fetching design file {key}…"), 8);
    let document = sources.designs.fetch_document(&key, token).await?;

    progress.status("Extracting colours, typography and components…", 15);
    let facts = extract_design(&document);
    progress.status(
        format!(
            "Found {} colours · {} text styles · {} pages ✓",
            facts.colors.len(),
            facts.text_styles.len(),
            facts.pages.len()
        ),
        22,
    );

    Ok(facts)
}
