//! Error taxonomy shared by the crawler, the design fetcher and the generation pipeline.

use thiserror::Error;

/// Failure to fetch one HTML document.
///
/// Fatal for the crawl root, silently absorbed for every other page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("{url} is not an HTML document (content-type: {content_type})")]
    NotHtml { url: String, content_type: String },
    #[error("{url} returned an empty document")]
    Empty { url: String },
    #[error("{url} did not answer within {secs}s")]
    Timeout { url: String, secs: u64 },
}

/// Failure to fetch a design document. Every variant maps to a distinct remedy.
#[derive(Debug, Error)]
pub enum DesignFetchError {
    #[error(
        "Invalid design URL. Use a link like: https://www.figma.com/design/FILEID/Project-Name"
    )]
    MalformedKey,
    #[error(
        "Design token invalid. Generate a new one in Account Settings → Personal access tokens."
    )]
    InvalidToken,
    #[error("No access to this design file. Make sure you have at least \"can view\" permission.")]
    NoAccess,
    #[error("Design file not found. Check the URL is correct and the file exists.")]
    NotFound,
    #[error(
        "The design API rejected the request. The file key \"{key}\" may be invalid; copy the URL directly from your browser while the file is open."
    )]
    Rejected { key: String },
    #[error(
        "The design API returned 405 for key \"{key}\". Open the file and copy the full URL from the address bar."
    )]
    MethodRejected { key: String },
    #[error("The design API timed out after {secs}s. Check your connection and try again.")]
    Timeout { secs: u64 },
    #[error("Could not reach the design API: {0}")]
    Unreachable(String),
    #[error("Design API error {status}: {reason}. Try again or check your token.")]
    Status { status: u16, reason: String },
    #[error("The design API returned an unreadable document: {0}")]
    Decode(String),
}

/// Failure of one generation call, after retries where they apply.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(
        "The model API is rate limited or overloaded ({attempts} attempts): {message}. Wait a minute or raise your quota."
    )]
    RateLimited { attempts: u32, message: String },
    #[error("The model API failed: {0}")]
    Api(String),
    #[error("The model call timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// Any failure that ends a pipeline run with a terminal `error` event.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Input(String),
    #[error("Could not fetch {url}: {source}")]
    RootFetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error(transparent)]
    Design(#[from] DesignFetchError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("The model did not return any parseable files. Try again.")]
    EmptyResult,
}
