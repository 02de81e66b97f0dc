//! The shipwright library turns a live website or a design document into a
//! set of ready-to-ship source files by extracting bounded facts from the
//! input and driving a text-generation model through a fixed call sequence.

pub mod config;
pub mod constants;
pub mod crawl;
pub mod design;
pub mod error;
pub mod extract;
pub mod generate;
pub mod links;
pub mod materialize;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

pub use config::PipelineConfig;
pub use crawl::{HttpFetcher, PageFetcher, SiteFacts, crawl};
pub use design::{DesignFacts, DesignSource, HttpDesignSource, extract_design};
pub use error::{DesignFetchError, FetchError, GenerationError, PipelineError};
pub use generate::{FactSet, GenerateContext, RetryPolicy};
pub use output::{GeneratedArtifact, parse_files};
pub use pipeline::{GenerateRequest, Mode, Sources};
pub use progress::{ProgressEvent, ProgressReceiver, ProgressSender};
