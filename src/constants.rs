pub const MODEL_API_KEY_ENV_NAME: &str = "SHIPWRIGHT_MODEL_API_KEY";
pub const DESIGN_TOKEN_ENV_NAME: &str = "SHIPWRIGHT_DESIGN_TOKEN";

pub const DEFAULT_MODEL: &str = "anthropic://claude-haiku-4-5";

pub(crate) const THINK_STRIPPER: &str = r"<think>[\s\S]*</think>\s*";

pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";
pub(crate) const HTML_ACCEPT: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8";
pub(crate) const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

pub(crate) const DESIGN_API_BASE: &str = "https://api.figma.com/v1/files";
pub(crate) const DESIGN_TOKEN_HEADER: &str = "X-Figma-Token";

/// Number of links fetched concurrently in one crawl round.
pub const CRAWL_BATCH_SIZE: usize = 5;
/// Number of pages generated by one HTML generation call.
pub const HTML_BATCH_SIZE: usize = 6;

pub(crate) const MAX_HEADINGS: usize = 20;
pub(crate) const MAX_SECTIONS: usize = 12;
pub(crate) const MAX_NAV_LINKS: usize = 20;
pub(crate) const MAX_COLORS: usize = 30;
pub(crate) const MAX_FONTS: usize = 8;
pub(crate) const MAX_FOOTER_LINKS: usize = 30;
pub(crate) const SECTION_BODY_CHARS: usize = 300;
pub(crate) const BODY_PREVIEW_CHARS: usize = 2000;

pub(crate) const DESIGN_MAX_DEPTH: usize = 6;
pub(crate) const DESIGN_MAX_PAGES: usize = 20;
pub(crate) const DESIGN_MAX_FRAMES_PER_PAGE: usize = 20;
pub(crate) const DESIGN_MAX_SECTIONS_PER_PAGE: usize = 12;
pub(crate) const DESIGN_MAX_COMPONENTS: usize = 40;
pub(crate) const DESIGN_MAX_COLORS: usize = 40;
pub(crate) const DESIGN_MAX_TEXT_STYLES: usize = 20;
