//! The crawl module walks a site breadth-first from its root page, bounded by a
//! page budget and a fixed fan-out per round, and collects the site facts.

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use url::Url;

use crate::constants::{BROWSER_USER_AGENT, CRAWL_BATCH_SIZE, HTML_ACCEPT};
use crate::error::{FetchError, PipelineError};
use crate::extract::{NavLink, PageExtract, PageRecord, extract_global, extract_page};
use crate::links::{FilenameRegistry, dedup_key};

/// Site-wide facts plus every crawled page, root first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteFacts {
    pub root_url: String,
    pub origin: String,
    pub site_title: String,
    pub site_description: String,
    pub nav_links: Vec<NavLink>,
    pub colors: Vec<String>,
    pub fonts: Vec<String>,
    pub footer_links: Vec<String>,
    pub lang: String,
    pub pages: Vec<PageRecord>,
}

impl SiteFacts {
    /// Facts for a site that could not be crawled: five conventional pages
    /// named after the host, with no extracted content.
    pub fn from_url_hints(root: &Url) -> Self {
        let hostname = root
            .host_str()
            .unwrap_or_default()
            .trim_start_matches("www.")
            .to_owned();
        let site_name = hostname
            .split('.')
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ");
        let origin = root.origin().ascii_serialization();

        let hint = |path: &str, filename: &str, label: &str, title: String| PageRecord {
            url: format!("{origin}{path}"),
            path: path.to_owned(),
            filename: filename.to_owned(),
            nav_label: label.to_owned(),
            title,
            description: String::new(),
            headings: Vec::new(),
            sections: Vec::new(),
            body_preview: String::new(),
        };

        let mut pages = vec![hint("/", "index.html", "Home", site_name.clone())];
        for label in ["About", "Services", "Blog", "Contact"] {
            let slug = label.to_lowercase();
            pages.push(hint(
                &format!("/{slug}"),
                &format!("{slug}.html"),
                label,
                format!("{label} | {site_name}"),
            ));
        }

        SiteFacts {
            root_url: root.to_string(),
            origin,
            site_title: site_name,
            site_description: format!("Website rebuild for {hostname}"),
            nav_links: Vec::new(),
            colors: Vec::new(),
            fonts: Vec::new(),
            footer_links: Vec::new(),
            lang: "en".to_owned(),
            pages,
        }
    }
}

/// Source of HTML documents for the crawler.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches one HTML document.
    ///
    /// # Errors
    ///
    /// Returns an error for network failures, non-2xx answers, non-HTML
    /// content types, empty bodies and timeouts.
    async fn fetch_html(&self, url: &Url) -> Result<String, FetchError>;
}

/// `PageFetcher` over HTTP with browser-like headers.
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(HTML_ACCEPT));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(crate::constants::ACCEPT_LANGUAGE),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_html(&self, url: &Url) -> Result<String, FetchError> {
        let network = |err: reqwest::Error| {
            if err.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    secs: self.timeout.as_secs(),
                }
            } else {
                FetchError::Network {
                    url: url.to_string(),
                    reason: err.to_string(),
                }
            }
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        if !content_type.contains("html") {
            return Err(FetchError::NotHtml {
                url: url.to_string(),
                content_type,
            });
        }

        let body = response.text().await.map_err(network)?;
        if body.trim().is_empty() {
            return Err(FetchError::Empty {
                url: url.to_string(),
            });
        }

        Ok(body)
    }
}

/// Parses user input into a crawl root, defaulting to `https://` when no scheme is given.
///
/// # Errors
///
/// Returns `PipelineError::Input` if the input is empty or not a valid http(s) URL.
pub fn normalize_root_url(raw: &str) -> Result<Url, PipelineError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(PipelineError::Input("A target URL is required.".to_owned()));
    }

    let with_scheme = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_owned()
    } else {
        format!("https://{raw}")
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| PipelineError::Input(format!("Invalid target URL {raw}: {e}")))?;
    if url.host_str().is_none() {
        return Err(PipelineError::Input(format!(
            "Invalid target URL {raw}: missing host"
        )));
    }

    Ok(url)
}

/// Crawls up to `max_pages` same-origin pages starting at `root`.
///
/// The root page is always first, named `index.html` and labelled `Home`.
/// Sub-page failures only drop that page.
///
/// # Arguments
///
/// * `fetcher` - Source of HTML documents
/// * `root` - The crawl root
/// * `max_pages` - Page budget; values below 1 are treated as 1
/// * `on_progress` - Optional sink for human-readable progress messages
///
/// # Errors
///
/// Returns an error if the root document cannot be fetched or is not HTML.
pub async fn crawl(
    fetcher: Arc<dyn PageFetcher>,
    root: &Url,
    max_pages: usize,
    mut on_progress: Option<&mut (dyn FnMut(&str) + Send)>,
) -> Result<SiteFacts, FetchError> {
    let max_pages = max_pages.max(1);
    let root = dedup_key(root);
    let origin = root.origin();

    let mut report = |message: String| {
        debug!("{message}");
        if let Some(sink) = on_progress.as_mut() {
            sink(&message);
        }
    };

    report(format!("Fetching {root}…"));
    let root_html = fetcher.fetch_html(&root).await?;

    let global = extract_global(&root_html);
    let PageExtract {
        page: mut root_page,
        links: root_links,
    } = extract_page(&root_html, &root, &origin);

    let mut filenames = FilenameRegistry::new();
    root_page.filename = filenames.claim("index.html");
    root_page.nav_label = "Home".to_owned();

    let mut visited: HashSet<Url> = HashSet::from([root.clone()]);
    let mut queue: VecDeque<Url> = root_links.into();
    let mut pages = vec![root_page];

    while !queue.is_empty() && pages.len() < max_pages {
        let room = CRAWL_BATCH_SIZE.min(max_pages - pages.len());
        let mut batch = Vec::with_capacity(room);
        while batch.len() < room {
            let Some(url) = queue.pop_front() else {
                break;
            };
            if visited.insert(url.clone()) {
                batch.push(url);
            }
        }
        if batch.is_empty() {
            continue;
        }

        report(format!(
            "Crawling pages {}–{} of {}…",
            pages.len() + 1,
            pages.len() + batch.len(),
            (visited.len() + queue.len()).min(max_pages)
        ));

        let mut in_flight = JoinSet::new();
        for (index, url) in batch.iter().cloned().enumerate() {
            let fetcher = Arc::clone(&fetcher);
            in_flight.spawn(async move {
                let result = fetcher.fetch_html(&url).await;
                (index, url, result)
            });
        }

        let mut gathered: Vec<Option<(Url, String)>> = vec![None; batch.len()];
        while let Some(joined) = in_flight.join_next().await {
            match joined {
                Ok((index, url, Ok(html))) => {
                    if let Some(slot) = gathered.get_mut(index) {
                        *slot = Some((url, html));
                    }
                }
                Ok((_, url, Err(err))) => warn!("Dropping {url}: {err}"),
                Err(join_error) => warn!("Fetch task failed: {join_error}"),
            }
        }

        for (url, html) in gathered.into_iter().flatten() {
            let PageExtract { mut page, links } = extract_page(&html, &url, &origin);
            page.filename = filenames.claim(&page.filename);
            debug!("Extracted {} as {}", page.url, page.filename);
            pages.push(page);
            if pages.len() < max_pages {
                queue.extend(links);
            }
        }
    }

    let count = pages.len();
    report(format!(
        "Crawl complete: {count} page{} found",
        if count == 1 { "" } else { "s" }
    ));
    info!("Crawled {count} pages from {root}");

    Ok(SiteFacts {
        root_url: root.to_string(),
        origin: origin.ascii_serialization(),
        site_title: global.site_title,
        site_description: global.site_description,
        nav_links: global.nav_links,
        colors: global.colors,
        fonts: global.fonts,
        footer_links: global.footer_links,
        lang: global.lang,
        pages,
    })
}
