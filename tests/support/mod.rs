#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use llm::{
    chat::{ChatMessage, ChatProvider, ChatResponse, Tool},
    error::LLMError,
};
use serde_json::Value;
use shipwright::{
    DesignFetchError, DesignSource, FetchError, PageFetcher, ProgressEvent, ProgressReceiver,
    RetryPolicy,
};
use tokio::time::Instant;
use url::Url;

/// One scripted answer of the stub model.
pub(crate) enum Reply {
    Text(String),
    Fail(LLMError),
    Hang,
}

impl Reply {
    pub fn text(content: &str) -> Self {
        Reply::Text(content.to_owned())
    }

    pub fn rate_limited() -> Self {
        Reply::Fail(LLMError::HttpError(
            "429 Too Many Requests: rate limit exceeded".to_owned(),
        ))
    }

    pub fn overloaded() -> Self {
        Reply::Fail(LLMError::ProviderError("529 overloaded_error".to_owned()))
    }
}

/// Model stub answering from a script and recording every prompt.
pub(crate) struct StubLlmProvider {
    script: Mutex<VecDeque<Reply>>,
    prompts: Mutex<Vec<String>>,
    calls: Mutex<Vec<Instant>>,
}

impl StubLlmProvider {
    pub fn new(script: Vec<Reply>) -> Self {
        StubLlmProvider {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn answering(responses: &[&str]) -> Self {
        Self::new(responses.iter().map(|text| Reply::text(text)).collect())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    /// Pauses between consecutive calls.
    pub fn gaps(&self) -> Vec<std::time::Duration> {
        let calls = self.calls.lock().expect("calls lock");
        calls.windows(2).map(|pair| pair[1] - pair[0]).collect()
    }
}

#[derive(Debug)]
struct StringResponse(String);

impl ChatResponse for StringResponse {
    fn text(&self) -> Option<String> {
        Some(self.0.clone())
    }

    fn tool_calls(&self) -> Option<Vec<llm::ToolCall>> {
        panic!()
    }

    fn thinking(&self) -> Option<String> {
        None
    }

    fn usage(&self) -> Option<llm::chat::Usage> {
        None
    }
}

impl std::fmt::Display for StringResponse {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl ChatProvider for StubLlmProvider {
    fn chat<'life0, 'life1, 'async_trait>(
        &'life0 self,
        messages: &'life1 [ChatMessage],
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Box<dyn ChatResponse>, LLMError>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            self.calls.lock().expect("calls lock").push(Instant::now());
            self.prompts
                .lock()
                .expect("prompts lock")
                .extend(messages.iter().map(|message| message.content.clone()));

            let reply = self
                .script
                .lock()
                .expect("script lock")
                .pop_front()
                .unwrap_or_else(|| Reply::Fail(LLMError::ProviderError("script exhausted".to_owned())));

            match reply {
                Reply::Text(text) => Ok(Box::new(StringResponse(text)) as Box<dyn ChatResponse>),
                Reply::Fail(err) => Err(err),
                Reply::Hang => std::future::pending().await,
            }
        })
    }

    fn chat_with_tools<'life0, 'life1, 'life2, 'async_trait>(
        &'life0 self,
        _messages: &'life1 [ChatMessage],
        _tools: Option<&'life2 [Tool]>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Box<dyn ChatResponse>, LLMError>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        'life2: 'async_trait,
        Self: 'async_trait,
    {
        panic!()
    }
}

/// In-memory site keyed by full URL. Unknown URLs answer 404.
pub(crate) struct MapFetcher {
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl MapFetcher {
    pub fn new(pages: &[(&str, &str)]) -> Self {
        MapFetcher {
            pages: pages
                .iter()
                .map(|(url, html)| ((*url).to_owned(), (*html).to_owned()))
                .collect(),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().expect("requested lock").clone()
    }
}

#[async_trait]
impl PageFetcher for MapFetcher {
    async fn fetch_html(&self, url: &Url) -> Result<String, FetchError> {
        self.requested
            .lock()
            .expect("requested lock")
            .push(url.to_string());
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Design source answering with one fixed document or one fixed failure.
pub(crate) struct StaticDesignSource {
    outcome: Result<Value, fn() -> DesignFetchError>,
    keys: Mutex<Vec<(String, String)>>,
}

impl StaticDesignSource {
    pub fn document(document: Value) -> Self {
        StaticDesignSource {
            outcome: Ok(document),
            keys: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: fn() -> DesignFetchError) -> Self {
        StaticDesignSource {
            outcome: Err(error),
            keys: Mutex::new(Vec::new()),
        }
    }

    /// `(key, token)` pairs requested so far.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.keys.lock().expect("keys lock").clone()
    }
}

#[async_trait]
impl DesignSource for StaticDesignSource {
    async fn fetch_document(&self, key: &str, token: &str) -> Result<Value, DesignFetchError> {
        self.keys
            .lock()
            .expect("keys lock")
            .push((key.to_owned(), token.to_owned()));
        match &self.outcome {
            Ok(document) => Ok(document.clone()),
            Err(error) => Err(error()),
        }
    }
}

/// Policy with the default backoff shape and a short pacing delay.
pub fn test_policy() -> RetryPolicy {
    RetryPolicy {
        pacing: std::time::Duration::from_millis(10),
        ..RetryPolicy::default()
    }
}

/// Drains a receiver until it yields nothing more.
pub async fn drain(mut receiver: ProgressReceiver) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Some(event) = receiver.recv().await {
        events.push(event);
    }
    events
}

pub fn tagged(files: &[(&str, &str)]) -> String {
    files
        .iter()
        .map(|(name, content)| format!("<file name=\"{name}\">\n{content}\n</file>"))
        .collect::<Vec<_>>()
        .join("\n\n")
}
