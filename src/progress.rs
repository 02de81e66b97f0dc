//! The progress module carries status, completion and error events from the
//! pipeline to its caller.
//!
//! A run produces any number of `status` events followed by exactly one
//! terminal event (`complete` or `error`). The sender is consumed by the
//! terminal event, and dropping it without one emits an `error`, so every exit
//! path terminates the stream.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::output::GeneratedArtifact;

const LINE_PREFIX: &str = "data: ";

/// One event on the progress stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    Status { message: String, progress: u8 },
    Complete { files: Vec<GeneratedArtifact> },
    Error { message: String },
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProgressEvent::Status { .. })
    }

    /// Serializes the event as one `data: <json>` line followed by a blank line.
    pub fn to_line(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_else(|err| {
            format!(
                r#"{{"type":"error","message":"Could not encode event: {}"}}"#,
                err.to_string().replace('"', "'")
            )
        });
        format!("{LINE_PREFIX}{json}\n\n")
    }
}

/// Creates a connected sender/receiver pair.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ProgressSender {
            tx,
            last_progress: 0,
            terminated: false,
        },
        ProgressReceiver { rx, done: false },
    )
}

/// Producer half. Progress values never decrease.
#[derive(Debug)]
pub struct ProgressSender {
    tx: mpsc::UnboundedSender<ProgressEvent>,
    last_progress: u8,
    terminated: bool,
}

impl ProgressSender {
    /// Emits an advisory status event. Values below the previous one are raised
    /// to it and values above 100 are capped.
    pub fn status(&mut self, message: impl Into<String>, progress: u8) {
        self.last_progress = progress.clamp(self.last_progress, 100);
        let message = message.into();
        debug!("[{:>3}%] {message}", self.last_progress);
        self.send(ProgressEvent::Status {
            message,
            progress: self.last_progress,
        });
    }

    pub fn last_progress(&self) -> u8 {
        self.last_progress
    }

    /// Ends the stream successfully.
    pub fn complete(mut self, files: Vec<GeneratedArtifact>) {
        self.terminated = true;
        self.send(ProgressEvent::Complete { files });
    }

    /// Ends the stream with an error.
    pub fn fail(mut self, message: impl Into<String>) {
        self.terminated = true;
        self.send(ProgressEvent::Error {
            message: message.into(),
        });
    }

    fn send(&self, event: ProgressEvent) {
        // a gone receiver only loses advisory output
        if self.tx.send(event).is_err() {
            debug!("Progress receiver dropped; event discarded");
        }
    }
}

impl Drop for ProgressSender {
    fn drop(&mut self) {
        if !self.terminated {
            warn!("Progress stream dropped without a terminal event");
            self.terminated = true;
            self.send(ProgressEvent::Error {
                message: "Generation stopped before it finished.".to_owned(),
            });
        }
    }
}

/// Consumer half. Yields nothing after the first terminal event and
/// synthesizes an `error` if the producer vanishes before sending one.
#[derive(Debug)]
pub struct ProgressReceiver {
    rx: mpsc::UnboundedReceiver<ProgressEvent>,
    done: bool,
}

impl ProgressReceiver {
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        if self.done {
            return None;
        }

        match self.rx.recv().await {
            Some(event) => {
                if event.is_terminal() {
                    self.done = true;
                    self.rx.close();
                }
                Some(event)
            }
            None => {
                self.done = true;
                Some(ProgressEvent::Error {
                    message: "The progress stream closed before generation finished.".to_owned(),
                })
            }
        }
    }
}

/// Decodes the line protocol on the consuming side of a transport.
#[derive(Debug, Default)]
pub struct LineDecoder {
    terminated: bool,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes one line. Blank lines, foreign lines, undecodable payloads and
    /// anything after a terminal event yield `None`.
    pub fn feed(&mut self, line: &str) -> Option<ProgressEvent> {
        if self.terminated {
            return None;
        }
        let payload = line.trim_end_matches(['\r', '\n']).strip_prefix(LINE_PREFIX)?;

        match serde_json::from_str::<ProgressEvent>(payload) {
            Ok(event) => {
                self.terminated = event.is_terminal();
                Some(event)
            }
            Err(err) => {
                warn!("Ignoring undecodable progress line: {err}");
                None
            }
        }
    }

    /// Call when the transport ends. Returns a synthesized `error` if no
    /// terminal event was seen.
    pub fn finish(&mut self) -> Option<ProgressEvent> {
        if self.terminated {
            return None;
        }
        self.terminated = true;
        Some(ProgressEvent::Error {
            message: "The connection closed before generation finished.".to_owned(),
        })
    }
}
