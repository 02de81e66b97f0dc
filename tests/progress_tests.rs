use shipwright::GeneratedArtifact;
use shipwright::progress::{LineDecoder, ProgressEvent, channel};
use spectral::prelude::*;

use crate::support::drain;

mod support;

#[tokio::test]
async fn exactly_one_terminal_event_on_success() {
    let (mut sender, receiver) = channel();

    sender.status("Crawling", 12);
    sender.status("Generating", 40);
    sender.complete(vec![GeneratedArtifact::new("index.html", "<p>hi</p>")]);

    let events = drain(receiver).await;
    assert_that(&events).has_length(3);
    assert_that(&events.iter().filter(|event| event.is_terminal()).count()).is_equal_to(1);
    assert_that(&events[2].is_terminal()).is_true();
}

#[tokio::test]
async fn dropping_the_sender_terminates_the_stream() {
    let (mut sender, receiver) = channel();

    sender.status("Crawling", 12);
    drop(sender);

    let events = drain(receiver).await;
    assert_that(&events).has_length(2);
    assert!(matches!(events.last(), Some(ProgressEvent::Error { .. })));
}

#[tokio::test]
async fn sender_dropped_on_an_early_return_still_terminates() {
    fn work(mut sender: shipwright::ProgressSender) -> Result<(), String> {
        sender.status("Started", 5);
        if sender.last_progress() < 10 {
            return Err("boom".to_owned());
        }
        sender.complete(Vec::new());
        Ok(())
    }
    let (sender, receiver) = channel();

    let result = work(sender);

    assert_that(&result.is_err()).is_true();
    let events = drain(receiver).await;
    assert_that(&events.iter().filter(|event| event.is_terminal()).count()).is_equal_to(1);
}

#[tokio::test]
async fn progress_is_clamped_to_be_monotonic() {
    let (mut sender, receiver) = channel();

    sender.status("a", 30);
    sender.status("b", 10);
    sender.status("c", 250);
    assert_that(&sender.last_progress()).is_equal_to(100);
    sender.fail("stopped");

    let progress: Vec<u8> = drain(receiver)
        .await
        .into_iter()
        .filter_map(|event| match event {
            ProgressEvent::Status { progress, .. } => Some(progress),
            _ => None,
        })
        .collect();
    assert_that(&progress).is_equal_to(vec![30, 30, 100]);
}

#[test]
fn events_use_the_line_protocol() {
    let complete = ProgressEvent::Complete {
        files: vec![GeneratedArtifact::new("a.css", "b{}")],
    };
    let error = ProgressEvent::Error {
        message: "Design file not found.".to_owned(),
    };

    assert_that(&complete.to_line()).is_equal_to(
        "data: {\"type\":\"complete\",\"files\":[{\"name\":\"a.css\",\"content\":\"b{}\"}]}\n\n".to_owned(),
    );
    assert_that(&error.to_line())
        .is_equal_to("data: {\"type\":\"error\",\"message\":\"Design file not found.\"}\n\n".to_owned());
}

#[test]
fn decoder_ignores_everything_after_the_terminal_event() {
    let mut decoder = LineDecoder::new();
    let status = ProgressEvent::Status {
        message: "Working".to_owned(),
        progress: 50,
    };
    let done = ProgressEvent::Complete { files: Vec::new() };

    assert_that(&decoder.feed("")).is_none();
    assert_that(&decoder.feed(": keep-alive")).is_none();
    assert_that(&decoder.feed("data: {not json")).is_none();
    assert_that(&decoder.feed(status.to_line().trim_end())).is_equal_to(Some(status.clone()));
    assert_that(&decoder.feed(&done.to_line())).is_equal_to(Some(done));
    assert_that(&decoder.feed(&status.to_line())).is_none();
    assert_that(&decoder.finish()).is_none();
}

#[test]
fn decoder_synthesizes_an_error_when_the_stream_drops() {
    let mut decoder = LineDecoder::new();

    decoder.feed("data: {\"type\":\"status\",\"message\":\"Crawling\",\"progress\":12}");

    assert!(matches!(decoder.finish(), Some(ProgressEvent::Error { .. })));
    assert_that(&decoder.finish()).is_none();
}
