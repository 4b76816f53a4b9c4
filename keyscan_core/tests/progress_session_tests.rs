//! Integration tests for progress sessions
//!
//! Periodic rendering is exercised against tokio's paused clock, so the
//! 30 second log refresh happens instantly and deterministically.

use keyscan_core::{
    FixedProbe, ProgressMode, ProgressOptions, ProgressSession, ProgressWriter, RenderMode,
};
use keyscan_test_utils::{ProgressCall, RecordingProgress, SharedBuffer};
use proptest::prelude::*;
use serde_json::Value;
use std::thread;
use std::time::Duration;

fn log_session(buffer: &SharedBuffer) -> ProgressSession {
    ProgressSession::with_probe(
        buffer.clone(),
        ProgressOptions::default(),
        &FixedProbe::non_interactive(),
    )
}

#[tokio::test]
async fn test_end_to_end_on_non_terminal_sink() {
    let buffer = SharedBuffer::new();
    let mut session = log_session(&buffer);

    session.start(3);
    for _ in 0..3 {
        session.increment();
    }
    session.stop().await;

    let lines = buffer.lines();
    assert_eq!(lines.len(), 1, "expected only the final line, got {lines:?}");
    assert!(lines[0].starts_with("Scanning keys 100.0%"));
    assert!(lines[0].contains("[3/3 in 0s]"));
    assert!(lines[0].ends_with("done!"));
}

#[tokio::test]
async fn test_unknown_total_shows_plain_count() {
    let buffer = SharedBuffer::new();
    let mut session = log_session(&buffer);

    session.start(0);
    assert_eq!(session.total(), None);
    for _ in 0..5 {
        session.increment();
    }
    session.stop().await;

    let output = buffer.contents();
    assert!(output.contains("[5 in 0s] done!"));
    assert!(!output.contains('%'));
}

#[tokio::test]
async fn test_start_declares_total() {
    let mut session = log_session(&SharedBuffer::new());
    session.start(100);
    assert_eq!(session.total(), Some(100));
    session.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_periodic_lines_are_appended() {
    let buffer = SharedBuffer::new();
    let mut session = log_session(&buffer);

    session.start(10);
    for _ in 0..4 {
        session.increment();
    }

    tokio::time::sleep(Duration::from_secs(31)).await;
    let lines = buffer.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("40.0%"));
    assert!(lines[0].contains("[4/10 in 30s; ETA 45s]"));

    session.increment();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(buffer.lines().len(), 2);
    assert!(buffer.lines()[1].contains("[5/10 in 1m; ETA 1m]"));

    session.stop().await;
    let lines = buffer.lines();
    assert_eq!(lines.len(), 3);
    assert!(lines[2].ends_with("done!"));
}

#[tokio::test(start_paused = true)]
async fn test_no_output_after_stop() {
    let buffer = SharedBuffer::new();
    let mut session = log_session(&buffer);

    session.start(10);
    session.increment();
    session.stop().await;
    let written = buffer.contents();
    assert_eq!(buffer.lines().len(), 1);

    // Well past several refresh intervals
    tokio::time::sleep(Duration::from_secs(120)).await;
    session.increment();
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(buffer.contents(), written);
    assert_eq!(session.completed(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_interactive_bar_is_silent_after_stop() {
    let buffer = SharedBuffer::new();
    let mut session = ProgressSession::with_probe(
        buffer.clone(),
        ProgressOptions::default(),
        &FixedProbe::interactive().with_width(200),
    );

    session.start(10);
    for _ in 0..3 {
        session.increment();
    }
    tokio::time::sleep(Duration::from_millis(350)).await;
    session.stop().await;
    let written = buffer.contents();
    assert!(written.contains("3/10"));

    // Many interactive refresh intervals later
    tokio::time::sleep(Duration::from_secs(5)).await;
    session.increment();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(buffer.contents(), written);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_running_session_renders_final_line() {
    let buffer = SharedBuffer::new();
    {
        let mut session = log_session(&buffer);
        session.start(4);
        session.increment();
    }

    // Let the render task observe the dropped stop signal
    tokio::time::sleep(Duration::from_millis(10)).await;

    let lines = buffer.lines();
    assert_eq!(lines.len(), 1, "unexpected output: {lines:?}");
    assert!(lines[0].contains("[1/4 in 0s]"));
    assert!(lines[0].ends_with("done!"));
}

#[tokio::test(start_paused = true)]
async fn test_huge_total_still_renders_final_line() {
    let buffer = SharedBuffer::new();
    let mut session = log_session(&buffer);

    session.start(u64::MAX);
    session.increment();
    tokio::time::sleep(Duration::from_secs(31)).await;
    session.stop().await;

    let lines = buffer.lines();
    assert_eq!(lines.len(), 2, "unexpected output: {lines:?}");
    // The remaining time does not fit a Duration, so no ETA is shown
    assert!(!lines[0].contains("ETA"));
    assert!(lines[0].contains(&format!("[1/{} in 30s]", u64::MAX)));
    assert!(lines[1].ends_with("done!"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_increments_are_not_lost() {
    const THREADS: u64 = 8;
    const PER_THREAD: u64 = 1000;

    let buffer = SharedBuffer::new();
    let mut session = log_session(&buffer);
    session.start(THREADS * PER_THREAD);

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let handle = session.handle();
            thread::spawn(move || {
                for _ in 0..PER_THREAD {
                    handle.increment();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    session.stop().await;
    assert_eq!(session.completed(), THREADS * PER_THREAD);
    let last = buffer.lines().pop().unwrap();
    assert!(last.contains("[8000/8000 in"));
}

#[tokio::test]
async fn test_interactive_session_redraws_bar() {
    let buffer = SharedBuffer::new();
    let mut session = ProgressSession::with_probe(
        buffer.clone(),
        ProgressOptions::default(),
        &FixedProbe::interactive().with_width(200),
    );
    assert_eq!(session.settings().mode, RenderMode::Interactive);
    assert_eq!(session.settings().refresh_interval, Duration::from_millis(100));

    session.start(100);
    for _ in 0..100 {
        session.increment();
    }
    session.stop().await;

    let output = buffer.contents();
    assert!(output.contains("Scanning keys"));
    assert!(output.contains("100/100"));
}

#[tokio::test(start_paused = true)]
async fn test_json_mode_emits_events() {
    let buffer = SharedBuffer::new();
    let options = ProgressOptions::default().with_mode(ProgressMode::Json);
    let mut session = ProgressSession::with_probe(buffer.clone(), options, &FixedProbe::interactive());

    session.start(0);
    session.increment();
    session.increment();
    tokio::time::sleep(Duration::from_secs(31)).await;
    session.stop().await;

    let events: Vec<Value> = buffer
        .lines()
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["event"], "progress");
    assert_eq!(events[0]["elapsed_ms"], 30_000);
    assert_eq!(events[1]["event"], "done");
    assert_eq!(events[1]["completed"], 2);
}

/// Drives any writer through the caller contract
async fn drive<P: ProgressWriter + ?Sized>(progress: &mut P, units: u64) {
    progress.start(units);
    for _ in 0..units {
        progress.increment();
    }
    progress.stop().await;
}

#[tokio::test]
async fn test_writers_are_interchangeable() {
    let recorder = RecordingProgress::new();
    let mut boxed: Box<dyn ProgressWriter> = Box::new(recorder.clone());
    drive(boxed.as_mut(), 2).await;
    assert_eq!(
        recorder.calls(),
        vec![
            ProgressCall::Start(2),
            ProgressCall::Increment,
            ProgressCall::Increment,
            ProgressCall::Stop,
        ]
    );

    let buffer = SharedBuffer::new();
    let mut session = log_session(&buffer);
    drive(&mut session, 2).await;
    assert!(buffer.contents().contains("[2/2 in"));
}

proptest! {
    #[test]
    fn prop_completed_equals_increments(n in 0u64..500) {
        let buffer = SharedBuffer::new();
        let mut session = log_session(&buffer);
        session.start(n);
        for _ in 0..n {
            session.increment();
        }
        futures::executor::block_on(session.stop());
        prop_assert_eq!(session.completed(), n);
        prop_assert_eq!(buffer.lines().len(), 1);
    }
}
