#![allow(clippy::unwrap_used, clippy::expect_used)]

use pagecheck_harness::readiness::poll_until;
use std::sync::Arc;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn element_appearing_just_before_the_bound_is_found() {
    let start = Instant::now();
    let appear_at = start + Duration::from_millis(4900);

    let result = poll_until(Duration::from_secs(5), Duration::from_millis(250), || async move {
        (Instant::now() >= appear_at).then_some("handle")
    })
    .await;

    assert_eq!(result, Ok("handle"));
    // The winning poll is the one landing on the deadline itself.
    assert!(start.elapsed() <= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn element_appearing_just_after_the_bound_times_out() {
    let start = Instant::now();
    let appear_at = start + Duration::from_millis(5100);

    let result: Result<&str, Duration> =
        poll_until(Duration::from_secs(5), Duration::from_millis(250), || async move {
            (Instant::now() >= appear_at).then_some("handle")
        })
        .await;

    let waited = result.unwrap_err();
    assert!(waited >= Duration::from_secs(5));
    // The gate gives up at the bound; it never waits long enough to see the
    // late element.
    assert!(start.elapsed() < Duration::from_millis(5100));
}

#[tokio::test(start_paused = true)]
async fn immediate_success_returns_without_sleeping() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let start = Instant::now();

    let result = poll_until(Duration::from_secs(5), Duration::from_millis(250), move || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(42)
        }
    })
    .await;

    assert_eq!(result, Ok(42));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn timeout_shorter_than_the_interval_is_still_honored() {
    let start = Instant::now();

    let result: Result<(), Duration> =
        poll_until(Duration::from_millis(100), Duration::from_millis(250), || async { None }).await;

    assert_eq!(result.unwrap_err(), Duration::from_millis(100));
    assert_eq!(start.elapsed(), Duration::from_millis(100));
}
