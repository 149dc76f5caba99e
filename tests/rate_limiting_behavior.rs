//! Behavior-driven tests for the rate-limited client.
//!
//! These tests verify admission control, the single retry after a throttle
//! response, session recycling and teardown.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use proptest::prelude::*;
use serde_json::json;
use stockfeed_core::{FetchError, FetchPolicy, HttpError, HttpResponse, RateLimitedClient};
use stockfeed_tests::{test_policy, Harness, API_BASE};
use tokio::time::Instant;

fn url(path: &str) -> String {
    format!("{API_BASE}{path}")
}

// =============================================================================
// Throttle handling
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_first_response_is_throttled_the_retry_returns_the_body() {
    // Given: Upstream throttles once with a three second Retry-After
    let harness = Harness::new();
    harness.transport.respond(
        "/quote",
        HttpResponse::new(429, "").with_header("Retry-After", "3"),
    );
    harness
        .transport
        .respond_json("/quote", &json!({"data": {"p": 1.0}}));

    // When: The client fetches once
    let started = Instant::now();
    let body = harness
        .client
        .fetch_json(&url("/quote"))
        .await
        .expect("retry should succeed");

    // Then: The second response is returned after the mandated back-off
    assert_eq!(body, json!({"data": {"p": 1.0}}));
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert_eq!(harness.transport.request_count(), 2);

    // And: The session was recreated for the retry
    assert_eq!(harness.connector.connects(), 2);
}

#[tokio::test(start_paused = true)]
async fn when_throttled_twice_the_call_fails_with_upstream_error() {
    // Given: Upstream throttles every request
    let harness = Harness::new();
    harness
        .transport
        .respond("/quote", HttpResponse::new(429, "slow down"));

    // When: The client fetches once
    let result = harness.client.fetch_json(&url("/quote")).await;

    // Then: The second throttle is a hard failure after exactly one retry
    match result.expect_err("second 429 is fatal") {
        FetchError::Upstream { status, reason } => {
            assert_eq!(status, 429);
            assert_eq!(reason, "Too Many Requests");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
    assert_eq!(harness.transport.request_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn when_retry_after_is_missing_the_default_delay_applies() {
    // Given: Upstream throttles once without a Retry-After header
    let harness = Harness::new();
    harness.transport.respond("/quote", HttpResponse::new(429, ""));
    harness.transport.respond_json("/quote", &json!({"ok": true}));

    // When: The client fetches once
    let started = Instant::now();
    harness
        .client
        .fetch_json(&url("/quote"))
        .await
        .expect("retry should succeed");

    // Then: The five second default back-off was observed
    assert!(started.elapsed() >= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn when_retry_after_is_huge_the_back_off_is_capped() {
    // Given: Upstream asks for an unbounded wait and the policy caps it at ten seconds
    let harness =
        Harness::with_policy(test_policy().with_max_retry_after(Duration::from_secs(10)));
    harness.transport.respond(
        "/quote",
        HttpResponse::new(429, "").with_header("Retry-After", "18446744073709551615"),
    );
    harness.transport.respond_json("/quote", &json!({"ok": true}));

    // When: The client fetches once
    let started = Instant::now();
    harness
        .client
        .fetch_json(&url("/quote"))
        .await
        .expect("retry should succeed");

    // Then: The call waited for the cap and no longer
    let waited = started.elapsed();
    assert!(waited >= Duration::from_secs(10));
    assert!(waited < Duration::from_secs(11));
    assert_eq!(harness.transport.request_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn concurrent_throttled_calls_share_one_fresh_session() {
    // Given: Two slots and an upstream that throttles both first requests
    let harness = Harness::new();
    harness.transport.respond(
        "/quote",
        HttpResponse::new(429, "").with_header("Retry-After", "1"),
    );
    harness.transport.respond(
        "/quote",
        HttpResponse::new(429, "").with_header("Retry-After", "1"),
    );
    harness.transport.respond_json("/quote", &json!({"ok": true}));
    harness.transport.set_delay(Duration::from_millis(100));

    // When: Two calls run together and are both throttled
    let quote = url("/quote");
    let (first, second) = tokio::join!(
        harness.client.fetch_json(&quote),
        harness.client.fetch_json(&quote)
    );

    // Then: Both retries succeed and the throttled session was replaced once
    first.expect("first call");
    second.expect("second call");
    assert_eq!(harness.transport.request_count(), 4);
    assert_eq!(harness.connector.connects(), 2);
}

#[tokio::test]
async fn when_status_is_a_server_error_there_is_no_retry() {
    // Given: Upstream fails with 500
    let harness = Harness::new();
    harness
        .transport
        .respond("/quote", HttpResponse::new(500, "internal"));

    // When: The client fetches once
    let result = harness.client.fetch_json(&url("/quote")).await;

    // Then: The call fails immediately after one request
    assert_eq!(result.expect_err("500 is fatal").status(), Some(500));
    assert_eq!(harness.transport.request_count(), 1);
    assert_eq!(harness.connector.connects(), 1);
}

#[tokio::test]
async fn when_transport_fails_the_error_is_propagated() {
    // Given: The connection is refused
    let harness = Harness::new();
    harness
        .transport
        .fail("/quote", HttpError::new("connection refused"));

    // When: The client fetches once
    let result = harness.client.fetch_json(&url("/quote")).await;

    // Then: A transport error is returned
    let error = result.expect_err("transport failure");
    assert_eq!(error.code(), "fetch.transport");
    assert!(error.to_string().contains("connection refused"));
}

#[tokio::test(start_paused = true)]
async fn when_upstream_hangs_the_request_times_out() {
    // Given: Upstream takes longer than the request timeout
    let harness = Harness::with_policy(FetchPolicy {
        request_timeout: Duration::from_secs(2),
        ..test_policy()
    });
    harness.transport.respond_json("/quote", &json!({}));
    harness.transport.set_delay(Duration::from_secs(30));

    // When: The client fetches once
    let result = harness.client.fetch_json(&url("/quote")).await;

    // Then: A timed-out transport error is returned and the slot is free again
    match result.expect_err("request should time out") {
        FetchError::Transport(error) => assert!(error.timed_out()),
        other => panic!("expected transport timeout, got {other:?}"),
    }
    assert_eq!(harness.client.available_slots(), 2);
}

// =============================================================================
// Admission control
// =============================================================================

#[tokio::test(start_paused = true)]
async fn a_burst_of_callers_never_exceeds_the_admission_bound() {
    // Given: Slow responses and twelve simultaneous callers
    let harness = Harness::new();
    harness.transport.respond_json("/quote", &json!({"ok": true}));
    harness.transport.set_delay(Duration::from_millis(100));

    // When: All callers fetch at once
    let quote = url("/quote");
    let results = join_all((0..12).map(|_| harness.client.fetch_json(&quote))).await;

    // Then: Everyone succeeds and at most two requests were ever in flight
    assert!(results.iter().all(Result::is_ok));
    assert_eq!(harness.transport.request_count(), 12);
    assert_eq!(harness.transport.peak_in_flight(), 2);
}

#[tokio::test(start_paused = true)]
async fn a_throttled_call_keeps_its_slot_during_back_off() {
    // Given: A single admission slot and a throttled first route
    let harness = Harness::with_policy(test_policy().with_max_concurrency(1));
    harness.transport.respond(
        "/first",
        HttpResponse::new(429, "").with_header("Retry-After", "2"),
    );
    harness.transport.respond_json("/first", &json!(1));
    harness.transport.respond_json("/second", &json!(2));

    // When: Two calls start together
    let first_url = url("/first");
    let second_url = url("/second");
    let (first, second) = tokio::join!(
        harness.client.fetch_json(&first_url),
        harness.client.fetch_json(&second_url)
    );

    // Then: The second call only starts after the first one finished its retry
    assert_eq!(first.expect("first call"), json!(1));
    assert_eq!(second.expect("second call"), json!(2));
    assert_eq!(
        harness.transport.recorded_urls(),
        vec![url("/first"), url("/first"), url("/second")]
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn admission_bound_holds_for_any_burst(bound in 1_usize..4, callers in 1_usize..24) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .expect("runtime should build");

        let harness = Harness::with_policy(test_policy().with_max_concurrency(bound));
        harness.transport.respond_json("/quote", &json!({"ok": true}));
        harness.transport.set_delay(Duration::from_millis(50));

        let quote = url("/quote");
        let results = runtime.block_on(join_all(
            (0..callers).map(|_| harness.client.fetch_json(&quote)),
        ));

        prop_assert!(results.iter().all(Result::is_ok));
        prop_assert!(harness.transport.peak_in_flight() <= bound);
        prop_assert_eq!(harness.transport.peak_in_flight(), bound.min(callers));
        prop_assert_eq!(harness.transport.request_count(), callers);
    }
}

// =============================================================================
// Session lifecycle
// =============================================================================

#[tokio::test]
async fn close_is_idempotent_and_safe_before_first_use() {
    // Given: A client that never opened a session
    let harness = Harness::new();

    // When: It is closed twice
    harness.client.close();
    harness.client.close();

    // Then: Nothing was opened and the client is still usable
    assert!(!harness.client.has_open_session());
    assert_eq!(harness.connector.connects(), 0);

    harness.transport.respond_json("/quote", &json!({"ok": true}));
    harness
        .client
        .fetch_json(&url("/quote"))
        .await
        .expect("fetch after close");
    assert!(harness.client.has_open_session());
}

#[tokio::test]
async fn closing_after_use_drops_the_session_and_next_call_reopens_it() {
    // Given: A client that has served one request
    let harness = Harness::new();
    harness.transport.respond_json("/quote", &json!({"ok": true}));
    harness
        .client
        .fetch_json(&url("/quote"))
        .await
        .expect("first fetch");

    // When: The service shuts down twice and the client is used again
    let service = harness.service();
    service.shutdown();
    service.shutdown();
    harness
        .client
        .fetch_json(&url("/quote"))
        .await
        .expect("fetch after shutdown");

    // Then: A fresh session was opened for the second request
    assert_eq!(harness.connector.connects(), 2);
}

#[test]
fn one_client_can_be_shared_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RateLimitedClient>();
    assert_send_sync::<Arc<RateLimitedClient>>();
}
