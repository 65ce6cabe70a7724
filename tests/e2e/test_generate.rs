use crate::e2e::helpers;

use chrono::{Duration, Utc};
use helpers::fakes::{BackendBehavior, FAKE_PROPOSAL};
use helpers::{
    assert_error_code, generate_body, generate_test_jwt, generate_test_jwt_issued_at,
    usage_record, MisconfiguredContext, TestContext, TEST_MAX_TOKENS,
};
use hyper::StatusCode;
use pitchbutter_backend::domain::generation::prompt::SYSTEM_PROMPT;
use pitchbutter_backend::domain::quota::{Plan, WEEKLY_LIMIT, WEEK_IN_MS};
use pitchbutter_backend::infrastructure::repositories::OpenAiGenerationRepository;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use test_context::test_context;

const GENERATE: &str = "/api/generate";

// ---------------------------------------------------------------------------
// Visitor path
// ---------------------------------------------------------------------------

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_allow_first_visitor_request_and_deny_the_second(ctx: &TestContext) {
    let headers = [("x-forwarded-for", "203.0.113.10, 10.0.0.1")];

    let response = ctx
        .client
        .post_with_headers(GENERATE, &generate_body("Build a landing page"), &headers)
        .await
        .unwrap();

    response
        .assert_status(StatusCode::OK)
        .assert_header("cache-control", "no-store");
    let body = response.body.as_ref().unwrap();
    assert_eq!(body["proposal"], FAKE_PROPOSAL);

    let response = ctx
        .client
        .post_with_headers(GENERATE, &generate_body("Build a landing page"), &headers)
        .await
        .unwrap();

    response
        .assert_status(StatusCode::TOO_MANY_REQUESTS)
        .assert_error_message("Free trial used up")
        .assert_header_exists("retry-after")
        .assert_header("cache-control", "no-store");
    assert_error_code(&response, "VISITOR_TRIAL_EXHAUSTED");
    assert_eq!(response.body.as_ref().unwrap()["retryable"], false);

    // The denied request never reached the backend and never touched the ledger
    assert_eq!(ctx.backend.call_count(), 1);
    assert_eq!(ctx.ledger.transaction_count(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_track_visitors_by_address_independently(ctx: &TestContext) {
    for ip in ["198.51.100.1", "198.51.100.2"] {
        ctx.client
            .post_with_headers(GENERATE, &generate_body("Job"), &[("x-forwarded-for", ip)])
            .await
            .unwrap()
            .assert_status(StatusCode::OK);
    }

    // Falls back to x-real-ip when no forwarded address is present
    ctx.client
        .post_with_headers(GENERATE, &generate_body("Job"), &[("x-real-ip", "198.51.100.3")])
        .await
        .unwrap()
        .assert_status(StatusCode::OK);

    ctx.client
        .post_with_headers(GENERATE, &generate_body("Job"), &[("x-forwarded-for", "198.51.100.3")])
        .await
        .unwrap()
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_treat_non_bearer_authorization_as_visitor(ctx: &TestContext) {
    let response = ctx
        .client
        .post_with_headers(
            GENERATE,
            &generate_body("Job"),
            &[("authorization", "Basic dXNlcjpwYXNz")],
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(ctx.ledger.transaction_count(), 0);
}

// ---------------------------------------------------------------------------
// Input normalization
// ---------------------------------------------------------------------------

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_strip_markup_before_reaching_the_backend(ctx: &TestContext) {
    let token = generate_test_jwt("uid-sanitize");
    let body = json!({
        "jobText": "<script>{x}</script> Need a Rust developer",
        "profile": { "bio": "<b>Senior</b> engineer" },
        "tone": "{formal}"
    });

    ctx.client
        .post_with_auth(GENERATE, &body, &token)
        .await
        .unwrap()
        .assert_status(StatusCode::OK);

    let calls = ctx.backend.calls();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.system_prompt, SYSTEM_PROMPT);
    assert_eq!(call.max_tokens, TEST_MAX_TOKENS);
    assert!(call.user_prompt.contains("scriptx/script Need a Rust developer"));
    assert!(call.user_prompt.contains("bSenior/b engineer"));
    assert!(call.user_prompt.ends_with("Tone: formal"));
    for forbidden in ['<', '>', '{', '}'] {
        assert!(
            !call.user_prompt.contains(forbidden),
            "prompt still contains '{}'",
            forbidden
        );
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_truncate_long_job_text_to_2000_characters(ctx: &TestContext) {
    let token = generate_test_jwt("uid-truncate");
    let job_text = "a".repeat(2500);

    ctx.client
        .post_with_auth(GENERATE, &generate_body(&job_text), &token)
        .await
        .unwrap()
        .assert_status(StatusCode::OK);

    let prompt = &ctx.backend.calls()[0].user_prompt;
    assert!(prompt.contains(&"a".repeat(2000)));
    assert!(!prompt.contains(&"a".repeat(2001)));
}

// ---------------------------------------------------------------------------
// Request validation and credentials
// ---------------------------------------------------------------------------

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_malformed_bodies(ctx: &TestContext) {
    let json_header = [("content-type", "application/json")];

    let response = ctx.client.post_raw(GENERATE, "{not json", &json_header).await.unwrap();
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_error_code(&response, "INVALID_REQUEST");
    response.assert_header("cache-control", "no-store");

    let response = ctx
        .client
        .post(GENERATE, &json!({ "profile": {}, "tone": "formal" }))
        .await
        .unwrap();
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_error_code(&response, "INVALID_REQUEST");

    let response = ctx
        .client
        .post_raw(GENERATE, r#"{"jobText": "x"}"#, &[("content-type", "text/plain")])
        .await
        .unwrap();
    response.assert_status(StatusCode::BAD_REQUEST);

    assert_eq!(ctx.backend.call_count(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_job_text_that_is_blank_after_sanitizing(ctx: &TestContext) {
    let token = generate_test_jwt("uid-blank");

    let response = ctx
        .client
        .post_with_auth(GENERATE, &generate_body(" <>{} "), &token)
        .await
        .unwrap();

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_error_code(&response, "INVALID_REQUEST");
    assert_eq!(ctx.ledger.transaction_count(), 0);
    assert!(ctx.ledger.get("uid-blank").is_none());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_invalid_credentials_without_touching_the_ledger(ctx: &TestContext) {
    let response = ctx
        .client
        .post_with_auth(GENERATE, &generate_body("Job"), "not-a-valid-token")
        .await
        .unwrap();

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_error_code(&response, "INVALID_REQUEST");

    let response = ctx
        .client
        .post_with_headers(GENERATE, &generate_body("Job"), &[("authorization", "Bearer ")])
        .await
        .unwrap();
    response.assert_status(StatusCode::BAD_REQUEST);

    assert_eq!(ctx.ledger.transaction_count(), 0);
    assert_eq!(ctx.backend.call_count(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_tokens_issued_before_revocation(ctx: &TestContext) {
    let now = Utc::now();
    ctx.revocations.revoke("uid-revoked", now);
    let stale = generate_test_jwt_issued_at("uid-revoked", now - Duration::minutes(5));

    let response = ctx
        .client
        .post_with_auth(GENERATE, &generate_body("Job"), &stale)
        .await
        .unwrap();

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(ctx.ledger.transaction_count(), 0);
    assert_eq!(ctx.backend.call_count(), 0);
}

// ---------------------------------------------------------------------------
// Weekly quota
// ---------------------------------------------------------------------------

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_allow_five_free_generations_per_week_then_deny(ctx: &TestContext) {
    let token = generate_test_jwt("uid-free");

    for expected in 1..=WEEKLY_LIMIT {
        ctx.client
            .post_with_auth(GENERATE, &generate_body("Job"), &token)
            .await
            .unwrap()
            .assert_status(StatusCode::OK);
        assert_eq!(ctx.ledger.get("uid-free").unwrap().weekly_count, expected);
    }

    let response = ctx
        .client
        .post_with_auth(GENERATE, &generate_body("Job"), &token)
        .await
        .unwrap();

    response
        .assert_status(StatusCode::FORBIDDEN)
        .assert_error_message("Weekly quota of 5")
        .assert_header_exists("retry-after");
    assert_error_code(&response, "WEEKLY_QUOTA_EXCEEDED");
    assert!(response.body.as_ref().unwrap().get("resetsAt").is_some());

    let record = ctx.ledger.get("uid-free").unwrap();
    assert_eq!(record.weekly_count, WEEKLY_LIMIT);
    assert_eq!(record.plan, Plan::Free);
    assert_eq!(ctx.backend.call_count(), WEEKLY_LIMIT as usize);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_never_deny_pro_accounts(ctx: &TestContext) {
    let last_reset = Utc::now() - Duration::days(1);
    ctx.ledger.seed(usage_record("uid-pro", 3, last_reset, Plan::Pro));
    let token = generate_test_jwt("uid-pro");

    for _ in 0..(WEEKLY_LIMIT * 2) {
        ctx.client
            .post_with_auth(GENERATE, &generate_body("Job"), &token)
            .await
            .unwrap()
            .assert_status(StatusCode::OK);
    }

    let record = ctx.ledger.get("uid-pro").unwrap();
    assert_eq!(record.plan, Plan::Pro);
    assert_eq!(record.weekly_count, 3);
    assert_eq!(record.last_reset, last_reset);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reset_the_week_after_seven_days_and_one_millisecond(ctx: &TestContext) {
    let last_reset = Utc::now() - Duration::milliseconds(WEEK_IN_MS + 1);
    ctx.ledger.seed(usage_record("uid-reset", 5, last_reset, Plan::Free));
    let token = generate_test_jwt("uid-reset");

    ctx.client
        .post_with_auth(GENERATE, &generate_body("Job"), &token)
        .await
        .unwrap()
        .assert_status(StatusCode::OK);

    let record = ctx.ledger.get("uid-reset").unwrap();
    assert_eq!(record.weekly_count, 1);
    assert!(record.last_reset > last_reset);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_keep_denying_just_inside_the_week(ctx: &TestContext) {
    let last_reset = Utc::now() - Duration::milliseconds(WEEK_IN_MS) + Duration::minutes(1);
    ctx.ledger.seed(usage_record("uid-edge", 5, last_reset, Plan::Free));
    let token = generate_test_jwt("uid-edge");

    let response = ctx
        .client
        .post_with_auth(GENERATE, &generate_body("Job"), &token)
        .await
        .unwrap();

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(ctx.ledger.get("uid-edge").unwrap().last_reset, last_reset);
    assert_eq!(ctx.backend.call_count(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_grant_exactly_one_of_two_concurrent_requests_for_the_last_slot(
    ctx: &TestContext,
) {
    ctx.ledger
        .seed(usage_record("uid-race", 4, Utc::now() - Duration::hours(1), Plan::Free));
    let token = generate_test_jwt("uid-race");
    let body = generate_body("Job");

    let (first, second) = futures::join!(
        ctx.client.post_with_auth(GENERATE, &body, &token),
        ctx.client.post_with_auth(GENERATE, &body, &token),
    );

    let mut statuses = vec![first.unwrap().status, second.unwrap().status];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::FORBIDDEN]);
    assert_eq!(ctx.ledger.get("uid-race").unwrap().weekly_count, 5);
    assert_eq!(ctx.backend.call_count(), 1);
}

// ---------------------------------------------------------------------------
// Backend and infrastructure failures
// ---------------------------------------------------------------------------

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_surface_backend_rate_limits_distinctly_and_keep_quota_consumed(
    ctx: &TestContext,
) {
    ctx.backend.set_behavior(BackendBehavior::RateLimited);
    let token = generate_test_jwt("uid-throttled");

    let response = ctx
        .client
        .post_with_auth(GENERATE, &generate_body("Job"), &token)
        .await
        .unwrap();

    response
        .assert_status(StatusCode::TOO_MANY_REQUESTS)
        .assert_error_message("OpenAI rate limit")
        .assert_header("cache-control", "no-store");
    assert_error_code(&response, "BACKEND_RATE_LIMITED");
    assert_eq!(response.body.as_ref().unwrap()["retryable"], true);

    // Quota is consumed on attempt
    assert_eq!(ctx.ledger.get("uid-throttled").unwrap().weekly_count, 1);
}

#[tokio::test]
async fn it_should_return_openai_throttling_as_backend_rate_limited_without_retrying() {
    let api_base = helpers::stub_openai_server(
        StatusCode::TOO_MANY_REQUESTS,
        json!({
            "error": {
                "message": "Rate limit reached for gpt-4o-mini on requests per min",
                "type": "requests",
                "param": null,
                "code": "rate_limit_exceeded"
            }
        }),
    )
    .await;
    let ctx = TestContext::start_with_backend(Arc::new(OpenAiGenerationRepository::with_api_base(
        "sk-test",
        &api_base,
        "gpt-4o-mini".to_string(),
    )))
    .await;
    let token = generate_test_jwt("uid-openai-throttled");

    // The context's generation timeout is far shorter than any client retry loop
    let response = ctx
        .client
        .post_with_auth(GENERATE, &generate_body("Job"), &token)
        .await
        .unwrap();

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_error_code(&response, "BACKEND_RATE_LIMITED");
    assert_eq!(response.body.as_ref().unwrap()["retryable"], true);
    assert_eq!(
        ctx.ledger.get("uid-openai-throttled").unwrap().weekly_count,
        1
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_backend_failures_without_leaking_detail(ctx: &TestContext) {
    ctx.backend.set_behavior(BackendBehavior::Fail);
    let token = generate_test_jwt("uid-failure");

    let response = ctx
        .client
        .post_with_auth(GENERATE, &generate_body("Job"), &token)
        .await
        .unwrap();

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_error_code(&response, "BACKEND_SERVICE_ERROR");
    let message = response.body.as_ref().unwrap()["error"].as_str().unwrap();
    assert!(!message.contains("upstream returned 500"));
    assert_eq!(ctx.ledger.get("uid-failure").unwrap().weekly_count, 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_time_out_a_slow_backend_as_a_service_error(ctx: &TestContext) {
    ctx.backend.set_behavior(BackendBehavior::Hang);
    let token = generate_test_jwt("uid-slow");

    let started = std::time::Instant::now();
    let response = ctx
        .client
        .post_with_auth(GENERATE, &generate_body("Job"), &token)
        .await
        .unwrap();

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_error_code(&response, "BACKEND_SERVICE_ERROR");
    assert_eq!(response.body.as_ref().unwrap()["retryable"], true);
    assert!(started.elapsed() < std::time::Duration::from_secs(10));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_ledger_outages_as_retryable_server_errors(ctx: &TestContext) {
    ctx.ledger.set_unavailable(true);
    let token = generate_test_jwt("uid-outage");

    let response = ctx
        .client
        .post_with_auth(GENERATE, &generate_body("Job"), &token)
        .await
        .unwrap();

    response
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .assert_error_message("Database update failed");
    assert_error_code(&response, "LEDGER_UNAVAILABLE");
    assert_eq!(response.body.as_ref().unwrap()["retryable"], true);
    assert_eq!(ctx.backend.call_count(), 0);
}

#[test_context(MisconfiguredContext)]
#[tokio::test]
async fn it_should_fail_fast_without_a_backend_credential(ctx: &MisconfiguredContext) {
    let ctx = &ctx.0;
    let token = generate_test_jwt("uid-misconfigured");

    let response = ctx
        .client
        .post_with_auth(GENERATE, &generate_body("Job"), &token)
        .await
        .unwrap();

    response
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .assert_error_message("Missing OpenAI API key");
    assert_error_code(&response, "MISCONFIGURATION");

    // No quota is consumed, for accounts or visitors
    assert_eq!(ctx.ledger.transaction_count(), 0);
    let headers = [("x-forwarded-for", "192.0.2.44")];
    for _ in 0..2 {
        ctx.client
            .post_with_headers(GENERATE, &generate_body("Job"), &headers)
            .await
            .unwrap()
            .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_include_request_id_in_generation_responses(ctx: &TestContext) {
    let response = ctx.client.post(GENERATE, &generate_body("Job")).await.unwrap();
    response.assert_header_exists("x-request-id");
}
