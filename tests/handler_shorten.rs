mod common;

use axum::http::StatusCode;
use common::{BASE_URL, TestApp, seed_mapping};
use chrono::Duration;
use quicklink::domain::repositories::MappingRepository;
use serde_json::{Value, json};

#[tokio::test]
async fn test_shorten_success() {
    let (server, repo) = TestApp::default().server();

    let response = server
        .post("/shorten")
        .json(&json!({ "long_url": "https://example.com/some/page" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    let code = body["short_code"].as_str().unwrap();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(body["short_url"], format!("{BASE_URL}/{code}"));

    let stored = repo.find_by_code(code).await.unwrap().unwrap();
    assert_eq!(stored.original_url, "https://example.com/some/page");
    assert_eq!(stored.created_ip.as_deref(), Some("127.0.0.1"));
    assert!(stored.expires_at.is_some());
}

#[tokio::test]
async fn test_shorten_same_url_returns_same_code() {
    let (server, _repo) = TestApp::default().server();
    let body = json!({ "long_url": "https://example.com/idempotent" });

    let first: Value = server.post("/shorten").json(&body).await.json();
    let second: Value = server.post("/shorten").json(&body).await.json();

    assert_eq!(first["short_code"], second["short_code"]);
}

#[tokio::test]
async fn test_shorten_trims_url() {
    let (server, repo) = TestApp::default().server();

    let body: Value = server
        .post("/shorten")
        .json(&json!({ "long_url": "  https://example.com/trim  " }))
        .await
        .json();

    let code = body["short_code"].as_str().unwrap();
    let stored = repo.find_by_code(code).await.unwrap().unwrap();
    assert_eq!(stored.original_url, "https://example.com/trim");
}

#[tokio::test]
async fn test_shorten_with_custom_alias() {
    let (server, _repo) = TestApp::default().server();

    let response = server
        .post("/shorten")
        .json(&json!({
            "long_url": "https://example.com/aliased",
            "custom_alias": "my-link"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["short_code"], "my-link");
    assert_eq!(body["short_url"], format!("{BASE_URL}/my-link"));
}

#[tokio::test]
async fn test_shorten_alias_conflict() {
    let (server, repo) = TestApp::default().server();
    seed_mapping(&repo, "taken", "https://example.com/first", None).await;

    let response = server
        .post("/shorten")
        .json(&json!({
            "long_url": "https://example.com/second",
            "custom_alias": "taken"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "conflict");
    assert_eq!(body["error"]["message"], "Custom alias already in use");
}

#[tokio::test]
async fn test_shorten_reclaims_expired_alias() {
    let (server, repo) = TestApp::default().server();
    seed_mapping(
        &repo,
        "old-alias",
        "https://example.com/old",
        Some(Duration::minutes(-1)),
    )
    .await;

    let response = server
        .post("/shorten")
        .json(&json!({
            "long_url": "https://example.com/new",
            "custom_alias": "old-alias"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let stored = repo.find_by_code("old-alias").await.unwrap().unwrap();
    assert_eq!(stored.original_url, "https://example.com/new");
}

#[tokio::test]
async fn test_shorten_reserved_alias() {
    let (server, _repo) = TestApp::default().server();

    for alias in ["stats", "Shorten"] {
        let response = server
            .post("/shorten")
            .json(&json!({
                "long_url": "https://example.com/reserved",
                "custom_alias": alias
            }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "validation_error");
    }
}

#[tokio::test]
async fn test_shorten_invalid_alias() {
    let (server, _repo) = TestApp::default().server();

    let response = server
        .post("/shorten")
        .json(&json!({
            "long_url": "https://example.com/x",
            "custom_alias": "a!"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_shorten_invalid_url() {
    let (server, _repo) = TestApp::default().server();

    for url in ["not-a-url", "ftp://example.com", "https://localhost/x", ""] {
        let response = server
            .post("/shorten")
            .json(&json!({ "long_url": url }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "url: {url}");
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "validation_error");
    }
}

#[tokio::test]
async fn test_shorten_url_too_long() {
    let (server, _repo) = TestApp::default().server();
    let url = format!("https://example.com/{}", "a".repeat(2048));

    let response = server
        .post("/shorten")
        .json(&json!({ "long_url": url }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "URL too long (max 2048 characters)");
}

#[tokio::test]
async fn test_shorten_invalid_expiry() {
    let (server, _repo) = TestApp::default().server();

    for minutes in [0, -5, 525_601] {
        let response = server
            .post("/shorten")
            .json(&json!({ "long_url": "https://example.com/exp", "expiry_minutes": minutes }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "minutes: {minutes}");
    }
}

#[tokio::test]
async fn test_shorten_null_expiry_never_expires() {
    let (server, repo) = TestApp::default().server();

    let body: Value = server
        .post("/shorten")
        .json(&json!({ "long_url": "https://example.com/forever", "expiry_minutes": null }))
        .await
        .json();

    let code = body["short_code"].as_str().unwrap();
    let stored = repo.find_by_code(code).await.unwrap().unwrap();
    assert_eq!(stored.expires_at, None);
}

#[tokio::test]
async fn test_shorten_one_minute_expiry() {
    let (server, repo) = TestApp::default().server();

    let response = server
        .post("/shorten")
        .json(&json!({ "long_url": "https://example.com/brief", "expiry_minutes": 1 }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let code = body["short_code"].as_str().unwrap();
    let stored = repo.find_by_code(code).await.unwrap().unwrap();
    assert_eq!(
        stored.expires_at,
        Some(stored.created_at + Duration::minutes(1))
    );

    let redirect = server.get(&format!("/{code}")).await;
    assert_eq!(redirect.status_code(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_shorten_malformed_body_not_counted() {
    let (server, _repo) = TestApp {
        rate_limit: 1,
        ..TestApp::default()
    }
    .server();

    for body in [json!({ "url": "https://example.com" }), json!({ "long_url": 42 })] {
        let response = server.post("/shorten").json(&body).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    let response = server
        .post("/shorten")
        .json(&json!({ "long_url": "https://example.com/counted" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_shorten_malformed_body() {
    let (server, _repo) = TestApp::default().server();

    let response = server
        .post("/shorten")
        .json(&json!({ "url": "https://example.com" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_shorten_rate_limited() {
    let (server, _repo) = TestApp {
        rate_limit: 5,
        ..TestApp::default()
    }
    .server();

    for i in 0..5 {
        let response = server
            .post("/shorten")
            .json(&json!({ "long_url": format!("https://example.com/{i}") }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    let response = server
        .post("/shorten")
        .json(&json!({ "long_url": "https://example.com/sixth" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response
        .header("retry-after")
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "rate_limited");
    assert_eq!(body["error"]["details"]["limit"], 5);
}

#[tokio::test]
async fn test_shorten_rate_limit_counts_invalid_requests() {
    let (server, _repo) = TestApp {
        rate_limit: 2,
        ..TestApp::default()
    }
    .server();

    for _ in 0..2 {
        server
            .post("/shorten")
            .json(&json!({ "long_url": "not-a-url" }))
            .await;
    }

    let response = server
        .post("/shorten")
        .json(&json!({ "long_url": "https://example.com/valid" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_shorten_behind_proxy_limits_per_forwarded_ip() {
    let (server, _repo) = TestApp {
        rate_limit: 1,
        behind_proxy: true,
    }
    .server();

    let first = server
        .post("/shorten")
        .add_header("x-forwarded-for", "203.0.113.1, 10.0.0.1")
        .json(&json!({ "long_url": "https://example.com/a" }))
        .await;
    let second = server
        .post("/shorten")
        .add_header("x-forwarded-for", "203.0.113.2")
        .json(&json!({ "long_url": "https://example.com/b" }))
        .await;
    let third = server
        .post("/shorten")
        .add_header("x-forwarded-for", "203.0.113.1")
        .json(&json!({ "long_url": "https://example.com/c" }))
        .await;

    assert_eq!(first.status_code(), StatusCode::OK);
    assert_eq!(second.status_code(), StatusCode::OK);
    assert_eq!(third.status_code(), StatusCode::TOO_MANY_REQUESTS);
}
