//! End-to-end routing tests: gateway in front of mock upstreams.

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use axum::http::StatusCode;

mod common;

#[tokio::test]
async fn test_missing_tenant_never_contacts_upstream() {
    let (backend, recorder) = common::start_recording_backend(StatusCode::OK, "{}").await;
    let (proxy, shutdown) = common::start_gateway(common::gateway_config(&[("user-svc", backend)])).await;

    let res = common::client()
        .post(format!("http://{proxy}/v1/users/login"))
        .body("{\"user\":\"a\"}")
        .send()
        .await
        .expect("Gateway unreachable");

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.text().await.unwrap(), r#"{"error":"projectid is required"}"#);
    assert_eq!(recorder.count(), 0, "upstream must not be contacted");

    shutdown.trigger();
}

#[tokio::test]
async fn test_unknown_tenant_never_contacts_upstream() {
    let (backend, recorder) = common::start_recording_backend(StatusCode::OK, "{}").await;
    let (proxy, shutdown) = common::start_gateway(common::gateway_config(&[("user-svc", backend)])).await;

    let res = common::client()
        .get(format!("http://{proxy}/v1/users/me"))
        .header("x-project-id", "unknown-svc")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), r#"{"error":"projectid invalid"}"#);
    assert_eq!(recorder.count(), 0, "upstream must not be contacted");

    shutdown.trigger();
}

#[tokio::test]
async fn test_routes_each_tenant_to_its_upstream() {
    let (users, user_rec) = common::start_recording_backend(StatusCode::OK, r#"{"svc":"user"}"#).await;
    let (novels, novel_rec) = common::start_recording_backend(StatusCode::OK, r#"{"id":42}"#).await;
    let (proxy, shutdown) = common::start_gateway(common::gateway_config(&[
        ("user-svc", users),
        ("novel-svc", novels),
    ]))
    .await;

    let res = common::client()
        .get(format!("http://{proxy}/v1/novels/42/detail"))
        .header("x-project-id", "novel-svc")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), r#"{"id":42}"#);
    assert_eq!(novel_rec.count(), 1);
    assert_eq!(user_rec.count(), 0);
    assert_eq!(
        novel_rec.last().unwrap().path_and_query,
        "/v1/novels/42/detail"
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_forwards_request_verbatim() {
    let (backend, recorder) = common::start_recording_backend(StatusCode::OK, "{}").await;
    let (proxy, shutdown) = common::start_gateway(common::gateway_config(&[("novel-svc", backend)])).await;

    let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    let res = common::client()
        .put(format!("http://{proxy}/v1/chapters/7?draft=true&lang=ja"))
        .header("x-project-id", "novel-svc")
        .header("authorization", "Bearer token-abc")
        .header("content-type", "application/octet-stream")
        .body(payload.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let seen = recorder.last().expect("upstream saw the request");
    assert_eq!(seen.method, "PUT");
    assert_eq!(seen.path_and_query, "/v1/chapters/7?draft=true&lang=ja");
    assert_eq!(&seen.body[..], &payload[..]);
    assert_eq!(seen.headers["authorization"], "Bearer token-abc");
    assert_eq!(seen.headers["content-type"], "application/octet-stream");
    assert_eq!(seen.headers["x-project-id"], "novel-svc");
    assert_eq!(seen.headers["host"], backend.to_string().as_str());
    assert_eq!(seen.headers["content-length"], "4096");
    assert!(seen.headers.contains_key("x-request-id"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_relays_status_headers_and_body() {
    let body = r#"{"id":7,"title":"Chapter 7","tags":["fantasy","isekai"]}"#;
    let (backend, _) = common::start_recording_backend(StatusCode::CREATED, body).await;
    let (proxy, shutdown) = common::start_gateway(common::gateway_config(&[("novel-svc", backend)])).await;

    let res = common::client()
        .post(format!("http://{proxy}/v1/chapters"))
        .header("x-project-id", "novel-svc")
        .header("x-request-id", "trace-me")
        .body(r#"{"title":"Chapter 7"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.headers()["x-upstream"], "mock");
    assert_eq!(res.headers()["x-request-id"], "trace-me");
    assert_eq!(res.bytes().await.unwrap(), body.as_bytes());

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream_returns_500() {
    let dead = common::unused_addr().await;
    let (proxy, shutdown) = common::start_gateway(common::gateway_config(&[("user-svc", dead)])).await;

    let res = common::client()
        .get(format!("http://{proxy}/v1/users/me"))
        .header("x-project-id", "user-svc")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().await.unwrap(), r#"{"error":"Proxy error occurred"}"#);

    shutdown.trigger();
}

#[tokio::test]
async fn test_truncated_upstream_response_returns_500() {
    let truncating = common::start_truncating_backend().await;
    let (proxy, shutdown) = common::start_gateway(common::gateway_config(&[("novel-svc", truncating)])).await;

    let res = common::client()
        .get(format!("http://{proxy}/v1/novels/42/detail"))
        .header("x-project-id", "novel-svc")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().await.unwrap(), r#"{"error":"Proxy error occurred"}"#);

    shutdown.trigger();
}

#[tokio::test]
async fn test_timeout_returns_500_and_closes_upstream_connection() {
    let (silent, open) = common::start_silent_backend().await;
    let mut config = common::gateway_config(&[("user-svc", silent)]);
    config.timeouts.upstream_secs = 1;
    let (proxy, shutdown) = common::start_gateway(config).await;

    let start = Instant::now();
    let res = common::client()
        .get(format!("http://{proxy}/v1/users/me"))
        .header("x-project-id", "user-svc")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().await.unwrap(), r#"{"error":"Proxy error occurred"}"#);
    assert!(start.elapsed() >= Duration::from_secs(1));
    assert!(start.elapsed() < Duration::from_secs(5));

    let closed = common::eventually(Duration::from_secs(5), || open.load(Ordering::SeqCst) == 0).await;
    assert!(closed, "pending upstream connection should be closed after timeout");

    shutdown.trigger();
}

#[tokio::test]
async fn test_slow_tenant_does_not_delay_others() {
    let (silent, _) = common::start_silent_backend().await;
    let (fast, fast_rec) = common::start_recording_backend(StatusCode::OK, r#"{"ok":true}"#).await;
    let mut config = common::gateway_config(&[("slow-svc", silent), ("fast-svc", fast)]);
    config.timeouts.upstream_secs = 3;
    let (proxy, shutdown) = common::start_gateway(config).await;

    let client = common::client();
    let slow_client = client.clone();
    let slow_url = format!("http://{proxy}/v1/slow");
    let slow = tokio::spawn(async move {
        slow_client
            .get(&slow_url)
            .header("x-project-id", "slow-svc")
            .send()
            .await
            .map(|res| res.status())
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut tasks = Vec::new();
    for i in 0..20 {
        let client = client.clone();
        let url = format!("http://{proxy}/v1/items/{i}");
        tasks.push(tokio::spawn(async move {
            let start = Instant::now();
            let res = client
                .get(&url)
                .header("x-project-id", "fast-svc")
                .send()
                .await
                .unwrap();
            (res.status(), start.elapsed())
        }));
    }
    for task in tasks {
        let (status, elapsed) = task.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(elapsed < Duration::from_secs(2), "fast tenant delayed: {elapsed:?}");
    }
    assert_eq!(fast_rec.count(), 20);

    assert!(!slow.is_finished(), "slow tenant still waiting on its upstream");
    let slow_status = slow.await.unwrap().unwrap();
    assert_eq!(slow_status, StatusCode::INTERNAL_SERVER_ERROR);

    shutdown.trigger();
}

#[tokio::test]
async fn test_oversized_body_rejected_locally() {
    let (backend, recorder) = common::start_recording_backend(StatusCode::OK, "{}").await;
    let mut config = common::gateway_config(&[("user-svc", backend)]);
    config.limits.max_body_bytes = 1024;
    let (proxy, shutdown) = common::start_gateway(config).await;

    let res = common::client()
        .post(format!("http://{proxy}/v1/uploads"))
        .header("x-project-id", "user-svc")
        .body(vec![b'x'; 4096])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(res.text().await.unwrap(), r#"{"error":"request body too large"}"#);
    assert_eq!(recorder.count(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_custom_tenant_header_and_forwarded_headers() {
    let (backend, recorder) = common::start_recording_backend(StatusCode::OK, "{}").await;
    let mut config = common::gateway_config(&[("user-svc", backend)]);
    config.routing.tenant_header = "x-tenant".into();
    config.forwarding.add_forwarded_headers = true;
    let (proxy, shutdown) = common::start_gateway(config).await;

    let res = common::client()
        .get(format!("http://{proxy}/"))
        .header("x-project-id", "user-svc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = common::client()
        .get(format!("http://{proxy}/"))
        .header("x-tenant", "user-svc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let seen = recorder.last().unwrap();
    assert_eq!(seen.headers["x-forwarded-for"], "127.0.0.1");
    assert_eq!(seen.headers["x-forwarded-host"], proxy.to_string().as_str());
    assert_eq!(seen.headers["x-forwarded-proto"], "http");

    shutdown.trigger();
}
