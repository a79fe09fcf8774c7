mod auth_support;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use ignite::auth::{CredentialPair, RefreshCoordinator};
use ignite::config::ClientConfig;
use ignite::error::{ApiError, RefreshError};
use ignite::http::{ApiClient, ApiRequest};
use pretty_assertions::assert_eq;
use reqwest::header::AUTHORIZATION;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_support::{InMemoryTokenStore, SignOutCounter};

const REFRESH_PATH: &str = "/sessions/refresh-token";

fn client_for(server: &MockServer) -> ApiClient {
    let config = ClientConfig::builder().base_url(server.uri()).build();
    let client = ApiClient::new(&config).expect("client");
    client.set_authorization("T1").expect("authorization");
    client
}

fn install(
    client: &ApiClient,
    store: &Arc<InMemoryTokenStore>,
) -> (Arc<RefreshCoordinator>, SignOutCounter) {
    let coordinator = Arc::new(RefreshCoordinator::new(store.clone()));
    let sign_outs = SignOutCounter::default();
    coordinator.install(client, sign_outs.hook());
    (coordinator, sign_outs)
}

fn expired() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({ "message": "token.expired" }))
}

async fn mount_protected(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/(exercises|groups|history)"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .respond_with(expired())
        .mount(server)
        .await;
}

async fn mount_refresh(server: &MockServer, from: &str, to: (&str, &str), expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(body_json(json!({ "refresh_token": from })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "token": to.0, "refresh_token": to.1 }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn bearer_count(requests: &[wiremock::Request], token: &str) -> usize {
    let expected = format!("Bearer {token}");
    requests
        .iter()
        .filter(|r| r.url.path() != REFRESH_PATH)
        .filter(|r| {
            r.headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == expected)
        })
        .count()
}

#[tokio::test]
async fn concurrent_expiries_trigger_one_refresh() {
    let server = MockServer::start().await;
    mount_protected(&server, "T2").await;
    mount_refresh(&server, "R1", ("T2", "R2"), 1).await;

    let client = client_for(&server);
    let store = Arc::new(InMemoryTokenStore::with_pair("T1", "R1"));
    let (coordinator, sign_outs) = install(&client, &store);

    let results = join_all(
        (0..5).map(|i| client.dispatch(ApiRequest::get(format!("/exercises/{i}")))),
    )
    .await;

    for result in results {
        let body: serde_json::Value = result.expect("replayed request").json().unwrap();
        assert_eq!(body, json!({ "ok": true }));
    }
    assert_eq!(store.get(), Some(CredentialPair::new("T2", "R2")));
    assert_eq!(
        client.default_header(&AUTHORIZATION).unwrap(),
        "Bearer T2"
    );
    assert_eq!(sign_outs.count(), 0);
    assert!(!coordinator.is_refreshing());
    assert_eq!(coordinator.pending(), 0);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(bearer_count(&requests, "T1"), 5);
    assert_eq!(bearer_count(&requests, "T2"), 5);
}

#[tokio::test]
async fn replay_carries_the_new_access_token() {
    let server = MockServer::start().await;
    mount_protected(&server, "T2").await;
    mount_refresh(&server, "R1", ("T2", "R2"), 1).await;

    let client = client_for(&server);
    let store = Arc::new(InMemoryTokenStore::with_pair("T1", "R1"));
    install(&client, &store);

    client.get("/history").await.expect("replayed");

    let requests = server.received_requests().await.unwrap();
    let last = requests.last().unwrap();
    assert_eq!(last.url.path(), "/history");
    assert_eq!(last.headers.get("authorization").unwrap(), "Bearer T2");
}

#[tokio::test]
async fn server_error_becomes_domain_error_without_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/groups"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "message": "Internal error" })),
        )
        .mount(&server)
        .await;
    mount_refresh(&server, "R1", ("T2", "R2"), 0).await;

    let client = client_for(&server);
    let store = Arc::new(InMemoryTokenStore::with_pair("T1", "R1"));
    let (_, sign_outs) = install(&client, &store);

    let err = client.get("/groups").await.unwrap_err();
    assert!(matches!(
        &err,
        ApiError::Domain { status: 500, message } if message == "Internal error"
    ));
    assert_eq!(err.to_string(), "Internal error");
    assert_eq!(sign_outs.count(), 0);
}

#[tokio::test]
async fn error_without_message_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/groups"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let store = Arc::new(InMemoryTokenStore::with_pair("T1", "R1"));
    install(&client, &store);

    let err = client.get("/groups").await.unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 502, body: None }));
}

#[tokio::test]
async fn wrong_credentials_are_not_refreshed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sessions"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "message": "E-mail e/ou senha incorreta." })),
        )
        .mount(&server)
        .await;
    mount_refresh(&server, "R1", ("T2", "R2"), 0).await;

    let client = client_for(&server);
    let store = Arc::new(InMemoryTokenStore::with_pair("T1", "R1"));
    let (_, sign_outs) = install(&client, &store);

    let err = client
        .post("/sessions", &json!({ "email": "ana@example.com", "password": "nope" }))
        .await
        .unwrap_err();
    assert!(matches!(
        &err,
        ApiError::Domain { status: 401, message } if message == "E-mail e/ou senha incorreta."
    ));
    assert_eq!(sign_outs.count(), 0);
}

#[tokio::test]
async fn missing_refresh_token_signs_out_once() {
    let server = MockServer::start().await;
    mount_protected(&server, "T2").await;
    mount_refresh(&server, "R1", ("T2", "R2"), 0).await;

    let client = client_for(&server);
    let store = Arc::new(InMemoryTokenStore::new());
    let (coordinator, sign_outs) = install(&client, &store);

    let err = client.get("/history").await.unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 401, .. }));
    assert_eq!(err.server_message(), Some("token.expired"));
    assert_eq!(sign_outs.count(), 1);
    assert!(!coordinator.is_refreshing());
}

#[tokio::test]
async fn failed_refresh_rejects_every_queued_request() {
    let server = MockServer::start().await;
    mount_protected(&server, "T2").await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "message": "Refresh token not found." }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let store = Arc::new(InMemoryTokenStore::with_pair("T1", "R1"));
    let (coordinator, sign_outs) = install(&client, &store);

    let results = join_all(
        ["/groups", "/history", "/exercises/1", "/exercises/2"]
            .into_iter()
            .map(|p| client.dispatch(ApiRequest::get(p))),
    )
    .await;

    for result in results {
        match result.unwrap_err() {
            ApiError::Refresh(RefreshError::Rejected { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message.as_deref(), Some("Refresh token not found."));
            }
            other => panic!("expected refresh rejection, got {other:?}"),
        }
    }
    assert_eq!(sign_outs.count(), 1);
    assert!(!coordinator.is_refreshing());
    assert_eq!(
        client.default_header(&AUTHORIZATION).unwrap(),
        "Bearer T1"
    );
}

#[tokio::test]
async fn malformed_refresh_response_fails_the_episode() {
    let server = MockServer::start().await;
    mount_protected(&server, "T2").await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "T2" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let store = Arc::new(InMemoryTokenStore::with_pair("T1", "R1"));
    let (_, sign_outs) = install(&client, &store);

    let err = client.get("/groups").await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::Refresh(RefreshError::InvalidResponse(_))
    ));
    assert_eq!(store.get(), Some(CredentialPair::new("T1", "R1")));
    assert_eq!(sign_outs.count(), 1);
}

#[tokio::test]
async fn replay_rejected_again_is_not_refreshed_twice() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(expired())
        .mount(&server)
        .await;
    mount_refresh(&server, "R1", ("T2", "R2"), 1).await;

    let client = client_for(&server);
    let store = Arc::new(InMemoryTokenStore::with_pair("T1", "R1"));
    let (coordinator, sign_outs) = install(&client, &store);

    let err = client.get("/history").await.unwrap_err();
    assert!(matches!(
        &err,
        ApiError::Domain { status: 401, message } if message == "token.expired"
    ));
    assert_eq!(sign_outs.count(), 0);
    assert!(!coordinator.is_refreshing());
}

#[tokio::test]
async fn later_expiry_starts_a_new_episode() {
    let server = MockServer::start().await;
    mount_protected(&server, "T2").await;
    mount_refresh(&server, "R1", ("T2", "R2"), 1).await;

    let client = client_for(&server);
    let store = Arc::new(InMemoryTokenStore::with_pair("T1", "R1"));
    let (coordinator, sign_outs) = install(&client, &store);

    client.get("/groups").await.expect("first episode");
    server.verify().await;
    server.reset().await;

    mount_protected(&server, "T3").await;
    mount_refresh(&server, "R2", ("T3", "R3"), 1).await;

    client.get("/groups").await.expect("second episode");
    assert_eq!(store.get(), Some(CredentialPair::new("T3", "R3")));
    assert_eq!(sign_outs.count(), 0);
    assert!(!coordinator.is_refreshing());
}

#[tokio::test]
async fn network_errors_pass_through_unchanged() {
    let config = ClientConfig::builder()
        .base_url("http://127.0.0.1:1/")
        .timeout(Duration::from_secs(5))
        .build();
    let client = ApiClient::new(&config).unwrap();
    let store = Arc::new(InMemoryTokenStore::with_pair("T1", "R1"));
    let (_, sign_outs) = install(&client, &store);

    let err = client.get("/groups").await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "got {err:?}");
    assert_eq!(sign_outs.count(), 0);
}

#[tokio::test]
async fn uninstalled_coordinator_no_longer_intercepts() {
    let server = MockServer::start().await;
    mount_protected(&server, "T2").await;
    mount_refresh(&server, "R1", ("T2", "R2"), 0).await;

    let client = client_for(&server);
    let store = Arc::new(InMemoryTokenStore::with_pair("T1", "R1"));
    let coordinator = Arc::new(RefreshCoordinator::new(store.clone()));
    let handle = coordinator.install(&client, || {});
    assert!(handle.uninstall());
    assert_eq!(client.interceptor_count(), 0);

    let err = client.get("/groups").await.unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 401, .. }));
}

#[tokio::test]
async fn failed_replay_reaches_only_its_own_caller() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/exercises/"))
        .and(header("authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .and(header("authorization", "Bearer T2"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "message": "Internal error" })),
        )
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(expired())
        .mount(&server)
        .await;
    mount_refresh(&server, "R1", ("T2", "R2"), 1).await;

    let client = client_for(&server);
    let store = Arc::new(InMemoryTokenStore::with_pair("T1", "R1"));
    let (_, sign_outs) = install(&client, &store);

    let paths = ["/exercises/1", "/history", "/exercises/2"];
    let results = join_all(paths.iter().map(|p| client.dispatch(ApiRequest::get(*p)))).await;

    for (p, result) in paths.iter().zip(results) {
        if *p == "/history" {
            let err = result.unwrap_err();
            assert!(
                matches!(&err, ApiError::Domain { status: 500, message } if message == "Internal error"),
                "got {err:?}"
            );
        } else {
            assert!(result.is_ok(), "{p} should succeed after replay");
        }
    }
    assert_eq!(sign_outs.count(), 0);
    assert_eq!(store.get(), Some(CredentialPair::new("T2", "R2")));
}

#[tokio::test]
async fn failed_episode_does_not_block_the_next_one() {
    let server = MockServer::start().await;
    mount_protected(&server, "T2").await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "message": "Refresh token not found." })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let store = Arc::new(InMemoryTokenStore::with_pair("T1", "R1"));
    let (coordinator, sign_outs) = install(&client, &store);

    for _ in 0..2 {
        let err = client.get("/groups").await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Refresh(RefreshError::Rejected { status: 401, .. })
        ));
        assert!(!coordinator.is_refreshing());
    }
    assert_eq!(sign_outs.count(), 2);
}

#[tokio::test]
async fn expiry_from_a_finished_episode_is_replayed_without_refresh() {
    let server = MockServer::start().await;
    mount_protected(&server, "T2").await;
    mount_refresh(&server, "R1", ("T2", "R2"), 1).await;

    let client = client_for(&server);
    let store = Arc::new(InMemoryTokenStore::with_pair("T1", "R1"));
    let (_, sign_outs) = install(&client, &store);

    client.get("/groups").await.expect("first episode");

    let in_flight_with_old_token = ApiRequest::get("/history").with_bearer("T1").unwrap();
    client
        .send(in_flight_with_old_token)
        .await
        .expect("replayed with current token");
    assert_eq!(store.get(), Some(CredentialPair::new("T2", "R2")));
    assert_eq!(sign_outs.count(), 0);
}
