//! HTTP store client tests against a mock REST API

use activation_client::{ClientConfig, StoreClient};
use activation_core::{Coordinator, EntityId, RemoteStore, StoreError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, api_key: Option<&str>) -> StoreClient {
    StoreClient::new(ClientConfig {
        base_url: server.uri(),
        collection: "questions".into(),
        api_key: api_key.map(str::to_string),
        timeout_secs: 5,
    })
    .expect("client builds")
}

#[tokio::test]
async fn test_list_bare_array_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/questions"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "isActive": true, "question": "Tea or coffee?", "createdAt": "2024-02-01T08:00:00Z"},
            {"id": 2, "isActive": false, "question": "Cats or dogs?"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let entities = client_for(&server, Some("secret")).list().await.unwrap();

    assert_eq!(entities.len(), 2);
    assert_eq!(entities[0].id, EntityId::from("1"));
    assert!(entities[0].active);
    assert_eq!(entities[1].payload["question"], "Cats or dogs?");
}

#[tokio::test]
async fn test_list_wrapped_in_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/questions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "a", "isActive": false}],
            "total": 1
        })))
        .mount(&server)
        .await;

    let entities = client_for(&server, None).list().await.unwrap();

    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].id.as_str(), "a");
}

#[tokio::test]
async fn test_set_active_sends_flag_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/questions/7"))
        .and(body_json(json!({"isActive": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": 7, "isActive": true, "question": "Best season?"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let entity = client_for(&server, None)
        .set_active(&"7".into(), true)
        .await
        .unwrap();

    assert!(entity.active);
    assert_eq!(entity.payload["question"], "Best season?");
}

#[tokio::test]
async fn test_empty_update_body_falls_back_to_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/questions/9"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/questions/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9, "isActive": false})))
        .expect(1)
        .mount(&server)
        .await;

    let entity = client_for(&server, None)
        .set_active(&"9".into(), false)
        .await
        .unwrap();

    assert_eq!(entity.id.as_str(), "9");
    assert!(!entity.active);
}

#[tokio::test]
async fn test_accepted_update_survives_failed_read_back() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/questions/9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/questions/9"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let entity = client_for(&server, None)
        .set_active(&"9".into(), true)
        .await
        .unwrap();

    assert_eq!(entity.id.as_str(), "9");
    assert!(entity.active);
}

#[tokio::test]
async fn test_error_statuses_are_classified() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/questions/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/questions/locked"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/questions/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server, None);

    assert!(matches!(
        client.set_active(&"missing".into(), true).await,
        Err(StoreError::NotFound(_))
    ));
    assert_eq!(
        client.set_active(&"locked".into(), true).await.unwrap_err(),
        StoreError::Unauthorized("token expired".into())
    );
    let unavailable = client.set_active(&"broken".into(), true).await.unwrap_err();
    assert!(unavailable.is_transient());
}

#[tokio::test]
async fn test_unreachable_server_is_unavailable() {
    let client = StoreClient::new(ClientConfig {
        base_url: "http://127.0.0.1:9".into(),
        timeout_secs: 2,
        ..Default::default()
    })
    .unwrap();

    let err = client.list().await.unwrap_err();
    assert!(err.is_transient(), "unexpected error: {err:?}");
}

#[tokio::test]
async fn test_coordinator_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/questions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "q1", "isActive": true},
            {"id": "q2", "isActive": false},
            {"id": "q3", "isActive": false}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/questions/q1"))
        .and(body_json(json!({"isActive": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "q1", "isActive": false})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/questions/q3"))
        .and(body_json(json!({"isActive": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "q3", "isActive": true})))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(client_for(&server, None));
    coordinator.refresh().await.unwrap();

    let report = coordinator.activate(&"q3".into()).await.unwrap();

    assert!(report.activated);
    assert!(!report.has_failures());
    assert_eq!(coordinator.status().await.active_ids, vec![EntityId::from("q3")]);
}
