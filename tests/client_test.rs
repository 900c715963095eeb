// End-to-end client tests: validation, the public enqueue API against a
// mock ingestion endpoint, and statistics accounting.

use std::time::Duration;
use telemetry_relay::{
    Client, ClientError, Config, DeliveryMode, Options, Properties, Traits, ValidationError,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_config(endpoint: &str, delivery: DeliveryMode) -> Config {
    Config {
        endpoint: endpoint.to_string(),
        delivery,
        flush_interval: Duration::from_secs(60),
        gzip: false,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_rejects_empty_write_key() {
    let result = Client::new("", Config::default());
    assert!(matches!(
        result,
        Err(ClientError::Validation(ValidationError::EmptyWriteKey))
    ));
}

#[tokio::test]
async fn test_rejects_invalid_endpoint() {
    let config = Config {
        endpoint: "not a url".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        Client::new("key-1", config),
        Err(ClientError::Config(_))
    ));
}

#[tokio::test]
async fn test_invalid_actions_fail_before_submission() {
    let server = MockServer::start().await;
    let client = Client::new("key-1", client_config(&server.uri(), DeliveryMode::Batched)).unwrap();

    let result = client.track("", "Signed Up", Properties::new()).await;
    assert!(matches!(
        result,
        Err(ClientError::Validation(ValidationError::EmptyUserId))
    ));

    let result = client.track("user-1", "", Properties::new()).await;
    assert!(matches!(
        result,
        Err(ClientError::Validation(ValidationError::EmptyEventName))
    ));

    let result = client.alias("", "user-1").await;
    assert!(matches!(
        result,
        Err(ClientError::Validation(ValidationError::EmptyPreviousId))
    ));

    // Rejected actions never reach the pipeline
    assert_eq!(client.statistics().submitted, 0);

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_batched_flush_delivers_all_action_kinds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/batch"))
        .and(body_partial_json(serde_json::json!({
            "writeKey": "key-1",
            "batch": [
                { "action": "identify", "userId": "user-1" },
                { "action": "track", "userId": "user-1", "event": "Signed Up" },
                { "action": "alias", "previousId": "anon-1", "userId": "user-1" },
            ],
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new("key-1", client_config(&server.uri(), DeliveryMode::Batched)).unwrap();

    let mut traits = Traits::new();
    traits.insert("plan".to_string(), "enterprise".into());
    client.identify("user-1", traits).await.unwrap();
    client
        .track("user-1", "Signed Up", Properties::new())
        .await
        .unwrap();
    client.alias("anon-1", "user-1").await.unwrap();
    client.flush().await.unwrap();

    let stats = client.statistics();
    assert_eq!(stats.submitted, 3);
    assert_eq!(stats.succeeded, 3);
    assert_eq!(stats.failed, 0);
    assert!(stats.is_drained());

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_immediate_mode_sends_without_flush() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/batch"))
        .and(body_partial_json(serde_json::json!({
            "batch": [{ "action": "track", "userId": "user-1" }],
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        Client::new("key-1", client_config(&server.uri(), DeliveryMode::Immediate)).unwrap();

    client
        .track("user-1", "Signed Up", Properties::new())
        .await
        .unwrap();

    // Already delivered by the time the call returned
    let stats = client.statistics();
    assert_eq!(stats.submitted, 1);
    assert_eq!(stats.succeeded, 1);

    // No queue in immediate mode
    assert!(client.queue_metrics().is_none());

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_options_flatten_into_the_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "batch": [{
                "action": "track",
                "anonymousId": "anon-7",
                "integrations": { "Mixpanel": false },
            }],
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new("key-1", client_config(&server.uri(), DeliveryMode::Batched)).unwrap();

    let options = Options::new()
        .anonymous_id("anon-7")
        .integration("Mixpanel", false);
    client
        .track_with("user-1", "Signed Up", Properties::new(), Some(options), None)
        .await
        .unwrap();
    client.flush().await.unwrap();

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failed_delivery_keeps_statistics_consistent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = Client::new("key-1", client_config(&server.uri(), DeliveryMode::Batched)).unwrap();

    for n in 0..5 {
        client
            .track(format!("user-{n}"), "Signed Up", Properties::new())
            .await
            .unwrap();
    }
    client.flush().await.unwrap();

    let stats = client.statistics();
    assert_eq!(stats.submitted, 5);
    assert_eq!(stats.succeeded, 0);
    assert_eq!(stats.failed, 5);
    assert!(stats.is_drained());

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_subscription_can_be_removed() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use telemetry_relay::{Action, EventSubscriber, FailureCause};

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl EventSubscriber for Counter {
        fn succeeded(&self, actions: &[Action]) {
            self.0.fetch_add(actions.len(), Ordering::SeqCst);
        }
        fn failed(&self, _actions: &[Action], _cause: &FailureCause) {}
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = Client::new("key-1", client_config(&server.uri(), DeliveryMode::Batched)).unwrap();
    let counter = Arc::new(Counter::default());
    let id = client.subscribe(counter.clone());

    client
        .track("user-1", "Signed Up", Properties::new())
        .await
        .unwrap();
    client.flush().await.unwrap();
    assert_eq!(counter.0.load(Ordering::SeqCst), 1);

    assert!(client.unsubscribe(id));
    assert!(!client.unsubscribe(id));

    client
        .track("user-2", "Signed Up", Properties::new())
        .await
        .unwrap();
    client.flush().await.unwrap();

    // No further notifications after unsubscribe
    assert_eq!(counter.0.load(Ordering::SeqCst), 1);

    client.shutdown().await.unwrap();
}
