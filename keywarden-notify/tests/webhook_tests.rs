use chrono::{Duration, Utc};
use keywarden_core::{ActivationBinding, LicenseRecord};
use keywarden_notify::{NoopNotifier, Notifier, NotifyError, WebhookNotifier};
use std::collections::BTreeSet;
use std::net::IpAddr;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn denied_record() -> LicenseRecord {
    let mut rec = LicenseRecord::new(
        "3f2a9c44-a804-4c1e-9b63-0d8f6f2a7c11",
        "holder@example.com",
        BTreeSet::new(),
        Utc::now() + Duration::days(365),
    );
    rec.last_activation = Some(ActivationBinding {
        ip: "1.1.1.1".parse().unwrap(),
        at: Utc::now() - Duration::hours(1),
    });
    rec.record_mismatch("2.2.2.2".parse().unwrap(), Utc::now());
    rec
}

#[tokio::test]
async fn delivers_report_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/alerts"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(format!("{}/alerts", server.uri()));
    let rec = denied_record();
    notifier
        .notify(&rec, "2.2.2.2".parse().unwrap(), Some("alpha"))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(body["holder"], "holder@example.com");
    assert_eq!(body["requestIp"], "2.2.2.2");
    assert_eq!(body["boundIp"], "1.1.1.1");
    assert_eq!(body["software"], "alpha");
    assert_eq!(body["failureCount"], 1);
    assert!(body["blockedUntil"].is_string());
}

#[tokio::test]
async fn license_key_is_masked_in_the_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(server.uri());
    let rec = denied_record();
    notifier
        .notify(&rec, "2.2.2.2".parse().unwrap(), None)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    let tail = body["licenseKeyTail"].as_str().unwrap();
    assert_eq!(tail, "...7c11");
    assert!(!tail.contains("3f2a9c44"));
}

#[tokio::test]
async fn rejected_report_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(server.uri());
    let err = notifier
        .notify(&denied_record(), "2.2.2.2".parse().unwrap(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, NotifyError::Rejected(500)));
}

#[tokio::test]
async fn unreachable_sink_is_a_transport_error() {
    // Nothing listens on this port.
    let notifier = WebhookNotifier::new("http://127.0.0.1:1/alerts");
    let err = notifier
        .notify(&denied_record(), "2.2.2.2".parse().unwrap(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, NotifyError::Transport(_)));
}

#[tokio::test]
async fn noop_notifier_swallows_reports() {
    let ip: IpAddr = "2.2.2.2".parse().unwrap();
    NoopNotifier
        .notify(&denied_record(), ip, Some("alpha"))
        .await
        .unwrap();
}
