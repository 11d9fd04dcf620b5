//! Cloud DNS REST client against a mock API server

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use cnamesync_core::traits::{ManagedZone, ProviderRecord, ZoneProvider};
use cnamesync_core::{ChangeSet, Error};
use cnamesync_provider_clouddns::{CloudDnsProvider, TokenSource};
use ring::signature::{RSA_PKCS1_2048_8192_SHA256, RsaKeyPair, UnparsedPublicKey};
use serde_json::json;
use wiremock::matchers::{
    body_json, body_string_contains, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_KEY_PEM: &str = include_str!("data/test-service-account-key.pem");

const ZONES_PATH: &str = "/projects/my-project/managedZones";

fn provider(server: &MockServer, dry_run: bool) -> CloudDnsProvider {
    CloudDnsProvider::new(
        "my-project",
        TokenSource::fixed("test-token"),
        reqwest::Client::new(),
        dry_run,
    )
    .unwrap()
    .with_base_url(server.uri())
}

fn example_zone() -> ManagedZone {
    ManagedZone::new("example-com", "example.com.")
}

fn example_change() -> ChangeSet {
    ChangeSet {
        additions: vec![ProviderRecord::a("a.example.com.", "1.2.3.4", 300)],
        deletions: vec![ProviderRecord::a("a.example.com.", "9.9.9.9", 300)],
    }
}

#[tokio::test]
async fn lists_zones_across_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ZONES_PATH))
        .and(query_param_is_missing("pageToken"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "managedZones": [{ "name": "example-com", "dnsName": "example.com.", "id": "101" }],
            "nextPageToken": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ZONES_PATH))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "managedZones": [{ "name": "example-org", "dnsName": "example.org.", "id": "102" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let zones = provider(&server, false).list_zones().await.unwrap();

    assert_eq!(zones.len(), 2);
    assert_eq!(zones[0].name, "example-com");
    assert_eq!(zones[0].id.as_deref(), Some("101"));
    assert_eq!(zones[1].dns_name, "example.org.");
}

#[tokio::test]
async fn lists_record_sets_of_a_zone() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{ZONES_PATH}/example-com/rrsets")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "dns#resourceRecordSetsListResponse",
            "rrsets": [
                {
                    "kind": "dns#resourceRecordSet",
                    "name": "a.example.com.",
                    "type": "A",
                    "ttl": 300,
                    "rrdatas": ["9.9.9.9"]
                },
                {
                    "name": "example.com.",
                    "type": "NS",
                    "ttl": 21600,
                    "rrdatas": ["ns-cloud-a1.googledomains.com."]
                }
            ]
        })))
        .mount(&server)
        .await;

    let records = provider(&server, false)
        .list_records(&example_zone())
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0], ProviderRecord::a("a.example.com.", "9.9.9.9", 300));
    assert_eq!(records[1].record_type, "NS");
}

#[tokio::test]
async fn submits_additions_and_deletions_in_one_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{ZONES_PATH}/example-com/changes")))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({
            "additions": [
                { "name": "a.example.com.", "type": "A", "rrdatas": ["1.2.3.4"], "ttl": 300 }
            ],
            "deletions": [
                { "name": "a.example.com.", "type": "A", "rrdatas": ["9.9.9.9"], "ttl": 300 }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "dns#change", "id": "42", "status": "pending"
        })))
        .expect(1)
        .mount(&server)
        .await;

    provider(&server, false)
        .submit_change(&example_zone(), &example_change())
        .await
        .unwrap();
}

#[tokio::test]
async fn dry_run_never_submits() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    provider(&server, true)
        .submit_change(&example_zone(), &example_change())
        .await
        .unwrap();
}

#[tokio::test]
async fn forbidden_maps_to_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ZONES_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let err = provider(&server, false).list_zones().await.unwrap_err();

    match err {
        Error::Provider { provider, message } => {
            assert_eq!(provider, "clouddns");
            assert!(message.contains("Authentication failed"), "got: {message}");
            assert!(!message.contains("test-token"));
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn stale_deletion_maps_to_precondition_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{ZONES_PATH}/example-com/changes")))
        .respond_with(ResponseTemplate::new(412).set_body_string("conditionNotMet"))
        .mount(&server)
        .await;

    let err = provider(&server, false)
        .submit_change(&example_zone(), &example_change())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Precondition failed"));
}

#[tokio::test]
async fn authorized_user_token_is_fetched_once_and_reused() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.fresh",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ZONES_PATH))
        .and(header("authorization", "Bearer ya29.fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "managedZones": [] })))
        .expect(2)
        .mount(&server)
        .await;

    let credentials = json!({
        "type": "authorized_user",
        "client_id": "id.apps.googleusercontent.com",
        "client_secret": "shh",
        "refresh_token": "refresh-me",
        "token_uri": format!("{}/token", server.uri()),
    })
    .to_string();

    let provider = CloudDnsProvider::from_credentials_json("my-project", &credentials, false)
        .unwrap()
        .with_base_url(server.uri());

    assert!(provider.list_zones().await.unwrap().is_empty());
    assert!(provider.list_zones().await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_token_request_is_a_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
        .mount(&server)
        .await;

    let credentials = json!({
        "type": "authorized_user",
        "client_id": "id",
        "client_secret": "shh",
        "refresh_token": "revoked",
        "token_uri": format!("{}/token", server.uri()),
    })
    .to_string();

    let provider = CloudDnsProvider::from_credentials_json("my-project", &credentials, false)
        .unwrap()
        .with_base_url(server.uri());

    let err = provider.list_zones().await.unwrap_err();
    assert!(err.to_string().contains("Token request rejected"));
}

fn decode_segment(segment: &str) -> serde_json::Value {
    serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segment).unwrap()).unwrap()
}

fn test_key_pair() -> RsaKeyPair {
    let body: String = TEST_KEY_PEM
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect();
    RsaKeyPair::from_pkcs8(&STANDARD.decode(body).unwrap()).unwrap()
}

#[tokio::test]
async fn service_account_signs_assertion_and_refetches_expiring_token() {
    let server = MockServer::start().await;
    let token_uri = format!("{}/token", server.uri());

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
        ))
        .and(body_string_contains("assertion="))
        // Inside the refresh margin, so every call fetches a new token
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "sa-tok",
            "expires_in": 30,
            "token_type": "Bearer"
        })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ZONES_PATH))
        .and(header("authorization", "Bearer sa-tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "managedZones": [] })))
        .expect(2)
        .mount(&server)
        .await;

    let credentials = json!({
        "type": "service_account",
        "project_id": "my-project",
        "private_key_id": "key-1",
        "private_key": TEST_KEY_PEM,
        "client_email": "dns-sync@my-project.iam.gserviceaccount.com",
        "token_uri": token_uri,
    })
    .to_string();

    let provider = CloudDnsProvider::from_credentials_json("my-project", &credentials, false)
        .unwrap()
        .with_base_url(server.uri());

    assert!(provider.list_zones().await.unwrap().is_empty());
    assert!(provider.list_zones().await.unwrap().is_empty());

    let requests = server.received_requests().await.unwrap();
    let token_request = requests
        .iter()
        .find(|r| r.url.path() == "/token")
        .unwrap();
    let form = String::from_utf8(token_request.body.clone()).unwrap();
    let assertion = form
        .split('&')
        .find_map(|pair| pair.strip_prefix("assertion="))
        .unwrap();

    let segments: Vec<&str> = assertion.split('.').collect();
    assert_eq!(segments.len(), 3);

    let jwt_header = decode_segment(segments[0]);
    assert_eq!(jwt_header["alg"], "RS256");
    assert_eq!(jwt_header["kid"], "key-1");

    let claims = decode_segment(segments[1]);
    assert_eq!(claims["iss"], "dns-sync@my-project.iam.gserviceaccount.com");
    assert_eq!(claims["aud"], token_uri.as_str());
    assert_eq!(
        claims["scope"],
        "https://www.googleapis.com/auth/ndev.clouddns.readwrite"
    );

    let signature = URL_SAFE_NO_PAD.decode(segments[2]).unwrap();
    let signing_input = format!("{}.{}", segments[0], segments[1]);
    let key_pair = test_key_pair();
    UnparsedPublicKey::new(&RSA_PKCS1_2048_8192_SHA256, key_pair.public().as_ref())
        .verify(signing_input.as_bytes(), &signature)
        .unwrap();
}
