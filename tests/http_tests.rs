//! Tests of the transport against a local server.

use dirmirror::http::{Credentials, RangeSupport, Transport};
use dirmirror::{Error, ErrorKind};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use url::Url;
use wiremock::matchers::{basic_auth, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::helpers::*;

fn url(server: &MockServer, p: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
}

#[tokio::test]
async fn test_fetch_listing_page() {
    let server = MockServer::start().await;
    mount_listing(&server, "/pub/", &["a.txt"]).await;

    let page = create_test_transport()
        .fetch(&url(&server, "/pub/"))
        .await
        .unwrap();
    assert!(page.is_html());
    assert!(page.body.contains("a.txt"));
    assert_eq!(page.url.path(), "/pub/");
}

#[tokio::test]
async fn test_fetch_classifies_statuses() {
    let server = MockServer::start().await;
    for (p, status) in [("/auth/", 401), ("/gone/", 410), ("/forbidden/", 403)] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
    }
    let transport = create_test_transport();

    let err = transport.fetch(&url(&server, "/auth/")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    let err = transport.fetch(&url(&server, "/gone/")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = transport.fetch(&url(&server, "/forbidden/")).await.unwrap_err();
    assert!(matches!(err, Error::Status { status: 403, .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_fetch_range_sends_range_only_when_resuming() {
    let server = MockServer::start().await;
    let responder = RangeResponder::new(create_test_content(100));
    Mock::given(method("GET"))
        .and(path("/f.bin"))
        .respond_with(responder.clone())
        .mount(&server)
        .await;
    let transport = create_test_transport();
    let file = url(&server, "/f.bin");

    let full = transport.fetch_range(&file, 0).await.unwrap();
    assert_eq!(full.capabilities.range, RangeSupport::Ignored);
    assert_eq!(full.capabilities.total_size, Some(100));
    assert!(full.capabilities.body_starts_at_zero());

    let partial = transport.fetch_range(&file, 25).await.unwrap();
    assert_eq!(partial.capabilities.range, RangeSupport::Honored { start: 25 });
    assert_eq!(partial.capabilities.total_size, Some(100));
    let body = partial.into_response().bytes().await.unwrap();
    assert_eq!(body.len(), 75);

    let past_end = transport.fetch_range(&file, 100).await.unwrap();
    assert_eq!(past_end.capabilities.range, RangeSupport::Unsatisfiable);
    assert_eq!(past_end.capabilities.total_size, Some(100));

    assert_eq!(
        responder.recorded_ranges(),
        vec![None, Some("bytes=25-".into()), Some("bytes=100-".into())]
    );
}

#[tokio::test]
async fn test_credentials_sent_with_every_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(basic_auth("alice", "s3cret"))
        .respond_with(listing_response(&[]))
        .expect(2)
        .mount(&server)
        .await;

    let transport = Transport::new(
        &create_test_http_config(),
        Some(Credentials::new("alice", Some("s3cret".into()))),
    )
    .unwrap();
    transport.fetch(&url(&server, "/")).await.unwrap();
    transport.fetch_range(&url(&server, "/x"), 0).await.unwrap();
}

#[tokio::test]
async fn test_default_and_custom_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("user-agent", "dirmirror-test"))
        .and(header_exists("accept"))
        .respond_with(listing_response(&[]))
        .expect(1)
        .mount(&server)
        .await;

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("dirmirror-test"));
    let config = dirmirror::HttpClientConfig {
        headers: Some(headers),
        ..create_test_http_config()
    };
    let transport = Transport::new(&config, None).unwrap();
    transport.fetch(&url(&server, "/")).await.unwrap();
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    let transport = create_test_transport();
    let err = transport
        .fetch(&Url::parse("http://127.0.0.1:9/").unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(err.is_retryable());
}
