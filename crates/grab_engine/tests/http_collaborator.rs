use std::time::Duration;

use grab_core::{JobToken, MediaType};
use grab_engine::{
    ClientSettings, Collaborator, CreateJobRequest, FailureKind, MetadataRequest,
    ReqwestCollaborator, ScrapeRequest,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn collaborator(base_url: String) -> ReqwestCollaborator {
    ReqwestCollaborator::new(ClientSettings {
        base_url,
        ..ClientSettings::default()
    })
    .expect("client")
}

#[tokio::test]
async fn metadata_request_posts_url_and_parses_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape-metadata"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "url": "https://x.test/list" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "List",
            "pagination_candidates": [
                { "selector": "a.next", "count": 1, "examples": ["/list?page=2"] }
            ],
            "main_selectors": ["main"],
            "media_types": ["img", "audio"],
            "pagination_similar_links": ["https://x.test/list?page=2"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let raw = collaborator(server.uri())
        .fetch_metadata(&MetadataRequest {
            url: "https://x.test/list".to_string(),
        })
        .await
        .expect("metadata");

    assert_eq!(raw.title.as_deref(), Some("List"));
    assert_eq!(raw.pagination_candidates[0].selector, "a.next");
    assert_eq!(raw.pagination_candidates[0].examples, vec!["/list?page=2".to_string()]);
    assert_eq!(raw.media_types, vec!["img".to_string(), "audio".to_string()]);
    assert!(raw.error.is_none());
}

#[tokio::test]
async fn scrape_request_omits_unset_filters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .and(body_json(json!({
            "url": "https://x.test/",
            "media_types": ["img", "audio"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": ["hello"],
            "media_assets": [{ "url": "https://x.test/a.png", "type": "img" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let raw = collaborator(server.uri())
        .scrape(&ScrapeRequest {
            url: "https://x.test/".to_string(),
            keyword: None,
            selector: None,
            media_types: vec![MediaType::Img, MediaType::Audio],
            pagination_links: None,
        })
        .await
        .expect("scrape");

    assert_eq!(raw.results, Some(vec!["hello".to_string()]));
    assert_eq!(raw.media_assets.unwrap()[0].media_type, "img");
}

#[tokio::test]
async fn create_job_returns_token_under_base_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/start-download-media"))
        .and(body_json(json!({
            "urls": ["https://x.test/a.png"],
            "zip_name": "Title.zip"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "job_id": "abc123" })))
        .expect(1)
        .mount(&server)
        .await;

    let token = collaborator(format!("{}/api", server.uri()))
        .create_job(&CreateJobRequest {
            urls: vec!["https://x.test/a.png".to_string()],
            zip_name: "Title.zip".to_string(),
        })
        .await
        .expect("job");

    assert_eq!(token, JobToken::from("abc123"));
}

#[tokio::test]
async fn delete_and_download_use_job_scoped_paths() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/download-zip/abc123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download-zip/abc123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"PK\x03\x04data".to_vec(), "application/zip"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = collaborator(server.uri());
    let token = JobToken::from("abc123");
    api.delete_job(&token).await.expect("delete");
    let bundle = api.download_bundle(&token).await.expect("bundle");

    assert_eq!(&bundle[..], b"PK\x03\x04data");
}

#[tokio::test]
async fn error_status_carries_response_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/start-download-media"))
        .respond_with(ResponseTemplate::new(500).set_body_string("worker crashed"))
        .mount(&server)
        .await;

    let err = collaborator(server.uri())
        .create_job(&CreateJobRequest {
            urls: vec!["u".to_string()],
            zip_name: "z.zip".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(500));
    assert_eq!(err.message, "worker crashed");
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape-metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>", "text/html"))
        .mount(&server)
        .await;

    let err = collaborator(server.uri())
        .fetch_metadata(&MetadataRequest {
            url: "https://x.test/".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn slow_unary_call_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({})),
        )
        .mount(&server)
        .await;

    let api = ReqwestCollaborator::new(ClientSettings {
        base_url: server.uri(),
        request_timeout: Duration::from_millis(50),
        ..ClientSettings::default()
    })
    .expect("client");
    let err = api
        .scrape(&ScrapeRequest {
            url: "https://x.test/".to_string(),
            keyword: None,
            selector: None,
            media_types: Vec::new(),
            pagination_links: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::Timeout);
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = ReqwestCollaborator::new(ClientSettings {
        base_url: "not a url".to_string(),
        ..ClientSettings::default()
    })
    .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
