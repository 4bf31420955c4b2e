use std::sync::Arc;

use grab_core::{MediaAsset, MediaType, ScrapeConfig};
use grab_engine::testing::{MockCall, MockCollaborator};
use grab_engine::{
    ApiError, FailureKind, RawAsset, RawMetadata, RawScrapeResponse, ScrapeCoordinator,
    ScrapeError, ScrapeRequest,
};
use pretty_assertions::assert_eq;

fn coordinator(mock: &MockCollaborator) -> ScrapeCoordinator {
    ScrapeCoordinator::new(Arc::new(mock.clone()))
}

#[tokio::test]
async fn blank_target_is_rejected_without_a_request() {
    let mock = MockCollaborator::new();
    let coordinator = coordinator(&mock);

    let meta = coordinator.fetch_metadata("   ").await.unwrap_err();
    assert!(matches!(meta, ScrapeError::Validation(_)));
    let scrape = coordinator
        .run_scrape(&ScrapeConfig::new("", vec![MediaType::Img]))
        .await
        .unwrap_err();
    assert!(matches!(scrape, ScrapeError::Validation(_)));

    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn metadata_error_envelope_becomes_rejected() {
    let mock = MockCollaborator::new();
    mock.set_metadata(Ok(RawMetadata {
        error: Some("Failed to fetch page".to_string()),
        ..RawMetadata::default()
    }));

    let err = coordinator(&mock)
        .fetch_metadata("https://x.test/")
        .await
        .unwrap_err();

    match err {
        ScrapeError::Network(api) => {
            assert_eq!(api.kind, FailureKind::Rejected);
            assert_eq!(api.message, "Failed to fetch page");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        mock.calls(),
        vec![MockCall::FetchMetadata("https://x.test/".to_string())]
    );
}

#[tokio::test]
async fn metadata_drops_unknown_media_types() {
    let mock = MockCollaborator::new();
    mock.set_metadata(Ok(RawMetadata {
        title: Some("Gallery".to_string()),
        media_types: vec!["img".to_string(), "flash".to_string(), "video".to_string()],
        ..RawMetadata::default()
    }));

    let meta = coordinator(&mock)
        .fetch_metadata("  https://x.test/gallery ")
        .await
        .unwrap();

    assert_eq!(meta.title.as_deref(), Some("Gallery"));
    assert_eq!(meta.media_types, vec![MediaType::Img, MediaType::Video]);
    assert_eq!(
        mock.calls(),
        vec![MockCall::FetchMetadata("https://x.test/gallery".to_string())]
    );
}

#[tokio::test]
async fn transport_failure_is_surfaced() {
    let mock = MockCollaborator::new();
    mock.set_scrape(Err(ApiError::new(FailureKind::Timeout, "timed out")));

    let err = coordinator(&mock)
        .run_scrape(&ScrapeConfig::new("https://x.test/", vec![MediaType::Img]))
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Network(ref api) if api.kind == FailureKind::Timeout));
}

#[tokio::test]
async fn scrape_forwards_config_and_normalizes_response() {
    let mock = MockCollaborator::new();
    mock.set_scrape(Ok(RawScrapeResponse {
        results: None,
        media_assets: Some(vec![
            RawAsset {
                url: "https://x.test/a.png".to_string(),
                media_type: "img".to_string(),
            },
            RawAsset {
                url: "https://x.test/a.swf".to_string(),
                media_type: "flash".to_string(),
            },
            RawAsset {
                url: "https://x.test/b.mp3".to_string(),
                media_type: "audio".to_string(),
            },
        ]),
    }));

    let mut config = ScrapeConfig::new("https://x.test/", vec![MediaType::Img, MediaType::Audio]);
    config.keyword = Some("cat".to_string());
    config.pagination_links = Some(vec![
        "https://x.test/".to_string(),
        "https://x.test/?page=2".to_string(),
    ]);

    let output = coordinator(&mock).run_scrape(&config).await.unwrap();

    assert!(output.results.is_empty());
    assert_eq!(
        output.media_assets,
        vec![
            MediaAsset::new("https://x.test/a.png", MediaType::Img),
            MediaAsset::new("https://x.test/b.mp3", MediaType::Audio),
        ]
    );
    assert_eq!(
        mock.calls(),
        vec![MockCall::Scrape(ScrapeRequest {
            url: "https://x.test/".to_string(),
            keyword: Some("cat".to_string()),
            selector: None,
            media_types: vec![MediaType::Img, MediaType::Audio],
            pagination_links: config.pagination_links.clone(),
        })]
    );
}
