use std::sync::{Arc, Once};
use std::time::Duration;

use grab_core::{JobToken, ProgressEvent};
use grab_engine::testing::{MockCall, MockCollaborator};
use grab_engine::{
    ChannelStreamSink, ClientSettings, ProgressStreamClient, ReqwestCollaborator, StreamSignal,
};
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(grab_logging::initialize_for_tests);
}

fn collaborator(server: &MockServer) -> Arc<ReqwestCollaborator> {
    let settings = ClientSettings {
        base_url: server.uri(),
        ..ClientSettings::default()
    };
    Arc::new(ReqwestCollaborator::new(settings).expect("client"))
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<StreamSignal>) -> StreamSignal {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("signal in time")
        .expect("sink alive")
}

async fn wait_finished(client: &ProgressStreamClient) {
    for _ in 0..200 {
        if !client.is_open() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("channel did not finish");
}

#[tokio::test]
async fn sse_payloads_are_forwarded_in_order_and_garbage_dropped() {
    init_logging();
    let server = MockServer::start().await;
    let body = concat!(
        "data: not json\n\n",
        ": keep-alive\n",
        "data: {\"status\":\"Downloading Files\",\"current\":1,\"total\":5,\"zip_size\":0,\"ready\":false}\n\n",
        "data: {\"status\":\"ready\",\"current\":5,\"total\":5,\"zip_size\":204800,\"ready\":true,\"zip_name\":\"a.zip\"}\n\n",
    );
    Mock::given(method("GET"))
        .and(path("/download-progress/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let token = JobToken::from("abc123");
    let client = ProgressStreamClient::open(
        collaborator(&server),
        token.clone(),
        Arc::new(ChannelStreamSink::new(tx)),
    );

    let first = recv(&mut rx).await;
    let second = recv(&mut rx).await;
    assert_eq!(
        first,
        StreamSignal::Progress {
            token: token.clone(),
            event: ProgressEvent {
                status: "Downloading Files".to_string(),
                current: 1,
                total: 5,
                zip_size: 0,
                ready: false,
            },
        }
    );
    match second {
        StreamSignal::Progress { event, .. } => {
            assert!(event.ready);
            assert_eq!(event.zip_size, 204_800);
        }
        other => panic!("unexpected {other:?}"),
    }

    // The server closing after readiness is not a failure.
    wait_finished(&client).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn stream_closed_before_ready_reports_one_failure() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download-progress/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "data: {\"status\":\"starting\",\"current\":0,\"total\":2,\"zip_size\":0,\"ready\":false}\n\n",
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = ProgressStreamClient::open(
        collaborator(&server),
        JobToken::from("t1"),
        Arc::new(ChannelStreamSink::new(tx)),
    );

    assert!(matches!(recv(&mut rx).await, StreamSignal::Progress { .. }));
    assert!(matches!(recv(&mut rx).await, StreamSignal::Failed { .. }));
    wait_finished(&client).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn http_error_on_open_is_a_failure() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download-progress/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Job not found"))
        .mount(&server)
        .await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _client = ProgressStreamClient::open(
        collaborator(&server),
        JobToken::from("missing"),
        Arc::new(ChannelStreamSink::new(tx)),
    );

    match recv(&mut rx).await {
        StreamSignal::Failed { token, message } => {
            assert_eq!(token, JobToken::from("missing"));
            assert!(message.contains("404"), "{message}");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn close_is_idempotent_and_stops_delivery() {
    init_logging();
    let mock = MockCollaborator::new();
    let token = JobToken::from("quiet");
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut client = ProgressStreamClient::open(
        Arc::new(mock.clone()),
        token.clone(),
        Arc::new(ChannelStreamSink::new(tx)),
    );
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    assert!(client.is_open());

    assert!(client.close().await);
    assert!(!client.is_open());
    assert!(!client.close().await);

    mock.push_data(
        &token,
        r#"{"status":"x","current":1,"total":1,"zip_size":0,"ready":false}"#,
    );
    tokio::task::yield_now().await;
    assert!(rx.try_recv().is_err());
    assert_eq!(mock.count_calls(&MockCall::CloseStream(token)), 1);
}
