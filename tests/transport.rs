use std::io::ErrorKind;
use std::sync::Arc;

use outlet_atlas::api::{ApiClient, ApiError, Backend};
use outlet_atlas::map_view::{MapRender, OutletMapView, LOAD_ERROR_MESSAGE};
use outlet_atlas::query_panel::relay_query;
use outlet_atlas::tui::AppEvent;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};

const OUTLETS_JSON: &str = r#"[
    {"id": 1, "name": "KLCC", "address": "Suria KLCC", "telephone": "03-1111",
     "latitude": 3.1579, "longitude": 101.7116, "waze_link": "https://waze.com/ul?ll=3.1579,101.7116"},
    {"id": 2, "name": "Bangsar", "address": "Jalan Telawi", "telephone": "03-2222",
     "latitude": 3.1290, "longitude": 101.6710, "waze_link": "https://waze.com/ul?ll=3.129,101.671"}
]"#;

/// Serves each canned response to one connection, in order, and hands back
/// the raw requests it saw.
async fn start_server(
    responses: Vec<(&'static str, &'static str)>,
) -> Option<(String, oneshot::Receiver<Vec<String>>)> {
    let listener = match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(err) if err.kind() == ErrorKind::PermissionDenied => return None,
        Err(err) => panic!("failed to bind local test listener: {err}"),
    };
    let addr = listener.local_addr().unwrap();
    let (done_tx, done_rx) = oneshot::channel();

    tokio::spawn(async move {
        let mut requests = Vec::new();
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            requests.push(read_request(&mut socket).await);

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
        let _ = done_tx.send(requests);
    });

    Some((format!("http://{addr}"), done_rx))
}

/// Reads headers plus a `Content-Length` body, which may arrive in separate writes.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&raw);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if raw.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&raw).into_owned()
}

/// A port nobody listens on.
async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

#[tokio::test]
async fn get_outlets_preserves_backend_order() {
    let Some((url, requests)) = start_server(vec![("200 OK", OUTLETS_JSON)]).await else {
        return;
    };
    let client = ApiClient::new(&url).unwrap();

    let outlets = client.outlets().await.unwrap();
    assert_eq!(outlets.iter().map(|o| o.id).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(outlets[1].name, "Bangsar");

    let requests = requests.await.unwrap();
    assert!(requests[0].starts_with("GET /outlets HTTP/1.1"));
}

#[tokio::test]
async fn non_success_status_is_a_transport_error() {
    let Some((url, _requests)) =
        start_server(vec![("500 Internal Server Error", r#"{"detail":"db down"}"#)]).await
    else {
        return;
    };
    let client = ApiClient::new(&url).unwrap();

    let err = client.stored_answer().await.unwrap_err();
    match err {
        ApiError::Transport(e) => assert_eq!(e.status().map(|s| s.as_u16()), Some(500)),
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let Some((url, _requests)) = start_server(vec![("200 OK", r#"{"answer": 1}"#)]).await else {
        return;
    };
    let client = ApiClient::new(&url).unwrap();

    assert!(matches!(client.stored_answer().await, Err(ApiError::Decode(_))));
}

#[tokio::test]
async fn submit_posts_query_then_refetches() {
    let Some((url, requests)) = start_server(vec![
        ("200 OK", r#"{"llmresponse":"3 outlets near KLCC"}"#),
        ("200 OK", r#"{"llmresponse":"3 outlets near KLCC"}"#),
    ])
    .await
    else {
        return;
    };
    let client = ApiClient::new(&url).unwrap();

    let outcome = relay_query(&client, "outlets near KLCC").await;
    assert!(outcome.posted);
    assert_eq!(outcome.answer.unwrap().llmresponse, "3 outlets near KLCC");

    let requests = requests.await.unwrap();
    assert!(requests[0].starts_with("POST /llmresponses HTTP/1.1"));
    assert!(requests[0].contains(r#"{"llmresponse":"outlets near KLCC"}"#));
    assert!(requests[1].starts_with("GET /llmresponses HTTP/1.1"));
}

#[tokio::test]
async fn network_error_leaves_map_on_failure_placeholder() {
    let client = ApiClient::new(&closed_port_url().await).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut view = OutletMapView::new();
    view.mount(Arc::new(client), tx);
    match rx.recv().await {
        Some(AppEvent::OutletsFetched(result)) => {
            assert!(matches!(result, Err(ApiError::Transport(_))));
            view.on_outlets_fetched(result);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    assert_eq!(view.render(), MapRender::Failed(LOAD_ERROR_MESSAGE));
}

#[tokio::test]
async fn failed_post_is_not_followed_by_get() {
    let client = ApiClient::new(&closed_port_url().await).unwrap();

    let outcome = relay_query(&client, "anything").await;
    assert!(!outcome.posted);
    assert!(outcome.answer.is_none());
}
