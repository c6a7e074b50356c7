// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tg_core::TupleType;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve a single canned response and return the request head.
async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        String::from_utf8_lossy(&buf).to_string()
    });
    (format!("http://{addr}"), handle)
}

#[test]
fn urls_strip_trailing_slash() {
    let store = HttpTupleStore::new("http://castor:10100/").unwrap();
    assert_eq!(store.telemetry_url(), "http://castor:10100/intra-vcp/telemetry");
    let id = Uuid::nil();
    assert_eq!(
        store.activation_url(id),
        "http://castor:10100/intra-vcp/tuple-chunks/activate/00000000-0000-0000-0000-000000000000"
    );
}

#[tokio::test]
async fn telemetry_is_fetched_and_parsed() {
    let (url, server) =
        serve_once("200 OK", r#"{"metrics":[{"available":42,"consumptionRate":1,"type":"BIT_GFP"}]}"#).await;
    let store = HttpTupleStore::new(url).unwrap();
    let telemetry = store.telemetry().await.unwrap();
    assert_eq!(telemetry.available(TupleType::BitGfp), 42);

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /intra-vcp/telemetry HTTP/1.1"));
}

#[tokio::test]
async fn telemetry_rejects_bad_payload() {
    let (url, _server) = serve_once("200 OK", r#"{"metrics":"nope"}"#).await;
    let store = HttpTupleStore::new(url).unwrap();
    assert!(matches!(store.telemetry().await, Err(TupleStoreError::Payload(_))));
}

#[tokio::test]
async fn activation_puts_chunk_id() {
    let (url, server) = serve_once("200 OK", "").await;
    let store = HttpTupleStore::new(url).unwrap();
    let id = Uuid::new_v4();
    store.activate_chunk(id).await.unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with(&format!("PUT /intra-vcp/tuple-chunks/activate/{id} HTTP/1.1")));
}

#[tokio::test]
async fn activation_non_success_is_an_error() {
    let (url, _server) = serve_once("500 Internal Server Error", "").await;
    let store = HttpTupleStore::new(url).unwrap();
    let err = store.activate_chunk(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, TupleStoreError::Status { status: 500, .. }));
}

#[tokio::test]
async fn unreachable_store_is_a_request_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let store = HttpTupleStore::new(format!("http://{addr}")).unwrap();
    assert!(matches!(store.telemetry().await, Err(TupleStoreError::Request { .. })));
}

#[tokio::test]
async fn fake_fails_then_recovers() {
    let fake = FakeTupleStore::new();
    fake.fail_activations(1);
    let id = Uuid::new_v4();
    assert!(fake.activate_chunk(id).await.is_err());
    fake.activate_chunk(id).await.unwrap();
    assert_eq!(fake.activation_attempts(), vec![id, id]);
    assert_eq!(fake.activated(), vec![id]);
}
