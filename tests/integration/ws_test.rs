//! WebSocket upgrade and inbound protocol.

use std::time::Duration;

use axum::http::StatusCode;
use futures::{SinkExt, Stream, StreamExt};
use serde_json::Value;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use dormhub_entity::account::Role;

use crate::helpers::TestApp;

/// Wait for the next event frame with the given name.
async fn next_event<S>(stream: &mut S, name: &str) -> Value
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    let wait = async {
        while let Some(frame) = stream.next().await {
            let frame = frame.expect("WebSocket error");
            let Ok(text) = frame.to_text() else { continue };
            let Ok(value) = serde_json::from_str::<Value>(text) else {
                continue;
            };
            if value["event"] == name {
                return value;
            }
        }
        panic!("socket closed before {name}");
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("timed out waiting for event")
}

#[tokio::test]
async fn test_ws_upgrade_without_token() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/ws", None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ws_ping_and_join() {
    let app = TestApp::new().await;
    let addr = app.spawn().await;
    let (user_id, token) = app.token_for(Role::Student);

    let url = format!("ws://{addr}/ws?token={token}");
    let (mut socket, _) = connect_async(url).await.expect("Failed to connect");

    socket
        .send(Message::Text(r#"{"type":"ping"}"#.into()))
        .await
        .expect("send ping");
    let pong = next_event(&mut socket, "pong").await;
    assert!(pong["data"]["timestamp"].is_i64());

    let join = format!(r#"{{"type":"join","user_id":"{user_id}"}}"#);
    socket.send(Message::Text(join.into())).await.expect("send join");
    let joined = next_event(&mut socket, "joined").await;
    assert_eq!(joined["data"]["user_id"], user_id.to_string());
    assert_eq!(joined["data"]["role"], "student");

    assert!(app.state.registry.is_online(user_id));

    socket.close(None).await.expect("close");
}

#[tokio::test]
async fn test_ws_refuses_foreign_role_group() {
    let app = TestApp::new().await;
    let addr = app.spawn().await;
    let (user_id, token) = app.token_for(Role::Student);

    let url = format!("ws://{addr}/ws?token={token}");
    let (mut socket, _) = connect_async(url).await.expect("Failed to connect");

    socket
        .send(Message::Text(
            r#"{"type":"join_user_type","user_type":"admin"}"#.into(),
        ))
        .await
        .expect("send");
    let error = next_event(&mut socket, "error").await;
    assert!(error["data"]["message"].is_string());
    assert!(!app.state.registry.group_members(Role::Admin).contains(&user_id));
}
