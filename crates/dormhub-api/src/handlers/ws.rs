//! WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use dormhub_realtime::connection::heartbeat::{HeartbeatConfig, run_heartbeat};
use dormhub_realtime::{ConnectionHandle, DeliveryRegistry, InboundMessage, OutboundEvent};
use dormhub_service::RequestContext;

use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /ws
///
/// The session is checked before the upgrade, so unauthenticated clients
/// get a plain 401.
pub async fn ws_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    ws: WebSocketUpgrade,
) -> Response {
    let ctx = auth.0;
    ws.on_upgrade(move |socket| handle_ws_connection(state, ctx, socket))
}

/// Answer one inbound text frame. `None` means nothing to send back.
fn reply_to(
    registry: &DeliveryRegistry,
    handle: &ConnectionHandle,
    text: &str,
) -> Option<OutboundEvent> {
    let message = match serde_json::from_str::<InboundMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            debug!(conn_id = %handle.id, error = %e, "Malformed inbound frame");
            return Some(OutboundEvent::error("Malformed message"));
        }
    };

    match message {
        InboundMessage::Join { user_id } => {
            if user_id != handle.user_id {
                warn!(conn_id = %handle.id, claimed = %user_id, "Join for another account refused");
                return Some(OutboundEvent::error("Cannot join as another account"));
            }
            Some(OutboundEvent::Joined {
                user_id,
                role: handle.role,
            })
        }
        InboundMessage::JoinUserType { user_type } => {
            if user_type != handle.role {
                return Some(OutboundEvent::error("Cannot join another role group"));
            }
            if !registry.join_group(handle.user_id, user_type) {
                return Some(OutboundEvent::error("Connection is not registered"));
            }
            Some(OutboundEvent::Joined {
                user_id: handle.user_id,
                role: user_type,
            })
        }
        InboundMessage::Ping => Some(OutboundEvent::Pong {
            timestamp: Utc::now().timestamp_millis(),
        }),
        InboundMessage::Pong => None,
    }
}

/// Handles an established WebSocket connection.
async fn handle_ws_connection(state: AppState, ctx: RequestContext, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (handle, mut outbound_rx) = ConnectionHandle::channel(
        ctx.user_id,
        ctx.role,
        state.config.realtime.outbound_buffer,
    );
    let handle = Arc::new(handle);
    let conn_id = handle.id;
    state.registry.register(Arc::clone(&handle));

    info!(conn_id = %conn_id, user_id = %ctx.user_id, role = %ctx.role, "WebSocket connection established");

    let outbound_task = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    let mut heartbeat = tokio::spawn(run_heartbeat(
        Arc::clone(&handle),
        HeartbeatConfig::from_config(&state.config.realtime),
    ));

    loop {
        tokio::select! {
            frame = ws_rx.next() => {
                let Some(frame) = frame else { break };
                handle.touch();
                match frame {
                    Ok(Message::Text(text)) => {
                        if let Some(reply) = reply_to(&state.registry, &handle, text.as_str()) {
                            handle.send(&reply);
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    // Protocol pings are answered by axum.
                    Ok(_) => {}
                    Err(e) => {
                        warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }
            _ = &mut heartbeat => break,
        }
    }

    handle.mark_dead();
    heartbeat.abort();
    outbound_task.abort();
    state.registry.unregister(ctx.user_id, conn_id);

    info!(conn_id = %conn_id, user_id = %ctx.user_id, "WebSocket connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use dormhub_entity::account::Role;
    use uuid::Uuid;

    fn registered(role: Role) -> (DeliveryRegistry, Arc<ConnectionHandle>) {
        let registry = DeliveryRegistry::new();
        let (handle, _rx) = ConnectionHandle::channel(Uuid::new_v4(), role, 8);
        let handle = Arc::new(handle);
        registry.register(Arc::clone(&handle));
        (registry, handle)
    }

    #[test]
    fn test_join_as_self() {
        let (registry, handle) = registered(Role::Student);
        let frame = format!(r#"{{"type":"join","user_id":"{}"}}"#, handle.user_id);
        match reply_to(&registry, &handle, &frame) {
            Some(OutboundEvent::Joined { user_id, role }) => {
                assert_eq!(user_id, handle.user_id);
                assert_eq!(role, Role::Student);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn test_join_as_other_refused() {
        let (registry, handle) = registered(Role::Student);
        let frame = format!(r#"{{"type":"join","user_id":"{}"}}"#, Uuid::new_v4());
        assert!(matches!(
            reply_to(&registry, &handle, &frame),
            Some(OutboundEvent::Error { .. })
        ));
    }

    #[test]
    fn test_join_foreign_role_group_refused() {
        let (registry, handle) = registered(Role::Student);
        let frame = r#"{"type":"join_user_type","user_type":"admin"}"#;
        assert!(matches!(
            reply_to(&registry, &handle, frame),
            Some(OutboundEvent::Error { .. })
        ));
        assert!(!registry.group_members(Role::Admin).contains(&handle.user_id));
    }

    #[test]
    fn test_ping_gets_pong_and_pong_is_silent() {
        let (registry, handle) = registered(Role::Staff);
        assert!(matches!(
            reply_to(&registry, &handle, r#"{"type":"ping"}"#),
            Some(OutboundEvent::Pong { .. })
        ));
        assert!(reply_to(&registry, &handle, r#"{"type":"pong"}"#).is_none());
    }

    #[test]
    fn test_malformed_frame() {
        let (registry, handle) = registered(Role::Admin);
        assert!(matches!(
            reply_to(&registry, &handle, "not json"),
            Some(OutboundEvent::Error { .. })
        ));
    }
}
