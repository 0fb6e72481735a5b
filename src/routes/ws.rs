//! WebSocket upgrade + session loop. Each connection owns one `MapSurface`.
//! Client triggers are forwarded to the surface; every transition it emits
//! (including timer-driven verdicts and resets) is pushed back as a snapshot.
//! When the socket goes away the surface is dropped, which cancels its timers.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;
use crate::surface::{MapSurface, SessionError};

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "questmap_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state), fields(conn = %Uuid::new_v4()))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "questmap_backend", "WebSocket connected");
  let surface = state.new_surface();
  let mut events = surface.subscribe();

  loop {
    let reply = tokio::select! {
      incoming = socket.recv() => match incoming {
        Some(Ok(Message::Text(txt))) => match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(msg) => {
            debug!(target: "questmap_backend", "WS received: {:?}", &msg);
            handle_client_ws(msg, &surface)
          }
          Err(e) => Some(ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }),
        },
        Some(Ok(Message::Ping(payload))) => {
          let _ = socket.send(Message::Pong(payload)).await;
          None
        }
        Some(Ok(Message::Close(_))) | None => break,
        Some(Ok(_)) => None,
        Some(Err(e)) => {
          warn!(target: "questmap_backend", error = %e, "WS receive error");
          break;
        }
      },
      event = events.recv() => match event {
        Ok(ev) => Some(ServerWsMessage::Session { cause: ev.cause, session: ev.session }),
        Err(RecvError::Lagged(n)) => {
          warn!(target: "questmap_backend", skipped = n, "WS client lagging behind session events");
          None
        }
        // The sender lives inside `surface`, which outlives this loop.
        Err(RecvError::Closed) => break,
      },
    };

    let Some(reply) = reply else { continue };
    let out = serde_json::to_string(&reply).unwrap_or_else(|e| {
      serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
    });
    if let Err(e) = socket.send(Message::Text(out)).await {
      error!(target: "questmap_backend", error = %e, "WS send error");
      break;
    }
  }

  drop(surface);
  info!(target: "questmap_backend", "WebSocket disconnected");
}

/// Apply one client trigger. Successful transitions answer through the event
/// stream, so only pongs and errors are returned here.
fn handle_client_ws(msg: ClientWsMessage, surface: &MapSurface) -> Option<ServerWsMessage> {
  let result: Result<(), SessionError> = match msg {
    ClientWsMessage::Ping => return Some(ServerWsMessage::Pong),
    ClientWsMessage::SelectChallenge { challenge_id } => surface.select_challenge(challenge_id).map(drop),
    ClientWsMessage::Start => surface.start().map(drop),
    ClientWsMessage::Cancel => surface.cancel().map(drop),
    ClientWsMessage::Submit { evidence } => surface.submit(evidence).map(drop),
    ClientWsMessage::Close => {
      surface.close();
      Ok(())
    }
  };
  match result {
    Ok(()) => None,
    Err(e) => {
      debug!(target: "session", error = %e, "Trigger rejected");
      Some(ServerWsMessage::Error { message: e.to_string() })
    }
  }
}

#[cfg(test)]
mod tests {
  use base64::{engine::general_purpose::STANDARD, Engine as _};
  use serde_json::json;

  use super::*;
  use crate::config::AppConfig;

  fn surface() -> MapSurface {
    AppState::from_config(AppConfig::default()).new_surface()
  }

  fn parse(v: serde_json::Value) -> ClientWsMessage {
    serde_json::from_value(v).unwrap()
  }

  #[tokio::test(start_paused = true)]
  async fn client_messages_drive_the_surface() {
    let surface = surface();
    assert!(matches!(handle_client_ws(parse(json!({"type": "ping"})), &surface), Some(ServerWsMessage::Pong)));
    assert!(handle_client_ws(parse(json!({"type": "select_challenge", "challengeId": 7})), &surface).is_none());
    assert!(handle_client_ws(parse(json!({"type": "start"})), &surface).is_none());

    let submit = json!({
      "type": "submit",
      "evidence": {
        "photos": [{"name": "rice.jpg", "data": STANDARD.encode(b"jpeg")}],
        "timeSpentMinutes": 40,
        "rating": 5,
        "review": "Chicken rice was perfect"
      }
    });
    assert!(handle_client_ws(parse(submit), &surface).is_none());
    assert!(surface.snapshot().form_visible);
  }

  #[tokio::test(start_paused = true)]
  async fn rejected_triggers_come_back_as_errors() {
    let surface = surface();
    match handle_client_ws(parse(json!({"type": "start"})), &surface) {
      Some(ServerWsMessage::Error { message }) => assert_eq!(message, "No challenge is selected"),
      other => panic!("expected error, got {:?}", other),
    }
    handle_client_ws(parse(json!({"type": "select_challenge", "challengeId": 7})), &surface);
    handle_client_ws(parse(json!({"type": "start"})), &surface);
    let empty_submit = json!({"type": "submit", "evidence": {}});
    match handle_client_ws(parse(empty_submit), &surface) {
      Some(ServerWsMessage::Error { message }) => assert_eq!(message, "Missing required field: photos"),
      other => panic!("expected error, got {:?}", other),
    }
  }

  #[test]
  fn session_messages_serialize_with_type_tag() {
    let msg = ServerWsMessage::Session {
      cause: crate::surface::Cause::Selected,
      session: crate::surface::SessionSnapshot {
        selected_challenge: Some(4),
        form_visible: false,
        verdict_state: crate::surface::VerdictState::Pending,
      },
    };
    let v = serde_json::to_value(&msg).unwrap();
    assert_eq!(
      v,
      json!({
        "type": "session",
        "cause": "selected",
        "session": {"selectedChallenge": 4, "formVisible": false, "verdictState": "pending"}
      })
    );
  }
}
