//! Webhook receiver
//!
//! Always answers 200; the chat platform retries non-2xx responses and a
//! failing command must not be redelivered forever.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use inventory_bot_core::dto::reply::Reply;

use crate::models::Update;
use crate::state::AppState;
use crate::{callbacks, commands};

pub async fn handle_update(State(state): State<AppState>, Json(update): Json<Update>) -> StatusCode {
    if let Some(message) = update.message {
        let (Some(from), Some(text)) = (message.from, message.text) else {
            return StatusCode::OK;
        };
        let chat_id = message.chat.id;
        let replies =
            commands::dispatch_message(&state, from.id, &from.display_name(), chat_id, &text).await;
        send_all(&state, chat_id, replies).await;
    } else if let Some(callback) = update.callback_query {
        let Some(token) = callback.data else {
            return StatusCode::OK;
        };
        let chat_id = callback
            .message
            .as_ref()
            .map(|message| message.chat.id)
            .unwrap_or(callback.from.id);
        let replies = callbacks::dispatch_callback(
            &state,
            callback.from.id,
            &callback.from.display_name(),
            chat_id,
            &token,
        )
        .await;
        send_all(&state, chat_id, replies).await;
    }

    StatusCode::OK
}

async fn send_all(state: &AppState, chat_id: i64, replies: Vec<Reply>) {
    for reply in replies {
        if let Err(e) = state.transport.send(chat_id, reply).await {
            tracing::error!("Failed to send reply to chat {}: {}", chat_id, e);
        }
    }
}

pub async fn health() -> &'static str {
    "OK"
}
