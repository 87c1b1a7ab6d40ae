//! Chat transport trait

use async_trait::async_trait;

use crate::dto::reply::Reply;
use shared_error::AppError;

/// Outbound seam to the chat platform. Message bodies are plain text; the
/// transport renders button rows however the platform requires and returns
/// callback tokens verbatim.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, chat_id: i64, reply: Reply) -> Result<(), AppError>;
}
