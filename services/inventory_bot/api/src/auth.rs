//! Authorization checks for inbound commands

use std::sync::Arc;

use inventory_bot_core::domains::user::UserRole;
use inventory_bot_core::services::catalogue::CatalogueStore;
use shared_error::AppError;

/// Chat allow-list and role lookup through the catalogue's user table
pub struct AuthService {
    catalogue: Arc<dyn CatalogueStore>,
    allowed_chat_ids: Vec<i64>,
}

impl AuthService {
    pub fn new(catalogue: Arc<dyn CatalogueStore>, allowed_chat_ids: Vec<i64>) -> Self {
        Self {
            catalogue,
            allowed_chat_ids,
        }
    }

    /// An empty allow-list admits every chat
    pub fn is_chat_allowed(&self, chat_id: i64) -> bool {
        self.allowed_chat_ids.is_empty() || self.allowed_chat_ids.contains(&chat_id)
    }

    /// Role lookup; lookup failures degrade to viewer
    pub async fn get_user_role(&self, user_id: i64) -> UserRole {
        match self.catalogue.get_user_role(user_id).await {
            Ok(role) => role,
            Err(e) => {
                tracing::error!("Error getting user role for {}: {}", user_id, e);
                UserRole::Viewer
            },
        }
    }

    /// Validate chat and command permission, returning the resolved role
    pub async fn validate_access(
        &self,
        user_id: i64,
        chat_id: i64,
        command: &str,
    ) -> Result<UserRole, AppError> {
        if !self.is_chat_allowed(chat_id) {
            return Err(AppError::Forbidden(
                "This chat is not authorized to use the bot.".to_string(),
            ));
        }

        let role = self.get_user_role(user_id).await;
        if !role.can_execute(command) {
            return Err(AppError::Forbidden(format!(
                "You don't have permission to use {}.",
                command
            )));
        }
        Ok(role)
    }
}
