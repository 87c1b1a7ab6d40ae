//! User roles and command permissions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a chat user, looked up from the catalogue's user table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Staff,
    #[default]
    Viewer,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UserRole::Admin => "Admin",
            UserRole::Staff => "Staff",
            UserRole::Viewer => "Viewer",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "staff" => Ok(UserRole::Staff),
            "viewer" => Ok(UserRole::Viewer),
            _ => Err(format!("Unknown user role: {}", s)),
        }
    }
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Staff)
    }

    /// Check if this role can execute a verb-first command
    pub fn can_execute(&self, command: &str) -> bool {
        match command {
            "help" | "whoami" | "stock" | "find" | "onhand" => true,
            "in" | "out" | "preview" | "inventory" => self.is_staff(),
            "adjust" | "approve" | "reject" | "void" => self.is_admin(),
            _ => false,
        }
    }
}

/// The user behind an inbound command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requester {
    pub user_id: i64,
    pub user_name: String,
    pub chat_id: i64,
    pub role: UserRole,
}
