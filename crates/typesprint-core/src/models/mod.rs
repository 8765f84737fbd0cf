//! Data models shared by the typesprint client and server.
//!
//! This module contains the wire types exchanged over the REST API:
//!
//! - `User`, `LoginRequest`, `RegisterRequest`, `AuthResponse`: accounts and sessions
//! - `Text`: source passages handed out for a typing test
//! - `NewResult`, `ResultRecord`: submitted typing results and history entries
//!
//! All types serialize with camelCase field names. With the `ts` feature
//! enabled they also derive `ts_rs::TS` so a web front end can share them.

pub mod result;
pub mod text;
pub mod user;

use serde::{Deserialize, Serialize};

pub use result::{NewResult, ResultRecord};
pub use text::Text;
pub use user::{AuthResponse, LoginRequest, RegisterRequest, User};

/// Generic acknowledgement body (`{"success": true, "message": "..."}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
