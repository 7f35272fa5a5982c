// Edupanel
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Error types for the access layer
//!
//! The route guard and the session bootstrapper never fail: they recover by
//! redirecting or by clearing state. These errors cover the remaining fallible
//! surfaces (storage, route table construction, token issuing, configuration
//! and the authentication backend).

use thiserror::Error;

/// Access layer error types
#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Invalid route table: {message}")]
    InvalidRouteTable { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Unknown permission: {0}")]
    UnknownPermission(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Router error: {0}")]
    RouterError(String),
}

impl AccessError {
    /// Get the error type identifier
    pub fn error_type(&self) -> &'static str {
        match self {
            AccessError::Unauthorized { .. } => "unauthorized",
            AccessError::Forbidden { .. } => "forbidden",
            AccessError::InvalidRouteTable { .. } => "invalid_route_table",
            AccessError::InvalidConfig { .. } => "invalid_config",
            AccessError::Storage { .. } => "storage_error",
            AccessError::UnknownRole(_) => "unknown_role",
            AccessError::UnknownPermission(_) => "unknown_permission",
            AccessError::JwtError(_) => "jwt_error",
            AccessError::SerdeJsonError(_) => "json_error",
            AccessError::IoError(_) => "io_error",
            AccessError::RouterError(_) => "router_error",
        }
    }

    /// Whether the error came from rejected credentials rather than a fault
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, AccessError::Unauthorized { .. } | AccessError::Forbidden { .. })
    }
}

/// Result type for access layer operations
pub type AccessResult<T> = Result<T, AccessError>;

impl From<matchit::InsertError> for AccessError {
    fn from(err: matchit::InsertError) -> Self {
        AccessError::RouterError(err.to_string())
    }
}
