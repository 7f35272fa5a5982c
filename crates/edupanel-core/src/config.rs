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

//! Configuration management for the access layer

use crate::error::{AccessError, AccessResult};
use std::env;
use std::path::PathBuf;

const DEFAULT_JWT_SECRET: &str = "default-secret-change-in-production";

/// Configuration for the access layer
#[derive(Debug, Clone)]
pub struct Config {
    /// File backing the persisted session keys (CLI host only)
    pub storage_path: Option<PathBuf>,

    /// JWT secret used by the in-memory authentication backend
    pub jwt_secret: String,

    /// Issuer written into issued tokens
    pub token_issuer: String,

    /// Lifetime of issued tokens in seconds
    pub token_ttl_secs: i64,

    /// Maximum number of access decisions kept in the audit log
    pub audit_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: None,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_issuer: "edupanel".to_string(),
            token_ttl_secs: 24 * 60 * 60,
            audit_capacity: 1000,
        }
    }
}

impl Config {
    /// Override fields whose `EDUPANEL_*` variable is set
    ///
    /// Unparseable numeric values keep the current setting.
    pub fn apply_env(&mut self) {
        if let Ok(path) = env::var("EDUPANEL_STORAGE_PATH") {
            self.storage_path = Some(PathBuf::from(path));
        }

        if let Ok(secret) = env::var("EDUPANEL_JWT_SECRET") {
            self.jwt_secret = secret;
        }

        if let Ok(issuer) = env::var("EDUPANEL_TOKEN_ISSUER") {
            self.token_issuer = issuer;
        }

        self.token_ttl_secs = env::var("EDUPANEL_TOKEN_TTL_SECS").map(|v| v.parse().unwrap_or(self.token_ttl_secs)).unwrap_or(self.token_ttl_secs);

        self.audit_capacity = env::var("EDUPANEL_AUDIT_CAPACITY").map(|v| v.parse().unwrap_or(self.audit_capacity)).unwrap_or(self.audit_capacity);
    }

    /// Reject values the panel cannot run with
    pub fn validate(&self) -> AccessResult<()> {
        if self.jwt_secret.is_empty() {
            return Err(AccessError::InvalidConfig {
                message: "jwt_secret must not be empty".to_string(),
            });
        }

        if self.token_ttl_secs <= 0 {
            return Err(AccessError::InvalidConfig {
                message: format!("token_ttl_secs must be positive, got {}", self.token_ttl_secs),
            });
        }

        if self.audit_capacity == 0 {
            return Err(AccessError::InvalidConfig {
                message: "audit_capacity must be at least 1".to_string(),
            });
        }

        if self.jwt_secret == DEFAULT_JWT_SECRET {
            tracing::warn!("Using the default JWT secret; set EDUPANEL_JWT_SECRET outside development");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.token_ttl_secs, 86_400);
        assert!(config.storage_path.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            token_ttl_secs: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(AccessError::InvalidConfig { .. })));

        let config = Config {
            jwt_secret: String::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            audit_capacity: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
