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

use anyhow::Result;
use edupanel_core::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings read from the optional TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub storage_path: Option<PathBuf>,
    pub jwt_secret: Option<String>,
    pub token_issuer: Option<String>,
    pub token_ttl_secs: Option<i64>,
    pub audit_capacity: Option<usize>,
    pub log_filter: Option<String>,
}

impl FileConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Fully resolved CLI settings
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub panel: Config,
    pub storage_path: PathBuf,
    pub log_filter: String,
}

impl CliConfig {
    /// Layer defaults, the TOML file, `EDUPANEL_*` variables and flags, in
    /// increasing precedence
    pub fn resolve(cli_config: Option<PathBuf>, cli_storage: Option<PathBuf>) -> Result<Self> {
        let file = if let Some(config_path) = cli_config {
            FileConfig::load_from_file(config_path)?
        } else if let Ok(env_config) = std::env::var("EDUPANEL_CONFIG") {
            FileConfig::load_from_file(env_config)?
        } else {
            FileConfig::default()
        };

        let mut panel = Config::default();
        if let Some(path) = file.storage_path.clone() {
            panel.storage_path = Some(path);
        }
        if let Some(secret) = file.jwt_secret.clone() {
            panel.jwt_secret = secret;
        }
        if let Some(issuer) = file.token_issuer.clone() {
            panel.token_issuer = issuer;
        }
        if let Some(ttl) = file.token_ttl_secs {
            panel.token_ttl_secs = ttl;
        }
        if let Some(capacity) = file.audit_capacity {
            panel.audit_capacity = capacity;
        }

        panel.apply_env();

        if let Some(path) = cli_storage {
            panel.storage_path = Some(path);
        }

        let storage_path = panel.storage_path.clone().unwrap_or_else(default_storage_path);
        panel.storage_path = Some(storage_path.clone());
        panel.validate()?;

        let log_filter = std::env::var("RUST_LOG").ok().or(file.log_filter).unwrap_or_else(|| "info".to_string());

        Ok(Self {
            panel,
            storage_path,
            log_filter,
        })
    }
}

/// `<data dir>/edupanel/storage.json`, falling back to the working directory
fn default_storage_path() -> PathBuf {
    dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")).join("edupanel").join("storage.json")
}
