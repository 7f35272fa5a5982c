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

pub mod navigate;
pub mod routes;
pub mod session;

use crate::config::CliConfig;
use anyhow::Result;
use edupanel_core::Panel;
use edupanel_core::backend::InMemoryAuthBackend;
use edupanel_core::session::FileStorage;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

pub struct CommandContext {
    pub config: CliConfig,
    pub panel: Panel,
    pub json: bool,
}

impl CommandContext {
    /// Build the panel over the storage file and rehydrate the stored session
    pub fn new(config: CliConfig, json: bool) -> Result<Self> {
        if let Some(parent) = config.storage_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let storage = Arc::new(FileStorage::new(config.storage_path.clone()));
        let backend = Arc::new(InMemoryAuthBackend::with_demo_accounts(&config.panel));
        let panel = Panel::new(&config.panel, storage, backend)?;

        let outcome = panel.start();
        debug!(outcome = outcome.label(), storage = %config.storage_path.display(), "Session bootstrap finished");

        Ok(Self { config, panel, json })
    }

    /// Print `value` as pretty JSON
    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}
