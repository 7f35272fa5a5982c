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

use super::CommandContext;
use anyhow::Result;
use edupanel_core::{Layout, Navigation};
use serde_json::json;
use tracing::info;

pub async fn handle_navigate(ctx: &CommandContext, path: &str) -> Result<()> {
    let decision = ctx.panel.navigate(path).await;
    info!(path, state = decision.state.as_str(), pattern = decision.pattern, "Navigation decided");

    if ctx.json {
        return ctx.print_json(&json!({
            "requested": decision.requested,
            "pattern": decision.pattern,
            "state": decision.state,
            "navigation": decision.navigation,
            "authorization": decision.authorization,
        }));
    }

    match &decision.navigation {
        Navigation::Pending => println!("{} waiting for session", decision.state.as_str()),
        Navigation::Render { view, layout, params } => {
            let layout = match layout {
                Layout::Public => "public",
                Layout::Authenticated => "authenticated",
            };
            println!("{} render {view} ({layout} layout)", decision.state.as_str());
            for (name, value) in params {
                println!("  {name} = {value}");
            }
        }
        Navigation::Redirect { to, from } => match from {
            Some(from) => println!("{} redirect {to} (from {from})", decision.state.as_str()),
            None => println!("{} redirect {to}", decision.state.as_str()),
        },
    }

    Ok(())
}
