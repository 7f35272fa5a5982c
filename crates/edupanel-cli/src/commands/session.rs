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
use edupanel_core::Session;
use serde_json::json;

pub async fn handle_login(ctx: &CommandContext, email: &str, password: &str, from: Option<&str>) -> Result<()> {
    let outcome = ctx.panel.login(email, password, from).await?;

    if ctx.json {
        return ctx.print_json(&json!({
            "user": outcome.session,
            "redirect_to": outcome.redirect_to,
        }));
    }

    println!("Signed in as {}", describe(&outcome.session));
    println!("Next: {}", outcome.redirect_to);
    Ok(())
}

pub async fn handle_logout(ctx: &CommandContext) -> Result<()> {
    let navigation = ctx.panel.logout().await;
    let to = navigation.redirect_target().unwrap_or_default();

    if ctx.json {
        return ctx.print_json(&json!({ "redirect_to": to }));
    }

    println!("Signed out");
    println!("Next: {to}");
    Ok(())
}

pub fn handle_whoami(ctx: &CommandContext) -> Result<()> {
    let session = ctx.panel.session();

    if ctx.json {
        return ctx.print_json(&json!({
            "user": session,
            "bootstrap": ctx.panel.start().label(),
            "storage": ctx.config.storage_path,
        }));
    }

    match session {
        Some(session) => {
            println!("{}", describe(&session));
            println!("  ID:    {}", session.id);
            println!("  Email: {}", session.email);
            println!("  Role:  {}", session.role.map(|r| r.display_name()).unwrap_or("(none)"));
        }
        None => println!("Not signed in ({})", ctx.panel.start().label()),
    }

    Ok(())
}

fn describe(session: &Session) -> String {
    let name = if session.name.is_empty() { session.email.as_str() } else { session.name.as_str() };
    match session.role {
        Some(role) => format!("{name} [{role}]"),
        None => format!("{name} [no role]"),
    }
}
