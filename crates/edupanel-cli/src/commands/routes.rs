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
use edupanel_core::router::{RouteDescriptor, RouteTarget};
use edupanel_core::{Role, default_route};
use serde_json::json;

pub fn list_routes(ctx: &CommandContext) -> Result<()> {
    let descriptors = ctx.panel.routes().descriptors();

    if ctx.json {
        let rows: Vec<_> = descriptors
            .iter()
            .map(|d| {
                json!({
                    "pattern": d.pattern,
                    "target": d.target,
                    "public": d.public,
                    "roles": d.requirement.roles,
                    "permission": d.requirement.permission,
                    "menu_label": d.menu_label,
                })
            })
            .collect();
        return ctx.print_json(&rows);
    }

    println!("{:<40} {:<32} {:<8} {:<40}", "Pattern", "Target", "Public", "Access");
    println!("{}", "-".repeat(120));

    for descriptor in descriptors {
        println!("{:<40} {:<32} {:<8} {:<40}", descriptor.pattern, describe_target(descriptor), if descriptor.public { "yes" } else { "no" }, describe_access(descriptor));
    }

    Ok(())
}

pub fn resolve_role(ctx: &CommandContext, role: &str) -> Result<()> {
    let role: Role = role.parse()?;
    let path = default_route(Some(role));

    if ctx.json {
        return ctx.print_json(&json!({ "role": role, "path": path }));
    }

    println!("{path}");
    Ok(())
}

pub fn show_menu(ctx: &CommandContext) -> Result<()> {
    let entries = ctx.panel.menu();

    if ctx.json {
        return ctx.print_json(&entries);
    }

    if entries.is_empty() {
        println!("No menu entries; sign in first.");
        return Ok(());
    }

    for entry in entries {
        println!("{:<28} {}", entry.label, entry.path);
    }

    Ok(())
}

fn describe_target(descriptor: &RouteDescriptor) -> String {
    match descriptor.target {
        RouteTarget::View(view) => view.to_string(),
        RouteTarget::DefaultRoute => "-> default route".to_string(),
    }
}

fn describe_access(descriptor: &RouteDescriptor) -> String {
    if descriptor.public {
        return "-".to_string();
    }

    let roles = if descriptor.requirement.roles.is_empty() {
        "any authenticated".to_string()
    } else {
        descriptor.requirement.roles.iter().map(Role::as_str).collect::<Vec<_>>().join(", ")
    };

    match descriptor.requirement.permission {
        Some(permission) => format!("{roles} + {permission}"),
        None => roles,
    }
}
