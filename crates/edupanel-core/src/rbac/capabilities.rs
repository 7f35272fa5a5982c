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

//! Capability table: which views each role can navigate to
//!
//! Derived from the route table once, so menus and route guards can never
//! disagree about what a role may open.

use crate::rbac::policy::authorize_role;
use crate::rbac::roles::Role;
use crate::router::{RouteTable, RouteTarget, ViewId};
use serde::Serialize;
use std::collections::HashMap;

/// One navigable entry in a role's menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub label: &'static str,
    pub path: &'static str,
    pub view: ViewId,
}

/// Role to ordered list of allowed views
#[derive(Debug, Clone, Default)]
pub struct CapabilityTable {
    menus: HashMap<Role, Vec<MenuEntry>>,
}

impl CapabilityTable {
    /// Collect every labelled, parameter-free route each role is authorized for,
    /// in declaration order
    pub fn from_routes(table: &RouteTable) -> Self {
        let menus = Role::ALL
            .into_iter()
            .map(|role| {
                let entries = table
                    .descriptors()
                    .iter()
                    .filter(|d| !d.public && !d.pattern.contains(':'))
                    .filter(|d| authorize_role(Some(role), &d.requirement).is_granted())
                    .filter_map(|d| match (d.menu_label, d.target) {
                        (Some(label), RouteTarget::View(view)) => Some(MenuEntry { label, path: d.pattern, view }),
                        _ => None,
                    })
                    .collect();
                (role, entries)
            })
            .collect();

        Self { menus }
    }

    /// Menu for a role; empty without a valid role
    pub fn menu(&self, role: Option<Role>) -> &[MenuEntry] {
        role.and_then(|role| self.menus.get(&role)).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn can_open(&self, role: Option<Role>, view: ViewId) -> bool {
        self.menu(role).iter().any(|entry| entry.view == view)
    }
}
