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

//! The single authorization primitive
//!
//! Every role or permission decision in the crate goes through
//! [`authorize`]. The super-admin override lives here and nowhere else.

use crate::rbac::permissions::{Permission, default_grants};
use crate::rbac::roles::Role;
use crate::session::Session;
use serde::Serialize;

/// What a route or action demands of the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Requirement {
    /// Roles allowed through; empty means any authenticated role
    pub roles: &'static [Role],

    /// Permission that must additionally be held
    pub permission: Option<Permission>,
}

impl Requirement {
    /// Any session with a valid role
    pub const fn any_authenticated() -> Self {
        Self { roles: &[], permission: None }
    }

    pub const fn roles(roles: &'static [Role]) -> Self {
        Self { roles, permission: None }
    }

    pub const fn permission(permission: Permission) -> Self {
        Self {
            roles: &[],
            permission: Some(permission),
        }
    }

    pub const fn with_permission(mut self, permission: Permission) -> Self {
        self.permission = Some(permission);
        self
    }
}

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum Authorization {
    Granted,
    NoSession,
    /// A session exists but its role is missing or unrecognised
    NoRole,
    RoleNotPermitted { role: Role },
    MissingPermission { role: Role, permission: Permission },
}

impl Authorization {
    pub fn is_granted(&self) -> bool {
        matches!(self, Authorization::Granted)
    }
}

/// Evaluate a requirement against a role
pub fn authorize_role(role: Option<Role>, requirement: &Requirement) -> Authorization {
    let Some(role) = role else {
        return Authorization::NoRole;
    };

    if role.is_super_admin() {
        return Authorization::Granted;
    }

    if !requirement.roles.is_empty() && !requirement.roles.contains(&role) {
        return Authorization::RoleNotPermitted { role };
    }

    if let Some(permission) = requirement.permission {
        if !default_grants(role).contains(&permission) {
            return Authorization::MissingPermission { role, permission };
        }
    }

    Authorization::Granted
}

/// Evaluate a requirement against the current session
pub fn authorize(session: Option<&Session>, requirement: &Requirement) -> Authorization {
    match session {
        Some(session) => authorize_role(session.role, requirement),
        None => Authorization::NoSession,
    }
}

pub fn is_authorized(session: Option<&Session>, requirement: &Requirement) -> bool {
    authorize(session, requirement).is_granted()
}

pub(crate) fn role_has_permission(role: Option<Role>, permission: Permission) -> bool {
    authorize_role(role, &Requirement::permission(permission)).is_granted()
}
