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

//! Role definitions
//!
//! Roles form a closed set known at compile time. Anything read from outside
//! the process (stored user records, backend responses, CLI arguments) goes
//! through [`Role::from_str`] or [`deserialize_lenient_role`], so an unknown
//! name never turns into a role.

use crate::error::AccessError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Actor category determining navigation and access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Manager,
    Consultant,
    Receptionist,
    Student,
}

impl Role {
    /// Every role, in registry order
    pub const ALL: [Role; 5] = [Role::SuperAdmin, Role::Manager, Role::Consultant, Role::Receptionist, Role::Student];

    /// Wire identifier (`super_admin`, `manager`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Manager => "manager",
            Role::Consultant => "consultant",
            Role::Receptionist => "receptionist",
            Role::Student => "student",
        }
    }

    /// Path segment used for this role's section of the panel
    pub fn slug(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super-admin",
            Role::Manager => "manager",
            Role::Consultant => "consultant",
            Role::Receptionist => "receptionist",
            Role::Student => "student",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "Super Admin",
            Role::Manager => "Manager",
            Role::Consultant => "Consultant",
            Role::Receptionist => "Receptionist",
            Role::Student => "Student",
        }
    }

    /// Whether this role bypasses every role and permission check
    pub fn is_super_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AccessError;

    /// Accepts the wire identifier or the path slug
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s || role.slug() == s)
            .ok_or_else(|| AccessError::UnknownRole(s.to_string()))
    }
}

/// Deserialize an optional role, mapping unknown or malformed values to `None`
///
/// Used for persisted user records: a record with a bad role still loads, but
/// the resulting session carries no role and is denied everything.
pub fn deserialize_lenient_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(serde_json::Value::as_str).and_then(|s| s.parse().ok()))
}
