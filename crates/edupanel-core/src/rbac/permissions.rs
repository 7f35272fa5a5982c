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

//! Permission definitions and the role grant table

use crate::error::AccessError;
use crate::rbac::roles::Role;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named capability checked by routes and views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewDashboard,
    ManageOffices,
    ManageSettings,
    ManageStaff,
    ViewLeads,
    CreateLeads,
    ManageLeads,
    AssignLeads,
    ViewAppointments,
    ManageAppointments,
    ViewApplications,
    ManageApplications,
    ReviewApplications,
    ViewOwnApplications,
    UploadDocuments,
    ViewReports,
}

impl Permission {
    pub const ALL: [Permission; 16] = [
        Permission::ViewDashboard,
        Permission::ManageOffices,
        Permission::ManageSettings,
        Permission::ManageStaff,
        Permission::ViewLeads,
        Permission::CreateLeads,
        Permission::ManageLeads,
        Permission::AssignLeads,
        Permission::ViewAppointments,
        Permission::ManageAppointments,
        Permission::ViewApplications,
        Permission::ManageApplications,
        Permission::ReviewApplications,
        Permission::ViewOwnApplications,
        Permission::UploadDocuments,
        Permission::ViewReports,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewDashboard => "view_dashboard",
            Permission::ManageOffices => "manage_offices",
            Permission::ManageSettings => "manage_settings",
            Permission::ManageStaff => "manage_staff",
            Permission::ViewLeads => "view_leads",
            Permission::CreateLeads => "create_leads",
            Permission::ManageLeads => "manage_leads",
            Permission::AssignLeads => "assign_leads",
            Permission::ViewAppointments => "view_appointments",
            Permission::ManageAppointments => "manage_appointments",
            Permission::ViewApplications => "view_applications",
            Permission::ManageApplications => "manage_applications",
            Permission::ReviewApplications => "review_applications",
            Permission::ViewOwnApplications => "view_own_applications",
            Permission::UploadDocuments => "upload_documents",
            Permission::ViewReports => "view_reports",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|permission| permission.as_str() == s)
            .ok_or_else(|| AccessError::UnknownPermission(s.to_string()))
    }
}

/// Permissions granted to a role by default
///
/// Super admins hold every permission through the override in
/// [`crate::rbac::policy::authorize_role`], so their slice here lists only the
/// permissions no other role has.
pub fn default_grants(role: Role) -> &'static [Permission] {
    use Permission::*;

    match role {
        Role::SuperAdmin => &[ManageOffices, ManageSettings],
        Role::Manager => &[
            ViewDashboard,
            ManageStaff,
            ViewLeads,
            ManageLeads,
            AssignLeads,
            ViewAppointments,
            ManageAppointments,
            ViewApplications,
            ReviewApplications,
            ViewReports,
        ],
        Role::Consultant => &[
            ViewDashboard,
            ViewLeads,
            ManageLeads,
            ViewAppointments,
            ManageAppointments,
            ViewApplications,
            ManageApplications,
        ],
        Role::Receptionist => &[ViewDashboard, ViewLeads, CreateLeads, ViewAppointments, ManageAppointments],
        Role::Student => &[ViewDashboard, ViewOwnApplications, ViewAppointments, UploadDocuments],
    }
}

/// Check a permission by name
///
/// Unknown permission names and an absent role resolve to `false`.
pub fn has_permission(role: Option<Role>, permission_name: &str) -> bool {
    match permission_name.parse::<Permission>() {
        Ok(permission) => crate::rbac::policy::role_has_permission(role, permission),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_names_round_trip() {
        for permission in Permission::ALL {
            assert_eq!(permission.as_str().parse::<Permission>().unwrap(), permission);
        }
        assert!("delete_everything".parse::<Permission>().is_err());
    }

    #[test]
    fn test_has_permission_by_name() {
        assert!(has_permission(Some(Role::Manager), "manage_staff"));
        assert!(has_permission(Some(Role::Receptionist), "create_leads"));
        assert!(!has_permission(Some(Role::Student), "manage_staff"));
        assert!(!has_permission(Some(Role::Consultant), "manage_offices"));
    }

    #[test]
    fn test_has_permission_fails_closed() {
        assert!(!has_permission(None, "view_dashboard"));
        assert!(!has_permission(Some(Role::Manager), "unknown_permission"));
        assert!(!has_permission(Some(Role::SuperAdmin), "unknown_permission"));
        assert!(!has_permission(Some(Role::Manager), ""));
    }

    #[test]
    fn test_super_admin_holds_every_permission() {
        for permission in Permission::ALL {
            assert!(has_permission(Some(Role::SuperAdmin), permission.as_str()));
        }
    }

    #[test]
    fn test_super_admin_grants_come_from_the_policy_override() {
        use crate::rbac::policy::{Authorization, Requirement, authorize_role};

        assert!(!default_grants(Role::SuperAdmin).contains(&Permission::ViewDashboard));
        assert_eq!(authorize_role(Some(Role::SuperAdmin), &Requirement::permission(Permission::ViewDashboard)), Authorization::Granted);
    }

    #[test]
    fn test_every_role_can_view_a_dashboard() {
        for role in Role::ALL {
            assert!(has_permission(Some(role), "view_dashboard"), "{role} cannot view a dashboard");
        }
    }
}
