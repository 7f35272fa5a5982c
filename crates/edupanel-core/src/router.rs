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

//! Route table and default route resolution
//!
//! Descriptors are declared once, in [`standard_routes`], and never change at
//! runtime. Matching prefers static segments over `:param` segments and only
//! falls back to the `*` catch-all, which must be declared last, when nothing
//! else matches.

use crate::error::{AccessError, AccessResult};
use crate::rbac::permissions::Permission;
use crate::rbac::policy::Requirement;
use crate::rbac::roles::Role;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Public sign-in page
pub const LOGIN_PATH: &str = "/login";

/// Page explaining a role denial
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

const CATCH_ALL: &str = "*";

/// Canonical landing path for a role
///
/// This is the only role-to-landing mapping in the crate. The root redirect
/// and the post-login redirect both call it.
pub fn default_route(role: Option<Role>) -> &'static str {
    match role {
        None => LOGIN_PATH,
        Some(Role::SuperAdmin) => "/super-admin/dashboard",
        Some(Role::Manager) => "/manager/dashboard",
        Some(Role::Consultant) => "/consultant/dashboard",
        Some(Role::Receptionist) => "/receptionist/dashboard",
        Some(Role::Student) => "/student/dashboard",
    }
}

/// Identifier of the view a route renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ViewId(pub &'static str);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// What a route resolves to once access is settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "view")]
pub enum RouteTarget {
    View(ViewId),
    /// Send the actor to [`default_route`] for their role
    DefaultRoute,
}

/// Static binding of a path pattern to a target and an access policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub pattern: &'static str,
    pub target: RouteTarget,
    pub requirement: Requirement,
    /// Bypasses authentication entirely
    pub public: bool,
    /// Label when the route appears in the navigation menu
    pub menu_label: Option<&'static str>,
}

impl RouteDescriptor {
    pub const fn public(pattern: &'static str, view: &'static str) -> Self {
        Self {
            pattern,
            target: RouteTarget::View(ViewId(view)),
            requirement: Requirement::any_authenticated(),
            public: true,
            menu_label: None,
        }
    }

    /// Route open to any authenticated role
    pub const fn authenticated(pattern: &'static str, view: &'static str) -> Self {
        Self {
            pattern,
            target: RouteTarget::View(ViewId(view)),
            requirement: Requirement::any_authenticated(),
            public: false,
            menu_label: None,
        }
    }

    pub const fn guarded(pattern: &'static str, view: &'static str, roles: &'static [Role]) -> Self {
        Self {
            pattern,
            target: RouteTarget::View(ViewId(view)),
            requirement: Requirement::roles(roles),
            public: false,
            menu_label: None,
        }
    }

    /// Public route forwarding to the actor's default route
    pub const fn redirect_to_default(pattern: &'static str) -> Self {
        Self {
            pattern,
            target: RouteTarget::DefaultRoute,
            requirement: Requirement::any_authenticated(),
            public: true,
            menu_label: None,
        }
    }

    pub const fn catch_all() -> Self {
        Self::redirect_to_default(CATCH_ALL)
    }

    pub const fn with_permission(mut self, permission: Permission) -> Self {
        self.requirement = self.requirement.with_permission(permission);
        self
    }

    pub const fn in_menu(mut self, label: &'static str) -> Self {
        self.menu_label = Some(label);
        self
    }

    pub fn is_catch_all(&self) -> bool {
        self.pattern == CATCH_ALL
    }
}

/// Result of matching a concrete path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub descriptor: &'a RouteDescriptor,
    /// Normalized path that was matched
    pub path: String,
    /// Values bound to `:param` segments, in pattern order
    pub params: Vec<(String, String)>,
}

impl RouteMatch<'_> {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }
}

/// Immutable, validated set of route descriptors
pub struct RouteTable {
    descriptors: Vec<RouteDescriptor>,
    router: matchit::Router<usize>,
    catch_all: usize,
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable").field("descriptors", &self.descriptors.len()).field("catch_all", &self.catch_all).finish()
    }
}

impl RouteTable {
    /// Validate descriptors and build the matcher
    ///
    /// Fails when the catch-all is missing, duplicated or not last, when a
    /// pattern is not absolute, or when two patterns conflict.
    pub fn new(descriptors: Vec<RouteDescriptor>) -> AccessResult<Self> {
        let catch_alls: Vec<usize> = descriptors.iter().enumerate().filter(|(_, d)| d.is_catch_all()).map(|(i, _)| i).collect();

        let catch_all = match catch_alls.as_slice() {
            [index] if *index + 1 == descriptors.len() => *index,
            [] => {
                return Err(AccessError::InvalidRouteTable {
                    message: "route table has no catch-all".to_string(),
                });
            }
            [_] => {
                return Err(AccessError::InvalidRouteTable {
                    message: "catch-all must be the last route".to_string(),
                });
            }
            _ => {
                return Err(AccessError::InvalidRouteTable {
                    message: format!("route table has {} catch-all routes", catch_alls.len()),
                });
            }
        };

        let mut router = matchit::Router::new();
        for (index, descriptor) in descriptors.iter().enumerate().filter(|(i, _)| *i != catch_all) {
            router.insert(to_matcher_syntax(descriptor.pattern)?, index)?;
        }

        debug!(routes = descriptors.len(), "Route table built");

        Ok(Self {
            descriptors,
            router,
            catch_all,
        })
    }

    /// The panel's built-in routes
    pub fn standard() -> AccessResult<Self> {
        Self::new(standard_routes())
    }

    /// Match a concrete path (query string and fragment are ignored)
    pub fn resolve(&self, path: &str) -> RouteMatch<'_> {
        let path = normalize_path(path);

        if let Ok(matched) = self.router.at(&path) {
            let params: Vec<(String, String)> = matched.params.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();

            if params.iter().all(|(_, value)| !value.is_empty()) {
                return RouteMatch {
                    descriptor: &self.descriptors[*matched.value],
                    path,
                    params,
                };
            }
        }

        RouteMatch {
            descriptor: &self.descriptors[self.catch_all],
            path,
            params: Vec::new(),
        }
    }

    pub fn descriptors(&self) -> &[RouteDescriptor] {
        &self.descriptors
    }

    pub fn catch_all(&self) -> &RouteDescriptor {
        &self.descriptors[self.catch_all]
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Convert `/leads/:id` into the matcher's `/leads/{id}` form
fn to_matcher_syntax(pattern: &str) -> AccessResult<String> {
    if !pattern.starts_with('/') {
        return Err(AccessError::InvalidRouteTable {
            message: format!("pattern '{pattern}' must start with '/'"),
        });
    }

    let mut converted = Vec::new();
    for segment in pattern.split('/') {
        if segment.contains(['{', '}', '*']) {
            return Err(AccessError::InvalidRouteTable {
                message: format!("pattern '{pattern}' contains unsupported segment '{segment}'"),
            });
        }

        match segment.strip_prefix(':') {
            Some("") => {
                return Err(AccessError::InvalidRouteTable {
                    message: format!("pattern '{pattern}' has an unnamed parameter"),
                });
            }
            Some(name) => converted.push(format!("{{{name}}}")),
            None => converted.push(segment.to_string()),
        }
    }

    Ok(converted.join("/"))
}

/// Strip query string and fragment and drop trailing slashes
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = path.trim_end_matches('/');

    if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

const STAFF: &[Role] = &[Role::Manager, Role::Consultant, Role::Receptionist];

/// Every route the panel knows, catch-all last
pub fn standard_routes() -> Vec<RouteDescriptor> {
    use Permission::*;
    use RouteDescriptor as R;

    vec![
        // Public
        R::redirect_to_default("/"),
        R::public(LOGIN_PATH, "login"),
        R::public(UNAUTHORIZED_PATH, "unauthorized"),
        R::public("/forgot-password", "forgot_password"),
        // Any authenticated role
        R::authenticated("/profile", "profile"),
        R::authenticated("/notifications", "notifications"),
        // Super admin
        R::guarded("/super-admin/dashboard", "super_admin_dashboard", &[Role::SuperAdmin]).in_menu("Dashboard"),
        R::guarded("/super-admin/offices", "office_list", &[Role::SuperAdmin]).with_permission(ManageOffices).in_menu("Offices"),
        R::guarded("/super-admin/offices/:id", "office_detail", &[Role::SuperAdmin]).with_permission(ManageOffices),
        R::guarded("/super-admin/staff", "staff_directory", &[Role::SuperAdmin]).in_menu("Staff"),
        R::guarded("/super-admin/settings", "system_settings", &[Role::SuperAdmin]).with_permission(ManageSettings).in_menu("Settings"),
        // Manager
        R::guarded("/manager/dashboard", "manager_dashboard", &[Role::Manager]).in_menu("Dashboard"),
        R::guarded("/manager/staff", "office_staff", &[Role::Manager]).with_permission(ManageStaff).in_menu("Staff"),
        R::guarded("/manager/leads", "office_leads", &[Role::Manager]).with_permission(AssignLeads).in_menu("Leads"),
        R::guarded("/manager/appointments", "office_appointments", &[Role::Manager]).with_permission(ViewAppointments).in_menu("Appointments"),
        R::guarded("/manager/applications", "application_review", &[Role::Manager]).with_permission(ReviewApplications).in_menu("Applications"),
        R::guarded("/manager/reports", "office_reports", &[Role::Manager]).with_permission(ViewReports).in_menu("Reports"),
        // Consultant
        R::guarded("/consultant/dashboard", "consultant_dashboard", &[Role::Consultant]).in_menu("Dashboard"),
        R::guarded("/consultant/leads", "my_leads", &[Role::Consultant]).with_permission(ViewLeads).in_menu("Leads"),
        R::guarded("/consultant/leads/:id", "lead_detail", &[Role::Consultant]).with_permission(ManageLeads),
        R::guarded("/consultant/appointments", "consultant_schedule", &[Role::Consultant]).with_permission(ViewAppointments).in_menu("Appointments"),
        R::guarded("/consultant/applications", "application_dashboard", &[Role::Consultant]).with_permission(ViewApplications).in_menu("Applications"),
        R::guarded("/consultant/applications/:id", "application_detail", &[Role::Consultant]).with_permission(ManageApplications),
        // Receptionist
        R::guarded("/receptionist/dashboard", "receptionist_dashboard", &[Role::Receptionist]).in_menu("Dashboard"),
        R::guarded("/receptionist/leads/new", "lead_intake", &[Role::Receptionist]).with_permission(CreateLeads).in_menu("New Lead"),
        R::guarded("/receptionist/appointments", "front_desk_schedule", &[Role::Receptionist]).with_permission(ManageAppointments).in_menu("Appointments"),
        R::guarded("/receptionist/walk-ins", "walk_in_queue", &[Role::Receptionist]).in_menu("Walk-ins"),
        // Student
        R::guarded("/student/dashboard", "student_dashboard", &[Role::Student]).in_menu("Dashboard"),
        R::guarded("/student/applications", "my_applications", &[Role::Student]).with_permission(ViewOwnApplications).in_menu("Applications"),
        R::guarded("/student/applications/:id", "my_application_detail", &[Role::Student]).with_permission(ViewOwnApplications),
        R::guarded("/student/appointments", "my_appointments", &[Role::Student]).with_permission(ViewAppointments).in_menu("Appointments"),
        R::guarded("/student/documents", "my_documents", &[Role::Student]).with_permission(UploadDocuments).in_menu("Documents"),
        // Shared staff views
        R::guarded("/appointments/:id", "appointment_detail", STAFF).with_permission(ViewAppointments),
        R::catch_all(),
    ]
}
