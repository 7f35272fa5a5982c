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

//! Edupanel access layer
//!
//! Role-based route authorization for the education-consultancy
//! administration panel: role registry and permission grants, the route table
//! with default-route resolution, the route guard, and session rehydration
//! from persisted credentials.

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod guard;
pub mod panel;
pub mod rbac;
pub mod router;
pub mod session;

pub use config::Config;
pub use error::{AccessError, AccessResult};
pub use guard::{GuardDecision, GuardState, Layout, Navigation, RouteGuard};
pub use panel::{LoginOutcome, Panel};
pub use rbac::{Permission, Requirement, Role, has_permission, is_authorized};
pub use router::{LOGIN_PATH, RouteTable, UNAUTHORIZED_PATH, default_route};
pub use session::{AuthState, Session, SessionObserver};
