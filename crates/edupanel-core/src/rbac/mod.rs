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

//! Role-Based Access Control (RBAC)
//!
//! This module provides the closed role registry, the permission grant table,
//! the single authorization primitive, per-role capabilities derived from the
//! route table, and the access audit log.

pub mod audit;
pub mod capabilities;
pub mod permissions;
pub mod policy;
pub mod roles;

pub use audit::*;
pub use capabilities::*;
pub use permissions::*;
pub use policy::*;
pub use roles::*;
