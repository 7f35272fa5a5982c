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

//! Route guard
//!
//! Decides, for every navigation, whether to render the matched view or to
//! redirect. The guard has no failure path: every input produces one of the
//! [`GuardState`]s below.

use crate::rbac::policy::{Authorization, authorize};
use crate::router::{LOGIN_PATH, RouteDescriptor, RouteTable, RouteTarget, UNAUTHORIZED_PATH, ViewId, default_route};
use crate::session::{AuthState, SessionObserver};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Guard decision states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GuardState {
    /// Session bootstrap still in flight
    Loading,
    /// Public route; no authentication needed
    PublicOk,
    /// No session; redirect to login
    AuthRequired,
    /// Session present but not allowed; redirect to the unauthorized page
    RoleDenied,
    /// Render the guarded view inside the authenticated layout
    Authorized,
}

impl GuardState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardState::Loading => "LOADING",
            GuardState::PublicOk => "PUBLIC_OK",
            GuardState::AuthRequired => "AUTH_REQUIRED",
            GuardState::RoleDenied => "ROLE_DENIED",
            GuardState::Authorized => "AUTHORIZED",
        }
    }
}

/// Chrome a rendered view is wrapped in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Public,
    Authenticated,
}

/// What the host should do with a navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum Navigation {
    /// Wait for the session to settle
    Pending,
    Render {
        view: ViewId,
        layout: Layout,
        params: Vec<(String, String)>,
    },
    Redirect {
        to: String,
        /// Originally requested path, kept for the post-login return
        #[serde(skip_serializing_if = "Option::is_none")]
        from: Option<String>,
    },
}

impl Navigation {
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Navigation::Redirect { to, .. } => Some(to.as_str()),
            _ => None,
        }
    }

    pub fn view(&self) -> Option<ViewId> {
        match self {
            Navigation::Render { view, .. } => Some(*view),
            _ => None,
        }
    }
}

/// Full outcome of a guard evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardDecision {
    pub state: GuardState,
    pub navigation: Navigation,
    /// Path as requested
    pub requested: String,
    /// Pattern of the descriptor that matched
    pub pattern: &'static str,
    /// Authorization result for guarded routes
    pub authorization: Option<Authorization>,
    /// Session and loading flag handed to the rendered view
    pub context: AuthState,
}

/// Evaluates navigations against the route table
#[derive(Debug, Clone)]
pub struct RouteGuard {
    routes: Arc<RouteTable>,
}

impl RouteGuard {
    pub fn new(routes: Arc<RouteTable>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Decide against a state snapshot without waiting
    pub fn evaluate(&self, state: &AuthState, path: &str) -> GuardDecision {
        let matched = self.routes.resolve(path);
        let descriptor = matched.descriptor;

        let decide = |guard_state: GuardState, navigation: Navigation, authorization: Option<Authorization>| GuardDecision {
            state: guard_state,
            navigation,
            requested: path.to_string(),
            pattern: descriptor.pattern,
            authorization,
            context: state.clone(),
        };

        if descriptor.public {
            return match descriptor.target {
                RouteTarget::View(view) => decide(
                    GuardState::PublicOk,
                    Navigation::Render {
                        view,
                        layout: Layout::Public,
                        params: matched.params,
                    },
                    None,
                ),
                // The default route depends on the session, so it has to settle first
                RouteTarget::DefaultRoute if state.loading => decide(GuardState::Loading, Navigation::Pending, None),
                RouteTarget::DefaultRoute => decide(GuardState::PublicOk, redirect_to_default(state), None),
            };
        }

        if state.loading {
            return decide(GuardState::Loading, Navigation::Pending, None);
        }

        let authorization = authorize(state.session.as_ref(), &descriptor.requirement);
        let decision = match authorization {
            Authorization::Granted => decide(GuardState::Authorized, render_guarded(descriptor, matched.params, state), Some(authorization)),
            Authorization::NoSession => decide(
                GuardState::AuthRequired,
                Navigation::Redirect {
                    to: LOGIN_PATH.to_string(),
                    from: Some(path.to_string()),
                },
                Some(authorization),
            ),
            _ => decide(
                GuardState::RoleDenied,
                Navigation::Redirect {
                    to: UNAUTHORIZED_PATH.to_string(),
                    from: Some(path.to_string()),
                },
                Some(authorization),
            ),
        };

        debug!(path = %path, pattern = descriptor.pattern, state = ?decision.state, "Guard decision");
        decision
    }

    /// Decide once the session has settled
    ///
    /// Public views are decided immediately; everything else waits for the
    /// bootstrap to complete.
    pub async fn navigate(&self, observer: &mut SessionObserver, path: &str) -> GuardDecision {
        let decision = self.evaluate(&observer.snapshot(), path);
        if decision.state != GuardState::Loading {
            return decision;
        }

        let settled = observer.settled().await;
        self.evaluate(&settled, path)
    }
}

fn redirect_to_default(state: &AuthState) -> Navigation {
    Navigation::Redirect {
        to: default_route(state.role()).to_string(),
        from: None,
    }
}

fn render_guarded(descriptor: &RouteDescriptor, params: Vec<(String, String)>, state: &AuthState) -> Navigation {
    match descriptor.target {
        RouteTarget::View(view) => Navigation::Render {
            view,
            layout: Layout::Authenticated,
            params,
        },
        RouteTarget::DefaultRoute => redirect_to_default(state),
    }
}
