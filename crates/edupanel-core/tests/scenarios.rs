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

//! End-to-end navigation scenarios over a panel with persisted credentials

use base64::{Engine as _, engine::general_purpose};
use chrono::{Duration, Utc};
use edupanel_core::backend::InMemoryAuthBackend;
use edupanel_core::session::{AUTH_TOKEN_KEY, BootstrapOutcome, MemoryStorage, SessionStorage, USER_DATA_KEY};
use edupanel_core::{Config, GuardState, LOGIN_PATH, Panel, Role, Session, UNAUTHORIZED_PATH, default_route};
use std::sync::Arc;

fn token_with_exp(exp: i64) -> String {
    let payload = general_purpose::URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"x","exp":{exp}}}"#));
    format!("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.{payload}.c2lnbmF0dXJl")
}

fn panel(storage: Arc<MemoryStorage>) -> Panel {
    let config = Config::default();
    let backend = Arc::new(InMemoryAuthBackend::with_demo_accounts(&config));
    Panel::new(&config, storage, backend).unwrap()
}

fn stored_session(exp_offset: Duration, user: &str) -> Arc<MemoryStorage> {
    let token = token_with_exp((Utc::now() + exp_offset).timestamp());
    Arc::new(MemoryStorage::with_entries([(AUTH_TOKEN_KEY, token.as_str()), (USER_DATA_KEY, user)]))
}

#[tokio::test]
async fn expired_student_token_requires_login() {
    let storage = stored_session(Duration::seconds(-10), r#"{"id":"u1","role":"student"}"#);
    let panel = panel(storage.clone());

    assert_eq!(panel.start(), &BootstrapOutcome::Expired);
    assert!(panel.session().is_none());
    assert!(storage.get(AUTH_TOKEN_KEY).unwrap().is_none());

    let decision = panel.navigate("/student/dashboard").await;
    assert_eq!(decision.state, GuardState::AuthRequired);
    assert_eq!(decision.navigation.redirect_target(), Some(LOGIN_PATH));
}

#[tokio::test]
async fn manager_is_denied_super_admin_offices() {
    let panel = panel(stored_session(Duration::seconds(3600), r#"{"id":"u2","role":"manager"}"#));
    panel.start();

    let decision = panel.navigate("/super-admin/offices").await;
    assert_eq!(decision.state, GuardState::RoleDenied);
    assert_eq!(decision.navigation.redirect_target(), Some(UNAUTHORIZED_PATH));
}

#[tokio::test]
async fn manager_reaches_manager_dashboard() {
    let panel = panel(stored_session(Duration::seconds(3600), r#"{"id":"u2","role":"manager"}"#));
    panel.start();

    let decision = panel.navigate("/manager/dashboard").await;
    assert_eq!(decision.state, GuardState::Authorized);
    assert_eq!(decision.context.session.as_ref().map(|s| s.id.as_str()), Some("u2"));
    assert!(!decision.context.loading);
}

#[tokio::test]
async fn login_page_is_public_before_bootstrap() {
    let panel = panel(Arc::new(MemoryStorage::new()));

    // Not started: the session is still loading
    assert!(panel.observer().is_loading());
    let decision = panel.navigate("/login").await;
    assert_eq!(decision.state, GuardState::PublicOk);

    let decision = panel.navigate_now("/student/dashboard");
    assert_eq!(decision.state, GuardState::Loading);
}

#[tokio::test]
async fn root_sends_consultant_to_consultant_dashboard() {
    let panel = panel(stored_session(Duration::hours(1), r#"{"id":"u3","name":"Cy","email":"cy@example.com","role":"consultant"}"#));
    panel.start();

    let decision = panel.navigate("/").await;
    assert_eq!(decision.navigation.redirect_target(), Some("/consultant/dashboard"));
}

#[tokio::test]
async fn navigation_during_bootstrap_resolves_after_it() {
    let storage = stored_session(Duration::hours(1), r#"{"id":"u4","role":"receptionist"}"#);
    let panel = Arc::new(panel(storage));

    let waiting = {
        let panel = panel.clone();
        tokio::spawn(async move { panel.navigate("/receptionist/walk-ins").await })
    };

    tokio::task::yield_now().await;
    panel.start();

    let decision = waiting.await.unwrap();
    assert_eq!(decision.state, GuardState::Authorized);
}

#[tokio::test]
async fn root_redirect_and_post_login_redirect_agree() {
    let panel = panel(Arc::new(MemoryStorage::new()));
    panel.start();

    for role in Role::ALL {
        let session = Session {
            id: format!("agree-{role}"),
            name: String::new(),
            email: String::new(),
            role: Some(role),
            avatar: None,
        };
        assert_eq!(panel.post_login_path(&session, None), default_route(Some(role)));

        let outcome = panel.login(&format!("{}@edupanel.test", role.as_str()), "password", None).await.unwrap();
        let root = panel.navigate("/").await;
        assert_eq!(root.navigation.redirect_target(), Some(outcome.redirect_to.as_str()));
        assert_ne!(outcome.redirect_to, LOGIN_PATH);
    }

    panel.logout().await;
    assert_eq!(panel.navigate("/").await.navigation.redirect_target(), Some(default_route(None)));
}

#[tokio::test]
async fn unknown_stored_role_fails_closed() {
    let panel = panel(stored_session(Duration::hours(1), r#"{"id":"u5","role":"owner"}"#));
    panel.start();

    let session = panel.session().unwrap();
    assert_eq!(session.role, None);
    assert!(panel.menu().is_empty());
    assert_eq!(panel.navigate("/profile").await.state, GuardState::RoleDenied);
    assert_eq!(panel.navigate("/").await.navigation.redirect_target(), Some(LOGIN_PATH));
}

#[tokio::test]
async fn issued_tokens_survive_a_restart() {
    let storage = Arc::new(MemoryStorage::new());

    let first = panel(storage.clone());
    first.start();
    first.login("student@edupanel.test", "password", None).await.unwrap();

    let second = panel(storage.clone());
    let outcome = second.start();
    assert_eq!(outcome.session().and_then(|s| s.role), Some(Role::Student));
    assert_eq!(second.navigate("/student/documents").await.state, GuardState::Authorized);
}
