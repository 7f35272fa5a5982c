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

//! Session state
//!
//! The authenticated actor lives in one shared cell. [`SessionWriter`] is the
//! only handle able to change it and is held by the panel for the bootstrapper
//! and the login/logout actions. Everything else (route guard, menus, views)
//! reads through a cloneable [`SessionObserver`].

pub mod bootstrap;
pub mod storage;

pub use bootstrap::*;
pub use storage::*;

use crate::rbac::roles::{Role, deserialize_lenient_role};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

/// The currently authenticated actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// User identifier; numeric ids are kept in their decimal form
    #[serde(deserialize_with = "deserialize_user_id")]
    pub id: String,

    /// Display name
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub name: String,

    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub email: String,

    /// `None` when the stored role is missing or unrecognised
    #[serde(default, deserialize_with = "deserialize_lenient_role")]
    pub role: Option<Role>,

    /// Avatar reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

fn deserialize_user_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(id) => Ok(id),
        serde_json::Value::Number(id) => Ok(id.to_string()),
        other => Err(de::Error::custom(format!("user id must be a string or number, got {other}"))),
    }
}

/// `null` reads as an empty string
fn deserialize_nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Snapshot of authentication state as observed by views
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub session: Option<Session>,

    /// True until the bootstrapper has settled the initial state
    pub loading: bool,
}

impl AuthState {
    pub fn loading() -> Self {
        Self { session: None, loading: true }
    }

    pub fn authenticated(session: Session) -> Self {
        Self {
            session: Some(session),
            loading: false,
        }
    }

    pub fn unauthenticated() -> Self {
        Self { session: None, loading: false }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.session.as_ref().and_then(|session| session.role)
    }
}

/// Create the session cell, initially loading
pub fn session_channel() -> (SessionWriter, SessionObserver) {
    let (sender, receiver) = watch::channel(AuthState::loading());
    (SessionWriter { sender }, SessionObserver { receiver })
}

/// Exclusive write handle for the session cell
#[derive(Debug)]
pub struct SessionWriter {
    sender: watch::Sender<AuthState>,
}

impl SessionWriter {
    pub(crate) fn establish(&self, session: Session) {
        debug!(user_id = %session.id, role = ?session.role, "Session established");
        self.sender.send_replace(AuthState::authenticated(session));
    }

    pub(crate) fn clear(&self) {
        debug!("Session cleared");
        self.sender.send_replace(AuthState::unauthenticated());
    }

    pub fn subscribe(&self) -> SessionObserver {
        SessionObserver {
            receiver: self.sender.subscribe(),
        }
    }
}

/// Read-only view of the session cell
#[derive(Debug, Clone)]
pub struct SessionObserver {
    receiver: watch::Receiver<AuthState>,
}

impl SessionObserver {
    /// Current state without waiting
    pub fn snapshot(&self) -> AuthState {
        self.receiver.borrow().clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.receiver.borrow().session.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.receiver.borrow().loading
    }

    /// Wait until the initial bootstrap has settled the state
    ///
    /// If the writer goes away while still loading, the state is treated as
    /// unauthenticated.
    pub async fn settled(&mut self) -> AuthState {
        match self.receiver.wait_for(|state| !state.loading).await {
            Ok(state) => state.clone(),
            Err(_) => AuthState::unauthenticated(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn student() -> Session {
        Session {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: Some(Role::Student),
            avatar: None,
        }
    }

    #[test]
    fn test_user_record_accepts_numeric_id_and_null_fields() {
        let session: Session = serde_json::from_str(r#"{"id":42,"name":null,"email":null,"role":"manager"}"#).unwrap();
        assert_eq!(session.id, "42");
        assert_eq!(session.name, "");
        assert_eq!(session.email, "");
        assert_eq!(session.role, Some(Role::Manager));

        assert!(serde_json::from_str::<Session>(r#"{"id":null,"role":"manager"}"#).is_err());
        assert!(serde_json::from_str::<Session>(r#"{"role":"manager"}"#).is_err());
    }

    #[test]
    fn test_initial_state_is_loading() {
        let (_writer, observer) = session_channel();
        assert!(observer.is_loading());
        assert!(observer.session().is_none());
    }

    #[test]
    fn test_writer_updates_all_observers() {
        let (writer, observer) = session_channel();
        let other = writer.subscribe();

        writer.establish(student());
        assert_eq!(observer.snapshot(), AuthState::authenticated(student()));
        assert_eq!(other.snapshot().role(), Some(Role::Student));

        writer.clear();
        assert_eq!(observer.snapshot(), AuthState::unauthenticated());
    }

    #[tokio::test]
    async fn test_settled_waits_for_bootstrap() {
        let (writer, mut observer) = session_channel();

        let waiter = tokio::spawn(async move { observer.settled().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        writer.establish(student());
        let state = waiter.await.unwrap();
        assert!(state.is_authenticated());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_settled_fails_closed_when_writer_dropped() {
        let (writer, mut observer) = session_channel();
        drop(writer);
        assert_eq!(observer.settled().await, AuthState::unauthenticated());
    }

    #[test]
    fn test_session_record_parsing() {
        let session: Session = serde_json::from_str(r#"{"id":"u1","role":"student"}"#).unwrap();
        assert_eq!(session.role, Some(Role::Student));
        assert_eq!(session.name, "");
        assert!(session.avatar.is_none());

        let session: Session = serde_json::from_str(r#"{"id":"u2","name":"Bo","email":"bo@example.com","role":"owner"}"#).unwrap();
        assert_eq!(session.role, None);

        assert!(serde_json::from_str::<Session>(r#"{"role":"student"}"#).is_err());
    }
}
