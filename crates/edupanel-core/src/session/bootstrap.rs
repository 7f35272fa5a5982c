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

//! Startup session rehydration
//!
//! Reads the persisted token and user record, checks the token's expiry and
//! settles the session cell. Every failure mode collapses to "no session":
//! stale keys are removed and nothing is returned to the caller as an error.

use crate::auth::{is_token_live_at, token_expiry};
use crate::session::storage::{AUTH_TOKEN_KEY, SessionStorage, USER_DATA_KEY};
use crate::session::{Session, SessionWriter};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How the bootstrap settled the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Restored(Session),
    /// Neither key present
    NoCredentials,
    Expired,
    /// One key missing, or a key that could not be parsed
    Malformed(&'static str),
    /// Storage could not be read
    StorageUnavailable,
}

impl BootstrapOutcome {
    pub fn session(&self) -> Option<&Session> {
        match self {
            BootstrapOutcome::Restored(session) => Some(session),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BootstrapOutcome::Restored(_) => "restored",
            BootstrapOutcome::NoCredentials => "no_credentials",
            BootstrapOutcome::Expired => "expired",
            BootstrapOutcome::Malformed(reason) => *reason,
            BootstrapOutcome::StorageUnavailable => "storage_unavailable",
        }
    }
}

/// Rehydrates the session from persisted storage
pub struct SessionBootstrapper {
    storage: Arc<dyn SessionStorage>,
}

impl SessionBootstrapper {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    /// Settle the session cell using the current time
    pub fn run(&self, writer: &SessionWriter) -> BootstrapOutcome {
        self.run_at(writer, Utc::now())
    }

    /// Settle the session cell as of `now`
    ///
    /// Running this twice against unchanged storage yields the same state.
    pub fn run_at(&self, writer: &SessionWriter, now: DateTime<Utc>) -> BootstrapOutcome {
        let outcome = self.inspect(now);

        match &outcome {
            BootstrapOutcome::Restored(session) => {
                info!(user_id = %session.id, role = ?session.role, "Session restored from storage");
                writer.establish(session.clone());
            }
            BootstrapOutcome::NoCredentials => {
                debug!("No stored credentials");
                writer.clear();
            }
            other => {
                warn!(reason = other.label(), "Discarding stored credentials");
                self.discard();
                writer.clear();
            }
        }

        outcome
    }

    fn inspect(&self, now: DateTime<Utc>) -> BootstrapOutcome {
        let (token, user_data) = match (self.storage.get(AUTH_TOKEN_KEY), self.storage.get(USER_DATA_KEY)) {
            (Ok(token), Ok(user_data)) => (token, user_data),
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Failed to read stored credentials");
                return BootstrapOutcome::StorageUnavailable;
            }
        };

        let (token, user_data) = match (token, user_data) {
            (None, None) => return BootstrapOutcome::NoCredentials,
            (Some(token), Some(user_data)) => (token, user_data),
            (None, Some(_)) => return BootstrapOutcome::Malformed("missing_token"),
            (Some(_), None) => return BootstrapOutcome::Malformed("missing_user_record"),
        };

        if token_expiry(&token).is_none() {
            return BootstrapOutcome::Malformed("malformed_token");
        }

        if !is_token_live_at(&token, now) {
            return BootstrapOutcome::Expired;
        }

        match serde_json::from_str::<Session>(&user_data) {
            Ok(session) => BootstrapOutcome::Restored(session),
            Err(_) => BootstrapOutcome::Malformed("malformed_user_record"),
        }
    }

    fn discard(&self) {
        for key in [AUTH_TOKEN_KEY, USER_DATA_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "Failed to remove stale credential");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AccessError, AccessResult};
    use crate::rbac::roles::Role;
    use crate::session::{AuthState, MemoryStorage, session_channel};
    use base64::{Engine as _, engine::general_purpose};
    use chrono::Duration;

    fn token_expiring_at(exp: DateTime<Utc>) -> String {
        let payload = general_purpose::URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"u","exp":{}}}"#, exp.timestamp()));
        format!("eyJhbGciOiJIUzI1NiJ9.{payload}.sig")
    }

    fn stored(token: &str, user: &str) -> Arc<MemoryStorage> {
        Arc::new(MemoryStorage::with_entries([(AUTH_TOKEN_KEY, token), (USER_DATA_KEY, user)]))
    }

    #[test]
    fn test_live_token_restores_session() {
        let now = Utc::now();
        let storage = stored(&token_expiring_at(now + Duration::hours(1)), r#"{"id":"u2","name":"Grace","email":"g@example.com","role":"manager"}"#);
        let (writer, observer) = session_channel();

        let outcome = SessionBootstrapper::new(storage.clone()).run_at(&writer, now);

        assert_eq!(outcome.session().unwrap().role, Some(Role::Manager));
        let state = observer.snapshot();
        assert!(!state.loading);
        assert_eq!(state.role(), Some(Role::Manager));
        assert_eq!(storage.len(), 2);
    }

    #[test]
    fn test_loosely_typed_user_record_is_restored() {
        let now = Utc::now();
        let live = token_expiring_at(now + Duration::hours(1));

        let storage = stored(&live, r#"{"id":42,"name":"A","email":"a@x","role":"manager"}"#);
        let (writer, observer) = session_channel();
        let outcome = SessionBootstrapper::new(storage.clone()).run_at(&writer, now);
        assert_eq!(outcome.session().map(|s| s.id.as_str()), Some("42"));
        assert_eq!(observer.snapshot().role(), Some(Role::Manager));
        assert_eq!(storage.len(), 2);

        let storage = stored(&live, r#"{"id":"u1","name":null,"email":null,"role":"student"}"#);
        let (writer, _observer) = session_channel();
        let outcome = SessionBootstrapper::new(storage).run_at(&writer, now);
        let session = outcome.session().unwrap();
        assert_eq!(session.name, "");
        assert_eq!(session.email, "");
        assert_eq!(session.role, Some(Role::Student));
    }

    #[test]
    fn test_expired_token_clears_state_and_storage() {
        let now = Utc::now();
        let storage = stored(&token_expiring_at(now - Duration::seconds(10)), r#"{"id":"u1","role":"student"}"#);
        let (writer, observer) = session_channel();

        let outcome = SessionBootstrapper::new(storage.clone()).run_at(&writer, now);

        assert_eq!(outcome, BootstrapOutcome::Expired);
        assert_eq!(observer.snapshot(), AuthState::unauthenticated());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_one_second_past_expiry_is_rejected() {
        let now = Utc::now();
        let storage = stored(&token_expiring_at(now - Duration::seconds(1)), r#"{"id":"u1","role":"student"}"#);
        let (writer, _observer) = session_channel();

        assert_eq!(SessionBootstrapper::new(storage).run_at(&writer, now), BootstrapOutcome::Expired);
    }

    #[test]
    fn test_missing_credentials() {
        let (writer, observer) = session_channel();
        let outcome = SessionBootstrapper::new(Arc::new(MemoryStorage::new())).run_at(&writer, Utc::now());

        assert_eq!(outcome, BootstrapOutcome::NoCredentials);
        assert_eq!(observer.snapshot(), AuthState::unauthenticated());
    }

    #[test]
    fn test_malformed_inputs_fail_closed() {
        let now = Utc::now();
        let live = token_expiring_at(now + Duration::hours(1));
        let cases = [
            (stored("not-a-token", r#"{"id":"u1","role":"student"}"#), "malformed_token"),
            (stored(&live, "{broken json"), "malformed_user_record"),
            (stored(&live, r#"{"role":"student"}"#), "malformed_user_record"),
            (Arc::new(MemoryStorage::with_entries([(AUTH_TOKEN_KEY, live.as_str())])), "missing_user_record"),
            (Arc::new(MemoryStorage::with_entries([(USER_DATA_KEY, r#"{"id":"u1"}"#)])), "missing_token"),
        ];

        for (storage, reason) in cases {
            let (writer, observer) = session_channel();
            let outcome = SessionBootstrapper::new(storage.clone()).run_at(&writer, now);
            assert_eq!(outcome, BootstrapOutcome::Malformed(reason));
            assert_eq!(observer.snapshot(), AuthState::unauthenticated());
            assert!(storage.is_empty(), "{reason} left stale keys behind");
        }
    }

    #[test]
    fn test_bootstrap_is_idempotent() {
        let now = Utc::now();
        let storage = stored(&token_expiring_at(now + Duration::hours(1)), r#"{"id":"u3","role":"consultant"}"#);
        let (writer, observer) = session_channel();
        let bootstrapper = SessionBootstrapper::new(storage);

        let first = bootstrapper.run_at(&writer, now);
        let first_state = observer.snapshot();
        let second = bootstrapper.run_at(&writer, now);

        assert_eq!(first, second);
        assert_eq!(first_state, observer.snapshot());
    }

    struct BrokenStorage;

    impl SessionStorage for BrokenStorage {
        fn get(&self, _key: &str) -> AccessResult<Option<String>> {
            Err(AccessError::Storage {
                message: "disk on fire".to_string(),
            })
        }

        fn set(&self, _key: &str, _value: &str) -> AccessResult<()> {
            Ok(())
        }

        fn remove(&self, _key: &str) -> AccessResult<()> {
            Err(AccessError::Storage {
                message: "disk on fire".to_string(),
            })
        }
    }

    #[test]
    fn test_unreadable_storage_is_no_session() {
        let (writer, observer) = session_channel();
        let outcome = SessionBootstrapper::new(Arc::new(BrokenStorage)).run_at(&writer, Utc::now());

        assert_eq!(outcome, BootstrapOutcome::StorageUnavailable);
        assert_eq!(observer.snapshot(), AuthState::unauthenticated());
    }
}
