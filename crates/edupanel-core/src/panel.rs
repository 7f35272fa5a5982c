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

//! Panel facade
//!
//! Owns the session writer and wires bootstrap, guard, capabilities, audit
//! and the auth backend together. Hosts hold one `Panel` and hand its
//! [`SessionObserver`]s to whatever needs to read the session.

use crate::backend::{AuthBackend, LoginRequest};
use crate::config::Config;
use crate::error::AccessResult;
use crate::guard::{GuardDecision, GuardState, Navigation, RouteGuard};
use crate::rbac::audit::{ANONYMOUS, AccessAuditLog, AuditEvent, AuditEventType, AuditResult};
use crate::rbac::capabilities::{CapabilityTable, MenuEntry};
use crate::rbac::policy::is_authorized;
use crate::router::{LOGIN_PATH, RouteTable, default_route};
use crate::session::{AUTH_TOKEN_KEY, BootstrapOutcome, Session, SessionBootstrapper, SessionObserver, SessionStorage, SessionWriter, USER_DATA_KEY, session_channel};
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

/// Result of a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub session: Session,
    /// Where the host should navigate next
    pub redirect_to: String,
}

/// The access layer of one running panel
pub struct Panel {
    guard: RouteGuard,
    capabilities: CapabilityTable,
    storage: Arc<dyn SessionStorage>,
    backend: Arc<dyn AuthBackend>,
    writer: SessionWriter,
    observer: SessionObserver,
    audit: AccessAuditLog,
    bootstrap: OnceLock<BootstrapOutcome>,
}

impl Panel {
    /// Build a panel over the standard route table
    pub fn new(config: &Config, storage: Arc<dyn SessionStorage>, backend: Arc<dyn AuthBackend>) -> AccessResult<Self> {
        Self::with_routes(config, RouteTable::standard()?, storage, backend)
    }

    pub fn with_routes(config: &Config, routes: RouteTable, storage: Arc<dyn SessionStorage>, backend: Arc<dyn AuthBackend>) -> AccessResult<Self> {
        config.validate()?;

        let routes = Arc::new(routes);
        let (writer, observer) = session_channel();

        Ok(Self {
            guard: RouteGuard::new(routes.clone()),
            capabilities: CapabilityTable::from_routes(&routes),
            storage,
            backend,
            writer,
            observer,
            audit: AccessAuditLog::with_max_events(config.audit_capacity),
            bootstrap: OnceLock::new(),
        })
    }

    /// Rehydrate the session from storage
    ///
    /// Only the first call does any work; later calls return the first outcome.
    pub fn start(&self) -> &BootstrapOutcome {
        self.bootstrap.get_or_init(|| {
            let outcome = SessionBootstrapper::new(self.storage.clone()).run(&self.writer);

            let actor = outcome.session().map(|s| s.id.clone()).unwrap_or_else(|| ANONYMOUS.to_string());
            let result = if outcome.session().is_some() { AuditResult::Allowed } else { AuditResult::Redirected };
            self.audit.record(AuditEvent::new(AuditEventType::SessionRestored, actor, result).with_detail(outcome.label()));

            outcome
        })
    }

    pub fn is_started(&self) -> bool {
        self.bootstrap.get().is_some()
    }

    /// Decide a navigation, waiting for the bootstrap when needed
    pub async fn navigate(&self, path: &str) -> GuardDecision {
        let mut observer = self.observer.clone();
        let decision = self.guard.navigate(&mut observer, path).await;
        self.record_navigation(&decision);
        decision
    }

    /// Decide a navigation against the current state without waiting
    pub fn navigate_now(&self, path: &str) -> GuardDecision {
        let decision = self.guard.evaluate(&self.observer.snapshot(), path);
        self.record_navigation(&decision);
        decision
    }

    /// Sign in, persist the credentials and publish the session
    ///
    /// Returns where to go next: `from` if the new session may open it,
    /// otherwise the role's default route. On any error the session state is
    /// left unchanged.
    pub async fn login(&self, email: &str, password: &str, from: Option<&str>) -> AccessResult<LoginOutcome> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = match self.backend.login(request).await {
            Ok(response) => response,
            Err(e) => {
                self.audit.record(AuditEvent::new(AuditEventType::Login, ANONYMOUS, AuditResult::Failed).with_detail(e.error_type()));
                return Err(e);
            }
        };

        let user_data = serde_json::to_string(&response.user)?;
        let previous_token = self.storage.get(AUTH_TOKEN_KEY).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read stored token before login");
            None
        });

        self.storage.set(AUTH_TOKEN_KEY, &response.token)?;
        if let Err(e) = self.storage.set(USER_DATA_KEY, &user_data) {
            warn!(error = %e, "Failed to persist user record; rolling back login");
            self.rollback_token(previous_token.as_deref());
            self.audit.record(AuditEvent::new(AuditEventType::Login, response.user.id.clone(), AuditResult::Failed).with_detail(e.error_type()));
            return Err(e);
        }

        let session = response.user;
        let redirect_to = self.post_login_path(&session, from);
        self.writer.establish(session.clone());

        info!(user_id = %session.id, role = ?session.role, redirect_to = %redirect_to, "Signed in");
        self.audit.record(AuditEvent::new(AuditEventType::Login, session.id.clone(), AuditResult::Allowed).with_path(redirect_to.clone()));

        Ok(LoginOutcome { session, redirect_to })
    }

    /// Sign out locally and on the backend
    ///
    /// Backend and storage failures are logged, never returned: the local
    /// session is always cleared.
    pub async fn logout(&self) -> Navigation {
        let actor = self.observer.session().map(|s| s.id).unwrap_or_else(|| ANONYMOUS.to_string());

        match self.storage.get(AUTH_TOKEN_KEY) {
            Ok(Some(token)) => {
                if let Err(e) = self.backend.logout(&token).await {
                    warn!(error = %e, "Backend logout failed");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to read stored token during logout"),
        }

        for key in [AUTH_TOKEN_KEY, USER_DATA_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "Failed to remove credential during logout");
            }
        }

        self.writer.clear();
        info!(user_id = %actor, "Signed out");
        self.audit.record(AuditEvent::new(AuditEventType::Logout, actor, AuditResult::Allowed).with_path(LOGIN_PATH));

        Navigation::Redirect {
            to: LOGIN_PATH.to_string(),
            from: None,
        }
    }

    /// Post-login destination for `session`
    pub fn post_login_path(&self, session: &Session, from: Option<&str>) -> String {
        if let Some(from) = from {
            let descriptor = self.guard.routes().resolve(from).descriptor;
            if !descriptor.public && is_authorized(Some(session), &descriptor.requirement) {
                return from.to_string();
            }
        }

        default_route(session.role).to_string()
    }

    /// Menu entries for the current session
    pub fn menu(&self) -> Vec<MenuEntry> {
        self.capabilities.menu(self.observer.snapshot().role()).to_vec()
    }

    pub fn observer(&self) -> SessionObserver {
        self.observer.clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.observer.session()
    }

    pub fn routes(&self) -> &RouteTable {
        self.guard.routes()
    }

    pub fn capabilities(&self) -> &CapabilityTable {
        &self.capabilities
    }

    pub fn audit(&self) -> &AccessAuditLog {
        &self.audit
    }

    /// Put back the token of the session still held in memory, or clear both
    /// keys when there was none
    fn rollback_token(&self, previous: Option<&str>) {
        let restored = match previous {
            Some(token) => self.storage.set(AUTH_TOKEN_KEY, token),
            None => self.storage.remove(AUTH_TOKEN_KEY).and_then(|_| self.storage.remove(USER_DATA_KEY)),
        };

        if let Err(e) = restored {
            warn!(error = %e, "Failed to roll back stored credentials");
        }
    }

    fn record_navigation(&self, decision: &GuardDecision) {
        let result = match decision.state {
            GuardState::Loading => return,
            GuardState::Authorized => AuditResult::Allowed,
            GuardState::PublicOk if decision.navigation.view().is_some() => AuditResult::Allowed,
            GuardState::PublicOk | GuardState::AuthRequired => AuditResult::Redirected,
            GuardState::RoleDenied => AuditResult::Denied,
        };

        let actor = decision.context.session.as_ref().map(|s| s.id.clone()).unwrap_or_else(|| ANONYMOUS.to_string());
        let detail = match decision.authorization {
            Some(authorization) => serde_json::to_string(&authorization).unwrap_or_default(),
            None => format!("{:?}", decision.state),
        };

        self.audit.record(AuditEvent::new(AuditEventType::Navigation, actor, result).with_path(decision.requested.clone()).with_detail(detail));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryAuthBackend;
    use crate::error::AccessError;
    use crate::rbac::roles::Role;
    use crate::session::{FileStorage, MemoryStorage};

    fn panel_with(storage: Arc<MemoryStorage>) -> Panel {
        let config = Config::default();
        let backend = Arc::new(InMemoryAuthBackend::with_demo_accounts(&config));
        Panel::new(&config, storage, backend).unwrap()
    }

    #[tokio::test]
    async fn test_login_persists_and_publishes_session() {
        let storage = Arc::new(MemoryStorage::new());
        let panel = panel_with(storage.clone());
        panel.start();

        let outcome = panel.login("consultant@edupanel.test", "password", None).await.unwrap();
        assert_eq!(outcome.redirect_to, "/consultant/dashboard");
        assert_eq!(panel.session().unwrap().role, Some(Role::Consultant));
        assert!(storage.get(AUTH_TOKEN_KEY).unwrap().is_some());
        assert!(storage.get(USER_DATA_KEY).unwrap().unwrap().contains("consultant"));
    }

    #[tokio::test]
    async fn test_login_honours_authorized_from_path_only() {
        let panel = panel_with(Arc::new(MemoryStorage::new()));
        panel.start();

        let outcome = panel.login("manager@edupanel.test", "password", Some("/manager/leads?page=2")).await.unwrap();
        assert_eq!(outcome.redirect_to, "/manager/leads?page=2");

        let outcome = panel.login("manager@edupanel.test", "password", Some("/super-admin/offices")).await.unwrap();
        assert_eq!(outcome.redirect_to, "/manager/dashboard");

        let outcome = panel.login("manager@edupanel.test", "password", Some("/login")).await.unwrap();
        assert_eq!(outcome.redirect_to, "/manager/dashboard");
    }

    #[tokio::test]
    async fn test_failed_login_leaves_state_untouched() {
        let storage = Arc::new(MemoryStorage::new());
        let panel = panel_with(storage.clone());
        panel.start();

        assert!(panel.login("student@edupanel.test", "nope", None).await.is_err());
        assert!(panel.session().is_none());
        assert!(storage.is_empty());
        assert_eq!(panel.audit().by_result(AuditResult::Failed).len(), 1);
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let storage = Arc::new(MemoryStorage::new());
        let panel = panel_with(storage.clone());
        panel.start();
        panel.login("receptionist@edupanel.test", "password", None).await.unwrap();

        let navigation = panel.logout().await;
        assert_eq!(navigation.redirect_target(), Some(LOGIN_PATH));
        assert!(panel.session().is_none());
        assert!(storage.is_empty());
        assert!(panel.menu().is_empty());

        let decision = panel.navigate("/receptionist/dashboard").await;
        assert_eq!(decision.state, GuardState::AuthRequired);
    }

    #[tokio::test]
    async fn test_start_runs_once() {
        let panel = panel_with(Arc::new(MemoryStorage::new()));
        assert!(!panel.is_started());

        assert_eq!(panel.start(), &BootstrapOutcome::NoCredentials);
        panel.login("student@edupanel.test", "password", None).await.unwrap();

        // A second start must not wipe the freshly signed-in session
        assert_eq!(panel.start(), &BootstrapOutcome::NoCredentials);
        assert!(panel.session().is_some());
        assert!(panel.is_started());
    }

    #[tokio::test]
    async fn test_menu_and_audit_follow_session() {
        let panel = panel_with(Arc::new(MemoryStorage::new()));
        panel.start();
        assert!(panel.menu().is_empty());

        panel.login("student@edupanel.test", "password", None).await.unwrap();
        let paths: Vec<&str> = panel.menu().iter().map(|e| e.path).collect();
        assert!(paths.contains(&"/student/documents"));

        panel.navigate("/manager/reports").await;
        let denied = panel.audit().by_result(AuditResult::Denied);
        assert_eq!(denied.len(), 1);
        assert_eq!(denied[0].path.as_deref(), Some("/manager/reports"));
    }

    /// Memory storage whose user record writes can be made to fail
    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_user_writes: std::sync::atomic::AtomicBool,
    }

    impl SessionStorage for FlakyStorage {
        fn get(&self, key: &str) -> AccessResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> AccessResult<()> {
            if key == USER_DATA_KEY && self.fail_user_writes.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(AccessError::Storage {
                    message: "quota exceeded".to_string(),
                });
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> AccessResult<()> {
            self.inner.remove(key)
        }
    }

    fn panel_over(storage: Arc<dyn SessionStorage>) -> Panel {
        let config = Config::default();
        let backend = Arc::new(InMemoryAuthBackend::with_demo_accounts(&config));
        Panel::new(&config, storage, backend).unwrap()
    }

    #[tokio::test]
    async fn test_failed_user_write_clears_partial_credentials() {
        let storage = Arc::new(FlakyStorage::default());
        storage.fail_user_writes.store(true, std::sync::atomic::Ordering::SeqCst);
        let panel = panel_over(storage.clone());
        panel.start();

        let err = panel.login("manager@edupanel.test", "password", None).await.unwrap_err();
        assert!(matches!(err, AccessError::Storage { .. }));
        assert!(panel.session().is_none());
        assert!(storage.inner.is_empty());
    }

    #[tokio::test]
    async fn test_failed_user_write_restores_previous_token() {
        let storage = Arc::new(FlakyStorage::default());
        let panel = panel_over(storage.clone());
        panel.start();

        panel.login("student@edupanel.test", "password", None).await.unwrap();
        let token = storage.get(AUTH_TOKEN_KEY).unwrap();
        let user = storage.get(USER_DATA_KEY).unwrap();

        storage.fail_user_writes.store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(panel.login("manager@edupanel.test", "password", None).await.is_err());

        assert_eq!(storage.get(AUTH_TOKEN_KEY).unwrap(), token);
        assert_eq!(storage.get(USER_DATA_KEY).unwrap(), user);
        assert_eq!(panel.session().unwrap().role, Some(Role::Student));
    }

    #[tokio::test]
    async fn test_login_recovers_from_corrupt_storage_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        let panel = panel_over(Arc::new(FileStorage::new(&path)));
        assert_eq!(panel.start(), &BootstrapOutcome::StorageUnavailable);
        assert!(panel.session().is_none());

        let outcome = panel.login("manager@edupanel.test", "password", None).await.unwrap();
        assert_eq!(outcome.redirect_to, "/manager/dashboard");

        let restarted = panel_over(Arc::new(FileStorage::new(&path)));
        assert_eq!(restarted.start().session().and_then(|s| s.role), Some(Role::Manager));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = Config {
            audit_capacity: 0,
            ..Config::default()
        };
        let backend = Arc::new(InMemoryAuthBackend::new(&config));
        assert!(Panel::new(&config, Arc::new(MemoryStorage::new()), backend).is_err());
    }
}
