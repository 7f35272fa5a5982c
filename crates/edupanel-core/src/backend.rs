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

//! Authentication backend seam
//!
//! The REST backend that owns accounts is outside this crate. The panel only
//! needs two calls from it, captured by [`AuthBackend`]. [`InMemoryAuthBackend`]
//! implements them over a fixed user list for tests and the CLI host.

use crate::auth::{Claims, TokenIssuer};
use crate::config::Config;
use crate::error::{AccessError, AccessResult};
use crate::rbac::roles::Role;
use crate::session::Session;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Login request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login: the credential token and the user it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Session,
}

#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a token; rejected credentials are `Unauthorized`
    async fn login(&self, request: LoginRequest) -> AccessResult<LoginResponse>;

    /// Invalidate the server-side session behind `token`
    async fn logout(&self, token: &str) -> AccessResult<()>;
}

#[derive(Debug, Clone)]
struct Account {
    password: String,
    user: Session,
    active: bool,
}

/// Backend over an in-memory account list, issuing signed HS256 tokens
pub struct InMemoryAuthBackend {
    issuer: TokenIssuer,
    token_ttl: Duration,
    accounts: RwLock<HashMap<String, Account>>,
    /// Signed-out tokens by `jti`, kept until they would have expired anyway
    revoked: RwLock<HashMap<String, Claims>>,
}

impl InMemoryAuthBackend {
    pub fn new(config: &Config) -> Self {
        Self {
            issuer: TokenIssuer::new(&config.jwt_secret, &config.token_issuer),
            token_ttl: Duration::seconds(config.token_ttl_secs),
            accounts: RwLock::new(HashMap::new()),
            revoked: RwLock::new(HashMap::new()),
        }
    }

    /// One account per role, `<role>@edupanel.test` / `password`
    pub fn with_demo_accounts(config: &Config) -> Self {
        let backend = Self::new(config);
        for (index, role) in Role::ALL.into_iter().enumerate() {
            backend.add_account(
                Session {
                    id: format!("demo-{}", index + 1),
                    name: format!("Demo {}", role.display_name()),
                    email: format!("{}@edupanel.test", role.as_str()),
                    role: Some(role),
                    avatar: None,
                },
                "password",
            );
        }
        backend
    }

    /// Register or replace an account keyed by email
    pub fn add_account(&self, user: Session, password: &str) {
        let email = user.email.to_lowercase();
        self.accounts.write().insert(
            email,
            Account {
                password: password.to_string(),
                user,
                active: true,
            },
        );
    }

    pub fn deactivate(&self, email: &str) -> bool {
        match self.accounts.write().get_mut(&email.to_lowercase()) {
            Some(account) => {
                account.active = false;
                true
            }
            None => false,
        }
    }

    /// Verify a token and reject it once signed out
    pub fn authenticate(&self, token: &str) -> AccessResult<Claims> {
        let claims = self.issuer.verify(token).map_err(|e| AccessError::Unauthorized {
            message: format!("Invalid token: {e}"),
        })?;

        if self.revoked.read().contains_key(&claims.jti) {
            return Err(AccessError::Unauthorized {
                message: "Token has been signed out".to_string(),
            });
        }

        Ok(claims)
    }

    pub fn revoked_count(&self) -> usize {
        self.revoked.read().len()
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }
}

#[async_trait]
impl AuthBackend for InMemoryAuthBackend {
    async fn login(&self, request: LoginRequest) -> AccessResult<LoginResponse> {
        let account = self.accounts.read().get(&request.email.to_lowercase()).cloned();

        // Unknown email and wrong password are indistinguishable to the caller
        let account = match account {
            Some(account) if account.password == request.password => account,
            _ => {
                warn!(email = %request.email, "Rejected login attempt");
                return Err(AccessError::Unauthorized {
                    message: "Invalid email or password".to_string(),
                });
            }
        };

        if !account.active {
            return Err(AccessError::Forbidden {
                message: "Account is disabled".to_string(),
            });
        }

        let token = self.issuer.issue(&account.user, Utc::now(), self.token_ttl)?;
        info!(user_id = %account.user.id, role = ?account.user.role, "Issued login token");

        Ok(LoginResponse { token, user: account.user })
    }

    async fn logout(&self, token: &str) -> AccessResult<()> {
        let claims = self.authenticate(token)?;
        let now = Utc::now();

        let mut revoked = self.revoked.write();
        revoked.retain(|_, revoked_claims| !revoked_claims.is_expired_at(now));
        debug!(user_id = %claims.sub, jti = %claims.jti, "Token revoked");
        revoked.insert(claims.jti.clone(), claims);
        Ok(())
    }
}
