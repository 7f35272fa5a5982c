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

//! Credential tokens
//!
//! Two separate concerns live here. [`token_expiry`] reads the `exp` claim
//! out of a stored token without verifying its signature, which is all the
//! client side can do: the backend remains the authority on validity.
//! [`TokenIssuer`] signs HS256 tokens for the in-memory backend.

use crate::error::AccessResult;
use crate::rbac::roles::Role;
use crate::session::Session;
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Role the token was issued for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// Unique token identifier
    pub jti: String,
}

impl Claims {
    /// Create new claims for a session
    pub fn new(session: &Session, issuer: &str, issued_at: DateTime<Utc>, expires_in: Duration) -> Self {
        Self {
            sub: session.id.clone(),
            iss: issuer.to_string(),
            exp: (issued_at + expires_in).timestamp(),
            iat: issued_at.timestamp(),
            role: session.role,
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Check if the token is expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }
}

/// Signs and verifies HS256 tokens
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
}

impl TokenIssuer {
    pub fn new(secret: &str, issuer: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            validation,
            issuer: issuer.to_string(),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issue a token for `session`, valid for `expires_in` from `issued_at`
    pub fn issue(&self, session: &Session, issued_at: DateTime<Utc>, expires_in: Duration) -> AccessResult<String> {
        let claims = Claims::new(session, &self.issuer, issued_at, expires_in);
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Verify signature, issuer and expiry
    pub fn verify(&self, token: &str) -> AccessResult<Claims> {
        Ok(decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims)
    }
}

/// Expiry encoded in a token's payload, to millisecond precision
///
/// Returns `None` when the token has no payload segment, the segment is not
/// base64 (URL-safe or standard, padding optional), the payload is not a JSON
/// object, or it has no numeric `exp`.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1).map(|segment| segment.trim_end_matches('=')).filter(|segment| !segment.is_empty())?;

    let bytes = general_purpose::URL_SAFE_NO_PAD.decode(payload).or_else(|_| general_purpose::STANDARD_NO_PAD.decode(payload)).ok()?;

    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp_secs = claims.as_object()?.get("exp")?.as_f64()?;

    Utc.timestamp_millis_opt((exp_secs * 1000.0) as i64).single()
}

/// Whether a stored token is present, readable and unexpired at `now`
pub fn is_token_live_at(token: &str, now: DateTime<Utc>) -> bool {
    match token_expiry(token) {
        Some(expiry) => expiry.timestamp_millis() >= now.timestamp_millis(),
        None => false,
    }
}
