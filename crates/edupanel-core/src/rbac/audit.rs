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

//! Audit trail for access decisions

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{info, warn};

/// Actor recorded for decisions made without a session
pub const ANONYMOUS: &str = "anonymous";

/// Audit event types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// Guard decision for a navigation
    Navigation,
    /// Startup session rehydration
    SessionRestored,
    Login,
    Logout,
}

/// Audit event result
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditResult {
    Allowed,
    Redirected,
    Denied,
    Failed,
}

/// Audit event entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: String,
    pub event_type: AuditEventType,
    pub timestamp: DateTime<Utc>,
    /// User id, or [`ANONYMOUS`]
    pub actor: String,
    pub path: Option<String>,
    pub result: AuditResult,
    pub detail: Option<String>,
}

impl AuditEvent {
    pub fn new(event_type: AuditEventType, actor: impl Into<String>, result: AuditResult) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            timestamp: Utc::now(),
            actor: actor.into(),
            path: None,
            result,
            detail: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Bounded in-memory audit log, mirrored to structured logging
#[derive(Debug)]
pub struct AccessAuditLog {
    events: Mutex<VecDeque<AuditEvent>>,
    max_events: usize,
}

impl Default for AccessAuditLog {
    fn default() -> Self {
        Self::with_max_events(1000)
    }
}

impl AccessAuditLog {
    pub fn with_max_events(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(1024))),
            max_events: max_events.max(1),
        }
    }

    /// Record an event, dropping the oldest when full
    pub fn record(&self, event: AuditEvent) {
        match event.result {
            AuditResult::Allowed | AuditResult::Redirected => info!(
                event_type = ?event.event_type,
                actor = %event.actor,
                path = ?event.path,
                result = ?event.result,
                detail = ?event.detail,
                "Access audit event"
            ),
            AuditResult::Denied | AuditResult::Failed => warn!(
                event_type = ?event.event_type,
                actor = %event.actor,
                path = ?event.path,
                result = ?event.result,
                detail = ?event.detail,
                "Access audit event"
            ),
        }

        let mut events = self.events.lock();
        if events.len() == self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Most recent events, newest last
    pub fn recent(&self, limit: usize) -> Vec<AuditEvent> {
        let events = self.events.lock();
        events.iter().skip(events.len().saturating_sub(limit)).cloned().collect()
    }

    pub fn by_actor(&self, actor: &str) -> Vec<AuditEvent> {
        self.events.lock().iter().filter(|e| e.actor == actor).cloned().collect()
    }

    pub fn by_result(&self, result: AuditResult) -> Vec<AuditEvent> {
        self.events.lock().iter().filter(|e| e.result == result).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}
