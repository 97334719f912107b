//! Session Registry
//!
//! Tracks which controller is logged in on which connection. Purely in
//! memory; rebuilt from nothing on restart. Several sessions may share a
//! role, but a session id maps to exactly one record.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::core_types::{ControlRole, SessionId};

/// One logged-in controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: SessionId,
    pub control_type: ControlRole,
    pub user_name: String,
    pub login_time: DateTime<Utc>,
}

pub struct SessionRegistry {
    sessions: DashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Register `session_id`, replacing any previous record for it.
    pub fn login(
        &self,
        session_id: SessionId,
        control_type: ControlRole,
        user_name: impl Into<String>,
    ) -> Session {
        let session = Session {
            session_id,
            control_type,
            user_name: user_name.into(),
            login_time: Utc::now(),
        };

        if let Some(previous) = self.sessions.insert(session_id, session.clone()) {
            tracing::info!(
                session_id,
                previous_role = %previous.control_type,
                role = %control_type,
                "Session re-login replaced previous record"
            );
        } else {
            tracing::info!(
                session_id,
                role = %control_type,
                user = %session.user_name,
                "Session logged in"
            );
        }

        session
    }

    /// Remove `session_id`. Returns the removed record, `None` if absent.
    pub fn logout(&self, session_id: SessionId) -> Option<Session> {
        let removed = self.sessions.remove(&session_id).map(|(_, s)| s);
        if let Some(ref session) = removed {
            tracing::info!(
                session_id,
                role = %session.control_type,
                user = %session.user_name,
                "Session logged out"
            );
        }
        removed
    }

    pub fn get(&self, session_id: SessionId) -> Option<Session> {
        self.sessions.get(&session_id).map(|s| s.value().clone())
    }

    /// All active sessions, oldest login first
    pub fn all(&self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self.sessions.iter().map(|e| e.value().clone()).collect();
        sessions.sort_by_key(|s| (s.login_time, s.session_id));
        sessions
    }

    /// Session ids logged in as `role`
    pub fn by_role(&self, role: ControlRole) -> Vec<SessionId> {
        self.sessions
            .iter()
            .filter(|e| e.value().control_type == role)
            .map(|e| *e.key())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
