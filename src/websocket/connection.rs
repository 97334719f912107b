//! WebSocket connection manager
//!
//! Maps each attached connection (one per session id) to the channel feeding
//! its socket writer. Channels are unbounded FIFOs, so events pushed in
//! commit order are written in commit order.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

use super::messages::ServerEvent;
use crate::core_types::SessionId;

/// WebSocket sender channel type
pub type WsSender = mpsc::UnboundedSender<ServerEvent>;

pub struct ConnectionManager {
    connections: DashMap<SessionId, WsSender>,
    next_session_id: AtomicU64,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            next_session_id: AtomicU64::new(1),
        }
    }

    /// Attach a new connection and assign its session id.
    pub fn add_connection(&self, tx: WsSender) -> SessionId {
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        self.connections.insert(session_id, tx);

        tracing::info!(
            session_id,
            total_connections = self.connections.len(),
            "WebSocket connection added"
        );

        session_id
    }

    pub fn remove_connection(&self, session_id: SessionId) {
        if self.connections.remove(&session_id).is_some() {
            tracing::info!(
                session_id,
                remaining_connections = self.connections.len(),
                "WebSocket connection removed"
            );
        }
    }

    /// Send to one connection. Returns `false` if it is gone.
    pub fn send_to(&self, session_id: SessionId, event: ServerEvent) -> bool {
        match self.connections.get(&session_id) {
            Some(tx) => {
                if tx.send(event).is_err() {
                    // Removal is handled by the socket handler on close
                    tracing::warn!(session_id, "Failed to send - client disconnected");
                    false
                } else {
                    true
                }
            }
            None => false,
        }
    }

    /// Send to every attached connection. Returns the number reached.
    pub fn send_to_all(&self, event: &ServerEvent) -> usize {
        self.send_filtered(event, |_| true)
    }

    /// Send to every attached connection except `skip`.
    pub fn send_to_others(&self, skip: SessionId, event: &ServerEvent) -> usize {
        self.send_filtered(event, |id| id != skip)
    }

    fn send_filtered(&self, event: &ServerEvent, include: impl Fn(SessionId) -> bool) -> usize {
        let mut delivered = 0;
        for entry in self.connections.iter() {
            if include(*entry.key()) && entry.value().send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        tracing::debug!(
            message_type = event.name(),
            recipients = delivered,
            "Message fanned out"
        );
        delivered
    }

    pub fn is_connected(&self, session_id: SessionId) -> bool {
        self.connections.contains_key(&session_id)
    }

    /// Number of attached connections
    pub fn count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
