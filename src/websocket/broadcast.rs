//! Broadcast Fabric
//!
//! Turns committed store mutations into frames for every attached
//! connection, plus the role-scoped transfer notification for sessions of
//! the receiving station.
//!
//! All methods are synchronous and must be called inside the coordinator's
//! critical section, right after the commit. That is what makes global
//! commit order equal to delivery order on every connection.

use std::sync::Arc;

use chrono::Utc;

use super::connection::ConnectionManager;
use super::messages::ServerEvent;
use crate::core_types::{ControlRole, SessionId};
use crate::flight::Flight;
use crate::handoff::HandoffOutcome;
use crate::session::{Session, SessionRegistry};

/// Delivery counts, mostly for logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Connections that received the broadcast frame
    pub broadcast: usize,
    /// Sessions that received the scoped notification
    pub notified: usize,
}

pub struct Broadcaster {
    connections: Arc<ConnectionManager>,
    sessions: Arc<SessionRegistry>,
}

impl Broadcaster {
    pub fn new(connections: Arc<ConnectionManager>, sessions: Arc<SessionRegistry>) -> Self {
        Self {
            connections,
            sessions,
        }
    }

    pub fn flight_added(&self, flight: &Flight) -> Delivery {
        self.to_all(ServerEvent::FlightAdded {
            flight: flight.clone(),
        })
    }

    pub fn flight_updated(&self, flight: &Flight) -> Delivery {
        self.to_all(ServerEvent::FlightUpdated {
            flight: flight.clone(),
        })
    }

    pub fn flight_deleted(&self, flight: &Flight) -> Delivery {
        self.to_all(ServerEvent::FlightDeleted {
            flight_id: flight.id.clone(),
            callsign: flight.callsign.clone(),
        })
    }

    /// `flight_updated` to everyone, then `flight_transfer` to the sessions
    /// logged in as the receiving station.
    pub fn handoff(&self, outcome: &HandoffOutcome) -> Delivery {
        let mut delivery = self.flight_updated(&outcome.flight);

        let notification = ServerEvent::FlightTransfer {
            flight: outcome.flight.clone(),
            from_control: outcome.from_control,
            to_control: outcome.to_control,
            timestamp: Utc::now(),
        };
        for session_id in self.sessions.by_role(ControlRole::from(outcome.to_control)) {
            if self.connections.send_to(session_id, notification.clone()) {
                delivery.notified += 1;
            }
        }

        tracing::debug!(
            target: "handoff_trace",
            flight_id = %outcome.flight.id,
            to = %outcome.to_control,
            broadcast = delivery.broadcast,
            notified = delivery.notified,
            "Handoff broadcast"
        );
        delivery
    }

    /// Full session list to everyone
    pub fn users_update(&self) -> Delivery {
        self.to_all(ServerEvent::UsersUpdate {
            users: self.sessions.all(),
        })
    }

    /// Presence notice to every connection except the session itself
    pub fn user_connected(&self, session: &Session) -> Delivery {
        let event = ServerEvent::UserConnected {
            user_name: session.user_name.clone(),
            control_type: session.control_type,
            session_id: session.session_id,
            timestamp: Utc::now(),
        };
        self.to_others(session.session_id, event)
    }

    pub fn user_disconnected(&self, session: &Session) -> Delivery {
        let event = ServerEvent::UserDisconnected {
            user_name: session.user_name.clone(),
            control_type: session.control_type,
            session_id: session.session_id,
            timestamp: Utc::now(),
        };
        self.to_others(session.session_id, event)
    }

    /// Reply to a single connection
    pub fn reply(&self, session_id: SessionId, event: ServerEvent) -> bool {
        self.connections.send_to(session_id, event)
    }

    fn to_all(&self, event: ServerEvent) -> Delivery {
        Delivery {
            broadcast: self.connections.send_to_all(&event),
            notified: 0,
        }
    }

    fn to_others(&self, skip: SessionId, event: ServerEvent) -> Delivery {
        Delivery {
            broadcast: self.connections.send_to_others(skip, &event),
            notified: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Station;
    use crate::flight::{FlightPatch, NewFlight};
    use tokio::sync::mpsc;

    struct Harness {
        broadcaster: Broadcaster,
        connections: Arc<ConnectionManager>,
        sessions: Arc<SessionRegistry>,
    }

    impl Harness {
        fn new() -> Self {
            let connections = Arc::new(ConnectionManager::new());
            let sessions = Arc::new(SessionRegistry::new());
            Self {
                broadcaster: Broadcaster::new(connections.clone(), sessions.clone()),
                connections,
                sessions,
            }
        }

        fn attach(
            &self,
            role: Option<ControlRole>,
        ) -> (SessionId, mpsc::UnboundedReceiver<ServerEvent>) {
            let (tx, rx) = mpsc::unbounded_channel();
            let id = self.connections.add_connection(tx);
            if let Some(role) = role {
                self.sessions.login(id, role, format!("user-{}", id));
            }
            (id, rx)
        }
    }

    fn handoff_outcome(to: Station) -> HandoffOutcome {
        let mut flight = Flight::create("9".into(), NewFlight::new("CPA999", "VHHH", "ZBAA"));
        FlightPatch::handoff(to).apply(&mut flight);
        HandoffOutcome {
            flight,
            from_control: Station::Del,
            to_control: to,
        }
    }

    #[test]
    fn test_handoff_notifies_only_target_role() {
        let h = Harness::new();
        let (_, mut gnd1) = h.attach(Some(ControlRole::Gnd));
        let (_, mut gnd2) = h.attach(Some(ControlRole::Gnd));
        let (_, mut twr) = h.attach(Some(ControlRole::Twr));
        let (_, mut screen) = h.attach(None);

        let delivery = h.broadcaster.handoff(&handoff_outcome(Station::Gnd));
        assert_eq!(delivery.broadcast, 4);
        assert_eq!(delivery.notified, 2);

        for rx in [&mut gnd1, &mut gnd2] {
            assert!(matches!(
                rx.try_recv().unwrap(),
                ServerEvent::FlightUpdated { .. }
            ));
            match rx.try_recv().unwrap() {
                ServerEvent::FlightTransfer {
                    from_control,
                    to_control,
                    ..
                } => {
                    assert_eq!(from_control, Station::Del);
                    assert_eq!(to_control, Station::Gnd);
                }
                other => panic!("unexpected {:?}", other),
            }
        }

        for rx in [&mut twr, &mut screen] {
            assert!(matches!(
                rx.try_recv().unwrap(),
                ServerEvent::FlightUpdated { .. }
            ));
            assert!(rx.try_recv().is_err());
        }
    }

    #[test]
    fn test_listeners_see_same_order() {
        let h = Harness::new();
        let (_, mut a) = h.attach(Some(ControlRole::Con));
        let (_, mut b) = h.attach(None);

        let flight = Flight::create("1".into(), NewFlight::new("CPA999", "VHHH", "ZBAA"));
        h.broadcaster.flight_added(&flight);
        h.broadcaster.handoff(&handoff_outcome(Station::Gnd));
        h.broadcaster.flight_deleted(&flight);

        for rx in [&mut a, &mut b] {
            let names: Vec<&str> = std::iter::from_fn(|| rx.try_recv().ok())
                .map(|e| e.name())
                .collect();
            assert_eq!(names, vec!["flight_added", "flight_updated", "flight_deleted"]);
        }
    }

    #[test]
    fn test_presence_skips_self() {
        let h = Harness::new();
        let (id, mut me) = h.attach(Some(ControlRole::App));
        let (_, mut other) = h.attach(None);

        let session = h.sessions.get(id).unwrap();
        assert_eq!(h.broadcaster.user_connected(&session).broadcast, 1);
        assert!(me.try_recv().is_err());
        assert!(matches!(
            other.try_recv().unwrap(),
            ServerEvent::UserConnected { .. }
        ));

        assert_eq!(h.broadcaster.users_update().broadcast, 2);
        match me.try_recv().unwrap() {
            ServerEvent::UsersUpdate { users } => assert_eq!(users.len(), 1),
            other => panic!("unexpected {:?}", other),
        }
    }
}
