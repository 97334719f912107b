//! Handoff Coordinator
//!
//! The single serialization point of the core. Every mutating entry point
//! (add, transfer, edit, delete, login, logout, snapshot delivery) takes the
//! same async mutex around the flight store, commits, and feeds the
//! broadcast channels before releasing it. Mirror jobs are queued after the
//! commit and never affect the outcome returned to the requester.
//!
//! ```text
//! WS / HTTP ──▶ lock(store) ──▶ commit ──▶ broadcast ──▶ unlock
//!                                   │
//!                                   └──▶ mirror queue (detached)
//! ```

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::core_types::{ControlRole, SessionId, Station};
use crate::flight::{Flight, FlightError, FlightPatch, NewFlight, RemarksEdit};
use crate::handoff::{HandoffEngine, HandoffOutcome};
use crate::mirror::{MirrorError, MirrorRow, MirrorSync, ReconcileReport, ResyncSummary};
use crate::session::{Session, SessionRegistry};
use crate::store::FlightStore;
use crate::websocket::broadcast::Broadcaster;
use crate::websocket::connection::{ConnectionManager, WsSender};
use crate::websocket::messages::{ClientEvent, ServerEvent};

/// Client-supplied values that the engine recomputes anyway
#[derive(Debug, Clone, Default)]
pub struct AdvisoryFields {
    pub from_control: Option<String>,
    pub new_status: Option<String>,
    pub new_position: Option<String>,
}

pub struct HandoffCoordinator {
    store: Mutex<FlightStore>,
    sessions: Arc<SessionRegistry>,
    connections: Arc<ConnectionManager>,
    broadcaster: Broadcaster,
    mirror: MirrorSync,
}

impl HandoffCoordinator {
    pub fn new(store: FlightStore, mirror: MirrorSync) -> Self {
        let sessions = Arc::new(SessionRegistry::new());
        let connections = Arc::new(ConnectionManager::new());
        let broadcaster = Broadcaster::new(connections.clone(), sessions.clone());
        Self {
            store: Mutex::new(store),
            sessions,
            connections,
            broadcaster,
            mirror,
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    pub fn mirror(&self) -> &MirrorSync {
        &self.mirror
    }

    // ========================================================================
    // Connection lifecycle
    // ========================================================================

    /// Register a new connection and greet it with its session id.
    ///
    /// Runs under the store lock so `connected` is always the first frame a
    /// connection sees, ahead of any concurrently committed broadcast.
    pub async fn attach(&self, tx: WsSender) -> SessionId {
        let _guard = self.store.lock().await;
        let session_id = self.connections.add_connection(tx);
        self.broadcaster
            .reply(session_id, ServerEvent::Connected { session_id });
        session_id
    }

    /// Drop a connection, logging its session out if it had one.
    pub async fn detach(&self, session_id: SessionId) {
        let _guard = self.store.lock().await;
        self.connections.remove_connection(session_id);
        if let Some(session) = self.sessions.logout(session_id) {
            self.broadcaster.users_update();
            self.broadcaster.user_disconnected(&session);
        }
    }

    /// Bind `session_id` to a control role and send it the current flights.
    pub async fn login(
        &self,
        session_id: SessionId,
        control_type: &str,
        user_name: &str,
    ) -> Result<Session, FlightError> {
        let role = control_type.parse::<ControlRole>()?;

        let store = self.store.lock().await;
        let session = self.sessions.login(session_id, role, user_name);
        self.broadcaster.reply(
            session_id,
            ServerEvent::FlightsData {
                flights: store.all().to_vec(),
            },
        );
        self.broadcaster.users_update();
        self.broadcaster.user_connected(&session);
        Ok(session)
    }

    /// Remove the session record but keep the connection attached.
    pub async fn logout(&self, session_id: SessionId) -> Option<Session> {
        let _guard = self.store.lock().await;
        let session = self.sessions.logout(session_id)?;
        self.broadcaster.users_update();
        self.broadcaster.user_disconnected(&session);
        Some(session)
    }

    /// Send the full flight list to one connection.
    pub async fn send_snapshot(&self, session_id: SessionId) {
        let store = self.store.lock().await;
        self.broadcaster.reply(
            session_id,
            ServerEvent::FlightsData {
                flights: store.all().to_vec(),
            },
        );
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn flights(&self) -> Vec<Flight> {
        self.store.lock().await.all().to_vec()
    }

    pub async fn flights_by_control(&self, station: Station) -> Vec<Flight> {
        let store = self.store.lock().await;
        store.get_by_control(station).into_iter().cloned().collect()
    }

    pub async fn get_flight(&self, id: &str) -> Result<Flight, FlightError> {
        self.store.lock().await.get_by_id(id).cloned()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub async fn add_flight(&self, req: NewFlight) -> Result<Flight, FlightError> {
        let flight = {
            let mut store = self.store.lock().await;
            let flight = store.add(req)?;
            let delivery = self.broadcaster.flight_added(&flight);
            info!(
                flight_id = %flight.id,
                callsign = %flight.callsign,
                broadcast = delivery.broadcast,
                "Flight added"
            );
            flight
        };
        self.mirror.mirror_upsert(&flight);
        Ok(flight)
    }

    /// Hand a flight to `to_control`. Re-routing off the chain is allowed.
    pub async fn transfer_flight(
        &self,
        flight_id: &str,
        to_control: &str,
        advisory: &AdvisoryFields,
    ) -> Result<HandoffOutcome, FlightError> {
        let outcome = {
            let mut store = self.store.lock().await;
            let outcome = HandoffEngine::transfer_to_code(&mut store, flight_id, to_control)?;
            let delivery = self.broadcaster.handoff(&outcome);
            info!(
                flight_id,
                callsign = %outcome.flight.callsign,
                from = %outcome.from_control,
                to = %outcome.to_control,
                broadcast = delivery.broadcast,
                notified = delivery.notified,
                "Flight transferred"
            );
            outcome
        };
        log_advisory_mismatch(&outcome, advisory);
        self.mirror.mirror_upsert(&outcome.flight);
        Ok(outcome)
    }

    pub async fn edit_remarks(&self, flight_id: &str, remarks: &str) -> Result<Flight, FlightError> {
        let edit = RemarksEdit {
            remarks: remarks.to_string(),
        };
        edit.validate()?;

        let flight = {
            let mut store = self.store.lock().await;
            let flight = store.update(flight_id, FlightPatch::remarks(edit.remarks))?;
            self.broadcaster.flight_updated(&flight);
            debug!(flight_id, callsign = %flight.callsign, "Flight remarks edited");
            flight
        };
        self.mirror.mirror_upsert(&flight);
        Ok(flight)
    }

    pub async fn delete_flight(&self, flight_id: &str) -> Result<Flight, FlightError> {
        let removed = {
            let mut store = self.store.lock().await;
            let removed = store.remove(flight_id)?;
            let delivery = self.broadcaster.flight_deleted(&removed);
            info!(
                flight_id,
                callsign = %removed.callsign,
                broadcast = delivery.broadcast,
                "Flight deleted"
            );
            removed
        };
        self.mirror.mirror_delete(&removed.callsign);
        Ok(removed)
    }

    // ========================================================================
    // WebSocket dispatch
    // ========================================================================

    /// Apply one inbound frame. Failures are answered with an `error` frame
    /// to the sender only.
    pub async fn handle_client_event(&self, session_id: SessionId, event: ClientEvent) {
        let request = event.name();
        let result = match event {
            ClientEvent::Login {
                control_type,
                user_name,
            } => self
                .login(session_id, &control_type, &user_name)
                .await
                .map(|_| ()),
            ClientEvent::InfoScreenConnect => {
                debug!(session_id, "Info screen connected");
                self.send_snapshot(session_id).await;
                Ok(())
            }
            ClientEvent::GetFlights => {
                self.send_snapshot(session_id).await;
                Ok(())
            }
            ClientEvent::FlightTransfer {
                flight_id,
                from_control,
                to_control,
                new_status,
                new_position,
            } => {
                let advisory = AdvisoryFields {
                    from_control,
                    new_status,
                    new_position,
                };
                self.transfer_flight(&flight_id, &to_control, &advisory)
                    .await
                    .map(|_| ())
            }
            ClientEvent::FlightAdd(req) => self.add_flight(req).await.map(|_| ()),
            ClientEvent::FlightDelete { flight_id } => {
                self.delete_flight(&flight_id).await.map(|_| ())
            }
            ClientEvent::FlightEdit { flight_id, remarks } => {
                self.edit_remarks(&flight_id, &remarks).await.map(|_| ())
            }
            ClientEvent::Ping => {
                self.broadcaster.reply(session_id, ServerEvent::Pong);
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!(session_id, request, code = e.code(), error = %e, "Request rejected");
            self.broadcaster
                .reply(session_id, ServerEvent::from_error(&e, request));
        }
    }

    // ========================================================================
    // Mirror diagnostics
    // ========================================================================

    /// Compare the local set against the mirror. The store lock is held
    /// only while copying the local set.
    pub async fn reconcile(&self) -> Result<ReconcileReport, MirrorError> {
        let local = self.flights().await;
        self.mirror.reconcile(&local).await
    }

    pub async fn resync(&self) -> ResyncSummary {
        let local = self.flights().await;
        self.mirror.resync_all(&local).await
    }

    pub async fn mirror_rows(&self) -> Result<Vec<MirrorRow>, MirrorError> {
        self.mirror.mirror_rows().await
    }
}

fn log_advisory_mismatch(outcome: &HandoffOutcome, advisory: &AdvisoryFields) {
    let flight = &outcome.flight;
    if let Some(from) = advisory.from_control.as_deref()
        && !from.eq_ignore_ascii_case(outcome.from_control.as_str())
    {
        debug!(
            flight_id = %flight.id,
            claimed = from,
            actual = %outcome.from_control,
            "Transfer fromControl disagrees with store"
        );
    }
    if let Some(status) = advisory.new_status.as_deref()
        && status != flight.status.as_str()
    {
        debug!(
            flight_id = %flight.id,
            claimed = status,
            derived = %flight.status,
            "Transfer newStatus ignored"
        );
    }
    if let Some(position) = advisory.new_position.as_deref()
        && position != flight.position
    {
        debug!(
            flight_id = %flight.id,
            claimed = position,
            derived = %flight.position,
            "Transfer newPosition ignored"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MirrorConfig;
    use crate::core_types::FlightStatus;
    use crate::mirror::MemoryMirror;
    use std::fs;
    use std::path::PathBuf;
    use tokio::sync::mpsc;

    struct Harness {
        coordinator: HandoffCoordinator,
        memory: Arc<MemoryMirror>,
        dir: PathBuf,
    }

    impl Drop for Harness {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.dir);
        }
    }

    fn harness(name: &str) -> Harness {
        let dir = PathBuf::from(format!(
            "target/test_coordinator_{}_{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        let store = FlightStore::open(dir.join("flights.json")).unwrap();
        let memory = Arc::new(MemoryMirror::new());
        let mirror = MirrorSync::spawn(memory.clone(), &MirrorConfig::default());
        Harness {
            coordinator: HandoffCoordinator::new(store, mirror),
            memory,
            dir,
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[tokio::test]
    async fn test_login_receives_snapshot_and_presence() {
        let h = harness("login");
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let a = h.coordinator.attach(tx_a).await;
        let _b = h.coordinator.attach(tx_b).await;

        h.coordinator
            .handle_client_event(
                a,
                ClientEvent::Login {
                    control_type: "gnd".into(),
                    user_name: "ground-1".into(),
                },
            )
            .await;

        let names: Vec<_> = drain(&mut rx_a).iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["connected", "flights_data", "users_update"]);

        let names: Vec<_> = drain(&mut rx_b).iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["connected", "users_update", "user_connected"]);

        assert_eq!(h.coordinator.sessions().count(), 1);
    }

    #[tokio::test]
    async fn test_bad_login_role_is_rejected() {
        let h = harness("bad_login");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = h.coordinator.attach(tx).await;

        h.coordinator
            .handle_client_event(
                id,
                ClientEvent::Login {
                    control_type: "XYZ".into(),
                    user_name: "nobody".into(),
                },
            )
            .await;

        match drain(&mut rx).pop().unwrap() {
            ServerEvent::Error { code, request, .. } => {
                assert_eq!(code, "INVALID_STATION");
                assert_eq!(request.as_deref(), Some("login"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(h.coordinator.sessions().count(), 0);
    }

    #[tokio::test]
    async fn test_transfer_scoped_and_mirrored() {
        let h = harness("transfer");
        let (tx_twr, mut rx_twr) = mpsc::unbounded_channel();
        let (tx_gnd, mut rx_gnd) = mpsc::unbounded_channel();
        let twr = h.coordinator.attach(tx_twr).await;
        let gnd = h.coordinator.attach(tx_gnd).await;
        h.coordinator.login(twr, "TWR", "tower").await.unwrap();
        h.coordinator.login(gnd, "GND", "ground").await.unwrap();
        drain(&mut rx_twr);
        drain(&mut rx_gnd);

        let outcome = h
            .coordinator
            .transfer_flight("3", "TWR", &AdvisoryFields::default())
            .await
            .unwrap();
        assert_eq!(outcome.flight.status, FlightStatus::Ready);

        let names: Vec<_> = drain(&mut rx_twr).iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["flight_updated", "flight_transfer"]);
        let names: Vec<_> = drain(&mut rx_gnd).iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["flight_updated"]);

        h.coordinator.mirror().flush().await;
        assert!(h.memory.get(&outcome.flight.callsign).is_some());
    }

    #[tokio::test]
    async fn test_mirror_failure_does_not_affect_commit() {
        let h = harness("mirror_down");
        h.memory.set_fail(true);

        let flight = h
            .coordinator
            .add_flight(NewFlight::new("CPA999", "VHHH", "ZBAA"))
            .await
            .unwrap();
        h.coordinator.mirror().flush().await;

        assert_eq!(h.coordinator.get_flight(&flight.id).await.unwrap(), flight);
        let failures = h.coordinator.mirror().recent_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].tag, "CPA999");
    }

    #[tokio::test]
    async fn test_edit_and_delete() {
        let h = harness("edit_delete");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = h.coordinator.attach(tx).await;

        let edited = h.coordinator.edit_remarks("1", "VIP onboard").await.unwrap();
        assert_eq!(edited.remarks, "VIP onboard");

        let too_long = "x".repeat(300);
        assert!(matches!(
            h.coordinator.edit_remarks("1", &too_long).await,
            Err(FlightError::InvalidFlight(_))
        ));

        let removed = h.coordinator.delete_flight("1").await.unwrap();
        assert_eq!(removed.callsign, "CPA123");
        assert!(matches!(
            h.coordinator.get_flight("1").await,
            Err(FlightError::FlightNotFound(_))
        ));

        h.coordinator
            .handle_client_event(
                id,
                ClientEvent::FlightDelete {
                    flight_id: "1".into(),
                },
            )
            .await;

        let names: Vec<_> = drain(&mut rx).iter().map(|e| e.name()).collect();
        assert_eq!(
            names,
            vec!["connected", "flight_updated", "flight_deleted", "error"]
        );
    }

    #[tokio::test]
    async fn test_detach_announces_departure() {
        let h = harness("detach");
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let a = h.coordinator.attach(tx_a).await;
        let _b = h.coordinator.attach(tx_b).await;
        h.coordinator.login(a, "CON", "supervisor").await.unwrap();
        drain(&mut rx_b);

        h.coordinator.detach(a).await;
        assert_eq!(h.coordinator.sessions().count(), 0);
        assert_eq!(h.coordinator.connections().count(), 1);

        let names: Vec<_> = drain(&mut rx_b).iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["users_update", "user_disconnected"]);
    }
}
