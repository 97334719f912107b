use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use flight_handoff::config::MirrorConfig;
use flight_handoff::coordinator::AdvisoryFields;
use flight_handoff::mirror::DiscrepancyKind;
use flight_handoff::websocket::ServerEvent;
use flight_handoff::{
    FlightError, FlightStatus, FlightStore, HandoffCoordinator, HandoffEngine, MemoryMirror,
    MirrorSync, NewFlight, Station,
};
use tokio::sync::mpsc;

/// Scratch snapshot directory under target/, unique per test
fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "target/it_handoff_{}_{}",
        name,
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn coordinator(name: &str) -> (HandoffCoordinator, Arc<MemoryMirror>, PathBuf) {
    let dir = scratch(name);
    let store = FlightStore::open(dir.join("flights.json")).unwrap();
    let memory = Arc::new(MemoryMirror::new());
    let mirror = MirrorSync::spawn(memory.clone(), &MirrorConfig::default());
    (HandoffCoordinator::new(store, mirror), memory, dir)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

#[test]
fn qa_chain_reaches_stable_cen() {
    let dir = scratch("chain");
    let mut store = FlightStore::open(dir.join("flights.json")).unwrap();
    let flight = store.add(NewFlight::new("CPA999", "VHHH", "ZBAA")).unwrap();

    let mut current = flight.current_control;
    for _ in 0..5 {
        let outcome = HandoffEngine::transfer(&mut store, &flight.id, current.next()).unwrap();
        current = outcome.flight.current_control;
    }

    let settled = store.get_by_id(&flight.id).unwrap().clone();
    assert_eq!(settled.current_control, Station::Cen);
    assert_eq!(settled.next_control, Station::Cen);
    assert_eq!(settled.status, FlightStatus::Cruising);
    assert_eq!(settled.altitude, 35000);

    // Repeating the last step changes nothing
    let again = HandoffEngine::transfer(&mut store, &flight.id, Station::Cen).unwrap();
    assert_eq!(again.flight, settled);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn qa_cpa999_reroute_scenario() {
    let dir = scratch("cpa999");
    let mut store = FlightStore::open(dir.join("flights.json")).unwrap();

    let flight = store.add(NewFlight::new("CPA999", "VHHH", "ZBAA")).unwrap();
    assert_eq!(flight.current_control, Station::Del);
    assert_eq!(flight.next_control, Station::Gnd);
    assert_eq!(flight.altitude, 0);

    let at_gnd = HandoffEngine::transfer(&mut store, &flight.id, Station::Gnd).unwrap();
    assert_eq!(at_gnd.flight.status, FlightStatus::Taxiing);
    assert_eq!(at_gnd.flight.next_control, Station::Twr);
    assert_eq!(at_gnd.flight.altitude, 0);

    // Skip TWR
    let at_app = HandoffEngine::transfer(&mut store, &flight.id, Station::App).unwrap();
    assert!(!at_app.is_chain_step());
    assert_eq!(at_app.flight.status, FlightStatus::Departed);
    assert_eq!(at_app.flight.altitude, 5000);
    assert_eq!(at_app.flight.next_control, Station::Cen);

    // Survives a restart
    drop(store);
    let reopened = FlightStore::open(dir.join("flights.json")).unwrap();
    assert_eq!(reopened.get_by_id(&flight.id).unwrap(), &at_app.flight);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn qa_corrupt_snapshot_left_untouched() {
    let dir = scratch("corrupt");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("flights.json");
    fs::write(&path, "[{\"id\": \"1\", \"callsign\": ").unwrap();

    let result = FlightStore::open(&path);
    assert!(matches!(result, Err(FlightError::CorruptSnapshot { .. })));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "[{\"id\": \"1\", \"callsign\": "
    );

    let _ = fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn qa_listeners_agree_with_final_state() {
    let (coordinator, _memory, dir) = coordinator("listeners");
    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    coordinator.attach(tx_a).await;
    coordinator.attach(tx_b).await;

    let added = coordinator
        .add_flight(NewFlight::new("CPA999", "VHHH", "ZBAA"))
        .await
        .unwrap();
    let none = AdvisoryFields::default();
    coordinator
        .transfer_flight(&added.id, "GND", &none)
        .await
        .unwrap();
    coordinator
        .transfer_flight(&added.id, "APP", &none)
        .await
        .unwrap();

    let a = drain(&mut rx_a);
    let b = drain(&mut rx_b);
    let names = |events: &[ServerEvent]| events.iter().map(|e| e.name()).collect::<Vec<_>>();
    assert_eq!(names(&a), names(&b));
    assert_eq!(
        names(&a),
        vec!["connected", "flight_added", "flight_updated", "flight_updated"]
    );

    let last_seen = match a.last().unwrap() {
        ServerEvent::FlightUpdated { flight } => flight.clone(),
        other => panic!("unexpected {:?}", other),
    };
    assert_eq!(coordinator.get_flight(&added.id).await.unwrap(), last_seen);

    let _ = fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn qa_duplicate_callsign_rejected() {
    let (coordinator, _memory, dir) = coordinator("duplicate");
    let before = coordinator.flights().await.len();

    let err = coordinator
        .add_flight(NewFlight::new("CPA123", "VHHH", "ZBAA"))
        .await
        .unwrap_err();
    assert_eq!(err, FlightError::DuplicateCallsign("CPA123".into()));
    assert_eq!(coordinator.flights().await.len(), before);

    let _ = fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn qa_reconcile_tracks_mirror() {
    let (coordinator, memory, dir) = coordinator("reconcile");

    // Seed flights were never mirrored
    let report = coordinator.reconcile().await.unwrap();
    assert!(!report.matches);
    assert_eq!(report.mirror_count, 0);
    assert!(
        report
            .discrepancies
            .iter()
            .all(|d| d.kind == DiscrepancyKind::MissingInMirror)
    );

    let summary = coordinator.resync().await;
    assert_eq!(summary.succeeded, report.local_count);
    assert!(coordinator.reconcile().await.unwrap().matches);

    // Mirror failures never reach the requester
    memory.set_fail(true);
    let removed = coordinator.delete_flight("6").await.unwrap();
    coordinator.mirror().flush().await;
    memory.set_fail(false);

    let report = coordinator.reconcile().await.unwrap();
    assert!(!report.matches);
    assert_eq!(report.discrepancies.len(), 1);
    assert_eq!(report.discrepancies[0].callsign, removed.callsign);
    assert_eq!(report.discrepancies[0].kind, DiscrepancyKind::MissingLocally);
    assert_eq!(report.recent_failures.len(), 1);
    assert_eq!(report.recent_failures[0].op, "delete");

    let _ = fs::remove_dir_all(&dir);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn qa_concurrent_adds_admit_one_callsign() {
    let (coordinator, _memory, dir) = coordinator("concurrent_add");
    let coordinator = Arc::new(coordinator);
    let before = coordinator.flights().await.len();

    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .add_flight(NewFlight::new("RAC1", "VHHH", "ZBAA"))
                    .await
            })
        })
        .collect();

    let mut admitted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(flight) => {
                admitted += 1;
                assert_eq!(flight.callsign, "RAC1");
            }
            Err(e) => assert_eq!(e, FlightError::DuplicateCallsign("RAC1".into())),
        }
    }
    assert_eq!(admitted, 1);
    assert_eq!(coordinator.flights().await.len(), before + 1);

    // Snapshot agrees with memory
    let reopened = FlightStore::open(dir.join("flights.json")).unwrap();
    assert_eq!(
        reopened.all().iter().filter(|f| f.callsign == "RAC1").count(),
        1
    );

    let _ = fs::remove_dir_all(&dir);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn qa_transfer_racing_delete_is_serialized() {
    let (coordinator, _memory, dir) = coordinator("transfer_delete");
    let coordinator = Arc::new(coordinator);
    let (tx, mut rx) = mpsc::unbounded_channel();
    coordinator.attach(tx).await;

    let id = coordinator
        .add_flight(NewFlight::new("RAC2", "VHHH", "ZBAA"))
        .await
        .unwrap()
        .id;

    let stations = ["GND", "TWR", "APP", "CEN"];
    let mut transfers = Vec::new();
    for i in 0..24 {
        let coordinator = coordinator.clone();
        let id = id.clone();
        let to = stations[i % stations.len()];
        transfers.push(tokio::spawn(async move {
            coordinator
                .transfer_flight(&id, to, &AdvisoryFields::default())
                .await
        }));
    }
    let deleter = {
        let coordinator = coordinator.clone();
        let id = id.clone();
        tokio::spawn(async move { coordinator.delete_flight(&id).await })
    };

    let mut committed = 0;
    for task in transfers {
        match task.await.unwrap() {
            Ok(outcome) => {
                committed += 1;
                assert_eq!(outcome.flight.id, id);
            }
            Err(e) => assert_eq!(e, FlightError::FlightNotFound(id.clone())),
        }
    }
    assert_eq!(deleter.await.unwrap().unwrap().callsign, "RAC2");

    assert_eq!(
        coordinator.get_flight(&id).await,
        Err(FlightError::FlightNotFound(id.clone()))
    );
    let reopened = FlightStore::open(dir.join("flights.json")).unwrap();
    assert!(reopened.get_by_id(&id).is_err());

    // Every committed transfer was broadcast before the delete, none after
    let events = drain(&mut rx);
    let deleted_at = events
        .iter()
        .position(|e| matches!(e, ServerEvent::FlightDeleted { flight_id, .. } if *flight_id == id))
        .unwrap();
    let updates_before = events[..deleted_at]
        .iter()
        .filter(|e| matches!(e, ServerEvent::FlightUpdated { flight } if flight.id == id))
        .count();
    assert_eq!(updates_before, committed);
    assert!(events[deleted_at + 1..].is_empty());

    let _ = fs::remove_dir_all(&dir);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn qa_connected_is_first_frame_under_load() {
    let (coordinator, _memory, dir) = coordinator("attach_order");
    let coordinator = Arc::new(coordinator);

    let writer = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            for i in 0..40 {
                coordinator
                    .add_flight(NewFlight::new(&format!("RAC{}", i + 10), "VHHH", "ZBAA"))
                    .await
                    .unwrap();
            }
        })
    };

    let mut receivers = Vec::new();
    for _ in 0..20 {
        let (tx, rx) = mpsc::unbounded_channel();
        coordinator.attach(tx).await;
        receivers.push(rx);
        tokio::task::yield_now().await;
    }
    writer.await.unwrap();

    for mut rx in receivers {
        let first = rx.try_recv().unwrap();
        assert!(matches!(first, ServerEvent::Connected { .. }), "{:?}", first);
    }

    let _ = fs::remove_dir_all(&dir);
}
