use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::coordinator::HandoffCoordinator;

/// Gateway shared state
#[derive(Clone)]
pub struct AppState {
    /// Single serialization point for every flight and session operation
    pub coordinator: Arc<HandoffCoordinator>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(coordinator: Arc<HandoffCoordinator>) -> Self {
        Self {
            coordinator,
            started_at: Utc::now(),
        }
    }
}
