//! WebSocket module for real-time flight updates
//!
//! Controllers and info screens attach over `GET /ws`. Every committed
//! flight mutation is fanned out to all of them; handoffs additionally reach
//! the sessions logged in as the receiving station.

pub mod broadcast;
pub mod connection;
pub mod handler;
pub mod messages;

pub use broadcast::{Broadcaster, Delivery};
pub use connection::{ConnectionManager, WsSender};
pub use handler::ws_handler;
pub use messages::{ClientEvent, ServerEvent};
