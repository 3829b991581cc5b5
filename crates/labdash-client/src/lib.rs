//! Backend communication for the labdash admin dashboard
//!
//! [`ApiClient`] implements [`InventoryBackend`] over the REST API and
//! [`LiveListener`] keeps the admin orders WebSocket open, forwarding decoded
//! events to the dashboard.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod api_client;
pub mod error;
pub mod mock;
pub mod websocket;

pub use api_client::{AcceptOutcome, ApiClient, Credentials, InventoryBackend};
pub use error::{ClientError, ClientResult};
pub use mock::{CallCounts, MockBackend};
pub use websocket::{Backoff, ConnectionState, LiveListener};
