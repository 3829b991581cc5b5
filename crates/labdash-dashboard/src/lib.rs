//! Live admin dashboard for the lab inventory and order service
//!
//! [`DashboardService`] keeps a [`ViewState`] in sync with the backend by
//! combining an initial load, a fixed-period poll and WebSocket push events,
//! and dispatches accept/cancel actions. Teardown is race-free: once
//! [`DashboardService::stop`] begins, late responses no longer touch the view.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod confirm;
pub mod error;
pub mod render;
pub mod service;
pub mod session;
pub mod state;

pub use confirm::{Confirmation, FixedAnswer, StdinConfirmation};
pub use error::{DashboardError, Result};
pub use service::{CancelOutcome, DashboardService, RefreshScope, ServiceStatus};
pub use session::{
    FileSessionStore, MemorySessionStore, Navigator, SessionContext, SessionStore,
    TerminalNavigator, logout,
};
pub use state::ViewState;
