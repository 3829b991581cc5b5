//! Core types and utilities for the labdash admin dashboard
//!
//! Domain records served by the inventory backend, the push event envelope,
//! inventory derivations shared by every view, configuration and logging
//! setup.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod config;
pub mod error;
pub mod events;
pub mod inventory;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use events::{LiveEvent, OrderUpdate};
pub use types::{
    Category, LowStockAlert, Order, OrderBuckets, OrderId, OrderStatus, OrderTab, Product,
    ProductId, StockStatus,
};

/// Initialize logging
///
/// `RUST_LOG` takes precedence over `config.level`. Output goes to stderr so
/// it never interleaves with rendered tables on stdout.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(config: &config::LoggingConfig, json: bool) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if json || config.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| Error::configuration(format!("failed to initialize logging: {e}")))
}
