//! `labdash` admin dashboard
//!
//! Terminal front end for the lab inventory and order service: a live
//! dashboard plus one-shot commands for listing, accepting and cancelling
//! orders.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

use clap::{Parser, Subcommand};
use labdash_client::{ApiClient, InventoryBackend};
use labdash_core::inventory::{CategoryFilter, SortKey, StockFilter};
use labdash_core::{Config, OrderId, OrderTab};
use labdash_dashboard::render;
use labdash_dashboard::{
    CancelOutcome, Confirmation, DashboardError, DashboardService, FileSessionStore, FixedAnswer,
    Result, SessionContext, SessionStore, StdinConfirmation, TerminalNavigator, logout,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

/// Command line interface for the admin dashboard
#[derive(Parser)]
#[command(
    name = "labdash",
    version = env!("CARGO_PKG_VERSION"),
    about = "Admin dashboard for the lab inventory and order service",
    long_about = "Watches orders and stock levels of the lab inventory service in real time and lets an administrator accept or cancel pending orders."
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "LABDASH_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable structured JSON logging
    #[arg(long)]
    json: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Run the live dashboard until Ctrl+C
    Watch,

    /// Print the orders of one tab
    Orders {
        /// Tab to print (pending, processing, completed)
        #[arg(short, long, default_value = "pending")]
        tab: OrderTab,
    },

    /// Print the inventory table
    Inventory {
        /// Category (all, glassware, chemicals, equipment, consumables, safety)
        #[arg(long, default_value = "all")]
        category: CategoryFilter,

        /// Stock level (all, in, low, out)
        #[arg(long, default_value = "all")]
        stock: StockFilter,

        /// Sort order (name, stock-low, stock-high, category)
        #[arg(long, default_value = "name")]
        sort: SortKey,
    },

    /// Accept a pending order
    Accept {
        /// Order ID
        #[arg(value_name = "ORDER_ID")]
        id: OrderId,
    },

    /// Cancel an order
    Cancel {
        /// Order ID
        #[arg(value_name = "ORDER_ID")]
        id: OrderId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Save a session for later commands
    Login {
        /// Bearer token issued by the auth service
        #[arg(long, env = "LABDASH_TOKEN", hide_env_values = true)]
        token: String,

        /// Operator name
        #[arg(short, long)]
        username: String,

        /// Role reported by the auth service
        #[arg(long)]
        role: Option<String>,

        /// The operator is an administrator
        #[arg(long)]
        admin: bool,
    },

    /// Forget the saved session
    Logout,

    /// Validate configuration
    Config {
        /// Show resolved configuration
        #[arg(short, long)]
        show: bool,
    },
}

/// Main entry point for the dashboard
///
/// # Errors
///
/// Returns error if configuration, logging or the selected command fails
#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = Config::load_from(cli.config.as_deref())?;

    let mut logging = config.logging.clone();
    if let Some(ref level) = cli.log_level {
        logging.level.clone_from(level);
    }
    labdash_core::init_logging(&logging, cli.json)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        api = %config.api.base_url,
        "labdash starting"
    );

    let store = session_store(&config)?;

    match cli.command.unwrap_or(Commands::Watch) {
        Commands::Watch => watch(&config, connect(&config, &store)?).await,
        Commands::Orders { tab } => print_orders(&config, connect(&config, &store)?, tab).await,
        Commands::Inventory {
            category,
            stock,
            sort,
        } => {
            let service = DashboardService::new(&config, connect(&config, &store)?);
            service.refresh_all().await;
            service.set_category_filter(category);
            service.set_stock_filter(stock);
            service.set_sort(sort);

            let view = service.snapshot();
            print!(
                "{}",
                render::render_inventory(&view.inventory(), config.inventory.visual_max_stock)
            );
            Ok(report(view.error.as_deref()))
        }
        Commands::Accept { id } => accept(&config, connect(&config, &store)?, id).await,
        Commands::Cancel { id, yes } => {
            let confirmation: Box<dyn Confirmation> = if yes {
                Box::new(FixedAnswer(true))
            } else {
                Box::new(StdinConfirmation)
            };
            cancel(&config, connect(&config, &store)?, id, confirmation.as_ref()).await
        }
        Commands::Login {
            token,
            username,
            role,
            admin,
        } => {
            let mut session = SessionContext::new(token, username).admin(admin);
            session.role = role;
            store.save(&session)?;
            println!("Logged in as {}", session.username);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Logout => {
            logout(None, &store, &TerminalNavigator).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { show } => {
            if show {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Configuration is valid");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Session store at the configured or platform default location
fn session_store(config: &Config) -> Result<FileSessionStore> {
    config
        .session
        .resolve_file()
        .map(FileSessionStore::new)
        .ok_or_else(|| {
            DashboardError::session("cannot determine a session file location; set session.file")
        })
}

/// Authenticated backend for the saved admin session
fn connect(config: &Config, store: &dyn SessionStore) -> Result<Arc<dyn InventoryBackend>> {
    let session = store
        .load()?
        .ok_or_else(|| DashboardError::session("not logged in; run `labdash login` first"))?;
    session.require_admin()?;

    let client = ApiClient::new(&config.api)?.with_credentials(session.credentials());
    Ok(Arc::new(client))
}

/// Print banners; failure exit code when an error banner is showing
fn report(error: Option<&str>) -> ExitCode {
    match error {
        Some(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
        None => ExitCode::SUCCESS,
    }
}

/// Run the live dashboard until Ctrl+C
async fn watch(config: &Config, backend: Arc<dyn InventoryBackend>) -> Result<ExitCode> {
    let service = DashboardService::new(config, backend);
    let mut changes = service.subscribe();
    let visual_max = config.inventory.visual_max_stock;

    service.start().await?;
    info!("Dashboard is running. Press Ctrl+C to stop.");

    loop {
        print!(
            "\x1b[2J\x1b[H{}",
            render::render_dashboard(&service.snapshot(), visual_max)
        );

        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down gracefully");
                break;
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    service.stop().await?;
    Ok(ExitCode::SUCCESS)
}

/// Print one tab of orders
async fn print_orders(
    config: &Config,
    backend: Arc<dyn InventoryBackend>,
    tab: OrderTab,
) -> Result<ExitCode> {
    let service = DashboardService::new(config, backend);
    service.refresh_all().await;
    service.select_tab(tab);

    let view = service.snapshot();
    println!("{}", render::render_tabs(&view));
    print!("{}", render::render_orders(view.visible_orders(), tab));
    Ok(report(view.error.as_deref()))
}

/// Accept an order and print the outcome
async fn accept(
    config: &Config,
    backend: Arc<dyn InventoryBackend>,
    id: OrderId,
) -> Result<ExitCode> {
    let service = DashboardService::new(config, backend);

    let result = service.accept_order(id).await;
    print!("{}", render::render_messages(&service.snapshot()));
    service.stop().await?;

    Ok(if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Cancel an order after confirmation and print the outcome
async fn cancel(
    config: &Config,
    backend: Arc<dyn InventoryBackend>,
    id: OrderId,
    confirmation: &dyn Confirmation,
) -> Result<ExitCode> {
    let service = DashboardService::new(config, backend);

    let result = service.cancel_order(id, confirmation).await;
    if matches!(result, Ok(CancelOutcome::Declined)) {
        println!("Order #{id} left unchanged");
    } else {
        print!("{}", render::render_messages(&service.snapshot()));
    }
    service.stop().await?;

    Ok(if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
