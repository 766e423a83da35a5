//! HotMeal CLI - order from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in (password may also come from HOTMEAL_PASSWORD)
//! hotmeal login -a john_doe -p 'StrongPwd!123'
//!
//! # Browse the menu and fill the cart
//! hotmeal menu --category 2
//! hotmeal cart add 14
//! hotmeal cart add 14
//! hotmeal cart show
//!
//! # Turn the cart into a draft for table 3 and submit it
//! hotmeal checkout --area 3
//! hotmeal submit
//!
//! # Follow up
//! hotmeal orders list
//! hotmeal orders cancel 42
//! ```
//!
//! State (session, cart, draft, recent orders) lives in `HOTMEAL_STATE_DIR`
//! and survives between invocations.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::IsTerminal;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use hotmeal_client::{ClientConfig, ClientState, LogNotifier, Notifier};
use hotmeal_core::{AreaId, AreaState, CategoryId, DishId, OrderId, PaymentMethod};
use secrecy::SecretString;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod output;

use error::CliError;
use output::{TerminalNavigator, TerminalNotifier};

#[derive(Parser)]
#[command(name = "hotmeal")]
#[command(author, version, about = "HotMeal ordering client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with account and password
    Login {
        /// Account name
        #[arg(short, long)]
        account: String,

        /// Password
        #[arg(short, long, env = "HOTMEAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log out and forget the stored session
    Logout,
    /// Show the logged-in account
    Whoami,
    /// Check where navigating to a route would end up
    Route {
        /// Target path, e.g. `/` or `/orders`
        path: String,
    },
    /// List dishes
    Menu {
        /// Only dishes in this category
        #[arg(short, long)]
        category: Option<CategoryId>,
    },
    /// List menu categories
    Categories,
    /// List dining areas
    Areas {
        /// Only areas in this state (FREE, OCCUPIED)
        #[arg(short, long, value_parser = parse_area_state)]
        state: Option<AreaState>,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Copy the cart into the draft order
    Checkout {
        /// Dining area to serve the order to
        #[arg(short, long)]
        area: Option<AreaId>,
    },
    /// Manage the draft order
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },
    /// Submit the draft order
    Submit {
        /// Keep the cart after a successful submission
        #[arg(long)]
        keep_cart: bool,
    },
    /// Inspect and manage orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and total
    Show,
    /// Add one unit of a dish
    Add { dish: DishId },
    /// Add one unit of a dish already in the cart
    Inc { dish: DishId },
    /// Remove one unit of a dish
    Dec { dish: DishId },
    /// Remove a dish entirely
    Remove { dish: DishId },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum DraftAction {
    /// Show the draft order
    Show,
    /// Discard the draft order
    Clear,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List my orders
    List {
        /// Include order lines
        #[arg(long)]
        items: bool,
    },
    /// Show cached recent orders without contacting the backend
    Recent,
    /// Show one order
    Show { id: OrderId },
    /// Cancel a pending order
    Cancel { id: OrderId },
    /// Record payment for an order (staff)
    Pay {
        id: OrderId,

        /// Payment method (WECHAT, ALIPAY, CASH, CARD, ...)
        #[arg(short, long, value_parser = parse_payment_method)]
        method: PaymentMethod,
    },
}

fn parse_area_state(s: &str) -> Result<AreaState, String> {
    match s.to_ascii_uppercase().as_str() {
        "FREE" => Ok(AreaState::Free),
        "OCCUPIED" => Ok(AreaState::Occupied),
        _ => Err(format!("invalid area state: {s}")),
    }
}

fn parse_payment_method(s: &str) -> Result<PaymentMethod, String> {
    s.parse()
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events for Sentry.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hotmeal_client=info,hotmeal=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Notices go to the terminal when a person is watching, otherwise to the log.
fn notifier(interactive: bool) -> Arc<dyn Notifier> {
    if interactive {
        Arc::new(TerminalNotifier)
    } else {
        Arc::new(LogNotifier)
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), CliError> {
    let mut state = ClientState::from_config(
        config,
        notifier(std::io::stderr().is_terminal()),
        Arc::new(TerminalNavigator),
    )?;

    match cli.command {
        Commands::Login { account, password } => {
            commands::session::login(&state, &account, &SecretString::from(password)).await?;
        }
        Commands::Logout => commands::session::logout(&state)?,
        Commands::Whoami => commands::session::whoami(&state).await?,
        Commands::Route { path } => commands::session::route(&state, &path),
        Commands::Menu { category } => commands::menu::dishes(&state, category).await?,
        Commands::Categories => commands::menu::categories(&state).await?,
        Commands::Areas { state: area_state } => commands::menu::areas(&state, area_state).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&state),
            CartAction::Add { dish } => commands::cart::add(&mut state, dish).await?,
            CartAction::Inc { dish } => commands::cart::increase(&mut state, dish)?,
            CartAction::Dec { dish } => commands::cart::decrease(&mut state, dish)?,
            CartAction::Remove { dish } => commands::cart::remove(&mut state, dish)?,
            CartAction::Clear => commands::cart::clear(&mut state)?,
        },
        Commands::Checkout { area } => commands::cart::checkout(&mut state, area)?,
        Commands::Draft { action } => match action {
            DraftAction::Show => commands::cart::show_draft(&state),
            DraftAction::Clear => commands::cart::clear_draft(&mut state)?,
        },
        Commands::Submit { keep_cart } => commands::orders::submit(&mut state, keep_cart).await?,
        Commands::Orders { action } => match action {
            OrdersAction::List { items } => commands::orders::list(&mut state, items).await?,
            OrdersAction::Recent => commands::orders::recent(&state),
            OrdersAction::Show { id } => commands::orders::show(&mut state, id).await?,
            OrdersAction::Cancel { id } => commands::orders::cancel(&mut state, id).await?,
            OrdersAction::Pay { id, method } => {
                commands::orders::pay(&mut state, id, method).await?;
            }
        },
    }
    Ok(())
}
