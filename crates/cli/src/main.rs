//! Cake Shop CLI - Card checks, the order calendar and account tools.
//!
//! # Usage
//!
//! ```bash
//! # Live feedback for a card number
//! cake-cli card check 4539148803436467
//!
//! # Validate a whole card form
//! cake-cli card validate --number "4539 1488 0343 6467" --name "Jane Baker" --expiry 12/27 --cvv 123
//!
//! # Calendar markings from a saved order export
//! cake-cli calendar --orders orders.json --selected 2025-06-20
//!
//! # Log in (password and two-factor code are read from stdin)
//! cake-cli login --email jane@example.com
//! ```
//!
//! # Commands
//!
//! - `card check` / `card validate` - Card number feedback and form validation
//! - `calendar` - Order calendar markings (from a file or the admin API)
//! - `login` / `logout` - Manage the saved session
//! - `cakes` - Search and sort the catalog
//! - `orders` - The signed-in user's orders
//! - `dashboard` - Admin summary and today's calendar entry

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;

use cake_shop_client::ClientConfig;
use cake_shop_core::catalog::CakeSort;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "cake-cli")]
#[command(author, version, about = "Cake Shop command-line tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Card number feedback and form validation
    Card {
        #[command(subcommand)]
        action: CardAction,
    },
    /// Print order calendar markings as JSON
    Calendar {
        /// Read orders from a JSON file instead of the admin API
        #[arg(short, long)]
        orders: Option<PathBuf>,

        /// Highlight this day (YYYY-MM-DD)
        #[arg(short, long)]
        selected: Option<NaiveDate>,
    },
    /// Log in and save the session
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Log out and forget the saved session
    Logout,
    /// List cakes
    Cakes {
        /// Case-insensitive search on name, description and category
        #[arg(short = 'q', long)]
        search: Option<String>,

        /// Sort order (`featured`, `price-asc`, `price-desc`, `name`)
        #[arg(short, long, default_value = "featured")]
        sort: CakeSort,
    },
    /// List your orders, newest first
    Orders,
    /// Admin dashboard summary
    Dashboard,
}

#[derive(Subcommand)]
enum CardAction {
    /// Format a card number, detect its network and run the Luhn check
    Check {
        /// Card number, with or without spaces
        number: String,
    },
    /// Validate a complete card form and report every error
    Validate {
        #[arg(long)]
        number: String,

        /// Cardholder name
        #[arg(long)]
        name: String,

        /// Expiry as MM/YY
        #[arg(long)]
        expiry: String,

        #[arg(long)]
        cvv: String,

        /// Mark as the default card
        #[arg(long)]
        default: bool,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Send warnings and errors to Sentry as events, info and debug as breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Offline commands (card, calendar --orders) run without an API URL
    let config = ClientConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cake_shop_cli=info,cake_shop_client=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(
    cli: Cli,
    config: Result<ClientConfig, cake_shop_client::ConfigError>,
) -> Result<(), CommandError> {
    match cli.command {
        Commands::Card { action } => match action {
            CardAction::Check { number } => commands::card::check(&number)?,
            CardAction::Validate {
                number,
                name,
                expiry,
                cvv,
                default,
            } => commands::card::validate(number, name, expiry, cvv, default)?,
        },
        Commands::Calendar { orders, selected } => match orders {
            Some(path) => commands::calendar::from_file(&path, selected)?,
            None => commands::calendar::from_api(&config?, selected).await?,
        },
        Commands::Login { email } => commands::auth::login(&config?, &email).await?,
        Commands::Logout => commands::auth::logout(&config?).await?,
        Commands::Cakes { search, sort } => commands::cakes::list(&config?, search, sort).await?,
        Commands::Orders => commands::orders::list(&config?).await?,
        Commands::Dashboard => commands::dashboard::show(&config?).await?,
    }
    Ok(())
}
