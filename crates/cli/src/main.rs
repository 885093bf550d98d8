//! Store Insights CLI - Shopify store dashboard in the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Create an account and connect a Shopify store
//! si-cli register -e owner@example.com -s my-store.myshopify.com
//!
//! # Sign in to an existing account
//! si-cli login -e owner@example.com
//!
//! # Show the dashboard with the 7-day revenue trend
//! si-cli dashboard --period 7d
//!
//! # Pull fresh data from Shopify, then show the dashboard
//! si-cli sync --yes
//! ```
//!
//! # Commands
//!
//! - `register` - Create a tenant account
//! - `login` / `logout` - Manage the persisted session
//! - `whoami` - Show the signed-in tenant
//! - `dashboard` - Render the insights dashboard
//! - `sync` - Trigger a Shopify ingestion run
//!
//! # Environment Variables
//!
//! - `INSIGHTS_API_URL` - Base URL of the insights backend (required)
//! - `INSIGHTS_SESSION_FILE` - Where the session is persisted
//! - `INSIGHTS_LOG_FORMAT` - `json` for structured logs, text otherwise
//! - `RUST_LOG` - Log filter (default `store_insights_client=info,si_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use store_insights_client::{
    ClientConfig, DashboardOptions, DashboardOrchestrator, FileStorage, HttpGateway, SessionGate,
    SessionStore,
};
use store_insights_core::RevenuePeriod;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "si-cli")]
#[command(author, version, about = "Store Insights dashboard CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a tenant account and sign in
    Register {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Shopify store domain (e.g. `my-store.myshopify.com`)
        #[arg(short, long)]
        shop_domain: String,

        /// Account password (prompted if omitted; typed input is echoed)
        #[arg(long)]
        password: Option<String>,

        /// Shopify Admin API access token (prompted if omitted; typed input is echoed)
        #[arg(long)]
        access_token: Option<String>,
    },
    /// Sign in to an existing account
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password (prompted if omitted; typed input is echoed)
        #[arg(long)]
        password: Option<String>,
    },
    /// End the current session
    Logout {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the signed-in tenant
    Whoami,
    /// Render the insights dashboard
    Dashboard {
        /// Revenue trend period (`7d`, `30d`, `90d`)
        #[arg(short, long, default_value_t = RevenuePeriod::default())]
        period: RevenuePeriod,
    },
    /// Sync all data from Shopify, then render the dashboard
    Sync {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Text logs by default, JSON when `INSIGHTS_LOG_FORMAT=json`. Both go to
/// stderr so stdout carries only command output.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "store_insights_client=info,si_cli=info".into());

    let is_json =
        std::env::var("INSIGHTS_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let json_layer = is_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!is_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let store = SessionStore::open(FileStorage::new(config.session_file.clone()))?;
    let gateway = HttpGateway::new(&config, store.clone())?;
    let gate = SessionGate::new(gateway.clone(), store);
    let dashboard = DashboardOrchestrator::new(gateway, DashboardOptions::from(&config));

    match cli.command {
        Commands::Register {
            email,
            shop_domain,
            password,
            access_token,
        } => {
            commands::auth::register(&gate, email, shop_domain, password, access_token).await?;
        }
        Commands::Login { email, password } => {
            commands::auth::login(&gate, email, password).await?;
        }
        Commands::Logout { yes } => commands::auth::logout(&gate, yes)?,
        Commands::Whoami => commands::auth::whoami(&gate)?,
        Commands::Dashboard { period } => {
            commands::dashboard::show(&gate, &dashboard, period).await?;
        }
        Commands::Sync { yes } => commands::dashboard::sync(&gate, &dashboard, yes).await?,
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_secret_flags_warn_about_echo() {
        let mut cli = Cli::command();
        let register = cli.find_subcommand_mut("register").unwrap();
        for flag in ["password", "access_token"] {
            let arg = register
                .get_arguments()
                .find(|arg| arg.get_id() == flag)
                .unwrap();
            let help = arg.get_help().unwrap().to_string();
            assert!(help.contains("echoed"), "{flag}: {help}");
        }
    }

    #[test]
    fn test_flags_skip_the_prompt() {
        let cli = Cli::try_parse_from([
            "si-cli",
            "login",
            "--email",
            "owner@example.com",
            "--password",
            "hunter2",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Login { password: Some(ref p), .. } if p == "hunter2"
        ));
    }
}
