mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use commands::dashboard::{BuyerSummaryArgs, SellerSummaryArgs};
use commands::financing::{MaturityArgs, QuoteArgs, RiskTierArgs};
use commands::lifecycle::LifecycleArgs;
use commands::marketplace::MarketplaceArgs;
use commands::portfolio::PortfolioArgs;

/// Invoice financing quotes, lifecycle transitions and portfolio analytics
#[derive(Parser)]
#[command(
    name = "ifin",
    version,
    about = "Invoice financing quotes, lifecycle transitions and portfolio analytics",
    long_about = "A CLI for invoice-financing marketplace calculations with decimal \
                  precision. Prices invoices for funding, replays lifecycle events, \
                  summarizes investor portfolios and seller/buyer dashboards, and lists \
                  the funding marketplace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Financing policy file (YAML or JSON)
    #[arg(long, env = "IFIN_POLICY", global = true)]
    policy: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Price an invoice for funding (discount, profit, ROI, risk tier)
    Quote(QuoteArgs),
    /// Map a risk score to its tier
    RiskTier(RiskTierArgs),
    /// Whole days until an invoice falls due
    Maturity(MaturityArgs),
    /// Replay lifecycle events against an invoice
    Lifecycle(LifecycleArgs),
    /// Summarize an investor portfolio
    Portfolio(PortfolioArgs),
    /// List invoices open for funding
    Marketplace(MarketplaceArgs),
    /// Summarize a seller's invoices
    SellerSummary(SellerSummaryArgs),
    /// Summarize the invoices raised against a buyer
    BuyerSummary(BuyerSummaryArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(
    command: Commands,
    policy_path: Option<&str>,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let policy = config::load_policy(policy_path)?;
    match command {
        Commands::Quote(args) => commands::financing::run_quote(args, &policy),
        Commands::RiskTier(args) => commands::financing::run_risk_tier(args),
        Commands::Maturity(args) => commands::financing::run_maturity(args),
        Commands::Lifecycle(args) => commands::lifecycle::run_lifecycle(args, &policy),
        Commands::Portfolio(args) => commands::portfolio::run_portfolio(args, &policy),
        Commands::Marketplace(args) => commands::marketplace::run_marketplace(args),
        Commands::SellerSummary(args) => commands::dashboard::run_seller_summary(args),
        Commands::BuyerSummary(args) => commands::dashboard::run_buyer_summary(args),
        Commands::Version => Ok(serde_json::json!({
            "name": "ifin",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if matches!(cli.command, Commands::Version) {
        println!("ifin {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    match run(cli.command, cli.policy.as_deref()) {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
