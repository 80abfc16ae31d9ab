use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use invoice_finance_core::financing::RiskTier;
use invoice_finance_core::lifecycle::Invoice;
use invoice_finance_core::marketplace::{self, MarketplaceFilter, MarketplaceSort};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortArg {
    Roi,
    DueDate,
    Amount,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TierArg {
    Low,
    Medium,
    High,
}

/// Arguments for marketplace listing
#[derive(Args)]
pub struct MarketplaceArgs {
    /// Path to JSON input file: { "invoices", "filter"? } or a bare invoice array
    #[arg(long)]
    pub input: Option<String>,

    /// Minimum face amount
    #[arg(long)]
    pub min_amount: Option<Decimal>,

    /// Maximum face amount
    #[arg(long)]
    pub max_amount: Option<Decimal>,

    /// Allowed risk tiers (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub risk: Option<Vec<TierArg>>,

    /// Maximum days to maturity
    #[arg(long)]
    pub max_days: Option<i64>,

    /// Sort order
    #[arg(long)]
    pub sort: Option<SortArg>,

    /// Valuation date (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MarketplaceInput {
    Book {
        invoices: Vec<Invoice>,
        #[serde(default)]
        filter: MarketplaceFilter,
    },
    Invoices(Vec<Invoice>),
}

pub fn run_marketplace(args: MarketplaceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mk_input: MarketplaceInput = input::file_or_stdin(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for marketplace listing")?;

    let (invoices, mut filter) = match mk_input {
        MarketplaceInput::Book { invoices, filter } => (invoices, filter),
        MarketplaceInput::Invoices(invoices) => (invoices, MarketplaceFilter::default()),
    };

    if args.min_amount.is_some() {
        filter.min_amount = args.min_amount;
    }
    if args.max_amount.is_some() {
        filter.max_amount = args.max_amount;
    }
    if let Some(tiers) = args.risk {
        filter.risk_tiers = tiers
            .into_iter()
            .map(|t| match t {
                TierArg::Low => RiskTier::Low,
                TierArg::Medium => RiskTier::Medium,
                TierArg::High => RiskTier::High,
            })
            .collect();
    }
    if args.max_days.is_some() {
        filter.max_days_to_maturity = args.max_days;
    }
    if let Some(sort) = args.sort {
        filter.sort = match sort {
            SortArg::Roi => MarketplaceSort::Roi,
            SortArg::DueDate => MarketplaceSort::DueDate,
            SortArg::Amount => MarketplaceSort::Amount,
        };
    }

    let as_of = args.as_of.unwrap_or_else(super::today);
    let listings = marketplace::list_marketplace(&invoices, &filter, as_of);
    Ok(serde_json::to_value(listings)?)
}
