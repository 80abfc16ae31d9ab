use clap::Args;
use serde_json::Value;

use invoice_finance_core::dashboard;
use invoice_finance_core::lifecycle::Invoice;
use invoice_finance_core::UserId;

use crate::input;

/// Arguments for the seller dashboard summary
#[derive(Args)]
pub struct SellerSummaryArgs {
    /// Path to JSON file holding an array of invoices
    #[arg(long)]
    pub input: Option<String>,

    /// Seller whose invoices are summarized
    #[arg(long)]
    pub seller: String,
}

/// Arguments for the buyer dashboard summary
#[derive(Args)]
pub struct BuyerSummaryArgs {
    /// Path to JSON file holding an array of invoices
    #[arg(long)]
    pub input: Option<String>,

    /// Buyer whose invoices are summarized
    #[arg(long)]
    pub buyer: String,
}

fn read_invoices(
    path: Option<&str>,
    command: &str,
) -> Result<Vec<Invoice>, Box<dyn std::error::Error>> {
    input::file_or_stdin(path)?
        .ok_or_else(|| format!("--input <file.json> or stdin required for {command}").into())
}

pub fn run_seller_summary(args: SellerSummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let invoices = read_invoices(args.input.as_deref(), "seller summary")?;
    let result = dashboard::seller_summary(&invoices, &UserId::new(args.seller))?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_buyer_summary(args: BuyerSummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let invoices = read_invoices(args.input.as_deref(), "buyer summary")?;
    let result = dashboard::buyer_summary(&invoices, &UserId::new(args.buyer))?;
    Ok(serde_json::to_value(result)?)
}
