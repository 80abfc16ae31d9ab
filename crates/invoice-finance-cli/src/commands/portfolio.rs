use clap::Args;
use serde_json::Value;

use invoice_finance_core::policy::FinancingPolicy;
use invoice_finance_core::portfolio::{self, PortfolioInput};
use invoice_finance_core::UserId;

use crate::input;

/// Arguments for portfolio summary
#[derive(Args)]
pub struct PortfolioArgs {
    /// Path to JSON input file: { "positions"?, "invoices"?, "investor_id"? }
    #[arg(long)]
    pub input: Option<String>,

    /// Investor whose positions are derived from the supplied invoices
    #[arg(long)]
    pub investor: Option<String>,
}

pub fn run_portfolio(
    args: PortfolioArgs,
    policy: &FinancingPolicy,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut pf_input: PortfolioInput = input::file_or_stdin(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for portfolio summary")?;

    if let Some(investor) = args.investor {
        pf_input.investor_id = Some(UserId::new(investor));
    }

    let result = portfolio::analyze_portfolio(&pf_input, policy)?;
    Ok(serde_json::to_value(result)?)
}
