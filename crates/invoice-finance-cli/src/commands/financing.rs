use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use invoice_finance_core::financing::{self, FundingQuoteInput, RiskTier};
use invoice_finance_core::policy::FinancingPolicy;
use invoice_finance_core::RiskScore;

use crate::input;

/// Arguments for a single-invoice funding quote
#[derive(Args)]
pub struct QuoteArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Invoice face amount
    #[arg(long)]
    pub face: Option<Decimal>,

    /// Price paid by the investor (defaults to the policy discount off face)
    #[arg(long)]
    pub discounted: Option<Decimal>,

    /// Risk score between 0 and 100
    #[arg(long, default_value = "50")]
    pub risk_score: RiskScore,

    /// Invoice due date (YYYY-MM-DD)
    #[arg(long)]
    pub due_date: Option<NaiveDate>,

    /// Valuation date (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

/// Arguments for risk tier lookup
#[derive(Args)]
pub struct RiskTierArgs {
    /// Risk score between 0 and 100
    #[arg(long)]
    pub score: RiskScore,
}

/// Arguments for days-to-maturity
#[derive(Args)]
pub struct MaturityArgs {
    /// Invoice due date (YYYY-MM-DD)
    #[arg(long)]
    pub due_date: NaiveDate,

    /// Valuation date (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct RiskTierOutput {
    risk_score: RiskScore,
    risk_tier: RiskTier,
    label: &'static str,
}

#[derive(Debug, Serialize)]
struct MaturityOutput {
    due_date: NaiveDate,
    as_of: NaiveDate,
    days_to_maturity: i64,
    due_now: bool,
}

pub fn run_quote(
    args: QuoteArgs,
    policy: &FinancingPolicy,
) -> Result<Value, Box<dyn std::error::Error>> {
    let quote_input: FundingQuoteInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(face) = args.face {
        FundingQuoteInput {
            face_amount: face,
            discounted_amount: args.discounted,
            risk_score: args.risk_score,
            due_date: args.due_date.ok_or("--due-date is required (or provide --input)")?,
            as_of: args.as_of.unwrap_or_else(super::today),
        }
    } else if let Some(piped) = input::stdin::read_json()? {
        piped
    } else {
        return Err("Provide --face and --due-date, --input <file.json>, or pipe JSON via stdin".into());
    };

    let result = financing::quote_invoice(&quote_input, policy)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_risk_tier(args: RiskTierArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.score > 100 {
        return Err("--score must be between 0 and 100".into());
    }
    let tier = financing::risk_tier(args.score);
    let output = RiskTierOutput {
        risk_score: args.score,
        risk_tier: tier,
        label: tier.label(),
    };
    Ok(serde_json::to_value(output)?)
}

pub fn run_maturity(args: MaturityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let as_of = args.as_of.unwrap_or_else(super::today);
    let days = financing::days_to_maturity(args.due_date, as_of);
    let output = MaturityOutput {
        due_date: args.due_date,
        as_of,
        days_to_maturity: days,
        due_now: days == 0,
    };
    Ok(serde_json::to_value(output)?)
}
