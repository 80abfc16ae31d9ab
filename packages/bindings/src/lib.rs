use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use invoice_finance_core::contracts::CurrentUser;
use invoice_finance_core::lifecycle::{self, Invoice, InvoiceEvent};
use invoice_finance_core::marketplace::MarketplaceFilter;
use invoice_finance_core::policy::FinancingPolicy;
use invoice_finance_core::portfolio::PortfolioInput;
use invoice_finance_core::UserId;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Financing
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct QuoteRequest {
    #[serde(flatten)]
    input: invoice_finance_core::financing::FundingQuoteInput,
    #[serde(default)]
    policy: FinancingPolicy,
}

#[napi]
pub fn quote_invoice(input_json: String) -> NapiResult<String> {
    let request: QuoteRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    request.policy.validate().map_err(to_napi_error)?;
    let output = invoice_finance_core::financing::quote_invoice(&request.input, &request.policy)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Risk tier (`low`, `medium`, `high`) for a score in 0..=100.
#[napi]
pub fn risk_tier(risk_score: u32) -> NapiResult<String> {
    let score = u8::try_from(risk_score)
        .ok()
        .filter(|s| *s <= 100)
        .ok_or_else(|| to_napi_error(format!("risk score {risk_score} outside 0..=100")))?;
    let tier = invoice_finance_core::financing::risk_tier(score);
    serde_json::to_string(&tier).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct EventRequest {
    invoice: Invoice,
    event: InvoiceEvent,
    #[serde(default)]
    acting_user: Option<CurrentUser>,
}

#[napi]
pub fn apply_invoice_event(input_json: String) -> NapiResult<String> {
    let request: EventRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let updated = match request.acting_user {
        Some(ref user) => lifecycle::apply_event_as(&request.invoice, request.event, user),
        None => lifecycle::apply_event(&request.invoice, request.event),
    }
    .map_err(to_napi_error)?;
    serde_json::to_string(&updated).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Portfolio & dashboards
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct PortfolioRequest {
    #[serde(flatten)]
    input: PortfolioInput,
    #[serde(default)]
    policy: FinancingPolicy,
}

#[napi]
pub fn summarize_portfolio(input_json: String) -> NapiResult<String> {
    let request: PortfolioRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    request.policy.validate().map_err(to_napi_error)?;
    let output =
        invoice_finance_core::portfolio::analyze_portfolio(&request.input, &request.policy)
            .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct MarketplaceRequest {
    invoices: Vec<Invoice>,
    #[serde(default)]
    filter: MarketplaceFilter,
    as_of: NaiveDate,
}

#[napi]
pub fn list_marketplace(input_json: String) -> NapiResult<String> {
    let request: MarketplaceRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let listings = invoice_finance_core::marketplace::list_marketplace(
        &request.invoices,
        &request.filter,
        request.as_of,
    );
    serde_json::to_string(&listings).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct SellerSummaryRequest {
    invoices: Vec<Invoice>,
    seller_id: UserId,
}

#[napi]
pub fn seller_summary(input_json: String) -> NapiResult<String> {
    let request: SellerSummaryRequest =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let summary =
        invoice_finance_core::dashboard::seller_summary(&request.invoices, &request.seller_id)
            .map_err(to_napi_error)?;
    serde_json::to_string(&summary).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct BuyerSummaryRequest {
    invoices: Vec<Invoice>,
    buyer_id: UserId,
}

#[napi]
pub fn buyer_summary(input_json: String) -> NapiResult<String> {
    let request: BuyerSummaryRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let summary =
        invoice_finance_core::dashboard::buyer_summary(&request.invoices, &request.buyer_id)
            .map_err(to_napi_error)?;
    serde_json::to_string(&summary).map_err(to_napi_error)
}
