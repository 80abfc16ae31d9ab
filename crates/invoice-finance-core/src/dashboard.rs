//! Seller and buyer dashboard statistics.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::InvoiceFinanceError;
use crate::financing::to_percentage;
use crate::lifecycle::{Invoice, InvoiceStatus};
use crate::types::{InvoiceId, Money, Percentage, UserId};
use crate::InvoiceFinanceResult;

fn add(total: &mut Money, amount: Money, context: &str) -> InvoiceFinanceResult<()> {
    *total = total
        .checked_add(amount)
        .ok_or_else(|| InvoiceFinanceError::overflow(context))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Seller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SellerSummary {
    pub total_invoices: usize,
    /// Cash raised: discounted amounts of every invoice that was funded.
    pub funded_amount: Money,
    /// Invoices still waiting for the buyer to confirm.
    pub pending_confirmation: usize,
    pub listed_count: usize,
    /// Funded or repaid share of invoices that reached an outcome, in percent.
    pub success_rate: Percentage,
}

/// Summarize the invoices uploaded by `seller`.
pub fn seller_summary(invoices: &[Invoice], seller: &UserId) -> InvoiceFinanceResult<SellerSummary> {
    let mut summary = SellerSummary::default();
    let mut succeeded: u64 = 0;
    let mut decided: u64 = 0;

    for inv in invoices.iter().filter(|inv| inv.seller_id() == seller) {
        summary.total_invoices += 1;
        match inv.status() {
            InvoiceStatus::Created => summary.pending_confirmation += 1,
            InvoiceStatus::Listed => summary.listed_count += 1,
            InvoiceStatus::Confirmed => {}
            InvoiceStatus::Funded | InvoiceStatus::Repaid => {
                add(&mut summary.funded_amount, inv.discounted_amount(), "seller funded amount")?;
                succeeded += 1;
                decided += 1;
            }
            InvoiceStatus::Defaulted => {
                add(&mut summary.funded_amount, inv.discounted_amount(), "seller funded amount")?;
                decided += 1;
            }
            InvoiceStatus::Cancelled => decided += 1,
        }
    }

    if decided > 0 {
        summary.success_rate = to_percentage(Decimal::from(succeeded) / Decimal::from(decided))
            .ok_or_else(|| InvoiceFinanceError::overflow("seller success rate"))?;
    }
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Buyer
// ---------------------------------------------------------------------------

/// An invoice raised against the buyer that still needs their confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingConfirmation {
    pub invoice_id: InvoiceId,
    pub seller_id: UserId,
    pub face_amount: Money,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuyerSummary {
    pub total_invoices: usize,
    /// Invoices in `Created`, awaiting the buyer's confirmation.
    pub pending: usize,
    /// Invoices currently funded and awaiting repayment.
    pub funded: usize,
    /// Face value owed across every invoice that was not cancelled.
    pub total_amount: Money,
    /// Earliest due date first.
    pub pending_confirmations: Vec<PendingConfirmation>,
}

/// Summarize the invoices raised against `buyer`.
pub fn buyer_summary(invoices: &[Invoice], buyer: &UserId) -> InvoiceFinanceResult<BuyerSummary> {
    let mut summary = BuyerSummary::default();

    for inv in invoices.iter().filter(|inv| inv.buyer_id() == buyer) {
        summary.total_invoices += 1;
        match inv.status() {
            InvoiceStatus::Created => {
                summary.pending += 1;
                summary.pending_confirmations.push(PendingConfirmation {
                    invoice_id: inv.id().clone(),
                    seller_id: inv.seller_id().clone(),
                    face_amount: inv.face_amount(),
                    due_date: inv.due_date(),
                });
            }
            InvoiceStatus::Funded => summary.funded += 1,
            _ => {}
        }
        if inv.status() != InvoiceStatus::Cancelled {
            add(&mut summary.total_amount, inv.face_amount(), "buyer total amount")?;
        }
    }

    summary
        .pending_confirmations
        .sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.invoice_id.cmp(&b.invoice_id)));
    Ok(summary)
}
