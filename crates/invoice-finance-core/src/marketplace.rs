//! Marketplace listings -- the cards investors browse before funding.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::financing::RiskTier;
use crate::lifecycle::{Invoice, InvoiceStatus};
use crate::types::{InvoiceId, Money, Percentage, RiskScore};

/// Ordering applied to marketplace results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketplaceSort {
    /// Highest ROI first.
    #[default]
    Roi,
    /// Soonest maturity first.
    DueDate,
    /// Largest face amount first.
    Amount,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceFilter {
    pub min_amount: Option<Money>,
    pub max_amount: Option<Money>,
    /// Empty means every tier.
    pub risk_tiers: Vec<RiskTier>,
    pub max_days_to_maturity: Option<i64>,
    pub sort: MarketplaceSort,
}

impl MarketplaceFilter {
    fn accepts(&self, listing: &MarketplaceListing) -> bool {
        if self.min_amount.is_some_and(|min| listing.face_amount < min) {
            return false;
        }
        if self.max_amount.is_some_and(|max| listing.face_amount > max) {
            return false;
        }
        if !self.risk_tiers.is_empty() && !self.risk_tiers.contains(&listing.risk_tier) {
            return false;
        }
        if self
            .max_days_to_maturity
            .is_some_and(|days| listing.days_to_maturity > days)
        {
            return false;
        }
        true
    }
}

/// One marketplace card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceListing {
    pub invoice_id: InvoiceId,
    pub face_amount: Money,
    pub discounted_amount: Money,
    pub expected_profit: Money,
    pub investor_roi: Percentage,
    pub risk_score: RiskScore,
    pub risk_tier: RiskTier,
    pub risk_label: String,
    pub due_date: NaiveDate,
    pub days_to_maturity: i64,
}

impl MarketplaceListing {
    pub fn from_invoice(invoice: &Invoice, as_of: NaiveDate) -> Self {
        let tier = invoice.risk_tier();
        Self {
            invoice_id: invoice.id().clone(),
            face_amount: invoice.face_amount(),
            discounted_amount: invoice.discounted_amount(),
            expected_profit: invoice.expected_profit(),
            investor_roi: invoice.investor_roi(),
            risk_score: invoice.risk_score(),
            risk_tier: tier,
            risk_label: tier.label().to_string(),
            due_date: invoice.due_date(),
            days_to_maturity: invoice.days_to_maturity(as_of),
        }
    }
}

fn compare(sort: MarketplaceSort, a: &MarketplaceListing, b: &MarketplaceListing) -> Ordering {
    let primary = match sort {
        MarketplaceSort::Roi => b.investor_roi.cmp(&a.investor_roi),
        MarketplaceSort::DueDate => a.due_date.cmp(&b.due_date),
        MarketplaceSort::Amount => b.face_amount.cmp(&a.face_amount),
    };
    primary.then_with(|| a.invoice_id.cmp(&b.invoice_id))
}

/// Listed invoices open for funding, filtered and sorted.
pub fn list_marketplace(
    invoices: &[Invoice],
    filter: &MarketplaceFilter,
    as_of: NaiveDate,
) -> Vec<MarketplaceListing> {
    let mut listings: Vec<MarketplaceListing> = invoices
        .iter()
        .filter(|inv| inv.status() == InvoiceStatus::Listed)
        .map(|inv| MarketplaceListing::from_invoice(inv, as_of))
        .filter(|listing| filter.accepts(listing))
        .collect();
    listings.sort_by(|a, b| compare(filter.sort, a, b));
    listings
}
