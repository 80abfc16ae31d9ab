//! Financing calculator -- discount rate, investor ROI, maturity and risk
//! tiering for a single invoice.
//!
//! Every function here is pure. Monetary values and rates are
//! `rust_decimal::Decimal` throughout; ROI is reported as a percentage
//! rounded to one decimal place (half-up).

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::error::InvoiceFinanceError;
use crate::policy::FinancingPolicy;
use crate::types::{with_metadata, ComputationOutput, Money, Percentage, Rate, RiskScore};
use crate::InvoiceFinanceResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Highest score still considered low risk.
pub const LOW_RISK_MAX: RiskScore = 30;
/// Highest score still considered medium risk.
pub const MEDIUM_RISK_MAX: RiskScore = 70;

const HUNDRED: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Risk tier
// ---------------------------------------------------------------------------

/// Coarse risk bucket derived from a numeric risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [RiskTier::Low, RiskTier::Medium, RiskTier::High];

    /// Human-readable label used on marketplace cards.
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low Risk",
            RiskTier::Medium => "Medium Risk",
            RiskTier::High => "High Risk",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Core calculations
// ---------------------------------------------------------------------------

fn checked_rate(face_amount: Money, discounted_amount: Money) -> Option<Rate> {
    (face_amount - discounted_amount).checked_div(discounted_amount)
}

/// Reject amount pairs that cannot describe a discounted invoice, including
/// pairs whose ROI falls outside the decimal range.
fn validate_amounts(face_amount: Money, discounted_amount: Money) -> InvoiceFinanceResult<()> {
    if discounted_amount <= Decimal::ZERO {
        return Err(InvoiceFinanceError::invalid_amount(
            face_amount,
            discounted_amount,
            "Discounted amount must be positive",
        ));
    }
    if discounted_amount > face_amount {
        return Err(InvoiceFinanceError::invalid_amount(
            face_amount,
            discounted_amount,
            "Discounted amount cannot exceed face amount",
        ));
    }
    if checked_rate(face_amount, discounted_amount)
        .and_then(to_percentage)
        .is_none()
    {
        return Err(InvoiceFinanceError::invalid_amount(
            face_amount,
            discounted_amount,
            "Return on the discounted amount overflows the decimal range",
        ));
    }
    Ok(())
}

/// Discount rate earned by the investor: `(face - discounted) / discounted`.
pub fn discount_rate(face_amount: Money, discounted_amount: Money) -> InvoiceFinanceResult<Rate> {
    validate_amounts(face_amount, discounted_amount)?;
    checked_rate(face_amount, discounted_amount).ok_or_else(|| {
        InvoiceFinanceError::invalid_amount(face_amount, discounted_amount, "Discount rate overflows")
    })
}

/// Investor ROI as a percentage, rounded half-up to one decimal place.
pub fn investor_roi(
    face_amount: Money,
    discounted_amount: Money,
) -> InvoiceFinanceResult<Percentage> {
    let rate = discount_rate(face_amount, discounted_amount)?;
    to_percentage(rate).ok_or_else(|| {
        InvoiceFinanceError::invalid_amount(face_amount, discounted_amount, "ROI overflows")
    })
}

/// Profit the investor makes if the invoice is repaid in full.
pub fn expected_profit(face_amount: Money, discounted_amount: Money) -> InvoiceFinanceResult<Money> {
    validate_amounts(face_amount, discounted_amount)?;
    Ok(face_amount - discounted_amount)
}

/// Whole days from `as_of` until `due_date`. Past-due invoices are "due now" (0).
pub fn days_to_maturity(due_date: NaiveDate, as_of: NaiveDate) -> i64 {
    due_date.signed_duration_since(as_of).num_days().max(0)
}

/// Bucket a risk score. Each band includes its lower bound.
pub fn risk_tier(risk_score: RiskScore) -> RiskTier {
    match risk_score {
        0..=LOW_RISK_MAX => RiskTier::Low,
        s if s <= MEDIUM_RISK_MAX => RiskTier::Medium,
        _ => RiskTier::High,
    }
}

/// Amount pre-filled in the funding dialog: `face * (1 - discount)`.
pub fn default_discounted_amount(face_amount: Money, discount: Rate) -> InvoiceFinanceResult<Money> {
    if face_amount <= Decimal::ZERO {
        return Err(InvoiceFinanceError::InvalidInput {
            field: "face_amount".into(),
            reason: "Face amount must be positive".into(),
        });
    }
    if discount < Decimal::ZERO || discount >= Decimal::ONE {
        return Err(InvoiceFinanceError::InvalidInput {
            field: "discount".into(),
            reason: "Discount must be in [0, 1)".into(),
        });
    }
    face_amount
        .checked_mul(Decimal::ONE - discount)
        .ok_or_else(|| InvoiceFinanceError::overflow("default discounted amount"))
}

/// Scale a decimal rate to a one-decimal percentage, half-up. `None` on overflow.
pub(crate) fn to_percentage(rate: Rate) -> Option<Percentage> {
    rate.checked_mul(HUNDRED)
        .map(|pct| pct.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
}

// ---------------------------------------------------------------------------
// Funding quote
// ---------------------------------------------------------------------------

/// Input for a single-invoice funding quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingQuoteInput {
    pub face_amount: Money,
    /// Price the investor pays. Defaults to the policy discount off face.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discounted_amount: Option<Money>,
    pub risk_score: RiskScore,
    pub due_date: NaiveDate,
    pub as_of: NaiveDate,
}

/// Everything a marketplace card or funding dialog shows for one invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingQuote {
    pub face_amount: Money,
    pub discounted_amount: Money,
    pub expected_profit: Money,
    pub discount_rate: Rate,
    pub investor_roi: Percentage,
    pub risk_tier: RiskTier,
    pub days_to_maturity: i64,
}

/// Price one invoice for funding.
pub fn quote_invoice(
    input: &FundingQuoteInput,
    policy: &FinancingPolicy,
) -> InvoiceFinanceResult<ComputationOutput<FundingQuote>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.risk_score > 100 {
        return Err(InvoiceFinanceError::InvalidInput {
            field: "risk_score".into(),
            reason: "Risk score must be between 0 and 100".into(),
        });
    }

    let discounted_amount = match input.discounted_amount {
        Some(amount) => amount,
        None => {
            warnings.push(format!(
                "No discounted amount supplied; applied default discount of {}",
                policy.default_discount
            ));
            default_discounted_amount(input.face_amount, policy.default_discount)?
        }
    };

    let rate = discount_rate(input.face_amount, discounted_amount)?;
    let roi = investor_roi(input.face_amount, discounted_amount)?;
    let profit = expected_profit(input.face_amount, discounted_amount)?;
    let tier = risk_tier(input.risk_score);
    let days = days_to_maturity(input.due_date, input.as_of);

    if days == 0 {
        warnings.push("Invoice is due now or past due".into());
    }
    if tier == RiskTier::High {
        warnings.push(format!(
            "Risk score {} is above {}: high risk",
            input.risk_score, MEDIUM_RISK_MAX
        ));
    }

    let quote = FundingQuote {
        face_amount: input.face_amount,
        discounted_amount,
        expected_profit: profit,
        discount_rate: rate,
        investor_roi: roi,
        risk_tier: tier,
        days_to_maturity: days,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Invoice discounting -- simple discount rate on purchase price, ROI rounded half-up to 0.1%",
        &serde_json::json!({
            "default_discount": policy.default_discount.to_string(),
            "low_risk_max": LOW_RISK_MAX,
            "medium_risk_max": MEDIUM_RISK_MAX,
        }),
        warnings,
        elapsed,
        quote,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_discount_rate_basic() {
        let rate = discount_rate(dec!(110), dec!(100)).unwrap();
        assert_eq!(rate, dec!(0.1));
    }

    #[test]
    fn test_discount_rate_rejects_zero_discounted() {
        assert!(matches!(
            discount_rate(dec!(100), Decimal::ZERO),
            Err(InvoiceFinanceError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_discount_rate_rejects_discounted_above_face() {
        assert!(matches!(
            discount_rate(dec!(100), dec!(100.01)),
            Err(InvoiceFinanceError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_investor_roi_rounds_half_up() {
        // 15000 / 135000 = 11.111...%
        assert_eq!(investor_roi(dec!(150000), dec!(135000)).unwrap(), dec!(11.1));
        // 0.25 / 100 = 0.25% -> 0.3
        assert_eq!(investor_roi(dec!(100.25), dec!(100)).unwrap(), dec!(0.3));
    }

    #[test]
    fn test_extreme_amounts_are_rejected_not_panicking() {
        // Quotient overflows
        assert!(matches!(
            investor_roi(Decimal::MAX, Decimal::new(1, 28)),
            Err(InvoiceFinanceError::InvalidAmount { .. })
        ));
        // Quotient fits, percentage does not
        let face = Decimal::from_i128_with_scale(10i128.pow(27), 0);
        assert!(discount_rate(face, dec!(0.1)).is_err());
        assert!(matches!(
            investor_roi(face, dec!(0.1)),
            Err(InvoiceFinanceError::InvalidAmount { .. })
        ));
        assert!(expected_profit(face, dec!(0.1)).is_err());
    }

    #[test]
    fn test_investor_roi_at_par_is_zero() {
        assert_eq!(investor_roi(dec!(5000), dec!(5000)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_expected_profit() {
        assert_eq!(expected_profit(dec!(250000), dec!(220000)).unwrap(), dec!(30000));
        assert!(expected_profit(dec!(10), dec!(11)).is_err());
    }

    #[test]
    fn test_days_to_maturity() {
        assert_eq!(days_to_maturity(date(2024, 2, 15), date(2024, 1, 16)), 30);
        assert_eq!(days_to_maturity(date(2024, 1, 1), date(2024, 1, 1)), 0);
        assert_eq!(days_to_maturity(date(2023, 12, 1), date(2024, 1, 1)), 0);
    }

    #[test]
    fn test_risk_tier_boundaries() {
        assert_eq!(risk_tier(0), RiskTier::Low);
        assert_eq!(risk_tier(30), RiskTier::Low);
        assert_eq!(risk_tier(31), RiskTier::Medium);
        assert_eq!(risk_tier(70), RiskTier::Medium);
        assert_eq!(risk_tier(71), RiskTier::High);
        assert_eq!(risk_tier(100), RiskTier::High);
    }

    #[test]
    fn test_default_discounted_amount() {
        assert_eq!(
            default_discounted_amount(dec!(150000), dec!(0.10)).unwrap(),
            dec!(135000)
        );
        assert!(default_discounted_amount(dec!(150000), dec!(1)).is_err());
        assert!(default_discounted_amount(Decimal::ZERO, dec!(0.1)).is_err());
    }

    #[test]
    fn test_quote_invoice_end_to_end() {
        let input = FundingQuoteInput {
            face_amount: dec!(150000),
            discounted_amount: Some(dec!(135000)),
            risk_score: 25,
            due_date: date(2024, 2, 15),
            as_of: date(2024, 1, 15),
        };
        let out = quote_invoice(&input, &FinancingPolicy::default()).unwrap();
        let q = out.result;
        assert_eq!(q.expected_profit, dec!(15000));
        assert_eq!(q.investor_roi, dec!(11.1));
        assert_eq!(q.risk_tier, RiskTier::Low);
        assert_eq!(q.days_to_maturity, 31);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_quote_invoice_applies_default_discount() {
        let input = FundingQuoteInput {
            face_amount: dec!(80000),
            discounted_amount: None,
            risk_score: 80,
            due_date: date(2024, 1, 1),
            as_of: date(2024, 1, 10),
        };
        let out = quote_invoice(&input, &FinancingPolicy::default()).unwrap();
        assert_eq!(out.result.discounted_amount, dec!(72000));
        assert_eq!(out.result.risk_tier, RiskTier::High);
        assert_eq!(out.warnings.len(), 3);
    }

    #[test]
    fn test_quote_invoice_rejects_out_of_range_score() {
        let input = FundingQuoteInput {
            face_amount: dec!(100),
            discounted_amount: Some(dec!(90)),
            risk_score: 101,
            due_date: date(2024, 1, 1),
            as_of: date(2024, 1, 1),
        };
        assert!(quote_invoice(&input, &FinancingPolicy::default()).is_err());
    }
}
