//! Portfolio aggregation -- folds an investor's funded invoices into the
//! summary every dashboard renders.
//!
//! `summarize` is pure and order-independent: totals are sums, the risk
//! distribution is a count, and the monthly series is keyed by calendar month
//! and emitted in ascending order. Months without repayments are omitted.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::debug;

use crate::error::InvoiceFinanceError;
use crate::financing::{risk_tier, to_percentage, RiskTier};
use crate::lifecycle::{Invoice, InvoiceStatus};
use crate::policy::{FinancingPolicy, WriteoffPolicy};
use crate::types::{with_metadata, ComputationOutput, InvoiceId, Money, Percentage, RiskScore, UserId};
use crate::InvoiceFinanceResult;

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// Status of an investor's stake in one invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Funded,
    Repaid,
    Defaulted,
}

/// An investor's stake in one funded invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioPosition {
    pub invoice_id: InvoiceId,
    /// Discounted amount paid at funding.
    pub amount_invested: Money,
    /// Face minus discounted amount.
    pub expected_return: Money,
    /// Realised return; only set once repaid or defaulted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_return: Option<Money>,
    pub status: PositionStatus,
    pub risk_score: RiskScore,
    /// Repayment or default date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settled_date: Option<NaiveDate>,
}

impl PortfolioPosition {
    /// Derive the position held in a funded, repaid or defaulted invoice.
    pub fn from_invoice(invoice: &Invoice, writeoff: &WriteoffPolicy) -> InvoiceFinanceResult<Self> {
        let amount_invested = invoice.discounted_amount();
        let expected_return = invoice.expected_profit();

        let (status, actual_return) = match invoice.status() {
            InvoiceStatus::Funded => (PositionStatus::Funded, None),
            InvoiceStatus::Repaid => (PositionStatus::Repaid, Some(expected_return)),
            InvoiceStatus::Defaulted => (
                PositionStatus::Defaulted,
                Some(writeoff.writeoff(amount_invested)),
            ),
            other => {
                return Err(InvoiceFinanceError::InvalidInput {
                    field: "status".into(),
                    reason: format!(
                        "Invoice {} in state {} has not been funded",
                        invoice.id(),
                        other
                    ),
                })
            }
        };

        Ok(Self {
            invoice_id: invoice.id().clone(),
            amount_invested,
            expected_return,
            actual_return,
            status,
            risk_score: invoice.risk_score(),
            settled_date: invoice.settled_date(),
        })
    }

    pub fn risk_tier(&self) -> RiskTier {
        risk_tier(self.risk_score)
    }
}

/// Positions held by `investor` across a snapshot of invoices.
pub fn positions_for_investor(
    invoices: &[Invoice],
    investor: &UserId,
    writeoff: &WriteoffPolicy,
) -> InvoiceFinanceResult<Vec<PortfolioPosition>> {
    invoices
        .iter()
        .filter(|inv| inv.investor_id() == Some(investor))
        .map(|inv| PortfolioPosition::from_invoice(inv, writeoff))
        .collect()
}

// ---------------------------------------------------------------------------
// Calendar month key
// ---------------------------------------------------------------------------

/// Calendar month, serialized as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = InvoiceFinanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || InvoiceFinanceError::DateError(format!("Expected YYYY-MM, got '{s}'"));
        let (y, m) = s.split_once('-').ok_or_else(bad)?;
        let year: i32 = y.parse().map_err(|_| bad())?;
        let month: u32 = m.parse().map_err(|_| bad())?;
        if !(1..=12).contains(&month) {
            return Err(bad());
        }
        Ok(Self { year, month })
    }
}

impl From<YearMonth> for String {
    fn from(ym: YearMonth) -> Self {
        ym.to_string()
    }
}

impl TryFrom<String> for YearMonth {
    type Error = InvoiceFinanceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierBucket {
    pub count: usize,
    pub percentage: Percentage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskDistribution {
    pub low: TierBucket,
    pub medium: TierBucket,
    pub high: TierBucket,
}

impl RiskDistribution {
    pub fn bucket(&self, tier: RiskTier) -> &TierBucket {
        match tier {
            RiskTier::Low => &self.low,
            RiskTier::Medium => &self.medium,
            RiskTier::High => &self.high,
        }
    }

    fn bucket_mut(&mut self, tier: RiskTier) -> &mut TierBucket {
        match tier {
            RiskTier::Low => &mut self.low,
            RiskTier::Medium => &mut self.medium,
            RiskTier::High => &mut self.high,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReturn {
    pub month: YearMonth,
    pub returns: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_invested: Money,
    pub total_expected_returns: Money,
    pub total_actual_returns: Money,
    pub active_count: usize,
    /// Realised returns over total invested, in percent.
    pub realized_roi: Percentage,
    pub risk_distribution: RiskDistribution,
    pub monthly_series: Vec<MonthlyReturn>,
}

fn add(total: &mut Money, amount: Money, context: &str) -> InvoiceFinanceResult<()> {
    *total = total
        .checked_add(amount)
        .ok_or_else(|| InvoiceFinanceError::overflow(context))?;
    Ok(())
}

/// Aggregate positions into a summary. Empty input gives an all-zero summary.
///
/// Fails only when a total leaves the decimal range.
pub fn summarize(positions: &[PortfolioPosition]) -> InvoiceFinanceResult<PortfolioSummary> {
    let mut summary = PortfolioSummary::default();
    let mut monthly: BTreeMap<YearMonth, Money> = BTreeMap::new();

    for p in positions {
        add(&mut summary.total_invested, p.amount_invested, "total invested")?;

        match p.status {
            PositionStatus::Funded => {
                summary.active_count += 1;
                add(&mut summary.total_expected_returns, p.expected_return, "total expected returns")?;
            }
            PositionStatus::Repaid => {
                add(&mut summary.total_expected_returns, p.expected_return, "total expected returns")?;
                let actual = p.actual_return.unwrap_or(Decimal::ZERO);
                add(&mut summary.total_actual_returns, actual, "total actual returns")?;
                if let Some(date) = p.settled_date {
                    let month = monthly.entry(YearMonth::of(date)).or_insert(Decimal::ZERO);
                    add(month, actual, "monthly returns")?;
                }
            }
            PositionStatus::Defaulted => {
                let actual = p.actual_return.unwrap_or(Decimal::ZERO);
                add(&mut summary.total_actual_returns, actual, "total actual returns")?;
            }
        }

        summary.risk_distribution.bucket_mut(p.risk_tier()).count += 1;
    }

    if !positions.is_empty() {
        let total = Decimal::from(positions.len() as u64);
        for tier in RiskTier::ALL {
            let bucket = summary.risk_distribution.bucket_mut(tier);
            bucket.percentage = Decimal::from(bucket.count as u64) / total * dec!(100);
        }
    }

    if !summary.total_invested.is_zero() {
        summary.realized_roi = summary
            .total_actual_returns
            .checked_div(summary.total_invested)
            .and_then(to_percentage)
            .ok_or_else(|| InvoiceFinanceError::overflow("realized ROI"))?;
    }

    summary.monthly_series = monthly
        .into_iter()
        .map(|(month, returns)| MonthlyReturn { month, returns })
        .collect();

    debug!(
        positions = positions.len(),
        months = summary.monthly_series.len(),
        "portfolio summarized"
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Portfolio analysis envelope
// ---------------------------------------------------------------------------

/// Input for a portfolio analysis: explicit positions, or invoices plus the
/// investor whose positions should be derived from them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioInput {
    #[serde(default)]
    pub positions: Vec<PortfolioPosition>,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investor_id: Option<UserId>,
}

/// Summarize a portfolio, reporting data-quality warnings alongside.
pub fn analyze_portfolio(
    input: &PortfolioInput,
    policy: &FinancingPolicy,
) -> InvoiceFinanceResult<ComputationOutput<PortfolioSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut positions = input.positions.clone();
    if !input.invoices.is_empty() {
        let investor = input.investor_id.as_ref().ok_or_else(|| {
            InvoiceFinanceError::InvalidInput {
                field: "investor_id".into(),
                reason: "investor_id is required when summarizing invoices".into(),
            }
        })?;
        positions.extend(positions_for_investor(&input.invoices, investor, &policy.writeoff)?);
    }

    for p in &positions {
        if p.status == PositionStatus::Repaid && p.settled_date.is_none() {
            warnings.push(format!(
                "Position {} is repaid but has no settlement date; excluded from monthly series",
                p.invoice_id
            ));
        }
        if p.status != PositionStatus::Funded && p.actual_return.is_none() {
            warnings.push(format!(
                "Position {} is settled but has no actual return; counted as zero",
                p.invoice_id
            ));
        }
    }

    let summary = summarize(&positions)?;
    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Portfolio aggregation -- sums over positions, risk tiers by score, sparse monthly repayment series",
        &serde_json::json!({
            "recovery_rate": policy.writeoff.recovery_rate.to_string(),
            "positions": positions.len(),
        }),
        warnings,
        elapsed,
        summary,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn position(
        id: &str,
        status: PositionStatus,
        invested: Money,
        expected: Money,
        actual: Option<Money>,
        risk_score: RiskScore,
        settled: Option<NaiveDate>,
    ) -> PortfolioPosition {
        PortfolioPosition {
            invoice_id: id.into(),
            amount_invested: invested,
            expected_return: expected,
            actual_return: actual,
            status,
            risk_score,
            settled_date: settled,
        }
    }

    fn three_positions() -> Vec<PortfolioPosition> {
        vec![
            position("A", PositionStatus::Funded, dec!(90000), dec!(10000), None, 25, None),
            position(
                "B",
                PositionStatus::Repaid,
                dec!(50000),
                dec!(5000),
                Some(dec!(5000)),
                45,
                Some(date(2024, 3, 10)),
            ),
            position(
                "C",
                PositionStatus::Defaulted,
                dec!(20000),
                dec!(2000),
                Some(dec!(-20000)),
                80,
                Some(date(2024, 4, 2)),
            ),
        ]
    }

    #[test]
    fn test_summarize_empty() {
        let s = summarize(&[]).unwrap();
        assert_eq!(s.total_invested, Decimal::ZERO);
        assert_eq!(s.total_expected_returns, Decimal::ZERO);
        assert_eq!(s.total_actual_returns, Decimal::ZERO);
        assert_eq!(s.active_count, 0);
        assert_eq!(s.realized_roi, Decimal::ZERO);
        assert_eq!(s.risk_distribution, RiskDistribution::default());
        assert!(s.monthly_series.is_empty());
    }

    #[test]
    fn test_summarize_mixed_statuses() {
        let s = summarize(&three_positions()).unwrap();
        assert_eq!(s.total_invested, dec!(160000));
        assert_eq!(s.total_expected_returns, dec!(15000));
        assert_eq!(s.total_actual_returns, dec!(-15000));
        assert_eq!(s.active_count, 1);
        assert_eq!(s.risk_distribution.low.count, 1);
        assert_eq!(s.risk_distribution.medium.count, 1);
        assert_eq!(s.risk_distribution.high.count, 1);
        // -15000 / 160000 = -9.375%
        assert_eq!(s.realized_roi, dec!(-9.4));
        // Defaulted positions never appear in the repayment series
        assert_eq!(
            s.monthly_series,
            vec![MonthlyReturn {
                month: YearMonth { year: 2024, month: 3 },
                returns: dec!(5000),
            }]
        );
    }

    #[test]
    fn test_summarize_is_order_independent() {
        let mut reversed = three_positions();
        reversed.reverse();
        assert_eq!(
            summarize(&reversed).unwrap(),
            summarize(&three_positions()).unwrap()
        );
    }

    #[test]
    fn test_monthly_series_sparse_and_ascending() {
        let positions = vec![
            position("A", PositionStatus::Repaid, dec!(100), dec!(10), Some(dec!(10)), 10, Some(date(2024, 6, 1))),
            position("B", PositionStatus::Repaid, dec!(100), dec!(20), Some(dec!(20)), 10, Some(date(2024, 1, 31))),
            position("C", PositionStatus::Repaid, dec!(100), dec!(5), Some(dec!(5)), 10, Some(date(2024, 6, 30))),
        ];
        let s = summarize(&positions).unwrap();
        let months: Vec<String> = s.monthly_series.iter().map(|m| m.month.to_string()).collect();
        assert_eq!(months, vec!["2024-01", "2024-06"]);
        assert_eq!(s.monthly_series[1].returns, dec!(15));
    }

    #[test]
    fn test_summarize_overflow_is_an_error() {
        let positions = vec![
            position("A", PositionStatus::Funded, Decimal::MAX, dec!(1), None, 10, None),
            position("B", PositionStatus::Funded, Decimal::MAX, dec!(1), None, 10, None),
        ];
        assert!(matches!(
            summarize(&positions),
            Err(InvoiceFinanceError::Overflow { .. })
        ));

        // Totals fit, realized ROI does not
        let positions = vec![position(
            "A",
            PositionStatus::Repaid,
            Decimal::new(1, 28),
            Decimal::MAX,
            Some(Decimal::MAX),
            10,
            Some(date(2024, 1, 1)),
        )];
        assert!(summarize(&positions).is_err());
    }

    #[test]
    fn test_risk_percentages() {
        let positions = vec![
            position("A", PositionStatus::Funded, dec!(100), dec!(10), None, 10, None),
            position("B", PositionStatus::Funded, dec!(100), dec!(10), None, 20, None),
            position("C", PositionStatus::Funded, dec!(100), dec!(10), None, 90, None),
            position("D", PositionStatus::Funded, dec!(100), dec!(10), None, 50, None),
        ];
        let s = summarize(&positions).unwrap();
        assert_eq!(s.risk_distribution.low.percentage, dec!(50));
        assert_eq!(s.risk_distribution.medium.percentage, dec!(25));
        assert_eq!(s.risk_distribution.bucket(RiskTier::High).percentage, dec!(25));
    }

    #[test]
    fn test_year_month_parse() {
        assert_eq!("2024-03".parse::<YearMonth>().unwrap(), YearMonth { year: 2024, month: 3 });
        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("March".parse::<YearMonth>().is_err());
        let json = serde_json::to_string(&YearMonth { year: 2024, month: 3 }).unwrap();
        assert_eq!(json, "\"2024-03\"");
    }

    #[test]
    fn test_analyze_requires_investor_for_invoices() {
        let invoice: Invoice = serde_json::from_str(
            r#"{
                "id": "X", "face_amount": "100", "discounted_amount": "90",
                "due_date": "2024-02-01", "created_date": "2024-01-01", "risk_score": 10,
                "status": "funded", "seller_id": "s", "buyer_id": "b", "investor_id": "i",
                "funded_date": "2024-01-05"
            }"#,
        )
        .unwrap();
        let input = PortfolioInput {
            invoices: vec![invoice],
            ..PortfolioInput::default()
        };
        assert!(analyze_portfolio(&input, &FinancingPolicy::default()).is_err());
    }

    #[test]
    fn test_analyze_warns_on_missing_settlement_date() {
        let input = PortfolioInput {
            positions: vec![position("A", PositionStatus::Repaid, dec!(100), dec!(10), Some(dec!(10)), 10, None)],
            ..PortfolioInput::default()
        };
        let out = analyze_portfolio(&input, &FinancingPolicy::default()).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(out.result.monthly_series.is_empty());
        assert_eq!(out.result.total_actual_returns, dec!(10));
    }
}
