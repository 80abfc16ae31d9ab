use chrono::NaiveDate;
use invoice_finance_core::lifecycle::{apply_events, Invoice, InvoiceEvent, NewInvoice};
use invoice_finance_core::policy::{FinancingPolicy, WriteoffPolicy};
use invoice_finance_core::portfolio::{
    analyze_portfolio, positions_for_investor, summarize, PortfolioInput, PortfolioPosition,
    PortfolioSummary, PositionStatus,
};
use invoice_finance_core::{InvoiceFinanceError, UserId};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Portfolio aggregation tests
// ===========================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn position(
    id: &str,
    status: PositionStatus,
    invested: Decimal,
    actual: Option<Decimal>,
) -> PortfolioPosition {
    PortfolioPosition {
        invoice_id: id.into(),
        amount_invested: invested,
        expected_return: invested / dec!(10),
        actual_return: actual,
        status,
        risk_score: 50,
        settled_date: actual.map(|_| date(2024, 5, 15)),
    }
}

fn funded_invoice(
    id: &str,
    investor: &str,
    face: Decimal,
    paid: Decimal,
    settlement: Option<InvoiceEvent>,
) -> Invoice {
    let inv = Invoice::new(
        NewInvoice {
            id: id.into(),
            face_amount: face,
            discounted_amount: None,
            due_date: date(2024, 6, 30),
            created_date: date(2024, 1, 1),
            risk_score: 20,
            seller_id: "seller".into(),
            buyer_id: "buyer".into(),
        },
        &FinancingPolicy::default(),
    )
    .unwrap();
    let mut events = vec![
        InvoiceEvent::Confirm,
        InvoiceEvent::ListForFunding,
        InvoiceEvent::Fund {
            investor_id: investor.into(),
            discounted_amount: paid,
            funded_on: date(2024, 1, 10),
        },
    ];
    events.extend(settlement);
    apply_events(&inv, events).unwrap()
}

#[test]
fn test_summarize_empty_portfolio() {
    let summary = summarize(&[]).unwrap();
    assert_eq!(summary, PortfolioSummary::default());
    assert!(summary.monthly_series.is_empty());
}

#[test]
fn test_summarize_funded_repaid_defaulted() {
    let positions = vec![
        position("A", PositionStatus::Funded, dec!(90000), None),
        position("B", PositionStatus::Repaid, dec!(50000), Some(dec!(5000))),
        position("C", PositionStatus::Defaulted, dec!(20000), Some(dec!(-20000))),
    ];
    let summary = summarize(&positions).unwrap();
    assert_eq!(summary.total_invested, dec!(160000));
    assert_eq!(summary.total_actual_returns, dec!(-15000));
    assert_eq!(summary.active_count, 1);
    assert_eq!(summary.risk_distribution.medium.count, 3);
    assert_eq!(summary.risk_distribution.medium.percentage, dec!(100));
}

#[test]
fn test_positions_from_invoice_snapshot() {
    let invoices = vec![
        funded_invoice("I-1", "inv1", dec!(10000), dec!(9000), None),
        funded_invoice(
            "I-2",
            "inv1",
            dec!(20000),
            dec!(18000),
            Some(InvoiceEvent::Repay {
                repaid_on: date(2024, 3, 31),
            }),
        ),
        funded_invoice(
            "I-3",
            "inv1",
            dec!(10000),
            dec!(8000),
            Some(InvoiceEvent::Default {
                defaulted_on: date(2024, 4, 15),
            }),
        ),
        funded_invoice("I-4", "someone-else", dec!(5000), dec!(4500), None),
    ];

    let writeoff = WriteoffPolicy {
        recovery_rate: dec!(0.4),
    };
    let positions = positions_for_investor(&invoices, &UserId::new("inv1"), &writeoff).unwrap();
    assert_eq!(positions.len(), 3);
    assert_eq!(positions[1].actual_return, Some(dec!(2000)));
    // 40% recovered on 8000 invested: -4800
    assert_eq!(positions[2].actual_return, Some(dec!(-4800)));

    let summary = summarize(&positions).unwrap();
    assert_eq!(summary.total_invested, dec!(35000));
    assert_eq!(summary.total_expected_returns, dec!(3000));
    assert_eq!(summary.total_actual_returns, dec!(-2800));
    assert_eq!(summary.monthly_series.len(), 1);
    assert_eq!(summary.monthly_series[0].month.to_string(), "2024-03");
}

#[test]
fn test_positions_reject_unfunded_invoice() {
    let inv = Invoice::new(
        NewInvoice {
            id: "I-9".into(),
            face_amount: dec!(100),
            discounted_amount: None,
            due_date: date(2024, 2, 1),
            created_date: date(2024, 1, 1),
            risk_score: 5,
            seller_id: "s".into(),
            buyer_id: "b".into(),
        },
        &FinancingPolicy::default(),
    )
    .unwrap();
    assert!(PortfolioPosition::from_invoice(&inv, &WriteoffPolicy::default()).is_err());
}

#[test]
fn test_analyze_portfolio_from_json() {
    let input: PortfolioInput = serde_json::from_str(
        r#"{
            "positions": [
                { "invoice_id": "A", "amount_invested": "135000", "expected_return": "15000",
                  "status": "repaid", "actual_return": "15000", "risk_score": 25,
                  "settled_date": "2024-02-15" },
                { "invoice_id": "B", "amount_invested": "220000", "expected_return": "30000",
                  "status": "funded", "risk_score": 45 }
            ]
        }"#,
    )
    .unwrap();
    let out = analyze_portfolio(&input, &FinancingPolicy::default()).unwrap();
    let s = &out.result;
    assert_eq!(s.total_invested, dec!(355000));
    assert_eq!(s.total_expected_returns, dec!(45000));
    assert_eq!(s.active_count, 1);
    assert_eq!(s.risk_distribution.low.count, 1);
    assert_eq!(s.risk_distribution.medium.count, 1);
    assert!(out.warnings.is_empty());

    let json = serde_json::to_value(s).unwrap();
    assert_eq!(json["monthly_series"][0]["month"], "2024-02");
}

#[test]
fn test_analyze_portfolio_reports_overflowing_totals() {
    let max = Decimal::MAX.to_string();
    let input: PortfolioInput = serde_json::from_str(&format!(
        r#"{{
            "positions": [
                {{ "invoice_id": "A", "amount_invested": "{max}", "expected_return": "1",
                   "status": "funded", "risk_score": 10 }},
                {{ "invoice_id": "B", "amount_invested": "{max}", "expected_return": "1",
                   "status": "funded", "risk_score": 10 }}
            ]
        }}"#
    ))
    .unwrap();
    let err = analyze_portfolio(&input, &FinancingPolicy::default()).unwrap_err();
    assert!(matches!(err, InvoiceFinanceError::Overflow { .. }));
    assert!(err.to_string().contains("total invested"));
}
