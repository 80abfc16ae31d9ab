//! # Invoice Lifecycle
//!
//! Invoice state machine with a single authoritative transition function.
//!
//! ```text
//! Created → Confirmed → Listed → Funded → Repaid
//!    ↓          ↓          ↓        └────→ Defaulted
//!    └──────────┴──────────┴→ Cancelled
//! ```
//!
//! [`apply_event`] never mutates its input and never silently ignores an
//! event: it either returns the next [`Invoice`] value or an error naming the
//! rejected event and the state it was applied to. Storage of the result is
//! the caller's concern.
//!
//! ```
//! use chrono::NaiveDate;
//! use invoice_finance_core::lifecycle::{apply_event, Invoice, InvoiceEvent, InvoiceStatus, NewInvoice};
//! use invoice_finance_core::policy::FinancingPolicy;
//! use rust_decimal_macros::dec;
//!
//! let day = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
//! let invoice = Invoice::new(
//!     NewInvoice {
//!         id: "INV-001".into(),
//!         face_amount: dec!(10000),
//!         discounted_amount: None,
//!         due_date: day,
//!         created_date: day,
//!         risk_score: 20,
//!         seller_id: "seller-1".into(),
//!         buyer_id: "buyer-1".into(),
//!     },
//!     &FinancingPolicy::default(),
//! )
//! .unwrap();
//!
//! let confirmed = apply_event(&invoice, InvoiceEvent::Confirm).unwrap();
//! assert_eq!(confirmed.status(), InvoiceStatus::Confirmed);
//! assert!(apply_event(&confirmed, InvoiceEvent::Repay { repaid_on: day }).is_err());
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::contracts::{CurrentUser, UserRole};
use crate::error::InvoiceFinanceError;
use crate::financing::{self, RiskTier};
use crate::policy::FinancingPolicy;
use crate::types::{InvoiceId, Money, Percentage, RiskScore, UserId};
use crate::InvoiceFinanceResult;

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Invoice lifecycle state.
///
/// `Repaid`, `Defaulted` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Uploaded by the seller, awaiting buyer confirmation.
    #[default]
    Created,
    /// Buyer has acknowledged the debt.
    Confirmed,
    /// Open for funding on the marketplace.
    Listed,
    /// Purchased by an investor at the discounted amount.
    Funded,
    Repaid,
    Defaulted,
    Cancelled,
}

impl InvoiceStatus {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Repaid | Self::Defaulted | Self::Cancelled)
    }

    /// States in which an investor is attached to the invoice.
    #[must_use]
    pub const fn has_investor(&self) -> bool {
        matches!(self, Self::Funded | Self::Repaid | Self::Defaulted)
    }

    /// States reached through `Repay` or `Default`, which carry a settlement date.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Repaid | Self::Defaulted)
    }

    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Created, Self::Confirmed)
                | (Self::Created, Self::Cancelled)
                | (Self::Confirmed, Self::Listed)
                | (Self::Confirmed, Self::Cancelled)
                | (Self::Listed, Self::Funded)
                | (Self::Listed, Self::Cancelled)
                | (Self::Funded, Self::Repaid)
                | (Self::Funded, Self::Defaulted)
        )
    }

    #[must_use]
    pub fn valid_transitions(&self) -> Vec<Self> {
        match self {
            Self::Created => vec![Self::Confirmed, Self::Cancelled],
            Self::Confirmed => vec![Self::Listed, Self::Cancelled],
            Self::Listed => vec![Self::Funded, Self::Cancelled],
            Self::Funded => vec![Self::Repaid, Self::Defaulted],
            Self::Repaid | Self::Defaulted | Self::Cancelled => vec![],
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "CREATED",
            Self::Confirmed => "CONFIRMED",
            Self::Listed => "LISTED",
            Self::Funded => "FUNDED",
            Self::Repaid => "REPAID",
            Self::Defaulted => "DEFAULTED",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Event name without payload, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceEventKind {
    Confirm,
    ListForFunding,
    Fund,
    Repay,
    Default,
    Cancel,
}

impl fmt::Display for InvoiceEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Confirm => "Confirm",
            Self::ListForFunding => "ListForFunding",
            Self::Fund => "Fund",
            Self::Repay => "Repay",
            Self::Default => "Default",
            Self::Cancel => "Cancel",
        };
        f.write_str(s)
    }
}

/// Something that happened to an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InvoiceEvent {
    Confirm,
    ListForFunding,
    Fund {
        investor_id: UserId,
        discounted_amount: Money,
        funded_on: NaiveDate,
    },
    Repay {
        repaid_on: NaiveDate,
    },
    Default {
        defaulted_on: NaiveDate,
    },
    Cancel,
}

impl InvoiceEvent {
    pub fn kind(&self) -> InvoiceEventKind {
        match self {
            Self::Confirm => InvoiceEventKind::Confirm,
            Self::ListForFunding => InvoiceEventKind::ListForFunding,
            Self::Fund { .. } => InvoiceEventKind::Fund,
            Self::Repay { .. } => InvoiceEventKind::Repay,
            Self::Default { .. } => InvoiceEventKind::Default,
            Self::Cancel => InvoiceEventKind::Cancel,
        }
    }

    /// Funding event attributed to the logged-in investor.
    pub fn fund_by(user: &CurrentUser, discounted_amount: Money, funded_on: NaiveDate) -> Self {
        Self::Fund {
            investor_id: user.id.clone(),
            discounted_amount,
            funded_on,
        }
    }
}

// ---------------------------------------------------------------------------
// Invoice
// ---------------------------------------------------------------------------

/// Data supplied by a seller when uploading an invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvoice {
    pub id: InvoiceId,
    pub face_amount: Money,
    /// Asking price. Defaults to the policy discount off face.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discounted_amount: Option<Money>,
    pub due_date: NaiveDate,
    pub created_date: NaiveDate,
    pub risk_score: RiskScore,
    pub seller_id: UserId,
    pub buyer_id: UserId,
}

/// Wire form of an [`Invoice`]. Deserialization goes through here so that
/// invariants are checked on every invoice entering the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: InvoiceId,
    pub face_amount: Money,
    pub discounted_amount: Money,
    pub due_date: NaiveDate,
    pub created_date: NaiveDate,
    pub risk_score: RiskScore,
    #[serde(default)]
    pub status: InvoiceStatus,
    pub seller_id: UserId,
    pub buyer_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investor_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funded_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settled_date: Option<NaiveDate>,
}

/// An invoice with validated invariants. Only [`apply_event`] changes status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "InvoiceRecord", into = "InvoiceRecord")]
pub struct Invoice {
    id: InvoiceId,
    face_amount: Money,
    discounted_amount: Money,
    due_date: NaiveDate,
    created_date: NaiveDate,
    risk_score: RiskScore,
    status: InvoiceStatus,
    seller_id: UserId,
    buyer_id: UserId,
    investor_id: Option<UserId>,
    funded_date: Option<NaiveDate>,
    settled_date: Option<NaiveDate>,
}

fn validate_risk_score(risk_score: RiskScore) -> InvoiceFinanceResult<()> {
    if risk_score > 100 {
        return Err(InvoiceFinanceError::InvalidInput {
            field: "risk_score".into(),
            reason: format!("Risk score must be between 0 and 100, got {risk_score}"),
        });
    }
    Ok(())
}

impl Invoice {
    /// Create an invoice in the `Created` state.
    pub fn new(input: NewInvoice, policy: &FinancingPolicy) -> InvoiceFinanceResult<Self> {
        if input.face_amount <= Decimal::ZERO {
            return Err(InvoiceFinanceError::InvalidInput {
                field: "face_amount".into(),
                reason: "Face amount must be positive".into(),
            });
        }
        if input.due_date < input.created_date {
            return Err(InvoiceFinanceError::DateError(format!(
                "Due date {} is before creation date {}",
                input.due_date, input.created_date
            )));
        }
        validate_risk_score(input.risk_score)?;

        let discounted_amount = match input.discounted_amount {
            Some(amount) => amount,
            None => financing::default_discounted_amount(input.face_amount, policy.default_discount)?,
        };
        financing::expected_profit(input.face_amount, discounted_amount)?;

        Ok(Self {
            id: input.id,
            face_amount: input.face_amount,
            discounted_amount,
            due_date: input.due_date,
            created_date: input.created_date,
            risk_score: input.risk_score,
            status: InvoiceStatus::Created,
            seller_id: input.seller_id,
            buyer_id: input.buyer_id,
            investor_id: None,
            funded_date: None,
            settled_date: None,
        })
    }

    pub fn id(&self) -> &InvoiceId {
        &self.id
    }

    pub fn face_amount(&self) -> Money {
        self.face_amount
    }

    pub fn discounted_amount(&self) -> Money {
        self.discounted_amount
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn created_date(&self) -> NaiveDate {
        self.created_date
    }

    pub fn risk_score(&self) -> RiskScore {
        self.risk_score
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn seller_id(&self) -> &UserId {
        &self.seller_id
    }

    pub fn buyer_id(&self) -> &UserId {
        &self.buyer_id
    }

    pub fn investor_id(&self) -> Option<&UserId> {
        self.investor_id.as_ref()
    }

    pub fn funded_date(&self) -> Option<NaiveDate> {
        self.funded_date
    }

    /// Date of the `Repay` or `Default` event.
    pub fn settled_date(&self) -> Option<NaiveDate> {
        self.settled_date
    }

    /// Face minus discounted amount; the amounts are validated on construction.
    pub fn expected_profit(&self) -> Money {
        self.face_amount - self.discounted_amount
    }

    /// ROI in percent. Construction rejects amount pairs whose ROI overflows,
    /// so the zero fallback is never taken.
    pub fn investor_roi(&self) -> Percentage {
        financing::investor_roi(self.face_amount, self.discounted_amount).unwrap_or_default()
    }

    pub fn risk_tier(&self) -> RiskTier {
        financing::risk_tier(self.risk_score)
    }

    pub fn days_to_maturity(&self, as_of: NaiveDate) -> i64 {
        financing::days_to_maturity(self.due_date, as_of)
    }
}

impl TryFrom<InvoiceRecord> for Invoice {
    type Error = InvoiceFinanceError;

    fn try_from(r: InvoiceRecord) -> Result<Self, Self::Error> {
        if r.face_amount <= Decimal::ZERO {
            return Err(InvoiceFinanceError::InvalidInput {
                field: "face_amount".into(),
                reason: format!("Invoice {}: face amount must be positive", r.id),
            });
        }
        financing::expected_profit(r.face_amount, r.discounted_amount)?;
        validate_risk_score(r.risk_score)?;

        if r.investor_id.is_some() != r.status.has_investor() {
            return Err(InvoiceFinanceError::InvalidInput {
                field: "investor_id".into(),
                reason: format!(
                    "Invoice {} in state {} must {}have an investor",
                    r.id,
                    r.status,
                    if r.status.has_investor() { "" } else { "not " }
                ),
            });
        }
        if r.funded_date.is_some() != r.status.has_investor() {
            return Err(InvoiceFinanceError::DateError(format!(
                "Invoice {} in state {} must {}have a funded date",
                r.id,
                r.status,
                if r.status.has_investor() { "" } else { "not " }
            )));
        }
        if r.settled_date.is_some() != r.status.is_settled() {
            return Err(InvoiceFinanceError::DateError(format!(
                "Invoice {} in state {} must {}have a settled date",
                r.id,
                r.status,
                if r.status.is_settled() { "" } else { "not " }
            )));
        }
        if let (Some(funded), Some(settled)) = (r.funded_date, r.settled_date) {
            if settled < funded {
                return Err(InvoiceFinanceError::DateError(format!(
                    "Invoice {}: settled on {} before being funded on {}",
                    r.id, settled, funded
                )));
            }
        }

        Ok(Self {
            id: r.id,
            face_amount: r.face_amount,
            discounted_amount: r.discounted_amount,
            due_date: r.due_date,
            created_date: r.created_date,
            risk_score: r.risk_score,
            status: r.status,
            seller_id: r.seller_id,
            buyer_id: r.buyer_id,
            investor_id: r.investor_id,
            funded_date: r.funded_date,
            settled_date: r.settled_date,
        })
    }
}

impl From<Invoice> for InvoiceRecord {
    fn from(i: Invoice) -> Self {
        Self {
            id: i.id,
            face_amount: i.face_amount,
            discounted_amount: i.discounted_amount,
            due_date: i.due_date,
            created_date: i.created_date,
            risk_score: i.risk_score,
            status: i.status,
            seller_id: i.seller_id,
            buyer_id: i.buyer_id,
            investor_id: i.investor_id,
            funded_date: i.funded_date,
            settled_date: i.settled_date,
        }
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

fn check_settlement_date(invoice: &Invoice, settled_on: NaiveDate) -> InvoiceFinanceResult<()> {
    match invoice.funded_date {
        Some(funded) if settled_on < funded => Err(InvoiceFinanceError::DateError(format!(
            "Invoice {} cannot settle on {} before its funding date {}",
            invoice.id, settled_on, funded
        ))),
        _ => Ok(()),
    }
}

/// Apply one event, returning the next invoice value.
pub fn apply_event(invoice: &Invoice, event: InvoiceEvent) -> InvoiceFinanceResult<Invoice> {
    let state = invoice.status;
    let kind = event.kind();
    let mut next = invoice.clone();

    match (state, event) {
        (InvoiceStatus::Created, InvoiceEvent::Confirm) => {
            next.status = InvoiceStatus::Confirmed;
        }
        (InvoiceStatus::Confirmed, InvoiceEvent::ListForFunding) => {
            next.status = InvoiceStatus::Listed;
        }
        (
            InvoiceStatus::Listed,
            InvoiceEvent::Fund {
                investor_id,
                discounted_amount,
                funded_on,
            },
        ) => {
            financing::expected_profit(invoice.face_amount, discounted_amount)?;
            if funded_on < invoice.created_date {
                return Err(InvoiceFinanceError::DateError(format!(
                    "Invoice {} cannot be funded on {} before its creation date {}",
                    invoice.id, funded_on, invoice.created_date
                )));
            }
            next.status = InvoiceStatus::Funded;
            next.investor_id = Some(investor_id);
            next.discounted_amount = discounted_amount;
            next.funded_date = Some(funded_on);
        }
        (InvoiceStatus::Funded, InvoiceEvent::Repay { repaid_on }) => {
            check_settlement_date(invoice, repaid_on)?;
            next.status = InvoiceStatus::Repaid;
            next.settled_date = Some(repaid_on);
        }
        (InvoiceStatus::Funded, InvoiceEvent::Default { defaulted_on }) => {
            check_settlement_date(invoice, defaulted_on)?;
            next.status = InvoiceStatus::Defaulted;
            next.settled_date = Some(defaulted_on);
        }
        (
            InvoiceStatus::Created | InvoiceStatus::Confirmed | InvoiceStatus::Listed,
            InvoiceEvent::Cancel,
        ) => {
            next.status = InvoiceStatus::Cancelled;
        }
        _ => {
            return Err(InvoiceFinanceError::IllegalTransition { event: kind, state });
        }
    }

    debug!(invoice = %invoice.id, event = %kind, from = %state, to = %next.status, "invoice transition");
    Ok(next)
}

/// Apply a sequence of events, stopping at the first failure.
pub fn apply_events(
    invoice: &Invoice,
    events: impl IntoIterator<Item = InvoiceEvent>,
) -> InvoiceFinanceResult<Invoice> {
    events
        .into_iter()
        .try_fold(invoice.clone(), |current, event| apply_event(&current, event))
}

/// Check that `user` may apply `event` to `invoice`.
///
/// Buyers confirm and repay, sellers list and cancel, investors fund in their
/// own name, and only admins record a default. Admins may apply any event.
pub fn authorize(
    invoice: &Invoice,
    event: &InvoiceEvent,
    user: &CurrentUser,
) -> InvoiceFinanceResult<()> {
    if user.is_admin() {
        return Ok(());
    }
    let allowed = match event {
        InvoiceEvent::Confirm | InvoiceEvent::Repay { .. } => user.id == invoice.buyer_id,
        InvoiceEvent::ListForFunding | InvoiceEvent::Cancel => user.id == invoice.seller_id,
        InvoiceEvent::Fund { investor_id, .. } => {
            user.role == UserRole::Investor && &user.id == investor_id
        }
        InvoiceEvent::Default { .. } => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(InvoiceFinanceError::Unauthorized {
            user: user.id.clone(),
            event: event.kind(),
        })
    }
}

/// [`apply_event`] on behalf of an explicit user.
pub fn apply_event_as(
    invoice: &Invoice,
    event: InvoiceEvent,
    user: &CurrentUser,
) -> InvoiceFinanceResult<Invoice> {
    authorize(invoice, &event, user)?;
    apply_event(invoice, event)
}
