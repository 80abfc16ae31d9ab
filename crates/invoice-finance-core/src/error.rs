use rust_decimal::Decimal;
use thiserror::Error;

use crate::lifecycle::{InvoiceEventKind, InvoiceStatus};
use crate::types::UserId;

#[derive(Debug, Error)]
pub enum InvoiceFinanceError {
    #[error("Invalid amount: face {face_amount}, discounted {discounted_amount}: {reason}")]
    InvalidAmount {
        face_amount: Decimal,
        discounted_amount: Decimal,
        reason: String,
    },

    #[error("Illegal transition: cannot apply {event} to an invoice in state {state}")]
    IllegalTransition {
        event: InvoiceEventKind,
        state: InvoiceStatus,
    },

    #[error("Unauthorized: user {user} may not apply {event}")]
    Unauthorized { user: UserId, event: InvoiceEventKind },

    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Arithmetic overflow in {context}")]
    Overflow { context: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl InvoiceFinanceError {
    pub(crate) fn invalid_amount(
        face_amount: Decimal,
        discounted_amount: Decimal,
        reason: impl Into<String>,
    ) -> Self {
        InvoiceFinanceError::InvalidAmount {
            face_amount,
            discounted_amount,
            reason: reason.into(),
        }
    }
}

impl InvoiceFinanceError {
    pub(crate) fn overflow(context: impl Into<String>) -> Self {
        InvoiceFinanceError::Overflow {
            context: context.into(),
        }
    }
}

impl From<serde_json::Error> for InvoiceFinanceError {
    fn from(e: serde_json::Error) -> Self {
        InvoiceFinanceError::SerializationError(e.to_string())
    }
}
