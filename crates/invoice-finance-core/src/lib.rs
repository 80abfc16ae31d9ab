pub mod contracts;
pub mod error;
pub mod financing;
pub mod lifecycle;
pub mod policy;
pub mod portfolio;
pub mod types;

#[cfg(feature = "marketplace")]
pub mod marketplace;

#[cfg(feature = "dashboard")]
pub mod dashboard;

pub use error::InvoiceFinanceError;
pub use types::*;

/// Standard result type for all invoice-finance operations
pub type InvoiceFinanceResult<T> = Result<T, InvoiceFinanceError>;
