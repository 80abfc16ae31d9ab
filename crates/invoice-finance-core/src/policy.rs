//! Business parameters that are not fixed rules: the marketplace's default
//! discount and the loss recognised when a funded invoice defaults.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::InvoiceFinanceError;
use crate::types::{Money, Rate};
use crate::InvoiceFinanceResult;

/// Discount off face value applied when a seller lists without an asking price.
pub const DEFAULT_DISCOUNT: Rate = dec!(0.10);

/// How a defaulted position is written off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteoffPolicy {
    /// Fraction of the invested amount recovered after default (0 = total loss).
    pub recovery_rate: Rate,
}

impl Default for WriteoffPolicy {
    fn default() -> Self {
        Self {
            recovery_rate: Decimal::ZERO,
        }
    }
}

impl WriteoffPolicy {
    /// Realised return on a defaulted position: recovered cash minus what was paid.
    pub fn writeoff(&self, amount_invested: Money) -> Money {
        amount_invested * self.recovery_rate - amount_invested
    }
}

/// Tunable parameters shared by the calculator, lifecycle and aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancingPolicy {
    pub default_discount: Rate,
    pub writeoff: WriteoffPolicy,
}

impl Default for FinancingPolicy {
    fn default() -> Self {
        Self {
            default_discount: DEFAULT_DISCOUNT,
            writeoff: WriteoffPolicy::default(),
        }
    }
}

impl FinancingPolicy {
    pub fn validate(&self) -> InvoiceFinanceResult<()> {
        if self.default_discount < Decimal::ZERO || self.default_discount >= Decimal::ONE {
            return Err(InvoiceFinanceError::InvalidInput {
                field: "default_discount".into(),
                reason: "Default discount must be in [0, 1)".into(),
            });
        }
        let recovery = self.writeoff.recovery_rate;
        if recovery < Decimal::ZERO || recovery > Decimal::ONE {
            return Err(InvoiceFinanceError::InvalidInput {
                field: "writeoff.recovery_rate".into(),
                reason: "Recovery rate must be in [0, 1]".into(),
            });
        }
        Ok(())
    }
}
