pub mod dashboard;
pub mod financing;
pub mod lifecycle;
pub mod marketplace;
pub mod portfolio;

use chrono::NaiveDate;

/// Valuation date used when `--as-of` is not given.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
