//! crates/campus_print_core/src/pricing.rs
//!
//! Deterministic pricing for a configured print job. Pure functions only, so
//! a frozen `PrintJob.configuration` can be re-priced later for auditing.

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::domain::{ColorMode, PrintConfiguration, Sides};

/// Per-page rate for monochrome printing, in currency units.
pub const MONOCHROME_PER_PAGE: u32 = 3;

/// Per-page rate for color printing. A flat rate of its own, not a surcharge
/// on the monochrome rate; confirm with the shop before changing.
pub const COLOR_PER_PAGE: u32 = 8;

pub const MIN_COPIES: u32 = 1;
pub const MAX_COPIES: u32 = 10;

/// Double-sided jobs pay 90% of the single-sided subtotal. The saving is per
/// sheet, not per page, which is why it is a factor rather than a rate change.
fn duplex_factor() -> Decimal {
    Decimal::new(9, 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("a job cannot be priced with no pages")]
    NoPages,
    #[error("copies must be between {MIN_COPIES} and {MAX_COPIES}")]
    InvalidCopies,
}

/// Prices a configuration against the page counts of its assets.
///
/// `total = per_page * total_pages [* 0.9 if double-sided] * copies`,
/// rounded half-up to two decimal places. Callers are expected to have
/// clamped `copies` already; the range is re-checked here anyway.
pub fn price(
    configuration: &PrintConfiguration,
    pages_per_asset: &[u32],
) -> Result<Decimal, PricingError> {
    if !(MIN_COPIES..=MAX_COPIES).contains(&configuration.copies) {
        return Err(PricingError::InvalidCopies);
    }
    let total_pages: u32 = pages_per_asset.iter().sum();
    if total_pages == 0 {
        return Err(PricingError::NoPages);
    }

    let per_page = match configuration.color_mode {
        ColorMode::Monochrome => Decimal::from(MONOCHROME_PER_PAGE),
        ColorMode::Color => Decimal::from(COLOR_PER_PAGE),
    };

    let mut subtotal_per_copy = per_page * Decimal::from(total_pages);
    if configuration.sides == Sides::DoubleSided {
        subtotal_per_copy *= duplex_factor();
    }

    let total = subtotal_per_copy * Decimal::from(configuration.copies);
    Ok(total.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}
