//! Deduplication passes for the A/B test dataset.
//!
//! This module provides functionality for:
//! - Removing duplicate (user, payment_time) rows
//! - Removing users assigned to more than one experiment group
//!
//! Both passes are pure: they take a borrowed frame and return a new one,
//! preserving the relative order of surviving rows.

mod groups;
mod payments;

pub use groups::{GroupDedupReport, remove_user_group_duplicates};
pub use payments::{PaymentDedupReport, remove_payment_duplicates};

use crate::error::{CleaningError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Combined report for a full cleaning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub payments: PaymentDedupReport,
    pub groups: GroupDedupReport,
}

/// Apply both deduplication passes in order: payment duplicates first, then
/// users contaminated across experiment groups.
pub fn clean_dataset(df: &DataFrame) -> Result<(DataFrame, CleaningReport)> {
    let (df, payments) = remove_payment_duplicates(df)?;
    let (df, groups) = remove_user_group_duplicates(&df)?;

    Ok((df, CleaningReport { payments, groups }))
}

/// Fetch a key column cast to its string representation, so identifier
/// columns key identically whether the CSV inferred them as strings or
/// integers. Null values stay null.
pub(crate) fn string_key_column(df: &DataFrame, name: &str) -> Result<Series> {
    let series = df
        .column(name)
        .map_err(|_| CleaningError::ColumnNotFound(name.to_string()))?
        .as_materialized_series()
        .cast(&DataType::String)?;

    Ok(series)
}
