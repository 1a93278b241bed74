//! Removal of double-counted payment rows.

use super::string_key_column;
use crate::error::{CleaningError, Result};
use crate::loader::{PAYMENT_TIME, USER_ID};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Counts reported by [`remove_payment_duplicates`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDedupReport {
    /// Rows involved in any key collision, counted before removal. Every
    /// member of every group of size >= 2 counts, not just the extras.
    pub duplicate_rows: usize,
    /// Among those rows, how many carry a non-null payment_time.
    pub duplicate_payments: usize,
}

/// Remove rows that duplicate a (`user_id`, `payment_time`) key.
///
/// Two rows collide when both key fields are equal; a null payment time is
/// treated as equal to another null, so rows for non-paying users collapse
/// by user as well. The first-seen row of each key survives, in input order.
pub fn remove_payment_duplicates(df: &DataFrame) -> Result<(DataFrame, PaymentDedupReport)> {
    let user = string_key_column(df, USER_ID)?;
    let user = user.str()?;

    // Physical milliseconds of the datetime; null stays null.
    let payment = df
        .column(PAYMENT_TIME)
        .map_err(|_| CleaningError::ColumnNotFound(PAYMENT_TIME.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    let payment = payment.i64()?;

    let height = df.height();

    // Key -> row indices, indices in input order. First-seen retention and
    // the duplicate counts both fall out of the index lists.
    let mut groups: HashMap<(Option<&str>, Option<i64>), Vec<usize>> =
        HashMap::with_capacity(height);
    for idx in 0..height {
        let key = (user.get(idx), payment.get(idx));
        groups.entry(key).or_default().push(idx);
    }

    let mut keep = vec![false; height];
    let mut duplicate_rows = 0;
    let mut duplicate_payments = 0;

    for ((_, payment_key), indices) in &groups {
        keep[indices[0]] = true;
        if indices.len() >= 2 {
            duplicate_rows += indices.len();
            if payment_key.is_some() {
                duplicate_payments += indices.len();
            }
        }
    }

    info!(
        "Rows sharing a (user_id, payment_time) key: {}",
        duplicate_rows
    );
    info!("Of which with a recorded payment: {}", duplicate_payments);

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let deduped = df.filter(&mask)?;

    Ok((
        deduped,
        PaymentDedupReport {
            duplicate_rows,
            duplicate_payments,
        },
    ))
}
