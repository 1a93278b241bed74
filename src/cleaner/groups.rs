//! Removal of users assigned to more than one experiment group.

use super::string_key_column;
use crate::error::Result;
use crate::loader::{AB_GROUP, USER_ID};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Counts reported by [`remove_user_group_duplicates`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDedupReport {
    /// Distinct users found in more than one experiment group.
    pub contaminated_users: usize,
}

/// Remove every row of any user assigned to more than one distinct
/// `ab_group` value.
///
/// Repeated rows with the same group do not count as contamination; only
/// distinct (user, group) pairs matter. A contaminated user is excluded
/// wholesale, so group-assignment integrity wins over data retention.
pub fn remove_user_group_duplicates(df: &DataFrame) -> Result<(DataFrame, GroupDedupReport)> {
    let user = string_key_column(df, USER_ID)?;
    let user = user.str()?;
    let group = string_key_column(df, AB_GROUP)?;
    let group = group.str()?;

    let height = df.height();

    // Distinct groups seen per user; the set collapses identical-group
    // repeats, matching a distinct (user, group) projection.
    let mut assignments: HashMap<Option<&str>, HashSet<Option<&str>>> = HashMap::new();
    for idx in 0..height {
        assignments
            .entry(user.get(idx))
            .or_default()
            .insert(group.get(idx));
    }

    let contaminated: HashSet<Option<&str>> = assignments
        .into_iter()
        .filter(|(_, groups)| groups.len() > 1)
        .map(|(user_id, _)| user_id)
        .collect();

    info!(
        "Users assigned to more than one ab_group: {}",
        contaminated.len()
    );

    let mut keep = Vec::with_capacity(height);
    for idx in 0..height {
        keep.push(!contaminated.contains(&user.get(idx)));
    }

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let filtered = df.filter(&mask)?;

    Ok((
        filtered,
        GroupDedupReport {
            contaminated_users: contaminated.len(),
        },
    ))
}
