//! A/B Test Dataset Cleaning Library
//!
//! Loads an A/B test dataset of user installs and payments, and removes two
//! classes of data-quality issues before analysis:
//!
//! - **Payment duplicates**: rows double-counting the same payment event,
//!   keyed by (`user_id`, `payment_time`)
//! - **Group contamination**: users assigned to more than one experiment
//!   group, removed wholesale
//!
//! Every operation is a pure transform over a polars [`DataFrame`]: it takes
//! a borrowed frame and returns a new one, preserving the relative order of
//! surviving rows, and reports what it removed.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ab_cleaning::{clean_dataset, load_dataset};
//!
//! let raw = load_dataset()?;
//! let (cleaned, report) = clean_dataset(&raw)?;
//!
//! println!(
//!     "{} duplicate payment rows, {} contaminated users",
//!     report.payments.duplicate_rows, report.groups.contaminated_users
//! );
//! ```
//!
//! The two dedup passes are also available individually as
//! [`remove_payment_duplicates`] and [`remove_user_group_duplicates`] for
//! running either one on loader output.
//!
//! [`DataFrame`]: polars::prelude::DataFrame

pub mod cleaner;
pub mod error;
pub mod loader;

// Re-exports for convenient access
pub use cleaner::{
    CleaningReport, GroupDedupReport, PaymentDedupReport, clean_dataset,
    remove_payment_duplicates, remove_user_group_duplicates,
};
pub use error::{CleaningError, Result, ResultExt};
pub use loader::{
    AB_GROUP, DATASET_PATH, INSTALL_TIME, PAYMENT_TIME, USER_ID, load_dataset, load_dataset_from,
};
