//! Joins extracted lyric features with ground-truth labels.
//!
//! The pipeline's central data structure is the [`UnifiedTable`]: one
//! [`UnifiedRow`] per track in the lyrics corpus, holding every stylistic
//! feature extracted for it and a [`TargetValue`] for each regression target.
//!
//! # Workflow
//!
//! 1. **Join** ([`builder::TableBuilder`]): left outer join of lyrics, feature
//!    records and labels. Tracks without labels keep
//!    [`TargetValue::Absent`] targets, to be filled by the label reconstructor.
//! 2. **Select** ([`UnifiedTable::matrix`]): dense feature matrices for
//!    training and clustering, with missing values imputed as 0.
//! 3. **Summarize** ([`summary::TableSummary`]): stylometric highlights for
//!    reports.
//!
//! Labels match tracks by case-insensitive name. Re-release suffixes such as
//! `(Taylor's Version)` can be configured as aliases so the re-recorded track
//! inherits the original's label.

pub use self::{
    table::{UnifiedRow, UnifiedTable},
    target::{GroundTruthLabel, Target, TargetValue},
};

pub mod builder;
pub mod summary;
pub mod table;
pub mod target;
