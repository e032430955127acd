//! Latent-space analytics over the unified table.
//!
//! [`engine::LatentSpaceEngine`] takes a fully labeled table and, for a fixed
//! list of features:
//!
//! 1. standardizes every column (population standard deviation)
//! 2. clusters the rows with seeded k-means ([`kmeans`])
//! 3. lays them out in the plane for plotting ([`embedding`])
//! 4. attributes each row's cluster membership to individual features with
//!    Shapley values ([`attribution`])
//!
//! The feature with the largest attribution is the row's top driver. Audio
//! features (energy and valence) tend to dominate; when a stylistic feature is
//! nearly as strong it is reported instead, and the naive driver is kept
//! alongside.
//!
//! Every step is seeded, so the same table and configuration always produce
//! the same result.

pub use self::engine::{
    ClusterAssignment, ClusterSummary, LatentAnalysis, LatentConfig, LatentError, LatentSpaceEngine,
};

pub mod attribution;
pub mod distance;
pub mod embedding;
pub mod engine;
pub mod kmeans;
