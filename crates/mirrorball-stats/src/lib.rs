//! Statistical utilities shared by the Mirrorball pipeline crates.
//!
//! This crate provides the small numeric toolbox the pipeline needs:
//!
//! - **Descriptive statistics**: mean, median, variance, standard deviation, etc.
//! - **Standardization**: zero-mean, unit-variance column scaling
//! - **Regression metrics**: mean squared / absolute error for model validation
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`standardize`]: Column-wise standard scaling of feature matrices
//! - [`regression`]: Error metrics comparing predictions to observations
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use mirrorball_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Standardizing a feature matrix
//!
//! ```
//! use mirrorball_stats::standardize::StandardScaler;
//!
//! let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
//! let scaler = StandardScaler::fit(&rows).unwrap();
//! let scaled = scaler.transform(&rows);
//! assert_eq!(scaled[0], vec![-1.0, 0.0]);
//! assert_eq!(scaled[1], vec![1.0, 0.0]);
//! ```

pub mod descriptive;
pub mod regression;
pub mod standardize;
