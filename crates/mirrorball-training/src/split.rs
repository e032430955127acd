//! Deterministic train/validation hold-out.

use rand::{SeedableRng, seq::SliceRandom};
use rand_pcg::Pcg64Mcg;

/// Positions into a labeled set, split into training and validation parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSplit {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

impl ValidationSplit {
    /// Holds out `ceil(fraction * n)` of `n` positions, at most `n - 1`.
    ///
    /// Fewer than two positions are never split. Both parts are returned in
    /// ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorball_training::split::ValidationSplit;
    ///
    /// let split = ValidationSplit::new(11, 0.2, 42);
    /// assert_eq!(split.validation.len(), 3);
    /// assert_eq!(split.train.len(), 8);
    /// assert!(ValidationSplit::new(1, 0.2, 42).validation.is_empty());
    /// ```
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn new(n: usize, fraction: f64, seed: u64) -> Self {
        let mut positions = (0..n).collect::<Vec<_>>();
        if n < 2 {
            return Self {
                train: positions,
                validation: vec![],
            };
        }
        let held_out = ((fraction.max(0.0) * n as f64).ceil() as usize).min(n - 1);

        positions.shuffle(&mut Pcg64Mcg::seed_from_u64(seed));
        let mut train = positions.split_off(held_out);
        let mut validation = positions;
        train.sort_unstable();
        validation.sort_unstable();
        Self { train, validation }
    }

    #[must_use]
    pub fn has_validation(&self) -> bool {
        !self.validation.is_empty()
    }
}
