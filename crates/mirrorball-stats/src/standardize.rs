//! Column-wise standard scaling.
//!
//! [`StandardScaler`] centers every column of a row-major matrix to zero mean and
//! scales it to unit (population) variance. Columns whose variance is zero are
//! only centered, never divided, so constant features map to exactly 0.

use crate::descriptive::DescriptiveStats;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum StandardizeError {
    #[display("cannot fit a scaler on an empty matrix")]
    Empty,
    #[display("row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// Per-column mean and scale fitted over a full row set.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Fits the scaler over every row of `rows`.
    ///
    /// # Errors
    ///
    /// Returns an error if `rows` is empty or rows differ in length.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, StandardizeError> {
        let width = rows.first().ok_or(StandardizeError::Empty)?.len();
        for (row, values) in rows.iter().enumerate() {
            if values.len() != width {
                return Err(StandardizeError::RaggedRow {
                    row,
                    found: values.len(),
                    expected: width,
                });
            }
        }

        let (means, scales) = (0..width)
            .map(|col| {
                // non-empty, checked above
                let stats = DescriptiveStats::new(rows.iter().map(|r| r[col])).unwrap();
                let scale = if stats.std_dev > 0.0 {
                    stats.std_dev
                } else {
                    1.0
                };
                (stats.mean, scale)
            })
            .unzip();

        Ok(Self { means, scales })
    }

    /// Number of columns the scaler was fitted on.
    #[must_use]
    pub fn width(&self) -> usize {
        self.means.len()
    }

    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    #[must_use]
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Scales a single row.
    ///
    /// # Panics
    ///
    /// Panics if `row` does not have [`width`](Self::width) columns.
    #[must_use]
    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        assert_eq!(row.len(), self.width());
        row.iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(v, (mean, scale))| (v - mean) / scale)
            .collect()
    }

    /// Scales every row of a matrix.
    #[must_use]
    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_have_zero_mean_unit_variance() {
        let rows = vec![
            vec![1.0, 100.0],
            vec![2.0, 300.0],
            vec![3.0, 200.0],
            vec![6.0, 400.0],
        ];
        let scaler = StandardScaler::fit(&rows).unwrap();
        let scaled = scaler.transform(&rows);
        for col in 0..2 {
            let stats = DescriptiveStats::new(scaled.iter().map(|r| r[col])).unwrap();
            assert!(stats.mean.abs() < 1e-12);
            assert!((stats.variance - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let rows = vec![vec![7.0], vec![7.0], vec![7.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        assert_eq!(scaler.scales(), &[1.0]);
        assert!(scaler.transform(&rows).iter().all(|r| r[0] == 0.0));
    }

    #[test]
    fn test_rejects_empty_and_ragged() {
        assert!(matches!(
            StandardScaler::fit(&[]),
            Err(StandardizeError::Empty)
        ));
        assert!(matches!(
            StandardScaler::fit(&[vec![1.0, 2.0], vec![1.0]]),
            Err(StandardizeError::RaggedRow { row: 1, .. })
        ));
    }
}
