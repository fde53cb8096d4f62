//! Per column feature scaling that travels with a Network when it is saved.

use rayon::prelude::*;
use savefile_derive::Savefile;

#[derive(Debug, Clone, Copy, PartialEq, Savefile)]
/// The values a column is scaled with, `(x - offset) / scale`.
pub struct ColumnScale {
    /// Subtracted from every value.
    pub offset: f32,
    /// Divides every value, a scale of zero maps the whole column to zero.
    pub scale: f32,
}

impl ColumnScale {
    fn apply(&self, x: f32) -> f32 {
        if self.scale == 0.0 {
            0.0
        } else {
            (x - self.offset) / self.scale
        }
    }

    fn revert(&self, x: f32) -> f32 {
        x * self.scale + self.offset
    }
}

#[derive(Debug, Clone, PartialEq, Default, Savefile)]
/// Scales every column of some samples independently, an unfitted Normalizer leaves the samples
/// as they are.
///
/// # Examples
///
/// ```rust
/// use tfnn::datasets::Normalizer;
///
/// let xs = vec![vec![0.0, 10.0], vec![5.0, 20.0], vec![10.0, 30.0]];
///
/// let mut normalizer = Normalizer::default();
/// normalizer.fit_minmax(&xs);
///
/// assert_eq!(normalizer.transform(&xs)[1], vec![0.5, 0.5]);
/// ```
pub struct Normalizer {
    columns: Vec<ColumnScale>,
}

fn column(xs: &[Vec<f32>], index: usize) -> impl Iterator<Item = f32> + '_ {
    xs.iter().filter_map(move |sample| sample.get(index).copied())
}

fn width(xs: &[Vec<f32>]) -> usize {
    xs.first().map(|sample| sample.len()).unwrap_or(0)
}

impl Normalizer {
    /// Weather or not the Normalizer was fitted to some samples.
    pub fn is_fitted(&self) -> bool {
        !self.columns.is_empty()
    }

    /// The scaling of every column.
    pub fn columns(&self) -> &[ColumnScale] {
        &self.columns
    }

    /// Fits the Normalizer so that every column goes from 0 to 1.
    pub fn fit_minmax(&mut self, xs: &[Vec<f32>]) -> &mut Self {
        self.columns = (0..width(xs))
            .into_par_iter()
            .map(|index| {
                let (min, max) = column(xs, index).fold(
                    (f32::INFINITY, f32::NEG_INFINITY),
                    |(min, max), x| (min.min(x), max.max(x)),
                );

                ColumnScale {
                    offset: min,
                    scale: max - min,
                }
            })
            .collect();

        self
    }

    /// Fits the Normalizer so that every column has a mean of 0 and a standard deviation of 1.
    pub fn fit_zscore(&mut self, xs: &[Vec<f32>]) -> &mut Self {
        let samples_amount = xs.len().max(1) as f32;

        self.columns = (0..width(xs))
            .into_par_iter()
            .map(|index| {
                let mean = column(xs, index).sum::<f32>() / samples_amount;
                let variance = column(xs, index)
                    .map(|x| (x - mean).powi(2))
                    .sum::<f32>()
                    / samples_amount;

                ColumnScale {
                    offset: mean,
                    scale: variance.sqrt(),
                }
            })
            .collect();

        self
    }

    /// Scales the samples, values in columns the Normalizer was not fitted to are left as they
    /// are.
    pub fn transform(&self, xs: &[Vec<f32>]) -> Vec<Vec<f32>> {
        xs.par_iter()
            .map(|sample| {
                sample
                    .iter()
                    .enumerate()
                    .map(|(index, x)| match self.columns.get(index) {
                        Some(column) => column.apply(*x),
                        None => *x,
                    })
                    .collect()
            })
            .collect()
    }

    /// Undoes the scaling of `transform`, constant columns come back as their single value.
    pub fn inverse_transform(&self, xs: &[Vec<f32>]) -> Vec<Vec<f32>> {
        xs.par_iter()
            .map(|sample| {
                sample
                    .iter()
                    .enumerate()
                    .map(|(index, x)| match self.columns.get(index) {
                        Some(column) => column.revert(*x),
                        None => *x,
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Normalizer;
    use crate::utils::approx_eq::assert_approx_equal_matrix;

    #[test]
    fn unfitted_normalizer_should_leave_samples_alone() {
        let xs = vec![vec![3.0, -1.0]];

        assert_eq!(Normalizer::default().transform(&xs), xs);
    }

    #[test]
    fn minmax_should_map_every_column_to_0_and_1() {
        let xs = vec![vec![-2.0, 100.0], vec![2.0, 300.0], vec![0.0, 200.0]];
        let mut normalizer = Normalizer::default();
        normalizer.fit_minmax(&xs);

        assert_eq!(
            normalizer.transform(&xs),
            vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![0.5, 0.5]]
        );
    }

    #[test]
    fn zscore_should_center_and_scale() {
        let xs = vec![vec![1.0], vec![3.0]];
        let mut normalizer = Normalizer::default();
        normalizer.fit_zscore(&xs);

        assert_approx_equal_matrix(&normalizer.transform(&xs), &vec![vec![-1.0], vec![1.0]], 4);
    }

    #[test]
    fn constant_columns_should_become_zero() {
        let xs = vec![vec![7.0, 1.0], vec![7.0, 2.0]];
        let mut normalizer = Normalizer::default();
        normalizer.fit_minmax(&xs);

        let transformed = normalizer.transform(&xs);

        assert_eq!(transformed[0][0], 0.0);
        assert_eq!(transformed[1][0], 0.0);
    }

    #[test]
    fn inverse_transform_should_undo_the_scaling() {
        let xs = vec![vec![-2.0, 100.0], vec![2.0, 300.0]];
        let mut normalizer = Normalizer::default();
        normalizer.fit_minmax(&xs);

        let restored = normalizer.inverse_transform(&normalizer.transform(&xs));

        assert_approx_equal_matrix(&restored, &xs, 3);
    }
}
