use ndarray::{Array1, Array2, ArrayViewD, Axis};
use rand::rngs::StdRng;

use super::module::Module;
use crate::error::{GnnError, Result};

/// # Description
/// per-batch feature normalization over the rows of a `n x num_features` matrix
/// - training mode: normalize with the batch mean and the biased batch variance,
///   and update the running statistics
/// - evaluation mode: normalize with the running statistics
/// - a single row has no batch variance, training mode rejects it
#[derive(Debug, Clone)]
pub struct BatchNorm1d {
    weight: Array1<f32>,
    bias: Array1<f32>,
    running_mean: Array1<f32>,
    running_var: Array1<f32>,
    eps: f32,
    momentum: f32,
    training: bool,
}

impl BatchNorm1d {
    pub fn new(num_features: usize) -> Self {
        BatchNorm1d {
            weight: Array1::ones(num_features),
            bias: Array1::zeros(num_features),
            running_mean: Array1::zeros(num_features),
            running_var: Array1::ones(num_features),
            eps: 1e-5,
            momentum: 0.1,
            training: true,
        }
    }

    pub fn num_features(&self) -> usize {
        self.weight.len()
    }

    pub fn running_mean(&self) -> &Array1<f32> {
        &self.running_mean
    }

    pub fn weight_mut(&mut self) -> &mut Array1<f32> {
        &mut self.weight
    }

    pub fn bias_mut(&mut self) -> &mut Array1<f32> {
        &mut self.bias
    }

    /// an empty batch has no statistics, it goes through unchanged
    pub fn forward(&mut self, x: Array2<f32>) -> Result<Array2<f32>> {
        if x.ncols() != self.num_features() {
            return Err(GnnError::ShapeMismatch {
                what: "batch norm input width",
                expected: self.num_features(),
                got: x.ncols(),
            });
        }
        if x.nrows() == 0 {
            return Ok(x);
        }

        if self.training && x.nrows() == 1 {
            return Err(GnnError::SingleRowBatch {
                rows: x.nrows(),
                features: x.ncols(),
            });
        }

        let (mean, var) = if self.training {
            let mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(x.ncols()));
            let var = x.var_axis(Axis(0), 0.0);
            // the running variance is tracked unbiased
            let n = x.nrows() as f32;
            let unbiased = &var * (n / (n - 1.0));
            self.running_mean = &self.running_mean * (1.0 - self.momentum) + &mean * self.momentum;
            self.running_var = &self.running_var * (1.0 - self.momentum) + unbiased * self.momentum;
            (mean, var)
        } else {
            (self.running_mean.clone(), self.running_var.clone())
        };

        let scale = &self.weight / &var.mapv(|v| (v + self.eps).sqrt());
        let shift = &self.bias - &(&mean * &scale);
        Ok(x * &scale + &shift)
    }
}

impl Module for BatchNorm1d {
    fn reset_parameters(&mut self, _rng: &mut StdRng) {
        self.weight.fill(1.0);
        self.bias.fill(0.0);
        self.running_mean.fill(0.0);
        self.running_var.fill(1.0);
    }

    fn named_parameters(&self) -> Vec<(String, ArrayViewD<'_, f32>)> {
        vec![
            ("weight".to_string(), self.weight.view().into_dyn()),
            ("bias".to_string(), self.bias.view().into_dyn()),
        ]
    }

    fn train(&mut self, training: bool) {
        self.training = training;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_batch_norm_training() {
        let mut norm = BatchNorm1d::new(2);
        let out = norm
            .forward(array![[1.0, 10.0], [3.0, 10.0]])
            .unwrap();
        // first column has mean 2 and variance 1, second column is constant
        assert!((out[[0, 0]] + 1.0).abs() < 1e-3);
        assert!((out[[1, 0]] - 1.0).abs() < 1e-3);
        assert!(out.column(1).iter().all(|v| v.abs() < 1e-6));
        assert!((norm.running_mean()[0] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_batch_norm_eval_uses_running_stats() {
        let mut norm = BatchNorm1d::new(1);
        norm.train(false);
        let out = norm.forward(array![[4.0], [-4.0]]).unwrap();
        assert!((out[[0, 0]] - 4.0).abs() < 1e-3);
        assert!((out[[1, 0]] + 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_batch_norm_single_row() {
        let mut norm = BatchNorm1d::new(2);
        assert!(matches!(
            norm.forward(array![[1.0, 2.0]]),
            Err(GnnError::SingleRowBatch {
                rows: 1,
                features: 2
            })
        ));
        norm.train(false);
        let out = norm.forward(array![[1.0, 2.0]]).unwrap();
        assert!((out[[0, 1]] - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_batch_norm_empty_batch() {
        let mut norm = BatchNorm1d::new(3);
        let out = norm.forward(Array2::zeros((0, 3))).unwrap();
        assert_eq!(out.dim(), (0, 3));
    }
}
