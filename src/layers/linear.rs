use ndarray::{Array1, Array2, ArrayViewD};
use rand::{distributions::Uniform, rngs::StdRng, Rng};

use super::module::Module;
use crate::error::{GnnError, Result};

/// # Description
/// the affine transform y = x W^T + b
/// - weight is `out_features x in_features`
/// - the bias is optional, the layers followed by batch norm do not need it
#[derive(Debug, Clone)]
pub struct Linear {
    weight: Array2<f32>,
    bias: Option<Array1<f32>>,
}

impl Linear {
    pub fn new(in_features: usize, out_features: usize, bias: bool, rng: &mut StdRng) -> Self {
        let mut linear = Linear {
            weight: Array2::zeros((out_features, in_features)),
            bias: if bias {
                Some(Array1::zeros(out_features))
            } else {
                None
            },
        };
        linear.reset_parameters(rng);
        linear
    }

    pub fn in_features(&self) -> usize {
        self.weight.ncols()
    }

    pub fn out_features(&self) -> usize {
        self.weight.nrows()
    }

    pub fn has_bias(&self) -> bool {
        self.bias.is_some()
    }

    pub fn weight(&self) -> &Array2<f32> {
        &self.weight
    }

    pub fn weight_mut(&mut self) -> &mut Array2<f32> {
        &mut self.weight
    }

    pub fn bias_mut(&mut self) -> Option<&mut Array1<f32>> {
        self.bias.as_mut()
    }

    /// # Description
    /// - x is `n x in_features`, the result is `n x out_features`
    /// - fails when the width of x does not match the layer
    pub fn forward(&self, x: &Array2<f32>) -> Result<Array2<f32>> {
        if x.ncols() != self.in_features() {
            return Err(GnnError::ShapeMismatch {
                what: "linear input width",
                expected: self.in_features(),
                got: x.ncols(),
            });
        }
        let mut out = x.dot(&self.weight.t());
        if let Some(bias) = &self.bias {
            out += bias;
        }
        Ok(out)
    }
}

impl Module for Linear {
    /// both weight and bias are drawn from U(-1/sqrt(fan_in), 1/sqrt(fan_in))
    fn reset_parameters(&mut self, rng: &mut StdRng) {
        let fan_in = self.in_features().max(1);
        let bound = 1.0 / (fan_in as f32).sqrt();
        let dist = Uniform::new_inclusive(-bound, bound);
        self.weight.mapv_inplace(|_| rng.sample(&dist));
        if let Some(bias) = &mut self.bias {
            bias.mapv_inplace(|_| rng.sample(&dist));
        }
    }

    fn named_parameters(&self) -> Vec<(String, ArrayViewD<'_, f32>)> {
        let mut params = vec![("weight".to_string(), self.weight.view().into_dyn())];
        if let Some(bias) = &self.bias {
            params.push(("bias".to_string(), bias.view().into_dyn()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    #[test]
    fn test_linear_forward() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut linear = Linear::new(2, 1, true, &mut rng);
        linear.weight_mut().assign(&array![[2.0, -1.0]]);
        linear.bias_mut().unwrap().fill(0.5);
        let out = linear.forward(&array![[1.0, 1.0], [3.0, 2.0]]).unwrap();
        assert_eq!(out, array![[1.5], [4.5]]);
    }

    #[test]
    fn test_linear_init_bound() {
        let mut rng = StdRng::seed_from_u64(7);
        let linear = Linear::new(16, 8, false, &mut rng);
        assert!(!linear.has_bias());
        assert_eq!(linear.num_parameters(), 128);
        assert!(linear.weight().iter().all(|w| w.abs() <= 0.25));
    }

    #[test]
    fn test_linear_width_mismatch() {
        let mut rng = StdRng::seed_from_u64(0);
        let linear = Linear::new(3, 2, true, &mut rng);
        let result = linear.forward(&Array2::zeros((4, 2)));
        assert!(matches!(
            result,
            Err(GnnError::ShapeMismatch {
                expected: 3,
                got: 2,
                ..
            })
        ));
    }
}
