use enum_as_inner::EnumAsInner;
use itertools::Itertools;
use log::debug;
use ndarray::{Array2, ArrayViewD};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::{
    batch_norm::BatchNorm1d,
    identity::Identity,
    linear::Linear,
    module::{with_prefix, Module},
};
use crate::error::{GnnError, Result};

/// the normalization stage after each linear layer
#[derive(Debug, Clone, EnumAsInner)]
pub enum Norm {
    Batch(BatchNorm1d),
    Identity(Identity),
}

impl Norm {
    fn forward(&mut self, x: Array2<f32>) -> Result<Array2<f32>> {
        match self {
            Norm::Batch(norm) => norm.forward(x),
            Norm::Identity(identity) => Ok(identity.forward(x)),
        }
    }

    fn as_module_mut(&mut self) -> &mut dyn Module {
        match self {
            Norm::Batch(norm) => norm,
            Norm::Identity(identity) => identity,
        }
    }

    fn as_module(&self) -> &dyn Module {
        match self {
            Norm::Batch(norm) => norm,
            Norm::Identity(identity) => identity,
        }
    }
}

/// # Description
/// the configuration of a [`Mlp`]
/// - `nlayer` linear layers, the hidden width is `nin`
/// - `with_norm` puts a batch norm after each linear layer, otherwise an identity
/// - `with_final_activation` applies norm and relu after the last layer too
/// - `bias` only matters for the last layer, see [`Mlp::new`]
/// - `residual` adds the input to the output when `nin == nout`; off by default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpConfig {
    pub nin: usize,
    pub nout: usize,
    pub nlayer: usize,
    pub with_final_activation: bool,
    pub with_norm: bool,
    pub bias: bool,
    pub residual: bool,
}

impl MlpConfig {
    pub fn new(nin: usize, nout: usize) -> Self {
        MlpConfig {
            nin,
            nout,
            nlayer: 2,
            with_final_activation: true,
            with_norm: true,
            bias: true,
            residual: false,
        }
    }

    pub fn nlayer(mut self, nlayer: usize) -> Self {
        self.nlayer = nlayer;
        self
    }

    pub fn with_final_activation(mut self, with_final_activation: bool) -> Self {
        self.with_final_activation = with_final_activation;
        self
    }

    pub fn with_norm(mut self, with_norm: bool) -> Self {
        self.with_norm = with_norm;
        self
    }

    pub fn bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    pub fn residual(mut self, residual: bool) -> Self {
        self.residual = residual;
        self
    }
}

/// # Description
/// a stack of linear layers, each followed by a normalization and a relu
/// - the last layer gets the normalization and relu only with `with_final_activation`
#[derive(Debug, Clone)]
pub struct Mlp {
    layers: Vec<Linear>,
    norms: Vec<Norm>,
    config: MlpConfig,
}

impl Mlp {
    /// # Description
    /// build the layers of the mlp
    /// - only the last layer can have a bias, and only when
    ///   (no final activation and `bias`) or normalization is disabled
    /// - with normalization on, the shift of the batch norm replaces the bias
    ///
    /// # Example
    /// ```
    /// use gnn_agg::layers::{Mlp, MlpConfig};
    /// use rand::{rngs::StdRng, SeedableRng};
    /// let mut rng = StdRng::seed_from_u64(0);
    /// let mlp = Mlp::new(MlpConfig::new(16, 4).nlayer(3), &mut rng).unwrap();
    /// assert_eq!(mlp.nlayer(), 3);
    /// ```
    pub fn new(config: MlpConfig, rng: &mut StdRng) -> Result<Self> {
        if config.nlayer == 0 {
            return Err(GnnError::InvalidConfig(
                "mlp needs at least one layer".to_string(),
            ));
        }
        let n_hid = config.nin;
        let last = config.nlayer - 1;
        let layers = (0..config.nlayer)
            .map(|i| {
                let nin = if i == 0 { config.nin } else { n_hid };
                let nout = if i < last { n_hid } else { config.nout };
                let bias = (i == last && !config.with_final_activation && config.bias)
                    || !config.with_norm;
                Linear::new(nin, nout, bias, rng)
            })
            .collect();
        let norms = (0..config.nlayer)
            .map(|i| {
                let width = if i < last { n_hid } else { config.nout };
                if config.with_norm {
                    Norm::Batch(BatchNorm1d::new(width))
                } else {
                    Norm::Identity(Identity::new())
                }
            })
            .collect();
        Ok(Mlp {
            layers,
            norms,
            config,
        })
    }

    pub fn config(&self) -> &MlpConfig {
        &self.config
    }

    pub fn nlayer(&self) -> usize {
        self.layers.len()
    }

    pub fn layers(&self) -> &[Linear] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [Linear] {
        &mut self.layers
    }

    pub fn norms(&self) -> &[Norm] {
        &self.norms
    }

    /// `x` is `n x nin`, the result is `n x nout`
    pub fn forward(&mut self, x: Array2<f32>) -> Result<Array2<f32>> {
        let nlayer = self.layers.len();
        let residual = self.config.residual && self.config.nin == self.config.nout;
        let previous_x = if residual { Some(x.clone()) } else { None };

        let mut x = x;
        for (i, (layer, norm)) in self
            .layers
            .iter()
            .zip_eq(self.norms.iter_mut())
            .enumerate()
        {
            x = layer.forward(&x)?;
            if i < nlayer - 1 || self.config.with_final_activation {
                x = norm.forward(x)?;
                x.mapv_inplace(|v| v.max(0.0));
            }
        }

        if let Some(previous_x) = previous_x {
            x += &previous_x;
        }
        debug!("mlp output: {:?}", x.dim());
        Ok(x)
    }
}

impl Module for Mlp {
    fn reset_parameters(&mut self, rng: &mut StdRng) {
        for (layer, norm) in self.layers.iter_mut().zip_eq(self.norms.iter_mut()) {
            layer.reset_parameters(rng);
            norm.as_module_mut().reset_parameters(rng);
        }
    }

    fn named_parameters(&self) -> Vec<(String, ArrayViewD<'_, f32>)> {
        let layers = self.layers.iter().enumerate().flat_map(|(i, layer)| {
            with_prefix(&format!("layers.{}", i), layer.named_parameters())
        });
        let norms = self.norms.iter().enumerate().flat_map(|(i, norm)| {
            with_prefix(&format!("norms.{}", i), norm.as_module().named_parameters())
        });
        layers.chain(norms).collect()
    }

    fn train(&mut self, training: bool) {
        for norm in self.norms.iter_mut() {
            norm.as_module_mut().train(training);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(3)
    }

    #[test]
    fn test_bias_policy() {
        let mlp = Mlp::new(MlpConfig::new(4, 2).nlayer(3), &mut rng()).unwrap();
        assert!(mlp.layers().iter().all(|l| !l.has_bias()));

        let config = MlpConfig::new(4, 2).nlayer(3).with_final_activation(false);
        let mlp = Mlp::new(config.clone(), &mut rng()).unwrap();
        let biases = mlp.layers().iter().map(|l| l.has_bias()).collect_vec();
        assert_eq!(biases, vec![false, false, true]);

        let mlp = Mlp::new(config.bias(false), &mut rng()).unwrap();
        assert!(mlp.layers().iter().all(|l| !l.has_bias()));

        let config = MlpConfig::new(4, 2).nlayer(3).with_norm(false).bias(false);
        let mlp = Mlp::new(config, &mut rng()).unwrap();
        assert!(mlp.layers().iter().all(|l| l.has_bias()));
        assert!(mlp.norms().iter().all(|n| n.as_identity().is_some()));
    }

    #[test]
    fn test_widths() {
        let mut mlp = Mlp::new(MlpConfig::new(5, 3).nlayer(2), &mut rng()).unwrap();
        assert_eq!(mlp.layers()[0].out_features(), 5);
        assert_eq!(mlp.layers()[1].out_features(), 3);
        assert_eq!(mlp.norms()[1].as_batch().unwrap().num_features(), 3);
        let out = mlp.forward(Array2::ones((7, 5))).unwrap();
        assert_eq!(out.dim(), (7, 3));
        assert!(out.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_single_affine_layer_is_monotonic() {
        let config = MlpConfig::new(3, 3)
            .nlayer(1)
            .with_final_activation(false)
            .with_norm(false);
        let mut mlp = Mlp::new(config, &mut rng()).unwrap();
        let x = Array2::ones((2, 3));
        let y1 = mlp.forward(x.clone()).unwrap();
        let y2 = mlp.forward(&x * 2.0).unwrap();
        let y3 = mlp.forward(&x * 3.0).unwrap();
        // affine: the response to a scaled input changes linearly
        let d1 = &y2 - &y1;
        let d2 = &y3 - &y2;
        assert!(d1.iter().zip(d2.iter()).all(|(a, b)| (a - b).abs() < 1e-5));
        let weight_sums = mlp.layers()[0].weight().sum_axis(ndarray::Axis(1));
        for (j, w) in weight_sums.iter().enumerate() {
            if w.abs() > 1e-6 {
                assert_eq!(y2[[0, j]] > y1[[0, j]], *w > 0.0);
            }
        }
    }

    #[test]
    fn test_residual_is_opt_in() {
        let config = MlpConfig::new(2, 2).nlayer(1).with_norm(false);
        let mut plain = Mlp::new(config.clone(), &mut rng()).unwrap();
        let mut residual = Mlp::new(config.residual(true), &mut rng()).unwrap();
        let x = array![[1.0, 2.0], [-1.0, 0.5]];
        let diff = residual.forward(x.clone()).unwrap() - plain.forward(x.clone()).unwrap();
        assert!(diff.iter().zip(x.iter()).all(|(d, v)| (d - v).abs() < 1e-6));
    }

    #[test]
    fn test_zero_layers_rejected() {
        assert!(matches!(
            Mlp::new(MlpConfig::new(2, 2).nlayer(0), &mut rng()),
            Err(GnnError::InvalidConfig(_))
        ));
    }
}
