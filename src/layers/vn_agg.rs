use log::{debug, warn};
use ndarray::{Array2, ArrayViewD};
use rand::rngs::StdRng;

use super::{
    mlp::{Mlp, MlpConfig},
    module::{with_prefix, Module},
    scatter::global_add_pool,
};
use crate::error::{GnnError, Result};

/// # Description
/// the virtual node update: one global vector per graph in the batch
/// - the entity embeddings of each graph are summed into its virtual node
/// - the sum goes through a `dim -> dim` mlp
#[derive(Debug, Clone)]
pub struct VnAgg {
    mlp: Mlp,
}

impl VnAgg {
    pub fn new(dim: usize, with_norm: bool, rng: &mut StdRng) -> Result<Self> {
        Self::with_mlp_config(MlpConfig::new(dim, dim).with_norm(with_norm), rng)
    }

    /// the mlp has to keep the width, `nin == nout`
    pub fn with_mlp_config(config: MlpConfig, rng: &mut StdRng) -> Result<Self> {
        if config.nin != config.nout {
            return Err(GnnError::InvalidConfig(format!(
                "virtual node mlp must keep the width, got {} -> {}",
                config.nin, config.nout
            )));
        }
        let mlp = Mlp::new(config, rng)?;
        Ok(VnAgg { mlp })
    }

    pub fn mlp(&self) -> &Mlp {
        &self.mlp
    }

    /// # Arguments
    /// * `virtual_node` - `num_graphs x dim`
    /// * `embeddings` - `num_entities x dim`
    /// * `batch_vector` - the graph id of each entity
    /// # Return
    /// the new virtual node, always `num_graphs x dim`, even when there is no entity
    pub fn forward(
        &mut self,
        virtual_node: &Array2<f32>,
        embeddings: &Array2<f32>,
        batch_vector: &[usize],
    ) -> Result<Array2<f32>> {
        if embeddings.ncols() != virtual_node.ncols() {
            return Err(GnnError::ShapeMismatch {
                what: "virtual node width",
                expected: virtual_node.ncols(),
                got: embeddings.ncols(),
            });
        }
        let pooled = if !batch_vector.is_empty() {
            global_add_pool(embeddings, batch_vector, Some(virtual_node.nrows()))?
        } else {
            warn!("empty batch for the virtual node, nothing to pool");
            Array2::zeros(virtual_node.raw_dim())
        };
        debug!(
            "virtual node {:?} pooled from {} entities",
            virtual_node.dim(),
            batch_vector.len()
        );
        self.mlp.forward(virtual_node + &pooled)
    }
}

impl Module for VnAgg {
    fn reset_parameters(&mut self, rng: &mut StdRng) {
        self.mlp.reset_parameters(rng);
    }

    fn named_parameters(&self) -> Vec<(String, ArrayViewD<'_, f32>)> {
        with_prefix("mlp", self.mlp.named_parameters())
    }

    fn train(&mut self, training: bool) {
        self.mlp.train(training);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, s};
    use rand::SeedableRng;

    fn vn_agg() -> VnAgg {
        let mut rng = StdRng::seed_from_u64(11);
        let mut vn_agg = VnAgg::new(2, true, &mut rng).unwrap();
        vn_agg.train(false);
        vn_agg
    }

    #[test]
    fn test_empty_batch_is_zero_pooling() {
        let virtual_node = array![[0.5, -1.0], [2.0, 0.0], [1.0, 1.0]];
        let empty = Array2::<f32>::zeros((0, 2));
        let out = vn_agg().forward(&virtual_node, &empty, &[]).unwrap();
        assert_eq!(out.dim(), (3, 2));

        let zeros = Array2::<f32>::zeros((3, 2));
        let expected = vn_agg().forward(&virtual_node, &zeros, &[0, 1, 2]).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_pooling_per_graph() {
        let virtual_node = Array2::<f32>::zeros((2, 2));
        let embeddings = array![[1.0, 0.0], [2.0, 1.0], [0.0, 3.0]];
        let out = vn_agg()
            .forward(&virtual_node, &embeddings, &[1, 1, 0])
            .unwrap();
        let pooled = array![[0.0, 3.0], [3.0, 1.0]];
        let expected = vn_agg().mlp.forward(pooled).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_graph_without_entities_keeps_its_row() {
        let virtual_node = Array2::<f32>::ones((4, 2));
        let embeddings = array![[1.0, 1.0]];
        let out = vn_agg().forward(&virtual_node, &embeddings, &[0]).unwrap();
        assert_eq!(out.dim(), (4, 2));
        assert!(out.iter().all(|v| v.is_finite()));

        // graphs 1..4 pool nothing, their rows only go through the mlp
        let unchanged = vn_agg()
            .mlp
            .forward(virtual_node.slice(s![1..4, ..]).to_owned())
            .unwrap();
        for (got, want) in out.slice(s![1..4, ..]).iter().zip(unchanged.iter()) {
            assert!((got - want).abs() < 1e-6);
        }
        let updated = vn_agg().mlp.forward(array![[2.0, 2.0]]).unwrap();
        for (got, want) in out.row(0).iter().zip(updated.iter()) {
            assert!((got - want).abs() < 1e-6);
        }
    }
}
