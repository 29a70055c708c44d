use ndarray::{Array2, ArrayViewD, Axis};
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};

use super::module::Module;
use crate::error::{GnnError, Result};

/// # Description
/// a learned lookup table: `num_embeddings x embedding_dim`, one row per code
/// - lookups are bounds checked, a code outside the table is an error
#[derive(Debug, Clone)]
pub struct Embedding {
    weight: Array2<f32>,
}

impl Embedding {
    pub fn new(num_embeddings: usize, embedding_dim: usize, rng: &mut StdRng) -> Self {
        let mut embedding = Embedding {
            weight: Array2::zeros((num_embeddings, embedding_dim)),
        };
        embedding.reset_parameters(rng);
        embedding
    }

    pub fn num_embeddings(&self) -> usize {
        self.weight.nrows()
    }

    pub fn embedding_dim(&self) -> usize {
        self.weight.ncols()
    }

    pub fn weight_mut(&mut self) -> &mut Array2<f32> {
        &mut self.weight
    }

    /// # Description
    /// gather one row per code
    /// # Return
    /// `codes.len() x embedding_dim`
    pub fn forward(&self, codes: &[usize]) -> Result<Array2<f32>> {
        if let Some(&bad) = codes.iter().find(|&&c| c >= self.num_embeddings()) {
            return Err(GnnError::IndexOutOfRange {
                what: "embedding",
                index: bad,
                bound: self.num_embeddings(),
            });
        }
        let mut out = Array2::zeros((codes.len(), self.embedding_dim()));
        for (mut row, &code) in out.axis_iter_mut(Axis(0)).zip(codes) {
            row.assign(&self.weight.row(code));
        }
        Ok(out)
    }
}

impl Module for Embedding {
    /// rows are drawn from N(0, 1)
    fn reset_parameters(&mut self, rng: &mut StdRng) {
        self.weight
            .mapv_inplace(|_| StandardNormal.sample(&mut *rng));
    }

    fn named_parameters(&self) -> Vec<(String, ArrayViewD<'_, f32>)> {
        vec![("weight".to_string(), self.weight.view().into_dyn())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_embedding_lookup() {
        let mut rng = StdRng::seed_from_u64(1);
        let embedding = Embedding::new(5, 3, &mut rng);
        let out = embedding.forward(&[4, 0, 4]).unwrap();
        assert_eq!(out.dim(), (3, 3));
        assert_eq!(out.row(0), out.row(2));
        assert_eq!(out.row(1), embedding.weight.row(0));
    }

    #[test]
    fn test_embedding_out_of_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let embedding = Embedding::new(5, 3, &mut rng);
        let result = embedding.forward(&[1, 5]);
        assert!(matches!(
            result,
            Err(GnnError::IndexOutOfRange {
                index: 5,
                bound: 5,
                ..
            })
        ));
    }

    #[test]
    fn test_embedding_empty_lookup() {
        let mut rng = StdRng::seed_from_u64(1);
        let embedding = Embedding::new(5, 3, &mut rng);
        assert_eq!(embedding.forward(&[]).unwrap().dim(), (0, 3));
    }
}
