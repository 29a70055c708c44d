use ndarray::{Array2, ArrayView, ArrayViewD, Axis, Dimension, Ix1, Ix2};
use rand::rngs::StdRng;

use super::{
    embedding::Embedding,
    module::{with_prefix, Module},
};
use crate::error::{GnnError, Result};

/// # Description
/// encode categorical features into one hidden vector per entity
/// - there is one embedding table per feature column
/// - the embeddings of all the columns are summed
#[derive(Debug, Clone)]
pub struct DiscreteEncoder {
    embeddings: Vec<Embedding>,
    hidden_channels: usize,
}

impl DiscreteEncoder {
    /// # Arguments
    /// * `hidden_channels` - the width of the output
    /// * `max_num_features` - the number of columns the encoder accepts
    /// * `max_num_values` - the number of codes each column accepts
    pub fn new(
        hidden_channels: usize,
        max_num_features: usize,
        max_num_values: usize,
        rng: &mut StdRng,
    ) -> Self {
        let embeddings = (0..max_num_features)
            .map(|_| Embedding::new(max_num_values, hidden_channels, rng))
            .collect();
        DiscreteEncoder {
            embeddings,
            hidden_channels,
        }
    }

    pub fn max_num_features(&self) -> usize {
        self.embeddings.len()
    }

    pub fn hidden_channels(&self) -> usize {
        self.hidden_channels
    }

    /// # Description
    /// - `x` is either `n` codes (a single column) or `n x columns`
    /// - fails when there are more columns than tables, or a code is out of its table
    ///
    /// # Example
    /// ```
    /// use gnn_agg::layers::DiscreteEncoder;
    /// use ndarray::array;
    /// use rand::{rngs::StdRng, SeedableRng};
    /// let mut rng = StdRng::seed_from_u64(0);
    /// let encoder = DiscreteEncoder::new(4, 2, 10, &mut rng);
    /// let out = encoder.forward(array![[1, 2], [3, 4], [5, 6]].view()).unwrap();
    /// assert_eq!(out.dim(), (3, 4));
    /// ```
    pub fn forward<D: Dimension>(&self, x: ArrayView<'_, usize, D>) -> Result<Array2<f32>> {
        let x = x.into_dyn();
        let x = match x.ndim() {
            1 => x.into_dimensionality::<Ix1>()?.insert_axis(Axis(1)),
            _ => x.into_dimensionality::<Ix2>()?,
        };

        if x.ncols() > self.max_num_features() {
            return Err(GnnError::IndexOutOfRange {
                what: "feature column",
                index: x.ncols() - 1,
                bound: self.max_num_features(),
            });
        }

        let mut out = Array2::zeros((x.nrows(), self.hidden_channels));
        for (column, embedding) in x.axis_iter(Axis(1)).zip(&self.embeddings) {
            let codes: Vec<usize> = column.iter().copied().collect();
            out += &embedding.forward(&codes)?;
        }
        Ok(out)
    }
}

impl Module for DiscreteEncoder {
    fn reset_parameters(&mut self, rng: &mut StdRng) {
        for embedding in self.embeddings.iter_mut() {
            embedding.reset_parameters(rng);
        }
    }

    fn named_parameters(&self) -> Vec<(String, ArrayViewD<'_, f32>)> {
        self.embeddings
            .iter()
            .enumerate()
            .flat_map(|(i, embedding)| {
                with_prefix(&format!("embeddings.{}", i), embedding.named_parameters())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};
    use rand::SeedableRng;

    fn encoder() -> DiscreteEncoder {
        let mut rng = StdRng::seed_from_u64(42);
        DiscreteEncoder::new(8, 3, 5, &mut rng)
    }

    #[test]
    fn test_single_column_matches_matrix() {
        let encoder = encoder();
        let codes = array![0, 4, 2, 2];
        let from_vector = encoder.forward(codes.view()).unwrap();
        let from_matrix = encoder
            .forward(codes.view().insert_axis(Axis(1)))
            .unwrap();
        assert_eq!(from_vector, from_matrix);
        assert_eq!(from_vector.dim(), (4, 8));
        assert_eq!(from_vector.row(2), from_vector.row(3));
    }

    #[test]
    fn test_columns_are_summed() {
        let encoder = encoder();
        let out = encoder.forward(array![[1, 3]].view()).unwrap();
        let first = encoder.embeddings[0].forward(&[1]).unwrap();
        let second = encoder.embeddings[1].forward(&[3]).unwrap();
        let expected = first + second;
        assert!(out
            .iter()
            .zip(expected.iter())
            .all(|(a, b)| (a - b).abs() < 1e-6));
    }

    #[test]
    fn test_too_many_columns() {
        let encoder = encoder();
        let x = Array2::<usize>::zeros((2, 4));
        assert!(matches!(
            encoder.forward(x.view()),
            Err(GnnError::IndexOutOfRange {
                what: "feature column",
                ..
            })
        ));
    }

    #[test]
    fn test_code_out_of_range() {
        let encoder = encoder();
        let x = Array1::from(vec![1, 5]);
        assert!(matches!(
            encoder.forward(x.view()),
            Err(GnnError::IndexOutOfRange { index: 5, .. })
        ));
    }
}
