use ndarray::{Array2, ArrayViewD};
use rand::rngs::StdRng;

use super::module::Module;

/// a no-op layer, used in place of the normalization when it is disabled
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Identity;

impl Identity {
    pub fn new() -> Self {
        Identity
    }

    pub fn forward(&self, x: Array2<f32>) -> Array2<f32> {
        x
    }
}

impl Module for Identity {
    fn reset_parameters(&mut self, _rng: &mut StdRng) {}

    fn named_parameters(&self) -> Vec<(String, ArrayViewD<'_, f32>)> {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_identity() {
        let identity = Identity::new();
        let x = array![[1.0, -2.0], [3.5, 0.0]];
        assert_eq!(identity.forward(x.clone()), x);
        assert_eq!(identity.num_parameters(), 0);
    }
}
