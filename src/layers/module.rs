use ndarray::ArrayViewD;
use rand::rngs::StdRng;

/// # Description
/// the common lifecycle of every layer
/// - `reset_parameters` reinitializes all the owned trainable parameters, recursively
/// - `named_parameters` lists them with a dotted path, so an external optimizer
///   or a test can walk through all of them
/// - `train` switches between training and evaluation mode (only batch norm cares)
pub trait Module {
    fn reset_parameters(&mut self, rng: &mut StdRng);

    fn named_parameters(&self) -> Vec<(String, ArrayViewD<'_, f32>)>;

    fn train(&mut self, _training: bool) {}

    fn num_parameters(&self) -> usize {
        self.named_parameters()
            .iter()
            .map(|(_, param)| param.len())
            .sum()
    }
}

/// prefix the parameter names of a child module
pub(crate) fn with_prefix<'a>(
    prefix: &str,
    params: Vec<(String, ArrayViewD<'a, f32>)>,
) -> Vec<(String, ArrayViewD<'a, f32>)> {
    params
        .into_iter()
        .map(|(name, param)| (format!("{}.{}", prefix, name), param))
        .collect()
}
