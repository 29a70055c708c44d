use crate::settings::Settings;
use ndarray::Array2;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct GnnAggResult {
    pub settings: Option<Settings>,
    pub stats: Option<GnnStatistics>,
}

impl GnnAggResult {
    pub fn new() -> Self {
        GnnAggResult {
            settings: None,
            stats: None,
        }
    }
}

impl Default for GnnAggResult {
    fn default() -> Self {
        Self::new()
    }
}

/// the summary of one forward run
#[derive(Debug, Default, Serialize)]
pub struct GnnStatistics {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub output_shape: (usize, usize),
    pub num_parameters: usize,
    pub output_mean: f32,
    pub output_abs_max: f32,
    pub simulation_time: String,
}

impl GnnStatistics {
    pub fn new() -> Self {
        GnnStatistics::default()
    }

    /// record the shape and the magnitude of the output embeddings
    pub fn record_output(&mut self, output: &Array2<f32>) {
        self.output_shape = output.dim();
        self.output_mean = output.mean().unwrap_or(0.0);
        self.output_abs_max = output.iter().fold(0.0, |acc: f32, v| acc.max(v.abs()));
    }
}
