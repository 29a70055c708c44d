use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::string::String;

use crate::layers::MlpConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub graph_path: String,
    pub features_path: String,
    pub output_dir: String,
    pub seed: u64,
    pub model_settings: ModelSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    pub hidden_size: usize,
    pub num_layers: usize,
    /// the statistic names of the aggregators, e.g. ["mean", "min", "max", "std"]
    pub aggregators: Vec<String>,
    /// batch norm inside every mlp, on by default
    pub with_norm: bool,
    pub max_num_features: usize,
    pub max_num_values: usize,
    pub use_virtual_node: bool,
    /// add the input back to the output of same-width mlps
    pub mlp_residual: bool,
}

impl ModelSettings {
    /// the mlp shape every `dim -> dim` block of the model uses
    pub fn mlp_config(&self, nin: usize, nout: usize) -> MlpConfig {
        MlpConfig::new(nin, nout)
            .with_norm(self.with_norm)
            .residual(self.mlp_residual)
    }
}

impl Settings {
    /// # Description
    /// merge the config files in order, the later ones override the former ones
    pub fn new(config_path: Vec<String>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        for i in config_path {
            builder = builder.add_source(File::with_name(&i));
        }
        builder.build()?.try_deserialize()
    }
}
