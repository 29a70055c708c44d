//! the crate gnn_agg provides the building blocks of a graph neural network layer.
//! there are 4 parts in the crate:
//!
//! - layers: the aggregator, the virtual node update, the mlp and the encoders.
//! - graph and node_features: read a graph and its categorical node features.
//! - model: stack the layers for one forward pass over a graph.
//! - settings and gnn_result: the configuration and the run report.
//!
//!

pub mod cmd_args;
pub mod error;
pub mod gnn_result;
pub mod graph;
pub mod layers;
pub mod model;
pub mod node_features;
pub mod settings;

pub use error::{GnnError, Result};
pub use gnn_result::{GnnAggResult, GnnStatistics};
pub use graph::Graph;
pub use model::GnnModel;
pub use node_features::NodeFeatures;
