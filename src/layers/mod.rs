//! # Description
//! - this module holds the neural network building blocks
//! - the main sub module is aggregator, the multi-statistic aggregator
//! - read aggregator.rs for more details
//!
//! # Components
//! - aggregator: scatter statistics plus a degree embedding, projected by an mlp
//! - vn_agg: the virtual node update
//! - mlp: linear layers with optional batch norm and relu
//! - discrete_encoder: sums one embedding per categorical feature column
//! - identity, linear, batch_norm, embedding: the primitive layers
//! - scatter: the segmented reductions used by the aggregators
//! - module: the `Module` trait shared by all of them
//!

pub mod aggregator;
pub mod batch_norm;
pub mod discrete_encoder;
pub mod embedding;
pub mod identity;
pub mod linear;
pub mod mlp;
pub mod module;
pub mod scatter;
pub mod vn_agg;

pub use aggregator::{Aggregator, Statistic, DEGREE_EMBEDDING_CAPACITY};
pub use batch_norm::BatchNorm1d;
pub use discrete_encoder::DiscreteEncoder;
pub use embedding::Embedding;
pub use identity::Identity;
pub use linear::Linear;
pub use mlp::{Mlp, MlpConfig, Norm};
pub use module::Module;
pub use vn_agg::VnAgg;
