//! # Description
//! the multi-statistic neighborhood aggregator
//! - every requested statistic is a segmented reduction over the grouping index
//! - a learned embedding of the group degree is appended
//! - the concatenation goes through a single-layer mlp
//!
//! # Empty groups
//! a group that receives no entity gets 0 for sum, mean, min, max and var,
//! and `sqrt(1e-5)` for std, so every output row is finite

use std::{collections::HashMap, fmt, str::FromStr};

use lazy_static::lazy_static;
use log::debug;
use ndarray::{concatenate, Array2, ArrayViewD, Axis};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::{
    embedding::Embedding,
    mlp::{Mlp, MlpConfig},
    module::{with_prefix, Module},
    scatter::{degree, infer_dim_size, scatter, Reduce},
};
use crate::error::{GnnError, Result};

/// the number of distinct degrees the degree embedding can hold
pub const DEGREE_EMBEDDING_CAPACITY: usize = 100;

/// keeps the square root of the variance away from 0
pub const STD_EPS: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    Sum,
    Mean,
    Min,
    Max,
    Var,
    Std,
}

lazy_static! {
    static ref STATISTIC_NAMES: HashMap<&'static str, Statistic> = {
        let mut names = HashMap::new();
        names.insert("sum", Statistic::Sum);
        names.insert("mean", Statistic::Mean);
        names.insert("min", Statistic::Min);
        names.insert("max", Statistic::Max);
        names.insert("var", Statistic::Var);
        names.insert("std", Statistic::Std);
        names
    };
}

impl Statistic {
    /// mean, min, max and std
    pub fn defaults() -> Vec<Statistic> {
        vec![
            Statistic::Mean,
            Statistic::Min,
            Statistic::Max,
            Statistic::Std,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Statistic::Sum => "sum",
            Statistic::Mean => "mean",
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::Var => "var",
            Statistic::Std => "std",
        }
    }

    /// parse every name, the first unknown one fails the whole list
    pub fn parse_all<S: AsRef<str>>(names: &[S]) -> Result<Vec<Statistic>> {
        names.iter().map(|name| name.as_ref().parse()).collect()
    }
}

impl FromStr for Statistic {
    type Err = GnnError;

    fn from_str(s: &str) -> Result<Self> {
        STATISTIC_NAMES
            .get(s)
            .copied()
            .ok_or_else(|| GnnError::UnsupportedAggregator(s.to_string()))
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// # Description
/// the one-pass biased variance: E[x^2] - E[x]^2 per group
pub fn scatter_var(inputs: &Array2<f32>, index: &[usize], dim_size: usize) -> Result<Array2<f32>> {
    let mean = scatter(inputs, index, Some(dim_size), Reduce::Mean)?;
    let squares = inputs.mapv(|v| v * v);
    let mean_squares = scatter(&squares, index, Some(dim_size), Reduce::Mean)?;
    Ok(mean_squares - &mean * &mean)
}

/// # Description
/// `sqrt(relu(var) + 1e-5)`: the relu drops the small negative values left by
/// the cancellation in [`scatter_var`], the epsilon keeps the root positive
pub fn scatter_std(inputs: &Array2<f32>, index: &[usize], dim_size: usize) -> Result<Array2<f32>> {
    let var = scatter_var(inputs, index, dim_size)?;
    Ok(var.mapv(|v| (v.max(0.0) + STD_EPS).sqrt()))
}

/// # Description
/// the multi-statistic aggregator
/// - input: `num_entities x nin` values and a group id per entity
/// - output: `dim_size x nout`
/// - the statistics are fixed when building the aggregator, so the forward pass
///   cannot meet an unknown statistic
#[derive(Debug, Clone)]
pub struct Aggregator {
    aggregators: Vec<Statistic>,
    deg_embedder: Embedding,
    output_encoder: Mlp,
    nin: usize,
}

impl Aggregator {
    /// # Arguments
    /// * `nin` - the width of the inputs
    /// * `nout` - the width of the output
    /// * `aggregators` - the statistics, in the order they are concatenated
    /// * `with_norm` - whether the output mlp normalizes its result
    pub fn new(
        nin: usize,
        nout: usize,
        aggregators: Vec<Statistic>,
        with_norm: bool,
        rng: &mut StdRng,
    ) -> Result<Self> {
        let deg_embedder = Embedding::new(DEGREE_EMBEDDING_CAPACITY, nin, rng);
        let width = (aggregators.len() + 1) * nin;
        let output_encoder = Mlp::new(
            MlpConfig::new(width, nout)
                .nlayer(1)
                .with_final_activation(true)
                .with_norm(with_norm),
            rng,
        )?;
        Ok(Aggregator {
            aggregators,
            deg_embedder,
            output_encoder,
            nin,
        })
    }

    /// # Description
    /// same as [`Aggregator::new`], with the statistics given by name
    /// # Example
    /// ```
    /// use gnn_agg::{layers::Aggregator, GnnError};
    /// use rand::{rngs::StdRng, SeedableRng};
    /// let mut rng = StdRng::seed_from_u64(0);
    /// let result = Aggregator::from_names(4, 4, &["mean", "median"], true, &mut rng);
    /// assert!(matches!(result, Err(GnnError::UnsupportedAggregator(name)) if name == "median"));
    /// ```
    pub fn from_names<S: AsRef<str>>(
        nin: usize,
        nout: usize,
        names: &[S],
        with_norm: bool,
        rng: &mut StdRng,
    ) -> Result<Self> {
        let aggregators = Statistic::parse_all(names)?;
        Self::new(nin, nout, aggregators, with_norm, rng)
    }

    pub fn aggregators(&self) -> &[Statistic] {
        &self.aggregators
    }

    pub fn output_encoder(&self) -> &Mlp {
        &self.output_encoder
    }

    /// the concatenated statistics and degree embedding, before the output mlp
    /// # Return
    /// `dim_size x (aggregators + 1) * nin`
    pub fn statistics(
        &self,
        inputs: &Array2<f32>,
        index: &[usize],
        dim_size: Option<usize>,
    ) -> Result<Array2<f32>> {
        if inputs.ncols() != self.nin {
            return Err(GnnError::ShapeMismatch {
                what: "aggregator input width",
                expected: self.nin,
                got: inputs.ncols(),
            });
        }
        if index.len() != inputs.nrows() {
            return Err(GnnError::ShapeMismatch {
                what: "aggregator index length",
                expected: inputs.nrows(),
                got: index.len(),
            });
        }
        let dim_size = infer_dim_size(index, dim_size);

        let mut outs = Vec::with_capacity(self.aggregators.len() + 1);
        for aggregator in &self.aggregators {
            let out = match aggregator {
                Statistic::Sum => scatter(inputs, index, Some(dim_size), Reduce::Sum)?,
                Statistic::Mean => scatter(inputs, index, Some(dim_size), Reduce::Mean)?,
                Statistic::Min => scatter(inputs, index, Some(dim_size), Reduce::Min)?,
                Statistic::Max => scatter(inputs, index, Some(dim_size), Reduce::Max)?,
                Statistic::Var => scatter_var(inputs, index, dim_size)?,
                Statistic::Std => scatter_std(inputs, index, dim_size)?,
            };
            outs.push(out);
        }

        // a degree past the table is an error, not clamped
        let degrees = degree(index, Some(dim_size))?;
        outs.push(self.deg_embedder.forward(&degrees)?);

        let views: Vec<_> = outs.iter().map(|out| out.view()).collect();
        Ok(concatenate(Axis(1), &views)?)
    }

    /// # Arguments
    /// * `inputs` - `num_entities x nin`
    /// * `index` - the group of each entity, in `[0, dim_size)`
    /// * `dim_size` - the number of groups; when `None` it is max index + 1, so pass it
    ///   whenever trailing groups may be empty
    /// # Return
    /// `dim_size x nout`
    pub fn forward(
        &mut self,
        inputs: &Array2<f32>,
        index: &[usize],
        dim_size: Option<usize>,
    ) -> Result<Array2<f32>> {
        let out = self.statistics(inputs, index, dim_size)?;
        debug!(
            "aggregated {} entities into {:?} with [{}]",
            index.len(),
            out.dim(),
            itertools::join(&self.aggregators, ", ")
        );
        self.output_encoder.forward(out)
    }
}

impl Module for Aggregator {
    fn reset_parameters(&mut self, rng: &mut StdRng) {
        self.deg_embedder.reset_parameters(rng);
        self.output_encoder.reset_parameters(rng);
    }

    fn named_parameters(&self) -> Vec<(String, ArrayViewD<'_, f32>)> {
        let mut params = with_prefix("deg_embedder", self.deg_embedder.named_parameters());
        params.extend(with_prefix(
            "output_encoder",
            self.output_encoder.named_parameters(),
        ));
        params
    }

    fn train(&mut self, training: bool) {
        self.output_encoder.train(training);
    }
}
