//! # Description
//! a stack of message passing layers built from the settings
//! - the categorical node features are encoded by a [`DiscreteEncoder`]
//! - every layer sends the source row along each edge and aggregates the messages
//!   on the target node with a multi-statistic [`Aggregator`]
//! - with the virtual node on, the graph vector is added to every node before a
//!   layer and updated by a [`VnAgg`] after it
//!

use log::{debug, info};
use ndarray::{Array2, ArrayViewD};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    error::{GnnError, Result},
    graph::Graph,
    layers::{
        module::with_prefix,
        scatter::gather,
        Aggregator, DiscreteEncoder, Module, Statistic, VnAgg,
    },
    node_features::NodeFeatures,
    settings::ModelSettings,
};

#[derive(Debug, Clone)]
pub struct GnnModel {
    encoder: DiscreteEncoder,
    convs: Vec<Aggregator>,
    virtual_nodes: Option<Vec<VnAgg>>,
    hidden_size: usize,
    training: bool,
}

impl GnnModel {
    pub fn new(settings: &ModelSettings, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::with_rng(settings, &mut rng)
    }

    /// # Description
    /// build all the layers; the statistic names are checked here, once
    pub fn with_rng(settings: &ModelSettings, rng: &mut StdRng) -> Result<Self> {
        let hidden = settings.hidden_size;
        if hidden == 0 {
            return Err(GnnError::InvalidConfig(
                "hidden_size must be positive".to_string(),
            ));
        }
        let statistics = Statistic::parse_all(settings.aggregators.as_slice())?;

        let encoder = DiscreteEncoder::new(
            hidden,
            settings.max_num_features,
            settings.max_num_values,
            rng,
        );
        let convs = (0..settings.num_layers)
            .map(|_| Aggregator::new(hidden, hidden, statistics.clone(), settings.with_norm, rng))
            .collect::<Result<Vec<_>>>()?;
        let virtual_nodes = if settings.use_virtual_node {
            Some(
                (0..settings.num_layers)
                    .map(|_| VnAgg::with_mlp_config(settings.mlp_config(hidden, hidden), rng))
                    .collect::<Result<Vec<_>>>()?,
            )
        } else {
            None
        };
        info!(
            "built a model with {} layers of [{}], virtual node: {}",
            settings.num_layers,
            settings.aggregators.join(", "),
            settings.use_virtual_node
        );
        Ok(GnnModel {
            encoder,
            convs,
            virtual_nodes,
            hidden_size: hidden,
            training: true,
        })
    }

    pub fn num_layers(&self) -> usize {
        self.convs.len()
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// # Description
    /// one forward pass over a single graph
    /// # Return
    /// `num_nodes x hidden_size` node embeddings
    pub fn forward(&mut self, graph: &Graph, features: &NodeFeatures) -> Result<Array2<f32>> {
        self.forward_with_virtual_node(graph, features)
            .map(|(x, _)| x)
    }

    /// # Description
    /// same as [`GnnModel::forward`], also returns the final virtual node
    /// - one graph gives a `1 x hidden_size` virtual node, so its batch norms
    ///   always run on their running statistics
    /// # Return
    /// the node embeddings and, with the virtual node on, its last value
    pub fn forward_with_virtual_node(
        &mut self,
        graph: &Graph,
        features: &NodeFeatures,
    ) -> Result<(Array2<f32>, Option<Array2<f32>>)> {
        let num_nodes = graph.num_nodes();
        if features.len() != num_nodes {
            return Err(GnnError::ShapeMismatch {
                what: "node feature rows",
                expected: num_nodes,
                got: features.len(),
            });
        }
        let (sources, targets) = graph.edge_index();
        // a single graph: every node belongs to graph 0
        let batch = vec![0; num_nodes];
        let num_graphs = 1;
        let mut virtual_node = Array2::<f32>::zeros((1, self.hidden_size));

        let mut x = self.encoder.forward(features.features.view())?;
        for (i, conv) in self.convs.iter_mut().enumerate() {
            if self.virtual_nodes.is_some() {
                x = x + &gather(&virtual_node, &batch)?;
            }
            let messages = gather(&x, &sources)?;
            x = conv.forward(&messages, &targets, Some(num_nodes))?;
            if let Some(virtual_nodes) = self.virtual_nodes.as_mut() {
                let vn = &mut virtual_nodes[i];
                vn.train(self.training && num_graphs > 1);
                virtual_node = vn.forward(&virtual_node, &x, &batch)?;
            }
            debug!("layer {} done: {:?}", i, x.dim());
        }
        let virtual_node = self.virtual_nodes.as_ref().map(|_| virtual_node);
        Ok((x, virtual_node))
    }
}

impl Module for GnnModel {
    fn reset_parameters(&mut self, rng: &mut StdRng) {
        self.encoder.reset_parameters(rng);
        for conv in self.convs.iter_mut() {
            conv.reset_parameters(rng);
        }
        for vn in self.virtual_nodes.iter_mut().flatten() {
            vn.reset_parameters(rng);
        }
    }

    fn named_parameters(&self) -> Vec<(String, ArrayViewD<'_, f32>)> {
        let mut params = with_prefix("encoder", self.encoder.named_parameters());
        for (i, conv) in self.convs.iter().enumerate() {
            params.extend(with_prefix(&format!("convs.{}", i), conv.named_parameters()));
        }
        for (i, vn) in self.virtual_nodes.iter().flatten().enumerate() {
            params.extend(with_prefix(
                &format!("virtual_nodes.{}", i),
                vn.named_parameters(),
            ));
        }
        params
    }

    fn train(&mut self, training: bool) {
        self.training = training;
        for conv in self.convs.iter_mut() {
            conv.train(training);
        }
        for vn in self.virtual_nodes.iter_mut().flatten() {
            vn.train(training);
        }
    }
}
