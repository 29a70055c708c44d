use std::fs::File;
use std::io::Read;

use ndarray::Array2;

use crate::error::{GnnError, Result};

/// the categorical features of the nodes, `num_nodes x num_columns` codes
#[derive(Debug, Clone, PartialEq)]
pub struct NodeFeatures {
    pub features: Array2<usize>,
}

impl NodeFeatures {
    ///
    /// # Arguments
    /// * file_name - The name of the file to read
    /// # return
    /// * NodeFeatures - The features of the nodes
    ///
    /// # Description
    /// Reads a file containing the categorical codes of each node.
    /// each line is a node, every line has the same number of codes
    /// example file format:
    /// 0 3 1
    /// 2 0 4
    /// 1 1 0
    pub fn new(file_name: &str) -> Result<Self> {
        let mut file = File::open(file_name)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let mut codes = Vec::new();
        let mut num_columns = None;
        let mut num_nodes = 0;

        for line in contents.lines().filter(|line| !line.trim().is_empty()) {
            let mut line_vec = Vec::new();
            for num in line.split_whitespace() {
                line_vec.push(
                    num.parse::<usize>()
                        .map_err(|e| GnnError::Parse(format!("bad code {}: {}", num, e)))?,
                );
            }
            let expected = *num_columns.get_or_insert(line_vec.len());
            if line_vec.len() != expected {
                return Err(GnnError::ShapeMismatch {
                    what: "feature columns",
                    expected,
                    got: line_vec.len(),
                });
            }
            codes.append(&mut line_vec);
            num_nodes += 1;
        }

        let features = Array2::from_shape_vec((num_nodes, num_columns.unwrap_or(0)), codes)?;
        Ok(NodeFeatures { features })
    }

    pub fn get_features(&self, node_id: usize) -> Vec<usize> {
        self.features.row(node_id).to_vec()
    }

    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.features.nrows() == 0
    }

    pub fn num_columns(&self) -> usize {
        self.features.ncols()
    }
}
