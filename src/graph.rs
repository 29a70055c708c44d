use std::{fs::File, io::Read};

use crate::error::{GnnError, Result};

// build the structure of the graph
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    // csc[target] lists the sources of the edges into target
    csc: Vec<Vec<usize>>,
    // the number of categorical feature columns
    feature_size: usize,
}

impl Graph {
    /// read the graph from the file
    /// # Arguments
    /// * `file_name` - the path of the file
    /// # Return
    /// * `Graph` - the graph
    ///
    /// the file format is:
    /// f feature_size
    /// 0 1 2
    /// 1 2 0
    /// 2 0 1
    /// end
    ///
    /// the first line is the feature size
    /// the following lines are the sources of the edges into node 0, 1, 2...
    /// the last line is end or END
    pub fn new(file_name: &str) -> Result<Self> {
        let mut f = File::open(file_name)?;
        let mut contents = String::new();
        f.read_to_string(&mut contents)?;
        contents.parse()
    }

    pub fn get_feature_size(&self) -> usize {
        self.feature_size
    }

    pub fn get_csc(&self) -> &Vec<Vec<usize>> {
        &self.csc
    }

    pub fn num_nodes(&self) -> usize {
        self.csc.len()
    }

    pub fn num_edges(&self) -> usize {
        self.csc.iter().map(|sources| sources.len()).sum()
    }

    /// # Description
    /// the edges as two parallel lists
    /// # Return
    /// (sources, targets), the targets are the grouping index of the messages
    pub fn edge_index(&self) -> (Vec<usize>, Vec<usize>) {
        self.csc
            .iter()
            .enumerate()
            .flat_map(|(target, sources)| sources.iter().map(move |&source| (source, target)))
            .unzip()
    }
}

impl std::str::FromStr for Graph {
    type Err = GnnError;

    /// # Example
    /// ```
    /// use gnn_agg::graph::Graph;
    /// let graph: Graph = "f 3\n1 2\n0\n\nend\n".parse().unwrap();
    /// assert_eq!(graph.get_feature_size(), 3);
    /// assert_eq!(graph.num_nodes(), 3);
    /// assert_eq!(graph.edge_index(), (vec![1, 2, 0], vec![0, 0, 1]));
    /// ```
    fn from_str(contents: &str) -> Result<Self> {
        let mut lines = contents.lines();
        // the first line should be like "f {feature_size}"
        let first_line = lines
            .next()
            .ok_or_else(|| GnnError::Parse("the graph file is empty".to_string()))?;
        let mut iter = first_line.split_whitespace();
        let feature_size = match (iter.next(), iter.next()) {
            (Some("f"), Some(size)) => size
                .parse::<usize>()
                .map_err(|e| GnnError::Parse(format!("bad feature size {}: {}", size, e)))?,
            _ => {
                return Err(GnnError::Parse(
                    "the first line should be like \"f feature_size\"".to_string(),
                ))
            }
        };

        let mut csc = Vec::new();
        for line in lines {
            // test if the line start with END or end
            if line.starts_with("END") || line.starts_with("end") {
                break;
            }
            let row = line
                .split_whitespace()
                .map(|i| {
                    i.parse::<usize>()
                        .map_err(|e| GnnError::Parse(format!("bad node id {}: {}", i, e)))
                })
                .collect::<Result<Vec<_>>>()?;
            csc.push(row);
        }

        let num_nodes = csc.len();
        if let Some(&bad) = csc.iter().flatten().find(|&&source| source >= num_nodes) {
            return Err(GnnError::IndexOutOfRange {
                what: "graph node",
                index: bad,
                bound: num_nodes,
            });
        }

        Ok(Graph { csc, feature_size })
    }
}

// create a mod for testing
#[cfg(test)]
mod graph_test {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_from_file() -> std::result::Result<(), Box<dyn std::error::Error>> {
        std::fs::create_dir_all("test_data")?;
        let file_name = "test_data/graph_test.txt";
        // write the graph to the file
        let data = "f 3\n0 1 2\n1 2 0\n2 0 1\nend\n";
        let mut f = File::create(file_name)?;
        f.write_all(data.as_bytes())?;
        // read the graph from the file
        let graph = Graph::new(file_name)?;
        assert_eq!(graph.get_feature_size(), 3);
        assert_eq!(graph.get_csc()[0], vec![0, 1, 2]);
        assert_eq!(graph.get_csc()[1], vec![1, 2, 0]);
        assert_eq!(graph.get_csc()[2], vec![2, 0, 1]);
        assert_eq!(graph.num_edges(), 9);
        // delete the file
        std::fs::remove_file(file_name)?;
        Ok(())
    }

    #[test]
    fn test_bad_header() {
        assert!(matches!(
            "0 1\nend\n".parse::<Graph>(),
            Err(GnnError::Parse(_))
        ));
    }

    #[test]
    fn test_source_out_of_range() {
        assert!(matches!(
            "f 1\n1\n5\nend\n".parse::<Graph>(),
            Err(GnnError::IndexOutOfRange { index: 5, .. })
        ));
    }
}
