use thiserror::Error;

/// the error type for all the layers and readers in this crate
#[derive(Debug, Error)]
pub enum GnnError {
    /// a statistic name outside sum/mean/min/max/var/std
    #[error("Unknown aggregator \"{0}\".")]
    UnsupportedAggregator(String),

    /// an index does not fit the table or the output it points into
    #[error("{what} index {index} is out of range, the bound is {bound}")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        bound: usize,
    },

    #[error("shape mismatch for {what}: expected {expected}, got {got}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// batch statistics need more than one row in training mode
    #[error("expected more than 1 value per channel when training, got {rows} x {features}")]
    SingleRowBatch { rows: usize, features: usize },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("ndarray shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// a malformed line in a graph or feature file
    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, GnnError>;
