//! # Description
//! segmented reductions over the rows of a matrix
//! - each row `i` of `values` belongs to the group `index[i]`
//! - the output has one row per group, `dim_size` rows in total
//! - a group that receives no row gets 0 for every reduction
//!
//! # Example
//! ```
//! use gnn_agg::layers::scatter::{scatter, Reduce};
//! use ndarray::array;
//! let values = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
//! let out = scatter(&values, &[0, 2, 0], Some(4), Reduce::Max).unwrap();
//! assert_eq!(out, array![[5.0, 6.0], [0.0, 0.0], [3.0, 4.0], [0.0, 0.0]]);
//! ```

use ndarray::{Array2, Axis, Zip};

use crate::error::{GnnError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduce {
    Sum,
    Mean,
    Min,
    Max,
}

/// the explicit size, or max index + 1 (0 for an empty index)
pub fn infer_dim_size(index: &[usize], dim_size: Option<usize>) -> usize {
    dim_size.unwrap_or_else(|| index.iter().max().map_or(0, |&m| m + 1))
}

fn check_index(index: &[usize], dim_size: usize) -> Result<()> {
    match index.iter().find(|&&i| i >= dim_size) {
        Some(&bad) => Err(GnnError::IndexOutOfRange {
            what: "scatter group",
            index: bad,
            bound: dim_size,
        }),
        None => Ok(()),
    }
}

/// # Description
/// reduce the rows of `values` into `dim_size` groups
/// # Arguments
/// * `values` - `n x d`
/// * `index` - `n` group ids, each in `[0, dim_size)`
/// * `dim_size` - the number of groups, inferred from `index` when `None`
/// # Return
/// `dim_size x d`
pub fn scatter(
    values: &Array2<f32>,
    index: &[usize],
    dim_size: Option<usize>,
    reduce: Reduce,
) -> Result<Array2<f32>> {
    if index.len() != values.nrows() {
        return Err(GnnError::ShapeMismatch {
            what: "scatter index length",
            expected: values.nrows(),
            got: index.len(),
        });
    }
    let dim_size = infer_dim_size(index, dim_size);
    check_index(index, dim_size)?;

    let width = values.ncols();
    let mut out = match reduce {
        Reduce::Sum | Reduce::Mean => Array2::zeros((dim_size, width)),
        Reduce::Min => Array2::from_elem((dim_size, width), f32::INFINITY),
        Reduce::Max => Array2::from_elem((dim_size, width), f32::NEG_INFINITY),
    };

    for (row, &group) in values.axis_iter(Axis(0)).zip(index) {
        let target = out.row_mut(group);
        match reduce {
            Reduce::Sum | Reduce::Mean => Zip::from(target).and(&row).for_each(|o, &v| *o += v),
            Reduce::Min => Zip::from(target).and(&row).for_each(|o, &v| *o = o.min(v)),
            Reduce::Max => Zip::from(target).and(&row).for_each(|o, &v| *o = o.max(v)),
        }
    }

    let counts = degree(index, Some(dim_size))?;
    for (mut row, &count) in out.axis_iter_mut(Axis(0)).zip(&counts) {
        match (reduce, count) {
            (Reduce::Min | Reduce::Max, 0) => row.fill(0.0),
            (Reduce::Mean, c) if c > 0 => row /= c as f32,
            _ => {}
        }
    }
    Ok(out)
}

/// # Description
/// the number of entries of each group
/// # Return
/// `dim_size` counts
pub fn degree(index: &[usize], dim_size: Option<usize>) -> Result<Vec<usize>> {
    let dim_size = infer_dim_size(index, dim_size);
    check_index(index, dim_size)?;
    let mut counts = vec![0; dim_size];
    for &group in index {
        counts[group] += 1;
    }
    Ok(counts)
}

/// # Description
/// copy the rows of `x` picked by `index`, e.g. the source features of every edge
/// # Return
/// `index.len() x d`
pub fn gather(x: &Array2<f32>, index: &[usize]) -> Result<Array2<f32>> {
    if let Some(&bad) = index.iter().find(|&&i| i >= x.nrows()) {
        return Err(GnnError::IndexOutOfRange {
            what: "gather row",
            index: bad,
            bound: x.nrows(),
        });
    }
    let mut out = Array2::zeros((index.len(), x.ncols()));
    for (mut row, &i) in out.axis_iter_mut(Axis(0)).zip(index) {
        row.assign(&x.row(i));
    }
    Ok(out)
}

/// # Description
/// sum the entity rows of each graph in the batch
/// # Arguments
/// * `x` - `num_entities x d`
/// * `batch` - the graph id of each entity
/// * `size` - the number of graphs, inferred from `batch` when `None`
pub fn global_add_pool(x: &Array2<f32>, batch: &[usize], size: Option<usize>) -> Result<Array2<f32>> {
    scatter(x, batch, size, Reduce::Sum)
}
