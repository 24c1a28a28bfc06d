//! LayeredMatrix — square grid of uniform blocks
//!
//! Block `[i][j]` captures the interaction between layer `i` of one
//! LayeredVector and layer `j` of another: the outer product
//! `layer_i(a) ⊗ layer_j(b)`. Every block in a grid shares one
//! `row_dimension × col_dimension` shape; that invariant is validated at
//! construction and on every block replacement.

use super::{LayeredVector, VectorError};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayeredMatrix {
    blocks: Vec<Vec<DMatrix<f64>>>,
    num_layers: usize,
    row_dimension: usize,
    col_dimension: usize,
}

impl LayeredMatrix {
    /// Build directly from nested block data, validating that the grid is
    /// square and every block shares one shape. Nothing is constructed on
    /// failure.
    pub fn from_blocks(blocks: Vec<Vec<DMatrix<f64>>>) -> Result<Self, VectorError> {
        let num_layers = blocks.len();
        for (i, row) in blocks.iter().enumerate() {
            if row.len() != num_layers {
                return Err(VectorError::DimensionMismatch(format!(
                    "block row {} has {} blocks, expected {}",
                    i,
                    row.len(),
                    num_layers
                )));
            }
        }
        let (row_dimension, col_dimension) = match blocks.first().and_then(|r| r.first()) {
            Some(block) => (block.nrows(), block.ncols()),
            None => (0, 0),
        };
        for (i, row) in blocks.iter().enumerate() {
            for (j, block) in row.iter().enumerate() {
                if block.nrows() != row_dimension || block.ncols() != col_dimension {
                    return Err(VectorError::DimensionMismatch(format!(
                        "block [{},{}] is {}x{}, expected {}x{}",
                        i,
                        j,
                        block.nrows(),
                        block.ncols(),
                        row_dimension,
                        col_dimension
                    )));
                }
            }
        }
        Ok(Self {
            blocks,
            num_layers,
            row_dimension,
            col_dimension,
        })
    }

    /// Outer-product construction: `block[i][j] = layer_i(a) ⊗ layer_j(b)`,
    /// so `block[i][j][(r, c)] == a.layer(i)[r] * b.layer(j)[c]`.
    pub fn outer_product(a: &LayeredVector, b: &LayeredVector) -> Result<Self, VectorError> {
        if a.num_layers() != b.num_layers() {
            return Err(VectorError::DimensionMismatch(format!(
                "layer counts differ: {} vs {}",
                a.num_layers(),
                b.num_layers()
            )));
        }
        let row_dimension = a.uniform_layer_len()?;
        let col_dimension = b.uniform_layer_len()?;
        let num_layers = a.num_layers();

        let mut blocks = Vec::with_capacity(num_layers);
        for i in 0..num_layers {
            let left = a.layer(i)?;
            let mut row = Vec::with_capacity(num_layers);
            for j in 0..num_layers {
                let right = b.layer(j)?;
                row.push(left * right.transpose());
            }
            blocks.push(row);
        }
        Ok(Self {
            blocks,
            num_layers,
            row_dimension,
            col_dimension,
        })
    }

    pub fn num_layers(&self) -> usize {
        self.num_layers
    }

    pub fn row_dimension(&self) -> usize {
        self.row_dimension
    }

    pub fn col_dimension(&self) -> usize {
        self.col_dimension
    }

    pub fn block(&self, i: usize, j: usize) -> Result<&DMatrix<f64>, VectorError> {
        self.check_index(i)?;
        self.check_index(j)?;
        Ok(&self.blocks[i][j])
    }

    /// Replace one block; the replacement must match the grid's shape.
    pub fn set_block(&mut self, i: usize, j: usize, block: DMatrix<f64>) -> Result<(), VectorError> {
        self.check_index(i)?;
        self.check_index(j)?;
        if block.nrows() != self.row_dimension || block.ncols() != self.col_dimension {
            return Err(VectorError::DimensionMismatch(format!(
                "replacement block is {}x{}, expected {}x{}",
                block.nrows(),
                block.ncols(),
                self.row_dimension,
                self.col_dimension
            )));
        }
        self.blocks[i][j] = block;
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), VectorError> {
        if index >= self.num_layers {
            return Err(VectorError::OutOfRange {
                index,
                dimension: self.num_layers,
            });
        }
        Ok(())
    }
}
