//! Numeric containers for the storage fabric
//!
//! - **Vector**: a flat ordered sequence of arbitrary-precision integers,
//!   the unit the compression engine operates on
//! - **LayeredVector**: a named stack of fixed-length f64 layers
//! - **LayeredMatrix**: a square grid of uniform blocks built from
//!   pairwise layer interactions

pub mod layered;
pub mod matrix;

pub use layered::LayeredVector;
pub use matrix::LayeredMatrix;

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum VectorError {
    #[error("index {index} out of range for dimension {dimension}")]
    OutOfRange { index: usize, dimension: usize },

    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
}

/// Ordered sequence of BigInt values. Insertion order is significant and
/// duplicates are allowed; the compression engine never mutates one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vector {
    data: Vec<BigInt>,
}

impl Vector {
    /// Zero-filled vector of the given dimension.
    pub fn zeros(dimension: usize) -> Self {
        Self {
            data: vec![BigInt::from(0); dimension],
        }
    }

    pub fn new(data: Vec<BigInt>) -> Self {
        Self { data }
    }

    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[BigInt] {
        &self.data
    }

    pub fn into_data(self) -> Vec<BigInt> {
        self.data
    }

    pub fn get(&self, index: usize) -> Result<&BigInt, VectorError> {
        self.data.get(index).ok_or(VectorError::OutOfRange {
            index,
            dimension: self.data.len(),
        })
    }

    pub fn set(&mut self, index: usize, value: BigInt) -> Result<(), VectorError> {
        let dimension = self.data.len();
        let slot = self
            .data
            .get_mut(index)
            .ok_or(VectorError::OutOfRange { index, dimension })?;
        *slot = value;
        Ok(())
    }
}

impl From<Vec<BigInt>> for Vector {
    fn from(data: Vec<BigInt>) -> Self {
        Self::new(data)
    }
}

impl From<&[i64]> for Vector {
    fn from(values: &[i64]) -> Self {
        Self::new(values.iter().map(|&v| BigInt::from(v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_and_access() {
        let mut v = Vector::zeros(3);
        assert_eq!(v.dimension(), 3);
        assert_eq!(*v.get(2).unwrap(), BigInt::from(0));

        v.set(1, BigInt::from(42)).unwrap();
        assert_eq!(*v.get(1).unwrap(), BigInt::from(42));
    }

    #[test]
    fn test_out_of_range() {
        let mut v = Vector::zeros(2);
        assert!(v.get(2).is_err());
        assert!(v.set(5, BigInt::from(1)).is_err());
    }

    #[test]
    fn test_from_i64_slice() {
        let v = Vector::from(&[5, -3, 9][..]);
        assert_eq!(v.data()[1], BigInt::from(-3));
    }
}
