//! LayeredVector — a named stack of fixed-length numeric layers

use super::VectorError;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Named ordered collection of f64 layers. Layer lengths are fixed at
/// construction; matrices are built from pairs of layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayeredVector {
    name: String,
    layers: Vec<DVector<f64>>,
}

impl LayeredVector {
    pub fn new(name: impl Into<String>, layers: Vec<Vec<f64>>) -> Self {
        Self {
            name: name.into(),
            layers: layers.into_iter().map(DVector::from_vec).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, index: usize) -> Result<&DVector<f64>, VectorError> {
        self.layers.get(index).ok_or(VectorError::OutOfRange {
            index,
            dimension: self.layers.len(),
        })
    }

    pub fn layers(&self) -> &[DVector<f64>] {
        &self.layers
    }

    /// Length shared by every layer, or an error if layers disagree.
    /// The outer-product construction needs uniform layers on each side.
    pub fn uniform_layer_len(&self) -> Result<usize, VectorError> {
        let first = match self.layers.first() {
            Some(layer) => layer.len(),
            None => return Ok(0),
        };
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.len() != first {
                return Err(VectorError::DimensionMismatch(format!(
                    "layer {} has length {}, expected {}",
                    i,
                    layer.len(),
                    first
                )));
            }
        }
        Ok(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layers() {
        let lv = LayeredVector::new("a", vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(lv.num_layers(), 2);
        assert_eq!(lv.layer(1).unwrap()[0], 3.0);
        assert!(lv.layer(2).is_err());
        assert_eq!(lv.uniform_layer_len().unwrap(), 2);
    }

    #[test]
    fn test_ragged_layers_detected() {
        let lv = LayeredVector::new("b", vec![vec![1.0], vec![2.0, 3.0]]);
        assert!(lv.uniform_layer_len().is_err());
    }

    #[test]
    fn test_empty() {
        let lv = LayeredVector::new("empty", vec![]);
        assert_eq!(lv.num_layers(), 0);
        assert_eq!(lv.uniform_layer_len().unwrap(), 0);
    }
}
