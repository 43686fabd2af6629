//! Inference engine interface
//!
//! The neural network itself is external. The pipeline only needs something
//! that turns the feature tensor into a score tensor it can validate.

#[cfg(feature = "tflite")]
pub mod tflite;

#[cfg(feature = "tflite")]
pub use tflite::TfliteEngine;

use crate::error::Result;
use strum::{Display, EnumString};

/// Element type of an inference output
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum TensorType {
    #[strum(serialize = "uint8")]
    UInt8,
    #[strum(serialize = "int8")]
    Int8,
    #[strum(serialize = "int16")]
    Int16,
    #[strum(serialize = "int32")]
    Int32,
    #[strum(serialize = "float32")]
    Float32,
    #[strum(serialize = "other")]
    Other,
}

/// Raw classification output: shape, element type and payload bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreTensor {
    pub shape: Vec<usize>,
    pub element_type: TensorType,
    pub data: Vec<u8>,
}

impl ScoreTensor {
    /// A single-batch `(1, scores.len())` quantized result
    pub fn uint8(scores: &[u8]) -> Self {
        Self {
            shape: vec![1, scores.len()],
            element_type: TensorType::UInt8,
            data: scores.to_vec(),
        }
    }

    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Runs the classifier on one feature tensor
pub trait InferenceEngine {
    fn infer(&mut self, features: &[u8]) -> Result<ScoreTensor>;
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for Box<E> {
    fn infer(&mut self, features: &[u8]) -> Result<ScoreTensor> {
        (**self).infer(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_uint8_tensor() {
        let tensor = ScoreTensor::uint8(&[10, 200, 3]);
        assert_eq!(tensor.shape, vec![1, 3]);
        assert_eq!(tensor.element_count(), 3);
        assert_eq!(tensor.element_type, TensorType::UInt8);
    }

    #[test]
    fn test_tensor_type_names() {
        assert_eq!(TensorType::UInt8.to_string(), "uint8");
        assert_eq!(TensorType::from_str("float32").unwrap(), TensorType::Float32);
        assert!(TensorType::from_str("complex64").is_err());
    }
}
