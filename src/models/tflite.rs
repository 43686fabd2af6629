//! Command classifier using TensorFlow Lite
//!
//! Wraps a quantized keyword model whose input is the flattened feature tensor
//! and whose output is one uint8 score per category.

use crate::error::{EdgeError, Result};
use crate::models::{InferenceEngine, ScoreTensor, TensorType};
use std::path::Path;

use tflitec::interpreter::{Interpreter, Options};
use tflitec::model::Model;
use tflitec::tensor::DataType;

pub struct TfliteEngine {
    interpreter: Interpreter<'static>,
    expected_input_size: usize,
}

impl TfliteEngine {
    pub fn new(model_path: &str) -> Result<Self> {
        if !Path::new(model_path).exists() {
            return Err(EdgeError::Inference(format!(
                "Model file not found: {}",
                model_path
            )));
        }

        // Load the model and leak it for 'static lifetime
        let model = Box::leak(Box::new(Model::new(model_path).map_err(|e| {
            EdgeError::Inference(format!("Failed to load command model: {}", e))
        })?));

        let mut options = Options::default();
        options.thread_count = 1;

        let interpreter = Interpreter::new(model, Some(options)).map_err(|e| {
            EdgeError::Inference(format!("Failed to create command interpreter: {}", e))
        })?;

        interpreter.allocate_tensors().map_err(|e| {
            EdgeError::Inference(format!("Failed to allocate command tensors: {}", e))
        })?;

        let expected_input_size = {
            let input_tensor = interpreter.input(0).map_err(|e| {
                EdgeError::Inference(format!("Failed to get command model input: {}", e))
            })?;
            let input_shape = input_tensor.shape();
            log::info!(
                "Command model loaded from {} (input {:?})",
                model_path,
                input_shape.dimensions()
            );
            input_shape.dimensions().iter().product::<usize>()
        };

        Ok(Self {
            interpreter,
            expected_input_size,
        })
    }
}

fn tensor_type(data_type: DataType) -> TensorType {
    match data_type {
        DataType::Uint8 => TensorType::UInt8,
        DataType::Int8 => TensorType::Int8,
        DataType::Int16 => TensorType::Int16,
        DataType::Int32 => TensorType::Int32,
        DataType::Float32 => TensorType::Float32,
        _ => TensorType::Other,
    }
}

impl InferenceEngine for TfliteEngine {
    fn infer(&mut self, features: &[u8]) -> Result<ScoreTensor> {
        if features.len() != self.expected_input_size {
            return Err(EdgeError::InvalidInput(format!(
                "Expected {} features, got {}",
                self.expected_input_size,
                features.len()
            )));
        }

        self.interpreter.copy(features, 0).map_err(|e| {
            EdgeError::Inference(format!("Failed to set command model input: {}", e))
        })?;

        self.interpreter
            .invoke()
            .map_err(|e| EdgeError::Inference(format!("Command inference failed: {}", e)))?;

        let output_tensor = self.interpreter.output(0).map_err(|e| {
            EdgeError::Inference(format!("Failed to get command model output: {}", e))
        })?;

        Ok(ScoreTensor {
            shape: output_tensor.shape().dimensions().to_vec(),
            element_type: tensor_type(output_tensor.data_type()),
            data: output_tensor.data::<u8>().to_vec(),
        })
    }
}
