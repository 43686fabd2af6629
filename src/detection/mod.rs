pub mod pipeline;
pub mod recognizer;

pub use pipeline::{KeywordSpotter, PipelineConfig};
pub use recognizer::{CommandRecognizer, DetectionResult, ScoreHistory, HISTORY_LEN};
