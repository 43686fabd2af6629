use thiserror::Error;

pub type Result<T> = std::result::Result<T, EdgeError>;

#[derive(Error, Debug)]
pub enum EdgeError {
    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Feature generation error: {0}")]
    FeatureGeneration(String),

    #[error("Inference error: {0}")]
    Inference(String),

    /// The consumer took longer than one capture chunk, so the producer sat idle
    #[error("Timing violation: cycle took {elapsed_ms}ms, chunk lasts {chunk_ms}ms")]
    TimingViolation { elapsed_ms: u128, chunk_ms: u128 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}
