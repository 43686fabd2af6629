//! Model geometry and detection settings
//!
//! The constants describe the model the firmware ships with. The runtime
//! structs default to them and can be narrowed down for tests or other models.

use crate::error::{EdgeError, Result};
use std::time::Duration;

/// Microphone sampling rate in Hz
pub const SAMPLE_RATE: u32 = 16000;

/// Samples of audio history kept in the audio window (1 second)
pub const AUDIO_SIZE: usize = 16000;

/// Samples captured per cycle. Inference takes roughly 450ms, so the producer
/// records 480ms at a time and the consumer always ends up waiting on it.
pub const NEW_SAMPLES: usize = 7680;

/// Bytes per feature slice
pub const FEATURE_SLICE_SIZE: usize = 40;

/// Slices in the feature tensor
pub const FEATURE_SLICE_COUNT: usize = 49;

pub const FEATURE_ELEMENT_COUNT: usize = FEATURE_SLICE_SIZE * FEATURE_SLICE_COUNT;

/// Slices recomputed per cycle
pub const NEW_FEATURE_SLICES: usize = 30;

pub const CATEGORY_LABELS: &[&str] = &["hey_edge", "unknown"];

pub const CATEGORY_COUNT: usize = CATEGORY_LABELS.len();

/// Filler categories the model scores but which never count as a command
pub const NON_COMMAND_LABELS: &[&str] = &["unknown"];

/// Smoothed uint8 score that has to be exceeded to report a command
pub const DETECTION_THRESHOLD: u8 = 200;

/// Configuration for the feature provider and its capture loop
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub sample_rate: u32,
    pub audio_size: usize,     // Samples in the audio window
    pub new_samples: usize,    // Samples per captured chunk
    pub slice_size: usize,     // Bytes per feature slice
    pub slice_count: usize,    // Slices in the feature window
    pub new_slices: usize,     // Slices recomputed per cycle

    /// Fail the cycle instead of only warning when the consumer fell behind
    pub strict_timing: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            audio_size: AUDIO_SIZE,
            new_samples: NEW_SAMPLES,
            slice_size: FEATURE_SLICE_SIZE,
            slice_count: FEATURE_SLICE_COUNT,
            new_slices: NEW_FEATURE_SLICES,
            strict_timing: false,
        }
    }
}

impl ProviderConfig {
    pub fn feature_element_count(&self) -> usize {
        self.slice_size * self.slice_count
    }

    pub fn new_feature_elements(&self) -> usize {
        self.new_slices * self.slice_size
    }

    /// Wall-clock length of one captured chunk
    pub fn chunk_duration(&self) -> Duration {
        Duration::from_micros(self.new_samples as u64 * 1_000_000 / self.sample_rate as u64)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(EdgeError::Config("Sample rate must be positive".to_string()));
        }

        if self.new_samples == 0 || self.new_samples > self.audio_size {
            return Err(EdgeError::Config(format!(
                "Chunk of {} samples does not fit an audio window of {}",
                self.new_samples, self.audio_size
            )));
        }

        if self.slice_size == 0 || self.slice_count == 0 {
            return Err(EdgeError::Config(format!(
                "Feature geometry {}x{} is empty",
                self.slice_count, self.slice_size
            )));
        }

        if self.new_slices > self.slice_count {
            return Err(EdgeError::Config(format!(
                "Cannot recompute {} slices of a {} slice window",
                self.new_slices, self.slice_count
            )));
        }

        Ok(())
    }
}

/// Configuration for the command recognizer
#[derive(Debug, Clone)]
pub struct RecognizerConfig {
    pub labels: Vec<String>,
    pub non_command_labels: Vec<String>, // Subset of labels, never reported
    pub detection_threshold: u8,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            labels: CATEGORY_LABELS.iter().map(|l| l.to_string()).collect(),
            non_command_labels: NON_COMMAND_LABELS.iter().map(|l| l.to_string()).collect(),
            detection_threshold: DETECTION_THRESHOLD,
        }
    }
}

impl RecognizerConfig {
    pub fn category_count(&self) -> usize {
        self.labels.len()
    }

    /// Indices of the categories that can be reported as a command
    pub fn command_categories(&self) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, label)| !self.non_command_labels.contains(*label))
            .map(|(index, _)| index)
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.labels.is_empty() {
            return Err(EdgeError::Config(
                "At least one category label is required".to_string(),
            ));
        }

        if let Some(unknown) = self
            .non_command_labels
            .iter()
            .find(|label| !self.labels.contains(*label))
        {
            return Err(EdgeError::Config(format!(
                "Non-command label '{}' is not one of {:?}",
                unknown, self.labels
            )));
        }

        if self.command_categories().is_empty() {
            return Err(EdgeError::Config(
                "At least one category must be a command".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry() {
        let config = ProviderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.feature_element_count(), FEATURE_ELEMENT_COUNT);
        assert_eq!(config.new_feature_elements(), 1200);
        assert_eq!(config.chunk_duration(), Duration::from_millis(480));
    }

    #[test]
    fn test_invalid_geometry() {
        let config = ProviderConfig {
            new_samples: AUDIO_SIZE + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ProviderConfig {
            new_slices: FEATURE_SLICE_COUNT + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ProviderConfig {
            slice_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_recognizer_config() {
        let config = RecognizerConfig::default();
        assert_eq!(config.category_count(), CATEGORY_COUNT);
        assert_eq!(config.detection_threshold, 200);
        assert!(config.validate().is_ok());

        let empty = RecognizerConfig {
            labels: vec![],
            ..Default::default()
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_non_command_labels() {
        let config = RecognizerConfig::default();
        assert_eq!(config.command_categories(), vec![0]);

        let stray = RecognizerConfig {
            non_command_labels: vec!["silence".to_string()],
            ..Default::default()
        };
        assert!(stray.validate().is_err());

        let only_filler = RecognizerConfig {
            labels: vec!["unknown".to_string()],
            ..Default::default()
        };
        assert!(only_filler.validate().is_err());
    }
}
