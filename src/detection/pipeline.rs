//! # Keyword Spotting Cycle
//!
//! Drives one recognition cycle end to end:
//!
//! ```text
//! capture thread ──chunk──▶ FeatureProvider ──tensor──▶ InferenceEngine ──scores──▶ CommandRecognizer
//!      ▲                         │
//!      └──────activation─────────┘
//! ```
//!
//! The feature tensor buffer is allocated once and reused every cycle.

use crate::audio::capture::AudioCapture;
use crate::config::{ProviderConfig, RecognizerConfig};
use crate::detection::recognizer::{CommandRecognizer, DetectionResult};
use crate::error::Result;
use crate::features::{FeatureGenerator, FeatureProvider, ProviderStats};
use crate::models::InferenceEngine;

/// Configuration for the detection pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub provider: ProviderConfig,
    pub recognizer: RecognizerConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.provider.validate()?;
        self.recognizer.validate()
    }
}

pub struct KeywordSpotter<G: FeatureGenerator, E: InferenceEngine> {
    provider: FeatureProvider<G>,
    engine: E,
    recognizer: CommandRecognizer,
    feature_buffer: Vec<u8>,
    last_time_ms: i32,
    detections: u64,
}

impl<G: FeatureGenerator, E: InferenceEngine> KeywordSpotter<G, E> {
    pub fn new<C>(config: PipelineConfig, capture: C, generator: G, engine: E) -> Result<Self>
    where
        C: AudioCapture + 'static,
    {
        log::info!("Initializing keyword spotting pipeline...");
        config.validate()?;

        let feature_buffer = vec![0u8; config.provider.feature_element_count()];
        let provider = FeatureProvider::new(config.provider, capture, generator)?;
        let recognizer = CommandRecognizer::new(config.recognizer)?;

        Ok(Self {
            provider,
            engine,
            recognizer,
            feature_buffer,
            last_time_ms: 0,
            detections: 0,
        })
    }

    /// Run one full cycle: refresh features, classify, smooth.
    pub fn run_cycle(&mut self, time_ms: i32) -> Result<DetectionResult> {
        let new_slices =
            self.provider
                .populate_feature_data(&mut self.feature_buffer, self.last_time_ms, time_ms)?;
        self.last_time_ms = time_ms;

        if new_slices == 0 {
            log::debug!("No new feature slices at {}ms", time_ms);
        }

        let scores = self.engine.infer(&self.feature_buffer)?;
        let result = self.recognizer.process_latest_results(&scores, time_ms)?;

        if result.is_new_command {
            self.detections += 1;
            log::info!(
                "🎯 Heard '{}' (score {}) at {}ms",
                result.label,
                result.score,
                time_ms
            );
        }

        Ok(result)
    }

    pub fn detections(&self) -> u64 {
        self.detections
    }

    pub fn provider(&self) -> &FeatureProvider<G> {
        &self.provider
    }

    pub fn provider_stats(&self) -> &ProviderStats {
        self.provider.stats()
    }

    pub fn recognizer(&self) -> &CommandRecognizer {
        &self.recognizer
    }
}
