//! Command recognizer
//!
//! Turns one score vector per cycle into a detection by averaging each
//! category over the last [`HISTORY_LEN`] cycles. This is a plain moving
//! average with no cooldown: a score that stays high is reported as a new
//! command every cycle until the average drops. Filler categories such as
//! "unknown" are tracked but never reported.

use crate::config::RecognizerConfig;
use crate::error::{EdgeError, Result};
use crate::models::{ScoreTensor, TensorType};

/// Cycles averaged per category
pub const HISTORY_LEN: usize = 3;

/// Circular buffer of the last [`HISTORY_LEN`] scores of one category.
///
/// Starts zeroed, so the average right after start-up still divides by the
/// full length.
#[derive(Debug, Clone, Default)]
pub struct ScoreHistory {
    scores: [u8; HISTORY_LEN],
    index: usize,
}

impl ScoreHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, score: u8) {
        self.scores[self.index] = score;
        self.index = (self.index + 1) % HISTORY_LEN;
    }

    pub fn average(&self) -> u8 {
        let sum: u16 = self.scores.iter().map(|&s| s as u16).sum();
        (sum / HISTORY_LEN as u16) as u8
    }

    /// Slot the next score is written to
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn scores(&self) -> &[u8; HISTORY_LEN] {
        &self.scores
    }
}

/// Outcome of one recognition cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionResult {
    pub label: String,
    /// Smoothed score, 0 unless a command was detected
    pub score: u8,
    pub is_new_command: bool,
}

pub struct CommandRecognizer {
    config: RecognizerConfig,
    histories: Vec<ScoreHistory>,
    command_categories: Vec<usize>,
}

impl CommandRecognizer {
    pub fn new(config: RecognizerConfig) -> Result<Self> {
        config.validate()?;
        let histories = vec![ScoreHistory::new(); config.category_count()];
        let command_categories = config.command_categories();
        Ok(Self {
            config,
            histories,
            command_categories,
        })
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    pub fn history(&self, category: usize) -> Option<&ScoreHistory> {
        self.histories.get(category)
    }

    /// Feed the latest inference output and get the smoothed decision.
    ///
    /// Results that are not a single-batch `(1, categories)` uint8 tensor are
    /// rejected before any history is touched.
    pub fn process_latest_results(
        &mut self,
        latest_results: &ScoreTensor,
        current_time_ms: i32,
    ) -> Result<DetectionResult> {
        self.validate(latest_results)?;

        for (history, &score) in self.histories.iter_mut().zip(&latest_results.data) {
            history.push(score);
        }

        // Highest command average wins, ties go to the earlier category
        let mut winner: Option<(usize, u8)> = None;
        for &category in &self.command_categories {
            let average = self.histories[category].average();
            if winner.map_or(true, |(_, best)| average > best) {
                winner = Some((category, average));
            }
        }
        let (best, best_average) = winner
            .ok_or_else(|| EdgeError::Config("No command categories configured".to_string()))?;

        let is_new_command = best_average > self.config.detection_threshold;
        if is_new_command {
            log::debug!(
                "{} averaged {} at {}ms (threshold {})",
                self.config.labels[best],
                best_average,
                current_time_ms,
                self.config.detection_threshold
            );
        }

        Ok(DetectionResult {
            label: self.config.labels[best].clone(),
            score: if is_new_command { best_average } else { 0 },
            is_new_command,
        })
    }

    fn validate(&self, results: &ScoreTensor) -> Result<()> {
        let category_count = self.config.category_count();

        if results.shape.len() != 2 || results.shape[0] != 1 {
            log::error!(
                "The results for recognition should contain {} elements, but the shape is {:?}",
                category_count,
                results.shape
            );
            return Err(EdgeError::InvalidInput(format!(
                "Expected results of shape [1, {}], got {:?}",
                category_count, results.shape
            )));
        }

        if results.element_type != TensorType::UInt8 {
            log::error!(
                "The results for recognition should be uint8 elements, but are {}",
                results.element_type
            );
            return Err(EdgeError::InvalidInput(format!(
                "Expected uint8 results, got {}",
                results.element_type
            )));
        }

        if results.shape[1] != category_count || results.data.len() != category_count {
            return Err(EdgeError::InvalidInput(format!(
                "Expected {} category scores, got shape {:?} with {} values",
                category_count,
                results.shape,
                results.data.len()
            )));
        }

        Ok(())
    }
}
