//! # Feature Provider
//!
//! Owns the audio and feature history and drives the handoff with the capture
//! thread. One call to [`FeatureProvider::populate_feature_data`] is one cycle:
//!
//! ```text
//! audio window:   [ ... retained audio_size - new_samples ... | newest chunk ]
//!                                                               ^ copied from the staging chunk
//! feature window: [ ... retained slices ... | new_slices recomputed from the newest chunk ]
//! ```
//!
//! Capture of the next chunk starts as soon as the current one has been copied
//! out, so it overlaps with feature generation and inference on this thread.
//! This only stays gap-free while a full consumer cycle is shorter than one
//! chunk; every cycle checks that and reports when it is not.
//!
//! ## Errors
//!
//! A strict timing violation fails the cycle before any window is touched.
//! Only that cycle fails: the next one merges the waiting chunk and restarts
//! the capture. A handoff failure also leaves the audio window untouched.
//!
//! A feature generator failure is returned immediately. The internal feature
//! window is then left partially updated for that cycle and is not rolled
//! back, but the caller's tensor buffer is only written after every slice
//! succeeded.

use crate::audio::capture::{AudioCapture, CaptureLoop};
use crate::audio::handoff::AudioHandoff;
use crate::audio::window::SlidingWindow;
use crate::config::ProviderConfig;
use crate::error::{EdgeError, Result};
use crate::features::{FeatureGenerator, FeatureWindow};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Counters describing how the provider has been running
#[derive(Debug, Clone, Default)]
pub struct ProviderStats {
    pub cycles: u64,
    /// Cycles where the consumer fell behind the capture thread
    pub timing_violations: u64,
    /// Cycles where the consumer had to wait for the capture to finish
    pub waited_for_capture: u64,
    pub capture_loops_started: u32,
    pub last_cycle: Option<Duration>,
}

pub struct FeatureProvider<G: FeatureGenerator> {
    config: ProviderConfig,
    generator: G,

    audio_window: SlidingWindow<i16>,
    feature_window: FeatureWindow,

    // Handoff with the capture thread
    handoff: Arc<AudioHandoff>,
    chunk_buffer: Vec<i16>,
    capture: Option<Box<dyn AudioCapture>>,
    capture_loop: Option<CaptureLoop>,
    next_sequence: u64,
    activated_at: Option<Instant>,

    is_first_run: bool,
    stats: ProviderStats,
}

impl<G: FeatureGenerator> FeatureProvider<G> {
    /// Create a provider. Nothing runs until the first cycle, which
    /// initialises the generator and spawns the capture thread.
    pub fn new<C>(config: ProviderConfig, capture: C, generator: G) -> Result<Self>
    where
        C: AudioCapture + 'static,
    {
        config.validate()?;

        log::info!(
            "Feature provider: {} sample window, {} sample chunks ({}ms), {}x{} features, {} new slices per cycle",
            config.audio_size,
            config.new_samples,
            config.chunk_duration().as_millis(),
            config.slice_count,
            config.slice_size,
            config.new_slices
        );

        Ok(Self {
            audio_window: SlidingWindow::new(config.audio_size),
            feature_window: FeatureWindow::new(config.slice_size, config.slice_count),
            handoff: Arc::new(AudioHandoff::new(config.new_samples)),
            chunk_buffer: vec![0; config.new_samples],
            capture: Some(Box::new(capture) as Box<dyn AudioCapture>),
            capture_loop: None,
            next_sequence: 0,
            activated_at: None,
            is_first_run: true,
            stats: ProviderStats::default(),
            config,
            generator,
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn stats(&self) -> &ProviderStats {
        &self.stats
    }

    pub fn is_initialized(&self) -> bool {
        !self.is_first_run
    }

    /// Current audio history, oldest sample first
    pub fn audio(&self) -> &[i16] {
        self.audio_window.as_slice()
    }

    /// Current feature tensor, oldest slice first
    pub fn features(&self) -> &[u8] {
        self.feature_window.as_slice()
    }

    pub fn feature_window(&self) -> &FeatureWindow {
        &self.feature_window
    }

    /// Run one cycle and copy the refreshed feature tensor into `feature_data`.
    ///
    /// The timestamps only mark the cycle boundary. Returns how many slices
    /// were newly produced.
    pub fn populate_feature_data(
        &mut self,
        feature_data: &mut [u8],
        last_time_ms: i32,
        time_ms: i32,
    ) -> Result<usize> {
        let element_count = self.config.feature_element_count();
        if feature_data.len() != element_count {
            log::error!(
                "Requested feature_data size {} doesn't match {}",
                feature_data.len(),
                element_count
            );
            return Err(EdgeError::Config(format!(
                "Requested feature_data size {} doesn't match {}",
                feature_data.len(),
                element_count
            )));
        }

        if self.is_first_run {
            self.initialize()?;
        }

        let cycle_start = Instant::now();
        self.check_timing()?;

        log::trace!("Cycle {} -> {}ms", last_time_ms, time_ms);

        self.merge_new_audio()?;
        self.generate_new_slices()?;

        feature_data.copy_from_slice(self.feature_window.as_slice());

        self.stats.cycles += 1;
        self.stats.last_cycle = Some(cycle_start.elapsed());

        Ok(self.config.new_slices)
    }

    /// First cycle only: set up the generator, then start the capture thread.
    /// The thread is never started when initialisation fails, and the next
    /// cycle tries again.
    fn initialize(&mut self) -> Result<()> {
        if let Err(e) = self.generator.initialize() {
            log::error!("Feature generator initialization failed: {}", e);
            return Err(e);
        }

        let capture = self
            .capture
            .take()
            .ok_or_else(|| EdgeError::Audio("Audio capture already handed out".to_string()))?;
        self.capture_loop = Some(CaptureLoop::spawn(capture, self.handoff.clone())?);
        self.stats.capture_loops_started += 1;
        self.is_first_run = false;

        log::info!("🎤 Capture loop spawned, feature provider ready");
        Ok(())
    }

    /// The capture thread idles from the moment its chunk is complete until
    /// the next activation. If that gap exists, audio was dropped.
    fn check_timing(&mut self) -> Result<()> {
        let Some(activated_at) = self.activated_at else {
            return Ok(());
        };

        let elapsed = activated_at.elapsed();
        let chunk = self.config.chunk_duration();
        if elapsed <= chunk {
            return Ok(());
        }

        self.stats.timing_violations += 1;
        if self.config.strict_timing {
            // Next cycle merges the waiting chunk without checking again
            self.activated_at = None;
            return Err(EdgeError::TimingViolation {
                elapsed_ms: elapsed.as_millis(),
                chunk_ms: chunk.as_millis(),
            });
        }

        log::warn!(
            "🐌 Consumer cycle took {}ms but a chunk lasts {}ms, audio was dropped",
            elapsed.as_millis(),
            chunk.as_millis()
        );
        Ok(())
    }

    /// Copy the staging chunk out, append it to the audio window, then let the
    /// capture thread start on the next chunk. The window is only shifted once
    /// the chunk is in hand.
    fn merge_new_audio(&mut self) -> Result<()> {
        let taken = self
            .handoff
            .take_into(self.next_sequence, &mut self.chunk_buffer)?;
        self.audio_window.push_slice(&self.chunk_buffer)?;
        self.next_sequence = taken.sequence + 1;
        if taken.waited {
            self.stats.waited_for_capture += 1;
        }

        let capture_loop = self
            .capture_loop
            .as_ref()
            .ok_or_else(|| EdgeError::Audio("Capture loop not running".to_string()))?;
        capture_loop.activate()?;
        self.activated_at = Some(Instant::now());

        log::debug!(
            "Merged chunk {} ({})",
            taken.sequence,
            if taken.waited { "waited" } else { "ready" }
        );
        Ok(())
    }

    /// Shift the feature window and recompute the newest slices from the
    /// fresh audio, each slice starting where the previous one stopped reading.
    fn generate_new_slices(&mut self) -> Result<()> {
        let new_slices = self.config.new_slices;
        let slice_size = self.config.slice_size;

        self.feature_window.shift_slices(new_slices)?;

        let audio = self.audio_window.as_slice();
        let mut read_pos = self.config.audio_size - self.config.new_samples;
        let new_region = self.feature_window.newest_slices_mut(new_slices)?;

        for (i, slice) in new_region.chunks_exact_mut(slice_size).enumerate() {
            let available = audio.len() - read_pos;
            let consumed = self.generator.generate_slice(&audio[read_pos..], slice)?;

            if consumed > available {
                return Err(EdgeError::FeatureGeneration(format!(
                    "Slice {} reported consuming {} samples, only {} available",
                    i, consumed, available
                )));
            }
            read_pos += consumed;
        }

        Ok(())
    }
}
