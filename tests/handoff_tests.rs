//! # Capture Handoff Tests
//!
//! Runs a real capture thread against the staging chunk and checks that the
//! consumer never sees a torn, stale or repeated chunk.

use kws_edge::audio::{AudioCapture, AudioHandoff, CaptureLoop};
use kws_edge::config::ProviderConfig;
use kws_edge::error::Result;
use kws_edge::features::{FeatureGenerator, FeatureProvider};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Fills every chunk with its own number, pausing halfway through
struct SlowUniformCapture {
    chunk: i16,
}

impl AudioCapture for SlowUniformCapture {
    fn capture(&mut self, buffer: &mut [i16]) {
        self.chunk += 1;
        let half = buffer.len() / 2;
        buffer[..half].fill(self.chunk);
        thread::sleep(Duration::from_millis(2));
        buffer[half..].fill(self.chunk);
    }
}

struct RampCapture {
    next: i16,
}

impl AudioCapture for RampCapture {
    fn capture(&mut self, buffer: &mut [i16]) {
        for sample in buffer.iter_mut() {
            self.next += 1;
            *sample = self.next;
        }
    }
}

struct FirstSampleGenerator;

impl FeatureGenerator for FirstSampleGenerator {
    fn generate_slice(&mut self, audio: &[i16], slice: &mut [u8]) -> Result<usize> {
        slice.fill(audio.first().copied().unwrap_or(0) as u8);
        Ok(2.min(audio.len()))
    }
}

fn small_config() -> ProviderConfig {
    ProviderConfig {
        sample_rate: 16000,
        audio_size: 32,
        new_samples: 8,
        slice_size: 2,
        slice_count: 6,
        new_slices: 4,
        strict_timing: false,
    }
}

#[test]
fn test_consumer_never_sees_torn_or_repeated_chunks() {
    let _ = env_logger::try_init();

    let handoff = Arc::new(AudioHandoff::new(64));
    let capture_loop =
        CaptureLoop::spawn(SlowUniformCapture { chunk: 0 }, handoff.clone()).unwrap();

    let mut dst = vec![0i16; 64];
    let mut expected = 0u64;
    for _ in 0..40 {
        let taken = handoff.take_into(expected, &mut dst).unwrap();
        assert_eq!(taken.sequence, expected);
        assert!(
            dst.iter().all(|&s| s == expected as i16),
            "chunk {} was torn: {:?}",
            expected,
            &dst[..]
        );

        capture_loop.activate().unwrap();
        expected += 1;
    }
}

#[test]
fn test_slow_consumer_does_not_skip_chunks() {
    let _ = env_logger::try_init();

    let handoff = Arc::new(AudioHandoff::new(16));
    let capture_loop =
        CaptureLoop::spawn(SlowUniformCapture { chunk: 0 }, handoff.clone()).unwrap();

    let mut dst = vec![0i16; 16];
    for expected in 0..10u64 {
        handoff.take_into(expected, &mut dst).unwrap();
        assert_eq!(dst[0], expected as i16);
        capture_loop.activate().unwrap();
        thread::sleep(Duration::from_millis(5));
    }

    // Only activated captures ran, regardless of how long the consumer idled
    handoff.take_into(10, &mut dst).unwrap();
    thread::sleep(Duration::from_millis(10));
    assert_eq!(handoff.sequence().unwrap(), 10);
}

#[test]
fn test_windows_stay_contiguous_over_many_cycles() {
    let _ = env_logger::try_init();

    let mut provider =
        FeatureProvider::new(small_config(), RampCapture { next: 0 }, FirstSampleGenerator)
            .unwrap();
    let mut features = vec![0u8; 12];

    for cycle in 0..20 {
        provider
            .populate_feature_data(&mut features, cycle * 480, (cycle + 1) * 480)
            .unwrap();
    }

    // Cycle 20 merged chunk 19 (samples 145..=152) on top of chunks 16..=18
    let expected_audio: Vec<i16> = (121..=152).collect();
    assert_eq!(provider.audio(), &expected_audio[..]);

    assert_eq!(
        features,
        vec![141, 141, 143, 143, 145, 145, 147, 147, 149, 149, 151, 151]
    );
    assert_eq!(provider.stats().cycles, 20);
    assert_eq!(provider.stats().capture_loops_started, 1);
}
