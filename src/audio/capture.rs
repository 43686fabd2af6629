use crate::audio::channel::ChannelExtractor;
use crate::audio::handoff::{activation_signal, ActivationSignal, AudioHandoff};
use crate::error::{EdgeError, Result};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Source of raw microphone samples.
///
/// `capture` blocks until `buffer` is completely filled with the next
/// `buffer.len()` samples. Failures are not observable to the caller.
pub trait AudioCapture: Send {
    fn capture(&mut self, buffer: &mut [i16]);
}

impl<C: AudioCapture + ?Sized> AudioCapture for Box<C> {
    fn capture(&mut self, buffer: &mut [i16]) {
        (**self).capture(buffer)
    }
}

/// Dedicated thread that fills the staging chunk each time it is activated
pub struct CaptureLoop {
    signal: Option<ActivationSignal>,
    handle: Option<JoinHandle<()>>,
}

impl CaptureLoop {
    /// Spawn the capture thread. It idles until the first [`activate`](Self::activate).
    pub fn spawn<C>(capture: C, handoff: Arc<AudioHandoff>) -> Result<Self>
    where
        C: AudioCapture + 'static,
    {
        let (signal, listener) = activation_signal();

        let handle = thread::Builder::new()
            .name("audio-capture".to_string())
            .spawn(move || {
                let mut capture = capture;
                log::info!(
                    "Capture loop started ({} samples per chunk)",
                    handoff.chunk_len()
                );

                while listener.wait() {
                    match handoff.capture_with(&mut capture) {
                        Ok(sequence) => log::trace!("Captured chunk {}", sequence),
                        Err(e) => {
                            log::error!("Capture loop stopping: {}", e);
                            break;
                        }
                    }
                }

                log::info!("Capture loop stopped");
            })?;

        Ok(Self {
            signal: Some(signal),
            handle: Some(handle),
        })
    }

    /// Ask the capture thread to start recording the next chunk
    pub fn activate(&self) -> Result<()> {
        match &self.signal {
            Some(signal) => signal.notify(),
            None => Err(EdgeError::Audio("Capture loop already shut down".to_string())),
        }
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        // Closing the signal ends the thread after its current capture
        self.signal.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Capture thread panicked");
            }
        }
    }
}

/// Replays a 16-bit PCM WAV file as if it were a microphone.
///
/// Multi-channel files are reduced to one channel. Once the file is used up
/// the capture keeps delivering silence.
pub struct WavFileCapture {
    samples: Vec<i16>,
    position: usize,
    sample_rate: u32,
    realtime: bool,
    exhausted_logged: bool,
}

impl WavFileCapture {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_channel(path, 0)
    }

    pub fn open_channel<P: AsRef<Path>>(path: P, channel: usize) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();

        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(EdgeError::InvalidInput(format!(
                "Audio file {} must be 16-bit PCM, got {} bits {:?}",
                path.display(),
                spec.bits_per_sample,
                spec.sample_format
            )));
        }

        let extractor = ChannelExtractor::new(channel, spec.channels as usize)?;
        let interleaved = reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<i16>, _>>()?;
        let samples = extractor.extract_channel(&interleaved);

        log::info!(
            "Loaded {} samples ({:.2}s at {}Hz) from {}",
            samples.len(),
            samples.len() as f32 / spec.sample_rate as f32,
            spec.sample_rate,
            path.display()
        );

        Ok(Self {
            samples,
            position: 0,
            sample_rate: spec.sample_rate,
            realtime: false,
            exhausted_logged: false,
        })
    }

    /// Block for the wall-clock duration of each chunk, like a real microphone
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn remaining(&self) -> usize {
        self.samples.len() - self.position
    }
}

impl AudioCapture for WavFileCapture {
    fn capture(&mut self, buffer: &mut [i16]) {
        let started = Instant::now();

        let available = self.remaining().min(buffer.len());
        buffer[..available].copy_from_slice(&self.samples[self.position..self.position + available]);
        buffer[available..].fill(0);
        self.position += available;

        if available < buffer.len() && !self.exhausted_logged {
            log::info!("WAV replay exhausted, continuing with silence");
            self.exhausted_logged = true;
        }

        if self.realtime && self.sample_rate > 0 {
            let chunk = Duration::from_micros(
                buffer.len() as u64 * 1_000_000 / self.sample_rate as u64,
            );
            if let Some(rest) = chunk.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCapture {
        calls: Arc<AtomicUsize>,
    }

    impl AudioCapture for CountingCapture {
        fn capture(&mut self, buffer: &mut [i16]) {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            buffer.fill(call as i16);
        }
    }

    #[test]
    fn test_loop_idles_until_activated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handoff = Arc::new(AudioHandoff::new(16));
        let capture_loop = CaptureLoop::spawn(
            CountingCapture {
                calls: calls.clone(),
            },
            handoff.clone(),
        )
        .unwrap();

        thread::sleep(Duration::from_millis(20));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        capture_loop.activate().unwrap();
        let mut dst = [0i16; 16];
        handoff.take_into(1, &mut dst).unwrap();
        assert_eq!(dst, [1; 16]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_stops_thread() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handoff = Arc::new(AudioHandoff::new(4));
        let capture_loop = CaptureLoop::spawn(
            CountingCapture {
                calls: calls.clone(),
            },
            handoff.clone(),
        )
        .unwrap();

        drop(capture_loop);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(Arc::strong_count(&handoff), 1);
    }
}
