//! Cross-thread audio handoff
//!
//! The capture thread owns writing the staging chunk, the feature provider
//! owns reading it. A mutex serialises the two, a condition variable lets the
//! reader wait for the chunk it expects, and a single-slot channel carries the
//! activation signal back to the capture thread.

use crate::audio::capture::AudioCapture;
use crate::error::{EdgeError, Result};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Condvar, Mutex, MutexGuard};

/// Sending half of the activation signal (consumer side)
#[derive(Debug)]
pub struct ActivationSignal {
    sender: SyncSender<()>,
}

/// Receiving half of the activation signal (capture side)
#[derive(Debug)]
pub struct ActivationListener {
    receiver: Receiver<()>,
}

/// Create a coalescing activation signal: notifying while a notification is
/// already pending has no further effect.
pub fn activation_signal() -> (ActivationSignal, ActivationListener) {
    let (sender, receiver) = mpsc::sync_channel(1);
    (ActivationSignal { sender }, ActivationListener { receiver })
}

impl ActivationSignal {
    pub fn notify(&self) -> Result<()> {
        match self.sender.try_send(()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(())) => {
                log::trace!("Activation already pending, coalesced");
                Ok(())
            }
            Err(TrySendError::Disconnected(())) => Err(EdgeError::Audio(
                "Capture loop is no longer listening for activation".to_string(),
            )),
        }
    }
}

impl ActivationListener {
    /// Block until activated. Returns false once the signal has been dropped.
    pub fn wait(&self) -> bool {
        self.receiver.recv().is_ok()
    }
}

#[derive(Debug)]
struct StagingChunk {
    samples: Vec<i16>,
    sequence: u64, // Completed captures so far, 0 = initial silence
}

/// What the reader got out of the staging chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TakenChunk {
    pub sequence: u64,
    /// True when the capture was still running as the reader arrived
    pub waited: bool,
}

/// One-chunk buffer shared between the capture thread and the provider
#[derive(Debug)]
pub struct AudioHandoff {
    staging: Mutex<StagingChunk>,
    ready: Condvar,
    chunk_len: usize,
}

impl AudioHandoff {
    pub fn new(chunk_len: usize) -> Self {
        Self {
            staging: Mutex::new(StagingChunk {
                samples: vec![0; chunk_len],
                sequence: 0,
            }),
            ready: Condvar::new(),
            chunk_len,
        }
    }

    pub fn chunk_len(&self) -> usize {
        self.chunk_len
    }

    /// Sequence number of the last completed capture
    pub fn sequence(&self) -> Result<u64> {
        Ok(self.lock()?.sequence)
    }

    /// Run one blocking capture straight into the staging chunk.
    ///
    /// The lock is held for the whole capture so the reader can never see a
    /// half-written chunk.
    /// A panicking capture poisons the lock and still wakes the reader.
    pub fn capture_with<C: AudioCapture + ?Sized>(&self, capture: &mut C) -> Result<u64> {
        let _wake = WakeReader(&self.ready);
        let mut staging = self.lock()?;
        capture.capture(&mut staging.samples);
        staging.sequence += 1;
        let sequence = staging.sequence;
        Ok(sequence)
    }

    /// Copy the chunk carrying `expected` sequence into `dst`, waiting for the
    /// capture thread if it has not finished that chunk yet.
    pub fn take_into(&self, expected: u64, dst: &mut [i16]) -> Result<TakenChunk> {
        if dst.len() != self.chunk_len {
            return Err(EdgeError::InvalidInput(format!(
                "Destination holds {} samples, chunk has {}",
                dst.len(),
                self.chunk_len
            )));
        }

        let staging = self.lock()?;
        let waited = staging.sequence < expected;
        let staging = self
            .ready
            .wait_while(staging, |chunk| chunk.sequence < expected)
            .map_err(|_| EdgeError::Audio("Staging chunk lock poisoned".to_string()))?;

        if staging.sequence != expected {
            return Err(EdgeError::Audio(format!(
                "Expected chunk {} but staging holds chunk {}",
                expected, staging.sequence
            )));
        }

        dst.copy_from_slice(&staging.samples);
        Ok(TakenChunk {
            sequence: staging.sequence,
            waited,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, StagingChunk>> {
        self.staging
            .lock()
            .map_err(|_| EdgeError::Audio("Staging chunk lock poisoned".to_string()))
    }
}

/// Notifies the reader once the staging guard declared after it is released
struct WakeReader<'a>(&'a Condvar);

impl Drop for WakeReader<'_> {
    fn drop(&mut self) {
        self.0.notify_all();
    }
}
