//! Feature tensor assembly
//!
//! The feature tensor is a rolling history of fixed-width slices. Each cycle
//! the oldest slices are dropped and the newest ones are recomputed from the
//! fresh audio by an external [`FeatureGenerator`].

pub mod provider;

pub use provider::{FeatureProvider, ProviderStats};

use crate::audio::window::SlidingWindow;
use crate::error::Result;

/// External transform turning raw audio into one feature slice
pub trait FeatureGenerator {
    /// One-time set up, run before the first slice is generated
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Write exactly `slice.len()` bytes of features computed from the start
    /// of `audio` and return how many samples were consumed. The count may
    /// vary from call to call.
    fn generate_slice(&mut self, audio: &[i16], slice: &mut [u8]) -> Result<usize>;
}

impl<G: FeatureGenerator + ?Sized> FeatureGenerator for Box<G> {
    fn initialize(&mut self) -> Result<()> {
        (**self).initialize()
    }

    fn generate_slice(&mut self, audio: &[i16], slice: &mut [u8]) -> Result<usize> {
        (**self).generate_slice(audio, slice)
    }
}

/// Chronological window of feature slices, oldest slice first
#[derive(Debug, Clone)]
pub struct FeatureWindow {
    window: SlidingWindow<u8>,
    slice_size: usize,
    slice_count: usize,
}

impl FeatureWindow {
    pub fn new(slice_size: usize, slice_count: usize) -> Self {
        Self {
            window: SlidingWindow::new(slice_size * slice_count),
            slice_size,
            slice_count,
        }
    }

    pub fn element_count(&self) -> usize {
        self.window.len()
    }

    pub fn slice_size(&self) -> usize {
        self.slice_size
    }

    pub fn slice_count(&self) -> usize {
        self.slice_count
    }

    pub fn as_slice(&self) -> &[u8] {
        self.window.as_slice()
    }

    /// Drop the oldest `count` slices
    pub fn shift_slices(&mut self, count: usize) -> Result<()> {
        self.window.shift_left(count * self.slice_size)
    }

    /// The newest `count` slices as one contiguous region
    pub fn newest_slices_mut(&mut self, count: usize) -> Result<&mut [u8]> {
        self.window.tail_mut(count * self.slice_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry() {
        let window = FeatureWindow::new(4, 3);
        assert_eq!(window.element_count(), 12);
        assert_eq!(window.slice_count(), 3);
        assert!(window.as_slice().iter().all(|&f| f == 0));
    }

    #[test]
    fn test_shift_slices() {
        let mut window = FeatureWindow::new(2, 3);
        window.newest_slices_mut(3).unwrap().copy_from_slice(&[1, 1, 2, 2, 3, 3]);

        window.shift_slices(2).unwrap();
        window.newest_slices_mut(2).unwrap().copy_from_slice(&[4, 4, 5, 5]);

        assert_eq!(window.as_slice(), &[3, 3, 4, 4, 5, 5]);
    }

    #[test]
    fn test_shift_more_than_window() {
        let mut window = FeatureWindow::new(2, 2);
        assert!(window.shift_slices(3).is_err());
        assert!(window.newest_slices_mut(3).is_err());
    }
}
