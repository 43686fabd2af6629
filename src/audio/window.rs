//! Fixed-capacity sliding buffer
//!
//! Both the audio history and the feature history are windows of constant
//! length that drop their oldest elements and refill the tail every cycle.

use crate::error::{EdgeError, Result};

/// Fixed-length buffer ordered oldest first
#[derive(Debug, Clone)]
pub struct SlidingWindow<T> {
    data: Box<[T]>,
}

impl<T: Copy + Default> SlidingWindow<T> {
    /// Create a window of `len` default values (silence for audio)
    pub fn new(len: usize) -> Self {
        Self {
            data: vec![T::default(); len].into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Drop the oldest `count` elements, moving the rest to the front.
    ///
    /// The last `count` elements keep their old values until the caller
    /// overwrites them through [`tail_mut`](Self::tail_mut).
    pub fn shift_left(&mut self, count: usize) -> Result<()> {
        self.check_span(count)?;
        self.data.copy_within(count.., 0);
        Ok(())
    }

    /// The newest `count` elements
    pub fn tail_mut(&mut self, count: usize) -> Result<&mut [T]> {
        self.check_span(count)?;
        let start = self.data.len() - count;
        Ok(&mut self.data[start..])
    }

    /// Shift by `samples.len()` and append `samples` as the newest elements
    pub fn push_slice(&mut self, samples: &[T]) -> Result<()> {
        self.shift_left(samples.len())?;
        self.tail_mut(samples.len())?.copy_from_slice(samples);
        Ok(())
    }

    fn check_span(&self, count: usize) -> Result<()> {
        if count > self.data.len() {
            return Err(EdgeError::InvalidInput(format!(
                "Span of {} exceeds window length {}",
                count,
                self.data.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_window_is_silent() {
        let window = SlidingWindow::<i16>::new(8);
        assert_eq!(window.len(), 8);
        assert!(window.as_slice().iter().all(|&s| s == 0));
    }

    #[test]
    fn test_push_slice_keeps_history() {
        let mut window = SlidingWindow::<i16>::new(6);
        window.push_slice(&[1, 2, 3]).unwrap();
        assert_eq!(window.as_slice(), &[0, 0, 0, 1, 2, 3]);

        window.push_slice(&[4, 5]).unwrap();
        assert_eq!(window.as_slice(), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(&window.as_slice()[4..], &[4, 5]);
    }

    #[test]
    fn test_shift_left_leaves_tail_for_caller() {
        let mut window = SlidingWindow::<u8>::new(4);
        window.push_slice(&[1, 2, 3, 4]).unwrap();
        window.shift_left(1).unwrap();
        assert_eq!(&window.as_slice()[..3], &[2, 3, 4]);

        window.tail_mut(1).unwrap()[0] = 9;
        assert_eq!(window.as_slice(), &[2, 3, 4, 9]);
    }

    #[test]
    fn test_full_and_oversized_spans() {
        let mut window = SlidingWindow::<i16>::new(3);
        window.push_slice(&[7, 8, 9]).unwrap();
        assert_eq!(window.as_slice(), &[7, 8, 9]);

        assert!(window.shift_left(4).is_err());
        assert!(window.push_slice(&[1, 2, 3, 4]).is_err());
        assert!(window.tail_mut(4).is_err());
        assert_eq!(window.as_slice(), &[7, 8, 9]);
    }
}
