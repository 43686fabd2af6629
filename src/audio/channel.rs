use crate::error::{EdgeError, Result};

/// Extracts a specific channel from interleaved multi-channel audio
#[derive(Debug, Clone)]
pub struct ChannelExtractor {
    target_channel: usize,
    total_channels: usize,
}

impl ChannelExtractor {
    pub fn new(target_channel: usize, total_channels: usize) -> Result<Self> {
        if target_channel >= total_channels {
            return Err(EdgeError::Audio(format!(
                "Target channel {} is out of range for {} channels",
                target_channel, total_channels
            )));
        }

        Ok(Self {
            target_channel,
            total_channels,
        })
    }

    /// Extract the target channel from interleaved samples
    pub fn extract_channel<T: Copy>(&self, interleaved_samples: &[T]) -> Vec<T> {
        if self.total_channels == 1 {
            interleaved_samples.to_vec()
        } else {
            interleaved_samples
                .iter()
                .skip(self.target_channel)
                .step_by(self.total_channels)
                .copied()
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_passthrough() {
        let extractor = ChannelExtractor::new(0, 1).unwrap();
        assert_eq!(extractor.extract_channel(&[1i16, 2, 3]), vec![1, 2, 3]);
    }

    #[test]
    fn test_extract_second_of_three() {
        let extractor = ChannelExtractor::new(1, 3).unwrap();
        let interleaved = [0i16, 10, 20, 1, 11, 21, 2, 12, 22];
        assert_eq!(extractor.extract_channel(&interleaved), vec![10, 11, 12]);
    }

    #[test]
    fn test_out_of_range_channel() {
        assert!(ChannelExtractor::new(2, 2).is_err());
    }
}
