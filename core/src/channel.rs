//! Channel configuration for streaming completions out of a batch

use tokio::sync::mpsc;

use crate::result::TaskResult;

/// Buffer sizes for completion channels
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Completion channel buffer size (orchestrator -> observer)
    pub completion_buffer: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            completion_buffer: 1_000,
        }
    }
}

impl ChannelConfig {
    /// Set the completion buffer size
    pub fn with_completion_buffer(mut self, size: usize) -> Self {
        self.completion_buffer = size;
        self
    }

    /// Create a completion channel; the sender is usable as a
    /// [`CompletionSink`](crate::sink::CompletionSink) and drops
    /// notifications once `completion_buffer` results are waiting
    pub fn completion_channel(&self) -> (mpsc::Sender<TaskResult>, mpsc::Receiver<TaskResult>) {
        mpsc::channel(self.completion_buffer.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_config_default() {
        let config = ChannelConfig::default();
        assert_eq!(config.completion_buffer, 1_000);
    }

    #[test]
    fn test_channel_config_builder() {
        let config = ChannelConfig::default().with_completion_buffer(16);
        assert_eq!(config.completion_buffer, 16);
        let (tx, _rx) = config.completion_channel();
        assert_eq!(tx.max_capacity(), 16);
    }
}
