//! Audio output trait and error types.

use thiserror::Error;

use crate::block_ring::BlockConsumer;

/// Error type for audio operations.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("device init error: {0}")]
    DeviceInit(String),
    #[error("stream create error: {0}")]
    StreamCreate(String),
    #[error("playback error: {0}")]
    Playback(String),
    #[error("no audio device available")]
    NoDevice,
}

/// Trait for audio output backends.
///
/// A backend pulls finished blocks from a [`BlockConsumer`] on its own
/// real-time thread.
pub trait AudioOutput {
    fn sample_rate(&self) -> u32;

    /// Start pulling blocks from `consumer`.
    fn start(&mut self, consumer: BlockConsumer) -> Result<(), AudioError>;

    /// Stop playback and release the consumer.
    fn stop(&mut self) -> Result<(), AudioError>;
}
