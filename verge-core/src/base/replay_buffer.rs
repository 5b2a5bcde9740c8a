//! Replay buffer interface.
use anyhow::Result;

/// Interface of buffers into which experiences are pushed.
pub trait ExperienceBufferBase {
    /// Items pushed into the buffer.
    type Item;

    /// Pushes an item into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// The number of items in the buffer.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Interface of replay buffers generating batches for training.
pub trait ReplayBufferBase {
    /// Configuration of the replay buffer.
    type Config: Clone;

    /// Batch generated from the buffer.
    type Batch;

    /// Builds a replay buffer from the given configuration.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Constructs a batch of `size` transitions.
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;
}
