//! Simple replay buffer.
use super::{SimpleReplayBufferConfig, Transition, TransitionBatch};
use crate::{error::AgentError, ExperienceBufferBase, ReplayBufferBase};
use anyhow::Result;
use log::trace;
use rand::{rngs::StdRng, seq::index, SeedableRng};

/// A fixed-capacity ring of transitions.
///
/// When the buffer is full, a new transition overwrites the oldest one.
/// Batches are drawn uniformly at random without replacement within a batch.
pub struct SimpleReplayBuffer {
    capacity: usize,
    batch_size: usize,

    // Position of the next write.
    i: usize,
    transitions: Vec<Transition>,

    // (state_dim, action_dim) fixed by the first push.
    dims: Option<(usize, usize)>,
    rng: StdRng,
}

impl SimpleReplayBuffer {
    /// Samples a batch of the configured batch size.
    pub fn sample(&mut self) -> Result<TransitionBatch> {
        self.batch(self.batch_size)
    }

    /// Capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Batch size of [`SimpleReplayBuffer::sample`].
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Iterates over the stored transitions from the oldest to the newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        let (newer, older) = if self.transitions.len() < self.capacity {
            (&self.transitions[..], &self.transitions[..0])
        } else {
            self.transitions.split_at(self.i)
        };
        older.iter().chain(newer.iter())
    }

    fn check_dims(&mut self, tr: &Transition) -> Result<(), AgentError> {
        let (sd, ad) = self.dims.unwrap_or((tr.state.len(), tr.action.len()));
        let mismatch = |name: &str, expected: usize, found: usize| AgentError::ShapeMismatch {
            name: name.to_string(),
            expected: vec![expected],
            found: vec![found],
        };

        if tr.state.len() != sd {
            return Err(mismatch("state", sd, tr.state.len()));
        }
        if tr.next_state.len() != sd {
            return Err(mismatch("next_state", sd, tr.next_state.len()));
        }
        if tr.action.len() != ad {
            return Err(mismatch("action", ad, tr.action.len()));
        }
        self.dims = Some((sd, ad));
        Ok(())
    }
}

impl ExperienceBufferBase for SimpleReplayBuffer {
    type Item = Transition;

    fn push(&mut self, tr: Transition) -> Result<()> {
        self.check_dims(&tr)?;

        if self.transitions.len() < self.capacity {
            self.transitions.push(tr);
        } else {
            self.transitions[self.i] = tr;
        }
        self.i = (self.i + 1) % self.capacity;

        Ok(())
    }

    fn len(&self) -> usize {
        self.transitions.len()
    }
}

impl ReplayBufferBase for SimpleReplayBuffer {
    type Config = SimpleReplayBufferConfig;
    type Batch = TransitionBatch;

    fn build(config: &Self::Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            capacity: config.capacity,
            batch_size: config.batch_size,
            i: 0,
            transitions: vec![],
            dims: None,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    fn batch(&mut self, size: usize) -> Result<TransitionBatch> {
        let len = self.transitions.len();
        if size == 0 || len < size {
            return Err(AgentError::InsufficientData {
                len,
                batch_size: size,
            }
            .into());
        }

        let ixs = index::sample(&mut self.rng, len, size).into_vec();
        trace!("Sampled {} of {} transitions", size, len);
        let transitions = ixs.iter().map(|&ix| &self.transitions[ix]);

        Ok(TransitionBatch::from_transitions(transitions, ixs.clone()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    fn transition(k: usize) -> Transition {
        let v = k as f32;
        Transition::new(vec![v, v], vec![-v], v * 0.1, vec![v + 1.0, v + 1.0], k % 3 == 0)
    }

    fn buffer(capacity: usize, batch_size: usize) -> SimpleReplayBuffer {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = SimpleReplayBufferConfig::default()
            .capacity(capacity)
            .batch_size(batch_size);
        SimpleReplayBuffer::build(&config).unwrap()
    }

    #[test]
    fn test_len_never_exceeds_capacity() -> Result<()> {
        let mut buffer = buffer(5, 2);
        for k in 0..23 {
            buffer.push(transition(k))?;
            assert!(buffer.len() <= buffer.capacity());
            assert_eq!(buffer.len(), (k + 1).min(5));
        }
        Ok(())
    }

    #[test]
    fn test_fifo_eviction() -> Result<()> {
        let capacity = 7;
        for extra in [0, 1, 6, 7, 15] {
            let mut buffer = buffer(capacity, 1);
            for k in 0..capacity + extra {
                buffer.push(transition(k))?;
            }
            let kept: Vec<_> = buffer.iter().cloned().collect();
            let expected: Vec<_> = (extra..capacity + extra).map(transition).collect();
            assert_eq!(kept, expected);
        }
        Ok(())
    }

    #[test]
    fn test_sample_insufficient_data() -> Result<()> {
        let mut buffer = buffer(10, 4);
        for k in 0..3 {
            buffer.push(transition(k))?;
            let err = buffer.sample().unwrap_err();
            assert_eq!(
                err.downcast_ref::<AgentError>(),
                Some(&AgentError::InsufficientData {
                    len: k + 1,
                    batch_size: 4
                })
            );
        }
        Ok(())
    }

    #[test]
    fn test_sample_distinct_transitions() -> Result<()> {
        let mut buffer = buffer(10, 4);
        for k in 0..4 {
            buffer.push(transition(k))?;
        }

        // With exactly batch_size transitions every one of them must be drawn.
        let batch = buffer.sample()?;
        let ixs: HashSet<_> = batch.ix_sample.iter().cloned().collect();
        assert_eq!(ixs, (0..4).collect::<HashSet<_>>());

        for k in 4..25 {
            buffer.push(transition(k))?;
        }
        for _ in 0..50 {
            let batch = buffer.sample()?;
            assert_eq!(batch.len(), 4);
            let ixs: HashSet<_> = batch.ix_sample.iter().cloned().collect();
            assert_eq!(ixs.len(), 4);
        }
        Ok(())
    }

    #[test]
    fn test_batch_is_stacked_by_field() -> Result<()> {
        let mut buffer = buffer(3, 3);
        for k in 0..3 {
            buffer.push(transition(k))?;
        }
        let batch = buffer.sample()?;

        assert_eq!(batch.state_dim, 2);
        assert_eq!(batch.action_dim, 1);
        assert_eq!(batch.state.len(), 6);
        assert_eq!(batch.next_state.len(), 6);
        for (i, &ix) in batch.ix_sample.iter().enumerate() {
            assert_eq!(batch.get(i), Some(transition(ix)));
        }
        assert_eq!(batch.get(3), None);
        Ok(())
    }

    #[test]
    fn test_reject_inconsistent_dims() -> Result<()> {
        let mut buffer = buffer(3, 1);
        buffer.push(transition(0))?;
        let bad = Transition::new(vec![0.0; 3], vec![0.0], 0.0, vec![0.0; 3], false);
        let err = buffer.push(bad).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AgentError>(),
            Some(AgentError::ShapeMismatch { .. })
        ));
        assert_eq!(buffer.len(), 1);
        Ok(())
    }

    #[test]
    fn test_invalid_config() {
        let config = SimpleReplayBufferConfig::default().capacity(3).batch_size(4);
        assert!(SimpleReplayBuffer::build(&config).is_err());
        let config = SimpleReplayBufferConfig::default().batch_size(0);
        assert!(SimpleReplayBuffer::build(&config).is_err());
    }

    #[test]
    fn test_config_yaml() -> Result<()> {
        let dir = tempdir::TempDir::new("replay_buffer")?;
        let path = dir.path().join("replay_buffer.yaml");
        let config = SimpleReplayBufferConfig::default()
            .capacity(100)
            .batch_size(8)
            .seed(7);
        config.save(&path)?;
        assert_eq!(SimpleReplayBufferConfig::load(&path)?, config);
        Ok(())
    }
}
