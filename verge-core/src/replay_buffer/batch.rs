//! Transitions and batches of them.

/// A transition `(s, a, r, s', done)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// State in which the action was taken.
    pub state: Vec<f32>,

    /// Action taken.
    pub action: Vec<f32>,

    /// Reward received.
    pub reward: f32,

    /// State after the action.
    pub next_state: Vec<f32>,

    /// `true` if `next_state` is terminal.
    pub done: bool,
}

impl Transition {
    /// Creates a transition.
    pub fn new(
        state: Vec<f32>,
        action: Vec<f32>,
        reward: f32,
        next_state: Vec<f32>,
        done: bool,
    ) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}

/// Transitions stacked field by field.
///
/// `state`, `action` and `next_state` are row-major buffers with one row per
/// transition, ready to be turned into `(batch_size, dim)` tensors.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionBatch {
    /// States, `len() * state_dim` values.
    pub state: Vec<f32>,

    /// Actions, `len() * action_dim` values.
    pub action: Vec<f32>,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Next states, `len() * state_dim` values.
    pub next_state: Vec<f32>,

    /// Terminal flags, 1 if done.
    pub is_done: Vec<i8>,

    /// Dimension of states.
    pub state_dim: usize,

    /// Dimension of actions.
    pub action_dim: usize,

    /// Indices of the sampled transitions in the buffer.
    pub ix_sample: Vec<usize>,
}

impl TransitionBatch {
    /// Stacks the given transitions.
    ///
    /// All transitions are assumed to share the dimensions of the first one.
    pub fn from_transitions<'a>(
        transitions: impl IntoIterator<Item = &'a Transition>,
        ix_sample: Vec<usize>,
    ) -> Self {
        let mut batch = Self {
            state: vec![],
            action: vec![],
            reward: vec![],
            next_state: vec![],
            is_done: vec![],
            state_dim: 0,
            action_dim: 0,
            ix_sample,
        };

        for tr in transitions {
            batch.state_dim = tr.state.len();
            batch.action_dim = tr.action.len();
            batch.state.extend_from_slice(&tr.state);
            batch.action.extend_from_slice(&tr.action);
            batch.reward.push(tr.reward);
            batch.next_state.extend_from_slice(&tr.next_state);
            batch.is_done.push(tr.done as i8);
        }

        batch
    }

    /// The number of transitions in the batch.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch has no transitions.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }

    /// Returns the `i`-th transition of the batch.
    pub fn get(&self, i: usize) -> Option<Transition> {
        if i >= self.len() {
            return None;
        }
        let (sd, ad) = (self.state_dim, self.action_dim);
        Some(Transition {
            state: self.state[i * sd..(i + 1) * sd].to_vec(),
            action: self.action[i * ad..(i + 1) * ad].to_vec(),
            reward: self.reward[i],
            next_state: self.next_state[i * sd..(i + 1) * sd].to_vec(),
            done: self.is_done[i] != 0,
        })
    }
}
