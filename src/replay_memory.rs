use ndarray::{Array1, Array3, Array4, Axis};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

/// Number of stored transitions required per sampled transition before
/// `can_sample` reports true.
pub const DEFAULT_SAMPLE_RATIO: usize = 10;

/// One environment step.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: Array3<f32>,
    pub action: usize,
    pub reward: f32,
    pub done: bool,
    pub next_state: Array3<f32>,
}

/// Transitions regrouped by field, row `i` of every member belonging to the
/// same transition.
#[derive(Clone, Debug)]
pub struct Batch {
    pub states: Array4<f32>,
    pub actions: Vec<usize>,
    pub rewards: Array1<f32>,
    pub dones: Vec<bool>,
    pub next_states: Array4<f32>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Bounded FIFO store of transitions.
///
/// Once full, each insert overwrites the oldest entry. Sampling is uniform
/// without replacement and only allowed once the memory holds
/// `sample_ratio * batch_size` transitions, so early batches are not drawn
/// from a handful of correlated steps.
#[derive(Clone, Debug)]
pub struct ReplayMemory {
    slots: Vec<Transition>,
    capacity: usize,
    /// Next slot to write once `slots` is full
    head: usize,
    sample_ratio: usize,
    rng: StdRng,
}

impl ReplayMemory {
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, StdRng::from_entropy())
    }

    /// Memory whose sampling sequence is reproducible.
    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::with_rng(capacity, StdRng::seed_from_u64(seed))
    }

    fn with_rng(capacity: usize, rng: StdRng) -> Self {
        assert!(capacity > 0, "replay memory capacity must be > 0");
        ReplayMemory {
            slots: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            sample_ratio: DEFAULT_SAMPLE_RATIO,
            rng,
        }
    }

    pub fn with_sample_ratio(mut self, ratio: usize) -> Self {
        self.sample_ratio = ratio.max(1);
        self
    }

    pub fn insert(&mut self, transition: Transition) {
        if self.slots.len() < self.capacity {
            self.slots.push(transition);
        } else {
            self.slots[self.head] = transition;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    pub fn can_sample(&self, batch_size: usize) -> bool {
        self.slots.len() >= self.sample_ratio * batch_size
    }

    /// Draw `batch_size` distinct transitions uniformly at random.
    ///
    /// # Panics
    ///
    /// Panics if `can_sample(batch_size)` is false.
    pub fn sample(&mut self, batch_size: usize) -> Batch {
        assert!(
            batch_size > 0 && self.can_sample(batch_size),
            "not enough transitions to sample: have {}, need {}",
            self.slots.len(),
            self.sample_ratio * batch_size
        );

        let picked: Vec<&Transition> = index::sample(&mut self.rng, self.slots.len(), batch_size)
            .into_iter()
            .map(|i| &self.slots[i])
            .collect();

        let states: Vec<_> = picked.iter().map(|t| t.state.view()).collect();
        let next_states: Vec<_> = picked.iter().map(|t| t.next_state.view()).collect();

        Batch {
            // every stored state comes from the same environment, so stacking
            // can only fail on a caller mixing shapes
            states: ndarray::stack(Axis(0), &states).expect("replay memory holds states of mixed shapes"),
            actions: picked.iter().map(|t| t.action).collect(),
            rewards: picked.iter().map(|t| t.reward).collect(),
            dones: picked.iter().map(|t| t.done).collect(),
            next_states: ndarray::stack(Axis(0), &next_states).expect("replay memory holds states of mixed shapes"),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn sample_ratio(&self) -> usize {
        self.sample_ratio
    }

    /// Stored transitions from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> + '_ {
        let (newer, older) = self.slots.split_at(self.head);
        older.iter().chain(newer.iter())
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
    }
}
