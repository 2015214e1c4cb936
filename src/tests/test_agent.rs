use ndarray::{array, Array1, Array3, Array4};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

use crate::agent::{argmax, DqnAgent};
use crate::config::{AgentConfig, TrainerConfig};
use crate::env::{Env, Frame, RenderMode, State, Step, StepInfo};
use crate::error::{CheckpointError, DqnError, Result};
use crate::metrics::TrainingStatistics;
use crate::network::{ConvSpec, DuelingNetConfig, DuelingNetwork, QNetwork};
use crate::recording::FrameSink;
use crate::replay_memory::{Batch, Transition};
use crate::visualization::{NullPlotter, StatsPlotter};

fn tiny_network(seed: u64) -> DuelingNetwork {
    let config = DuelingNetConfig {
        input_shape: [1, 4, 4],
        num_actions: 3,
        conv_layers: vec![ConvSpec::new(2, 3, 1)],
        hidden_sizes: vec![8],
    };
    DuelingNetwork::new(config, &mut StdRng::seed_from_u64(seed)).unwrap()
}

fn agent_config() -> AgentConfig {
    AgentConfig {
        initial_epsilon: 1.0,
        min_epsilon: 0.1,
        nb_warmup: 100,
        memory_capacity: 200,
        batch_size: 2,
        learning_rate: 1e-3,
        gamma: 0.99,
        seed: Some(7),
    }
}

fn trainer_config(dir: &std::path::Path) -> TrainerConfig {
    TrainerConfig {
        checkpoint_dir: dir.to_path_buf(),
        ..TrainerConfig::default()
    }
}

fn state(value: f32) -> State {
    Array3::from_shape_fn((1, 4, 4), |(_, y, x)| value * ((y * 4 + x) % 3) as f32)
}

fn transition(id: usize, done: bool) -> Transition {
    Transition {
        state: state(id as f32 * 0.1),
        action: id % 3,
        reward: 1.0,
        done,
        next_state: state(id as f32 * 0.1 + 0.05),
    }
}

/// Fixed-length episodes of reward 1 per step; optionally fails on a given step.
struct ScriptedEnv {
    episode_len: usize,
    t: usize,
    total_steps: usize,
    fail_at: Option<usize>,
    closed: bool,
}

impl ScriptedEnv {
    fn new(episode_len: usize) -> Self {
        ScriptedEnv { episode_len, t: 0, total_steps: 0, fail_at: None, closed: false }
    }
}

impl Env for ScriptedEnv {
    fn num_actions(&self) -> usize {
        3
    }

    fn reset(&mut self) -> Result<State> {
        self.t = 0;
        Ok(state(0.0))
    }

    fn step(&mut self, action: usize) -> Result<Step> {
        assert!(action < 3);
        self.total_steps += 1;
        if Some(self.total_steps) == self.fail_at {
            return Err(DqnError::environment("emulator crashed"));
        }
        self.t += 1;
        Ok(Step {
            next_state: state(self.t as f32),
            reward: 1.0,
            done: self.t >= self.episode_len,
            info: StepInfo { lives: 1 },
        })
    }

    fn render(&mut self, _mode: RenderMode) -> Result<Frame> {
        Ok(Frame::zeros((2, 2, 3)))
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

#[derive(Default)]
struct CountingSink {
    frames: usize,
    closed: bool,
}

impl FrameSink for CountingSink {
    fn append(&mut self, _frame: &Frame) -> Result<()> {
        self.frames += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

#[derive(Default)]
struct CountingPlotter {
    updates: Vec<usize>,
}

impl StatsPlotter for CountingPlotter {
    fn update(&mut self, stats: &TrainingStatistics) -> Result<()> {
        self.updates.push(stats.episodes());
        Ok(())
    }
}

#[test]
fn test_argmax_prefers_lowest_index() {
    assert_eq!(argmax(array![1.0, 3.0, 3.0].view()), Some(1));
    assert_eq!(argmax(array![2.0, 2.0, 2.0].view()), Some(0));
    assert_eq!(argmax(array![-1.0, -0.5, -3.0].view()), Some(1));
    assert_eq!(argmax(Array1::<f32>::zeros(0).view()), None);
}

#[test]
fn test_target_starts_as_copy() {
    let dir = tempdir().unwrap();
    let agent = DqnAgent::new(tiny_network(0), agent_config(), trainer_config(dir.path())).unwrap();
    assert_eq!(agent.online().state_dict(), agent.target().state_dict());
    assert_eq!(agent.epsilon(), 1.0);
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = tempdir().unwrap();
    let mut config = agent_config();
    config.batch_size = 0;
    assert!(DqnAgent::new(tiny_network(0), config, trainer_config(dir.path())).is_err());
}

#[test]
fn test_memory_too_small_to_ever_learn_is_rejected() {
    let dir = tempdir().unwrap();
    let mut config = agent_config();
    config.memory_capacity = 10;
    config.batch_size = 2;
    let result = DqnAgent::new(tiny_network(0), config.clone(), trainer_config(dir.path()));
    assert!(matches!(result, Err(DqnError::InvalidParameter { .. })));

    // exactly the learning threshold is enough, and training then learns
    config.memory_capacity = 20;
    let mut agent = DqnAgent::new(tiny_network(0), config, trainer_config(dir.path())).unwrap();
    let mut env = ScriptedEnv::new(4);
    agent.train(&mut env, 10, &mut NullPlotter).unwrap();
    assert_eq!(agent.memory().len(), 20);
    assert!(agent.learn_steps() > 0);
}

#[test]
fn test_remember_rejects_unknown_action() {
    let dir = tempdir().unwrap();
    let mut agent = DqnAgent::new(tiny_network(0), agent_config(), trainer_config(dir.path())).unwrap();
    let mut bad = transition(0, false);
    bad.action = 3;
    assert!(matches!(agent.remember(bad), Err(DqnError::InvalidParameter { .. })));
    assert!(agent.memory().is_empty());

    for i in 0..20 {
        agent.remember(transition(i, false)).unwrap();
    }
    assert!(agent.learn_step().is_ok());
}

#[test]
fn test_greedy_action_is_deterministic() {
    let dir = tempdir().unwrap();
    let mut agent = DqnAgent::new(tiny_network(1), agent_config(), trainer_config(dir.path())).unwrap();
    agent.set_epsilon(0.0);

    let s = state(0.7);
    let expected = argmax(agent.q_values(&s).unwrap().view()).unwrap();
    for _ in 0..20 {
        assert_eq!(agent.get_action(&s).unwrap(), expected);
    }
    assert_eq!(agent.greedy_action(&s).unwrap(), expected);
}

#[test]
fn test_full_exploration_covers_every_action() {
    let dir = tempdir().unwrap();
    let mut agent = DqnAgent::new(tiny_network(2), agent_config(), trainer_config(dir.path())).unwrap();
    let s = state(0.3);
    let mut seen = [false; 3];
    for _ in 0..200 {
        seen[agent.get_action(&s).unwrap()] = true;
    }
    assert!(seen.iter().all(|&s| s));
    // acting never touches epsilon
    assert_eq!(agent.epsilon(), 1.0);
}

#[test]
fn test_terminal_target_is_reward() {
    let dir = tempdir().unwrap();
    let agent = DqnAgent::new(tiny_network(3), agent_config(), trainer_config(dir.path())).unwrap();

    let next_states = Array4::from_elem((2, 1, 4, 4), 1000.0);
    let batch = Batch {
        states: Array4::zeros((2, 1, 4, 4)),
        actions: vec![0, 1],
        rewards: array![1.0, -1.0],
        dones: vec![true, true],
        next_states,
    };
    assert_eq!(agent.compute_targets(&batch).unwrap(), array![1.0, -1.0]);
}

#[test]
fn test_non_terminal_target_bootstraps_from_target_network() {
    let dir = tempdir().unwrap();
    let agent = DqnAgent::new(tiny_network(4), agent_config(), trainer_config(dir.path())).unwrap();

    let next = state(0.5);
    let batch = Batch {
        states: Array4::zeros((1, 1, 4, 4)),
        actions: vec![2],
        rewards: array![0.5],
        dones: vec![false],
        next_states: next.clone().insert_axis(ndarray::Axis(0)),
    };
    let next_q = agent.target().forward(batch.next_states.view()).unwrap();
    let best = next_q.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    let targets = agent.compute_targets(&batch).unwrap();
    assert!((targets[0] - (0.5 + 0.99 * best)).abs() < 1e-6);
}

#[test]
fn test_learn_step_trains_online_only_until_sync() {
    let dir = tempdir().unwrap();
    let mut agent = DqnAgent::new(tiny_network(5), agent_config(), trainer_config(dir.path())).unwrap();
    for i in 0..20 {
        agent.remember(transition(i, i % 4 == 0)).unwrap();
    }
    assert!(agent.can_learn());

    let target_before = agent.target().state_dict();
    let loss = agent.learn_step().unwrap();
    assert!(loss.is_finite());
    assert_eq!(agent.learn_steps(), 1);

    assert_eq!(agent.target().state_dict(), target_before);
    assert_ne!(agent.online().state_dict(), agent.target().state_dict());

    agent.sync_target().unwrap();
    assert_eq!(agent.online().state_dict(), agent.target().state_dict());
}

#[test]
fn test_cannot_learn_before_memory_fills() {
    let dir = tempdir().unwrap();
    let mut agent = DqnAgent::new(tiny_network(6), agent_config(), trainer_config(dir.path())).unwrap();
    for i in 0..19 {
        agent.remember(transition(i, false)).unwrap();
    }
    assert!(!agent.can_learn());
    agent.remember(transition(19, false)).unwrap();
    assert!(agent.can_learn());
}

#[test]
fn test_train_runs_periodic_bookkeeping() {
    let dir = tempdir().unwrap();
    let trainer = TrainerConfig {
        checkpoint_every: 2,
        target_sync_every: 3,
        plot_every: 4,
        snapshot_every: 5,
        avg_window: 3,
        checkpoint_dir: dir.path().to_path_buf(),
        ..TrainerConfig::default()
    };
    let mut agent = DqnAgent::new(tiny_network(7), agent_config(), trainer).unwrap();
    let mut env = ScriptedEnv::new(4);
    let mut plotter = CountingPlotter::default();

    let stats = agent.train(&mut env, 10, &mut plotter).unwrap();

    assert_eq!(stats.returns, vec![4.0; 10]);
    assert_eq!(stats.episode_lengths, vec![4; 10]);
    assert_eq!(stats.avg_returns, vec![4.0; 5]);
    assert_eq!(stats.epsilon_checkpoints.len(), 5);
    assert_eq!(plotter.updates, vec![4, 8]);

    // 40 transitions with batch 2: learning starts at the 20th step
    assert_eq!(agent.learn_steps(), 21);
    assert!(stats.episode_losses[..4].iter().all(Option::is_none));
    assert!(stats.episode_losses[5..].iter().all(Option::is_some));

    assert!(dir.path().join("latest.bin").exists());
    assert!(dir.path().join("model_iter_5.bin").exists());
    assert!(dir.path().join("model_iter_10.bin").exists());
    assert!(!dir.path().join("model_iter_4.bin").exists());

    // last sync happened at episode 9, after which the online model kept learning
    assert_ne!(agent.online().state_dict(), agent.target().state_dict());
}

#[test]
fn test_epsilon_decays_once_per_episode() {
    let dir = tempdir().unwrap();
    let mut agent = DqnAgent::new(tiny_network(8), agent_config(), trainer_config(dir.path())).unwrap();
    let decay = agent.epsilon_schedule().decay_factor();
    let mut env = ScriptedEnv::new(3);

    let stats = agent.train(&mut env, 20, &mut NullPlotter).unwrap();

    assert!((agent.epsilon() - decay.powi(20)).abs() < 1e-5);
    assert!((stats.epsilon_checkpoints[0] - decay.powi(20)).abs() < 1e-5);
}

#[test]
fn test_environment_errors_propagate_from_train() {
    let dir = tempdir().unwrap();
    let mut agent = DqnAgent::new(tiny_network(9), agent_config(), trainer_config(dir.path())).unwrap();
    let mut env = ScriptedEnv::new(5);
    env.fail_at = Some(7);

    match agent.train(&mut env, 3, &mut NullPlotter) {
        Err(DqnError::Environment(msg)) => assert_eq!(msg, "emulator crashed"),
        other => panic!("expected environment error, got {:?}", other.map(|s| s.episodes())),
    }
}

#[test]
fn test_evaluation_records_every_step() {
    let dir = tempdir().unwrap();
    let mut agent = DqnAgent::new(tiny_network(10), agent_config(), trainer_config(dir.path())).unwrap();
    let mut env = ScriptedEnv::new(3);
    let mut sink = CountingSink::default();

    agent.test(&mut env, 2, &mut sink).unwrap();

    assert_eq!(sink.frames, 6);
    assert!(sink.closed);
    assert!(env.closed);
    assert!(agent.memory().is_empty());
    assert_eq!(agent.learn_steps(), 0);
}

#[test]
fn test_evaluation_respects_step_limit() {
    let dir = tempdir().unwrap();
    let trainer = TrainerConfig {
        test_max_steps: 2,
        ..trainer_config(dir.path())
    };
    let mut agent = DqnAgent::new(tiny_network(11), agent_config(), trainer).unwrap();
    let mut env = ScriptedEnv::new(10);
    let mut sink = CountingSink::default();

    agent.test(&mut env, 3, &mut sink).unwrap();
    assert_eq!(sink.frames, 6);
}

#[test]
fn test_evaluation_closes_resources_on_error() {
    let dir = tempdir().unwrap();
    let mut agent = DqnAgent::new(tiny_network(12), agent_config(), trainer_config(dir.path())).unwrap();
    let mut env = ScriptedEnv::new(3);
    env.fail_at = Some(2);
    let mut sink = CountingSink::default();

    let result = agent.test(&mut env, 1, &mut sink);

    assert!(matches!(result, Err(DqnError::Environment(_))));
    assert_eq!(sink.frames, 1);
    assert!(sink.closed);
    assert!(env.closed);
}

#[test]
fn test_restore_missing_checkpoint() {
    let dir = tempdir().unwrap();
    let mut agent = DqnAgent::new(tiny_network(13), agent_config(), trainer_config(dir.path())).unwrap();
    let before = agent.online().state_dict();

    let path = dir.path().join("absent.bin");
    assert!(matches!(agent.restore_checkpoint(&path), Err(CheckpointError::NotFound(_))));
    assert!(!agent.try_restore(&path));
    assert_eq!(agent.online().state_dict(), before);
}

#[test]
fn test_restore_saved_checkpoint() {
    let dir = tempdir().unwrap();
    let trained = DqnAgent::new(tiny_network(14), agent_config(), trainer_config(dir.path())).unwrap();
    let path = trained.checkpointer().save_latest(trained.online()).unwrap();

    let mut fresh = DqnAgent::new(tiny_network(15), agent_config(), trainer_config(dir.path())).unwrap();
    assert!(fresh.try_restore(&path));
    assert_eq!(fresh.online().state_dict(), trained.online().state_dict());
    assert_eq!(fresh.target().state_dict(), trained.online().state_dict());
}
