use crate::env::{Env, RenderMode};
use crate::error::Result;
use crate::metrics::TrainingStatistics;
use crate::network::QNetwork;
use crate::recording::FrameSink;
use crate::replay_memory::Transition;
use crate::visualization::{training_progress, StatsPlotter};
use super::dqn::DqnAgent;

impl<M: QNetwork> DqnAgent<M> {
    /// Train for exactly `epochs` episodes.
    ///
    /// Every step is stored in the replay memory and, once the memory is
    /// large enough, followed by one learn step. After each episode the
    /// exploration rate decays and the periodic bookkeeping of
    /// [`TrainerConfig`](crate::config::TrainerConfig) runs. Environment errors
    /// abort training and are returned unchanged.
    pub fn train<E, P>(&mut self, env: &mut E, epochs: usize, plotter: &mut P) -> Result<TrainingStatistics>
    where
        E: Env + ?Sized,
        P: StatsPlotter + ?Sized,
    {
        let mut stats = TrainingStatistics::new();

        for epoch in 1..=epochs {
            let mut state = env.reset()?;
            let mut done = false;
            let mut episode_return = 0.0;
            let mut steps = 0;
            let (mut loss_sum, mut loss_count) = (0.0, 0usize);

            while !done {
                let action = self.get_action(&state)?;
                let step = env.step(action)?;

                let previous = std::mem::replace(&mut state, step.next_state);
                self.remember(Transition {
                    state: previous,
                    action,
                    reward: step.reward,
                    done: step.done,
                    next_state: state.clone(),
                })?;

                if self.can_learn() {
                    loss_sum += self.learn_step()?;
                    loss_count += 1;
                }

                episode_return += step.reward;
                done = step.done;
                steps += 1;
            }

            let mean_loss = (loss_count > 0).then(|| loss_sum / loss_count as f32);
            stats.record_episode(episode_return, steps, mean_loss);
            self.decay_epsilon();
            self.end_of_episode(epoch, epochs, &mut stats, plotter)?;
        }

        Ok(stats)
    }

    fn end_of_episode<P>(
        &mut self,
        epoch: usize,
        epochs: usize,
        stats: &mut TrainingStatistics,
        plotter: &mut P,
    ) -> Result<()>
    where
        P: StatsPlotter + ?Sized,
    {
        let trainer = self.trainer.clone();

        if epoch % trainer.checkpoint_every == 0 {
            self.checkpointer.save_latest(self.online())?;
            let epsilon = self.epsilon();
            let average = stats.checkpoint(trainer.avg_window, epsilon);
            if stats.episodes() > trainer.avg_window {
                log::info!("Epoch: {} - Average Return: {:.3} - Epsilon: {:.4}", epoch, average, epsilon);
            } else {
                log::info!(
                    "Epoch: {} - Episode Return: {:.3} - Epsilon: {:.4}",
                    epoch,
                    stats.last_return().unwrap_or(0.0),
                    epsilon
                );
            }
            log::debug!("{}", training_progress(epoch, epochs, average, epsilon));
        }

        if epoch % trainer.target_sync_every == 0 {
            self.sync_target()?;
            log::debug!("Target network synchronized at epoch {}", epoch);
        }

        if epoch % trainer.plot_every == 0 {
            plotter.update(stats)?;
        }

        if epoch % trainer.snapshot_every == 0 {
            let path = self.checkpointer.save_snapshot(self.online(), epoch)?;
            log::info!("Saved snapshot {}", path.display());
        }

        Ok(())
    }

    /// Play `games` episodes without learning, sending a rendered frame of
    /// every step to `sink`.
    ///
    /// An episode stops when it is done or after `test_max_steps` steps. The
    /// environment and the sink are closed afterwards even if a game failed;
    /// the first error encountered is returned.
    pub fn test<E, S>(&mut self, env: &mut E, games: usize, sink: &mut S) -> Result<()>
    where
        E: Env + ?Sized,
        S: FrameSink + ?Sized,
    {
        let played = self.play_games(env, games, sink);
        let env_closed = env.close();
        let sink_closed = sink.close();
        played?;
        env_closed?;
        sink_closed
    }

    fn play_games<E, S>(&mut self, env: &mut E, games: usize, sink: &mut S) -> Result<()>
    where
        E: Env + ?Sized,
        S: FrameSink + ?Sized,
    {
        for game in 1..=games {
            let mut state = env.reset()?;
            let mut game_return = 0.0;

            for _ in 0..self.trainer.test_max_steps {
                let action = self.get_action(&state)?;
                let step = env.step(action)?;
                sink.append(&env.render(RenderMode::RgbArray)?)?;

                state = step.next_state;
                game_return += step.reward;
                if step.done {
                    break;
                }
            }
            log::info!("Game {} - Return: {:.3}", game, game_return);
        }
        Ok(())
    }
}
