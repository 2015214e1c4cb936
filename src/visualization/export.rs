use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::metrics::TrainingStatistics;

/// Export per-episode statistics to CSV.
///
/// One row per episode; checkpoint columns are filled on the episodes that
/// closed a checkpoint window of `checkpoint_every` episodes and left empty
/// otherwise.
pub fn export_statistics_csv(stats: &TrainingStatistics, checkpoint_every: usize, path: impl AsRef<Path>) -> Result<()> {
    let mut file = std::fs::File::create(path)?;

    writeln!(file, "episode,return,length,loss,avg_return,epsilon")?;

    for (i, episode_return) in stats.returns.iter().enumerate() {
        let episode = i + 1;
        let length = stats.episode_lengths.get(i).copied().unwrap_or(0);
        let loss = stats
            .episode_losses
            .get(i)
            .copied()
            .flatten()
            .map(|l| l.to_string())
            .unwrap_or_default();

        let checkpoint = if checkpoint_every > 0 && episode % checkpoint_every == 0 {
            Some(episode / checkpoint_every - 1)
        } else {
            None
        };
        let (avg, epsilon) = checkpoint
            .and_then(|c| Some((stats.avg_returns.get(c)?, stats.epsilon_checkpoints.get(c)?)))
            .map(|(a, e)| (a.to_string(), e.to_string()))
            .unwrap_or_default();

        writeln!(file, "{},{},{},{},{},{}", episode, episode_return, length, loss, avg, epsilon)?;
    }

    Ok(())
}

/// Export the whole record in JSON format
pub fn export_statistics_json(stats: &TrainingStatistics, path: impl AsRef<Path>) -> Result<()> {
    stats.save(path)
}
