use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::metrics::TrainingStatistics;
use super::text_plots::{plot_average_returns, plot_epsilon};

/// Receives the training record whenever the loop decides to refresh plots.
pub trait StatsPlotter {
    fn update(&mut self, stats: &TrainingStatistics) -> Result<()>;
}

/// Writes ASCII plots of averaged returns and epsilon to
/// `<dir>/plot_<n>.txt`, `n` being the number of checkpoints so far.
#[derive(Debug, Clone)]
pub struct LivePlot {
    dir: PathBuf,
    width: usize,
    height: usize,
    last_written: Option<PathBuf>,
}

impl LivePlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        LivePlot {
            dir: dir.into(),
            width: 72,
            height: 16,
            last_written: None,
        }
    }

    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the most recent plot file
    pub fn last_written(&self) -> Option<&Path> {
        self.last_written.as_deref()
    }
}

impl StatsPlotter for LivePlot {
    fn update(&mut self, stats: &TrainingStatistics) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("plot_{}.txt", stats.num_checkpoints()));

        let mut contents = plot_average_returns(stats, self.width, self.height);
        contents.push('\n');
        contents.push_str(&plot_epsilon(stats, self.width, self.height));
        fs::write(&path, contents)?;

        if let (Some(avg), Some(eps)) = (stats.avg_returns.last(), stats.epsilon_checkpoints.last()) {
            log::info!(
                "Plot updated at {} ({} checkpoints, average return {:.2}, epsilon {:.4})",
                path.display(),
                stats.num_checkpoints(),
                avg,
                eps
            );
        }
        self.last_written = Some(path);
        Ok(())
    }
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPlotter;

impl StatsPlotter for NullPlotter {
    fn update(&mut self, _stats: &TrainingStatistics) -> Result<()> {
        Ok(())
    }
}
