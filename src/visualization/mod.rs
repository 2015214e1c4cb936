pub mod text_plots;
pub mod export;
pub mod plotter;

pub use text_plots::{plot_series, plot_average_returns, plot_epsilon, training_progress, statistics_summary};
pub use export::{export_statistics_csv, export_statistics_json};
pub use plotter::{StatsPlotter, LivePlot, NullPlotter};
