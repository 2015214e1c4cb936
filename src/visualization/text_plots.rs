use crate::metrics::TrainingStatistics;

/// Plot the averaged returns of every checkpoint as ASCII art
pub fn plot_average_returns(stats: &TrainingStatistics, width: usize, height: usize) -> String {
    if stats.avg_returns.is_empty() {
        return "No average return data available".to_string();
    }
    plot_series(&stats.avg_returns, "Average Returns", width, height)
}

/// Plot the exploration rate of every checkpoint as ASCII art
pub fn plot_epsilon(stats: &TrainingStatistics, width: usize, height: usize) -> String {
    if stats.epsilon_checkpoints.is_empty() {
        return "No epsilon data available".to_string();
    }
    plot_series(&stats.epsilon_checkpoints, "Epsilon", width, height)
}

/// Generic series plotter
pub fn plot_series(values: &[f32], title: &str, width: usize, height: usize) -> String {
    if values.is_empty() || width < 10 || height < 5 {
        return format!("{}: Invalid data or dimensions", title);
    }

    let min_val = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max_val = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    if (max_val - min_val).abs() < f32::EPSILON {
        return format!("{}: All values are {:.4}", title, min_val);
    }

    let mut plot = vec![vec![' '; width]; height];

    // Axes
    for row in plot.iter_mut() {
        row[0] = '|';
    }
    for j in 0..width {
        plot[height - 1][j] = '-';
    }
    plot[height - 1][0] = '+';

    let x_scale = (values.len().max(2) - 1) as f32 / (width - 3) as f32;
    let y_scale = (height - 3) as f32 / (max_val - min_val);

    for (i, &value) in values.iter().enumerate() {
        let x = ((i as f32 / x_scale) as usize + 2).min(width - 1);
        let offset = ((value - min_val) * y_scale) as usize;
        let y = (height - 3).saturating_sub(offset).min(height - 2);
        plot[y][x] = '*';
    }

    let mut output = format!("{}\n", title);
    output.push_str(&format!("Max: {:.4}\n", max_val));

    for row in plot.iter() {
        output.push_str(&row.iter().collect::<String>());
        output.push('\n');
    }

    output.push_str(&format!("Min: {:.4}\n", min_val));
    output.push_str(&format!("Points: {}\n", values.len()));

    output
}

/// Display training progress
pub fn training_progress(
    episode: usize,
    total_episodes: usize,
    avg_return: f32,
    epsilon: f32,
) -> String {
    let progress = if total_episodes == 0 { 1.0 } else { (episode as f32 / total_episodes as f32).min(1.0) };
    let bar_length = 30;
    let filled = (progress * bar_length as f32) as usize;
    let bar = format!("[{}{}]", "=".repeat(filled), " ".repeat(bar_length - filled));

    format!(
        "Episode {}/{} {} {:.1}% | Avg Return: {:.2} | ε: {:.3}",
        episode, total_episodes, bar, progress * 100.0, avg_return, epsilon
    )
}

/// Create a summary table of a training run
pub fn statistics_summary(stats: &TrainingStatistics) -> String {
    let mut output = String::new();
    output.push_str("Training Summary\n");
    output.push_str("================\n");
    output.push_str(&format!("Episodes: {}\n", stats.episodes()));

    if !stats.returns.is_empty() {
        output.push_str(&format!("Returns: {}\n", stats.return_summary()));
    }

    if let (Some(avg), Some(eps)) = (stats.avg_returns.last(), stats.epsilon_checkpoints.last()) {
        output.push_str(&format!("Last checkpoint: Average Return={:.2}, Epsilon={:.4}\n", avg, eps));
    }

    if !stats.episode_lengths.is_empty() {
        let avg_length = stats.episode_lengths.iter().sum::<usize>() / stats.episode_lengths.len();
        output.push_str(&format!("Episode Length: Average={}\n", avg_length));
    }

    let losses: Vec<f32> = stats.episode_losses.iter().flatten().copied().collect();
    if !losses.is_empty() {
        let avg_loss = losses.iter().sum::<f32>() / losses.len() as f32;
        output.push_str(&format!("Loss: Last={:.4}, Average={:.4}\n", losses[losses.len() - 1], avg_loss));
    }

    output
}
