//! Catch: balls fall from the top row of a grid one cell per step and a
//! paddle on the bottom row has to be under them when they land.

use ndarray::Array3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{DqnError, Result};
use crate::network::{ConvSpec, DuelingNetConfig};
use super::{Env, Frame, RenderMode, State, Step, StepInfo};

/// Move left, stay, move right.
pub const NUM_ACTIONS: usize = 3;

const BALL_COLOR: [u8; 3] = [236, 64, 64];
const PADDLE_COLOR: [u8; 3] = [220, 220, 220];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatchConfig {
    pub height: usize,
    pub width: usize,
    pub paddle_width: usize,
    pub lives: u32,
    /// The episode ends once this many balls have landed
    pub balls_per_episode: usize,
    /// Pixels per grid cell in rendered frames
    pub render_scale: usize,
    pub seed: Option<u64>,
}

impl Default for CatchConfig {
    fn default() -> Self {
        CatchConfig {
            height: 12,
            width: 12,
            paddle_width: 2,
            lives: 3,
            balls_per_episode: 10,
            render_scale: 8,
            seed: None,
        }
    }
}

impl CatchConfig {
    pub fn state_shape(&self) -> [usize; 3] {
        [1, self.height, self.width]
    }

    /// A network sized for this board.
    pub fn network_config(&self) -> DuelingNetConfig {
        DuelingNetConfig {
            input_shape: self.state_shape(),
            num_actions: NUM_ACTIONS,
            conv_layers: vec![ConvSpec::new(16, 3, 1), ConvSpec::new(32, 3, 2)],
            hidden_sizes: vec![128],
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.height < 2 {
            return Err(DqnError::invalid_parameter("height", "must be >= 2"));
        }
        if self.width == 0 || self.paddle_width == 0 || self.paddle_width > self.width {
            return Err(DqnError::invalid_parameter(
                "paddle_width".to_string(),
                format!("must be in [1, width={}], got {}", self.width, self.paddle_width),
            ));
        }
        if self.lives == 0 {
            return Err(DqnError::invalid_parameter("lives", "must be > 0"));
        }
        if self.balls_per_episode == 0 {
            return Err(DqnError::invalid_parameter("balls_per_episode", "must be > 0"));
        }
        if self.render_scale == 0 {
            return Err(DqnError::invalid_parameter("render_scale", "must be > 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    NeedsReset,
    Running,
    Closed,
}

#[derive(Debug, Clone)]
pub struct Catch {
    config: CatchConfig,
    rng: StdRng,
    /// Leftmost paddle column
    paddle: usize,
    ball: (usize, usize),
    lives: u32,
    balls_landed: usize,
    phase: Phase,
}

impl Catch {
    pub fn new(config: CatchConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Catch {
            paddle: (config.width - config.paddle_width) / 2,
            ball: (0, 0),
            lives: config.lives,
            balls_landed: 0,
            phase: Phase::NeedsReset,
            config,
            rng,
        })
    }

    pub fn config(&self) -> &CatchConfig {
        &self.config
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    fn drop_ball(&mut self) {
        self.ball = (0, self.rng.gen_range(0..self.config.width));
    }

    fn under_paddle(&self, column: usize) -> bool {
        (self.paddle..self.paddle + self.config.paddle_width).contains(&column)
    }

    fn observe(&self) -> State {
        let mut state = Array3::zeros((1, self.config.height, self.config.width));
        let bottom = self.config.height - 1;
        for x in self.paddle..self.paddle + self.config.paddle_width {
            state[[0, bottom, x]] = 1.0;
        }
        state[[0, self.ball.0, self.ball.1]] = 1.0;
        state
    }

    fn ensure_open(&self) -> Result<()> {
        if self.phase == Phase::Closed {
            return Err(DqnError::environment("environment is closed"));
        }
        Ok(())
    }
}

impl Env for Catch {
    fn num_actions(&self) -> usize {
        NUM_ACTIONS
    }

    fn reset(&mut self) -> Result<State> {
        self.ensure_open()?;
        self.paddle = (self.config.width - self.config.paddle_width) / 2;
        self.lives = self.config.lives;
        self.balls_landed = 0;
        self.drop_ball();
        self.phase = Phase::Running;
        Ok(self.observe())
    }

    fn step(&mut self, action: usize) -> Result<Step> {
        self.ensure_open()?;
        if self.phase != Phase::Running {
            return Err(DqnError::environment("step called before reset or after the episode ended"));
        }
        match action {
            0 => self.paddle = self.paddle.saturating_sub(1),
            1 => {}
            2 => self.paddle = (self.paddle + 1).min(self.config.width - self.config.paddle_width),
            _ => {
                return Err(DqnError::environment(format!(
                    "action {} out of range for {} actions",
                    action, NUM_ACTIONS
                )))
            }
        }

        self.ball.0 += 1;
        let mut reward = 0.0;
        if self.ball.0 == self.config.height - 1 {
            if self.under_paddle(self.ball.1) {
                reward = 1.0;
            } else {
                reward = -1.0;
                self.lives -= 1;
            }
            self.balls_landed += 1;
        }

        let done = self.lives == 0 || self.balls_landed >= self.config.balls_per_episode;
        let next_state = self.observe();
        if done {
            self.phase = Phase::NeedsReset;
        } else if self.ball.0 == self.config.height - 1 {
            self.drop_ball();
        }

        Ok(Step {
            next_state,
            reward,
            done,
            info: StepInfo { lives: self.lives },
        })
    }

    fn render(&mut self, mode: RenderMode) -> Result<Frame> {
        self.ensure_open()?;
        match mode {
            RenderMode::RgbArray => {
                let scale = self.config.render_scale;
                let state = self.observe();
                let bottom = self.config.height - 1;
                Ok(Frame::from_shape_fn(
                    (self.config.height * scale, self.config.width * scale, 3),
                    |(py, px, c)| {
                        let (y, x) = (py / scale, px / scale);
                        if state[[0, y, x]] == 0.0 {
                            0
                        } else if (y, x) == self.ball {
                            BALL_COLOR[c]
                        } else if y == bottom {
                            PADDLE_COLOR[c]
                        } else {
                            0
                        }
                    },
                ))
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        self.phase = Phase::Closed;
        Ok(())
    }
}
