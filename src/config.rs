//! Hyperparameters of the three solvers.
//!
//! Defaults: γ = 0.99, threshold = 0.001,
//! α = 0.2 decayed by 0.995 per episode, and 50 Monte Carlo episodes blended
//! with a fixed step size of 0.1.

use crate::error::{Error, Result};

pub const DEFAULT_DISCOUNT_FACTOR: f64 = 0.99;
pub const DEFAULT_THRESHOLD: f64 = 0.001;
pub const DEFAULT_LEARNING_RATE: f64 = 0.2;
pub const DEFAULT_LEARNING_RATE_DECAY: f64 = 0.995;
pub const DEFAULT_EPISODES: usize = 50;
pub const DEFAULT_STEP_SIZE: f64 = 0.1;

fn invalid(message: String) -> Error {
    Error::InvalidConfiguration { message }
}

fn check_discount_factor(discount_factor: f64) -> Result<()> {
    if (0.0..=1.0).contains(&discount_factor) {
        Ok(())
    } else {
        Err(invalid(format!("discount factor {discount_factor} must be in [0, 1]")))
    }
}

fn check_threshold(threshold: f64) -> Result<()> {
    if threshold > 0.0 && threshold.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("threshold {threshold} must be positive")))
    }
}

fn check_unit_rate(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} {value} must be in (0, 1]")))
    }
}

fn check_cap(name: &str, cap: Option<usize>) -> Result<()> {
    match cap {
        Some(0) => Err(invalid(format!("{name} must be at least 1"))),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueIterationConfig {
    pub discount_factor: f64,
    pub threshold: f64,
    /// Sweeps allowed before giving up with `NonConvergence`.
    pub max_sweeps: Option<usize>,
}

impl Default for ValueIterationConfig {
    fn default() -> Self {
        Self {
            discount_factor: DEFAULT_DISCOUNT_FACTOR,
            threshold: DEFAULT_THRESHOLD,
            max_sweeps: None,
        }
    }
}

impl ValueIterationConfig {
    pub fn with_discount_factor(mut self, discount_factor: f64) -> Self {
        self.discount_factor = discount_factor;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_max_sweeps(mut self, max_sweeps: Option<usize>) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_discount_factor(self.discount_factor)?;
        check_threshold(self.threshold)?;
        check_cap("max sweeps", self.max_sweeps)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QLearningConfig {
    pub discount_factor: f64,
    pub learning_rate: f64,
    /// Multiplies the learning rate after every episode.
    pub learning_rate_decay: f64,
    pub threshold: f64,
    /// Episodes allowed before giving up with `NonConvergence`.
    pub max_episodes: Option<usize>,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            discount_factor: DEFAULT_DISCOUNT_FACTOR,
            learning_rate: DEFAULT_LEARNING_RATE,
            learning_rate_decay: DEFAULT_LEARNING_RATE_DECAY,
            threshold: DEFAULT_THRESHOLD,
            max_episodes: None,
        }
    }
}

impl QLearningConfig {
    pub fn with_discount_factor(mut self, discount_factor: f64) -> Self {
        self.discount_factor = discount_factor;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_learning_rate_decay(mut self, learning_rate_decay: f64) -> Self {
        self.learning_rate_decay = learning_rate_decay;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_max_episodes(mut self, max_episodes: Option<usize>) -> Self {
        self.max_episodes = max_episodes;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_discount_factor(self.discount_factor)?;
        check_unit_rate("learning rate", self.learning_rate)?;
        check_unit_rate("learning rate decay", self.learning_rate_decay)?;
        check_threshold(self.threshold)?;
        check_cap("max episodes", self.max_episodes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonteCarloConfig {
    pub episodes: usize,
    /// Fixed blending constant, independent of the visit count.
    pub step_size: f64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            episodes: DEFAULT_EPISODES,
            step_size: DEFAULT_STEP_SIZE,
        }
    }
}

impl MonteCarloConfig {
    pub fn with_episodes(mut self, episodes: usize) -> Self {
        self.episodes = episodes;
        self
    }

    pub fn with_step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.episodes == 0 {
            return Err(invalid("episodes must be at least 1".to_string()));
        }
        check_unit_rate("step size", self.step_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_are_valid() {
        assert!(ValueIterationConfig::default().validate().is_ok());
        assert!(QLearningConfig::default().validate().is_ok());
        assert!(MonteCarloConfig::default().validate().is_ok());
    }

    #[rstest]
    #[case(ValueIterationConfig::default().with_discount_factor(1.5))]
    #[case(ValueIterationConfig::default().with_discount_factor(-0.1))]
    #[case(ValueIterationConfig::default().with_threshold(0.0))]
    #[case(ValueIterationConfig::default().with_max_sweeps(Some(0)))]
    fn rejects_bad_value_iteration_settings(#[case] config: ValueIterationConfig) {
        assert!(matches!(config.validate(), Err(Error::InvalidConfiguration { .. })));
    }

    #[rstest]
    #[case(QLearningConfig::default().with_learning_rate(0.0))]
    #[case(QLearningConfig::default().with_learning_rate(1.2))]
    #[case(QLearningConfig::default().with_learning_rate_decay(0.0))]
    #[case(QLearningConfig::default().with_threshold(-1.0))]
    #[case(QLearningConfig::default().with_max_episodes(Some(0)))]
    fn rejects_bad_q_learning_settings(#[case] config: QLearningConfig) {
        assert!(matches!(config.validate(), Err(Error::InvalidConfiguration { .. })));
    }

    #[rstest]
    #[case(MonteCarloConfig::default().with_episodes(0))]
    #[case(MonteCarloConfig::default().with_step_size(0.0))]
    fn rejects_bad_monte_carlo_settings(#[case] config: MonteCarloConfig) {
        assert!(matches!(config.validate(), Err(Error::InvalidConfiguration { .. })));
    }
}
