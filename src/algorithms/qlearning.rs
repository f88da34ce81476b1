use rand::Rng;
use tracing::{debug, info, warn};

use super::episode::equiprobable_step;
use crate::config::QLearningConfig;
use crate::env::{Mdp, Outcome, State};
use crate::error::{Error, Result};
use crate::observer::{Observer, QUpdate};
use crate::policy::{Policy, QTable};

#[derive(Debug, Clone, PartialEq)]
pub struct QLearningResult {
    pub q_values: QTable,
    pub policy: Policy,
    pub episodes: usize,
    /// Learning rate after the last decay.
    pub learning_rate: f64,
    /// Largest `|ΔQ|` of every episode, in order.
    pub max_changes: Vec<f64>,
}

/// Off-policy TD control driven by the equiprobable behaviour policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct QLearning {
    config: QLearningConfig,
}

impl QLearning {
    pub fn new(config: QLearningConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }

    /// Runs episodes until one of them changes no Q-value by more than the
    /// threshold. Each step draws the action first, then the branch.
    pub fn train<R, O>(&self, mdp: &Mdp, rng: &mut R, observer: &mut O) -> Result<QLearningResult>
    where
        R: Rng + ?Sized,
        O: Observer + ?Sized,
    {
        self.config.validate()?;
        let gamma: f64 = self.config.discount_factor;
        let mut q_values: QTable = QTable::new(mdp, 0.0);
        let mut learning_rate: f64 = self.config.learning_rate;
        let mut max_changes: Vec<f64> = vec![];

        loop {
            let episode: usize = max_changes.len() + 1;
            let mut max_change: f64 = 0.0;
            let mut state: State = mdp.initial();
            loop {
                let (action, outcome, reward) = equiprobable_step(mdp, state, rng)?;
                let previous: f64 = q_values.get(state, action)?;
                let max_next: f64 = q_values.max(outcome);
                let value: f64 = q_values.update(state, action, learning_rate, reward + gamma * max_next)?;
                max_change = max_change.max((value - previous).abs());
                observer.on_q_update(
                    mdp,
                    episode,
                    &QUpdate {
                        state,
                        action,
                        reward,
                        outcome,
                        previous,
                        max_next,
                        value,
                    },
                );
                match outcome {
                    Outcome::Continue(next) => state = next,
                    Outcome::Ended => break,
                }
            }

            learning_rate *= self.config.learning_rate_decay;
            max_changes.push(max_change);
            observer.on_q_episode_end(mdp, episode, max_change, learning_rate);
            debug!(episode, max_change, learning_rate, "q-learning episode done");

            if max_change < self.config.threshold {
                break;
            }
            if let Some(cap) = self.config.max_episodes {
                if episode >= cap {
                    warn!(episode, max_change, "q-learning hit its episode cap");
                    return Err(Error::NonConvergence {
                        iterations: episode,
                        max_change,
                    });
                }
            }
        }

        let policy: Policy = q_values.policy(mdp)?;
        info!(episodes = max_changes.len(), learning_rate, "q-learning converged");
        Ok(QLearningResult {
            q_values,
            policy,
            episodes: max_changes.len(),
            learning_rate,
            max_changes,
        })
    }
}
