use rand::Rng;
use tracing::{debug, info};

use super::episode::{generate_episode, Step};
use crate::config::MonteCarloConfig;
use crate::env::{Mdp, State};
use crate::error::Result;
use crate::observer::{Observer, ValueUpdate};
use crate::policy::ValueTable;

#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloResult {
    pub values: ValueTable,
    /// First visits per state, summed over all episodes.
    pub visits: Vec<usize>,
    /// Undiscounted return of every episode.
    pub episode_rewards: Vec<f64>,
}

impl MonteCarloResult {
    pub fn average_reward(&self) -> f64 {
        match self.episode_rewards.len() {
            0 => 0.0,
            n => self.episode_rewards.iter().sum::<f64>() / n as f64,
        }
    }

    pub fn min_reward(&self) -> f64 {
        self.episode_rewards
            .iter()
            .copied()
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    pub fn max_reward(&self) -> f64 {
        self.episode_rewards
            .iter()
            .copied()
            .reduce(f64::max)
            .unwrap_or(0.0)
    }
}

fn is_first_visit(state: State, index: usize, steps: &[Step]) -> bool {
    !steps[..index].iter().any(|s| s.state == state)
}

/// Walks `steps` backwards accumulating the undiscounted return and blends it
/// into the first visit of every state with a constant `step_size`.
/// Returns the applied updates in the order they were made.
pub fn update_from_episode(
    values: &mut ValueTable,
    visits: &mut [usize],
    steps: &[Step],
    step_size: f64,
) -> Result<Vec<ValueUpdate>> {
    let mut updates: Vec<ValueUpdate> = vec![];
    let mut episode_return: f64 = 0.0;
    for (index, step) in steps.iter().enumerate().rev() {
        episode_return += step.reward;
        if !is_first_visit(step.state, index, steps) {
            continue;
        }
        if let Some(count) = visits.get_mut(step.state) {
            *count += 1;
        }
        let previous: f64 = values.get(step.state);
        let value: f64 = previous + step_size * (episode_return - previous);
        values.set(step.state, value)?;
        updates.push(ValueUpdate {
            state: step.state,
            episode_return,
            previous,
            value,
        });
    }
    Ok(updates)
}

/// First-visit evaluation of the equiprobable policy. There is no
/// convergence test; exactly `episodes` rollouts are made.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonteCarlo {
    config: MonteCarloConfig,
}

impl MonteCarlo {
    pub fn new(config: MonteCarloConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    pub fn evaluate<R, O>(&self, mdp: &Mdp, rng: &mut R, observer: &mut O) -> Result<MonteCarloResult>
    where
        R: Rng + ?Sized,
        O: Observer + ?Sized,
    {
        self.config.validate()?;
        let mut values: ValueTable = ValueTable::zeros(mdp.len());
        let mut visits: Vec<usize> = vec![0; mdp.len()];
        let mut episode_rewards: Vec<f64> = Vec::with_capacity(self.config.episodes);

        for episode in 1..=self.config.episodes {
            let steps: Vec<Step> = generate_episode(mdp, rng)?;
            let updates = update_from_episode(&mut values, &mut visits, &steps, self.config.step_size)?;
            let total: f64 = steps.iter().map(|s| s.reward).sum();
            episode_rewards.push(total);
            observer.on_mc_episode(mdp, episode, &steps, &updates);
            debug!(episode, steps = steps.len(), total_reward = total, "monte carlo episode done");
        }

        let result = MonteCarloResult {
            values,
            visits,
            episode_rewards,
        };
        info!(
            episodes = self.config.episodes,
            average_reward = result.average_reward(),
            "monte carlo evaluation finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::student_mdp;
    use crate::error::Error;
    use crate::observer::{Event, Recorder, Silent};
    use float_eq::assert_float_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn step(state: State, reward: f64) -> Step {
        Step {
            state,
            action: 0,
            reward,
        }
    }

    #[test]
    fn only_the_first_visit_counts() {
        let mut values = ValueTable::zeros(3);
        let mut visits = vec![0; 3];
        let steps = [step(0, 1.0), step(1, 2.0), step(0, 3.0), step(2, 4.0)];
        let updates = update_from_episode(&mut values, &mut visits, &steps, 0.1).unwrap();

        assert_eq!(visits, vec![1, 1, 1]);
        assert_eq!(updates.len(), 3);
        assert_float_eq!(values.to_vec(), vec![1.0, 0.9, 0.4], abs_all <= 1e-12);
        assert_float_eq!(updates.last().unwrap().episode_return, 10.0, abs <= 1e-12);
    }

    #[test]
    fn blends_with_a_fixed_step_size() {
        let mut values = ValueTable::from_vec(vec![5.0]);
        let mut visits = vec![7];
        let updates = update_from_episode(&mut values, &mut visits, &[step(0, 1.0)], 0.1).unwrap();
        assert_float_eq!(values.get(0), 5.0 + 0.1 * (1.0 - 5.0), abs <= 1e-12);
        assert_eq!(visits, vec![8]);
        assert_eq!(updates[0].previous, 5.0);
    }

    #[test]
    fn single_episode_values_are_a_tenth_of_the_return() {
        let mdp = student_mdp().unwrap();
        let mut recorder = Recorder::default();
        let config = MonteCarloConfig::default().with_episodes(1);
        let result = MonteCarlo::new(config)
            .evaluate(&mdp, &mut StdRng::seed_from_u64(21), &mut recorder)
            .unwrap();

        let steps = match recorder.events.as_slice() {
            [Event::McEpisode { steps, .. }] => steps.clone(),
            other => panic!("unexpected events {other:?}"),
        };
        let mut tail_return = 0.0;
        for s in steps.iter().rev() {
            tail_return += s.reward;
            assert_float_eq!(result.values.get(s.state), 0.1 * tail_return, abs <= 1e-12);
            assert_eq!(result.visits[s.state], 1);
        }
        assert_float_eq!(result.episode_rewards, vec![tail_return], abs_all <= 1e-12);
        let unvisited = mdp.states().filter(|s| steps.iter().all(|st| st.state != *s));
        for s in unvisited {
            assert_eq!(result.values.get(s), 0.0);
            assert_eq!(result.visits[s], 0);
        }
    }

    #[test]
    fn runs_exactly_the_configured_episodes() {
        let mdp = student_mdp().unwrap();
        let result = MonteCarlo::default()
            .evaluate(&mdp, &mut StdRng::seed_from_u64(8), &mut Silent)
            .unwrap();
        assert_eq!(result.episode_rewards.len(), 50);
        assert_eq!(result.visits[mdp.initial()], 50);
        assert!(result.min_reward() <= result.average_reward());
        assert!(result.average_reward() <= result.max_reward());
    }

    #[test]
    fn same_seed_same_estimate() {
        let mdp = student_mdp().unwrap();
        let run = |seed| {
            MonteCarlo::default()
                .evaluate(&mdp, &mut StdRng::seed_from_u64(seed), &mut Silent)
                .unwrap()
        };
        assert_eq!(run(4), run(4));
    }

    #[test]
    fn reward_summary_of_nothing_is_zero() {
        let result = MonteCarloResult {
            values: ValueTable::zeros(0),
            visits: vec![],
            episode_rewards: vec![],
        };
        assert_eq!(result.average_reward(), 0.0);
        assert_eq!(result.min_reward(), 0.0);
        assert_eq!(result.max_reward(), 0.0);
    }

    #[test]
    fn rejects_zero_episodes() {
        let mdp = student_mdp().unwrap();
        let config = MonteCarloConfig::default().with_episodes(0);
        let err = MonteCarlo::new(config)
            .evaluate(&mdp, &mut StdRng::seed_from_u64(0), &mut Silent)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));
    }
}
