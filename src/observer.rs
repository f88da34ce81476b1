//! Hooks for watching the solvers work.
//!
//! Every solver reports to an [`Observer`] after each sweep, transition or
//! episode. Observers only read; a [`Silent`] observer gives the same results
//! as any other.

use enum_dispatch::enum_dispatch;
use tracing::debug;

use crate::algorithms::Step;
use crate::env::{Action, Mdp, Outcome, State};

/// One state's recomputation inside a value-iteration sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct StateUpdate {
    pub state: State,
    pub previous: f64,
    pub action_values: Vec<f64>,
    pub best_action: Action,
    pub value: f64,
}

/// One Q-learning update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QUpdate {
    pub state: State,
    pub action: Action,
    pub reward: f64,
    pub outcome: Outcome,
    pub previous: f64,
    pub max_next: f64,
    pub value: f64,
}

/// One first-visit Monte Carlo blend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueUpdate {
    pub state: State,
    pub episode_return: f64,
    pub previous: f64,
    pub value: f64,
}

#[enum_dispatch]
pub trait Observer {
    fn on_sweep(&mut self, _mdp: &Mdp, _sweep: usize, _updates: &[StateUpdate], _max_change: f64) {}

    fn on_q_update(&mut self, _mdp: &Mdp, _episode: usize, _update: &QUpdate) {}

    fn on_q_episode_end(&mut self, _mdp: &Mdp, _episode: usize, _max_change: f64, _learning_rate: f64) {}

    fn on_mc_episode(&mut self, _mdp: &Mdp, _episode: usize, _steps: &[Step], _updates: &[ValueUpdate]) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Observer for Silent {}

/// Narrates every step as `debug` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_sweep(&mut self, mdp: &Mdp, sweep: usize, updates: &[StateUpdate], max_change: f64) {
        for update in updates {
            let action_values: Vec<String> = update
                .action_values
                .iter()
                .enumerate()
                .map(|(a, v)| format!("{}: {:.3}", mdp.action_name(update.state, a), v))
                .collect();
            debug!(
                sweep,
                state = mdp.name(update.state),
                previous = format_args!("{:.3}", update.previous),
                action_values = %action_values.join(", "),
                best_action = mdp.action_name(update.state, update.best_action),
                value = format_args!("{:.3}", update.value),
                "state updated"
            );
        }
        debug!(sweep, max_change = format_args!("{:.3}", max_change), "sweep finished");
    }

    fn on_q_update(&mut self, mdp: &Mdp, episode: usize, update: &QUpdate) {
        debug!(
            episode,
            state = mdp.name(update.state),
            action = mdp.action_name(update.state, update.action),
            previous = format_args!("{:.3}", update.previous),
            reward = update.reward,
            max_next = format_args!("{:.3}", update.max_next),
            value = format_args!("{:.3}", update.value),
            "q-value updated"
        );
    }

    fn on_q_episode_end(&mut self, _mdp: &Mdp, episode: usize, max_change: f64, learning_rate: f64) {
        debug!(
            episode,
            max_change = format_args!("{:.3}", max_change),
            learning_rate = format_args!("{:.3}", learning_rate),
            "episode finished"
        );
    }

    fn on_mc_episode(&mut self, mdp: &Mdp, episode: usize, steps: &[Step], _updates: &[ValueUpdate]) {
        for step in steps {
            debug!(
                episode,
                state = mdp.name(step.state),
                action = mdp.action_name(step.state, step.action),
                reward = step.reward,
                "experience"
            );
        }
        let total: f64 = steps.iter().map(|s| s.reward).sum();
        debug!(episode, total_reward = total, "episode finished");
    }
}

/// Everything an observer can see, in the order it was seen.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Sweep {
        sweep: usize,
        updates: Vec<StateUpdate>,
        max_change: f64,
    },
    QUpdate {
        episode: usize,
        update: QUpdate,
    },
    QEpisodeEnd {
        episode: usize,
        max_change: f64,
        learning_rate: f64,
    },
    McEpisode {
        episode: usize,
        steps: Vec<Step>,
        updates: Vec<ValueUpdate>,
    },
}

/// Keeps every event in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recorder {
    pub events: Vec<Event>,
}

impl Observer for Recorder {
    fn on_sweep(&mut self, _mdp: &Mdp, sweep: usize, updates: &[StateUpdate], max_change: f64) {
        self.events.push(Event::Sweep {
            sweep,
            updates: updates.to_vec(),
            max_change,
        });
    }

    fn on_q_update(&mut self, _mdp: &Mdp, episode: usize, update: &QUpdate) {
        self.events.push(Event::QUpdate {
            episode,
            update: *update,
        });
    }

    fn on_q_episode_end(&mut self, _mdp: &Mdp, episode: usize, max_change: f64, learning_rate: f64) {
        self.events.push(Event::QEpisodeEnd {
            episode,
            max_change,
            learning_rate,
        });
    }

    fn on_mc_episode(&mut self, _mdp: &Mdp, episode: usize, steps: &[Step], updates: &[ValueUpdate]) {
        self.events.push(Event::McEpisode {
            episode,
            steps: steps.to_vec(),
            updates: updates.to_vec(),
        });
    }
}

#[derive(Debug, Clone)]
#[enum_dispatch(Observer)]
pub enum Reporter {
    Silent(Silent),
    TracingObserver(TracingObserver),
    Recorder(Recorder),
}

impl Default for Reporter {
    fn default() -> Self {
        Reporter::Silent(Silent)
    }
}
