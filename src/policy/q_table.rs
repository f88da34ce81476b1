use fxhash::FxHashMap;

use super::Policy;
use crate::env::{Action, Mdp, Outcome, State};
use crate::error::{Error, Result};

fn missing(state: State, action: Action) -> Error {
    return Error::InvalidTransition {
        state: format!("#{state}"),
        action: format!("#{action}"),
    };
}

/// Action values for every legal `(state, action)` pair, terminal
/// placeholders included.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    values: FxHashMap<State, Vec<f64>>,
}

impl QTable {
    pub fn new(mdp: &Mdp, default_value: f64) -> Self {
        let values = mdp
            .states()
            .map(|s| (s, vec![default_value; mdp.n_actions(s)]))
            .collect();
        return Self { values };
    }

    pub fn get(&self, state: State, action: Action) -> Result<f64> {
        return self
            .values
            .get(&state)
            .and_then(|v| v.get(action))
            .copied()
            .ok_or_else(|| missing(state, action));
    }

    /// Empty for a state the table does not know.
    pub fn values(&self, state: State) -> &[f64] {
        return self.values.get(&state).map(Vec::as_slice).unwrap_or(&[]);
    }

    /// `max_a Q(next, a)`, with the end of the process worth 0.
    pub fn max(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Ended => 0.0,
            Outcome::Continue(state) => match self.values(state) {
                [] => 0.0,
                values => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            },
        }
    }

    /// Moves `Q(state, action)` a `learning_rate` fraction of the way to
    /// `target` and returns the new value.
    pub fn update(&mut self, state: State, action: Action, learning_rate: f64, target: f64) -> Result<f64> {
        let q: &mut f64 = self
            .values
            .get_mut(&state)
            .and_then(|v| v.get_mut(action))
            .ok_or_else(|| missing(state, action))?;
        *q += learning_rate * (target - *q);
        return Ok(*q);
    }

    pub fn policy(&self, mdp: &Mdp) -> Result<Policy> {
        return Policy::greedy(mdp, |s| Ok(self.values(s).to_vec()));
    }
}
