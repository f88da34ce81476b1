use ndarray::Array1;

use crate::env::{Mdp, Outcome, State};
use crate::error::{Error, Result};

/// State values indexed by [`State`]. The end of the process is worth 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueTable {
    values: Array1<f64>,
}

impl ValueTable {
    pub fn zeros(len: usize) -> Self {
        return Self {
            values: Array1::zeros(len),
        };
    }

    pub fn from_vec(values: Vec<f64>) -> Self {
        return Self {
            values: Array1::from(values),
        };
    }

    /// Zeros for decision states, terminal rewards for terminal states.
    pub fn with_terminal_rewards(mdp: &Mdp) -> Self {
        return Self::from_vec(
            mdp.states()
                .map(|s| mdp.terminal_reward(s).unwrap_or(0.0))
                .collect(),
        );
    }

    /// Overwrites terminal entries with their terminal reward.
    pub fn fix_terminals(&mut self, mdp: &Mdp) -> Result<()> {
        for state in mdp.states() {
            if let Some(reward) = mdp.terminal_reward(state) {
                self.set(state, reward)?;
            }
        }
        return Ok(());
    }

    pub fn len(&self) -> usize {
        return self.values.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.values.is_empty();
    }

    /// Reads as 0 past the end of the table, like [`Outcome::Ended`].
    /// Use [`ValueTable::try_get`] to tell the two apart.
    pub fn get(&self, state: State) -> f64 {
        return self.try_get(state).unwrap_or(0.0);
    }

    pub fn try_get(&self, state: State) -> Option<f64> {
        return self.values.get(state).copied();
    }

    pub fn set(&mut self, state: State, value: f64) -> Result<()> {
        let len: usize = self.values.len();
        match self.values.get_mut(state) {
            Some(v) => {
                *v = value;
                return Ok(());
            }
            None => return Err(Error::StateOutOfRange { state, len }),
        }
    }

    pub fn of(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Continue(state) => self.get(state),
            Outcome::Ended => 0.0,
        }
    }

    pub fn as_array(&self) -> &Array1<f64> {
        return &self.values;
    }

    pub fn to_vec(&self) -> Vec<f64> {
        return self.values.to_vec();
    }

    /// Largest absolute entry-wise difference; tables of different length
    /// compare only their common prefix.
    pub fn max_abs_diff(&self, other: &ValueTable) -> f64 {
        return self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
    }
}
