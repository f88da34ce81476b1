mod q_table;
mod value_table;

pub use q_table::QTable;
pub use value_table::ValueTable;

use crate::env::{Action, Mdp, State};
use crate::error::Result;
use crate::utils::argmax;

/// One chosen action per state of an [`Mdp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    actions: Vec<Action>,
}

impl Policy {
    /// Single-action states take action 0 without calling `scores`.
    pub fn greedy<F>(mdp: &Mdp, mut scores: F) -> Result<Self>
    where
        F: FnMut(State) -> Result<Vec<f64>>,
    {
        let mut actions: Vec<Action> = Vec::with_capacity(mdp.len());
        for state in mdp.states() {
            if mdp.n_actions(state) <= 1 {
                actions.push(0);
            } else {
                actions.push(argmax(&scores(state)?));
            }
        }
        return Ok(Self { actions });
    }

    pub fn action(&self, state: State) -> Option<Action> {
        return self.actions.get(state).copied();
    }

    pub fn len(&self) -> usize {
        return self.actions.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.actions.is_empty();
    }

    pub fn iter(&self) -> impl Iterator<Item = (State, Action)> + '_ {
        return self.actions.iter().copied().enumerate();
    }

    pub fn labels<'a>(&self, mdp: &'a Mdp) -> Vec<(&'a str, &'a str)> {
        return self
            .iter()
            .map(|(s, a)| (mdp.name(s), mdp.action_name(s, a)))
            .collect();
    }
}
