use tracing::{info, trace, warn};

use crate::config::ValueIterationConfig;
use crate::env::{Action, Mdp, State};
use crate::error::{Error, Result};
use crate::observer::{Observer, StateUpdate};
use crate::policy::{Policy, ValueTable};
use crate::utils::argmax;

/// `Σ p · (r + γ · V(next))` for every legal action of `state`, in action order.
pub fn action_values(
    mdp: &Mdp,
    values: &ValueTable,
    state: State,
    discount_factor: f64,
) -> Result<Vec<f64>> {
    (0..mdp.n_actions(state))
        .map(|action| action_value(mdp, values, state, action, discount_factor))
        .collect()
}

fn action_value(
    mdp: &Mdp,
    values: &ValueTable,
    state: State,
    action: Action,
    discount_factor: f64,
) -> Result<f64> {
    Ok(mdp
        .expected_outcomes(state, action)?
        .iter()
        .map(|b| b.probability * (b.reward + discount_factor * values.of(b.outcome)))
        .sum())
}

pub fn greedy_policy(mdp: &Mdp, values: &ValueTable, discount_factor: f64) -> Result<Policy> {
    Policy::greedy(mdp, |state| action_values(mdp, values, state, discount_factor))
}

/// Result of one synchronous sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct Sweep {
    pub values: ValueTable,
    pub updates: Vec<StateUpdate>,
    pub max_change: f64,
}

/// Recomputes every decision state from `values` alone. Nothing written
/// during the sweep is read back before it ends; terminal entries are copied.
pub fn sweep(mdp: &Mdp, values: &ValueTable, discount_factor: f64) -> Result<Sweep> {
    let mut next: ValueTable = values.clone();
    let mut updates: Vec<StateUpdate> = Vec::with_capacity(mdp.len());
    let mut max_change: f64 = 0.0;
    for state in mdp.states().filter(|s| !mdp.is_terminal(*s)) {
        let action_values = action_values(mdp, values, state, discount_factor)?;
        let best_action = argmax(&action_values);
        let value = action_values[best_action];
        let previous = values.get(state);
        max_change = max_change.max((value - previous).abs());
        next.set(state, value)?;
        updates.push(StateUpdate {
            state,
            previous,
            action_values,
            best_action,
            value,
        });
    }
    Ok(Sweep {
        values: next,
        updates,
        max_change,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueIterationResult {
    pub values: ValueTable,
    pub policy: Policy,
    pub sweeps: usize,
}

/// Synchronous value iteration until the largest change of a sweep drops
/// strictly below the threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueIteration {
    config: ValueIterationConfig,
}

impl ValueIteration {
    pub fn new(config: ValueIterationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValueIterationConfig {
        &self.config
    }

    pub fn solve<O: Observer + ?Sized>(
        &self,
        mdp: &Mdp,
        observer: &mut O,
    ) -> Result<ValueIterationResult> {
        self.solve_from(mdp, ValueTable::zeros(mdp.len()), observer)
    }

    /// Starts from `initial` instead of zeros. Terminal entries are reset to
    /// their reward before the first sweep.
    pub fn solve_from<O: Observer + ?Sized>(
        &self,
        mdp: &Mdp,
        initial: ValueTable,
        observer: &mut O,
    ) -> Result<ValueIterationResult> {
        self.config.validate()?;
        if initial.len() != mdp.len() {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "initial value table has {} entries for {} states",
                    initial.len(),
                    mdp.len()
                ),
            });
        }
        let gamma: f64 = self.config.discount_factor;
        let mut values: ValueTable = initial;
        values.fix_terminals(mdp)?;

        let mut sweeps: usize = 0;
        loop {
            sweeps += 1;
            let Sweep {
                values: next,
                updates,
                max_change,
            } = sweep(mdp, &values, gamma)?;
            observer.on_sweep(mdp, sweeps, &updates, max_change);
            trace!(sweeps, max_change, "sweep done");
            values = next;

            if max_change < self.config.threshold {
                break;
            }
            if let Some(cap) = self.config.max_sweeps {
                if sweeps >= cap {
                    warn!(sweeps, max_change, "value iteration hit its sweep cap");
                    return Err(Error::NonConvergence {
                        iterations: sweeps,
                        max_change,
                    });
                }
            }
        }

        let policy: Policy = greedy_policy(mdp, &values, gamma)?;
        info!(sweeps, "value iteration converged");
        Ok(ValueIterationResult {
            values,
            policy,
            sweeps,
        })
    }
}
