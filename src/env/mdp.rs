use indexmap::IndexMap;
use rand::Rng;

use super::{Action, ActionSpace, State};
use crate::error::{Error, Result};
use crate::utils::categorical_sample;

/// Name of the single action exposed by terminal states.
pub const PLACEHOLDER_ACTION: &str = "any";

const PROBABILITY_TOLERANCE: f64 = 1e-9;

const UNDEFINED: &str = "<undefined>";

/// Where a step lands: another state, or past the end of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Continue(State),
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Branch {
    pub outcome: Outcome,
    pub reward: f64,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Deterministic { next: State, reward: f64 },
    Stochastic(Vec<Branch>),
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Terminal { reward: f64 },
    Decision { actions: IndexMap<String, Transition> },
}

/// A finite MDP with named states and actions. States and actions keep their
/// declaration order, which is also the tie-breaking order of every solver.
#[derive(Debug, Clone, PartialEq)]
pub struct Mdp {
    nodes: IndexMap<String, Node>,
    initial: State,
}

impl Mdp {
    pub fn builder() -> MdpBuilder {
        MdpBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn states(&self) -> std::ops::Range<State> {
        0..self.nodes.len()
    }

    pub fn initial(&self) -> State {
        self.initial
    }

    pub fn state(&self, name: &str) -> Option<State> {
        self.nodes.get_index_of(name)
    }

    pub fn name(&self, state: State) -> &str {
        self.lookup_name(state).unwrap_or(UNDEFINED)
    }

    fn lookup_name(&self, state: State) -> Option<&str> {
        self.nodes.get_index(state).map(|(name, _)| name.as_str())
    }

    pub fn is_terminal(&self, state: State) -> bool {
        matches!(self.nodes.get_index(state), Some((_, Node::Terminal { .. })))
    }

    pub fn terminal_reward(&self, state: State) -> Option<f64> {
        match self.nodes.get_index(state) {
            Some((_, Node::Terminal { reward })) => Some(*reward),
            _ => None,
        }
    }

    /// Number of legal actions; terminal states report their placeholder.
    pub fn n_actions(&self, state: State) -> usize {
        match self.nodes.get_index(state) {
            Some((_, Node::Terminal { .. })) => 1,
            Some((_, Node::Decision { actions })) => actions.len(),
            None => 0,
        }
    }

    pub fn actions(&self, state: State) -> Vec<&str> {
        match self.nodes.get_index(state) {
            Some((_, Node::Terminal { .. })) => vec![PLACEHOLDER_ACTION],
            Some((_, Node::Decision { actions })) => actions.keys().map(String::as_str).collect(),
            None => vec![],
        }
    }

    pub fn action(&self, state: State, name: &str) -> Option<Action> {
        match self.nodes.get_index(state) {
            Some((_, Node::Terminal { .. })) => (name == PLACEHOLDER_ACTION).then_some(0),
            Some((_, Node::Decision { actions })) => actions.get_index_of(name),
            None => None,
        }
    }

    pub fn action_name(&self, state: State, action: Action) -> &str {
        self.lookup_action_name(state, action).unwrap_or(UNDEFINED)
    }

    fn lookup_action_name(&self, state: State, action: Action) -> Option<&str> {
        match self.nodes.get_index(state) {
            Some((_, Node::Terminal { .. })) if action == 0 => Some(PLACEHOLDER_ACTION),
            Some((_, Node::Decision { actions })) => actions.get_index(action).map(|(name, _)| name.as_str()),
            _ => None,
        }
    }

    pub fn action_space(&self, state: State) -> Result<ActionSpace> {
        match self.n_actions(state) {
            0 => Err(self.invalid(state, 0)),
            n => Ok(ActionSpace::new(n)),
        }
    }

    pub fn transition(&self, state: State, action: Action) -> Result<&Transition> {
        match self.nodes.get_index(state) {
            Some((_, Node::Decision { actions })) => actions
                .get_index(action)
                .map(|(_, transition)| transition)
                .ok_or_else(|| self.invalid(state, action)),
            _ => Err(self.invalid(state, action)),
        }
    }

    /// Exact distribution of `(outcome, reward)` for a pair. Stepping out of a
    /// terminal state ends the process with the terminal reward.
    pub fn expected_outcomes(&self, state: State, action: Action) -> Result<Vec<Branch>> {
        if let Some(reward) = self.terminal_reward(state) {
            if action != 0 {
                return Err(self.invalid(state, action));
            }
            return Ok(vec![Branch {
                outcome: Outcome::Ended,
                reward,
                probability: 1.0,
            }]);
        }
        match self.transition(state, action)? {
            Transition::Deterministic { next, reward } => Ok(vec![Branch {
                outcome: Outcome::Continue(*next),
                reward: *reward,
                probability: 1.0,
            }]),
            Transition::Stochastic(branches) => Ok(branches.clone()),
        }
    }

    /// Samples one step. A stochastic pair consumes exactly one uniform draw.
    pub fn step<R: Rng + ?Sized>(
        &self,
        state: State,
        action: Action,
        rng: &mut R,
    ) -> Result<(Outcome, f64)> {
        if let Some(reward) = self.terminal_reward(state) {
            if action != 0 {
                return Err(self.invalid(state, action));
            }
            return Ok((Outcome::Ended, reward));
        }
        match self.transition(state, action)? {
            Transition::Deterministic { next, reward } => Ok((Outcome::Continue(*next), *reward)),
            Transition::Stochastic(branches) => {
                let probs: Vec<f64> = branches.iter().map(|b| b.probability).collect();
                let random: f64 = rng.gen();
                let branch = &branches[categorical_sample(&probs, random)];
                Ok((branch.outcome, branch.reward))
            }
        }
    }

    fn invalid(&self, state: State, action: Action) -> Error {
        let state_name = match self.lookup_name(state) {
            Some(name) => name.to_string(),
            None => format!("#{state}"),
        };
        let action_name = match self.lookup_action_name(state, action) {
            Some(name) => name.to_string(),
            None => format!("#{action}"),
        };
        Error::InvalidTransition {
            state: state_name,
            action: action_name,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingAction {
    state: String,
    action: String,
    branches: Vec<(String, f64, f64)>,
    stochastic: bool,
}

/// Collects states and actions by name and checks them in [`MdpBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct MdpBuilder {
    declared: Vec<(String, Option<f64>)>,
    actions: Vec<PendingAction>,
    initial: Option<String>,
}

impl MdpBuilder {
    pub fn decision(mut self, name: &str) -> Self {
        self.declared.push((name.to_string(), None));
        self
    }

    pub fn terminal(mut self, name: &str, reward: f64) -> Self {
        self.declared.push((name.to_string(), Some(reward)));
        self
    }

    pub fn action(mut self, state: &str, action: &str, next: &str, reward: f64) -> Self {
        self.actions.push(PendingAction {
            state: state.to_string(),
            action: action.to_string(),
            branches: vec![(next.to_string(), reward, 1.0)],
            stochastic: false,
        });
        self
    }

    /// `branches` holds `(next state, reward, probability)` triples.
    pub fn stochastic_action(mut self, state: &str, action: &str, branches: &[(&str, f64, f64)]) -> Self {
        self.actions.push(PendingAction {
            state: state.to_string(),
            action: action.to_string(),
            branches: branches
                .iter()
                .map(|(next, reward, p)| (next.to_string(), *reward, *p))
                .collect(),
            stochastic: true,
        });
        self
    }

    pub fn initial(mut self, name: &str) -> Self {
        self.initial = Some(name.to_string());
        self
    }

    pub fn build(self) -> Result<Mdp> {
        let mut nodes: IndexMap<String, Node> = IndexMap::new();
        for (name, reward) in self.declared {
            if nodes.contains_key(&name) {
                return Err(Error::DuplicateState { state: name });
            }
            let node = match reward {
                Some(reward) => Node::Terminal { reward },
                None => Node::Decision {
                    actions: IndexMap::new(),
                },
            };
            nodes.insert(name, node);
        }

        for pending in self.actions {
            let reference = format!("{}/{}", pending.state, pending.action);
            let mut branches: Vec<Branch> = Vec::with_capacity(pending.branches.len());
            for (next, reward, probability) in &pending.branches {
                let next_state = nodes.get_index_of(next.as_str()).ok_or_else(|| Error::UnknownState {
                    reference: reference.clone(),
                    state: next.clone(),
                })?;
                branches.push(Branch {
                    outcome: Outcome::Continue(next_state),
                    reward: *reward,
                    probability: *probability,
                });
            }
            let total: f64 = branches.iter().map(|b| b.probability).sum();
            if branches.is_empty()
                || branches.iter().any(|b| !b.probability.is_finite() || b.probability < 0.0)
                || !((total - 1.0).abs() <= PROBABILITY_TOLERANCE)
            {
                return Err(Error::MalformedProbabilityModel {
                    state: pending.state,
                    action: pending.action,
                    total,
                });
            }
            let transition = match (pending.stochastic, branches.first().copied()) {
                (
                    false,
                    Some(Branch {
                        outcome: Outcome::Continue(next),
                        reward,
                        ..
                    }),
                ) if branches.len() == 1 => Transition::Deterministic { next, reward },
                _ => Transition::Stochastic(branches),
            };

            match nodes.get_mut(pending.state.as_str()) {
                None => {
                    return Err(Error::UnknownState {
                        reference,
                        state: pending.state,
                    })
                }
                Some(Node::Terminal { .. }) => {
                    return Err(Error::InvalidTransition {
                        state: pending.state,
                        action: pending.action,
                    })
                }
                Some(Node::Decision { actions }) => {
                    if actions.contains_key(&pending.action) {
                        return Err(Error::DuplicateAction {
                            state: pending.state,
                            action: pending.action,
                        });
                    }
                    actions.insert(pending.action, transition);
                }
            }
        }

        for (name, node) in &nodes {
            if let Node::Decision { actions } = node {
                if actions.is_empty() {
                    return Err(Error::NoActions { state: name.clone() });
                }
            }
        }

        let initial_name = self.initial.ok_or(Error::MissingInitialState)?;
        let initial = nodes
            .get_index_of(initial_name.as_str())
            .ok_or_else(|| Error::UnknownState {
                reference: "initial".to_string(),
                state: initial_name.clone(),
            })?;

        Ok(Mdp { nodes, initial })
    }
}
