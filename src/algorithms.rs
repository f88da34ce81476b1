mod episode;
mod monte_carlo;
mod qlearning;
mod value_iteration;

pub use episode::{equiprobable_step, generate_episode, Step};
pub use monte_carlo::{update_from_episode, MonteCarlo, MonteCarloResult};
pub use qlearning::{QLearning, QLearningResult};
pub use value_iteration::{action_values, greedy_policy, sweep, Sweep, ValueIteration, ValueIterationResult};
