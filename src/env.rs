mod action_space;
mod mdp;
mod student;

/// Index of a state in its [`Mdp`].
pub type State = usize;
/// Index of an action among the legal actions of one state.
pub type Action = usize;

pub use action_space::ActionSpace;
pub use mdp::{Branch, Mdp, MdpBuilder, Outcome, Transition, PLACEHOLDER_ACTION};
pub use student::student_mdp;
