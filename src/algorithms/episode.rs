use rand::Rng;

use crate::env::{Action, Mdp, Outcome, State};
use crate::error::Result;

/// One recorded `(state, action, reward)` triple of an episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub state: State,
    pub action: Action,
    pub reward: f64,
}

/// Picks an action uniformly among the legal ones and samples the
/// environment. The action draw always comes before the branch draw.
pub fn equiprobable_step<R: Rng + ?Sized>(
    mdp: &Mdp,
    state: State,
    rng: &mut R,
) -> Result<(Action, Outcome, f64)> {
    let action: Action = mdp.action_space(state)?.sample(rng);
    let (outcome, reward) = mdp.step(state, action, rng)?;
    Ok((action, outcome, reward))
}

/// Rolls out one episode from the initial state until the process ends.
/// The step out of the terminal state is part of the episode.
pub fn generate_episode<R: Rng + ?Sized>(mdp: &Mdp, rng: &mut R) -> Result<Vec<Step>> {
    let mut episode: Vec<Step> = vec![];
    let mut state: State = mdp.initial();
    loop {
        let (action, outcome, reward) = equiprobable_step(mdp, state, rng)?;
        episode.push(Step { state, action, reward });
        match outcome {
            Outcome::Continue(next) => state = next,
            Outcome::Ended => return Ok(episode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::student_mdp;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn episodes_start_at_ru8p_and_finish_on_a_terminal_state() {
        let mdp = student_mdp().unwrap();
        let rng = &mut StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let episode = generate_episode(&mdp, rng).unwrap();
            assert_eq!(episode[0].state, mdp.initial());
            let last = episode.last().unwrap();
            assert!(mdp.is_terminal(last.state));
            assert_eq!(Some(last.reward), mdp.terminal_reward(last.state));
            assert!(episode[..episode.len() - 1].iter().all(|s| !mdp.is_terminal(s.state)));
            assert!((3..=4).contains(&episode.len()), "{episode:?}");
        }
    }

    #[test]
    fn same_seed_same_episode() {
        let mdp = student_mdp().unwrap();
        let a = generate_episode(&mdp, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = generate_episode(&mdp, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }
}
