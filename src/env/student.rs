use super::Mdp;
use crate::error::Result;

/// The student's evening: Party, Rest or Study from 8pm until the 11am class.
///
/// State names read as activity (Rested/Tired), mood (Up/Down) and clock time.
/// Partying from `RU10p` is the only coin flip: half the time the student
/// still wakes up rested.
pub fn student_mdp() -> Result<Mdp> {
    Mdp::builder()
        .decision("RU8p")
        .decision("TU10p")
        .decision("RU10p")
        .decision("RD10p")
        .decision("RU8a")
        .decision("RD8a")
        .terminal("TU10a", -1.0)
        .terminal("RU10a", 0.0)
        .terminal("RD10a", 4.0)
        .terminal("TD10a", 3.0)
        .action("RU8p", "P", "TU10p", 2.0)
        .action("RU8p", "R", "RU10p", 0.0)
        .action("RU8p", "S", "RD10p", -1.0)
        .action("TU10p", "P", "TU10a", 2.0)
        .action("TU10p", "R", "RU8a", 0.0)
        .stochastic_action("RU10p", "P", &[("RU8a", 2.0, 0.5), ("TU10a", 2.0, 0.5)])
        .action("RU10p", "R", "RU8a", 0.0)
        .action("RU10p", "S", "RD10a", -1.0)
        .action("RD10p", "R", "RD8a", 0.0)
        .action("RD10p", "P", "TD10a", 2.0)
        .action("RU8a", "P", "TU10a", 2.0)
        .action("RU8a", "R", "RU10a", 0.0)
        .action("RU8a", "S", "RD10a", -1.0)
        .action("RD8a", "R", "RD10a", 0.0)
        .action("RD8a", "P", "TD10a", 2.0)
        .initial("RU8p")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Outcome, Transition};
    use float_eq::assert_float_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;

    #[test]
    fn has_six_decision_and_four_terminal_states() {
        let mdp = student_mdp().unwrap();
        assert_eq!(mdp.len(), 10);
        assert_eq!(mdp.states().filter(|s| mdp.is_terminal(*s)).count(), 4);
        assert_eq!(mdp.name(mdp.initial()), "RU8p");
    }

    #[rstest]
    #[case("TU10a", -1.0)]
    #[case("RU10a", 0.0)]
    #[case("RD10a", 4.0)]
    #[case("TD10a", 3.0)]
    fn terminal_rewards(#[case] name: &str, #[case] reward: f64) {
        let mdp = student_mdp().unwrap();
        let state = mdp.state(name).unwrap();
        assert_eq!(mdp.terminal_reward(state), Some(reward));
    }

    #[rstest]
    #[case("RU8p", &["P", "R", "S"])]
    #[case("TU10p", &["P", "R"])]
    #[case("RU10p", &["P", "R", "S"])]
    #[case("RD10p", &["R", "P"])]
    #[case("RU8a", &["P", "R", "S"])]
    #[case("RD8a", &["R", "P"])]
    fn action_ordering(#[case] name: &str, #[case] expected: &[&str]) {
        let mdp = student_mdp().unwrap();
        assert_eq!(mdp.actions(mdp.state(name).unwrap()), expected);
    }

    #[test]
    fn every_pair_has_a_distribution_summing_to_one() {
        let mdp = student_mdp().unwrap();
        for s in mdp.states() {
            for a in 0..mdp.n_actions(s) {
                let total: f64 = mdp.expected_outcomes(s, a).unwrap().iter().map(|b| b.probability).sum();
                assert_eq!(total, 1.0, "{}/{}", mdp.name(s), mdp.action_name(s, a));
            }
        }
    }

    #[test]
    fn only_party_after_ten_branches() {
        let mdp = student_mdp().unwrap();
        let stochastic: Vec<(String, String)> = mdp
            .states()
            .flat_map(|s| (0..mdp.n_actions(s)).map(move |a| (s, a)))
            .filter(|(s, a)| matches!(mdp.transition(*s, *a), Ok(Transition::Stochastic(_))))
            .map(|(s, a)| (mdp.name(s).to_string(), mdp.action_name(s, a).to_string()))
            .collect();
        assert_eq!(stochastic, vec![("RU10p".to_string(), "P".to_string())]);
    }

    #[test]
    fn sampled_branch_matches_expected_outcomes() {
        let mdp = student_mdp().unwrap();
        let ru10p = mdp.state("RU10p").unwrap();
        let ru8a = mdp.state("RU8a").unwrap();
        let tu10a = mdp.state("TU10a").unwrap();
        let rng = &mut StdRng::seed_from_u64(2718);
        let n = 10_000;
        let mut rested = 0;
        for _ in 0..n {
            let (outcome, reward) = mdp.step(ru10p, 0, rng).unwrap();
            assert_eq!(reward, 2.0);
            match outcome {
                Outcome::Continue(s) if s == ru8a => rested += 1,
                Outcome::Continue(s) => assert_eq!(s, tu10a),
                Outcome::Ended => panic!("party never ends the process"),
            }
        }
        assert_float_eq!(rested as f64 / n as f64, 0.5, abs <= 2e-2);
    }

    #[test]
    fn deterministic_step_agrees_with_expected_outcomes() {
        let mdp = student_mdp().unwrap();
        let rng = &mut StdRng::seed_from_u64(5);
        for s in mdp.states() {
            for a in 0..mdp.n_actions(s) {
                let outcomes = mdp.expected_outcomes(s, a).unwrap();
                if outcomes.len() == 1 {
                    let (outcome, reward) = mdp.step(s, a, rng).unwrap();
                    assert_eq!(outcome, outcomes[0].outcome);
                    assert_eq!(reward, outcomes[0].reward);
                }
            }
        }
    }
}
