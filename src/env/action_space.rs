use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use super::Action;

#[derive(Debug, Clone)]
pub struct ActionSpace {
    pub size: usize,
    dist: Uniform<usize>,
}

impl ActionSpace {
    pub fn new(size: usize) -> Self {
        return Self {
            size,
            dist: Uniform::from(0..size.max(1)),
        };
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Action {
        return self.dist.sample(rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn samples_stay_in_range_and_cover_every_action() {
        let space = ActionSpace::new(3);
        let rng = &mut StdRng::seed_from_u64(7);
        let mut counts = [0usize; 3];
        for _ in 0..3000 {
            let a = space.sample(rng);
            assert!(a < 3);
            counts[a] += 1;
        }
        for c in counts {
            assert!(c > 800, "uneven draw: {counts:?}");
        }
    }

    #[test]
    fn single_action_space_always_picks_it() {
        let space = ActionSpace::new(1);
        let rng = &mut StdRng::seed_from_u64(1);
        assert!((0..100).all(|_| space.sample(rng) == 0));
    }
}
