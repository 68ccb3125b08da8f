use serde::{Deserialize, Serialize};

use crate::{check_interval, error::Result, random::RandomSource};

use super::Choice;

/// Epsilon greedy exploration policy with a fixed epsilon threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonGreedy {
    epsilon: f64,
}

impl EpsilonGreedy {
    /// Initialize epsilon greedy policy with the chance of exploring
    ///
    /// **Errors** if `random_chance` is not in the interval `[0,1]`
    pub fn new(random_chance: f64) -> Result<Self> {
        check_interval!(random_chance, 0.0, 1.0);
        Ok(Self {
            epsilon: random_chance,
        })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Invoke epsilon greedy policy, drawing one uniform sample
    pub fn choose(&self, rng: &mut impl RandomSource) -> Choice {
        if rng.uniform() < self.epsilon {
            Choice::Explore
        } else {
            Choice::Exploit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{tests::ScriptedRandom, RngSource};

    #[test]
    fn zero_epsilon_never_explores() {
        let policy = EpsilonGreedy::new(0.0).unwrap();
        let mut rng = ScriptedRandom::new(&[0.0, 0.5, 0.999], &[0]);
        for _ in 0..3 {
            assert_eq!(policy.choose(&mut rng), Choice::Exploit);
        }
    }

    #[test]
    fn full_epsilon_always_explores() {
        let policy = EpsilonGreedy::new(1.0).unwrap();
        let mut rng = RngSource::seeded(11);
        for _ in 0..100 {
            assert_eq!(policy.choose(&mut rng), Choice::Explore);
        }
    }

    #[test]
    fn threshold_is_strict() {
        let policy = EpsilonGreedy::new(0.25).unwrap();
        let mut rng = ScriptedRandom::new(&[0.2, 0.25, 0.3], &[0]);
        assert_eq!(policy.choose(&mut rng), Choice::Explore);
        assert_eq!(policy.choose(&mut rng), Choice::Exploit);
        assert_eq!(policy.choose(&mut rng), Choice::Exploit);
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(EpsilonGreedy::new(1.1).is_err());
        assert!(EpsilonGreedy::new(-0.5).is_err());
    }
}
