use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    check_interval,
    error::{Error, Result},
    key::Action,
};

pub mod double_q_learner;
pub mod q_learner;
pub mod table;

pub use double_q_learner::{DoubleQLearner, TableId};
pub use q_learner::QLearner;
pub use table::{QTable, RenderedTable};

/// Hyperparameters shared by the tabular learners
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QLearnerConfig {
    /// The learning rate α - must be between 0 and 1
    ///
    /// **Default**: `0.1`
    pub learning_rate: f64,
    /// The discount factor γ - must be between 0 and 1
    ///
    /// **Default**: `0.5`
    pub discount_rate: f64,
    /// The chance of taking a random action instead of the best known one - must be between 0 and 1
    ///
    /// **Default**: `0.1`
    pub random_chance: f64,
}

impl Default for QLearnerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_rate: 0.5,
            random_chance: 0.1,
        }
    }
}

impl QLearnerConfig {
    /// **Errors** if any hyperparameter is not in the interval `[0,1]`
    pub fn validate(&self) -> Result<()> {
        check_interval!(self.learning_rate, 0.0, 1.0);
        check_interval!(self.discount_rate, 0.0, 1.0);
        check_interval!(self.random_chance, 0.0, 1.0);
        Ok(())
    }
}

/// Rejects an empty action set or one with repeated actions
pub(crate) fn validate_actions(actions: &[Action]) -> Result<()> {
    if actions.is_empty() {
        return Err(Error::EmptyActionSpace);
    }
    let mut seen = HashSet::with_capacity(actions.len());
    for action in actions {
        if !seen.insert(action) {
            return Err(Error::DuplicateAction(action.to_string()));
        }
    }
    Ok(())
}

pub(crate) fn validate_reward(reward: f64) -> Result<()> {
    if reward.is_finite() {
        Ok(())
    } else {
        Err(Error::NonFiniteReward(reward))
    }
}

/// Q(s,a) ← Q(s,a) + α[r + γ Q(s',a') - Q(s,a)]
pub(crate) fn td_update(q_old: f64, reward: f64, q_next: f64, alpha: f64, gamma: f64) -> f64 {
    q_old + alpha * (reward + gamma * q_next - q_old)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(QLearnerConfig::default().validate().is_ok());
    }

    #[test]
    fn config_names_bad_field() {
        let config = QLearnerConfig {
            discount_rate: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidParameter {
                name: "discount_rate",
                ..
            })
        ));
    }

    #[test]
    fn action_set_checks() {
        assert!(matches!(validate_actions(&[]), Err(Error::EmptyActionSpace)));
        assert!(matches!(
            validate_actions(&[Action::from("a"), Action::from("a")]),
            Err(Error::DuplicateAction(_))
        ));
        assert!(validate_actions(&[Action::from("a"), Action::from("b")]).is_ok());
    }

    #[test]
    fn td_update_arithmetic() {
        let q = td_update(0.2, 1.0, 0.4, 0.1, 0.5);
        assert!((q - (0.2 + 0.1 * (1.0 + 0.5 * 0.4 - 0.2))).abs() < 1e-9);
        assert!((td_update(0.0, 1.0, 0.0, 0.1, 0.5) - 0.1).abs() < 1e-9);
    }
}
