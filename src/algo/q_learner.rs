use log::{debug, trace};
use rand::rngs::StdRng;

use crate::{
    error::{Error, Result},
    exploration::{Choice, EpsilonGreedy},
    key::{Action, State},
    persist::{LearnerKind, SavedLearner},
    random::{RandomSource, RngSource},
};

use super::{td_update, validate_actions, validate_reward, QLearnerConfig, QTable};

/// A Q-learning agent that keeps one table and acts epsilon-greedily
///
/// ### Generics
/// - `S` - The [`State`] type used as table keys
/// - `R` - The [`RandomSource`] driving exploration, a [`StdRng`] seeded from entropy by default
///
/// Rows are created lazily: the first time a state is seen by [`get_action`](Self::get_action)
/// or [`update`](Self::update), every action gets a value of `0.0`.
#[derive(Debug, Clone)]
pub struct QLearner<S: State, R: RandomSource = RngSource<StdRng>> {
    table: QTable<S>,
    actions: Vec<Action>,
    exploration: EpsilonGreedy,
    learning_rate: f64,
    discount_rate: f64,
    rng: R,
}

impl<S: State> QLearner<S> {
    /// Initialize a new `QLearner` over a fixed set of possible actions
    ///
    /// **Errors** if a hyperparameter is not in the interval `[0,1]`, or if `actions`
    /// is empty or contains duplicates
    pub fn new(config: QLearnerConfig, actions: Vec<Action>) -> Result<Self> {
        Self::with_rng(config, actions, RngSource::default())
    }

    /// Rebuild a learner from its saved form
    pub fn from_saved(saved: SavedLearner<S>) -> Result<Self> {
        Self::from_saved_with_rng(saved, RngSource::default())
    }
}

impl<S: State, R: RandomSource> QLearner<S, R> {
    /// Same as [`QLearner::new`], with an explicit source of randomness
    pub fn with_rng(config: QLearnerConfig, actions: Vec<Action>, rng: R) -> Result<Self> {
        config.validate()?;
        validate_actions(&actions)?;
        Ok(Self {
            table: QTable::new(actions.len()),
            actions,
            exploration: EpsilonGreedy::new(config.random_chance)?,
            learning_rate: config.learning_rate,
            discount_rate: config.discount_rate,
            rng,
        })
    }

    pub fn from_saved_with_rng(saved: SavedLearner<S>, rng: R) -> Result<Self> {
        let (config, actions, mut tables) = saved.into_parts(LearnerKind::QLearner)?;
        let mut learner = Self::with_rng(config, actions, rng)?;
        learner.table = tables
            .pop()
            .ok_or_else(|| Error::Format("missing table".to_owned()))?;
        Ok(learner)
    }

    pub fn to_saved(&self) -> SavedLearner<S> {
        SavedLearner::new(
            LearnerKind::QLearner,
            self.config(),
            self.actions.clone(),
            &[&self.table],
        )
    }

    pub fn config(&self) -> QLearnerConfig {
        QLearnerConfig {
            learning_rate: self.learning_rate,
            discount_rate: self.discount_rate,
            random_chance: self.exploration.epsilon(),
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn table(&self) -> &QTable<S> {
        &self.table
    }

    /// Choose an action for `state`
    ///
    /// Explores with probability `random_chance`. Otherwise returns the best known action,
    /// or a random one if `state` has never been seen. Either way `state` has a row afterwards.
    pub fn get_action(&mut self, state: &S) -> Action {
        let known = self.table.contains(state);
        self.table.ensure(state);
        match self.exploration.choose(&mut self.rng) {
            Choice::Explore => {
                trace!("Exploring from {state}");
                self.random_action()
            }
            Choice::Exploit if known => self.best_action(state),
            Choice::Exploit => {
                trace!("First visit to {state}, acting randomly");
                self.random_action()
            }
        }
    }

    /// The best-valued action for `state`, ties going to the earliest action in the set
    ///
    /// Initializes the row for `state` if it is missing.
    pub fn best_action(&mut self, state: &S) -> Action {
        self.table.ensure(state);
        let i = self.table.best_index(state).unwrap_or(0);
        self.actions[i].clone()
    }

    /// Advance `state` by `action` and learn from the observed `reward`
    ///
    /// `state` is transitioned in place. If the resulting state is terminal, the value of
    /// the original state-action pair becomes `reward`; otherwise a TD(0) update is applied
    /// using the best action of the next state.
    ///
    /// **Errors** if `action` is not in the action set or `reward` is not finite, in which
    /// case neither `state` nor the table is touched
    pub fn update(&mut self, state: &mut S, action: &Action, reward: f64, terminal: bool) -> Result<()> {
        let a = self.action_index(action)?;
        validate_reward(reward)?;

        let orig_state = state.clone();
        state.transition(action, terminal);
        let next_state = state.clone();

        if next_state.is_terminal() {
            self.table.ensure(&orig_state)[a] = reward;
            debug!("Q({orig_state}, {action}) = {reward} (terminal)");
            return Ok(());
        }

        self.table.ensure(&orig_state);
        self.table.ensure(&next_state);
        let next_action = self.table.best_index(&next_state).unwrap_or(0);
        let q_next = self.table.get(&next_state, next_action).unwrap_or(0.0);

        let row = self.table.ensure(&orig_state);
        row[a] = td_update(row[a], reward, q_next, self.learning_rate, self.discount_rate);
        debug!("Q({orig_state}, {action}) = {:.6} via {next_state}", row[a]);
        Ok(())
    }

    fn action_index(&self, action: &Action) -> Result<usize> {
        self.actions
            .iter()
            .position(|a| a == action)
            .ok_or_else(|| Error::UnknownAction(action.to_string()))
    }

    fn random_action(&mut self) -> Action {
        let i = self.rng.choose_index(self.actions.len());
        self.actions[i].clone()
    }
}
