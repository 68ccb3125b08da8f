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

/// One of the two tables of a [`DoubleQLearner`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableId {
    Zero = 0,
    One = 1,
}

impl TableId {
    pub fn other(self) -> Self {
        match self {
            TableId::Zero => TableId::One,
            TableId::One => TableId::Zero,
        }
    }

    /// A fair coin: `One` when the sample falls below one half
    fn flip(rng: &mut impl RandomSource) -> Self {
        if rng.uniform() < 0.5 {
            TableId::One
        } else {
            TableId::Zero
        }
    }
}

/// Double Q-learning agent
///
/// Keeps two tables that always know the same states. Each update writes to one table chosen
/// by a coin flip and bootstraps from the other, which keeps the estimate from chasing its own
/// maximum.
#[derive(Debug, Clone)]
pub struct DoubleQLearner<S: State, R: RandomSource = RngSource<StdRng>> {
    tables: [QTable<S>; 2],
    actions: Vec<Action>,
    exploration: EpsilonGreedy,
    learning_rate: f64,
    discount_rate: f64,
    rng: R,
}

impl<S: State> DoubleQLearner<S> {
    /// Initialize a new `DoubleQLearner` over a fixed set of possible actions
    ///
    /// **Errors** under the same conditions as [`QLearner::new`](super::QLearner::new)
    pub fn new(config: QLearnerConfig, actions: Vec<Action>) -> Result<Self> {
        Self::with_rng(config, actions, RngSource::default())
    }

    pub fn from_saved(saved: SavedLearner<S>) -> Result<Self> {
        Self::from_saved_with_rng(saved, RngSource::default())
    }
}

impl<S: State, R: RandomSource> DoubleQLearner<S, R> {
    pub fn with_rng(config: QLearnerConfig, actions: Vec<Action>, rng: R) -> Result<Self> {
        config.validate()?;
        validate_actions(&actions)?;
        Ok(Self {
            tables: [QTable::new(actions.len()), QTable::new(actions.len())],
            actions,
            exploration: EpsilonGreedy::new(config.random_chance)?,
            learning_rate: config.learning_rate,
            discount_rate: config.discount_rate,
            rng,
        })
    }

    pub fn from_saved_with_rng(saved: SavedLearner<S>, rng: R) -> Result<Self> {
        let (config, actions, tables) = saved.into_parts(LearnerKind::DoubleQLearner)?;
        let mut learner = Self::with_rng(config, actions, rng)?;
        learner.tables = <[QTable<S>; 2]>::try_from(tables)
            .map_err(|t| Error::Format(format!("expected 2 tables, found {}", t.len())))?;
        Ok(learner)
    }

    pub fn to_saved(&self) -> SavedLearner<S> {
        SavedLearner::new(
            LearnerKind::DoubleQLearner,
            self.config(),
            self.actions.clone(),
            &[&self.tables[0], &self.tables[1]],
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

    pub fn table(&self, id: TableId) -> &QTable<S> {
        &self.tables[id as usize]
    }

    /// The best action for `state` in one table, or `None` if that table has not seen it
    ///
    /// This is a pure lookup and never creates rows.
    pub fn best_action_in(&self, id: TableId, state: &S) -> Option<&Action> {
        self.table(id)
            .best_index(state)
            .map(|i| &self.actions[i])
    }

    /// Choose an action for `state`
    ///
    /// Explores with probability `random_chance`. Otherwise one of the two tables is picked
    /// at random and its best action is returned; an unseen state gets a random action.
    /// Either way `state` has a row in both tables afterwards.
    pub fn get_action(&mut self, state: &S) -> Action {
        let action = match self.exploration.choose(&mut self.rng) {
            Choice::Explore => {
                trace!("Exploring from {state}");
                None
            }
            Choice::Exploit => {
                let inspected = TableId::flip(&mut self.rng);
                self.best_action_in(inspected, state).cloned()
            }
        };
        self.ensure(state);
        action.unwrap_or_else(|| self.random_action())
    }

    /// Advance `state` by `action` and learn from the observed `reward`
    ///
    /// A coin flip picks the table to write. If the resulting state is terminal, that table's
    /// value for the original state-action pair becomes `reward`. Otherwise the next action is
    /// chosen with [`get_action`](Self::get_action) and the written table is updated with the
    /// other table's value for it.
    ///
    /// **Errors** if `action` is not in the action set or `reward` is not finite, in which
    /// case neither `state` nor the tables are touched
    pub fn update(&mut self, state: &mut S, action: &Action, reward: f64, terminal: bool) -> Result<()> {
        let a = self.action_index(action)?;
        validate_reward(reward)?;

        let orig_state = state.clone();
        state.transition(action, terminal);
        let next_state = state.clone();
        let target = TableId::flip(&mut self.rng);

        self.ensure(&orig_state);
        if next_state.is_terminal() {
            self.tables[target as usize].ensure(&orig_state)[a] = reward;
            debug!("Q{}({orig_state}, {action}) = {reward} (terminal)", target as usize);
            return Ok(());
        }

        self.ensure(&next_state);
        let next_action = self.get_action(&next_state);
        let next = self.action_index(&next_action)?;
        let q_next = self.tables[target.other() as usize]
            .get(&next_state, next)
            .unwrap_or(0.0);

        let row = self.tables[target as usize].ensure(&orig_state);
        row[a] = td_update(row[a], reward, q_next, self.learning_rate, self.discount_rate);
        debug!(
            "Q{}({orig_state}, {action}) = {:.6} via {next_state}",
            target as usize, row[a]
        );
        Ok(())
    }

    fn ensure(&mut self, state: &S) {
        for table in &mut self.tables {
            table.ensure(state);
        }
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
