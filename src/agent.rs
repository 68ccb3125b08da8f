use crate::{
    algo::{DoubleQLearner, QLearner, QTable, TableId},
    error::Result,
    key::{Action, State},
    persist::SavedLearner,
    random::RandomSource,
};

/// A tabular learner that a [`Session`](crate::service::Session) can drive
pub trait Agent<S: State> {
    /// Choose an action for `state` without changing it
    fn get_action(&mut self, state: &S) -> Action;

    /// Advance `state` by `action` and learn from `reward`
    fn update(&mut self, state: &mut S, action: &Action, reward: f64, terminal: bool) -> Result<()>;

    fn actions(&self) -> &[Action];

    /// Every table the learner keeps, in a fixed order
    fn tables(&self) -> Vec<&QTable<S>>;

    fn to_saved(&self) -> SavedLearner<S>;

    /// Rebuild from a saved document with a fresh source of randomness
    fn from_saved(saved: SavedLearner<S>) -> Result<Self>
    where
        Self: Sized;
}

impl<S: State, R: RandomSource + Default> Agent<S> for QLearner<S, R> {
    fn get_action(&mut self, state: &S) -> Action {
        QLearner::get_action(self, state)
    }

    fn update(&mut self, state: &mut S, action: &Action, reward: f64, terminal: bool) -> Result<()> {
        QLearner::update(self, state, action, reward, terminal)
    }

    fn actions(&self) -> &[Action] {
        QLearner::actions(self)
    }

    fn tables(&self) -> Vec<&QTable<S>> {
        vec![self.table()]
    }

    fn to_saved(&self) -> SavedLearner<S> {
        QLearner::to_saved(self)
    }

    fn from_saved(saved: SavedLearner<S>) -> Result<Self> {
        QLearner::from_saved_with_rng(saved, R::default())
    }
}

impl<S: State, R: RandomSource + Default> Agent<S> for DoubleQLearner<S, R> {
    fn get_action(&mut self, state: &S) -> Action {
        DoubleQLearner::get_action(self, state)
    }

    fn update(&mut self, state: &mut S, action: &Action, reward: f64, terminal: bool) -> Result<()> {
        DoubleQLearner::update(self, state, action, reward, terminal)
    }

    fn actions(&self) -> &[Action] {
        DoubleQLearner::actions(self)
    }

    fn tables(&self) -> Vec<&QTable<S>> {
        vec![self.table(TableId::Zero), self.table(TableId::One)]
    }

    fn to_saved(&self) -> SavedLearner<S> {
        DoubleQLearner::to_saved(self)
    }

    fn from_saved(saved: SavedLearner<S>) -> Result<Self> {
        DoubleQLearner::from_saved_with_rng(saved, R::default())
    }
}
