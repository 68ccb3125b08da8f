//! The boundary between the learning engine and whatever transport hosts it
//!
//! A [`Session`] owns one learner and the current environment state behind a single lock,
//! so concurrent requests never interleave a read-modify-write of the table.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use log::{info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{
    agent::Agent,
    algo::{QLearner, QLearnerConfig, QTable, RenderedTable},
    env::message_actions,
    error::Result,
    key::{Action, State},
    persist,
};

/// Ask `learner` for an action in `state`
///
/// May create a table row for `state` but never changes `state` itself.
pub fn select_action<S: State, L: Agent<S>>(learner: &mut L, state: &S) -> Action {
    learner.get_action(state)
}

/// Advance `state` by `action` and let `learner` learn from `reward`
pub fn apply_feedback<S: State, L: Agent<S>>(
    learner: &mut L,
    state: &mut S,
    action: &Action,
    reward: f64,
    terminal: bool,
) -> Result<()> {
    learner.update(state, action, reward, terminal)
}

/// Restore `state` to its initial configuration; tables are untouched
pub fn reset_state<S: State>(state: &mut S) {
    state.reset();
}

/// Render `table` keyed by display strings, sorted for stable output
pub fn render_table<S: State>(table: &QTable<S>, actions: &[Action]) -> RenderedTable {
    table.render(actions)
}

/// Startup settings for a [`Session`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub learner: QLearnerConfig,
    /// **Default**: `message` and `no_message`
    pub actions: Vec<Action>,
    /// Where the learner is loaded from at startup and dumped to on request
    ///
    /// **Default**: `data/q_learner.json`
    pub model_path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            learner: QLearnerConfig::default(),
            actions: message_actions(),
            model_path: PathBuf::from("data/q_learner.json"),
        }
    }
}

struct Inner<S, L> {
    learner: L,
    state: S,
}

/// A learner and the state it is currently acting in
pub struct Session<S: State, L: Agent<S>> {
    inner: Mutex<Inner<S, L>>,
}

impl<S: State> Session<S, QLearner<S>> {
    /// Build a single-table session from `config`, resuming from `config.model_path` if it exists
    pub fn from_config(config: &SessionConfig, state: S) -> Result<Self> {
        Self::load_or_new(&config.model_path, state, || {
            QLearner::new(config.learner, config.actions.clone())
        })
    }
}

impl<S: State, L: Agent<S>> Session<S, L> {
    pub fn new(learner: L, state: S) -> Self {
        info!(
            "Starting session in {state} with {} actions",
            learner.actions().len()
        );
        Self {
            inner: Mutex::new(Inner { learner, state }),
        }
    }

    /// Resume a learner saved at `path`, or build one with `fresh` if nothing is saved there
    ///
    /// **Errors** if a saved learner exists but cannot be read
    pub fn load_or_new(
        path: impl AsRef<Path>,
        state: S,
        fresh: impl FnOnce() -> Result<L>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let learner = if path.exists() {
            persist::load(path)
                .and_then(L::from_saved)
                .inspect_err(|e| warn!("Could not resume from {}: {e}", path.display()))?
        } else {
            fresh()?
        };
        Ok(Self::new(learner, state))
    }

    /// Choose an action for `state`, or for the current state if none is given
    pub fn select_action(&self, state: Option<&S>) -> Action {
        let mut inner = self.inner.lock();
        let Inner { learner, state: current } = &mut *inner;
        select_action(learner, state.unwrap_or(&*current))
    }

    /// Apply `action` to the current state, learn from `reward`, and return the new state
    pub fn apply_feedback(&self, action: &Action, reward: f64, terminal: bool) -> Result<S> {
        let mut inner = self.inner.lock();
        let Inner { learner, state } = &mut *inner;
        apply_feedback(learner, state, action, reward, terminal)?;
        Ok(state.clone())
    }

    /// Let the learner pick the action for `hint`, then apply it to the current state
    ///
    /// Returns the action taken and the new current state.
    pub fn apply_feedback_for(&self, hint: &S, reward: f64, terminal: bool) -> Result<(Action, S)> {
        let mut inner = self.inner.lock();
        let Inner { learner, state } = &mut *inner;
        let action = select_action(learner, hint);
        apply_feedback(learner, state, &action, reward, terminal)?;
        Ok((action, state.clone()))
    }

    /// Reset the current state and return it
    pub fn reset_state(&self) -> S {
        let mut inner = self.inner.lock();
        reset_state(&mut inner.state);
        info!("State reset to {}", inner.state);
        inner.state.clone()
    }

    pub fn current_state(&self) -> S {
        self.inner.lock().state.clone()
    }

    /// Render every table of the learner
    pub fn render_tables(&self) -> Vec<RenderedTable> {
        let inner = self.inner.lock();
        let actions = inner.learner.actions();
        inner
            .learner
            .tables()
            .into_iter()
            .map(|table| render_table(table, actions))
            .collect()
    }

    /// Pretty-printed JSON of the learner's table
    ///
    /// A learner with more than one table renders as an object keyed `table_0`, `table_1`, ...
    pub fn render_json(&self) -> Result<String> {
        let mut tables = self.render_tables();
        let json = if tables.len() == 1 {
            serde_json::to_string_pretty(&tables.remove(0))?
        } else {
            let keyed: BTreeMap<_, _> = tables
                .into_iter()
                .enumerate()
                .map(|(i, table)| (format!("table_{i}"), table))
                .collect();
            serde_json::to_string_pretty(&keyed)?
        };
        Ok(json)
    }

    /// Save the learner to `path`
    pub fn dump(&self, path: impl AsRef<Path>) -> Result<()> {
        let saved = self.inner.lock().learner.to_saved();
        persist::save(&saved, path)
    }

    /// Read access to the learner, under the session lock
    pub fn with_learner<T>(&self, f: impl FnOnce(&L) -> T) -> T {
        f(&self.inner.lock().learner)
    }

    /// Tear down the session, returning the learner and the current state
    pub fn into_parts(self) -> (L, S) {
        let Inner { learner, state } = self.inner.into_inner();
        (learner, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        algo::DoubleQLearner,
        env::{MessageState, MESSAGE},
        random::RngSource,
    };

    fn greedy_config() -> QLearnerConfig {
        QLearnerConfig {
            random_chance: 0.0,
            ..Default::default()
        }
    }

    fn session() -> Session<MessageState, QLearner<MessageState>> {
        let learner =
            QLearner::with_rng(greedy_config(), message_actions(), RngSource::seeded(1)).unwrap();
        Session::new(learner, MessageState::default())
    }

    #[test]
    fn select_action_leaves_state_alone() {
        let session = session();
        session.select_action(None);
        session.select_action(Some(&MessageState::new(4, 4)));
        assert_eq!(session.current_state(), MessageState::default());
        session.with_learner(|l| {
            assert!(l.table().contains(&MessageState::default()));
            assert!(l.table().contains(&MessageState::new(4, 4)));
        });
    }

    #[test]
    fn feedback_advances_current_state() {
        let session = session();
        let state = session
            .apply_feedback(&Action::from(MESSAGE), 1.0, false)
            .unwrap();
        assert_eq!(state, MessageState::new(1, 1));
        assert_eq!(session.current_state(), state);
        let q = session.with_learner(|l| l.table().get(&MessageState::default(), 0));
        assert!((q.unwrap() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn feedback_for_hint_uses_learner_choice() {
        let session = session();
        let hint = MessageState::new(7, 3);
        let (action, state) = session.apply_feedback_for(&hint, 0.0, false).unwrap();
        assert!(message_actions().contains(&action));
        assert_eq!(state.steps(), 1);
    }

    #[test]
    fn reset_returns_initial_state() {
        let session = session();
        session
            .apply_feedback(&Action::from(MESSAGE), 1.0, true)
            .unwrap();
        assert!(session.current_state().is_terminal());
        assert_eq!(session.reset_state(), MessageState::default());
        assert_eq!(session.reset_state(), MessageState::default());
        // Tables survive a reset
        assert_eq!(session.with_learner(|l| l.table().len()), 1);
    }

    #[test]
    fn render_json_sorted() {
        let session = session();
        session
            .apply_feedback(&Action::from(MESSAGE), 1.0, false)
            .unwrap();
        let json = session.render_json().unwrap();
        let parsed: RenderedTable = serde_json::from_str(&json).unwrap();
        let keys: Vec<_> = parsed.keys().cloned().collect();
        assert_eq!(keys, ["State(0,0)", "State(1,1)"]);
        assert!((parsed["State(0,0)"]["Action(message)"] - 0.1).abs() < 1e-9);
    }

    #[test]
    fn render_json_keys_double_tables() {
        let learner: DoubleQLearner<MessageState> =
            DoubleQLearner::new(greedy_config(), message_actions()).unwrap();
        let session = Session::new(learner, MessageState::default());
        session.select_action(None);
        let json = session.render_json().unwrap();
        let parsed: BTreeMap<String, RenderedTable> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.keys().collect::<Vec<_>>(), ["table_0", "table_1"]);
        assert_eq!(parsed["table_1"]["State(0,0)"]["Action(no_message)"], 0.0);
    }

    #[test]
    fn invalid_feedback_keeps_state() {
        let session = session();
        assert!(session
            .apply_feedback(&Action::from("shout"), 1.0, false)
            .is_err());
        assert_eq!(session.current_state(), MessageState::default());
    }
}
