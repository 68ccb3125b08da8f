//! Saving and loading learners
//!
//! Learners are stored as a versioned JSON document holding the hyperparameters, the action
//! set, and every table row. Rows are written sorted by the display form of their state so that
//! the same learner always produces the same bytes.

use std::{collections::HashSet, fs, path::Path};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    agent::Agent,
    algo::{validate_actions, QLearnerConfig, QTable},
    error::{Error, Result},
    key::{Action, State},
};

/// Which learner a saved document belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearnerKind {
    QLearner,
    DoubleQLearner,
}

impl LearnerKind {
    fn table_count(self) -> usize {
        match self {
            LearnerKind::QLearner => 1,
            LearnerKind::DoubleQLearner => 2,
        }
    }
}

/// One table row: a state and its values, in the order of the action set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRow<S> {
    pub state: S,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLearner<S> {
    pub version: u32,
    pub kind: LearnerKind,
    pub config: QLearnerConfig,
    pub actions: Vec<Action>,
    pub tables: Vec<Vec<SavedRow<S>>>,
}

impl<S: State> SavedLearner<S> {
    pub const VERSION: u32 = 1;

    pub(crate) fn new(
        kind: LearnerKind,
        config: QLearnerConfig,
        actions: Vec<Action>,
        tables: &[&QTable<S>],
    ) -> Self {
        let tables = tables
            .iter()
            .map(|table| {
                let mut rows: Vec<_> = table
                    .iter()
                    .map(|(state, values)| SavedRow {
                        state: state.clone(),
                        values: values.to_vec(),
                    })
                    .collect();
                rows.sort_by_cached_key(|row| row.state.to_string());
                rows
            })
            .collect();
        Self {
            version: Self::VERSION,
            kind,
            config,
            actions,
            tables,
        }
    }

    /// Validate the document against `expected` and split it into its parts
    ///
    /// **Errors** with [`Error::Format`] unless the document is complete and consistent
    pub(crate) fn into_parts(
        self,
        expected: LearnerKind,
    ) -> Result<(QLearnerConfig, Vec<Action>, Vec<QTable<S>>)> {
        if self.version != Self::VERSION {
            return Err(Error::Format(format!(
                "unsupported version {} (expected {})",
                self.version,
                Self::VERSION
            )));
        }
        if self.kind != expected {
            return Err(Error::Format(format!(
                "saved learner is a {:?}, not a {:?}",
                self.kind, expected
            )));
        }
        self.config
            .validate()
            .map_err(|e| Error::Format(e.to_string()))?;
        validate_actions(&self.actions).map_err(|e| Error::Format(e.to_string()))?;
        if self.tables.len() != expected.table_count() {
            return Err(Error::Format(format!(
                "expected {} table(s), found {}",
                expected.table_count(),
                self.tables.len()
            )));
        }

        let n_actions = self.actions.len();
        let mut tables = Vec::with_capacity(self.tables.len());
        for rows in self.tables {
            let mut table = QTable::new(n_actions);
            for SavedRow { state, values } in rows {
                if values.len() != n_actions {
                    return Err(Error::Format(format!(
                        "row for {state} has {} values, expected {n_actions}",
                        values.len()
                    )));
                }
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(Error::Format(format!("row for {state} has a non-finite value")));
                }
                let key = state.to_string();
                if table.insert_row(state, values).is_some() {
                    return Err(Error::Format(format!("duplicate row for {key}")));
                }
            }
            tables.push(table);
        }

        if let [first, second] = &tables[..] {
            let states: HashSet<_> = first.iter().map(|(s, _)| s).collect();
            if first.len() != second.len() || second.iter().any(|(s, _)| !states.contains(s)) {
                return Err(Error::Format("double tables know different states".to_owned()));
            }
        }

        Ok((self.config, self.actions, tables))
    }
}

/// Encode a saved learner as bytes
pub fn serialize<S: State>(saved: &SavedLearner<S>) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(saved)?)
}

/// Decode bytes produced by [`serialize`]
///
/// Only the document shape is checked here; consistency is checked when a learner is built
/// from the result with [`QLearner::from_saved`](crate::QLearner::from_saved) or
/// [`DoubleQLearner::from_saved`](crate::DoubleQLearner::from_saved), or in one step with
/// [`learner_from_bytes`].
pub fn deserialize<S: State>(bytes: &[u8]) -> Result<SavedLearner<S>> {
    serde_json::from_slice(bytes).map_err(|e| Error::Format(e.to_string()))
}

/// Decode and validate a learner in one step
pub fn learner_from_bytes<S: State, L: Agent<S>>(bytes: &[u8]) -> Result<L> {
    L::from_saved(deserialize(bytes)?)
}

/// Write a saved learner to `path`, creating parent directories as needed
pub fn save<S: State>(saved: &SavedLearner<S>, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, serialize(saved)?).map_err(io_err)?;
    info!("Saved {:?} to {}", saved.kind, path.display());
    Ok(())
}

/// Read a saved learner from `path`
pub fn load<S: State>(path: impl AsRef<Path>) -> Result<SavedLearner<S>> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let saved = deserialize(&bytes)?;
    info!("Loaded learner from {}", path.display());
    Ok(saved)
}
