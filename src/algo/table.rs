use std::collections::{BTreeMap, HashMap};

use log::trace;

use crate::key::{Action, State};

/// A table rendered for display: state string → action string → value, sorted by key
pub type RenderedTable = BTreeMap<String, BTreeMap<String, f64>>;

/// A Q-table mapping each observed state to one value per possible action
///
/// Rows are stored in the order of the learner's action set. A state is present iff
/// it has been observed, and when it first appears every action gets a value of `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable<S: State> {
    rows: HashMap<S, Vec<f64>>,
    n_actions: usize,
}

impl<S: State> QTable<S> {
    pub fn new(n_actions: usize) -> Self {
        Self {
            rows: HashMap::new(),
            n_actions,
        }
    }

    /// Number of actions in every row
    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Number of known states
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, state: &S) -> bool {
        self.rows.contains_key(state)
    }

    pub fn row(&self, state: &S) -> Option<&[f64]> {
        self.rows.get(state).map(Vec::as_slice)
    }

    /// Value of the action at index `action` in `state`, if the state is known
    pub fn get(&self, state: &S, action: usize) -> Option<f64> {
        self.rows.get(state).and_then(|row| row.get(action)).copied()
    }

    /// Get the row for `state`, creating a zeroed one on first access
    pub fn ensure(&mut self, state: &S) -> &mut [f64] {
        let n_actions = self.n_actions;
        self.rows.entry(state.clone()).or_insert_with(|| {
            trace!("Initializing row for {state}");
            vec![0.0; n_actions]
        })
    }

    /// Index of the best-valued action in `state`, ties going to the earliest action
    pub fn best_index(&self, state: &S) -> Option<usize> {
        self.rows.get(state).and_then(|row| first_max(row))
    }

    /// Iterate over every known state and its row
    pub fn iter(&self) -> impl Iterator<Item = (&S, &[f64])> {
        self.rows.iter().map(|(s, row)| (s, row.as_slice()))
    }

    /// Insert a full row, replacing any existing one
    ///
    /// Returns the previous row, if there was one.
    pub(crate) fn insert_row(&mut self, state: S, row: Vec<f64>) -> Option<Vec<f64>> {
        debug_assert_eq!(row.len(), self.n_actions);
        self.rows.insert(state, row)
    }

    /// Render with display strings as keys, for printing
    pub fn render(&self, actions: &[Action]) -> RenderedTable {
        self.rows
            .iter()
            .map(|(state, row)| {
                let values = actions
                    .iter()
                    .zip(row)
                    .map(|(a, &v)| (a.to_string(), v))
                    .collect();
                (state.to_string(), values)
            })
            .collect()
    }
}

/// Index of the first maximal element
///
/// `Iterator::max_by` keeps the last of equal elements, so ties are folded by hand.
pub(crate) fn first_max(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if v <= b || v.is_nan() => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MessageState;

    fn state(steps: i64, messages: i64) -> MessageState {
        MessageState::new(steps, messages)
    }

    #[test]
    fn first_max_prefers_earliest() {
        assert_eq!(first_max(&[0.0, 0.0]), Some(0));
        assert_eq!(first_max(&[0.0, 1.0, 1.0]), Some(1));
        assert_eq!(first_max(&[-1.0, -2.0]), Some(0));
        assert_eq!(first_max(&[]), None);
    }

    #[test]
    fn first_max_skips_nan() {
        assert_eq!(first_max(&[f64::NAN, 0.5, 0.1]), Some(1));
    }

    #[test]
    fn ensure_initializes_all_actions() {
        let mut table = QTable::new(3);
        assert!(!table.contains(&state(0, 0)));
        assert_eq!(table.ensure(&state(0, 0)), &[0.0, 0.0, 0.0]);
        assert!(table.contains(&state(0, 0)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn ensure_keeps_existing_row() {
        let mut table = QTable::new(2);
        table.ensure(&state(1, 0))[1] = 0.5;
        assert_eq!(table.ensure(&state(1, 0)), &[0.0, 0.5]);
        assert_eq!(table.best_index(&state(1, 0)), Some(1));
        assert_eq!(table.best_index(&state(2, 0)), None);
    }

    #[test]
    fn terminal_flag_separates_rows() {
        let mut table = QTable::new(2);
        let active = state(1, 1);
        let mut terminal = active.clone();
        terminal.terminal = true;
        table.ensure(&active)[0] = 1.0;
        table.ensure(&terminal);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&terminal, 0), Some(0.0));
    }

    #[test]
    fn render_sorts_by_string() {
        let actions = [Action::from("message"), Action::from("no_message")];
        let mut table = QTable::new(2);
        table.ensure(&state(1, 0))[0] = 0.25;
        table.ensure(&state(0, 0));

        let rendered = table.render(&actions);
        let keys: Vec<_> = rendered.keys().cloned().collect();
        assert_eq!(keys, ["State(0,0)", "State(1,0)"]);
        assert_eq!(rendered["State(1,0)"]["Action(message)"], 0.25);
        assert_eq!(rendered["State(1,0)"]["Action(no_message)"], 0.0);
    }
}
