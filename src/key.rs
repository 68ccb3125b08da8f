use std::{fmt, hash::Hash};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A single scalar in a [`Properties`] payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prop {
    Int(i64),
    Bool(bool),
    Text(String),
}

impl fmt::Display for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prop::Int(n) => write!(f, "{n}"),
            Prop::Bool(b) => write!(f, "{b}"),
            Prop::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Prop {
    fn from(value: i64) -> Self {
        Prop::Int(value)
    }
}

impl From<bool> for Prop {
    fn from(value: bool) -> Self {
        Prop::Bool(value)
    }
}

impl From<&str> for Prop {
    fn from(value: &str) -> Self {
        Prop::Text(value.to_owned())
    }
}

impl From<String> for Prop {
    fn from(value: String) -> Self {
        Prop::Text(value)
    }
}

/// The domain-defined payload of an action or state
///
/// Equality and hashing are structural, so two payloads are the same key exactly
/// when they hold the same values in the same shape. A scalar `3` and a sequence `[3]`
/// render identically but are different keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Properties {
    #[default]
    Empty,
    Scalar(Prop),
    Seq(Vec<Prop>),
}

impl Properties {
    pub fn seq<T: Into<Prop>>(items: impl IntoIterator<Item = T>) -> Self {
        Properties::Seq(items.into_iter().map(Into::into).collect())
    }

    pub fn as_seq(&self) -> Option<&[Prop]> {
        match self {
            Properties::Seq(items) => Some(items),
            _ => None,
        }
    }
}

macro_rules! scalar_properties {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Properties {
                fn from(value: $t) -> Self {
                    Properties::Scalar(value.into())
                }
            }
        )*
    };
}

scalar_properties!(Prop, i64, bool, &str, String);

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Properties::Empty => f.write_str("None"),
            Properties::Scalar(p) => write!(f, "{p}"),
            Properties::Seq(items) => {
                for (i, p) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{p}")?;
                }
                Ok(())
            }
        }
    }
}

/// Something an agent can do, identified by its properties
///
/// Renders as `Action(<properties>)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Action {
    pub properties: Properties,
}

impl Action {
    pub const NAME: &'static str = "Action";

    pub fn new(properties: impl Into<Properties>) -> Self {
        Self {
            properties: properties.into(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", Self::NAME, self.properties)
    }
}

impl From<&str> for Action {
    fn from(value: &str) -> Self {
        Action::new(value)
    }
}

/// A state of the environment, usable as a table key
///
/// Implementors define their own transition rule. `terminal` is part of the key:
/// a state and its terminal twin are different table entries.
///
/// `transition` may mutate the receiver in place; learners clone the state before and
/// after calling it, so keys already stored in a table are never touched.
pub trait State: Clone + Eq + Hash + fmt::Display + Serialize + DeserializeOwned {
    fn properties(&self) -> &Properties;

    /// Whether the episode has ended in this state
    fn is_terminal(&self) -> bool;

    /// Advance in place in response to `action`
    ///
    /// `terminal` reports whether the environment ended the episode with this step.
    /// A state that is already terminal must stay unchanged.
    fn transition(&mut self, action: &Action, terminal: bool);

    /// Restore the initial configuration, including `terminal`
    fn reset(&mut self);
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn action_display() {
        assert_eq!(Action::from("message").to_string(), "Action(message)");
        assert_eq!(
            Action::new(Properties::seq([1i64, 2])).to_string(),
            "Action(1,2)"
        );
        assert_eq!(Action::default().to_string(), "Action(None)");
    }

    #[test]
    fn action_identity() {
        let set: HashSet<Action> = [
            Action::from("message"),
            Action::from("message"),
            Action::from("no_message"),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
        assert_ne!(
            Action::new(3i64),
            Action::new(Properties::seq([3i64])),
            "scalar and sequence payloads are distinct keys"
        );
    }
}
