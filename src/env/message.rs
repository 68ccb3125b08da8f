use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    key::{Action, Prop, Properties, State},
};

/// Action payload for sending a message
pub const MESSAGE: &str = "message";
/// Action payload for staying quiet
pub const NO_MESSAGE: &str = "no_message";

/// The two actions of the messaging domain, in their canonical order
pub fn message_actions() -> Vec<Action> {
    vec![Action::from(MESSAGE), Action::from(NO_MESSAGE)]
}

/// A messaging episode, tracked as `[steps, messages]`
///
/// Every step advances the step counter, and the `message` action also advances
/// the message counter. Renders as `State(<steps>,<messages>)`.
///
/// Deserializing checks that the properties are exactly two non-negative integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMessageState")]
pub struct MessageState {
    properties: Properties,
    pub terminal: bool,
}

impl MessageState {
    pub const NAME: &'static str = "State";

    pub fn new(steps: i64, messages: i64) -> Self {
        Self {
            properties: Properties::seq([steps, messages]),
            terminal: false,
        }
    }

    pub fn steps(&self) -> i64 {
        self.counter(0)
    }

    pub fn messages(&self) -> i64 {
        self.counter(1)
    }

    fn counter(&self, i: usize) -> i64 {
        match self.properties().as_seq().and_then(|p| p.get(i)) {
            Some(Prop::Int(n)) => *n,
            _ => 0,
        }
    }

    fn set_counters(&mut self, steps: i64, messages: i64) {
        self.properties = Properties::seq([steps, messages]);
    }
}

impl Default for MessageState {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl fmt::Display for MessageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", Self::NAME, self.properties())
    }
}

/// The unchecked serialized form of a [`MessageState`]
#[derive(Deserialize)]
struct RawMessageState {
    properties: Properties,
    terminal: bool,
}

impl TryFrom<RawMessageState> for MessageState {
    type Error = Error;

    fn try_from(raw: RawMessageState) -> Result<Self> {
        let invalid = || Error::Parse {
            input: raw.properties.to_string(),
            reason: "expected two non-negative integer counters".to_owned(),
        };
        match raw.properties.as_seq().ok_or_else(invalid)? {
            [Prop::Int(steps), Prop::Int(messages)] if *steps >= 0 && *messages >= 0 => Ok(Self {
                properties: Properties::seq([*steps, *messages]),
                terminal: raw.terminal,
            }),
            _ => Err(invalid()),
        }
    }
}

impl State for MessageState {
    fn properties(&self) -> &Properties {
        &self.properties
    }

    fn is_terminal(&self) -> bool {
        self.terminal
    }

    fn transition(&mut self, action: &Action, terminal: bool) {
        if self.terminal {
            return;
        }
        let sent = matches!(
            &action.properties,
            Properties::Scalar(Prop::Text(s)) if s == MESSAGE
        );
        let (steps, messages) = (self.steps(), self.messages());
        // Counters stop at i64::MAX rather than wrapping
        self.set_counters(
            steps.saturating_add(1),
            messages.saturating_add(i64::from(sent)),
        );
        self.terminal = terminal;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Parses the `steps,messages` form used in request arguments, e.g. `"3,1"`
impl FromStr for MessageState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parse_err = |reason: &str| Error::Parse {
            input: s.to_owned(),
            reason: reason.to_owned(),
        };
        let counters = s
            .split(',')
            .map(|part| part.trim().parse::<i64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| parse_err(&e.to_string()))?;
        match counters[..] {
            [steps, messages] if steps >= 0 && messages >= 0 => Ok(Self::new(steps, messages)),
            _ => Err(parse_err("expected two comma-separated non-negative integers")),
        }
    }
}

/// Parses an action argument, accepting only the two messaging actions
pub fn parse_action(s: &str) -> Result<Action> {
    match s.trim() {
        MESSAGE => Ok(Action::from(MESSAGE)),
        NO_MESSAGE => Ok(Action::from(NO_MESSAGE)),
        other => Err(Error::Parse {
            input: other.to_owned(),
            reason: format!("expected `{MESSAGE}` or `{NO_MESSAGE}`"),
        }),
    }
}
