/// Implemented RL algorithms
pub mod algo;

/// Interface shared by the learners
pub mod agent;

/// Concrete state domains
pub mod env;

/// Error types
pub mod error;

/// Exploration policies
pub mod exploration;

/// State and action keys
pub mod key;

/// Saving and loading learners
pub mod persist;

/// Injectable randomness
pub mod random;

/// Session boundary for a hosting service
pub mod service;

mod util;

pub use agent::Agent;
pub use algo::{DoubleQLearner, QLearner, QLearnerConfig, QTable, TableId};
pub use error::{Error, Result};
pub use key::{Action, Prop, Properties, State};
pub use service::{Session, SessionConfig};
