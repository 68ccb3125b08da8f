//! Concrete state domains

pub mod message;

pub use message::{message_actions, parse_action, MessageState, MESSAGE, NO_MESSAGE};
