// Workflow transition rules
// Pure evaluation only: nothing here talks to the server or touches the board snapshot.

pub mod validator;

pub use validator::{evaluate, evaluate_item, offered_statuses, Decision, Proposal};
