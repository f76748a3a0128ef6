//! Application status workflow.
//!
//! `draft → submitted → shortlisted → interviewed → hired`, with `rejected` reachable from
//! any of the three review states. Hired and rejected are absorbing.

pub mod scorecard;
pub mod service;
pub mod transitions;

#[cfg(test)]
mod tests;

pub use scorecard::{InterviewScore, InterviewScorecard, ScoreError};
pub use service::{ApplicationWorkflow, ReviewDecision, WorkflowError};
pub use transitions::{next_status, transition_to, ReviewAction, TransitionError};
