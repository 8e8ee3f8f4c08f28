//! question_state - Phase derivation for the question lifecycle
//!
//! Maps the backend's raw [`QuestionStatus`](question_core::QuestionStatus)
//! plus data-presence checks onto the finer-grained UI [`Phase`].

pub mod machine;

pub use machine::{derive_phase, derive_with_report, Derivation, Phase};
