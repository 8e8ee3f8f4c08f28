//! State machine module
//!
//! Phase definitions and the pure derivation from backend records.

mod derivation;
mod phases;

pub use derivation::{derive_phase, derive_with_report, Derivation};
pub use phases::Phase;
