//! Performance Advisory Engine
//!
//! Turns a percentage goal on cycle time, pressure or efficiency into ranked,
//! clamped parameter changes with an audit trail. Entirely algorithmic:
//! finite-difference sensitivities over the performance model.

mod advisor;
pub mod sensitivity;
pub mod templates;

pub use advisor::SensitivityAdvisor;
pub use sensitivity::Probe;
