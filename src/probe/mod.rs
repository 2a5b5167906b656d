//! Probe names and the registry that correlates them with captured traffic.

mod name_generator;
mod registry;

#[cfg(test)]
pub(crate) use name_generator::is_probe_shaped;
pub use name_generator::ProbeNameGenerator;
pub use registry::{MarkOutcome, ProbeRegistry};
