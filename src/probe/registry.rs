//! The probe set and its observed marks.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::ProbeNameGenerator;
use crate::error::RegistryError;

/// Result of reporting a captured hostname to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// The probe at this index was seen for the first time.
    NewlyMarked(usize),
    /// Every probe with this name was already seen; nothing changed.
    AlreadyMarked(usize),
    /// The hostname is not one of ours.
    NotAProbe,
}

impl MarkOutcome {
    pub fn is_probe(&self) -> bool {
        !matches!(self, Self::NotAProbe)
    }
}

#[derive(Debug)]
struct Probe {
    name: String,
    observed: AtomicBool,
}

/// Owns the generated probe names and tracks which ones leaked.
///
/// Population needs `&mut self` and so happens before the registry is
/// shared. Afterwards `mark` may run on the capture thread while
/// `leak_count` is polled from the main thread; every shared access goes
/// through an atomic.
#[derive(Debug, Default)]
pub struct ProbeRegistry {
    probes: Vec<Probe>,
    leaks: AtomicUsize,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from known names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            probes: names
                .into_iter()
                .map(|name| Probe {
                    name: name.into(),
                    observed: AtomicBool::new(false),
                })
                .collect(),
            leaks: AtomicUsize::new(0),
        }
    }

    /// Replace the probe set with `n` fresh names, none observed.
    pub fn generate(
        &mut self,
        n: usize,
        generator: &mut ProbeNameGenerator,
    ) -> Result<(), RegistryError> {
        if n == 0 {
            return Err(RegistryError::EmptyProbeSet);
        }

        self.probes = (0..n)
            .map(|_| Probe {
                name: generator.random_probe_name(),
                observed: AtomicBool::new(false),
            })
            .collect();
        self.leaks.store(0, Ordering::Release);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<&str, RegistryError> {
        self.probes
            .get(index)
            .map(|probe| probe.name.as_str())
            .ok_or(RegistryError::OutOfRange {
                index,
                len: self.probes.len(),
            })
    }

    /// Mark the first unobserved probe named exactly `name`.
    ///
    /// Linear scan; probe sets are small.
    pub fn mark(&self, name: &str) -> MarkOutcome {
        let mut already = None;

        for (index, probe) in self.probes.iter().enumerate() {
            if probe.name != name {
                continue;
            }
            if probe
                .observed
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                self.leaks.fetch_add(1, Ordering::AcqRel);
                return MarkOutcome::NewlyMarked(index);
            }
            already.get_or_insert(index);
        }

        match already {
            Some(index) => MarkOutcome::AlreadyMarked(index),
            None => MarkOutcome::NotAProbe,
        }
    }

    pub fn leak_count(&self) -> usize {
        self.leaks.load(Ordering::Acquire)
    }

    pub fn is_observed(&self, index: usize) -> Result<bool, RegistryError> {
        self.probes
            .get(index)
            .map(|probe| probe.observed.load(Ordering::Acquire))
            .ok_or(RegistryError::OutOfRange {
                index,
                len: self.probes.len(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.probes.iter().map(|probe| probe.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Drop the probe storage. Safe on a registry that was never populated.
    pub fn release(&mut self) {
        self.probes = Vec::new();
        self.leaks.store(0, Ordering::Release);
    }
}
