//! Random probe hostname generation.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const NAME_PREFIX_MIN_LENGTH: usize = 6;
pub const NAME_PREFIX_MAX_LENGTH: usize = 9;
pub const NAME_PREFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
pub const NAME_SUFFIX: &str = ".com";

/// Produces hostnames of the form `[a-z]{6,9}.com`.
///
/// Seed once per process with [`ProbeNameGenerator::from_time`] so that
/// consecutive runs resolve different names.
pub struct ProbeNameGenerator {
    rng: StdRng,
}

impl ProbeNameGenerator {
    /// Seed from the wall clock.
    pub fn from_time() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or_default();
        Self::with_seed(seed)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn random_probe_name(&mut self) -> String {
        let len = self
            .rng
            .random_range(NAME_PREFIX_MIN_LENGTH..=NAME_PREFIX_MAX_LENGTH);

        let mut name = String::with_capacity(len + NAME_SUFFIX.len());
        for _ in 0..len {
            let idx = self.rng.random_range(0..NAME_PREFIX_CHARSET.len());
            name.push(NAME_PREFIX_CHARSET[idx] as char);
        }
        name.push_str(NAME_SUFFIX);
        name
    }
}

/// Check whether `name` has the shape of a generated probe.
#[cfg(test)]
pub(crate) fn is_probe_shaped(name: &str) -> bool {
    let Some(prefix) = name.strip_suffix(NAME_SUFFIX) else {
        return false;
    };
    (NAME_PREFIX_MIN_LENGTH..=NAME_PREFIX_MAX_LENGTH).contains(&prefix.len())
        && prefix.bytes().all(|b| b.is_ascii_lowercase())
}
