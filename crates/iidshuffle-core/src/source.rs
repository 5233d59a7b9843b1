//! In-process sample sources.
//!
//! Every source implements [`SampleSource`] and produces raw bytes. Two of them
//! are expected to look IID (`uniform`, `os`); the rest carry deliberate
//! structure so the permutation test has something to reject.

use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Metadata about a sample source.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    /// Unique identifier (e.g. `"uniform"`).
    pub name: &'static str,
    /// One-line human-readable description.
    pub description: &'static str,
    /// Whether a correct permutation test should accept this source's output.
    pub iid_expected: bool,
}

/// Trait that every sample source implements.
pub trait SampleSource: Send + Sync {
    fn info(&self) -> &SourceInfo;

    /// Check if this source can operate on the current machine.
    fn is_available(&self) -> bool {
        true
    }

    /// Collect `n_samples` bytes. May return fewer if the source fails.
    fn collect(&self, n_samples: usize) -> Vec<u8>;

    fn name(&self) -> &'static str {
        self.info().name
    }
}

/// Widen bytes into integer observations.
pub fn to_integers(bytes: &[u8]) -> Vec<i64> {
    bytes.iter().map(|&b| i64::from(b)).collect()
}

// ---------------------------------------------------------------------------
// UniformSource
// ---------------------------------------------------------------------------

static UNIFORM_INFO: SourceInfo = SourceInfo {
    name: "uniform",
    description: "Seeded pseudo-random bytes, uniform over 0-255",
    iid_expected: true,
};

/// Uniform bytes from a seeded `StdRng`. Each call replays the same stream.
pub struct UniformSource {
    seed: u64,
}

impl UniformSource {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl SampleSource for UniformSource {
    fn info(&self) -> &SourceInfo {
        &UNIFORM_INFO
    }

    fn collect(&self, n_samples: usize) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut buf = vec![0u8; n_samples];
        rng.fill_bytes(&mut buf);
        buf
    }
}

// ---------------------------------------------------------------------------
// OsSource
// ---------------------------------------------------------------------------

static OS_INFO: SourceInfo = SourceInfo {
    name: "os",
    description: "Operating system CSPRNG via getrandom",
    iid_expected: true,
};

/// Bytes from the operating system's CSPRNG. Not reproducible.
pub struct OsSource;

impl SampleSource for OsSource {
    fn info(&self) -> &SourceInfo {
        &OS_INFO
    }

    fn is_available(&self) -> bool {
        let mut byte = [0u8; 1];
        getrandom::fill(&mut byte).is_ok()
    }

    fn collect(&self, n_samples: usize) -> Vec<u8> {
        let mut buf = vec![0u8; n_samples];
        match getrandom::fill(&mut buf) {
            Ok(()) => buf,
            Err(e) => {
                warn!("os source unavailable: {e}");
                Vec::new()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ConstantSource
// ---------------------------------------------------------------------------

static CONSTANT_INFO: SourceInfo = SourceInfo {
    name: "constant",
    description: "The same byte repeated; degenerate input with no median split",
    iid_expected: false,
};

pub struct ConstantSource {
    value: u8,
}

impl ConstantSource {
    pub fn new(value: u8) -> Self {
        Self { value }
    }
}

impl SampleSource for ConstantSource {
    fn info(&self) -> &SourceInfo {
        &CONSTANT_INFO
    }

    fn collect(&self, n_samples: usize) -> Vec<u8> {
        vec![self.value; n_samples]
    }
}

// ---------------------------------------------------------------------------
// RampSource
// ---------------------------------------------------------------------------

static RAMP_INFO: SourceInfo = SourceInfo {
    name: "ramp",
    description: "Bytes counting 0, 1, ..., 255 and wrapping around",
    iid_expected: false,
};

pub struct RampSource;

impl SampleSource for RampSource {
    fn info(&self) -> &SourceInfo {
        &RAMP_INFO
    }

    fn collect(&self, n_samples: usize) -> Vec<u8> {
        (0..n_samples).map(|i| (i % 256) as u8).collect()
    }
}

// ---------------------------------------------------------------------------
// RandomWalkSource
// ---------------------------------------------------------------------------

static RANDOM_WALK_INFO: SourceInfo = SourceInfo {
    name: "random_walk",
    description: "Seeded random walk with steps in [-4, 4], reflected into 0-255",
    iid_expected: false,
};

/// Strongly autocorrelated bytes: each sample is a small step from the last.
pub struct RandomWalkSource {
    seed: u64,
}

impl RandomWalkSource {
    const MAX_STEP: i32 = 4;

    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl SampleSource for RandomWalkSource {
    fn info(&self) -> &SourceInfo {
        &RANDOM_WALK_INFO
    }

    fn collect(&self, n_samples: usize) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut position: i32 = 128;
        (0..n_samples)
            .map(|_| {
                position += rng.random_range(-Self::MAX_STEP..=Self::MAX_STEP);
                if position < 0 {
                    position = -position;
                } else if position > 255 {
                    position = 510 - position;
                }
                position as u8
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Byte repeated by the `constant` source when built from the registry.
pub const CONSTANT_BYTE: u8 = 0x5A;

/// All sample source constructors. Seeded sources use `seed`.
pub fn all_sources(seed: u64) -> Vec<Box<dyn SampleSource>> {
    vec![
        Box::new(UniformSource::new(seed)),
        Box::new(OsSource),
        Box::new(ConstantSource::new(CONSTANT_BYTE)),
        Box::new(RampSource),
        Box::new(RandomWalkSource::new(seed)),
    ]
}

/// Look up a source by name.
pub fn source_by_name(name: &str, seed: u64) -> Option<Box<dyn SampleSource>> {
    all_sources(seed).into_iter().find(|s| s.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_names_are_unique() {
        let sources = all_sources(0);
        let mut names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), sources.len());
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(source_by_name("ramp", 0).unwrap().name(), "ramp");
        assert!(source_by_name("nope", 0).is_none());
    }

    #[test]
    fn seeded_sources_are_reproducible() {
        let a = UniformSource::new(17).collect(256);
        let b = UniformSource::new(17).collect(256);
        let c = UniformSource::new(18).collect(256);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(
            RandomWalkSource::new(3).collect(100),
            RandomWalkSource::new(3).collect(100)
        );
    }

    #[test]
    fn sources_return_requested_length() {
        for source in all_sources(9) {
            if !source.is_available() {
                continue;
            }
            assert_eq!(source.collect(333).len(), 333, "{}", source.name());
        }
    }

    #[test]
    fn random_walk_steps_are_small() {
        let walk = RandomWalkSource::new(1).collect(5000);
        let mut steps = walk.windows(2).map(|w| i32::from(w[1]) - i32::from(w[0]));
        assert!(steps.all(|step| step.abs() <= 4));
    }

    #[test]
    fn ramp_wraps_and_constant_repeats() {
        let ramp = RampSource.collect(300);
        assert_eq!(ramp[255], 255);
        assert_eq!(ramp[256], 0);
        assert!(ConstantSource::new(7).collect(10).iter().all(|&b| b == 7));
        assert_eq!(to_integers(&[0, 255]), vec![0, 255]);
    }
}
