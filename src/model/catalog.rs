//! Static catalogs
//!
//! Closed registries mapping stable string keys to the pattern functions,
//! groove functions and machines a track may reference. Keys are resolved
//! against these tables; nothing is looked up by runtime name resolution.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::rhythm;
use crate::error::{Result, VaultError};

/// Exclusive upper bound for randomness-domain seeds.
pub const SEED_LIMIT: u64 = 100_000_000;

/// Euclidean (pulses, steps) templates patterns are drawn from.
pub const EUCLID_TEMPLATES: &[(u32, u32)] = &[
    (2, 5),
    (3, 4),
    (3, 5),
    (3, 7),
    (3, 8),
    (4, 7),
    (4, 9),
    (4, 11),
    (5, 6),
    (5, 7),
    (5, 8),
    (5, 9),
    (5, 11),
    (5, 12),
    (5, 16),
    (7, 8),
    (7, 12),
    (7, 16),
    (9, 16),
    (11, 24),
    (13, 24),
];

/// Module name of the pattern functions.
pub const PATTERN_MODULE: &str = "euclid";

/// Function name of the default pattern function.
pub const PATTERN_FUNCTION: &str = "bjorklund";

/// Module name of the groove functions.
pub const GROOVE_MODULE: &str = "perkons";

/// Signature shared by pattern functions.
pub type PatternFn = fn(u32, u32) -> Vec<bool>;

/// Signature shared by groove functions.
pub type GrooveFn = fn(&mut dyn RngCore, usize) -> f64;

const PATTERN_FUNCTIONS: &[(&str, &str, PatternFn)] =
    &[(PATTERN_MODULE, PATTERN_FUNCTION, rhythm::bjorklund)];

const GROOVE_FUNCTIONS: &[(&str, GrooveFn)] = &[
    ("straight", rhythm::straight),
    ("swing", rhythm::swing),
    ("shuffle", rhythm::shuffle),
    ("push", rhythm::push),
    ("laidback", rhythm::laidback),
    ("ghost", rhythm::ghost),
];

/// Arguments to a pattern function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternArgs {
    pub pulses: u32,
    pub steps: u32,
}

/// Reference to a rhythmic template: function key plus arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    #[serde(rename = "mod")]
    pub module: String,

    #[serde(rename = "fn")]
    pub function: String,

    pub args: PatternArgs,
}

impl Pattern {
    /// Euclidean pattern with the given arguments.
    pub fn euclid(pulses: u32, steps: u32) -> Self {
        Self {
            module: PATTERN_MODULE.to_string(),
            function: PATTERN_FUNCTION.to_string(),
            args: PatternArgs { pulses, steps },
        }
    }

    /// Registry key, e.g. `euclid.bjorklund`.
    pub fn key(&self) -> String {
        format!("{}.{}", self.module, self.function)
    }

    /// Check that the function exists and accepts these arguments.
    pub fn validate(&self) -> Result<PatternFn> {
        let function = PATTERN_FUNCTIONS
            .iter()
            .find(|(module, name, _)| *module == self.module && *name == self.function)
            .map(|(_, _, f)| *f)
            .ok_or_else(|| VaultError::UnknownPattern { key: self.key() })?;

        let PatternArgs { pulses, steps } = self.args;
        if steps == 0 || pulses > steps {
            return Err(VaultError::InvalidPatternArgs { pulses, steps });
        }
        Ok(function)
    }

    /// Resolve to a step mask.
    pub fn resolve(&self) -> Result<Vec<bool>> {
        let function = self.validate()?;
        Ok(function(self.args.pulses, self.args.steps))
    }
}

/// Reference to a groove function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Groove {
    #[serde(rename = "mod")]
    pub module: String,

    #[serde(rename = "fn")]
    pub function: String,
}

impl Groove {
    /// Groove from the catalog module by name.
    pub fn named(function: &str) -> Self {
        Self {
            module: GROOVE_MODULE.to_string(),
            function: function.to_string(),
        }
    }

    /// Registry key, e.g. `perkons.swing`.
    pub fn key(&self) -> String {
        format!("{}.{}", self.module, self.function)
    }

    /// Resolve to the groove function.
    pub fn resolve(&self) -> Result<GrooveFn> {
        if self.module != GROOVE_MODULE {
            return Err(VaultError::UnknownGroove { key: self.key() });
        }
        GROOVE_FUNCTIONS
            .iter()
            .find(|(name, _)| *name == self.function)
            .map(|(_, f)| *f)
            .ok_or_else(|| VaultError::UnknownGroove { key: self.key() })
    }
}

/// Names of every groove in the catalog.
pub fn groove_names() -> impl Iterator<Item = &'static str> {
    GROOVE_FUNCTIONS.iter().map(|(name, _)| *name)
}

/// Draw a pattern uniformly from the Euclidean templates.
pub fn random_pattern<R: Rng + ?Sized>(rng: &mut R) -> Pattern {
    let (pulses, steps) = EUCLID_TEMPLATES.choose(rng).copied().unwrap_or((4, 16));
    Pattern::euclid(pulses, steps)
}

/// Draw a groove uniformly from the catalog.
pub fn random_groove<R: Rng + ?Sized>(rng: &mut R) -> Groove {
    let name = GROOVE_FUNCTIONS
        .choose(rng)
        .map(|(name, _)| *name)
        .unwrap_or("straight");
    Groove::named(name)
}

/// Draw a seed in `[0, SEED_LIMIT)`.
pub fn random_seed<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    rng.gen_range(0..SEED_LIMIT)
}

/// Capabilities of an instrument/voice implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSpec {
    /// Stable reference stored on tracks.
    pub reference: String,

    /// Whether the machine plays externally supplied samples.
    pub requires_samples: bool,

    /// Short description for listings.
    pub description: String,
}

/// Registry of machines tracks may instantiate at render time.
#[derive(Debug, Clone)]
pub struct Machines {
    specs: HashMap<String, MachineSpec>,
}

impl Machines {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            specs: HashMap::new(),
        }
    }

    /// Create a registry with the built-in machines
    pub fn builtin() -> Self {
        let mut machines = Self::new();
        machines.register("beats.detroit", true, "Sample-triggering drum machine");
        machines.register("beats.berlin", false, "Synthesised kick and percussion voice");
        machines.register("beats.vitling", false, "FM percussion voice");
        machines
    }

    /// Register (or replace) a machine
    pub fn register(&mut self, reference: &str, requires_samples: bool, description: &str) {
        self.specs.insert(
            reference.to_string(),
            MachineSpec {
                reference: reference.to_string(),
                requires_samples,
                description: description.to_string(),
            },
        );
    }

    /// Get a machine by reference
    pub fn get(&self, reference: &str) -> Result<&MachineSpec> {
        self.specs
            .get(reference)
            .ok_or_else(|| VaultError::UnknownMachine {
                machine: reference.to_string(),
            })
    }

    /// Whether the referenced machine needs samples supplied
    pub fn requires_samples(&self, reference: &str) -> Result<bool> {
        self.get(reference).map(|spec| spec.requires_samples)
    }

    /// List all registered references, sorted
    pub fn references(&self) -> Vec<&str> {
        let mut references: Vec<&str> = self.specs.keys().map(|s| s.as_str()).collect();
        references.sort_unstable();
        references
    }
}

impl Default for Machines {
    fn default() -> Self {
        Self::builtin()
    }
}
