//! Engine configuration
//!
//! Loaded from a JSON file; every field has a default so an empty object
//! (or no file at all) is a valid configuration. Command-line flags are
//! applied on top before validation.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};
use crate::model::track::{DEFAULT_CUTOFF, DEFAULT_MUTATION_LIMIT, DEFAULT_SOUND_COUNT};
use crate::model::{MachineSpec, Machines, TrackDefinition};
use crate::render::{Levels, Timing};

/// Upper bound for `bpm`.
pub const MAX_BPM: u32 = 999;

/// Upper bound for `tpb`.
pub const MAX_TPB: u32 = 960;

/// Upper bound for `n_ticks`.
pub const MAX_TICKS: u32 = 4096;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory commits are persisted to.
    pub store_dir: PathBuf,

    /// Directory rendered containers are written to; `None` disables
    /// writing.
    pub render_dir: Option<PathBuf>,

    /// Patches per randomized project.
    pub n_patches: usize,

    /// Sounds held by each sample-backed track.
    pub n_sounds: usize,

    pub cutoff: f64,

    /// Temperature/density mutations stay within `[limit, 1 - limit]`.
    pub mutation_limit: f64,

    pub bpm: u32,
    pub tpb: u32,
    pub n_ticks: u32,

    /// Seed for the session rng; drawn from entropy when absent.
    pub seed: Option<u64>,

    pub tracks: Vec<TrackDefinition>,

    /// Tag vocabulary for sample lookup.
    pub terms: Vec<String>,

    /// JSON sample manifest.
    pub samples: Option<PathBuf>,

    /// Per-track dry levels; unlisted tracks play at full level.
    pub levels: BTreeMap<String, f64>,

    /// Machines registered in addition to the built-in ones.
    pub machines: Vec<MachineSpec>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("tmp/git"),
            render_dir: Some(PathBuf::from("tmp/render")),
            n_patches: 16,
            n_sounds: DEFAULT_SOUND_COUNT,
            cutoff: DEFAULT_CUTOFF,
            mutation_limit: DEFAULT_MUTATION_LIMIT,
            bpm: 120,
            tpb: 1,
            n_ticks: 16,
            seed: None,
            tracks: vec![
                TrackDefinition::new("kick", "beats.berlin", 0.5, 0.5),
                TrackDefinition::new("snare", "beats.vitling", 0.5, 0.5),
                TrackDefinition::new("hat", "beats.vitling", 0.5, 0.5),
            ],
            terms: ["kick", "snare", "hat", "clap", "perc", "ride"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            samples: None,
            levels: BTreeMap::new(),
            machines: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Read and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| VaultError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(VaultError::InvalidConfig { reason });

        if self.n_patches == 0 {
            return invalid("n_patches must be greater than 0".to_string());
        }
        if self.n_sounds == 0 {
            return invalid("n_sounds must be greater than 0".to_string());
        }
        if self.cutoff <= 0.0 {
            return invalid(format!("cutoff must be greater than 0, got {}", self.cutoff));
        }
        if !(0.0..0.5).contains(&self.mutation_limit) {
            return invalid(format!(
                "mutation_limit must be in [0, 0.5), got {}",
                self.mutation_limit
            ));
        }
        if self.tpb == 0 || self.bpm == 0 {
            return invalid("bpm and tpb must be greater than 0".to_string());
        }
        if self.bpm > MAX_BPM || self.tpb > MAX_TPB || self.n_ticks > MAX_TICKS {
            return invalid(format!(
                "bpm, tpb and n_ticks must not exceed {}, {} and {}",
                MAX_BPM, MAX_TPB, MAX_TICKS
            ));
        }
        if self.tracks.is_empty() {
            return invalid("at least one track is required".to_string());
        }

        let mut names = HashSet::new();
        for track in &self.tracks {
            if !names.insert(track.name.as_str()) {
                return invalid(format!("duplicate track name '{}'", track.name));
            }
            for (field, value) in [("temperature", track.temperature), ("density", track.density)] {
                if !(0.0..=1.0).contains(&value) {
                    return invalid(format!(
                        "track '{}': {} must be in [0, 1], got {}",
                        track.name, field, value
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn timing(&self) -> Timing {
        Timing {
            bpm: self.bpm,
            tpb: self.tpb,
            n_ticks: self.n_ticks,
        }
    }

    /// Built-in machines plus any configured ones.
    pub fn machines(&self) -> Machines {
        let mut machines = Machines::builtin();
        for spec in &self.machines {
            machines.register(&spec.reference, spec.requires_samples, &spec.description);
        }
        machines
    }

    pub fn levels(&self) -> Levels {
        let names: Vec<&str> = self.tracks.iter().map(|t| t.name.as_str()).collect();
        let mut levels = Levels::new(&names);
        for (name, level) in &self.levels {
            levels.set(name, *level);
        }
        levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.n_patches, 16);
        assert_eq!(config.timing(), Timing::default());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"n_patches": 4, "seed": 7, "levels": {{"hat": 0.5}},
                "machines": [{{"reference": "pads.drone", "requires_samples": true,
                               "description": ""}}]}}"#
        )
        .unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.n_patches, 4);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.cutoff, DEFAULT_CUTOFF);
        assert_eq!(config.levels().get("hat"), 0.5);
        assert!(config.machines().requires_samples("pads.drone").unwrap());
    }

    #[test]
    fn test_validation_failures() {
        let mut config = EngineConfig::default();
        config.cutoff = 0.0;
        assert!(matches!(
            config.validate(),
            Err(VaultError::InvalidConfig { .. })
        ));

        let mut config = EngineConfig::default();
        config.mutation_limit = 0.5;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.tracks.push(TrackDefinition::new("kick", "beats.berlin", 0.5, 0.5));
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.tracks[0].density = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timing_bounds() {
        let mut config = EngineConfig::default();
        config.bpm = MAX_BPM;
        config.tpb = MAX_TPB;
        config.n_ticks = MAX_TICKS;
        assert!(config.validate().is_ok());

        config.bpm = u32::MAX;
        assert!(matches!(
            config.validate(),
            Err(VaultError::InvalidConfig { .. })
        ));

        let mut config = EngineConfig::default();
        config.n_ticks = MAX_TICKS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = EngineConfig::load(Path::new("/nonexistent/rhythmvault.json"));
        assert!(matches!(result, Err(VaultError::FileReadError { .. })));
    }
}
