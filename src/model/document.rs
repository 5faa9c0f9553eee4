//! Plain-document (JSON) form of projects.
//!
//! Track records carry an explicit `kind`. Records written before the field
//! existed are still accepted; their kind is inferred from the machine
//! registry.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::catalog::{Groove, Machines, Pattern};
use super::patch::Patch;
use super::project::Project;
use super::sample::Sample;
use super::track::{SeedDomain, Seeds, Track, TrackKind, Voice, DEFAULT_CUTOFF};
use crate::error::{Result, VaultError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    pub patches: Vec<PatchDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchDocument {
    pub tracks: Vec<TrackDocument>,

    #[serde(default)]
    pub frozen: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDocument {
    pub name: String,
    pub machine: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TrackKind>,

    pub pattern: Pattern,
    pub groove: Groove,
    pub seeds: Seeds,
    pub temperature: f64,
    pub density: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sounds: Option<Vec<Sample>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutoff: Option<f64>,
}

impl From<&Track> for TrackDocument {
    fn from(track: &Track) -> Self {
        let (sounds, cutoff) = match &track.voice {
            Voice::Generic => (None, None),
            Voice::Sampled { sounds, cutoff } => (Some(sounds.clone()), Some(*cutoff)),
        };
        Self {
            name: track.name.clone(),
            machine: track.machine.clone(),
            kind: Some(track.kind()),
            pattern: track.pattern.clone(),
            groove: track.groove.clone(),
            seeds: track.seeds.clone(),
            temperature: track.temperature,
            density: track.density,
            sounds,
            cutoff,
        }
    }
}

impl TrackDocument {
    /// Validate and convert into a track.
    pub fn into_track(self, machines: &Machines) -> Result<Track> {
        let invalid = |reason: String| VaultError::InvalidDocument {
            reason: format!("track '{}': {}", self.name, reason),
        };

        let kind = match self.kind {
            Some(kind) => kind,
            None if machines.requires_samples(&self.machine)? => TrackKind::Sampled,
            None => TrackKind::Generic,
        };

        self.pattern.validate()?;
        self.groove.resolve()?;

        for (field, value) in [("temperature", self.temperature), ("density", self.density)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("{} {} outside [0, 1]", field, value)));
            }
        }

        let expected: BTreeSet<SeedDomain> = kind.seed_domains().iter().copied().collect();
        let found: BTreeSet<SeedDomain> = self.seeds.keys().copied().collect();
        if expected != found {
            return Err(invalid(format!(
                "seed domains {:?} do not match {:?} track",
                found, kind
            )));
        }

        let voice = match kind {
            TrackKind::Generic => Voice::Generic,
            TrackKind::Sampled => {
                let sounds = self
                    .sounds
                    .clone()
                    .ok_or_else(|| invalid("sampled track without sounds".to_string()))?;
                let cutoff = match (self.kind, self.cutoff) {
                    (_, Some(cutoff)) => cutoff,
                    (None, None) => DEFAULT_CUTOFF,
                    (Some(_), None) => {
                        return Err(invalid("sampled track without cutoff".to_string()))
                    }
                };
                Voice::Sampled { sounds, cutoff }
            }
        };

        Ok(Track {
            name: self.name,
            machine: self.machine,
            pattern: self.pattern,
            groove: self.groove,
            seeds: self.seeds,
            temperature: self.temperature,
            density: self.density,
            voice,
        })
    }
}

impl From<&Project> for ProjectDocument {
    fn from(project: &Project) -> Self {
        Self {
            patches: project
                .patches
                .iter()
                .map(|patch| PatchDocument {
                    tracks: patch.tracks.iter().map(TrackDocument::from).collect(),
                    frozen: patch.frozen,
                })
                .collect(),
        }
    }
}

impl ProjectDocument {
    pub fn into_project(self, machines: &Machines) -> Result<Project> {
        let patches = self
            .patches
            .into_iter()
            .map(|patch| {
                let tracks = patch
                    .tracks
                    .into_iter()
                    .map(|track| track.into_track(machines))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Patch {
                    tracks,
                    frozen: patch.frozen,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Project::new(patches))
    }
}

impl Project {
    pub fn to_document(&self) -> ProjectDocument {
        ProjectDocument::from(self)
    }

    /// Pretty-printed JSON form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    pub fn from_json(json: &str, machines: &Machines) -> Result<Self> {
        let document: ProjectDocument = serde_json::from_str(json)?;
        document.into_project(machines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sample::{SampleBank, Tags};
    use crate::model::track::{Attribute, SynthContext, TrackDefinition};
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn project() -> Project {
        let definitions = vec![
            TrackDefinition::new("kick", "beats.detroit", 0.3, 0.8),
            TrackDefinition::new("bass", "beats.berlin", 0.5, 0.5),
        ];
        let machines = Machines::builtin();
        let pool = SampleBank::new(vec![
            Sample::new("drums", "k1.wav", 36, &["kick"]),
            Sample::new("drums", "k2.wav", 36, &["kick"]),
            Sample::new("drums", "k3.wav", 36, &["kick"]),
        ]);
        let tags = Tags::new(&definitions, &[]);
        let ctx = SynthContext::new(&machines, &pool, &tags);
        let mut project =
            Project::randomise(&definitions, 3, &ctx, &mut StdRng::seed_from_u64(21)).unwrap();
        project.freeze(1);
        project
    }

    fn legacy_track() -> serde_json::Value {
        json!({
            "name": "kick",
            "machine": "beats.detroit",
            "pattern": {"mod": "euclid", "fn": "bjorklund", "args": {"pulses": 3, "steps": 8}},
            "groove": {"mod": "perkons", "fn": "swing"},
            "seeds": {"fx": 1, "volume": 2, "beat": 3, "sound": 4},
            "temperature": 0.5,
            "density": 0.5,
            "sounds": [{"bank": "drums", "file": "k1.wav", "tags": ["kick"]}]
        })
    }

    #[test]
    fn test_json_round_trip() {
        let machines = Machines::builtin();
        let original = project();
        let json = original.to_json().unwrap();
        let restored = Project::from_json(&json, &machines).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_round_trip_after_float_mutations() {
        let definitions = vec![
            TrackDefinition::new("bass", "beats.berlin", 0.3, 0.5),
            TrackDefinition::new("perc", "beats.vitling", 0.5, 0.5),
        ];
        let machines = Machines::builtin();
        let pool = SampleBank::default();
        let tags = Tags::new(&definitions, &[]);
        let ctx = SynthContext::new(&machines, &pool, &tags);
        let mut rng = StdRng::seed_from_u64(77);

        let mut project = Project::randomise(&definitions, 16, &ctx, &mut rng).unwrap();
        for _ in 0..200 {
            project = project
                .mutated(Attribute::Temperature, 2, &ctx, &mut rng)
                .unwrap()
                .mutated(Attribute::Density, 2, &ctx, &mut rng)
                .unwrap();
            let restored = Project::from_json(&project.to_json().unwrap(), &machines).unwrap();
            assert_eq!(restored, project);
        }
    }

    #[test]
    fn test_wire_shape() {
        let value = serde_json::to_value(project().to_document()).unwrap();
        let track = &value["patches"][0]["tracks"][0];
        assert_eq!(value["patches"][0]["frozen"], json!(true));
        assert_eq!(track["kind"], json!("sampled"));
        assert_eq!(track["pattern"]["mod"], json!("euclid"));
        assert!(track["seeds"]["sound"].is_u64());
        assert!(value["patches"][0]["tracks"][1].get("sounds").is_none());
    }

    #[test]
    fn test_legacy_document_infers_kind() {
        let machines = Machines::builtin();
        let document: TrackDocument = serde_json::from_value(legacy_track()).unwrap();
        let track = document.into_track(&machines).unwrap();
        assert_eq!(track.kind(), TrackKind::Sampled);
        assert_eq!(
            track.voice,
            Voice::Sampled {
                sounds: vec![Sample::new("drums", "k1.wav", 0, &["kick"])],
                cutoff: DEFAULT_CUTOFF,
            }
        );
    }

    #[test]
    fn test_explicit_kind_skips_machine_lookup() {
        let mut value = legacy_track();
        value["machine"] = json!("beats.unregistered");
        value["kind"] = json!("sampled");
        value["cutoff"] = json!(0.4);
        let document: TrackDocument = serde_json::from_value(value).unwrap();
        assert!(document.into_track(&Machines::new()).is_ok());
    }

    #[test]
    fn test_rejects_invalid_records() {
        let machines = Machines::builtin();

        let mut seeds = legacy_track();
        seeds["seeds"] = json!({"fx": 1, "volume": 2, "beat": 3});
        let document: TrackDocument = serde_json::from_value(seeds).unwrap();
        assert!(matches!(
            document.into_track(&machines),
            Err(VaultError::InvalidDocument { .. })
        ));

        let mut density = legacy_track();
        density["density"] = json!(1.5);
        let document: TrackDocument = serde_json::from_value(density).unwrap();
        assert!(document.into_track(&machines).is_err());

        let mut pattern = legacy_track();
        pattern["pattern"]["args"] = json!({"pulses": 9, "steps": 8});
        let document: TrackDocument = serde_json::from_value(pattern).unwrap();
        assert!(matches!(
            document.into_track(&machines),
            Err(VaultError::InvalidPatternArgs { .. })
        ));

        let mut machine = legacy_track();
        machine["machine"] = json!("beats.unregistered");
        let document: TrackDocument = serde_json::from_value(machine).unwrap();
        assert!(matches!(
            document.into_track(&machines),
            Err(VaultError::UnknownMachine { .. })
        ));
    }
}
