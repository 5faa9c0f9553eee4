//! Trigger-sheet bridge
//!
//! Reference render bridge that resolves every track of a project into a
//! deterministic per-tick trigger timeline. `write_project` stores the
//! timeline as JSON; `render_mix` folds note triggers into an amplitude
//! envelope with one value per tick.

use std::fs;
use std::path::Path;

use serde::Serialize;

use super::generators::{DomainRngs, Generator, TrackEnv, Trigger, VoiceState};
use super::levels::Levels;
use super::{Container, RenderBridge, Timing};
use crate::error::{Result, VaultError};
use crate::model::{Machines, Project, Track};

/// Resolved timeline of one track.
#[derive(Debug, Clone, Serialize)]
pub struct TrackSheet {
    pub name: String,
    pub machine: String,
    pub level: f64,
    pub sounds: Vec<String>,
    pub triggers: Vec<Trigger>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatchSheet {
    pub index: usize,
    pub frozen: bool,
    pub tracks: Vec<TrackSheet>,
}

/// Rendered project: patches play back to back.
#[derive(Debug, Clone, Serialize)]
pub struct TriggerSheet {
    pub bpm: u32,
    pub tpb: u32,
    pub ticks_per_patch: usize,
    pub patches: Vec<PatchSheet>,
}

impl Container for TriggerSheet {
    fn write_project(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| VaultError::DirectoryCreateError {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| VaultError::FileWriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn render_mix(&self) -> Result<Vec<f32>> {
        let mut mix = vec![0.0f32; self.patches.len() * self.ticks_per_patch];
        for (p, patch) in self.patches.iter().enumerate() {
            let offset = p * self.ticks_per_patch;
            for track in &patch.tracks {
                for trigger in &track.triggers {
                    if let Trigger::Note {
                        tick,
                        volume,
                        level,
                        ..
                    } = trigger
                    {
                        if let Some(sample) = mix.get_mut(offset + tick) {
                            *sample += (volume * level) as f32;
                        }
                    }
                }
            }
        }
        for sample in mix.iter_mut() {
            *sample = sample.clamp(0.0, 1.0);
        }
        Ok(mix)
    }
}

/// Bridge producing `TriggerSheet` containers.
#[derive(Debug, Clone, Default)]
pub struct TriggerSheetBridge {
    machines: Machines,
}

impl TriggerSheetBridge {
    pub fn new(machines: Machines) -> Self {
        Self { machines }
    }

    fn render_track(
        &self,
        track: &Track,
        generators: &[Generator],
        levels: &Levels,
        timing: &Timing,
    ) -> Result<TrackSheet> {
        self.machines.get(&track.machine)?;
        let pattern = track.pattern.resolve()?;
        let groove = track.groove.resolve()?;
        let level = levels.get(&track.name);

        let env = TrackEnv {
            pattern: &pattern,
            groove,
            temperature: track.temperature,
            density: track.density,
            dry_level: level,
            wet_level: level,
            bpm: timing.bpm,
            tpb: timing.tpb,
            n_sounds: track.sounds().len(),
        };

        let mut rngs = DomainRngs::from_seeds(&track.seeds);
        let mut voice = VoiceState::default();
        let mut triggers: Vec<Trigger> = generators
            .iter()
            .flat_map(|g| g.generate(timing.ticks(), &mut rngs, &env, &mut voice))
            .collect();
        triggers.sort_by_key(Trigger::tick);

        Ok(TrackSheet {
            name: track.name.clone(),
            machine: track.machine.clone(),
            level,
            sounds: track.sounds().iter().map(|s| s.file.clone()).collect(),
            triggers,
        })
    }
}

impl RenderBridge for TriggerSheetBridge {
    fn render(
        &self,
        project: &Project,
        generators: &[Generator],
        levels: &Levels,
        timing: &Timing,
    ) -> Result<Box<dyn Container>> {
        if timing.ticks() == 0 {
            return Err(VaultError::Render {
                reason: "timing yields zero ticks per patch".to_string(),
            });
        }

        let patches = project
            .patches
            .iter()
            .enumerate()
            .map(|(index, patch)| {
                let tracks = patch
                    .tracks
                    .iter()
                    .map(|track| self.render_track(track, generators, levels, timing))
                    .collect::<Result<Vec<_>>>()?;
                Ok(PatchSheet {
                    index,
                    frozen: patch.frozen,
                    tracks,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Box::new(TriggerSheet {
            bpm: timing.bpm,
            tpb: timing.tpb,
            ticks_per_patch: timing.ticks(),
            patches,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Patch, SampleBank, SynthContext, Tags, TrackDefinition};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn project() -> Project {
        let definitions = vec![
            TrackDefinition::new("bass", "beats.berlin", 0.5, 1.0),
            TrackDefinition::new("perc", "beats.vitling", 0.5, 1.0),
        ];
        let machines = Machines::builtin();
        let pool = SampleBank::default();
        let tags = Tags::new(&definitions, &[]);
        let ctx = SynthContext::new(&machines, &pool, &tags);
        Project::randomise(&definitions, 2, &ctx, &mut StdRng::seed_from_u64(5)).unwrap()
    }

    #[test]
    fn test_render_is_deterministic() {
        let bridge = TriggerSheetBridge::default();
        let levels = Levels::new(&["bass", "perc"]);
        let timing = Timing::default();
        let project = project();

        let a = bridge
            .render(&project, &Generator::defaults(), &levels, &timing)
            .unwrap()
            .render_mix()
            .unwrap();
        let b = bridge
            .render(&project, &Generator::defaults(), &levels, &timing)
            .unwrap()
            .render_mix()
            .unwrap();
        assert_eq!(a.len(), 2 * timing.ticks());
        assert_eq!(a, b);
        assert!(a.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_muted_mix_is_silent() {
        let bridge = TriggerSheetBridge::default();
        let mut levels = Levels::new(&["bass", "perc"]);
        levels.set("bass", 0.0).set("perc", 0.0);
        let mix = bridge
            .render(&project(), &[Generator::Beat], &levels, &Timing::default())
            .unwrap()
            .render_mix()
            .unwrap();
        assert!(mix.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_unknown_machine_fails() {
        let mut project = project();
        project.patches[0].tracks[0].machine = "beats.nowhere".to_string();
        let result = TriggerSheetBridge::default().render(
            &project,
            &[Generator::Beat],
            &Levels::new(&["bass"]),
            &Timing::default(),
        );
        assert!(matches!(result, Err(VaultError::UnknownMachine { .. })));
    }

    #[test]
    fn test_zero_ticks_rejected() {
        let timing = Timing {
            n_ticks: 0,
            ..Timing::default()
        };
        let result = TriggerSheetBridge::default().render(
            &project(),
            &[Generator::Beat],
            &Levels::new(&["bass"]),
            &timing,
        );
        assert!(matches!(result, Err(VaultError::Render { .. })));
    }

    #[test]
    fn test_write_project() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("render").join("sheet.json");
        let container = TriggerSheetBridge::default()
            .render(
                &Project::new(vec![Patch::default()]),
                &Generator::defaults(),
                &Levels::new::<&str>(&[]),
                &Timing::default(),
            )
            .unwrap();
        container.write_project(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["bpm"], 120);
        assert_eq!(value["patches"].as_array().unwrap().len(), 1);
    }
}
