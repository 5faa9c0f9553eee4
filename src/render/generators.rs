//! Generator catalog
//!
//! Generators turn one track's resolved parameters into timed triggers.
//! Each seed domain drives its own rng, so perturbing one domain never
//! shifts the draws of another.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::model::catalog::GrooveFn;
use crate::model::rhythm::is_active;
use crate::model::{SeedDomain, Seeds};

/// Sample-and-hold values the echo modulation picks from.
pub const SAMPLE_HOLD_LEVELS: &[&str] = &["0000", "2000", "4000", "6000", "8000"];

/// Beats between echo modulations.
pub const DEFAULT_QUANTISE: u32 = 4;

/// A timed event emitted by a generator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    Note {
        tick: usize,
        sound: usize,
        volume: f64,
        level: f64,
    },
    Modulation {
        tick: usize,
        level: f64,
        echo_delay: String,
        echo_wet: String,
        echo_feedback: String,
    },
}

impl Trigger {
    pub fn tick(&self) -> usize {
        match self {
            Trigger::Note { tick, .. } | Trigger::Modulation { tick, .. } => *tick,
        }
    }
}

/// One rng per seed domain of a track.
pub struct DomainRngs {
    rngs: BTreeMap<SeedDomain, StdRng>,
}

impl DomainRngs {
    pub fn from_seeds(seeds: &Seeds) -> Self {
        Self {
            rngs: seeds
                .iter()
                .map(|(&domain, &seed)| (domain, StdRng::seed_from_u64(seed)))
                .collect(),
        }
    }

    pub fn get(&mut self, domain: SeedDomain) -> Option<&mut StdRng> {
        self.rngs.get_mut(&domain)
    }
}

/// Resolved per-track inputs shared by all generators.
pub struct TrackEnv<'a> {
    pub pattern: &'a [bool],
    pub groove: GrooveFn,
    pub temperature: f64,
    pub density: f64,
    pub dry_level: f64,
    pub wet_level: f64,
    pub bpm: u32,
    pub tpb: u32,
    pub n_sounds: usize,
}

/// Which of a track's sounds is currently playing.
#[derive(Debug, Default)]
pub struct VoiceState {
    pub sound: usize,
}

impl VoiceState {
    fn toggle(&mut self, n_sounds: usize) {
        if n_sounds > 1 {
            self.sound = (self.sound + 1) % n_sounds;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Generator {
    /// Notes on active pattern steps, thinned by density.
    Beat,

    /// Echo modulation every `quantise` beats.
    GhostEcho {
        sample_hold_levels: Vec<String>,
        quantise: u32,
    },
}

impl Generator {
    pub fn ghost_echo() -> Self {
        Generator::GhostEcho {
            sample_hold_levels: SAMPLE_HOLD_LEVELS.iter().map(|s| s.to_string()).collect(),
            quantise: DEFAULT_QUANTISE,
        }
    }

    /// Beat followed by the default ghost echo.
    pub fn defaults() -> Vec<Generator> {
        vec![Generator::Beat, Generator::ghost_echo()]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Generator::Beat => "beat",
            Generator::GhostEcho { .. } => "ghost_echo",
        }
    }

    /// Triggers for `n` ticks.
    pub fn generate(
        &self,
        n: usize,
        rngs: &mut DomainRngs,
        env: &TrackEnv<'_>,
        voice: &mut VoiceState,
    ) -> Vec<Trigger> {
        match self {
            Generator::Beat => beat(n, rngs, env, voice),
            Generator::GhostEcho {
                sample_hold_levels,
                quantise,
            } => ghost_echo(n, rngs, env, sample_hold_levels, *quantise),
        }
    }
}

fn beat(
    n: usize,
    rngs: &mut DomainRngs,
    env: &TrackEnv<'_>,
    voice: &mut VoiceState,
) -> Vec<Trigger> {
    let tpb = env.tpb.max(1) as usize;
    let mut triggers = Vec::new();

    for i in (0..n).step_by(tpb) {
        let j = i / tpb;
        let volume = rngs
            .get(SeedDomain::Volume)
            .map_or(1.0, |rng| (env.groove)(rng, j));

        if let Some(rng) = rngs.get(SeedDomain::Sound) {
            if rng.gen::<f64>() < env.temperature {
                voice.toggle(env.n_sounds);
            }
        }

        if !is_active(env.pattern, j) {
            continue;
        }
        let hit = rngs
            .get(SeedDomain::Beat)
            .is_some_and(|rng| rng.gen::<f64>() < env.density);
        if hit {
            triggers.push(Trigger::Note {
                tick: i,
                sound: voice.sound,
                volume,
                level: env.dry_level,
            });
        }
    }
    triggers
}

fn ghost_echo(
    n: usize,
    rngs: &mut DomainRngs,
    env: &TrackEnv<'_>,
    sample_hold_levels: &[String],
    quantise: u32,
) -> Vec<Trigger> {
    let period = (quantise as usize).saturating_mul(env.tpb as usize).max(1);
    let delay = format!(
        "{:#x}",
        128 * u64::from(env.bpm) * u64::from(env.tpb) * 3 / 10
    );

    let Some(rng) = rngs.get(SeedDomain::Fx) else {
        return Vec::new();
    };

    let mut triggers = Vec::new();
    for i in (0..n).step_by(period) {
        let (Some(wet), Some(feedback)) = (
            sample_hold_levels.choose(rng).cloned(),
            sample_hold_levels.choose(rng).cloned(),
        ) else {
            break;
        };
        triggers.push(Trigger::Modulation {
            tick: i,
            level: env.wet_level,
            echo_delay: delay.clone(),
            echo_wet: wet,
            echo_feedback: feedback,
        });
    }
    triggers
}
