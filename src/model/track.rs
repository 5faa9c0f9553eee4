//! Tracks
//!
//! One instrument/voice's generative parameters within a patch. A track is
//! either generic or sample-backed; the sample-backed kind additionally
//! owns a fixed-size selection of sounds drawn from a tag-filtered pool.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::catalog::{random_groove, random_pattern, random_seed, Groove, Machines, Pattern};
use super::sample::{shuffled_matches, Sample, SamplePool, Tags};
use crate::error::{Result, VaultError};

/// Default lower bound for temperature/density mutation.
pub const DEFAULT_MUTATION_LIMIT: f64 = 0.25;

/// Default number of sounds held by a sample-backed track.
pub const DEFAULT_SOUND_COUNT: usize = 2;

/// Default cutoff applied to selected sounds.
pub const DEFAULT_CUTOFF: f64 = 0.5;

/// Configured defaults a track is synthesized from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDefinition {
    /// Stable track name, e.g. `kick`.
    pub name: String,

    /// Machine reference instantiated at render time.
    pub machine: String,

    /// Probability of spontaneous sound switching.
    pub temperature: f64,

    /// Probability a pattern step actually sounds.
    pub density: f64,
}

impl TrackDefinition {
    pub fn new(name: &str, machine: &str, temperature: f64, density: f64) -> Self {
        Self {
            name: name.to_string(),
            machine: machine.to_string(),
            temperature,
            density,
        }
    }
}

/// Named, independent source of randomness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedDomain {
    Beat,
    Fx,
    Sound,
    Volume,
}

impl SeedDomain {
    /// Domains every track carries.
    pub const GENERIC: [SeedDomain; 3] = [SeedDomain::Fx, SeedDomain::Volume, SeedDomain::Beat];

    /// Domains a sample-backed track carries.
    pub const SAMPLED: [SeedDomain; 4] = [
        SeedDomain::Fx,
        SeedDomain::Volume,
        SeedDomain::Beat,
        SeedDomain::Sound,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeedDomain::Beat => "beat",
            SeedDomain::Fx => "fx",
            SeedDomain::Sound => "sound",
            SeedDomain::Volume => "volume",
        }
    }
}

/// Per-domain seeds in `[0, 1e8)`.
pub type Seeds = BTreeMap<SeedDomain, u64>;

/// Discriminant persisted alongside the machine reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Generic,
    Sampled,
}

impl TrackKind {
    /// Seed domains fixed for this kind.
    pub fn seed_domains(&self) -> &'static [SeedDomain] {
        match self {
            TrackKind::Generic => &SeedDomain::GENERIC,
            TrackKind::Sampled => &SeedDomain::SAMPLED,
        }
    }
}

/// Kind-specific state.
#[derive(Debug, Clone, PartialEq)]
pub enum Voice {
    Generic,
    Sampled { sounds: Vec<Sample>, cutoff: f64 },
}

/// Single-attribute perturbations a mutation may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Pattern,
    Groove,
    Seeds,
    Temperature,
    Density,
    Sounds,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::Pattern,
        Attribute::Groove,
        Attribute::Seeds,
        Attribute::Temperature,
        Attribute::Density,
        Attribute::Sounds,
    ];

    /// Whether a track of this kind can be perturbed on this attribute.
    pub fn applies_to(&self, track: &Track) -> bool {
        match self {
            Attribute::Sounds => track.kind() == TrackKind::Sampled,
            _ => true,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Attribute::Pattern => "pattern",
            Attribute::Groove => "groove",
            Attribute::Seeds => "seeds",
            Attribute::Temperature => "temperature",
            Attribute::Density => "density",
            Attribute::Sounds => "sounds",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Attribute {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pattern" => Ok(Attribute::Pattern),
            "groove" => Ok(Attribute::Groove),
            "seeds" => Ok(Attribute::Seeds),
            "temperature" => Ok(Attribute::Temperature),
            "density" => Ok(Attribute::Density),
            "sounds" | "samples" => Ok(Attribute::Sounds),
            _ => Err(VaultError::UnknownAttribute {
                attr: s.to_string(),
            }),
        }
    }
}

/// Everything synthesis and mutation draw on besides the rng.
#[derive(Clone, Copy)]
pub struct SynthContext<'a> {
    pub machines: &'a Machines,
    pub pool: &'a dyn SamplePool,
    pub tags: &'a Tags,
    pub n_sounds: usize,
    pub cutoff: f64,
    pub mutation_limit: f64,
}

impl<'a> SynthContext<'a> {
    /// Context with default sound count, cutoff and mutation limit.
    pub fn new(machines: &'a Machines, pool: &'a dyn SamplePool, tags: &'a Tags) -> Self {
        Self {
            machines,
            pool,
            tags,
            n_sounds: DEFAULT_SOUND_COUNT,
            cutoff: DEFAULT_CUTOFF,
            mutation_limit: DEFAULT_MUTATION_LIMIT,
        }
    }
}

/// Generative parameters of one voice.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub name: String,
    pub machine: String,
    pub pattern: Pattern,
    pub groove: Groove,
    pub seeds: Seeds,
    pub temperature: f64,
    pub density: f64,
    pub voice: Voice,
}

impl Track {
    /// Synthesize a track from its definition.
    ///
    /// Pattern and groove are drawn from the catalogs and every seed domain
    /// gets a fresh seed. Temperature and density are copied unmodified.
    pub fn randomise<R: Rng + ?Sized>(
        definition: &TrackDefinition,
        ctx: &SynthContext<'_>,
        rng: &mut R,
    ) -> Result<Self> {
        let sampled = ctx.machines.requires_samples(&definition.machine)?;

        let pattern = random_pattern(rng);
        let groove = random_groove(rng);
        let mut seeds: Seeds = SeedDomain::GENERIC
            .iter()
            .map(|&domain| (domain, random_seed(rng)))
            .collect();

        let voice = if sampled {
            let tag = ctx.tags.get(&definition.name);
            let mut sounds = shuffled_matches(ctx.pool, tag, rng);
            if sounds.len() < ctx.n_sounds {
                return Err(VaultError::InsufficientSamples {
                    tag: tag.to_string(),
                    needed: ctx.n_sounds,
                    found: sounds.len(),
                });
            }
            sounds.truncate(ctx.n_sounds);
            seeds.insert(SeedDomain::Sound, random_seed(rng));
            Voice::Sampled {
                sounds,
                cutoff: ctx.cutoff,
            }
        } else {
            Voice::Generic
        };

        Ok(Self {
            name: definition.name.clone(),
            machine: definition.machine.clone(),
            pattern,
            groove,
            seeds,
            temperature: definition.temperature,
            density: definition.density,
            voice,
        })
    }

    pub fn kind(&self) -> TrackKind {
        match self.voice {
            Voice::Generic => TrackKind::Generic,
            Voice::Sampled { .. } => TrackKind::Sampled,
        }
    }

    /// Selected sounds; empty for generic tracks.
    pub fn sounds(&self) -> &[Sample] {
        match &self.voice {
            Voice::Generic => &[],
            Voice::Sampled { sounds, .. } => sounds,
        }
    }

    /// Apply one perturbation to this track.
    ///
    /// On error the track is left unchanged.
    pub fn mutate<R: Rng + ?Sized>(
        &mut self,
        attr: Attribute,
        ctx: &SynthContext<'_>,
        rng: &mut R,
    ) -> Result<()> {
        let limit = ctx.mutation_limit;
        match attr {
            Attribute::Pattern => self.pattern = random_pattern(rng),
            Attribute::Groove => self.groove = random_groove(rng),
            Attribute::Seeds => {
                if let Some(&domain) = self.seeds.keys().choose(rng) {
                    self.seeds.insert(domain, random_seed(rng));
                }
            }
            Attribute::Temperature => self.temperature = rng.gen_range(limit..=1.0 - limit),
            Attribute::Density => self.density = rng.gen_range(limit..=1.0 - limit),
            Attribute::Sounds => self.shuffle_sounds(ctx, rng)?,
        }
        Ok(())
    }

    /// Replace one held sound, chosen uniformly, with the top pick of a
    /// freshly shuffled match list. The other sounds stay untouched.
    fn shuffle_sounds<R: Rng + ?Sized>(
        &mut self,
        ctx: &SynthContext<'_>,
        rng: &mut R,
    ) -> Result<()> {
        let Voice::Sampled { sounds, .. } = &mut self.voice else {
            return Err(VaultError::UnsupportedAttribute {
                attr: Attribute::Sounds.to_string(),
                track: self.name.clone(),
            });
        };

        let tag = ctx.tags.get(&self.name);
        let candidates = shuffled_matches(ctx.pool, tag, rng);
        let Some(pick) = candidates.first() else {
            return Err(VaultError::InsufficientSamples {
                tag: tag.to_string(),
                needed: 1,
                found: 0,
            });
        };

        if !sounds.is_empty() {
            let i = rng.gen_range(0..sounds.len());
            sounds[i] = pick.clone();
        }
        Ok(())
    }
}

/// Pick one track satisfying `filter` and apply `attr` to it only.
///
/// Returns the index of the mutated track. Fails with `NoMatchingTracks`
/// when nothing matches, leaving every track unchanged.
pub fn mutate_attr<R, F>(
    tracks: &mut [Track],
    attr: Attribute,
    filter: F,
    ctx: &SynthContext<'_>,
    rng: &mut R,
) -> Result<usize>
where
    R: Rng + ?Sized,
    F: Fn(&Track) -> bool,
{
    let candidates: Vec<usize> = tracks
        .iter()
        .enumerate()
        .filter(|(_, track)| filter(track))
        .map(|(i, _)| i)
        .collect();

    let index = *candidates
        .choose(rng)
        .ok_or_else(|| VaultError::NoMatchingTracks {
            attr: attr.to_string(),
        })?;

    tracks[index].mutate(attr, ctx, rng)?;
    Ok(index)
}
