//! Samples, sample pools and track tags
//!
//! Sample-backed tracks pick their sounds from a pool filtered by the tag
//! currently assigned to the track. The pool is always passed in; there is
//! no process-wide default pool.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::track::TrackDefinition;
use crate::error::{Result, VaultError};

/// A single sample reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Bank the sample lives in.
    pub bank: String,

    /// Path of the sample within its bank.
    pub file: String,

    /// MIDI note the sample is mapped to.
    #[serde(default)]
    pub note: u8,

    /// Tags used for lookup, e.g. `kick`.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Sample {
    /// Create a sample with tags.
    pub fn new(bank: &str, file: &str, note: u8, tags: &[&str]) -> Self {
        Self {
            bank: bank.to_string(),
            file: file.to_string(),
            note,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Whether the sample carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Source of samples for synthesis and the `sounds` mutation.
pub trait SamplePool {
    /// All samples satisfying the predicate, in pool order.
    fn match_samples(&self, predicate: &dyn Fn(&Sample) -> bool) -> Vec<Sample>;
}

/// In-memory sample pool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleBank {
    pub samples: Vec<Sample>,
}

impl SampleBank {
    /// Create a pool from samples.
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// Load a pool from a JSON manifest (an array of samples).
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| VaultError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let samples: Vec<Sample> = serde_json::from_str(&content)?;
        Ok(Self { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl SamplePool for SampleBank {
    fn match_samples(&self, predicate: &dyn Fn(&Sample) -> bool) -> Vec<Sample> {
        self.samples.iter().filter(|s| predicate(s)).cloned().collect()
    }
}

/// Filter the pool by tag and shuffle the matches.
pub fn shuffled_matches<R: Rng + ?Sized>(
    pool: &dyn SamplePool,
    tag: &str,
    rng: &mut R,
) -> Vec<Sample> {
    let mut sounds = pool.match_samples(&|sample: &Sample| sample.has_tag(tag));
    sounds.shuffle(rng);
    sounds
}

/// Tag currently assigned to each track, plus the tag vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags {
    assigned: BTreeMap<String, String>,
    terms: Vec<String>,
}

impl Tags {
    /// Each track starts tagged with its own name.
    pub fn new(tracks: &[TrackDefinition], terms: &[String]) -> Self {
        Self {
            assigned: tracks
                .iter()
                .map(|t| (t.name.clone(), t.name.clone()))
                .collect(),
            terms: terms.to_vec(),
        }
    }

    /// Tag for a track; unassigned tracks fall back to their name.
    pub fn get<'a>(&'a self, track: &'a str) -> &'a str {
        self.assigned.get(track).map(|s| s.as_str()).unwrap_or(track)
    }

    /// Assign a tag to a track.
    pub fn set(&mut self, track: &str, tag: &str) {
        self.assigned.insert(track.to_string(), tag.to_string());
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Every assigned tag must be a known term.
    pub fn validate(&self) -> Result<&Self> {
        for (track, tag) in &self.assigned {
            if !self.terms.iter().any(|term| term == tag) {
                return Err(VaultError::UnknownTag {
                    track: track.clone(),
                    tag: tag.clone(),
                });
            }
        }
        Ok(self)
    }

    /// Draw every track's tag from the terms.
    pub fn randomise<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &mut Self {
        if self.terms.is_empty() {
            return self;
        }
        for tag in self.assigned.values_mut() {
            if let Some(term) = self.terms.choose(rng) {
                tag.clone_from(term);
            }
        }
        self
    }

    /// Re-tag every track with its own name.
    pub fn reset(&mut self) -> &mut Self {
        for (track, tag) in self.assigned.iter_mut() {
            tag.clone_from(track);
        }
        self
    }

    /// `kick=kick, snare=clap` style summary.
    pub fn summary(&self) -> String {
        self.assigned
            .iter()
            .map(|(track, tag)| format!("{}={}", track, tag))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn definitions() -> Vec<TrackDefinition> {
        ["kick", "snare", "hat"]
            .iter()
            .map(|name| TrackDefinition::new(name, "beats.detroit", 0.5, 0.5))
            .collect()
    }

    fn terms() -> Vec<String> {
        ["kick", "snare", "hat", "perc", "clap"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_match_samples_by_tag() {
        let bank = SampleBank::new(vec![
            Sample::new("drums", "kick.wav", 36, &["kick"]),
            Sample::new("drums", "snare.wav", 38, &["snare"]),
            Sample::new("drums", "kick2.wav", 36, &["kick", "909"]),
        ]);
        let mut rng = StdRng::seed_from_u64(0);
        let kicks = shuffled_matches(&bank, "kick", &mut rng);
        assert_eq!(kicks.len(), 2);
        assert!(kicks.iter().all(|s| s.has_tag("kick")));
        assert!(shuffled_matches(&bank, "hat", &mut rng).is_empty());
    }

    #[test]
    fn test_tags_default_to_track_names() {
        let tags = Tags::new(&definitions(), &terms());
        assert_eq!(tags.get("kick"), "kick");
        assert_eq!(tags.get("unknown"), "unknown");
        assert!(tags.validate().is_ok());
    }

    #[test]
    fn test_tags_randomise_and_reset() {
        let mut tags = Tags::new(&definitions(), &terms());
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..10 {
            tags.randomise(&mut rng);
            assert!(tags.validate().is_ok());
        }
        tags.reset();
        assert_eq!(tags, Tags::new(&definitions(), &terms()));
    }

    #[test]
    fn test_tags_validate_unknown_term() {
        let mut tags = Tags::new(&definitions(), &terms());
        tags.set("hat", "cowbell");
        assert!(matches!(tags.validate(), Err(VaultError::UnknownTag { .. })));
    }

    #[test]
    fn test_summary() {
        let mut tags = Tags::new(&definitions(), &terms());
        tags.set("snare", "clap");
        assert_eq!(tags.summary(), "hat=hat, kick=kick, snare=clap");
    }
}
