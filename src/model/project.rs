//! Projects
//!
//! The top-level generative snapshot: an ordered list of patches. Every
//! operation here works on an owned working copy; committed snapshots are
//! never edited in place.

use rand::seq::SliceRandom;
use rand::Rng;

use super::patch::Patch;
use super::track::{Attribute, SynthContext, TrackDefinition};
use crate::error::{Result, VaultError};

/// Patches per arrangement phrase.
pub const PHRASE_SIZE: usize = 4;

/// Phrase templates: each slot indexes into the shuffled root patches.
const PHRASE_TEMPLATES: &[[usize; PHRASE_SIZE]] = &[
    [0, 1, 0, 0],
    [0, 0, 1, 0],
    [0, 0, 0, 1],
    [0, 0, 0, 1],
    [0, 0, 0, 1],
    [0, 1, 0, 2],
];

/// Ordered collection of patches.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Project {
    pub patches: Vec<Patch>,
}

impl Project {
    pub fn new(patches: Vec<Patch>) -> Self {
        Self { patches }
    }

    /// Synthesize `n` fresh, unfrozen patches.
    pub fn randomise<R: Rng + ?Sized>(
        definitions: &[TrackDefinition],
        n: usize,
        ctx: &SynthContext<'_>,
        rng: &mut R,
    ) -> Result<Self> {
        let patches = (0..n)
            .map(|_| Patch::randomise(definitions, ctx, rng))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(patches))
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Freeze the first `n` patches and unfreeze the rest.
    pub fn freeze(&mut self, n: usize) -> &mut Self {
        for (i, patch) in self.patches.iter_mut().enumerate() {
            patch.frozen = i < n;
        }
        self
    }

    pub fn frozen_count(&self) -> usize {
        self.patches.iter().filter(|p| p.frozen).count()
    }

    /// Apply `count` single-track mutations to every unfrozen patch.
    ///
    /// Returns the mutated copy; `self` is untouched, so a failure part way
    /// through leaves nothing half-applied.
    pub fn mutated<R: Rng + ?Sized>(
        &self,
        attr: Attribute,
        count: usize,
        ctx: &SynthContext<'_>,
        rng: &mut R,
    ) -> Result<Self> {
        let mut project = self.clone();
        let mut targets = project.patches.iter_mut().filter(|p| !p.frozen).peekable();
        if targets.peek().is_none() {
            return Err(VaultError::NoMatchingTracks {
                attr: attr.to_string(),
            });
        }

        for patch in targets {
            for _ in 0..count {
                patch.mutate_attr(attr, ctx, rng)?;
            }
        }
        Ok(project)
    }

    /// Clones of the indexed patches, all frozen.
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        self.check_indices(indices)?;
        let mut project = Self::new(indices.iter().map(|&i| self.patches[i].clone()).collect());
        project.freeze(indices.len());
        Ok(project)
    }

    /// `n` patches cycling through clones of the indexed ones; the leading
    /// copies (one per index) are frozen.
    pub fn clone_patches(&self, indices: &[usize], n: usize) -> Result<Self> {
        self.check_indices(indices)?;
        let mut project = Self::new(
            (0..n)
                .map(|i| self.patches[indices[i % indices.len()]].clone())
                .collect(),
        );
        project.freeze(indices.len());
        Ok(project)
    }

    /// Phrase-based arrangement of the indexed patches.
    ///
    /// For each of `n / PHRASE_SIZE` phrases a template is drawn, the roots
    /// are shuffled and a clone is appended per template slot. Slots beyond
    /// the number of roots wrap around. The result is unfrozen.
    pub fn arrange<R: Rng + ?Sized>(
        &self,
        indices: &[usize],
        n: usize,
        rng: &mut R,
    ) -> Result<Self> {
        self.check_indices(indices)?;
        let mut roots: Vec<&Patch> = indices.iter().map(|&i| &self.patches[i]).collect();

        let mut patches = Vec::with_capacity(n);
        for _ in 0..n / PHRASE_SIZE {
            let template = PHRASE_TEMPLATES.choose(rng).unwrap_or(&PHRASE_TEMPLATES[0]);
            roots.shuffle(rng);
            patches.extend(template.iter().map(|&slot| roots[slot % roots.len()].clone()));
        }

        let mut project = Self::new(patches);
        project.freeze(0);
        Ok(project)
    }

    fn check_indices(&self, indices: &[usize]) -> Result<()> {
        if indices.is_empty() {
            return Err(VaultError::InvalidIndices {
                reason: "at least one patch index is required".to_string(),
            });
        }
        match indices.iter().find(|&&i| i >= self.patches.len()) {
            Some(&index) => Err(VaultError::PatchIndexOutOfRange {
                index,
                len: self.patches.len(),
            }),
            None => Ok(()),
        }
    }
}

/// Parse a hex digit string into patch indices, e.g. `"03a"` to `[0, 3, 10]`.
pub fn parse_indices(hex: &str) -> Result<Vec<usize>> {
    let hex = hex.trim();
    if hex.is_empty() {
        return Err(VaultError::InvalidIndices {
            reason: "empty index list".to_string(),
        });
    }
    hex.chars()
        .map(|c| {
            c.to_digit(16)
                .map(|d| d as usize)
                .ok_or_else(|| VaultError::InvalidIndices {
                    reason: format!("'{}' is not a hex digit", c),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::catalog::Machines;
    use crate::model::sample::{Sample, SampleBank, Tags};
    use crate::model::track::Track;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Fixture {
        definitions: Vec<TrackDefinition>,
        machines: Machines,
        pool: SampleBank,
        tags: Tags,
    }

    impl Fixture {
        fn new() -> Self {
            let definitions = vec![
                TrackDefinition::new("kick", "beats.detroit", 0.5, 0.5),
                TrackDefinition::new("bass", "beats.berlin", 0.5, 0.5),
            ];
            let tags = Tags::new(&definitions, &[]);
            Self {
                definitions,
                machines: Machines::builtin(),
                pool: SampleBank::new(
                    (0..4)
                        .map(|i| Sample::new("drums", &format!("k{}.wav", i), 36, &["kick"]))
                        .collect(),
                ),
                tags,
            }
        }

        fn ctx(&self) -> SynthContext<'_> {
            SynthContext::new(&self.machines, &self.pool, &self.tags)
        }

        fn project(&self, n: usize, seed: u64) -> Project {
            Project::randomise(
                &self.definitions,
                n,
                &self.ctx(),
                &mut StdRng::seed_from_u64(seed),
            )
            .unwrap()
        }
    }

    #[test]
    fn test_randomise_shape() {
        let fixture = Fixture::new();
        let project = fixture.project(3, 0);
        assert_eq!(project.len(), 3);
        assert!(project.patches.iter().all(|p| p.tracks.len() == 2));
        assert_eq!(project.frozen_count(), 0);
    }

    #[test]
    fn test_freeze_partition_survives_clone() {
        let fixture = Fixture::new();
        let mut project = fixture.project(5, 1);
        project.freeze(2);
        let copy = project.clone();
        let flags: Vec<bool> = copy.patches.iter().map(|p| p.frozen).collect();
        assert_eq!(flags, vec![true, true, false, false, false]);

        project.freeze(2);
        assert_eq!(project, copy);
        project.freeze(0);
        assert_eq!(project.frozen_count(), 0);
        project.freeze(10);
        assert_eq!(project.frozen_count(), 5);
    }

    #[test]
    fn test_mutated_skips_frozen_patches() {
        let fixture = Fixture::new();
        let mut project = fixture.project(4, 2);
        project.freeze(2);
        let mut rng = StdRng::seed_from_u64(3);

        let next = project
            .mutated(Attribute::Pattern, 3, &fixture.ctx(), &mut rng)
            .unwrap();
        assert_eq!(next.patches[0], project.patches[0]);
        assert_eq!(next.patches[1], project.patches[1]);
        assert_eq!(next.frozen_count(), 2);
    }

    #[test]
    fn test_mutated_all_frozen() {
        let fixture = Fixture::new();
        let mut project = fixture.project(2, 4);
        project.freeze(2);
        let result = project.mutated(
            Attribute::Density,
            1,
            &fixture.ctx(),
            &mut StdRng::seed_from_u64(0),
        );
        assert!(matches!(result, Err(VaultError::NoMatchingTracks { .. })));
    }

    #[test]
    fn test_mutated_temperature_bounds() {
        let fixture = Fixture::new();
        let mut project = fixture.project(3, 5);
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..20 {
            project = project
                .mutated(Attribute::Temperature, 2, &fixture.ctx(), &mut rng)
                .unwrap();
        }
        let temperatures: Vec<f64> = project
            .patches
            .iter()
            .flat_map(|p| p.tracks.iter().map(|t: &Track| t.temperature))
            .collect();
        assert!(temperatures
            .iter()
            .all(|t| *t == 0.5 || (0.25..=0.75).contains(t)));
    }

    #[test]
    fn test_select_freezes_everything() {
        let fixture = Fixture::new();
        let project = fixture.project(4, 7);
        let selected = project.select(&[3, 1]).unwrap();
        assert_eq!(selected.len(), 2);
        assert_eq!(selected.patches[0].tracks, project.patches[3].tracks);
        assert_eq!(selected.patches[1].tracks, project.patches[1].tracks);
        assert_eq!(selected.frozen_count(), 2);
    }

    #[test]
    fn test_clone_patches_cycles() {
        let fixture = Fixture::new();
        let project = fixture.project(4, 8);
        let cloned = project.clone_patches(&[2, 0], 5).unwrap();
        assert_eq!(cloned.len(), 5);
        for (i, patch) in cloned.patches.iter().enumerate() {
            let source = if i % 2 == 0 { 2 } else { 0 };
            assert_eq!(patch.tracks, project.patches[source].tracks);
            assert_eq!(patch.frozen, i < 2);
        }
    }

    #[test]
    fn test_index_errors() {
        let fixture = Fixture::new();
        let project = fixture.project(2, 9);
        assert!(matches!(
            project.select(&[]),
            Err(VaultError::InvalidIndices { .. })
        ));
        assert!(matches!(
            project.clone_patches(&[0, 5], 4),
            Err(VaultError::PatchIndexOutOfRange { index: 5, len: 2 })
        ));
    }

    #[test]
    fn test_arrange_uses_roots_only() {
        let fixture = Fixture::new();
        let project = fixture.project(4, 10);
        let mut rng = StdRng::seed_from_u64(11);
        let arranged = project.arrange(&[1, 2], 9, &mut rng).unwrap();

        assert_eq!(arranged.len(), 8);
        assert_eq!(arranged.frozen_count(), 0);
        for patch in &arranged.patches {
            assert!(
                patch.tracks == project.patches[1].tracks
                    || patch.tracks == project.patches[2].tracks
            );
        }
    }

    #[test]
    fn test_parse_indices() {
        assert_eq!(parse_indices("03a").unwrap(), vec![0, 3, 10]);
        assert_eq!(parse_indices("F").unwrap(), vec![15]);
        assert!(parse_indices("").is_err());
        assert!(parse_indices("0g").is_err());
    }
}
