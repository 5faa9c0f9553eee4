//! Patches: ordered collections of tracks forming one musical unit.

use rand::Rng;

use super::track::{mutate_attr, Attribute, SynthContext, Track, TrackDefinition};
use crate::error::Result;

/// One musical unit; a frozen patch is exempt from mutation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Patch {
    pub tracks: Vec<Track>,
    pub frozen: bool,
}

impl Patch {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            frozen: false,
        }
    }

    /// Synthesize one track per definition, in definition order.
    pub fn randomise<R: Rng + ?Sized>(
        definitions: &[TrackDefinition],
        ctx: &SynthContext<'_>,
        rng: &mut R,
    ) -> Result<Self> {
        let tracks = definitions
            .iter()
            .map(|definition| Track::randomise(definition, ctx, rng))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(tracks))
    }

    /// Mutate one track of this patch on which `attr` applies.
    pub fn mutate_attr<R: Rng + ?Sized>(
        &mut self,
        attr: Attribute,
        ctx: &SynthContext<'_>,
        rng: &mut R,
    ) -> Result<usize> {
        mutate_attr(
            &mut self.tracks,
            attr,
            |track| attr.applies_to(track),
            ctx,
            rng,
        )
    }

    pub fn track(&self, name: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.name == name)
    }
}
