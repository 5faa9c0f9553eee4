//! Generative Parameter Model
//!
//! The Project → Patch → Track hierarchy together with the randomized
//! synthesis and mutation algorithms, the static catalogs they draw from,
//! and the document form used for persistence.

pub mod catalog;
pub mod document;
pub mod patch;
pub mod project;
pub mod rhythm;
pub mod sample;
pub mod track;

pub use catalog::{Groove, MachineSpec, Machines, Pattern, PatternArgs};
pub use document::{PatchDocument, ProjectDocument, TrackDocument};
pub use patch::Patch;
pub use project::{parse_indices, Project};
pub use sample::{Sample, SampleBank, SamplePool, Tags};
pub use track::{
    mutate_attr, Attribute, SeedDomain, Seeds, SynthContext, Track, TrackDefinition, TrackKind,
    Voice,
};
