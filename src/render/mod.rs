//! Render Bridge
//!
//! The boundary to the audio engine. A bridge consumes a resolved project,
//! a generator catalog, per-track levels and timing, and yields a container
//! that can be written out or mixed down. Rendering always happens after a
//! commit is persisted and never feeds back into history.

pub mod generators;
pub mod levels;
pub mod sheet;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::Project;

pub use generators::{Generator, Trigger};
pub use levels::Levels;
pub use sheet::{TriggerSheet, TriggerSheetBridge};

/// Tempo and length of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    /// Beats per minute
    pub bpm: u32,

    /// Ticks per beat
    pub tpb: u32,

    /// Beats per patch
    pub n_ticks: u32,
}

impl Timing {
    /// Ticks rendered per patch.
    pub fn ticks(&self) -> usize {
        (self.n_ticks as usize).saturating_mul(self.tpb.max(1) as usize)
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            bpm: 120,
            tpb: 1,
            n_ticks: 16,
        }
    }
}

/// Rendered output of a project.
pub trait Container {
    /// Write the engine's project file.
    fn write_project(&self, path: &Path) -> Result<()>;

    /// Render to an in-memory mono mix.
    fn render_mix(&self) -> Result<Vec<f32>>;
}

/// Turns projects into containers.
pub trait RenderBridge {
    fn render(
        &self,
        project: &Project,
        generators: &[Generator],
        levels: &Levels,
        timing: &Timing,
    ) -> Result<Box<dyn Container>>;

    /// Extension of files written by `Container::write_project`.
    fn extension(&self) -> &str {
        "json"
    }
}
