//! JSON export of a generated tree.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use arbor_core::{GenerationParameters, LeafMarker, Segment};
use arbor_scene::{query, SceneStore};
use serde::Serialize;

/// Serialisable snapshot of the active geometry.
#[derive(Debug, Serialize)]
pub(crate) struct TreeExport {
    pub parameters: GenerationParameters,
    pub symbols: usize,
    pub segments: Vec<Segment>,
    pub leaves: Vec<LeafMarker>,
}

impl TreeExport {
    /// Captures the active emissions of `scene`.
    pub(crate) fn capture(
        parameters: GenerationParameters,
        symbols: usize,
        scene: &SceneStore,
    ) -> Self {
        Self {
            parameters,
            symbols,
            segments: query::active_segments(scene),
            leaves: query::active_leaves(scene),
        }
    }

    /// Writes the export as pretty-printed JSON.
    pub(crate) fn write_to(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("failed to create export file '{}'", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .with_context(|| format!("failed to write tree export to '{}'", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("failed to flush tree export to '{}'", path.display()))
    }
}
