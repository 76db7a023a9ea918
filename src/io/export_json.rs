// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Flat array export as JSON

use crate::geometry::{Mesh, MeshArrays};
use anyhow::{Context, Result};
use std::path::Path;

/// Write the renderer arrays of `mesh` as pretty-printed JSON
pub fn export(mesh: &Mesh, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(&mesh.to_arrays())?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {path:?}"))?;
    Ok(())
}

/// Read arrays written by [`export`]
pub fn import(path: impl AsRef<Path>) -> Result<MeshArrays> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {path:?}"))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {path:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use crate::overlay::ExportOptions;
    use nalgebra::Vector2;
    use tempfile::NamedTempFile;

    #[test]
    fn test_json_arrays() -> Result<()> {
        let mesh = Primitive::grid(Vector2::new(1.0, 1.0), [2, 2]).to_mesh(&ExportOptions::default())?;
        let file = NamedTempFile::with_suffix(".json")?;
        export(&mesh, file.path())?;

        let arrays = import(file.path())?;
        assert_eq!(arrays, mesh.to_arrays());
        assert_eq!(arrays.positions.len(), 9);
        assert_eq!(arrays.indices.len(), 8 * 3);
        assert!(arrays.uvs.contains(&[0.5, 0.5]));
        Ok(())
    }
}
