// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - writing exported triangle meshes

mod export_gltf;
mod export_json;
mod export_stl;

pub use export_gltf::export as export_gltf;
pub use export_json::{export as export_json, import as import_json};
pub use export_stl::{export as export_stl, import as import_stl};

use crate::geometry::Mesh;
use anyhow::{bail, Result};
use std::path::Path;

/// Write `mesh` in the format named by the file extension
pub fn export_auto(mesh: &Mesh, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("stl") => export_stl(mesh, path),
        Some("gltf") | Some("glb") => export_gltf(mesh, path),
        Some("json") => export_json(mesh, path),
        _ => bail!("Unsupported output format: {path:?} (expected .stl, .gltf, .glb or .json)"),
    }
}
