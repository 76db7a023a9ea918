// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! GLTF/GLB exporter

use crate::geometry::{Mesh, MeshArrays};
use anyhow::{Context, Result};
use serde_json::json;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const GLB_MAGIC: u32 = 0x4654_6C67; // "glTF"
const CHUNK_JSON: u32 = 0x4E4F_534A; // "JSON"
const CHUNK_BIN: u32 = 0x004E_4942; // "BIN\0"

const FLOAT: u32 = 5126;
const UNSIGNED_INT: u32 = 5125;
const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;

/// Export mesh to GLTF or GLB format, chosen by the file extension.
///
/// A `.gltf` file gets its buffer written next to it with a `.bin` extension.
pub fn export(mesh: &Mesh, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let is_glb = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("glb"));
    if is_glb {
        export_glb(mesh, path)
    } else {
        export_gltf_separate(mesh, path)
    }
}

/// Export mesh to GLB (binary GLTF)
fn export_glb(mesh: &Mesh, path: &Path) -> Result<()> {
    let buffer = Buffer::from_arrays(&mesh.to_arrays());
    let document = buffer.document(None);

    let mut json_chunk = serde_json::to_vec(&document)?;
    pad_to_four(&mut json_chunk, b' ');
    let mut bin_chunk = buffer.data;
    pad_to_four(&mut bin_chunk, 0);

    let total_length = 12 + 8 + json_chunk.len() + 8 + bin_chunk.len();
    let file = File::create(path).with_context(|| format!("Failed to create {path:?}"))?;
    let mut out = BufWriter::new(file);

    // GLB header
    out.write_all(&GLB_MAGIC.to_le_bytes())?;
    out.write_all(&2u32.to_le_bytes())?;
    out.write_all(&(total_length as u32).to_le_bytes())?;

    out.write_all(&(json_chunk.len() as u32).to_le_bytes())?;
    out.write_all(&CHUNK_JSON.to_le_bytes())?;
    out.write_all(&json_chunk)?;

    out.write_all(&(bin_chunk.len() as u32).to_le_bytes())?;
    out.write_all(&CHUNK_BIN.to_le_bytes())?;
    out.write_all(&bin_chunk)?;

    out.flush()?;
    Ok(())
}

/// Export mesh to GLTF with separate .bin file
fn export_gltf_separate(mesh: &Mesh, path: &Path) -> Result<()> {
    let bin_path = path.with_extension("bin");
    let bin_name = bin_path
        .file_name()
        .and_then(|name| name.to_str())
        .context("Output path has no usable file name")?
        .to_string();

    let buffer = Buffer::from_arrays(&mesh.to_arrays());
    let document = buffer.document(Some(&bin_name));

    std::fs::write(path, serde_json::to_string_pretty(&document)?)
        .with_context(|| format!("Failed to write {path:?}"))?;
    std::fs::write(&bin_path, &buffer.data)
        .with_context(|| format!("Failed to write {bin_path:?}"))?;
    Ok(())
}

/// Interleaving-free binary buffer with one view per attribute
struct Buffer {
    data: Vec<u8>,
    /// (offset, length) of positions, normals, uvs and indices
    views: [(usize, usize); 4],
    vertex_count: usize,
    index_count: usize,
    min: [f32; 3],
    max: [f32; 3],
}

impl Buffer {
    fn from_arrays(arrays: &MeshArrays) -> Self {
        let mut data = Vec::new();
        let positions = append_view(
            &mut data,
            arrays.positions.iter().flatten().map(|x| x.to_le_bytes()),
        );
        let normals = append_view(
            &mut data,
            arrays.normals.iter().flatten().map(|x| x.to_le_bytes()),
        );
        let uvs = append_view(&mut data, arrays.uvs.iter().flatten().map(|x| x.to_le_bytes()));
        let indices = append_view(&mut data, arrays.indices.iter().map(|i| i.to_le_bytes()));

        let (min, max) = calculate_bounds(&arrays.positions);
        Self {
            data,
            views: [positions, normals, uvs, indices],
            vertex_count: arrays.positions.len(),
            index_count: arrays.indices.len(),
            min,
            max,
        }
    }

    fn document(&self, uri: Option<&str>) -> serde_json::Value {
        let [positions, normals, uvs, indices] = self.views;
        let view = |(offset, length): (usize, usize), target: u32| {
            json!({
                "buffer": 0,
                "byteOffset": offset,
                "byteLength": length,
                "target": target
            })
        };
        let mut buffer = json!({ "byteLength": self.data.len() });
        if let Some(uri) = uri {
            buffer["uri"] = json!(uri);
        }

        json!({
            "asset": {
                "generator": concat!("hemesh ", env!("CARGO_PKG_VERSION")),
                "version": "2.0"
            },
            "scene": 0,
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "mesh": 0 }],
            "meshes": [{
                "primitives": [{
                    "attributes": {
                        "POSITION": 0,
                        "NORMAL": 1,
                        "TEXCOORD_0": 2
                    },
                    "indices": 3,
                    "mode": 4
                }]
            }],
            "accessors": [
                {
                    "bufferView": 0,
                    "componentType": FLOAT,
                    "count": self.vertex_count,
                    "type": "VEC3",
                    "min": self.min,
                    "max": self.max
                },
                {
                    "bufferView": 1,
                    "componentType": FLOAT,
                    "count": self.vertex_count,
                    "type": "VEC3"
                },
                {
                    "bufferView": 2,
                    "componentType": FLOAT,
                    "count": self.vertex_count,
                    "type": "VEC2"
                },
                {
                    "bufferView": 3,
                    "componentType": UNSIGNED_INT,
                    "count": self.index_count,
                    "type": "SCALAR"
                }
            ],
            "bufferViews": [
                view(positions, ARRAY_BUFFER),
                view(normals, ARRAY_BUFFER),
                view(uvs, ARRAY_BUFFER),
                view(indices, ELEMENT_ARRAY_BUFFER)
            ],
            "buffers": [buffer]
        })
    }
}

/// Append `words` to `data`, returning the (offset, length) of the new view
fn append_view(data: &mut Vec<u8>, words: impl Iterator<Item = [u8; 4]>) -> (usize, usize) {
    let offset = data.len();
    for word in words {
        data.extend_from_slice(&word);
    }
    (offset, data.len() - offset)
}

fn calculate_bounds(positions: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    if positions.is_empty() {
        return ([0.0; 3], [0.0; 3]);
    }
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for position in positions {
        for axis in 0..3 {
            min[axis] = min[axis].min(position[axis]);
            max[axis] = max[axis].max(position[axis]);
        }
    }
    (min, max)
}

fn pad_to_four(bytes: &mut Vec<u8>, fill: u8) {
    while bytes.len() % 4 != 0 {
        bytes.push(fill);
    }
}
