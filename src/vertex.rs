//! Per-submesh vertex streams: positions, the interleaved attribute stream
//! and the triangle list.
//!
//! The attribute stream has no self-describing lengths. Its per-vertex
//! layout comes from the submesh's vertex format list, so decode and encode
//! both walk that list in order.
use crate::error::{FmdlError, Result};
use crate::float16::{decode_half, encode_half};
use crate::fmdl_types::VertexFormatEntry;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::warn;
use serde::Serialize;
use std::io::{Cursor, Write};

pub const POSITION_SIZE: usize = 12;
pub const FACE_SIZE: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VertexUsage {
    /// Lives in its own buffer; separates submesh format lists.
    Position = 0,
    BoneWeight0 = 1,
    Normal = 2,
    Color = 3,
    BoneIndex0 = 7,
    Uv0 = 8,
    Uv1 = 9,
    Uv2 = 10,
    Uv3 = 11,
    BoneWeight1 = 12,
    BoneIndex1 = 13,
    Tangent = 14,
}

impl VertexUsage {
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Position,
            1 => Self::BoneWeight0,
            2 => Self::Normal,
            3 => Self::Color,
            7 => Self::BoneIndex0,
            8 => Self::Uv0,
            9 => Self::Uv1,
            10 => Self::Uv2,
            11 => Self::Uv3,
            12 => Self::BoneWeight1,
            13 => Self::BoneIndex1,
            14 => Self::Tangent,
            _ => return None,
        })
    }

    /// Bytes this usage occupies in the attribute stream.
    pub fn stream_width(self) -> usize {
        match self {
            Self::Position => 0,
            Self::Normal | Self::Tangent => 8,
            Self::BoneWeight0
            | Self::Color
            | Self::BoneIndex0
            | Self::Uv0
            | Self::Uv1
            | Self::Uv2
            | Self::Uv3
            | Self::BoneWeight1
            | Self::BoneIndex1 => 4,
        }
    }

    /// Usages the engine version we target lists but never fills.
    pub fn is_placeholder(self) -> bool {
        matches!(self, Self::Uv2 | Self::Uv3 | Self::BoneWeight1 | Self::BoneIndex1)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::BoneWeight0 => "bone weight",
            Self::Normal => "normal",
            Self::Color => "color",
            Self::BoneIndex0 => "bone id",
            Self::Uv0 => "uv0",
            Self::Uv1 => "uv1",
            Self::Uv2 => "uv2",
            Self::Uv3 => "uv3",
            Self::BoneWeight1 => "secondary bone weight",
            Self::BoneIndex1 => "secondary bone id",
            Self::Tangent => "tangent",
        }
    }
}

/// Axis convention of [`SubmeshGeometry::tangents`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum TangentAxes {
    /// Supplied by the host: normalised and remapped on encode.
    #[default]
    Host,
    /// Decoded from a file: written back as stored.
    File,
}

/// Decoded geometry of one submesh, in the host's axis convention.
/// Tangents are the exception; `tangent_axes` says which convention
/// they are in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmeshGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 4]>>,
    pub tangents: Option<Vec<[f32; 4]>>,
    pub tangent_axes: TangentAxes,
    pub colors: Option<Vec<[f32; 4]>>,
    pub bone_weights: Option<Vec<[f32; 4]>>,
    pub bone_ids: Option<Vec<[u8; 4]>>,
    pub uv0: Option<Vec<[f32; 2]>>,
    pub uv1: Option<Vec<[f32; 2]>>,
    pub triangles: Vec<[u32; 3]>,
}

impl SubmeshGeometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_vertex_count(&self) -> usize {
        self.triangles.len() * 3
    }
}

/// Normal and tangent halfwords exactly as they were stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawNormals {
    pub normals: Vec<[u16; 4]>,
    pub tangents: Vec<[u16; 4]>,
}

/// Splits the flat format table into one list per submesh. Every
/// position entry (usage 0) opens a new list and stays as its first element.
pub fn formats_per_submesh(entries: &[VertexFormatEntry]) -> Vec<Vec<VertexFormatEntry>> {
    let mut lists = Vec::new();
    let mut current: Vec<VertexFormatEntry> = Vec::new();
    for entry in entries {
        if entry.usage_code == VertexUsage::Position as u8 && !current.is_empty() {
            lists.push(std::mem::take(&mut current));
        }
        current.push(*entry);
    }
    if !current.is_empty() {
        lists.push(current);
    }
    lists
}

/// Resolves a submesh format list into usages, rejecting unknown codes and
/// repeated attributes.
pub fn submesh_layout(submesh: usize, entries: &[VertexFormatEntry]) -> Result<Vec<VertexUsage>> {
    let mut layout: Vec<VertexUsage> = Vec::with_capacity(entries.len());
    for entry in entries {
        let usage = VertexUsage::from_code(entry.usage_code).ok_or(FmdlError::UnknownUsage {
            submesh,
            usage: entry.usage_code,
        })?;
        if layout.contains(&usage) {
            return Err(FmdlError::DuplicateUsage {
                submesh,
                usage: entry.usage_code,
            });
        }
        layout.push(usage);
    }
    Ok(layout)
}

pub fn attribute_stride(layout: &[VertexUsage]) -> usize {
    layout.iter().map(|usage| usage.stream_width()).sum()
}

pub fn uv0_flip_v(v: f32) -> f32 {
    (v - 1.0) * -1.0
}

// Algebraically the same as uv0_flip_v except for the sign of zero at v == 1.
pub fn uv1_flip_v(v: f32) -> f32 {
    (v * -1.0) + 1.0
}

pub fn decode_positions(bytes: &[u8], count: usize) -> Result<Vec<[f32; 3]>> {
    let mut cursor = Cursor::new(bytes);
    let mut positions = Vec::with_capacity(count);
    for _ in 0..count {
        let x = cursor.read_f32::<LittleEndian>()?;
        let z = cursor.read_f32::<LittleEndian>()?;
        let y = cursor.read_f32::<LittleEndian>()?;
        positions.push([x, y * -1.0, z]);
    }
    Ok(positions)
}

pub fn encode_positions<W: Write>(w: &mut W, positions: &[[f32; 3]]) -> Result<()> {
    for &[x, y, z] in positions {
        w.write_f32::<LittleEndian>(x)?;
        w.write_f32::<LittleEndian>(z)?;
        w.write_f32::<LittleEndian>(y * -1.0)?;
    }
    Ok(())
}

/// Decodes `count` vertices of the attribute stream into `geometry`.
pub fn decode_attributes(
    bytes: &[u8],
    count: usize,
    layout: &[VertexUsage],
    geometry: &mut SubmeshGeometry,
    mut raw: Option<&mut RawNormals>,
) -> Result<()> {
    let has = |usage| layout.contains(&usage);
    let mut normals = has(VertexUsage::Normal).then(|| Vec::with_capacity(count));
    let mut tangents = has(VertexUsage::Tangent).then(|| Vec::with_capacity(count));
    let mut colors = has(VertexUsage::Color).then(|| Vec::with_capacity(count));
    let mut weights = has(VertexUsage::BoneWeight0).then(|| Vec::with_capacity(count));
    let mut bone_ids = has(VertexUsage::BoneIndex0).then(|| Vec::with_capacity(count));
    let mut uv0 = has(VertexUsage::Uv0).then(|| Vec::with_capacity(count));
    let mut uv1 = has(VertexUsage::Uv1).then(|| Vec::with_capacity(count));

    let mut cursor = Cursor::new(bytes);
    for _ in 0..count {
        for &usage in layout {
            match usage {
                VertexUsage::Position => {}
                VertexUsage::Normal => {
                    let words = read_halfwords(&mut cursor)?;
                    if let Some(raw) = raw.as_deref_mut() {
                        raw.normals.push(words);
                    }
                    let [x, y, z, w] = words.map(decode_half);
                    if let Some(normals) = normals.as_mut() {
                        normals.push([x, z * -1.0, y, w]);
                    }
                }
                VertexUsage::Tangent => {
                    let words = read_halfwords(&mut cursor)?;
                    if let Some(raw) = raw.as_deref_mut() {
                        raw.tangents.push(words);
                    }
                    if let Some(tangents) = tangents.as_mut() {
                        tangents.push(words.map(decode_half));
                    }
                }
                VertexUsage::Color => {
                    let rgba = read_bytes4(&mut cursor)?;
                    if let Some(colors) = colors.as_mut() {
                        colors.push(rgba.map(|c| c as f32 / 255.0));
                    }
                }
                VertexUsage::BoneWeight0 => {
                    let bytes = read_bytes4(&mut cursor)?;
                    if let Some(weights) = weights.as_mut() {
                        weights.push(bytes.map(|w| w as f32 / 255.0));
                    }
                }
                VertexUsage::BoneIndex0 => {
                    let ids = read_bytes4(&mut cursor)?;
                    if let Some(bone_ids) = bone_ids.as_mut() {
                        bone_ids.push(ids);
                    }
                }
                VertexUsage::Uv0 => {
                    let [u, v] = read_uv(&mut cursor)?;
                    if let Some(uv0) = uv0.as_mut() {
                        uv0.push([u, uv0_flip_v(v)]);
                    }
                }
                VertexUsage::Uv1 => {
                    let [u, v] = read_uv(&mut cursor)?;
                    if let Some(uv1) = uv1.as_mut() {
                        uv1.push([u, uv1_flip_v(v)]);
                    }
                }
                VertexUsage::Uv2 | VertexUsage::Uv3 | VertexUsage::BoneWeight1 | VertexUsage::BoneIndex1 => {
                    read_bytes4(&mut cursor)?;
                }
            }
        }
    }

    geometry.normals = normals;
    if tangents.is_some() {
        geometry.tangent_axes = TangentAxes::File;
    }
    geometry.tangents = tangents;
    geometry.colors = colors;
    geometry.bone_weights = weights;
    geometry.bone_ids = bone_ids;
    geometry.uv0 = uv0;
    geometry.uv1 = uv1;
    Ok(())
}

/// Encodes the attribute stream of one submesh. `raw` halfwords win over
/// the computed normal/tangent encoding when their vertex count matches.
pub fn encode_attributes<W: Write>(
    w: &mut W,
    submesh: usize,
    geometry: &SubmeshGeometry,
    layout: &[VertexUsage],
    raw: Option<&RawNormals>,
) -> Result<()> {
    let count = geometry.vertex_count();
    let has = |usage| layout.contains(&usage);

    let normals = if has(VertexUsage::Normal) {
        match raw.filter(|raw| raw.normals.len() == count) {
            Some(raw) => raw.normals.clone(),
            None => {
                let normals = required(submesh, VertexUsage::Normal, geometry.normals.as_deref(), count)?;
                normals.iter().map(|&n| encode_normal(n)).collect()
            }
        }
    } else {
        Vec::new()
    };

    let tangents = if has(VertexUsage::Tangent) {
        match raw.filter(|raw| raw.tangents.len() == count) {
            Some(raw) => raw.tangents.clone(),
            None => {
                let tangents = required(submesh, VertexUsage::Tangent, geometry.tangents.as_deref(), count)?;
                match geometry.tangent_axes {
                    TangentAxes::Host => tangents.iter().map(|&t| encode_tangent(t)).collect(),
                    TangentAxes::File => tangents.iter().map(|t| t.map(encode_half)).collect(),
                }
            }
        }
    } else {
        Vec::new()
    };

    let colors: Vec<[u8; 4]> = if has(VertexUsage::Color) {
        match geometry.colors.as_deref() {
            Some(colors) => {
                check_len(submesh, colors.len(), count)?;
                colors.iter().map(|c| c.map(unit_to_byte)).collect()
            }
            None => vec![[255; 4]; count],
        }
    } else {
        Vec::new()
    };

    let weights: Vec<[u8; 4]> = if has(VertexUsage::BoneWeight0) {
        required(submesh, VertexUsage::BoneWeight0, geometry.bone_weights.as_deref(), count)?
            .iter()
            .map(|w| w.map(unit_to_byte))
            .collect()
    } else {
        Vec::new()
    };

    let bone_ids: &[[u8; 4]] = if has(VertexUsage::BoneIndex0) {
        required(submesh, VertexUsage::BoneIndex0, geometry.bone_ids.as_deref(), count)?
    } else {
        &[]
    };

    let uv0: Vec<[u16; 2]> = if has(VertexUsage::Uv0) {
        required(submesh, VertexUsage::Uv0, geometry.uv0.as_deref(), count)?
            .iter()
            .map(|&uv| encode_uv(uv))
            .collect()
    } else {
        Vec::new()
    };

    let uv1: Vec<[u16; 2]> = if has(VertexUsage::Uv1) {
        let source = geometry.uv1.as_deref().or(geometry.uv0.as_deref());
        required(submesh, VertexUsage::Uv1, source, count)?
            .iter()
            .map(|&uv| encode_uv(uv))
            .collect()
    } else {
        Vec::new()
    };

    for usage in layout.iter().filter(|usage| usage.is_placeholder()) {
        warn!(
            "submesh {}: {} is not supported by the target engine, writing zero placeholders",
            submesh,
            usage.name()
        );
    }

    for vertex in 0..count {
        for &usage in layout {
            match usage {
                VertexUsage::Position => {}
                VertexUsage::Normal => write_halfwords(w, &normals[vertex])?,
                VertexUsage::Tangent => write_halfwords(w, &tangents[vertex])?,
                VertexUsage::Color => w.write_all(&colors[vertex])?,
                VertexUsage::BoneWeight0 => w.write_all(&weights[vertex])?,
                VertexUsage::BoneIndex0 => w.write_all(&bone_ids[vertex])?,
                VertexUsage::Uv0 => write_halfwords(w, &uv0[vertex])?,
                VertexUsage::Uv1 => write_halfwords(w, &uv1[vertex])?,
                VertexUsage::Uv2 | VertexUsage::Uv3 | VertexUsage::BoneWeight1 | VertexUsage::BoneIndex1 => {
                    w.write_all(&[0; 4])?
                }
            }
        }
    }
    Ok(())
}

/// Face indices are stored in reverse winding.
pub fn decode_faces(bytes: &[u8], face_vertex_count: usize) -> Result<Vec<[u32; 3]>> {
    let mut cursor = Cursor::new(bytes);
    let mut triangles = Vec::with_capacity(face_vertex_count / 3);
    for _ in 0..face_vertex_count / 3 {
        let f1 = cursor.read_u16::<LittleEndian>()? as u32;
        let f2 = cursor.read_u16::<LittleEndian>()? as u32;
        let f3 = cursor.read_u16::<LittleEndian>()? as u32;
        triangles.push([f3, f2, f1]);
    }
    Ok(triangles)
}

pub fn encode_faces<W: Write>(w: &mut W, triangles: &[[u32; 3]], vertex_count: usize) -> Result<()> {
    let max = vertex_count.min(u16::MAX as usize + 1).saturating_sub(1);
    for triangle in triangles {
        for &index in triangle.iter().rev() {
            if index as usize > max || vertex_count == 0 {
                return Err(FmdlError::OutOfRange {
                    what: "face vertex index",
                    value: index as usize,
                    max,
                });
            }
            w.write_u16::<LittleEndian>(index as u16)?;
        }
    }
    Ok(())
}

/// Converts host polygons to triangles; anything but a triangle is fatal.
pub fn triangles_from_polygons(submesh: usize, polygons: &[Vec<u32>]) -> Result<Vec<[u32; 3]>> {
    polygons
        .iter()
        .enumerate()
        .map(|(face, polygon)| match polygon.as_slice() {
            &[a, b, c] => Ok([a, b, c]),
            other => Err(FmdlError::NonTriangularFace {
                submesh,
                face,
                arity: other.len(),
            }),
        })
        .collect()
}

fn encode_normal([x, y, z, w]: [f32; 4]) -> [u16; 4] {
    [encode_half(x), encode_half(z), encode_half(y * -1.0), encode_half(w)]
}

fn encode_tangent([x, y, z, _]: [f32; 4]) -> [u16; 4] {
    let [x, y, z] = normalize_tangent(x, y, z);
    [encode_half(x), encode_half(z * -1.0), encode_half(y * -1.0), encode_half(1.0)]
}

fn normalize_tangent(x: f32, y: f32, z: f32) -> [f32; 3] {
    let length = (x * x + y * y + z * z).sqrt();
    if length == 0.0 {
        return [x, y, z];
    }
    [x / length, y / length, z / length]
}

fn encode_uv([u, v]: [f32; 2]) -> [u16; 2] {
    [encode_half(u), encode_half((v - 1.0) * -1.0)]
}

fn unit_to_byte(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

fn required<'a, T>(submesh: usize, usage: VertexUsage, data: Option<&'a [T]>, count: usize) -> Result<&'a [T]> {
    let data = data.ok_or(FmdlError::MissingAttribute {
        submesh,
        usage: usage.name(),
    })?;
    check_len(submesh, data.len(), count)?;
    Ok(data)
}

fn check_len(submesh: usize, supplied: usize, expected: usize) -> Result<()> {
    if supplied != expected {
        return Err(FmdlError::VertexCountMismatch {
            submesh,
            expected,
            supplied,
        });
    }
    Ok(())
}

fn read_halfwords(cursor: &mut Cursor<&[u8]>) -> Result<[u16; 4]> {
    Ok([
        cursor.read_u16::<LittleEndian>()?,
        cursor.read_u16::<LittleEndian>()?,
        cursor.read_u16::<LittleEndian>()?,
        cursor.read_u16::<LittleEndian>()?,
    ])
}

fn read_uv(cursor: &mut Cursor<&[u8]>) -> Result<[f32; 2]> {
    let u = cursor.read_u16::<LittleEndian>()?;
    let v = cursor.read_u16::<LittleEndian>()?;
    Ok([decode_half(u), decode_half(v)])
}

fn read_bytes4(cursor: &mut Cursor<&[u8]>) -> Result<[u8; 4]> {
    let mut bytes = [0u8; 4];
    std::io::Read::read_exact(cursor, &mut bytes)?;
    Ok(bytes)
}

fn write_halfwords<W: Write>(w: &mut W, words: &[u16]) -> Result<()> {
    for &word in words {
        w.write_u16::<LittleEndian>(word)?;
    }
    Ok(())
}
