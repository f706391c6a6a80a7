use crate::blocks::Section0Writer;
use crate::directory::{Directory, Section1Entry, align16, pad_to_alignment, to_u32};
use crate::error::{FmdlError, Result};
use crate::fmdl_types::{
    BufferKind, BufferOffsetEntry, ObjectData, Section0Block, Section1Block, VertexBufferDef,
};
use crate::model::FmdlModel;
use crate::strings::build_string_table;
use crate::vertex::{RawNormals, SubmeshGeometry, VertexUsage, encode_attributes, encode_faces, encode_positions};
use log::{debug, warn};

/// Size of the zero block that closes the geometry buffer.
pub const GEOMETRY_TRAILER_SIZE: usize = 32;

const ALWAYS_WRITTEN: [Section0Block; 4] = [
    Section0Block::Objects,
    Section0Block::VertexFormats,
    Section0Block::StringDefs,
    Section0Block::BufferOffsets,
];

pub fn write_fmdl(model: &FmdlModel) -> Result<Vec<u8>> {
    write_fmdl_with_raw(model, &[])
}

/// Encodes `model`. `raw[i]`, when present, supplies the stored normal and
/// tangent halfwords of submesh `i` in place of the computed encoding.
pub fn write_fmdl_with_raw(model: &FmdlModel, raw: &[Option<RawNormals>]) -> Result<Vec<u8>> {
    if model.submeshes.len() != model.objects.len() {
        return Err(FmdlError::MalformedBlock {
            block: Section0Block::Objects.name(),
            detail: format!(
                "{} objects but geometry for {} submeshes",
                model.objects.len(),
                model.submeshes.len()
            ),
        });
    }
    let layouts = model.submesh_layouts()?;
    if layouts.len() < model.objects.len() {
        return Err(FmdlError::MalformedBlock {
            block: Section0Block::VertexFormats.name(),
            detail: format!("{} format lists for {} submeshes", layouts.len(), model.objects.len()),
        });
    }

    let objects = object_table(&model.objects, &model.submeshes)?;
    let geometry = GeometryBuffer::encode(&model.submeshes, &layouts, raw)?;
    let buffer_offsets = buffer_offset_table(&model.buffer_offsets, &geometry)?;
    let vertex_counts: Vec<usize> = model.submeshes.iter().map(SubmeshGeometry::vertex_count).collect();
    let vertex_buffers = vertex_buffer_table(&model.vertex_buffers, &vertex_counts)?;
    let (string_defs, string_blob) = build_string_table(&model.strings)?;

    let mut blocks = model.section0_blocks.clone();
    blocks.extend(ALWAYS_WRITTEN.iter().map(|block| block.id()));

    let mut section0 = Section0Writer::new();
    for id in blocks {
        let Some(block) = Section0Block::from_id(id) else {
            warn!("skipping unknown section 0 block {}", id);
            continue;
        };
        match block {
            Section0Block::Bones => section0.write_table(block, &model.bones)?,
            Section0Block::MeshGroups => section0.write_table(block, &model.mesh_groups)?,
            Section0Block::MeshGroupAssignments => section0.write_table(block, &model.mesh_group_assignments)?,
            Section0Block::Objects => section0.write_table(block, &objects)?,
            Section0Block::MaterialInstances => section0.write_table(block, &model.material_instances)?,
            Section0Block::BoneGroups => section0.write_table(block, &model.bone_groups)?,
            Section0Block::Textures => section0.write_table(block, &model.textures)?,
            Section0Block::MaterialParameters => section0.write_table(block, &model.material_parameters)?,
            Section0Block::MaterialTypes => section0.write_table(block, &model.material_types)?,
            Section0Block::MeshFormatAssignments => section0.write_table(block, &model.mesh_format_assignments)?,
            Section0Block::VertexBuffers => section0.write_table(block, &vertex_buffers)?,
            Section0Block::VertexFormats => section0.write_table(block, &model.vertex_formats)?,
            Section0Block::StringDefs => section0.write_table(block, &string_defs)?,
            Section0Block::BoundingBoxes => section0.write_table(block, &model.bounding_boxes)?,
            Section0Block::BufferOffsets => section0.write_table(block, &buffer_offsets)?,
            Section0Block::Lods => section0.write_table(block, &model.lods)?,
            Section0Block::FaceIndices => section0.write_table(block, &model.face_indices)?,
            Section0Block::Block18 => section0.write_table(block, &model.block18)?,
            Section0Block::Block20 => section0.write_table(block, &model.block20)?,
        }
    }
    let (section0_bytes, section0_entries) = section0.finish();

    let mut section1 = Section1Writer::default();
    section1.push(Section1Block::Block0, &model.section1_block0)?;
    if let Some(block1) = &model.section1_block1 {
        section1.push(Section1Block::Block1, block1)?;
    }
    section1.push(Section1Block::Geometry, &geometry.bytes)?;
    section1.push(Section1Block::Strings, &string_blob)?;

    let dir = Directory::from_entries(
        model.version,
        section0_entries,
        section0_bytes.len(),
        section1.entries,
        section1.buf.len(),
    )?;

    let mut out = Vec::with_capacity(dir.header.section1_offset as usize + section1.buf.len());
    dir.write(&mut out)?;
    out.resize(dir.header.section0_offset as usize, 0);
    out.extend_from_slice(&section0_bytes);
    out.resize(dir.header.section1_offset as usize, 0);
    out.extend_from_slice(&section1.buf);
    debug!(
        "encoded {} submeshes: section 0 {:#x} bytes, section 1 {:#x} bytes, file {:#x} bytes",
        model.submeshes.len(),
        section0_bytes.len(),
        section1.buf.len(),
        out.len()
    );
    Ok(out)
}

/// Object records with vertex counts checked against the geometry and face
/// ranges laid out back to back in submesh order.
pub fn object_table(objects: &[ObjectData], submeshes: &[SubmeshGeometry]) -> Result<Vec<ObjectData>> {
    let mut first_face_vertex = 0usize;
    objects
        .iter()
        .zip(submeshes)
        .enumerate()
        .map(|(index, (object, geometry))| {
            if object.vertex_count as usize != geometry.vertex_count() {
                return Err(FmdlError::VertexCountMismatch {
                    submesh: index,
                    expected: object.vertex_count as usize,
                    supplied: geometry.vertex_count(),
                });
            }
            let face_vertex_count = geometry.face_vertex_count();
            let record = ObjectData {
                first_face_vertex_id: to_u32(first_face_vertex, "first face vertex id")?,
                face_vertex_count: to_u32(face_vertex_count, "face vertex count")?,
                ..*object
            };
            first_face_vertex += face_vertex_count;
            Ok(record)
        })
        .collect()
}

/// Recomputes vertex buffer offsets. Each buffer kind accumulates its own
/// running offset; a position buffer opens the next submesh and every
/// submesh's share is rounded up to 16 bytes.
pub fn vertex_buffer_table(defs: &[VertexBufferDef], vertex_counts: &[usize]) -> Result<Vec<VertexBufferDef>> {
    let mut running = [0usize; 4];
    let mut submesh: Option<usize> = None;
    let mut out = Vec::with_capacity(defs.len());

    for (index, def) in defs.iter().enumerate() {
        let kind = BufferKind::from_u8(def.buffer_kind).ok_or(FmdlError::UnknownBufferKind {
            index,
            kind: def.buffer_kind,
        })?;
        if kind == BufferKind::Position {
            submesh = Some(submesh.map_or(0, |s| s + 1));
        }
        let vertex_count = submesh
            .and_then(|s| vertex_counts.get(s))
            .copied()
            .ok_or_else(|| FmdlError::MalformedBlock {
                block: Section0Block::VertexBuffers.name(),
                detail: format!("buffer def {} does not belong to any submesh", index),
            })?;

        let slot = &mut running[kind as usize];
        out.push(VertexBufferDef {
            byte_offset: to_u32(*slot, "vertex buffer offset")?,
            ..*def
        });
        *slot += align16(vertex_count * def.stride as usize);
    }
    Ok(out)
}

fn buffer_offset_table(template: &[BufferOffsetEntry], geometry: &GeometryBuffer) -> Result<Vec<BufferOffsetEntry>> {
    if template.len() < 3 {
        return Err(FmdlError::MalformedBlock {
            block: Section0Block::BufferOffsets.name(),
            detail: format!("expected at least 3 regions, found {}", template.len()),
        });
    }
    let regions = [
        (geometry.position_len, 0),
        (geometry.attribute_len, geometry.position_len),
        (geometry.face_len, geometry.position_len + geometry.attribute_len),
        (
            GEOMETRY_TRAILER_SIZE,
            geometry.position_len + geometry.attribute_len + geometry.face_len,
        ),
    ];
    if template.len() > regions.len() {
        warn!(
            "buffer offset table has {} entries, keeping the last {} unchanged",
            template.len(),
            template.len() - regions.len()
        );
    }

    template
        .iter()
        .enumerate()
        .map(|(index, entry)| match regions.get(index) {
            Some(&(size, offset)) => Ok(BufferOffsetEntry {
                flag: entry.flag,
                size: to_u32(size, "geometry region size")?,
                offset: to_u32(offset, "geometry region offset")?,
            }),
            None => Ok(*entry),
        })
        .collect()
}

/// Section-1 block 2: positions, attribute stream, faces, trailer.
struct GeometryBuffer {
    bytes: Vec<u8>,
    position_len: usize,
    attribute_len: usize,
    face_len: usize,
}

impl GeometryBuffer {
    fn encode(submeshes: &[SubmeshGeometry], layouts: &[Vec<VertexUsage>], raw: &[Option<RawNormals>]) -> Result<Self> {
        let mut positions = Vec::new();
        let mut attributes = Vec::new();
        let mut faces = Vec::new();

        for (index, geometry) in submeshes.iter().enumerate() {
            encode_positions(&mut positions, &geometry.positions)?;
            pad_to_alignment(&mut positions);

            let raw = raw.get(index).and_then(Option::as_ref);
            encode_attributes(&mut attributes, index, geometry, &layouts[index], raw)?;
            pad_to_alignment(&mut attributes);

            encode_faces(&mut faces, &geometry.triangles, geometry.vertex_count())?;
        }
        pad_to_alignment(&mut faces);

        let (position_len, attribute_len, face_len) = (positions.len(), attributes.len(), faces.len());
        let mut bytes = positions;
        bytes.append(&mut attributes);
        bytes.append(&mut faces);
        bytes.resize(bytes.len() + GEOMETRY_TRAILER_SIZE, 0);

        Ok(Self {
            bytes,
            position_len,
            attribute_len,
            face_len,
        })
    }
}

#[derive(Default)]
struct Section1Writer {
    buf: Vec<u8>,
    entries: Vec<Section1Entry>,
}

impl Section1Writer {
    fn push(&mut self, block: Section1Block, bytes: &[u8]) -> Result<()> {
        pad_to_alignment(&mut self.buf);
        self.entries.push(Section1Entry {
            id: block.id(),
            offset: to_u32(self.buf.len(), "section 1 block offset")?,
            size: to_u32(bytes.len(), "section 1 block size")?,
        });
        self.buf.extend_from_slice(bytes);
        pad_to_alignment(&mut self.buf);
        Ok(())
    }
}
