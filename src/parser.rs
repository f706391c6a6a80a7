use crate::blocks::{read_optional_table, read_table};
use crate::directory::{Directory, align16, slice_at};
use crate::error::{FmdlError, Result};
use crate::fmdl_types::{BufferOffsetEntry, ObjectData, Section0Block, Section1Block, VertexFormatEntry};
use crate::model::FmdlModel;
use crate::strings::read_strings;
use crate::vertex::{
    FACE_SIZE, POSITION_SIZE, RawNormals, SubmeshGeometry, attribute_stride, decode_attributes,
    decode_faces, decode_positions, formats_per_submesh, submesh_layout,
};
use log::{debug, warn};
use std::collections::BTreeSet;

const REQUIRED_SECTION0: [Section0Block; 4] = [
    Section0Block::Objects,
    Section0Block::VertexFormats,
    Section0Block::StringDefs,
    Section0Block::BufferOffsets,
];

pub fn parse_fmdl(data: &[u8]) -> Result<FmdlModel> {
    parse_fmdl_with_raw(data).map(|(model, _)| model)
}

/// Decodes a model and also returns, per submesh, the normal and tangent
/// halfwords exactly as stored.
pub fn parse_fmdl_with_raw(data: &[u8]) -> Result<(FmdlModel, Vec<RawNormals>)> {
    let dir = Directory::read(data)?;
    for block in REQUIRED_SECTION0 {
        dir.require_section0(block)?;
    }
    dir.require_section1(Section1Block::Block0)?;
    dir.require_section1(Section1Block::Geometry)?;
    dir.require_section1(Section1Block::Strings)?;

    let mut section0_blocks = BTreeSet::new();
    for &id in dir.section0.keys() {
        if Section0Block::from_id(id).is_some() {
            section0_blocks.insert(id);
        } else {
            warn!("ignoring unknown section 0 block {}", id);
        }
    }

    let (bones, bone_groups) = if dir.has_skeleton() {
        (
            read_table(data, &dir, Section0Block::Bones)?,
            read_optional_table(data, &dir, Section0Block::BoneGroups)?,
        )
    } else {
        if section0_blocks.remove(&Section0Block::BoneGroups.id()) {
            warn!("bone group block present without a skeleton, dropping it");
        }
        (Vec::new(), Vec::new())
    };

    let objects: Vec<ObjectData> = read_table(data, &dir, Section0Block::Objects)?;
    let vertex_formats = read_table(data, &dir, Section0Block::VertexFormats)?;
    let string_defs = read_table(data, &dir, Section0Block::StringDefs)?;
    let buffer_offsets: Vec<BufferOffsetEntry> = read_table(data, &dir, Section0Block::BufferOffsets)?;
    let strings = read_strings(data, &dir, &string_defs)?;

    let block0 = dir.require_section1(Section1Block::Block0)?;
    let section1_block0 = slice_at(data, dir.section1_start(block0), block0.size as usize, "section 1 block 0")?.to_vec();
    let section1_block1 = match dir.section1_entry(Section1Block::Block1) {
        Some(entry) => Some(slice_at(data, dir.section1_start(entry), entry.size as usize, "section 1 block 1")?.to_vec()),
        None => None,
    };

    let (submeshes, raw) = decode_geometry(data, &dir, &objects, &vertex_formats, &buffer_offsets)?;

    let model = FmdlModel {
        version: dir.header.version,
        section0_blocks,
        bones,
        mesh_groups: read_optional_table(data, &dir, Section0Block::MeshGroups)?,
        mesh_group_assignments: read_optional_table(data, &dir, Section0Block::MeshGroupAssignments)?,
        objects,
        material_instances: read_optional_table(data, &dir, Section0Block::MaterialInstances)?,
        bone_groups,
        textures: read_optional_table(data, &dir, Section0Block::Textures)?,
        material_parameters: read_optional_table(data, &dir, Section0Block::MaterialParameters)?,
        material_types: read_optional_table(data, &dir, Section0Block::MaterialTypes)?,
        mesh_format_assignments: read_optional_table(data, &dir, Section0Block::MeshFormatAssignments)?,
        vertex_buffers: read_optional_table(data, &dir, Section0Block::VertexBuffers)?,
        vertex_formats,
        strings,
        bounding_boxes: read_optional_table(data, &dir, Section0Block::BoundingBoxes)?,
        buffer_offsets,
        lods: read_optional_table(data, &dir, Section0Block::Lods)?,
        face_indices: read_optional_table(data, &dir, Section0Block::FaceIndices)?,
        block18: read_optional_table(data, &dir, Section0Block::Block18)?,
        block20: read_optional_table(data, &dir, Section0Block::Block20)?,
        section1_block0,
        section1_block1,
        submeshes,
    };
    Ok((model, raw))
}

fn decode_geometry(
    data: &[u8],
    dir: &Directory,
    objects: &[ObjectData],
    vertex_formats: &[VertexFormatEntry],
    buffer_offsets: &[BufferOffsetEntry],
) -> Result<(Vec<SubmeshGeometry>, Vec<RawNormals>)> {
    let [positions, attributes, faces] = match buffer_offsets {
        [p, a, f, ..] => [p, a, f],
        _ => {
            return Err(FmdlError::MalformedBlock {
                block: Section0Block::BufferOffsets.name(),
                detail: format!("expected at least 3 regions, found {}", buffer_offsets.len()),
            });
        }
    };

    let formats = formats_per_submesh(vertex_formats);
    if formats.len() < objects.len() {
        return Err(FmdlError::MalformedBlock {
            block: Section0Block::VertexFormats.name(),
            detail: format!("{} format lists for {} submeshes", formats.len(), objects.len()),
        });
    }

    let geometry = dir.require_section1(Section1Block::Geometry)?;
    let base = dir.section1_start(geometry);
    let mut position_cursor = positions.offset as usize;
    let mut attribute_cursor = attributes.offset as usize;
    let face_base = faces.offset as usize;

    let mut submeshes = Vec::with_capacity(objects.len());
    let mut raw_normals = Vec::with_capacity(objects.len());
    for (index, object) in objects.iter().enumerate() {
        let layout = submesh_layout(index, &formats[index])?;
        let vertex_count = object.vertex_count as usize;
        debug!(
            "submesh {}: {} vertices, {} face vertices from {}, layout {:?}",
            index, vertex_count, object.face_vertex_count, object.first_face_vertex_id, layout
        );

        let len = vertex_count * POSITION_SIZE;
        let bytes = slice_at(data, base + position_cursor, len, "position buffer")?;
        let mut submesh = SubmeshGeometry {
            positions: decode_positions(bytes, vertex_count)?,
            ..Default::default()
        };
        position_cursor = align16(position_cursor + len);

        let len = vertex_count * attribute_stride(&layout);
        let bytes = slice_at(data, base + attribute_cursor, len, "attribute buffer")?;
        let mut raw = RawNormals::default();
        decode_attributes(bytes, vertex_count, &layout, &mut submesh, Some(&mut raw))?;
        attribute_cursor = align16(attribute_cursor + len);

        let face_vertex_count = object.face_vertex_count as usize;
        if face_vertex_count % 3 != 0 {
            return Err(FmdlError::MalformedBlock {
                block: Section0Block::Objects.name(),
                detail: format!("submesh {} has {} face vertices, not a multiple of 3", index, face_vertex_count),
            });
        }
        let start = face_base + object.first_face_vertex_id as usize * 2;
        let bytes = slice_at(data, base + start, face_vertex_count / 3 * FACE_SIZE, "face buffer")?;
        submesh.triangles = decode_faces(bytes, face_vertex_count)?;
        if let Some(&bad) = submesh.triangles.iter().flatten().find(|&&i| i as usize >= vertex_count) {
            return Err(FmdlError::MalformedBlock {
                block: "face buffer",
                detail: format!("submesh {} references vertex {} of {}", index, bad, vertex_count),
            });
        }

        submeshes.push(submesh);
        raw_normals.push(raw);
    }
    Ok((submeshes, raw_normals))
}
