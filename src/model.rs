//! The decoded, in-memory form of an FMDL file.
use crate::error::Result;
use crate::fmdl_types::*;
use crate::strings::{FmdlString, string_at};
use crate::vertex::{SubmeshGeometry, VertexUsage, formats_per_submesh, submesh_layout};
use serde::Serialize;
use std::collections::BTreeSet;

/// Every table of one model plus the decoded geometry of each submesh.
///
/// Tables are indexed by position and refer to each other only by index.
/// Byte offsets are not stored; the encoder derives them again.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FmdlModel {
    pub version: f32,
    /// Ids of the section-0 blocks this model carries, in ascending id order.
    pub section0_blocks: BTreeSet<u16>,
    pub bones: Vec<SkeletonBone>,
    pub mesh_groups: Vec<MeshGroupDef>,
    pub mesh_group_assignments: Vec<MeshGroupAssignment>,
    pub objects: Vec<ObjectData>,
    pub material_instances: Vec<MaterialInstanceDef>,
    pub bone_groups: Vec<BoneGroup>,
    pub textures: Vec<TextureDef>,
    pub material_parameters: Vec<MaterialParameterDef>,
    pub material_types: Vec<MaterialTypeDef>,
    pub mesh_format_assignments: Vec<MeshFormatAssignment>,
    pub vertex_buffers: Vec<VertexBufferDef>,
    pub vertex_formats: Vec<VertexFormatEntry>,
    pub strings: Vec<FmdlString>,
    pub bounding_boxes: Vec<BoundingBox>,
    pub buffer_offsets: Vec<BufferOffsetEntry>,
    pub lods: Vec<LodInfo>,
    pub face_indices: Vec<FaceIndexEntry>,
    pub block18: Vec<[u8; 8]>,
    pub block20: Vec<[u8; 32]>,
    #[serde(skip)]
    pub section1_block0: Vec<u8>,
    #[serde(skip)]
    pub section1_block1: Option<Vec<u8>>,
    pub submeshes: Vec<SubmeshGeometry>,
}

impl FmdlModel {
    pub fn has_block(&self, block: Section0Block) -> bool {
        self.section0_blocks.contains(&block.id())
    }

    pub fn has_skeleton(&self) -> bool {
        self.has_block(Section0Block::Bones)
    }

    pub fn string(&self, index: u16) -> Option<&str> {
        string_at(&self.strings, index)
    }

    /// Attribute layout of every submesh, in submesh order.
    pub fn submesh_layouts(&self) -> Result<Vec<Vec<VertexUsage>>> {
        formats_per_submesh(&self.vertex_formats)
            .iter()
            .enumerate()
            .map(|(submesh, entries)| submesh_layout(submesh, entries))
            .collect()
    }

    pub fn bone_names(&self) -> Vec<&str> {
        self.bones
            .iter()
            .map(|bone| self.string(bone.name_string_index).unwrap_or_default())
            .collect()
    }
}
