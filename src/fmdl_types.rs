//! On-disk record layouts of an FMDL file.
//!
//! Every section-0 table is a homogeneous array of one of these records. All
//! values are little-endian; padding is skipped on read and zero-filled on
//! write.
use crate::error::{FmdlError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::io::{Read, Write};

pub const MAGIC: [u8; 4] = *b"FMDL";
pub const HEADER_SIZE: usize = 64;
pub const BONE_GROUP_SLOTS: usize = 32;

/// A fixed-size record of one section-0 table.
pub trait Record: Sized {
    const SIZE: usize;

    fn read<R: Read>(r: &mut R) -> Result<Self>;

    fn write<W: Write>(&self, w: &mut W) -> Result<()>;
}

/// Section-0 block ids. 15 and 19 are never used by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum Section0Block {
    Bones = 0,
    MeshGroups = 1,
    MeshGroupAssignments = 2,
    Objects = 3,
    MaterialInstances = 4,
    BoneGroups = 5,
    Textures = 6,
    MaterialParameters = 7,
    MaterialTypes = 8,
    MeshFormatAssignments = 9,
    VertexBuffers = 10,
    VertexFormats = 11,
    StringDefs = 12,
    BoundingBoxes = 13,
    BufferOffsets = 14,
    Lods = 16,
    FaceIndices = 17,
    Block18 = 18,
    Block20 = 20,
}

impl Section0Block {
    pub const ALL: [Section0Block; 19] = [
        Self::Bones,
        Self::MeshGroups,
        Self::MeshGroupAssignments,
        Self::Objects,
        Self::MaterialInstances,
        Self::BoneGroups,
        Self::Textures,
        Self::MaterialParameters,
        Self::MaterialTypes,
        Self::MeshFormatAssignments,
        Self::VertexBuffers,
        Self::VertexFormats,
        Self::StringDefs,
        Self::BoundingBoxes,
        Self::BufferOffsets,
        Self::Lods,
        Self::FaceIndices,
        Self::Block18,
        Self::Block20,
    ];

    pub fn from_id(id: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|block| block.id() == id)
    }

    pub fn id(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bones => "skeleton",
            Self::MeshGroups => "mesh group defs",
            Self::MeshGroupAssignments => "mesh group assignments",
            Self::Objects => "object data",
            Self::MaterialInstances => "material instance defs",
            Self::BoneGroups => "bone groups",
            Self::Textures => "texture defs",
            Self::MaterialParameters => "material parameter defs",
            Self::MaterialTypes => "material type defs",
            Self::MeshFormatAssignments => "mesh format assignments",
            Self::VertexBuffers => "vertex buffer defs",
            Self::VertexFormats => "vertex format defs",
            Self::StringDefs => "string defs",
            Self::BoundingBoxes => "bounding boxes",
            Self::BufferOffsets => "buffer offset table",
            Self::Lods => "lod table",
            Self::FaceIndices => "face index table",
            Self::Block18 => "block 18",
            Self::Block20 => "block 20",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum Section1Block {
    Block0 = 0,
    Block1 = 1,
    Geometry = 2,
    Strings = 3,
}

impl Section1Block {
    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Block0 => "section 1 block 0",
            Self::Block1 => "section 1 block 1",
            Self::Geometry => "geometry buffer",
            Self::Strings => "string blob",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkeletonBone {
    pub name_string_index: u16,
    /// `0xFFFF` marks a root bone.
    pub parent_id: u16,
    pub bounding_box_id: u16,
    pub flags: [u16; 2],
    pub reserved: u16,
    pub local_pos: [f32; 4],
    pub world_pos: [f32; 4],
}

pub const NO_PARENT: u16 = 0xffff;

impl Record for SkeletonBone {
    const SIZE: usize = 48;

    fn read<R: Read>(r: &mut R) -> Result<Self> {
        let name_string_index = r.read_u16::<LittleEndian>()?;
        let parent_id = r.read_u16::<LittleEndian>()?;
        let bounding_box_id = r.read_u16::<LittleEndian>()?;
        let flags = [r.read_u16::<LittleEndian>()?, r.read_u16::<LittleEndian>()?];
        let reserved = r.read_u16::<LittleEndian>()?;
        skip(r, 4)?;
        let local_pos = read_vec4(r)?;
        let world_pos = read_vec4(r)?;
        Ok(Self {
            name_string_index,
            parent_id,
            bounding_box_id,
            flags,
            reserved,
            local_pos,
            world_pos,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u16::<LittleEndian>(self.name_string_index)?;
        w.write_u16::<LittleEndian>(self.parent_id)?;
        w.write_u16::<LittleEndian>(self.bounding_box_id)?;
        w.write_u16::<LittleEndian>(self.flags[0])?;
        w.write_u16::<LittleEndian>(self.flags[1])?;
        w.write_u16::<LittleEndian>(self.reserved)?;
        pad(w, 4)?;
        write_vec4(w, &self.local_pos)?;
        write_vec4(w, &self.world_pos)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MeshGroupDef {
    pub name_string_index: u16,
    pub invisible_flag: u8,
    pub parent_group_id: u16,
    pub unknown: u16,
}

impl Record for MeshGroupDef {
    const SIZE: usize = 8;

    fn read<R: Read>(r: &mut R) -> Result<Self> {
        let name_string_index = r.read_u16::<LittleEndian>()?;
        let invisible_flag = r.read_u8()?;
        skip(r, 1)?;
        let parent_group_id = r.read_u16::<LittleEndian>()?;
        let unknown = r.read_u16::<LittleEndian>()?;
        Ok(Self {
            name_string_index,
            invisible_flag,
            parent_group_id,
            unknown,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u16::<LittleEndian>(self.name_string_index)?;
        w.write_u8(self.invisible_flag)?;
        pad(w, 1)?;
        w.write_u16::<LittleEndian>(self.parent_group_id)?;
        w.write_u16::<LittleEndian>(self.unknown)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MeshGroupAssignment {
    pub mesh_group_id: u16,
    pub object_count: u16,
    pub preceding_object_count: u16,
    pub first_object_id: u16,
    pub unknown: u16,
}

impl Record for MeshGroupAssignment {
    const SIZE: usize = 32;

    fn read<R: Read>(r: &mut R) -> Result<Self> {
        skip(r, 4)?;
        let mesh_group_id = r.read_u16::<LittleEndian>()?;
        let object_count = r.read_u16::<LittleEndian>()?;
        let preceding_object_count = r.read_u16::<LittleEndian>()?;
        let first_object_id = r.read_u16::<LittleEndian>()?;
        skip(r, 4)?;
        let unknown = r.read_u16::<LittleEndian>()?;
        skip(r, 14)?;
        Ok(Self {
            mesh_group_id,
            object_count,
            preceding_object_count,
            first_object_id,
            unknown,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        pad(w, 4)?;
        w.write_u16::<LittleEndian>(self.mesh_group_id)?;
        w.write_u16::<LittleEndian>(self.object_count)?;
        w.write_u16::<LittleEndian>(self.preceding_object_count)?;
        w.write_u16::<LittleEndian>(self.first_object_id)?;
        pad(w, 4)?;
        w.write_u16::<LittleEndian>(self.unknown)?;
        pad(w, 14)
    }
}

/// One submesh entry of the object table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObjectData {
    pub flags: u32,
    pub material_instance_id: u16,
    pub bone_group_id: u16,
    pub submesh_index: u16,
    pub vertex_count: u16,
    pub first_face_vertex_id: u32,
    pub face_vertex_count: u32,
    pub flags2: u32,
}

impl Record for ObjectData {
    const SIZE: usize = 48;

    fn read<R: Read>(r: &mut R) -> Result<Self> {
        let flags = r.read_u32::<LittleEndian>()?;
        let material_instance_id = r.read_u16::<LittleEndian>()?;
        let bone_group_id = r.read_u16::<LittleEndian>()?;
        let submesh_index = r.read_u16::<LittleEndian>()?;
        let vertex_count = r.read_u16::<LittleEndian>()?;
        skip(r, 4)?;
        let first_face_vertex_id = r.read_u32::<LittleEndian>()?;
        let face_vertex_count = r.read_u32::<LittleEndian>()?;
        let flags2 = r.read_u32::<LittleEndian>()?;
        skip(r, 20)?;
        Ok(Self {
            flags,
            material_instance_id,
            bone_group_id,
            submesh_index,
            vertex_count,
            first_face_vertex_id,
            face_vertex_count,
            flags2,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u32::<LittleEndian>(self.flags)?;
        w.write_u16::<LittleEndian>(self.material_instance_id)?;
        w.write_u16::<LittleEndian>(self.bone_group_id)?;
        w.write_u16::<LittleEndian>(self.submesh_index)?;
        w.write_u16::<LittleEndian>(self.vertex_count)?;
        pad(w, 4)?;
        w.write_u32::<LittleEndian>(self.first_face_vertex_id)?;
        w.write_u32::<LittleEndian>(self.face_vertex_count)?;
        w.write_u32::<LittleEndian>(self.flags2)?;
        pad(w, 20)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MaterialInstanceDef {
    pub name_string_index: u16,
    pub material_type_id: u16,
    pub texture_count: u8,
    pub parameter_count: u8,
    pub first_texture_index: u16,
    pub first_parameter_index: u16,
}

impl Record for MaterialInstanceDef {
    const SIZE: usize = 16;

    fn read<R: Read>(r: &mut R) -> Result<Self> {
        let name_string_index = r.read_u16::<LittleEndian>()?;
        skip(r, 2)?;
        let material_type_id = r.read_u16::<LittleEndian>()?;
        let texture_count = r.read_u8()?;
        let parameter_count = r.read_u8()?;
        let first_texture_index = r.read_u16::<LittleEndian>()?;
        let first_parameter_index = r.read_u16::<LittleEndian>()?;
        skip(r, 4)?;
        Ok(Self {
            name_string_index,
            material_type_id,
            texture_count,
            parameter_count,
            first_texture_index,
            first_parameter_index,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u16::<LittleEndian>(self.name_string_index)?;
        pad(w, 2)?;
        w.write_u16::<LittleEndian>(self.material_type_id)?;
        w.write_u8(self.texture_count)?;
        w.write_u8(self.parameter_count)?;
        w.write_u16::<LittleEndian>(self.first_texture_index)?;
        w.write_u16::<LittleEndian>(self.first_parameter_index)?;
        pad(w, 4)
    }
}

/// Skeleton bones referenced by one skinned submesh. Stored in a fixed
/// 32-entry slot on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoneGroup {
    pub unknown: u16,
    pub bone_ids: Vec<u16>,
}

impl Record for BoneGroup {
    const SIZE: usize = 4 + BONE_GROUP_SLOTS * 2;

    fn read<R: Read>(r: &mut R) -> Result<Self> {
        let unknown = r.read_u16::<LittleEndian>()?;
        let count = r.read_u16::<LittleEndian>()? as usize;
        if count > BONE_GROUP_SLOTS {
            return Err(FmdlError::BoneGroupOverflow { group: 0, count });
        }
        let mut bone_ids = Vec::with_capacity(count);
        for _ in 0..count {
            bone_ids.push(r.read_u16::<LittleEndian>()?);
        }
        skip(r, (BONE_GROUP_SLOTS - count) * 2)?;
        Ok(Self { unknown, bone_ids })
    }

    fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        let count = self.bone_ids.len();
        if count > BONE_GROUP_SLOTS {
            return Err(FmdlError::BoneGroupOverflow { group: 0, count });
        }
        w.write_u16::<LittleEndian>(self.unknown)?;
        w.write_u16::<LittleEndian>(count as u16)?;
        for &id in &self.bone_ids {
            w.write_u16::<LittleEndian>(id)?;
        }
        pad(w, (BONE_GROUP_SLOTS - count) * 2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextureDef {
    pub file_name_string_index: u16,
    pub directory_string_index: u16,
}

impl Record for TextureDef {
    const SIZE: usize = 4;

    fn read<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            file_name_string_index: r.read_u16::<LittleEndian>()?,
            directory_string_index: r.read_u16::<LittleEndian>()?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u16::<LittleEndian>(self.file_name_string_index)?;
        w.write_u16::<LittleEndian>(self.directory_string_index)?;
        Ok(())
    }
}

/// For texture parameters `reference_index` points into the texture table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MaterialParameterDef {
    pub name_string_index: u16,
    pub reference_index: u16,
}

impl Record for MaterialParameterDef {
    const SIZE: usize = 4;

    fn read<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            name_string_index: r.read_u16::<LittleEndian>()?,
            reference_index: r.read_u16::<LittleEndian>()?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u16::<LittleEndian>(self.name_string_index)?;
        w.write_u16::<LittleEndian>(self.reference_index)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MaterialTypeDef {
    pub name_string_index: u16,
    pub material_type: u16,
}

impl Record for MaterialTypeDef {
    const SIZE: usize = 4;

    fn read<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            name_string_index: r.read_u16::<LittleEndian>()?,
            material_type: r.read_u16::<LittleEndian>()?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u16::<LittleEndian>(self.name_string_index)?;
        w.write_u16::<LittleEndian>(self.material_type)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MeshFormatAssignment {
    pub buffer_count: u8,
    pub format_entry_count: u8,
    pub unknown: u16,
    pub first_buffer_id: u16,
    pub first_format_id: u16,
}

impl Record for MeshFormatAssignment {
    const SIZE: usize = 8;

    fn read<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            buffer_count: r.read_u8()?,
            format_entry_count: r.read_u8()?,
            unknown: r.read_u16::<LittleEndian>()?,
            first_buffer_id: r.read_u16::<LittleEndian>()?,
            first_format_id: r.read_u16::<LittleEndian>()?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u8(self.buffer_count)?;
        w.write_u8(self.format_entry_count)?;
        w.write_u16::<LittleEndian>(self.unknown)?;
        w.write_u16::<LittleEndian>(self.first_buffer_id)?;
        w.write_u16::<LittleEndian>(self.first_format_id)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum BufferKind {
    Position = 0,
    Attribute = 1,
    SecondaryAttribute = 2,
    Extra = 3,
}

impl BufferKind {
    pub fn from_u8(kind: u8) -> Option<Self> {
        match kind {
            0 => Some(Self::Position),
            1 => Some(Self::Attribute),
            2 => Some(Self::SecondaryAttribute),
            3 => Some(Self::Extra),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VertexBufferDef {
    pub buffer_id: u8,
    pub format_entry_count: u8,
    pub stride: u8,
    /// Raw [`BufferKind`]; unknown kinds only fail when offsets are rebuilt.
    pub buffer_kind: u8,
    pub byte_offset: u32,
}

impl Record for VertexBufferDef {
    const SIZE: usize = 8;

    fn read<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            buffer_id: r.read_u8()?,
            format_entry_count: r.read_u8()?,
            stride: r.read_u8()?,
            buffer_kind: r.read_u8()?,
            byte_offset: r.read_u32::<LittleEndian>()?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u8(self.buffer_id)?;
        w.write_u8(self.format_entry_count)?;
        w.write_u8(self.stride)?;
        w.write_u8(self.buffer_kind)?;
        w.write_u32::<LittleEndian>(self.byte_offset)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VertexFormatEntry {
    pub usage_code: u8,
    pub data_type: u8,
    pub byte_offset: u16,
}

impl Record for VertexFormatEntry {
    const SIZE: usize = 4;

    fn read<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            usage_code: r.read_u8()?,
            data_type: r.read_u8()?,
            byte_offset: r.read_u16::<LittleEndian>()?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u8(self.usage_code)?;
        w.write_u8(self.data_type)?;
        w.write_u16::<LittleEndian>(self.byte_offset)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StringTableEntry {
    pub kind: u16,
    pub length: u16,
    /// Relative to the start of the section-1 string blob.
    pub offset: u32,
}

impl Record for StringTableEntry {
    const SIZE: usize = 8;

    fn read<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            kind: r.read_u16::<LittleEndian>()?,
            length: r.read_u16::<LittleEndian>()?,
            offset: r.read_u32::<LittleEndian>()?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u16::<LittleEndian>(self.kind)?;
        w.write_u16::<LittleEndian>(self.length)?;
        w.write_u32::<LittleEndian>(self.offset)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub max: [f32; 4],
    pub min: [f32; 4],
}

impl Record for BoundingBox {
    const SIZE: usize = 32;

    fn read<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            max: read_vec4(r)?,
            min: read_vec4(r)?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        write_vec4(w, &self.max)?;
        write_vec4(w, &self.min)
    }
}

/// One region of section-1 block 2: positions, attribute stream, faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BufferOffsetEntry {
    pub flag: u32,
    pub size: u32,
    /// Relative to the start of section-1 block 2.
    pub offset: u32,
}

impl Record for BufferOffsetEntry {
    const SIZE: usize = 16;

    fn read<R: Read>(r: &mut R) -> Result<Self> {
        let flag = r.read_u32::<LittleEndian>()?;
        let size = r.read_u32::<LittleEndian>()?;
        let offset = r.read_u32::<LittleEndian>()?;
        skip(r, 4)?;
        Ok(Self { flag, size, offset })
    }

    fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u32::<LittleEndian>(self.flag)?;
        w.write_u32::<LittleEndian>(self.size)?;
        w.write_u32::<LittleEndian>(self.offset)?;
        pad(w, 4)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LodInfo {
    pub lod_count: u32,
    pub high_distance: f32,
    pub standard_distance: f32,
    pub low_distance: f32,
}

impl Record for LodInfo {
    const SIZE: usize = 16;

    fn read<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            lod_count: r.read_u32::<LittleEndian>()?,
            high_distance: r.read_f32::<LittleEndian>()?,
            standard_distance: r.read_f32::<LittleEndian>()?,
            low_distance: r.read_f32::<LittleEndian>()?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u32::<LittleEndian>(self.lod_count)?;
        w.write_f32::<LittleEndian>(self.high_distance)?;
        w.write_f32::<LittleEndian>(self.standard_distance)?;
        w.write_f32::<LittleEndian>(self.low_distance)?;
        Ok(())
    }
}

/// Face range of one LOD level, relative to its submesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FaceIndexEntry {
    pub first_face_vertex: u32,
    pub face_vertex_count: u32,
}

impl Record for FaceIndexEntry {
    const SIZE: usize = 8;

    fn read<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            first_face_vertex: r.read_u32::<LittleEndian>()?,
            face_vertex_count: r.read_u32::<LittleEndian>()?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u32::<LittleEndian>(self.first_face_vertex)?;
        w.write_u32::<LittleEndian>(self.face_vertex_count)?;
        Ok(())
    }
}

impl Record for [u8; 8] {
    const SIZE: usize = 8;

    fn read<R: Read>(r: &mut R) -> Result<Self> {
        let mut bytes = [0u8; 8];
        r.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(self)?;
        Ok(())
    }
}

impl Record for [u8; 32] {
    const SIZE: usize = 32;

    fn read<R: Read>(r: &mut R) -> Result<Self> {
        let mut bytes = [0u8; 32];
        r.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(self)?;
        Ok(())
    }
}

fn read_vec4<R: Read>(r: &mut R) -> Result<[f32; 4]> {
    Ok([
        r.read_f32::<LittleEndian>()?,
        r.read_f32::<LittleEndian>()?,
        r.read_f32::<LittleEndian>()?,
        r.read_f32::<LittleEndian>()?,
    ])
}

fn write_vec4<W: Write>(w: &mut W, v: &[f32; 4]) -> Result<()> {
    for &component in v {
        w.write_f32::<LittleEndian>(component)?;
    }
    Ok(())
}

fn skip<R: Read>(r: &mut R, count: usize) -> Result<()> {
    let mut scratch = [0u8; 64];
    r.read_exact(&mut scratch[..count])?;
    Ok(())
}

pub(crate) fn pad<W: Write>(w: &mut W, count: usize) -> Result<()> {
    const ZEROS: [u8; 64] = [0; 64];
    w.write_all(&ZEROS[..count])?;
    Ok(())
}
