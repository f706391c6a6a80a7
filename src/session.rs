//! One import/export session over a single model.
use crate::config::{CodecConfig, ModelKind};
use crate::error::{FmdlError, Result};
use crate::fmdl_types::FaceIndexEntry;
use crate::model::FmdlModel;
use crate::parser::parse_fmdl_with_raw;
use crate::ser::write_fmdl_with_raw;
use crate::vertex::{RawNormals, SubmeshGeometry};
use log::{debug, info, warn};
use std::fs;
use std::path::Path;

/// Owns at most one decoded model plus the raw normal scratch taken from
/// it. Sessions share nothing; use one per model.
#[derive(Debug)]
pub struct CodecSession {
    kind: ModelKind,
    config: CodecConfig,
    model: Option<FmdlModel>,
    raw_normals: Vec<Option<RawNormals>>,
}

impl CodecSession {
    pub fn new(kind: ModelKind, config: CodecConfig) -> Self {
        Self {
            kind,
            config,
            model: None,
            raw_normals: Vec::new(),
        }
    }

    pub fn for_kind(kind: ModelKind) -> Self {
        Self::new(kind, kind.default_config())
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn config(&self) -> CodecConfig {
        self.config
    }

    pub fn model(&self) -> Option<&FmdlModel> {
        self.model.as_ref()
    }

    pub fn raw_normals(&self, submesh: usize) -> Option<&RawNormals> {
        self.raw_normals.get(submesh).and_then(Option::as_ref)
    }

    pub fn import(&mut self, path: &Path) -> Result<&FmdlModel> {
        info!("importing {} model from {}", self.kind, path.display());
        let data = fs::read(path)?;
        self.import_bytes(&data)
    }

    /// Replaces the current model. The raw normal scratch of the previous
    /// import is dropped before anything is decoded.
    pub fn import_bytes(&mut self, data: &[u8]) -> Result<&FmdlModel> {
        self.raw_normals.clear();
        self.model = None;

        let (model, raw) = parse_fmdl_with_raw(data)?;
        if self.config.process_normals {
            self.raw_normals = raw.into_iter().map(Some).collect();
        }
        debug!(
            "{}: {} submeshes, {} bones, {} strings",
            self.kind,
            model.submeshes.len(),
            model.bones.len(),
            model.strings.len()
        );
        Ok(self.model.insert(model))
    }

    pub fn export(&self, path: &Path) -> Result<()> {
        let bytes = self.export_bytes()?;
        fs::write(path, bytes)?;
        info!("exported {} model to {}", self.kind, path.display());
        Ok(())
    }

    pub fn export_bytes(&self) -> Result<Vec<u8>> {
        let model = self.loaded()?;
        write_fmdl_with_raw(model, &self.raw_normals)
    }

    /// Object names handed to the geometry host, in submesh order.
    pub fn submesh_names(&self) -> Vec<String> {
        let count = self.model.as_ref().map_or(0, |m| m.submeshes.len());
        (0..count).map(|i| self.kind.submesh_name(i)).collect()
    }

    /// Swaps in edited geometry for one submesh and brings the tables that
    /// describe it up to date.
    pub fn replace_geometry(&mut self, submesh: usize, geometry: SubmeshGeometry) -> Result<()> {
        let model = self
            .model
            .as_mut()
            .ok_or_else(|| FmdlError::Unsupported("no model has been imported".to_string()))?;

        let submesh_count = model.objects.len();
        if submesh >= submesh_count {
            return Err(FmdlError::OutOfRange {
                what: "submesh index",
                value: submesh,
                max: submesh_count.saturating_sub(1),
            });
        }
        let vertex_count = u16::try_from(geometry.vertex_count()).map_err(|_| FmdlError::OutOfRange {
            what: "submesh vertex count",
            value: geometry.vertex_count(),
            max: u16::MAX as usize,
        })?;
        if let Some(&bad) = geometry
            .triangles
            .iter()
            .flatten()
            .find(|&&index| index as usize >= geometry.vertex_count())
        {
            return Err(FmdlError::OutOfRange {
                what: "face vertex index",
                value: bad as usize,
                max: geometry.vertex_count().saturating_sub(1),
            });
        }
        let face_vertex_count = u32::try_from(geometry.face_vertex_count()).map_err(|_| FmdlError::OutOfRange {
            what: "face vertex count",
            value: geometry.face_vertex_count(),
            max: u32::MAX as usize,
        })?;

        let object = &mut model.objects[submesh];
        let faces_changed = object.face_vertex_count != face_vertex_count;
        object.vertex_count = vertex_count;
        object.face_vertex_count = face_vertex_count;
        if faces_changed {
            collapse_lods(&mut model.face_indices, submesh, submesh_count, face_vertex_count);
        }
        model.submeshes[submesh] = geometry;

        if let Some(raw) = self.raw_normals.get_mut(submesh) {
            *raw = None;
        }
        debug!(
            "replaced submesh {}: {} vertices, {} face vertices",
            submesh, vertex_count, face_vertex_count
        );
        Ok(())
    }

    fn loaded(&self) -> Result<&FmdlModel> {
        self.model
            .as_ref()
            .ok_or_else(|| FmdlError::Unsupported("no model has been imported".to_string()))
    }
}

/// Points every LOD level of `submesh` at its full face range. The face
/// index table holds the same number of levels for each submesh.
fn collapse_lods(entries: &mut [FaceIndexEntry], submesh: usize, submesh_count: usize, face_vertex_count: u32) {
    if entries.is_empty() {
        return;
    }
    if entries.len() % submesh_count != 0 {
        warn!(
            "face index table has {} entries for {} submeshes, leaving it unchanged",
            entries.len(),
            submesh_count
        );
        return;
    }
    let levels = entries.len() / submesh_count;
    for entry in &mut entries[submesh * levels..(submesh + 1) * levels] {
        *entry = FaceIndexEntry {
            first_face_vertex: 0,
            face_vertex_count,
        };
    }
}
