//! Mesh to material to texture lookup.
//!
//! Read-only over the model tables. Broken references are logged and the
//! affected mapping is left out; they never fail the report.
use crate::model::FmdlModel;
use log::warn;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextureBinding {
    /// Shader parameter the texture is bound to, e.g. `Base_Tex_SRGB`.
    pub parameter: String,
    pub file_name: String,
    pub directory: String,
    /// Viewable image found by a [`TextureSource`], if one was asked.
    pub image: Option<PathBuf>,
}

impl TextureBinding {
    /// Engine path of the texture: directory joined with file name.
    pub fn path(&self) -> String {
        format!("{}{}", self.directory, self.file_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialAssignment {
    pub submesh: usize,
    pub material_instance: u16,
    pub material_name: String,
    pub textures: Vec<TextureBinding>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MaterialReport {
    pub assignments: Vec<MaterialAssignment>,
}

pub fn resolve_materials(model: &FmdlModel) -> MaterialReport {
    let name = |index: u16, what: &str| match model.string(index) {
        Some(text) => text.to_string(),
        None => {
            warn!("{} string index {} is out of range", what, index);
            String::new()
        }
    };

    let mut assignments = Vec::with_capacity(model.objects.len());
    for (submesh, object) in model.objects.iter().enumerate() {
        let Some(instance) = model.material_instances.get(object.material_instance_id as usize) else {
            warn!(
                "submesh {}: material instance {} is out of range",
                submesh, object.material_instance_id
            );
            continue;
        };

        let first = instance.first_texture_index as usize;
        let mut textures = Vec::with_capacity(instance.texture_count as usize);
        for parameter_index in first..first + instance.texture_count as usize {
            let Some(parameter) = model.material_parameters.get(parameter_index) else {
                warn!(
                    "submesh {}: material parameter {} is out of range ({} defined)",
                    submesh,
                    parameter_index,
                    model.material_parameters.len()
                );
                continue;
            };
            let Some(texture) = model.textures.get(parameter.reference_index as usize) else {
                warn!(
                    "submesh {}: texture def {} is out of range ({} defined)",
                    submesh,
                    parameter.reference_index,
                    model.textures.len()
                );
                continue;
            };
            textures.push(TextureBinding {
                parameter: name(parameter.name_string_index, "parameter name"),
                file_name: name(texture.file_name_string_index, "texture file"),
                directory: name(texture.directory_string_index, "texture directory"),
                image: None,
            });
        }

        assignments.push(MaterialAssignment {
            submesh,
            material_instance: object.material_instance_id,
            material_name: name(instance.name_string_index, "material name"),
            textures,
        });
    }
    MaterialReport { assignments }
}

impl MaterialReport {
    /// Asks `source` for an image of every binding, logging the gaps.
    pub fn locate_images<S: TextureSource>(&mut self, source: &S) {
        for assignment in &mut self.assignments {
            for binding in &mut assignment.textures {
                match source.locate(binding) {
                    Ok(path) => binding.image = Some(path),
                    Err(missing) => {
                        warn!("{}: {}", assignment.material_name, missing);
                        binding.image = None;
                    }
                }
            }
        }
    }
}

#[derive(Debug, Error)]
#[error("texture image not found: {}", .path.display())]
pub struct TextureMissing {
    pub path: PathBuf,
}

/// Boundary to whatever turns engine textures into viewable images.
pub trait TextureSource {
    fn locate(&self, binding: &TextureBinding) -> Result<PathBuf, TextureMissing>;
}

/// Looks for `<root>/<file stem>.<extension>` on disk.
#[derive(Debug, Clone)]
pub struct DirectoryTextureSource {
    root: PathBuf,
    extension: String,
}

impl DirectoryTextureSource {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn candidate(&self, binding: &TextureBinding) -> PathBuf {
        let stem = Path::new(&binding.file_name)
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_default();
        self.root.join(stem).with_extension(&self.extension)
    }
}

impl TextureSource for DirectoryTextureSource {
    fn locate(&self, binding: &TextureBinding) -> Result<PathBuf, TextureMissing> {
        let path = self.candidate(binding);
        if path.is_file() {
            Ok(path)
        } else {
            Err(TextureMissing { path })
        }
    }
}
