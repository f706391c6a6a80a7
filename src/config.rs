use crate::error::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_TEXTURE_EXTENSION: &str = "PNG";

/// Which part of a player model a file holds. Only changes submesh naming
/// and the default for normal processing.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    #[default]
    Face,
    Hair,
    Oral,
    Generic,
}

impl ModelKind {
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Face => "Face",
            ModelKind::Hair => "Hair",
            ModelKind::Oral => "Oral",
            ModelKind::Generic => "Generic",
        }
    }

    pub fn default_config(self) -> CodecConfig {
        CodecConfig {
            process_normals: matches!(self, ModelKind::Face | ModelKind::Hair),
        }
    }

    /// `Face_0`, `Hair_3`, ...
    pub fn submesh_name(self, index: usize) -> String {
        format!("{}_{}", self.name(), index)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecConfig {
    /// Keep the stored normal and tangent halfwords and write them back
    /// unchanged for submeshes whose geometry was not replaced.
    pub process_normals: bool,
}

/// Optional JSON file passed with `--config`. Command-line flags win.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    pub kind: Option<ModelKind>,
    pub process_normals: Option<bool>,
    pub texture_dir: Option<PathBuf>,
    pub texture_extension: Option<String>,
}

impl ToolConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Resolves the model kind and codec settings, `kind` overriding the file.
    pub fn codec(&self, kind: Option<ModelKind>) -> (ModelKind, CodecConfig) {
        let kind = kind.or(self.kind).unwrap_or_default();
        let mut config = kind.default_config();
        if let Some(process_normals) = self.process_normals {
            config.process_normals = process_normals;
        }
        (kind, config)
    }

    pub fn texture_extension(&self) -> &str {
        self.texture_extension.as_deref().unwrap_or(DEFAULT_TEXTURE_EXTENSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_pick_their_normal_default() {
        assert!(ModelKind::Face.default_config().process_normals);
        assert!(ModelKind::Hair.default_config().process_normals);
        assert!(!ModelKind::Oral.default_config().process_normals);
        assert!(!ModelKind::Generic.default_config().process_normals);
        assert_eq!(ModelKind::Oral.submesh_name(2), "Oral_2");
    }

    #[test]
    fn file_values_apply_unless_overridden() {
        let config: ToolConfig =
            serde_json::from_str(r#"{ "kind": "Hair", "process_normals": false, "texture_dir": "tex" }"#).unwrap();
        assert_eq!(config.codec(None), (ModelKind::Hair, CodecConfig { process_normals: false }));
        assert_eq!(config.codec(Some(ModelKind::Oral)).0, ModelKind::Oral);
        assert_eq!(config.texture_extension(), "PNG");
        assert_eq!(config.texture_dir, Some(PathBuf::from("tex")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(serde_json::from_str::<ToolConfig>(r#"{ "kinds": "Face" }"#).is_err());
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fmdl.json");
        std::fs::write(&path, r#"{ "texture_extension": "tga" }"#).unwrap();
        let config = ToolConfig::load(&path).unwrap();
        assert_eq!(config.texture_extension(), "tga");
        assert_eq!(config.codec(None).0, ModelKind::Face);
    }
}
