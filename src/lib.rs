//! Reader and writer for FMDL, the binary model format of a sports
//! engine's character meshes.
//!
//! [`parse_fmdl`] turns a file into an [`FmdlModel`]; [`write_fmdl`] turns a
//! model, possibly with edited geometry, back into bytes the engine accepts.
//! Every offset and size in the output is derived from what is actually
//! written. [`CodecSession`] wraps the two with per-model settings.
pub mod blocks;
pub mod config;
pub mod directory;
pub mod error;
pub mod float16;
pub mod fmdl_types;
pub mod importer;
pub mod material;
pub mod model;
pub mod obj;
pub mod parser;
pub mod ser;
pub mod session;
pub mod strings;
pub mod vertex;

pub use config::{CodecConfig, ModelKind, ToolConfig};
pub use error::{FmdlError, Result};
pub use material::{MaterialReport, TextureSource, resolve_materials};
pub use model::FmdlModel;
pub use parser::{parse_fmdl, parse_fmdl_with_raw};
pub use ser::{write_fmdl, write_fmdl_with_raw};
pub use session::CodecSession;
pub use vertex::{RawNormals, SubmeshGeometry, TangentAxes};
