use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FmdlError {
    #[error("not an fmdl file: expected magic \"FMDL\", found {found:02x?}")]
    BadMagic { found: [u8; 4] },

    #[error("required section {section} block {id} ({name}) is missing from the directory")]
    MissingBlock {
        section: u8,
        id: u32,
        name: &'static str,
    },

    #[error("{block} is truncated: needs {needed} bytes at offset {offset:#x}, file has {available}")]
    Truncated {
        block: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("submesh {submesh}: face {face} has {arity} vertices, only triangles can be exported")]
    NonTriangularFace {
        submesh: usize,
        face: usize,
        arity: usize,
    },

    #[error("{block} is malformed: {detail}")]
    MalformedBlock { block: &'static str, detail: String },

    #[error("bone group {group} lists {count} bones, the fixed slot holds at most 32")]
    BoneGroupOverflow { group: usize, count: usize },

    #[error("submesh {submesh}: object data declares {expected} vertices but geometry supplies {supplied}")]
    VertexCountMismatch {
        submesh: usize,
        expected: usize,
        supplied: usize,
    },

    #[error("submesh {submesh}: vertex format requires {usage} data but none was supplied")]
    MissingAttribute { submesh: usize, usage: &'static str },

    #[error("submesh {submesh}: unknown vertex usage code {usage}")]
    UnknownUsage { submesh: usize, usage: u8 },

    #[error("submesh {submesh}: vertex usage code {usage} appears more than once")]
    DuplicateUsage { submesh: usize, usage: u8 },

    #[error("vertex buffer def {index}: unknown buffer kind {kind}")]
    UnknownBufferKind { index: usize, kind: u8 },

    #[error("{what} value {value} does not fit the on-disk field (max {max})")]
    OutOfRange {
        what: &'static str,
        value: usize,
        max: usize,
    },

    #[error("string {index} is not valid utf-8")]
    InvalidString { index: usize },

    #[error("failed to parse obj file: {0}")]
    ObjParse(#[from] tobj::LoadError),

    #[error("failed to find processable mesh data in obj file")]
    NoMeshData,

    #[error("an i/o error occurred: {0}")]
    Io(#[from] io::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("an unsupported operation was attempted: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, FmdlError>;
