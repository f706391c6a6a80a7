//! The shared string pool: definitions in section 0, bytes in section 1.
use crate::directory::{Directory, slice_at, to_u32};
use crate::error::{FmdlError, Result};
use crate::fmdl_types::{Section1Block, StringTableEntry};
use encoding_rs::UTF_8;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FmdlString {
    pub kind: u16,
    pub text: String,
}

/// Resolves every string definition against the section-1 string blob.
pub fn read_strings(data: &[u8], dir: &Directory, defs: &[StringTableEntry]) -> Result<Vec<FmdlString>> {
    let blob = dir.require_section1(Section1Block::Strings)?;
    let base = dir.section1_start(blob);

    defs.iter()
        .enumerate()
        .map(|(index, def)| {
            let bytes = slice_at(data, base + def.offset as usize, def.length as usize, "string blob")?;
            let text = UTF_8
                .decode_without_bom_handling_and_without_replacement(bytes)
                .ok_or(FmdlError::InvalidString { index })?;
            Ok(FmdlString {
                kind: def.kind,
                text: text.into_owned(),
            })
        })
        .collect()
}

/// Lays strings out back to back, each followed by a NUL.
pub fn build_string_table(strings: &[FmdlString]) -> Result<(Vec<StringTableEntry>, Vec<u8>)> {
    let mut defs = Vec::with_capacity(strings.len());
    let mut blob = Vec::new();

    for string in strings {
        let bytes = string.text.as_bytes();
        let length = u16::try_from(bytes.len()).map_err(|_| FmdlError::OutOfRange {
            what: "string length",
            value: bytes.len(),
            max: u16::MAX as usize,
        })?;
        defs.push(StringTableEntry {
            kind: string.kind,
            length,
            offset: to_u32(blob.len(), "string offset")?,
        });
        blob.extend_from_slice(bytes);
        blob.push(0);
    }

    Ok((defs, blob))
}

/// Looks up a string by index; `None` when the index is out of range.
pub fn string_at(strings: &[FmdlString], index: u16) -> Option<&str> {
    strings.get(index as usize).map(|s| s.text.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{FMDL_VERSION, Section1Entry};

    fn strings(texts: &[&str]) -> Vec<FmdlString> {
        texts
            .iter()
            .map(|text| FmdlString { kind: 3, text: text.to_string() })
            .collect()
    }

    #[test]
    fn offsets_skip_the_terminator() {
        let (defs, blob) = build_string_table(&strings(&["", "SKL_000_WAIST", "mtl"])).unwrap();
        assert_eq!(defs[0].offset, 0);
        assert_eq!(defs[1].offset, 1);
        assert_eq!(defs[1].length, 13);
        assert_eq!(defs[2].offset, 15);
        assert_eq!(blob.len(), 19);
        assert_eq!(blob[14], 0);
    }

    fn file_with_blob(blob: &[u8]) -> (Vec<u8>, Directory) {
        let dir = Directory::from_entries(
            FMDL_VERSION,
            Vec::new(),
            0,
            vec![Section1Entry { id: 3, offset: 0, size: blob.len() as u32 }],
            blob.len(),
        )
        .unwrap();
        let mut file = Vec::new();
        dir.write(&mut file).unwrap();
        file.resize(dir.header.section1_offset as usize, 0);
        file.extend_from_slice(blob);
        (file, dir)
    }

    #[test]
    fn strings_resolve_from_the_blob() {
        let original = strings(&["", "face_hair", "Base_Tex_SRGB"]);
        let (defs, blob) = build_string_table(&original).unwrap();
        let (file, dir) = file_with_blob(&blob);
        assert_eq!(read_strings(&file, &dir, &defs).unwrap(), original);
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let (file, dir) = file_with_blob(&[b'o', b'k', 0, 0xff, 0xfe, 0]);
        let defs = [
            StringTableEntry { kind: 3, length: 2, offset: 0 },
            StringTableEntry { kind: 3, length: 2, offset: 3 },
        ];
        let err = read_strings(&file, &dir, &defs).unwrap_err();
        assert!(matches!(err, FmdlError::InvalidString { index: 1 }));
    }
}
