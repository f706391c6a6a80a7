use crate::config::ModelKind;
use crate::error::{FmdlError, Result};
use crate::model::FmdlModel;
use std::fmt::{self, Write as FmtWrite};

/// Writes every submesh as its own OBJ object named `<Kind>_<n>`.
///
/// Floats use the shortest representation that parses back to the same
/// value, so an OBJ written here imports without drift.
pub fn model_to_obj_bytes(model: &FmdlModel, kind: ModelKind) -> Result<Vec<u8>> {
    let mut output = String::new();
    fmt_ok(writeln!(&mut output, "# {} submeshes", model.submeshes.len()))?;

    let mut base = 1usize;
    for (index, submesh) in model.submeshes.iter().enumerate() {
        fmt_ok(writeln!(&mut output, "o {}", kind.submesh_name(index)))?;

        for p in &submesh.positions {
            fmt_ok(writeln!(&mut output, "v {} {} {}", p[0], p[1], p[2]))?;
        }
        let has_uv = submesh.uv0.is_some();
        for uv in submesh.uv0.iter().flatten() {
            fmt_ok(writeln!(&mut output, "vt {} {}", uv[0], uv[1]))?;
        }
        let has_normals = submesh.normals.is_some();
        for n in submesh.normals.iter().flatten() {
            fmt_ok(writeln!(&mut output, "vn {} {} {}", n[0], n[1], n[2]))?;
        }

        for face in &submesh.triangles {
            output.push('f');
            for &index in face {
                let i = base + index as usize;
                match (has_uv, has_normals) {
                    (true, true) => fmt_ok(write!(&mut output, " {}/{}/{}", i, i, i))?,
                    (true, false) => fmt_ok(write!(&mut output, " {}/{}", i, i))?,
                    (false, true) => fmt_ok(write!(&mut output, " {}//{}", i, i))?,
                    (false, false) => fmt_ok(write!(&mut output, " {}", i))?,
                }
            }
            output.push('\n');
        }
        base += submesh.vertex_count();
    }

    Ok(output.into_bytes())
}

fn fmt_ok(result: fmt::Result) -> Result<()> {
    result.map_err(|_| FmdlError::Unsupported("failed to format OBJ output".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::SubmeshGeometry;

    #[test]
    fn submeshes_become_named_objects_with_global_indices() {
        let triangle = SubmeshGeometry {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.5, -0.25]],
            uv0: Some(vec![[0.0, 1.0], [1.0, 1.0], [0.0, 0.0]]),
            triangles: vec![[0, 1, 2]],
            ..Default::default()
        };
        let mut model_submeshes = vec![triangle.clone(), triangle];
        model_submeshes[1].uv0 = None;

        let text = String::from_utf8(render(model_submeshes)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "o Hair_0");
        assert_eq!(lines[4], "v 0 1.5 -0.25");
        assert!(lines.contains(&"f 1/1 2/2 3/3"));
        assert!(lines.contains(&"o Hair_1"));
        assert_eq!(*lines.last().unwrap(), "f 4 5 6");
    }

    fn render(submeshes: Vec<SubmeshGeometry>) -> Vec<u8> {
        let model = FmdlModel {
            submeshes,
            ..Default::default()
        };
        model_to_obj_bytes(&model, ModelKind::Hair).unwrap()
    }
}
