use crate::error::{FmdlError, Result};
use crate::vertex::{SubmeshGeometry, triangles_from_polygons};

/// One OBJ object as the geometry host hands it over: polygons are kept
/// as written, triangulation is the host's job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub polygons: Vec<Vec<u32>>,
}

pub fn load_obj_meshes(obj_data: &[u8]) -> Result<Vec<ImportedMesh>> {
    let (models, _) = tobj::load_obj_buf(
        &mut obj_data.as_ref(),
        &tobj::LoadOptions {
            triangulate: false,
            single_index: true,
            ..Default::default()
        },
        |_| Ok(Default::default()),
    )?;

    let meshes: Vec<ImportedMesh> = models
        .into_iter()
        .filter(|model| !model.mesh.indices.is_empty())
        .map(|model| {
            let mesh = model.mesh;
            let vertex_count = mesh.positions.len() / 3;
            let positions = mesh.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]).collect();
            let normals = (mesh.normals.len() == vertex_count * 3 && vertex_count > 0)
                .then(|| mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]).collect());
            let uvs = (mesh.texcoords.len() == vertex_count * 2 && vertex_count > 0)
                .then(|| mesh.texcoords.chunks_exact(2).map(|t| [t[0], t[1]]).collect());

            let polygons = if mesh.face_arities.is_empty() {
                mesh.indices.chunks_exact(3).map(|f| f.to_vec()).collect()
            } else {
                let mut polygons = Vec::with_capacity(mesh.face_arities.len());
                let mut start = 0usize;
                for &arity in &mesh.face_arities {
                    let end = start + arity as usize;
                    polygons.push(mesh.indices[start..end].to_vec());
                    start = end;
                }
                polygons
            };

            ImportedMesh {
                name: model.name,
                positions,
                normals,
                uvs,
                polygons,
            }
        })
        .collect();

    if meshes.is_empty() {
        return Err(FmdlError::NoMeshData);
    }
    Ok(meshes)
}

/// Builds submesh geometry from an imported mesh. Attributes OBJ cannot
/// carry (tangents, colours, bone data, the second UV set) are copied from
/// the closest vertex of `template`.
pub fn geometry_from_mesh(mesh: &ImportedMesh, template: &SubmeshGeometry, submesh: usize) -> Result<SubmeshGeometry> {
    let triangles = triangles_from_polygons(submesh, &mesh.polygons)?;
    let nearest: Vec<Option<usize>> = mesh
        .positions
        .iter()
        .map(|p| nearest_vertex(&template.positions, p))
        .collect();

    let normals = match &mesh.normals {
        Some(normals) => Some(normals.iter().map(|n| [n[0], n[1], n[2], 1.0]).collect()),
        None => transfer_attribute(template.normals.as_deref(), &nearest),
    };
    let uv0 = match &mesh.uvs {
        Some(uvs) => Some(uvs.clone()),
        None => transfer_attribute(template.uv0.as_deref(), &nearest),
    };

    Ok(SubmeshGeometry {
        positions: mesh.positions.clone(),
        normals,
        tangents: transfer_attribute(template.tangents.as_deref(), &nearest),
        tangent_axes: template.tangent_axes,
        colors: transfer_attribute(template.colors.as_deref(), &nearest),
        bone_weights: transfer_attribute(template.bone_weights.as_deref(), &nearest),
        bone_ids: transfer_attribute(template.bone_ids.as_deref(), &nearest),
        uv0,
        uv1: transfer_attribute(template.uv1.as_deref(), &nearest),
        triangles,
    })
}

fn transfer_attribute<T: Copy>(source: Option<&[T]>, nearest: &[Option<usize>]) -> Option<Vec<T>> {
    let source = source?;
    nearest.iter().map(|index| index.and_then(|i| source.get(i).copied())).collect()
}

fn nearest_vertex(positions: &[[f32; 3]], target: &[f32; 3]) -> Option<usize> {
    positions
        .iter()
        .map(|p| {
            let d = [p[0] - target[0], p[1] - target[1], p[2] - target[2]];
            d[0] * d[0] + d[1] * d[1] + d[2] * d[2]
        })
        .enumerate()
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::{TangentAxes, VertexUsage, decode_attributes, encode_attributes};

    const QUAD_AND_TRIANGLE: &str = "o Face_0
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3
o Face_1
v 0 0 1
v 1 0 1
v 1 1 1
v 0 1 1
f 5 6 7 8
";

    #[test]
    fn objects_keep_their_polygons() {
        let meshes = load_obj_meshes(QUAD_AND_TRIANGLE.as_bytes()).unwrap();
        assert_eq!(meshes.len(), 2);
        assert_eq!(meshes[0].name, "Face_0");
        assert_eq!(meshes[0].polygons, vec![vec![0, 1, 2]]);
        assert_eq!(meshes[1].polygons[0].len(), 4);
        assert!(meshes[0].uvs.is_none());
    }

    #[test]
    fn quads_are_rejected() {
        let meshes = load_obj_meshes(QUAD_AND_TRIANGLE.as_bytes()).unwrap();
        let err = geometry_from_mesh(&meshes[1], &SubmeshGeometry::default(), 1).unwrap_err();
        assert!(matches!(err, FmdlError::NonTriangularFace { submesh: 1, face: 0, arity: 4 }));
    }

    #[test]
    fn missing_attributes_come_from_nearest_template_vertex() {
        let template = SubmeshGeometry {
            positions: vec![[0.0, 0.0, 0.0], [10.0, 0.0, 0.0]],
            tangents: Some(vec![[1.0, 0.0, 0.0, 1.0], [0.0, 1.0, 0.0, 1.0]]),
            bone_ids: Some(vec![[1, 0, 0, 0], [2, 0, 0, 0]]),
            uv1: Some(vec![[0.1, 0.1], [0.9, 0.9]]),
            ..Default::default()
        };
        let mesh = ImportedMesh {
            name: "Face_0".to_string(),
            positions: vec![[9.0, 0.0, 0.0], [0.5, 0.0, 0.0], [8.0, 1.0, 0.0]],
            uvs: Some(vec![[0.0, 0.0]; 3]),
            polygons: vec![vec![0, 1, 2]],
            ..Default::default()
        };
        let geometry = geometry_from_mesh(&mesh, &template, 0).unwrap();
        assert_eq!(geometry.bone_ids, Some(vec![[2, 0, 0, 0], [1, 0, 0, 0], [2, 0, 0, 0]]));
        assert_eq!(geometry.uv1.unwrap()[1], [0.1, 0.1]);
        assert_eq!(geometry.uv0.unwrap().len(), 3);
        assert!(geometry.normals.is_none());
        assert!(geometry.colors.is_none());
        assert_eq!(geometry.triangles, vec![[0, 1, 2]]);
    }

    #[test]
    fn transferred_tangents_keep_file_axes() {
        let layout = vec![VertexUsage::Position, VertexUsage::Tangent];
        let stored: Vec<u8> = [0x38cc_u16, 0x3a66, 0x0000, 0x3c00]
            .iter()
            .flat_map(|h| h.to_le_bytes())
            .collect();
        let mut template = SubmeshGeometry {
            positions: vec![[0.0, 0.0, 0.0]],
            ..Default::default()
        };
        decode_attributes(&stored, 1, &layout, &mut template, None).unwrap();

        let mesh = ImportedMesh {
            name: "Face_0".to_string(),
            positions: vec![[0.1, 0.0, 0.0], [0.0, 0.1, 0.0], [0.0, 0.0, 0.1]],
            polygons: vec![vec![0, 1, 2]],
            ..Default::default()
        };
        let geometry = geometry_from_mesh(&mesh, &template, 0).unwrap();
        assert_eq!(geometry.tangent_axes, TangentAxes::File);

        let mut out = Vec::new();
        encode_attributes(&mut out, 0, &geometry, &layout, None).unwrap();
        assert_eq!(out, stored.repeat(3));
    }

    #[test]
    fn empty_obj_has_no_mesh_data() {
        assert!(matches!(load_obj_meshes(b"# nothing\n"), Err(FmdlError::NoMeshData)));
    }
}
