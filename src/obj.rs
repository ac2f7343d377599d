use std::collections::HashMap;

use anyhow::{anyhow, bail, Context, Result};
use glam::Vec3;

use crate::mesh::Mesh;

/// Parses a Wavefront OBJ model into an interleaved [`Mesh`].
///
/// Only geometry is read: `v`, `vn` and `f` records. Texture coordinates,
/// groups and materials are skipped. Polygons are fan triangulated and
/// vertices without normals get smooth normals computed from the faces.
pub fn load_obj_from_str(data: &str) -> Result<Mesh> {
    let mut reader = ObjReader::default();
    for (line_no, line) in data.lines().enumerate() {
        reader
            .read_line(line)
            .with_context(|| format!("invalid OBJ record on line {}", line_no + 1))?;
    }
    reader.finish()
}

#[derive(Debug, Clone, Copy)]
struct Corner {
    position: i64,
    normal: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VertexKey {
    position: usize,
    normal: Option<usize>,
}

#[derive(Default)]
struct ObjReader {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    triangles: Vec<[Corner; 3]>,
}

impl ObjReader {
    fn read_line(&mut self, line: &str) -> Result<()> {
        let line = line.split('#').next().unwrap_or_default().trim();
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => self.positions.push(parse_vec3(parts)?),
            Some("vn") => self.normals.push(parse_vec3(parts)?),
            Some("f") => {
                let polygon = parts.map(parse_corner).collect::<Result<Vec<_>>>()?;
                if polygon.len() < 3 {
                    bail!("faces must reference at least 3 vertices");
                }
                for i in 1..polygon.len() - 1 {
                    self.triangles.push([polygon[0], polygon[i], polygon[i + 1]]);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> Result<Mesh> {
        if self.positions.is_empty() {
            bail!("OBJ data does not define any vertices");
        }

        let mut mesh = Mesh::default();
        let mut lookup: HashMap<VertexKey, u32> = HashMap::new();
        let mut missing_normals = false;

        for corner in self.triangles.iter().flatten() {
            let position = resolve_index(corner.position, self.positions.len())
                .ok_or_else(|| anyhow!("vertex index {} is out of range", corner.position))?;
            let normal = match corner.normal {
                Some(index) => Some(
                    resolve_index(index, self.normals.len())
                        .ok_or_else(|| anyhow!("normal index {index} is out of range"))?,
                ),
                None => None,
            };
            missing_normals |= normal.is_none();
            let key = VertexKey { position, normal };
            let index = *lookup.entry(key).or_insert_with(|| {
                mesh.push_vertex(
                    self.positions[position],
                    normal.map(|i| self.normals[i]).unwrap_or(Vec3::ZERO),
                )
            });
            mesh.indices.push(index);
        }

        if missing_normals {
            compute_normals(&mut mesh);
        }
        Ok(mesh)
    }
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3> {
    let mut component = || -> Result<f32> {
        parts
            .next()
            .ok_or_else(|| anyhow!("missing vector component"))?
            .parse::<f32>()
            .context("vector component is not a number")
    };
    Ok(Vec3::new(component()?, component()?, component()?))
}

/// Reads `v`, `v/vt`, `v//vn` or `v/vt/vn`.
fn parse_corner(token: &str) -> Result<Corner> {
    let mut fields = token.split('/');
    let position = fields
        .next()
        .filter(|field| !field.is_empty())
        .ok_or_else(|| anyhow!("missing vertex index in {token:?}"))?
        .parse::<i64>()
        .with_context(|| format!("bad vertex index in {token:?}"))?;
    let _texcoord = fields.next();
    let normal = match fields.next().filter(|field| !field.is_empty()) {
        Some(field) => Some(
            field
                .parse::<i64>()
                .with_context(|| format!("bad normal index in {token:?}"))?,
        ),
        None => None,
    };
    Ok(Corner { position, normal })
}

/// Converts a one-based (or negative, relative) OBJ index to zero-based.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = if index > 0 {
        index - 1
    } else if index < 0 {
        len + index
    } else {
        return None;
    };
    (0..len).contains(&resolved).then_some(resolved as usize)
}

fn compute_normals(mesh: &mut Mesh) {
    let mut accum = vec![Vec3::ZERO; mesh.vertex_count()];

    for triangle in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        let (p0, p1, p2) = (mesh.position(a), mesh.position(b), mesh.position(c));
        let normal = (p1 - p0).cross(p2 - p0);
        if normal.length_squared() > f32::EPSILON * f32::EPSILON {
            let normal = normal.normalize();
            accum[a] += normal;
            accum[b] += normal;
            accum[c] += normal;
        }
    }

    for (chunk, normal) in mesh.vertices.chunks_exact_mut(Mesh::STRIDE).zip(accum) {
        if chunk[3..6].iter().all(|value| *value == 0.0) {
            chunk[3..6].copy_from_slice(&normal.normalize_or_zero().to_array());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_triangle() {
        let mesh = load_obj_from_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn computes_missing_normals() {
        let mesh = load_obj_from_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        for chunk in mesh.vertices.chunks_exact(Mesh::STRIDE) {
            assert_eq!(Vec3::new(chunk[3], chunk[4], chunk[5]), Vec3::Z);
        }
    }

    #[test]
    fn keeps_explicit_normals_and_skips_texcoords() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 -1\nf 1/1/1 2/1/1 3/1/1\n";
        let mesh = load_obj_from_str(obj).unwrap();
        assert_eq!(&mesh.vertices[3..6], &[0.0, 0.0, -1.0]);
    }

    #[test]
    fn triangulates_quads_and_negative_indices() {
        let obj = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf -4 -3 -2 -1\n";
        let mesh = load_obj_from_str(obj).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        assert!(load_obj_from_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n").is_err());
    }

    #[test]
    fn empty_model_is_an_error() {
        assert!(load_obj_from_str("# nothing here\n").is_err());
    }

    #[test]
    fn bundled_heart_loads() {
        let mut mesh = load_obj_from_str(include_str!("../assets/heart.obj")).unwrap();
        assert!(!mesh.is_empty());
        mesh.fit_to_unit();
        let (min, max) = mesh.bounds().unwrap();
        assert!(((max - min).max_element() - 1.0).abs() < 1e-5);
    }
}
