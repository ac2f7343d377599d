use glam::Vec3;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Stable handle to a mesh held by a [`MeshStore`].
    pub struct MeshHandle;
}

/// Interleaved triangle mesh, laid out as `position.xyz` followed by
/// `normal.xyz` per vertex.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Floats per vertex.
    pub const STRIDE: usize = 6;

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / Self::STRIDE
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn position(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.vertices[index * Self::STRIDE..index * Self::STRIDE + 3])
    }

    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.vertex_count() as u32;
        self.vertices.extend_from_slice(&position.to_array());
        self.vertices.extend_from_slice(&normal.to_array());
        index
    }

    /// Adds a flat quad from four corners in winding order.
    pub fn push_quad(&mut self, corners: [Vec3; 4], normal: Vec3) {
        let base = self.vertex_count() as u32;
        for corner in corners {
            self.push_vertex(corner, normal);
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Axis-aligned bounds, or `None` for a mesh with no vertices.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        (0..self.vertex_count())
            .map(|i| self.position(i))
            .fold(None, |acc, p| match acc {
                None => Some((p, p)),
                Some((min, max)) => Some((min.min(p), max.max(p))),
            })
    }

    pub fn translate(&mut self, offset: Vec3) {
        for chunk in self.vertices.chunks_exact_mut(Self::STRIDE) {
            chunk[0] += offset.x;
            chunk[1] += offset.y;
            chunk[2] += offset.z;
        }
    }

    /// Recenters the mesh on the origin and scales it uniformly so its
    /// largest extent is one unit.
    pub fn fit_to_unit(&mut self) {
        let Some((min, max)) = self.bounds() else {
            return;
        };
        let center = (min + max) * 0.5;
        let extent = (max - min).max_element();
        let scale = if extent > f32::EPSILON { 1.0 / extent } else { 1.0 };
        for chunk in self.vertices.chunks_exact_mut(Self::STRIDE) {
            chunk[0] = (chunk[0] - center.x) * scale;
            chunk[1] = (chunk[1] - center.y) * scale;
            chunk[2] = (chunk[2] - center.z) * scale;
        }
    }

    /// Unit cube centered on the origin, used for the card body.
    pub fn unit_box() -> Self {
        Self {
            vertices: UNIT_BOX_VERTICES.to_vec(),
            indices: UNIT_BOX_INDICES.to_vec(),
        }
    }
}

/// Arena owning every mesh the card scene references.
#[derive(Debug, Default)]
pub struct MeshStore {
    meshes: SlotMap<MeshHandle, Mesh>,
}

impl MeshStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mesh: Mesh) -> MeshHandle {
        self.meshes.insert(mesh)
    }

    pub fn remove(&mut self, handle: MeshHandle) -> Option<Mesh> {
        self.meshes.remove(handle)
    }

    pub fn contains(&self, handle: MeshHandle) -> bool {
        self.meshes.contains_key(handle)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeshHandle, &Mesh)> {
        self.meshes.iter()
    }
}

const UNIT_BOX_VERTICES: &[f32] = &[
    // positions        // normals
    -0.5, -0.5, 0.5, 0.0, 0.0, 1.0, 0.5, -0.5, 0.5, 0.0, 0.0, 1.0, 0.5, 0.5, 0.5, 0.0, 0.0, 1.0,
    -0.5, 0.5, 0.5, 0.0, 0.0, 1.0, -0.5, -0.5, -0.5, 0.0, 0.0, -1.0, 0.5, -0.5, -0.5, 0.0, 0.0,
    -1.0, 0.5, 0.5, -0.5, 0.0, 0.0, -1.0, -0.5, 0.5, -0.5, 0.0, 0.0, -1.0, -0.5, -0.5, -0.5, -1.0,
    0.0, 0.0, -0.5, -0.5, 0.5, -1.0, 0.0, 0.0, -0.5, 0.5, 0.5, -1.0, 0.0, 0.0, -0.5, 0.5, -0.5,
    -1.0, 0.0, 0.0, 0.5, -0.5, -0.5, 1.0, 0.0, 0.0, 0.5, -0.5, 0.5, 1.0, 0.0, 0.0, 0.5, 0.5, 0.5,
    1.0, 0.0, 0.0, 0.5, 0.5, -0.5, 1.0, 0.0, 0.0, -0.5, -0.5, -0.5, 0.0, -1.0, 0.0, 0.5, -0.5,
    -0.5, 0.0, -1.0, 0.0, 0.5, -0.5, 0.5, 0.0, -1.0, 0.0, -0.5, -0.5, 0.5, 0.0, -1.0, 0.0, -0.5,
    0.5, -0.5, 0.0, 1.0, 0.0, 0.5, 0.5, -0.5, 0.0, 1.0, 0.0, 0.5, 0.5, 0.5, 0.0, 1.0, 0.0, -0.5,
    0.5, 0.5, 0.0, 1.0, 0.0,
];

const UNIT_BOX_INDICES: &[u32] = &[
    0, 1, 2, 0, 2, 3, // front
    4, 6, 5, 4, 7, 6, // back
    8, 9, 10, 8, 10, 11, // left
    12, 14, 13, 12, 15, 14, // right
    16, 18, 17, 16, 19, 18, // bottom
    20, 21, 22, 20, 22, 23, // top
];
