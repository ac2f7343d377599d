use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::mesh::MeshHandle;

/// Local placement of a node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.translation)
    }
}

/// One draw call worth of state, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub mesh: MeshHandle,
    pub model: Mat4,
    pub color: Vec3,
}

/// Node of the card's scene tree. Children are addressed by name.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<MeshHandle>,
    pub color: Vec3,
    children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            mesh: None,
            color: Vec3::ONE,
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_mesh(mut self, mesh: MeshHandle, color: Vec3) -> Self {
        self.mesh = Some(mesh);
        self.color = color;
        self
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[SceneNode] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&SceneNode> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        self.children.iter_mut().find(|child| child.name == name)
    }

    /// Detaches every child and hands them back to the caller.
    pub fn clear_children(&mut self) -> Vec<SceneNode> {
        std::mem::take(&mut self.children)
    }

    /// Mesh handles referenced by this node and all of its descendants.
    pub fn mesh_handles(&self) -> Vec<MeshHandle> {
        let mut handles = Vec::new();
        self.visit(&mut |node| handles.extend(node.mesh));
        handles
    }

    /// Flattens the tree into world-space draw items.
    pub fn flatten(&self) -> Vec<DrawItem> {
        let mut items = Vec::new();
        self.flatten_into(Mat4::IDENTITY, &mut items);
        items
    }

    fn flatten_into(&self, parent: Mat4, items: &mut Vec<DrawItem>) {
        let world = parent * self.transform.matrix();
        if let Some(mesh) = self.mesh {
            items.push(DrawItem {
                mesh,
                model: world,
                color: self.color,
            });
        }
        for child in &self.children {
            child.flatten_into(world, items);
        }
    }

    fn visit(&self, f: &mut impl FnMut(&SceneNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}
