use std::f32::consts::PI;

use glam::Vec3;
use log::debug;

use crate::flip::{Face, FlipPhase};
use crate::font::Font;
use crate::mesh::{Mesh, MeshHandle, MeshStore};
use crate::pages::PageBook;
use crate::scene::{DrawItem, SceneNode, Transform};
use crate::text::{layout_page, PageLayout};

const PIVOT_NODE: &str = "pivot";
const BODY_NODE: &str = "body";
const HEART_NODE: &str = "heart";

fn face_node(face: Face) -> &'static str {
    match face {
        Face::Front => "front",
        Face::Back => "back",
    }
}

/// Card dimensions, colors and text placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardLayout {
    pub page: PageLayout,
    pub body_size: Vec3,
    pub body_color: Vec3,
    pub text_color: Vec3,
    /// Distance of each face's text plane from the card's center plane.
    pub face_offset: f32,
    pub heart_offset: Vec3,
    /// Size of the heart's largest extent.
    pub heart_scale: f32,
    pub heart_color: Vec3,
}

impl Default for CardLayout {
    fn default() -> Self {
        Self {
            page: PageLayout::default(),
            body_size: Vec3::new(2.4, 1.8, 0.04),
            body_color: Vec3::new(0.98, 0.93, 0.9),
            text_color: Vec3::new(0.55, 0.05, 0.15),
            face_offset: 0.021,
            heart_offset: Vec3::new(0.0, 0.45, 0.0),
            heart_scale: 0.6,
            heart_color: Vec3::new(0.85, 0.08, 0.2),
        }
    }
}

/// Result of a tap on the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// No font has been loaded, so there is no text to flip to.
    NotReady,
    /// A flip is already running.
    Ignored,
    /// The hidden face now shows `page` and the card started turning.
    Flipped { page: usize, face: Face },
}

/// Owns everything the greeting card needs between frames.
pub struct CardState {
    book: PageBook,
    page_index: usize,
    phase: FlipPhase,
    font: Option<Font>,
    layout: CardLayout,
    meshes: MeshStore,
    pivot: SceneNode,
}

impl CardState {
    /// Builds the card scene. Page 0 goes on the front face right away when
    /// a font is available.
    pub fn new(
        book: PageBook,
        font: Option<Font>,
        heart: Option<Mesh>,
        layout: CardLayout,
    ) -> Self {
        let mut meshes = MeshStore::new();
        let mut pivot = SceneNode::new(PIVOT_NODE);

        let body = meshes.insert(Mesh::unit_box());
        pivot.add_child(
            SceneNode::new(BODY_NODE)
                .with_transform(Transform {
                    scale: layout.body_size,
                    ..Transform::default()
                })
                .with_mesh(body, layout.body_color),
        );

        if let Some(mut heart) = heart {
            heart.fit_to_unit();
            let handle = meshes.insert(heart);
            pivot.add_child(
                SceneNode::new(HEART_NODE)
                    .with_transform(Transform {
                        translation: layout.heart_offset,
                        scale: Vec3::splat(layout.heart_scale),
                        ..Transform::default()
                    })
                    .with_mesh(handle, layout.heart_color),
            );
        }

        pivot.add_child(
            SceneNode::new(face_node(Face::Front))
                .with_transform(Transform::from_translation(Vec3::Z * layout.face_offset)),
        );
        pivot.add_child(SceneNode::new(face_node(Face::Back)).with_transform(Transform {
            translation: Vec3::NEG_Z * layout.face_offset,
            rotation: Vec3::new(0.0, PI, 0.0),
            ..Transform::default()
        }));

        let mut card = Self {
            book,
            page_index: 0,
            phase: FlipPhase::new(),
            font,
            layout,
            meshes,
            pivot,
        };
        card.populate(Face::Front, 0);
        card
    }

    /// Whether taps can do anything yet.
    pub fn is_ready(&self) -> bool {
        self.font.is_some()
    }

    pub fn has_heart(&self) -> bool {
        self.pivot.child(HEART_NODE).is_some()
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn book(&self) -> &PageBook {
        &self.book
    }

    pub fn phase(&self) -> FlipPhase {
        self.phase
    }

    pub fn visible_face(&self) -> Face {
        self.phase.visible_face()
    }

    pub fn scene(&self) -> &SceneNode {
        &self.pivot
    }

    pub fn meshes(&self) -> &MeshStore {
        &self.meshes
    }

    /// Handles of the text meshes currently on `face`.
    pub fn face_meshes(&self, face: Face) -> Vec<MeshHandle> {
        self.pivot
            .child(face_node(face))
            .map(SceneNode::mesh_handles)
            .unwrap_or_default()
    }

    /// Text shown on `face`, top to bottom.
    pub fn face_text(&self, face: Face) -> Vec<&str> {
        self.pivot
            .child(face_node(face))
            .map(|node| {
                node.children()
                    .iter()
                    .map(|child| child.name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// World-space draw list for the current frame.
    pub fn draw_list(&self) -> Vec<DrawItem> {
        self.pivot.flatten()
    }

    /// Writes the next page onto the face turned away from the viewer and
    /// starts turning the card.
    pub fn tap(&mut self) -> TapOutcome {
        if self.font.is_none() {
            return TapOutcome::NotReady;
        }
        if self.phase.is_flipping() {
            return TapOutcome::Ignored;
        }

        let face = self.phase.hidden_face();
        self.page_index = self.book.next_index(self.page_index);
        self.populate(face, self.page_index);
        self.phase.begin();
        debug!(
            "flipping to page {} on the {} face",
            self.page_index,
            face.label()
        );
        TapOutcome::Flipped {
            page: self.page_index,
            face,
        }
    }

    /// Advances the flip by `dt` seconds. Returns `true` on the frame the
    /// card lands.
    pub fn update(&mut self, dt: f32) -> bool {
        let landed = self.phase.advance(dt);
        self.pivot.transform.rotation.y = self.phase.angle();
        if landed {
            debug!(
                "flip finished with the {} face showing",
                self.visible_face().label()
            );
        }
        landed
    }

    /// Replaces whatever `face` shows with the text of page `index`.
    fn populate(&mut self, face: Face, index: usize) {
        let Some(node) = self.pivot.child_mut(face_node(face)) else {
            return;
        };
        for child in node.clear_children() {
            for handle in child.mesh_handles() {
                self.meshes.remove(handle);
            }
        }

        let (Some(font), Some(page)) = (self.font.as_ref(), self.book.get(index)) else {
            return;
        };
        for text in layout_page(font, page, &self.layout.page) {
            let handle = self.meshes.insert(text.mesh);
            node.add_child(
                SceneNode::new(text.text)
                    .with_transform(Transform::from_translation(text.position))
                    .with_mesh(handle, self.layout.text_color),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::tests::test_font;
    use crate::pages::Page;

    const DT: f32 = 1.0 / 60.0;

    fn three_pages() -> PageBook {
        PageBook::new(vec![
            Page {
                lines: vec!["Zero".into()],
                footer: Some("Touch to open".into()),
            },
            Page {
                lines: vec!["One".into(), "and a half".into()],
                footer: Some("Touch to continue".into()),
            },
            Page {
                lines: vec!["Two".into()],
                footer: None,
            },
        ])
        .unwrap()
    }

    fn ready_card() -> CardState {
        CardState::new(
            three_pages(),
            Some(test_font()),
            None,
            CardLayout::default(),
        )
    }

    fn finish_flip(card: &mut CardState) {
        while !card.update(DT) {}
    }

    #[test]
    fn front_shows_first_page_at_load() {
        let card = ready_card();
        assert_eq!(card.page_index(), 0);
        assert_eq!(card.visible_face(), Face::Front);
        assert_eq!(card.face_text(Face::Front), vec!["Zero", "Touch to open"]);
        assert!(card.face_text(Face::Back).is_empty());
    }

    #[test]
    fn tap_while_idle_advances_exactly_once() {
        let mut card = ready_card();
        assert_eq!(
            card.tap(),
            TapOutcome::Flipped {
                page: 1,
                face: Face::Back
            }
        );
        assert_eq!(card.page_index(), 1);
        assert!(card.phase().is_flipping());
    }

    #[test]
    fn tap_while_flipping_changes_nothing() {
        let mut card = ready_card();
        card.tap();
        card.update(DT);
        let phase = card.phase();
        let back = card.face_meshes(Face::Back);
        assert_eq!(card.tap(), TapOutcome::Ignored);
        assert_eq!(card.page_index(), 1);
        assert_eq!(card.phase(), phase);
        assert_eq!(card.face_meshes(Face::Back), back);
    }

    #[test]
    fn three_page_scenario_wraps_and_swaps_faces() {
        let mut card = ready_card();
        let first_front = card.face_meshes(Face::Front);

        card.tap();
        assert_eq!(
            card.face_text(Face::Back),
            vec!["One", "and a half", "Touch to continue"]
        );
        assert_eq!(card.face_meshes(Face::Front), first_front);
        finish_flip(&mut card);
        assert_eq!(card.page_index(), 1);
        assert_eq!(card.visible_face(), Face::Back);
        assert_eq!(card.phase(), FlipPhase::Idle { angle: PI });

        card.tap();
        assert_eq!(card.face_text(Face::Front), vec!["Two"]);
        for handle in &first_front {
            assert!(!card.meshes().contains(*handle));
        }
        finish_flip(&mut card);
        assert_eq!(card.page_index(), 2);
        assert_eq!(card.visible_face(), Face::Front);
        assert_eq!(card.phase(), FlipPhase::Idle { angle: 0.0 });

        card.tap();
        assert_eq!(card.face_text(Face::Back), vec!["Zero", "Touch to open"]);
        finish_flip(&mut card);
        assert_eq!(card.page_index(), 0);
        assert_eq!(card.visible_face(), Face::Back);
    }

    #[test]
    fn replaced_text_is_dropped_from_the_store() {
        let mut card = ready_card();
        for _ in 0..10 {
            card.tap();
            finish_flip(&mut card);
        }
        let visible = card.face_meshes(card.visible_face()).len();
        let hidden = card.face_meshes(card.visible_face().opposite()).len();
        // Body plus whatever the two faces show right now.
        assert_eq!(card.meshes().len(), 1 + visible + hidden);
    }

    #[test]
    fn pivot_rotation_follows_the_flip() {
        let mut card = ready_card();
        card.tap();
        card.update(0.5);
        assert!((card.scene().transform.rotation.y - 1.5).abs() < 1e-6);
        finish_flip(&mut card);
        assert_eq!(card.scene().transform.rotation.y, PI);
    }

    #[test]
    fn taps_without_a_font_are_not_ready() {
        let mut card = CardState::new(three_pages(), None, None, CardLayout::default());
        assert!(!card.is_ready());
        assert_eq!(card.tap(), TapOutcome::NotReady);
        assert_eq!(card.page_index(), 0);
        assert!(!card.phase().is_flipping());
        assert!(card.face_meshes(Face::Front).is_empty());
    }

    #[test]
    fn heart_is_added_when_loaded() {
        let heart = crate::obj::load_obj_from_str(include_str!("../assets/heart.obj"));
        let card = CardState::new(
            three_pages(),
            Some(test_font()),
            heart.ok(),
            CardLayout::default(),
        );
        assert!(card.has_heart());
        // Body, heart, and the two text meshes of page 0.
        assert_eq!(card.draw_list().len(), 4);
    }

    #[test]
    fn draw_list_puts_back_text_behind_the_card() {
        let mut card = ready_card();
        card.tap();
        let back: Vec<_> = card.face_meshes(Face::Back);
        let items = card.draw_list();
        let item = items.iter().find(|item| item.mesh == back[0]).unwrap();
        let origin = item.model.transform_point3(Vec3::ZERO);
        assert!(origin.z < 0.0);
    }
}
