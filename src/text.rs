use glam::{Vec2, Vec3};
use log::warn;
use lyon_path::iterator::PathIterator;
use lyon_path::{Path, PathEvent};
use lyon_tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, TessellationError,
    VertexBuffers,
};

use crate::font::Font;
use crate::mesh::Mesh;
use crate::pages::Page;

/// How glyph outlines are turned into geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Glyph height in scene units.
    pub size: f32,
    /// Thickness of the extruded lettering, standing out from its parent
    /// plane along +Z.
    pub depth: f32,
    /// Maximum distance between a curve and its flattened approximation.
    pub tolerance: f32,
}

impl TextStyle {
    pub const LINE: Self = Self {
        size: 0.14,
        depth: 0.01,
        tolerance: 0.0005,
    };

    pub const FOOTER: Self = Self {
        size: 0.07,
        depth: 0.01,
        tolerance: 0.0005,
    };
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::LINE
    }
}

/// Where the lines of a page go on a card face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    /// Baseline of the first line.
    pub top: f32,
    pub footer_y: f32,
    pub line: TextStyle,
    pub footer: TextStyle,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            top: -0.05,
            footer_y: -0.62,
            line: TextStyle::LINE,
            footer: TextStyle::FOOTER,
        }
    }
}

/// A laid out piece of text, positioned relative to its card face.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMesh {
    pub text: String,
    pub position: Vec3,
    pub mesh: Mesh,
}

/// Builds a single line of solid lettering, centered horizontally on x = 0
/// with its baseline on y = 0. Glyphs are filled and extruded from z = 0 to
/// z = `style.depth`.
pub fn build_text_mesh(font: &Font, text: &str, style: &TextStyle) -> Mesh {
    let mut builder = Path::builder();
    let mut cursor = 0.0;
    for ch in text.chars() {
        match font.outline_glyph(ch, style.size, Vec2::new(cursor, 0.0), &mut builder) {
            Some(advance) => cursor += advance,
            None => warn!("font {:?} has no glyph for {ch:?}", font.family()),
        }
    }
    let path = builder.build();

    let mut mesh = match extrude(&path, style) {
        Ok(mesh) => mesh,
        Err(err) => {
            warn!("unable to tessellate {text:?}: {err:?}");
            return Mesh::default();
        }
    };
    if let Some((min, max)) = mesh.bounds() {
        mesh.translate(Vec3::new(-(min.x + max.x) * 0.5, 0.0, 0.0));
    }
    mesh
}

/// Lays out every line and the footer of `page`, top to bottom.
pub fn layout_page(font: &Font, page: &Page, layout: &PageLayout) -> Vec<TextMesh> {
    let spacing = font.line_height(layout.line.size);
    let lines = page.lines.iter().enumerate().map(|(index, line)| {
        let y = layout.top - index as f32 * spacing;
        (line, y, &layout.line)
    });
    let footer = page
        .footer
        .iter()
        .map(|footer| (footer, layout.footer_y, &layout.footer));

    lines
        .chain(footer)
        .filter_map(|(text, y, style)| {
            let mesh = build_text_mesh(font, text, style);
            if mesh.is_empty() {
                warn!("text {text:?} produced no geometry");
                return None;
            }
            Some(TextMesh {
                text: text.clone(),
                position: Vec3::new(0.0, y, 0.0),
                mesh,
            })
        })
        .collect()
}

/// Fills `path` into a front cap at `depth` and a back cap at zero, then
/// joins the two with walls along every flattened edge.
fn extrude(path: &Path, style: &TextStyle) -> Result<Mesh, TessellationError> {
    let mut fill: VertexBuffers<Vec2, u32> = VertexBuffers::new();
    FillTessellator::new().tessellate_path(
        path,
        &FillOptions::tolerance(style.tolerance).with_fill_rule(FillRule::NonZero),
        &mut BuffersBuilder::new(&mut fill, |vertex: FillVertex| {
            Vec2::new(vertex.position().x, vertex.position().y)
        }),
    )?;

    let mut mesh = Mesh::default();
    for vertex in &fill.vertices {
        mesh.push_vertex(vertex.extend(style.depth), Vec3::Z);
    }
    mesh.indices.extend_from_slice(&fill.indices);

    let back = mesh.vertex_count() as u32;
    for vertex in &fill.vertices {
        mesh.push_vertex(vertex.extend(0.0), Vec3::NEG_Z);
    }
    mesh.indices.extend(
        fill.indices
            .chunks_exact(3)
            .flat_map(|tri| [back + tri[0], back + tri[2], back + tri[1]]),
    );

    for event in path.iter().flattened(style.tolerance) {
        if let PathEvent::Line { from, to }
        | PathEvent::End {
            last: from,
            first: to,
            close: true,
        } = event
        {
            push_wall(
                &mut mesh,
                Vec2::new(from.x, from.y),
                Vec2::new(to.x, to.y),
                style.depth,
            );
        }
    }
    Ok(mesh)
}

/// One side wall between the caps, facing away from the filled area of a
/// counter-clockwise contour.
fn push_wall(mesh: &mut Mesh, from: Vec2, to: Vec2, depth: f32) {
    let Some(dir) = (to - from).try_normalize() else {
        return;
    };
    mesh.push_quad(
        [
            from.extend(0.0),
            to.extend(0.0),
            to.extend(depth),
            from.extend(depth),
        ],
        Vec3::new(dir.y, -dir.x, 0.0),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::tests::test_font;

    fn cap(mesh: &Mesh, z: f32) -> Vec<[Vec3; 3]> {
        mesh.indices
            .chunks_exact(3)
            .map(|tri| [0, 1, 2].map(|i| mesh.position(tri[i] as usize)))
            .filter(|tri| tri.iter().all(|p| p.z == z))
            .collect()
    }

    fn covers(triangle: &[Vec3; 3], p: Vec2) -> bool {
        let [a, b, c] = triangle.map(|v| v.truncate());
        let side = |u: Vec2, v: Vec2| (v - u).perp_dot(p - u);
        let (d1, d2, d3) = (side(a, b), side(b, c), side(c, a));
        let negative = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
        let positive = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
        !(negative && positive)
    }

    #[test]
    fn glyph_interior_is_filled_on_both_caps() {
        let style = TextStyle::LINE;
        let mesh = build_text_mesh(&test_font(), "A", &style);
        // The square glyph spans 0.8 of the size and is centered on x.
        let center = Vec2::new(0.0, 0.4 * style.size);
        for z in [style.depth, 0.0] {
            let triangles = cap(&mesh, z);
            assert!(!triangles.is_empty());
            assert!(triangles.iter().any(|tri| covers(tri, center)));
        }
    }

    #[test]
    fn lettering_spans_two_planes() {
        let style = TextStyle::LINE;
        let mesh = build_text_mesh(&test_font(), "Hi", &style);
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min.z, 0.0);
        assert_eq!(max.z, style.depth);
        for chunk in mesh.vertices.chunks_exact(Mesh::STRIDE) {
            assert!(chunk[2] == 0.0 || chunk[2] == style.depth);
        }
    }

    #[test]
    fn walls_face_outward() {
        let mesh = build_text_mesh(&test_font(), "A", &TextStyle::LINE);
        let normals: Vec<Vec3> = mesh
            .vertices
            .chunks_exact(Mesh::STRIDE)
            .map(|chunk| Vec3::from_slice(&chunk[3..6]))
            .collect();
        for expected in [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z] {
            assert!(
                normals.iter().any(|n| (*n - expected).length() < 1e-6),
                "no face with normal {expected:?}"
            );
        }
    }

    #[test]
    fn text_is_centered_horizontally() {
        let mesh = build_text_mesh(&test_font(), "Hello", &TextStyle::LINE);
        let (min, max) = mesh.bounds().unwrap();
        assert!((min.x + max.x).abs() < 1e-5);
    }

    #[test]
    fn wider_text_gives_wider_mesh() {
        let font = test_font();
        let width = |text: &str| {
            let (min, max) = build_text_mesh(&font, text, &TextStyle::LINE)
                .bounds()
                .unwrap();
            max.x - min.x
        };
        assert!(width("ABCD") > width("AB"));
    }

    #[test]
    fn missing_glyphs_are_skipped() {
        let font = test_font();
        let with_unknown = build_text_mesh(&font, "A~", &TextStyle::LINE);
        let plain = build_text_mesh(&font, "A", &TextStyle::LINE);
        assert_eq!(with_unknown, plain);
        assert!(build_text_mesh(&font, "~~", &TextStyle::LINE).is_empty());
    }

    #[test]
    fn page_lines_stack_downward_with_footer_last() {
        let font = test_font();
        let page = Page {
            lines: vec!["Roses".into(), "are red".into()],
            footer: Some("Touch to open".into()),
        };
        let layout = PageLayout::default();
        let meshes = layout_page(&font, &page, &layout);
        assert_eq!(meshes.len(), 3);
        assert_eq!(meshes[0].text, "Roses");
        assert_eq!(meshes[0].position.y, layout.top);
        assert!(meshes[1].position.y < meshes[0].position.y);
        assert_eq!(meshes[2].text, "Touch to open");
        assert_eq!(meshes[2].position.y, layout.footer_y);
    }

    #[test]
    fn page_without_footer_has_only_lines() {
        let page = Page {
            lines: vec!["The end".into()],
            footer: None,
        };
        let meshes = layout_page(&test_font(), &page, &PageLayout::default());
        assert_eq!(meshes.len(), 1);
    }
}
