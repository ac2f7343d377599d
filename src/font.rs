//! Typeface fonts: glyph outlines stored as JSON, one command string per
//! glyph.
//!
//! Outline commands are whitespace separated:
//!
//! * `m x y` starts a new contour
//! * `l x y` draws a line
//! * `q x y cx cy` draws a quadratic curve, end point first
//! * `b x y c1x c1y c2x c2y` draws a cubic curve, end point first
//!
//! Outlines are traced into `lyon_path` builders; filling and extrusion
//! happen in [`crate::text`].

use std::collections::HashMap;

use glam::Vec2;
use lyon_path::math::point;
use lyon_path::path::Builder;
use serde::Deserialize;

use crate::error::CardError;

/// Parsed font with outlines kept in font units.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    family: String,
    resolution: f32,
    y_min: f32,
    y_max: f32,
    underline_thickness: f32,
    glyphs: HashMap<char, Glyph>,
}

#[derive(Debug, Clone, PartialEq)]
struct Glyph {
    advance: f32,
    commands: Vec<PathCommand>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PathCommand {
    MoveTo(Vec2),
    LineTo(Vec2),
    QuadTo { ctrl: Vec2, to: Vec2 },
    CubicTo { ctrl1: Vec2, ctrl2: Vec2, to: Vec2 },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFont {
    glyphs: HashMap<String, RawGlyph>,
    #[serde(default)]
    family_name: String,
    resolution: f32,
    bounding_box: RawBounds,
    #[serde(default)]
    underline_thickness: f32,
}

#[derive(Deserialize)]
struct RawGlyph {
    ha: f32,
    #[serde(default)]
    o: Option<String>,
}

#[derive(Deserialize)]
struct RawBounds {
    #[serde(rename = "yMin")]
    y_min: f32,
    #[serde(rename = "yMax")]
    y_max: f32,
}

impl Font {
    pub fn from_json(json: &str) -> Result<Self, CardError> {
        let raw: RawFont = serde_json::from_str(json)?;
        if !(raw.resolution > 0.0) {
            return Err(CardError::FontResolution(raw.resolution));
        }

        let mut glyphs = HashMap::with_capacity(raw.glyphs.len());
        for (key, glyph) in raw.glyphs {
            let mut chars = key.chars();
            let (Some(ch), None) = (chars.next(), chars.next()) else {
                continue;
            };
            let commands = match glyph.o.as_deref() {
                Some(outline) => parse_outline(outline).map_err(|message| {
                    CardError::Outline {
                        glyph: ch,
                        message,
                    }
                })?,
                None => Vec::new(),
            };
            glyphs.insert(
                ch,
                Glyph {
                    advance: glyph.ha,
                    commands,
                },
            );
        }

        Ok(Self {
            family: raw.family_name,
            resolution: raw.resolution,
            y_min: raw.bounding_box.y_min,
            y_max: raw.bounding_box.y_max,
            underline_thickness: raw.underline_thickness,
            glyphs,
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Distance between baselines for text of the given size.
    pub fn line_height(&self, size: f32) -> f32 {
        (self.y_max - self.y_min + self.underline_thickness) * self.scale(size)
    }

    /// Traces the outline of `ch` at `size` into `builder`, with the glyph
    /// origin at `origin`. Every contour is closed. Returns the advance, or
    /// `None` when the font has no such glyph.
    pub fn outline_glyph(
        &self,
        ch: char,
        size: f32,
        origin: Vec2,
        builder: &mut Builder,
    ) -> Option<f32> {
        let glyph = self.glyphs.get(&ch)?;
        let scale = self.scale(size);
        let at = |p: Vec2| {
            let p = origin + p * scale;
            point(p.x, p.y)
        };

        let mut open = false;
        for command in &glyph.commands {
            match *command {
                PathCommand::MoveTo(to) => {
                    if open {
                        builder.end(true);
                    }
                    builder.begin(at(to));
                    open = true;
                }
                PathCommand::LineTo(to) => {
                    builder.line_to(at(to));
                }
                PathCommand::QuadTo { ctrl, to } => {
                    builder.quadratic_bezier_to(at(ctrl), at(to));
                }
                PathCommand::CubicTo { ctrl1, ctrl2, to } => {
                    builder.cubic_bezier_to(at(ctrl1), at(ctrl2), at(to));
                }
            }
        }
        if open {
            builder.end(true);
        }

        Some(glyph.advance * scale)
    }

    fn scale(&self, size: f32) -> f32 {
        size / self.resolution
    }
}

fn parse_outline(outline: &str) -> Result<Vec<PathCommand>, String> {
    let mut tokens = outline.split_whitespace();
    let mut commands = Vec::new();
    let mut started = false;

    while let Some(op) = tokens.next() {
        let mut point = || -> Result<Vec2, String> {
            let mut number = || -> Result<f32, String> {
                let token = tokens
                    .next()
                    .ok_or_else(|| format!("command {op:?} is missing coordinates"))?;
                token
                    .parse::<f32>()
                    .map_err(|_| format!("{token:?} is not a number"))
            };
            Ok(Vec2::new(number()?, number()?))
        };
        let command = match op {
            "m" => PathCommand::MoveTo(point()?),
            "l" => PathCommand::LineTo(point()?),
            "q" => {
                let to = point()?;
                let ctrl = point()?;
                PathCommand::QuadTo { ctrl, to }
            }
            "b" => {
                let to = point()?;
                let ctrl1 = point()?;
                let ctrl2 = point()?;
                PathCommand::CubicTo { ctrl1, ctrl2, to }
            }
            // Some exporters emit an explicit close; contours close anyway.
            "z" => continue,
            other => return Err(format!("unknown command {other:?}")),
        };
        if !started && !matches!(command, PathCommand::MoveTo(_)) {
            return Err("outline must start with a move".to_string());
        }
        started = true;
        commands.push(command);
    }

    Ok(commands)
}
