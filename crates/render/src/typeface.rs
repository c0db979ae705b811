//! Typeface descriptions in the JSON outline format used by web 3D engines.
//!
//! A typeface maps characters to glyph outlines expressed in font units. The
//! outline string is a flat sequence of drawing commands:
//!
//! - `m x y` move to
//! - `l x y` line to
//! - `q x y cx cy` quadratic curve to `(x, y)` with control `(cx, cy)`
//! - `b x y c1x c1y c2x c2y` cubic curve to `(x, y)` with controls `c1`, `c2`

use glam::Vec2;
use serde::Deserialize;
use std::collections::HashMap;

/// Errors from typeface parsing.
#[derive(Debug, thiserror::Error)]
pub enum TypefaceError {
    #[error("typeface JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid outline for glyph {glyph:?}: {reason}")]
    InvalidOutline { glyph: char, reason: String },
    #[error("typeface resolution must be positive, got {0}")]
    InvalidResolution(f32),
}

/// One drawing command of a glyph outline, in font units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Vec2),
    LineTo(Vec2),
    QuadTo { ctrl: Vec2, to: Vec2 },
    CubicTo { ctrl1: Vec2, ctrl2: Vec2, to: Vec2 },
}

/// A parsed glyph: horizontal advance plus outline.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub advance: f32,
    pub commands: Vec<PathCommand>,
}

#[derive(Debug, Deserialize)]
struct RawTypeface {
    glyphs: HashMap<String, RawGlyph>,
    #[serde(rename = "familyName", default)]
    family_name: String,
    resolution: f32,
    #[serde(rename = "boundingBox", default)]
    bounding_box: RawBoundingBox,
    #[serde(rename = "underlineThickness", default)]
    underline_thickness: f32,
}

#[derive(Debug, Deserialize)]
struct RawGlyph {
    ha: f32,
    #[serde(default)]
    o: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBoundingBox {
    #[serde(default)]
    y_min: f32,
    #[serde(default)]
    y_max: f32,
}

/// A loaded typeface, ready for text geometry construction.
#[derive(Debug, Clone)]
pub struct Typeface {
    family: String,
    resolution: f32,
    line_height_units: f32,
    glyphs: HashMap<char, Glyph>,
}

impl Typeface {
    pub fn from_json(json: &str) -> Result<Self, TypefaceError> {
        let raw: RawTypeface = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypefaceError> {
        let raw: RawTypeface = serde_json::from_slice(bytes)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawTypeface) -> Result<Self, TypefaceError> {
        if raw.resolution <= 0.0 || !raw.resolution.is_finite() {
            return Err(TypefaceError::InvalidResolution(raw.resolution));
        }

        let mut glyphs = HashMap::with_capacity(raw.glyphs.len());
        for (key, glyph) in raw.glyphs {
            let mut chars = key.chars();
            let (Some(ch), None) = (chars.next(), chars.next()) else {
                tracing::trace!(key, "skipping multi-character glyph key");
                continue;
            };
            let commands = match glyph.o.as_deref() {
                Some(outline) => parse_outline(ch, outline)?,
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

        let bbox_height = raw.bounding_box.y_max - raw.bounding_box.y_min;
        let line_height_units = if bbox_height > 0.0 {
            bbox_height + raw.underline_thickness
        } else {
            raw.resolution
        };

        Ok(Self {
            family: raw.family_name,
            resolution: raw.resolution,
            line_height_units,
            glyphs,
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Font units per em.
    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    pub fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Distance between baselines when text is laid out at `size`.
    pub fn line_height(&self, size: f32) -> f32 {
        self.line_height_units * size / self.resolution
    }
}

fn parse_outline(glyph: char, outline: &str) -> Result<Vec<PathCommand>, TypefaceError> {
    let invalid = |reason: String| TypefaceError::InvalidOutline { glyph, reason };
    let mut tokens = outline.split_whitespace();
    let mut commands = Vec::new();

    let mut point = |tokens: &mut std::str::SplitWhitespace<'_>, cmd: &str| {
        let mut coord = || -> Result<f32, TypefaceError> {
            let token = tokens
                .next()
                .ok_or_else(|| invalid(format!("command '{cmd}' is missing coordinates")))?;
            token
                .parse::<f32>()
                .map_err(|_| invalid(format!("bad coordinate {token:?}")))
        };
        Ok::<Vec2, TypefaceError>(Vec2::new(coord()?, coord()?))
    };

    while let Some(cmd) = tokens.next() {
        let command = match cmd {
            "m" => PathCommand::MoveTo(point(&mut tokens, cmd)?),
            "l" => PathCommand::LineTo(point(&mut tokens, cmd)?),
            "q" => {
                let to = point(&mut tokens, cmd)?;
                let ctrl = point(&mut tokens, cmd)?;
                PathCommand::QuadTo { ctrl, to }
            }
            "b" => {
                let to = point(&mut tokens, cmd)?;
                let ctrl1 = point(&mut tokens, cmd)?;
                let ctrl2 = point(&mut tokens, cmd)?;
                PathCommand::CubicTo { ctrl1, ctrl2, to }
            }
            // Close-path markers carry no coordinates; contours close implicitly.
            "z" => continue,
            other => return Err(invalid(format!("unknown command {other:?}"))),
        };
        commands.push(command);
    }

    Ok(commands)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Tiny typeface with a square `I`, a square `O` with a square hole, and
    /// a blank space. Resolution 100 so size 100 maps units one to one.
    pub(crate) const TEST_TYPEFACE: &str = r#"{
        "familyName": "Test Sans",
        "resolution": 100,
        "underlineThickness": 10,
        "boundingBox": { "xMin": 0, "xMax": 100, "yMin": -20, "yMax": 100 },
        "glyphs": {
            "I": { "ha": 40, "x_min": 0, "x_max": 30, "o": "m 0 0 l 0 100 l 30 100 l 30 0 l 0 0" },
            "O": { "ha": 110, "x_min": 0, "x_max": 100,
                   "o": "m 0 0 l 0 100 l 100 100 l 100 0 l 0 0 m 30 30 l 70 30 l 70 70 l 30 70 l 30 30" },
            "C": { "ha": 100, "x_min": 0, "x_max": 90,
                   "o": "m 90 0 q 0 50 0 0 q 90 100 0 100 l 90 80 q 20 50 20 80 q 90 20 20 20 l 90 0" },
            "?": { "ha": 50, "x_min": 0, "x_max": 40, "o": "m 0 0 l 0 40 l 40 40 l 40 0" },
            " ": { "ha": 30, "x_min": 0, "x_max": 0 },
            "ab": { "ha": 10 }
        }
    }"#;

    #[test]
    fn parses_glyphs_and_metrics() {
        let tf = Typeface::from_json(TEST_TYPEFACE).unwrap();
        assert_eq!(tf.family(), "Test Sans");
        assert_eq!(tf.resolution(), 100.0);
        assert_eq!(tf.glyph_count(), 5);
        assert_eq!(tf.line_height(100.0), 130.0);
        assert_eq!(tf.line_height(50.0), 65.0);

        let space = tf.glyph(' ').unwrap();
        assert!(space.commands.is_empty());
        assert_eq!(space.advance, 30.0);
    }

    #[test]
    fn quadratic_command_reads_end_point_first() {
        let tf = Typeface::from_json(TEST_TYPEFACE).unwrap();
        let c = tf.glyph('C').unwrap();
        assert_eq!(
            c.commands[1],
            PathCommand::QuadTo {
                to: Vec2::new(0.0, 50.0),
                ctrl: Vec2::new(0.0, 0.0),
            }
        );
    }

    #[test]
    fn cubic_command_parses() {
        let cmds = parse_outline('x', "m 0 0 b 10 0 3 3 7 7").unwrap();
        assert_eq!(
            cmds[1],
            PathCommand::CubicTo {
                to: Vec2::new(10.0, 0.0),
                ctrl1: Vec2::new(3.0, 3.0),
                ctrl2: Vec2::new(7.0, 7.0),
            }
        );
    }

    #[test]
    fn rejects_truncated_outline() {
        let err = parse_outline('x', "m 0 0 l 5").unwrap_err();
        assert!(matches!(err, TypefaceError::InvalidOutline { glyph: 'x', .. }));
    }

    #[test]
    fn rejects_unknown_command() {
        assert!(parse_outline('x', "m 0 0 k 1 1").is_err());
    }

    #[test]
    fn rejects_bad_json_and_resolution() {
        assert!(matches!(
            Typeface::from_json("{ not json"),
            Err(TypefaceError::Json(_))
        ));
        assert!(matches!(
            Typeface::from_json(r#"{ "glyphs": {}, "resolution": 0 }"#),
            Err(TypefaceError::InvalidResolution(_))
        ));
    }
}
