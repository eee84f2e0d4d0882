//! Typeface loading and glyph layout.
//!
//! Fonts use the JSON "typeface" layout: a `glyphs` table keyed by character,
//! each with a horizontal advance (`ha`) and an outline string (`o`) made of
//! `m`/`l`/`q`/`b` commands in font units. Quadratic and cubic commands list
//! the end point before their control points.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use glam::Vec2;
use log::{debug, warn};
use serde::Deserialize;

use crate::error::FontError;

#[derive(Debug, Clone, Deserialize)]
pub struct Glyph {
    pub ha: f32,
    #[serde(default)]
    pub o: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontBounds {
    pub y_min: f32,
    pub y_max: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Font {
    #[serde(default)]
    pub family_name: String,
    pub resolution: f32,
    pub bounding_box: FontBounds,
    #[serde(default)]
    pub underline_thickness: f32,
    pub glyphs: HashMap<char, Glyph>,
}

/// One outline command, already scaled and offset into layout space
#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Move(Vec2),
    Line(Vec2),
    Quad { control: Vec2, end: Vec2 },
    Cubic { control1: Vec2, control2: Vec2, end: Vec2 },
}

/// Flattened contours of one laid-out glyph.
#[derive(Debug, Clone, Default)]
pub struct GlyphOutline {
    pub contours: Vec<Vec<Vec2>>,
}

impl Font {
    pub fn load(path: &Path) -> Result<Font, FontError> {
        let json = fs::read_to_string(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let font = Font::from_json(&json)?;
        debug!(
            "loaded font '{}' with {} glyphs from {}",
            font.family_name,
            font.glyphs.len(),
            path.display()
        );
        Ok(font)
    }

    pub fn from_json(json: &str) -> Result<Font, FontError> {
        Ok(serde_json::from_str(json)?)
    }

    fn glyph(&self, c: char) -> Option<&Glyph> {
        self.glyphs.get(&c).or_else(|| self.glyphs.get(&'?'))
    }

    /// Lays `text` out at `size` and flattens each glyph's curves into
    /// `curve_segments` line segments.
    pub fn outlines(
        &self,
        text: &str,
        size: f32,
        curve_segments: u32,
    ) -> Result<Vec<GlyphOutline>, FontError> {
        let scale = size / self.resolution;
        let line_height =
            (self.bounding_box.y_max - self.bounding_box.y_min + self.underline_thickness) * scale;

        let mut outlines = Vec::new();
        let mut offset = Vec2::ZERO;
        for c in text.chars() {
            if c == '\n' {
                offset.x = 0.0;
                offset.y -= line_height;
                continue;
            }
            let Some(glyph) = self.glyph(c) else {
                warn!(
                    "character '{}' does not exist in font family '{}'",
                    c, self.family_name
                );
                continue;
            };
            let commands = parse_outline(c, &glyph.o, scale, offset)?;
            let contours = flatten(&commands, curve_segments.max(1));
            if !contours.is_empty() {
                outlines.push(GlyphOutline { contours });
            }
            offset.x += glyph.ha * scale;
        }
        Ok(outlines)
    }
}

fn parse_outline(glyph: char, outline: &str, scale: f32, offset: Vec2) -> Result<Vec<Command>, FontError> {
    let mut tokens = outline.split_whitespace();
    let mut commands = Vec::new();

    let point = |tokens: &mut std::str::SplitWhitespace<'_>| -> Result<Vec2, FontError> {
        let mut coord = || -> Result<f32, FontError> {
            let token = tokens.next().ok_or_else(|| FontError::Outline {
                glyph,
                reason: "truncated command".to_string(),
            })?;
            token.parse::<f32>().map_err(|_| FontError::Outline {
                glyph,
                reason: format!("bad coordinate '{token}'"),
            })
        };
        let x = coord()?;
        let y = coord()?;
        Ok(Vec2::new(x, y) * scale + offset)
    };

    while let Some(op) = tokens.next() {
        let command = match op {
            "m" => Command::Move(point(&mut tokens)?),
            "l" => Command::Line(point(&mut tokens)?),
            "q" => {
                let end = point(&mut tokens)?;
                let control = point(&mut tokens)?;
                Command::Quad { control, end }
            }
            "b" => {
                let end = point(&mut tokens)?;
                let control1 = point(&mut tokens)?;
                let control2 = point(&mut tokens)?;
                Command::Cubic {
                    control1,
                    control2,
                    end,
                }
            }
            other => {
                return Err(FontError::Outline {
                    glyph,
                    reason: format!("unknown command '{other}'"),
                })
            }
        };
        commands.push(command);
    }
    Ok(commands)
}

fn flatten(commands: &[Command], segments: u32) -> Vec<Vec<Vec2>> {
    let mut contours = Vec::new();
    let mut current: Vec<Vec2> = Vec::new();
    let mut pen = Vec2::ZERO;

    for command in commands {
        match *command {
            Command::Move(p) => {
                finish_contour(&mut contours, std::mem::take(&mut current));
                current.push(p);
                pen = p;
            }
            Command::Line(p) => {
                current.push(p);
                pen = p;
            }
            Command::Quad { control, end } => {
                for s in 1..=segments {
                    let t = s as f32 / segments as f32;
                    let mt = 1.0 - t;
                    current.push(pen * (mt * mt) + control * (2.0 * mt * t) + end * (t * t));
                }
                pen = end;
            }
            Command::Cubic {
                control1,
                control2,
                end,
            } => {
                for s in 1..=segments {
                    let t = s as f32 / segments as f32;
                    let mt = 1.0 - t;
                    current.push(
                        pen * (mt * mt * mt)
                            + control1 * (3.0 * mt * mt * t)
                            + control2 * (3.0 * mt * t * t)
                            + end * (t * t * t),
                    );
                }
                pen = end;
            }
        }
    }
    finish_contour(&mut contours, current);
    contours
}

fn finish_contour(contours: &mut Vec<Vec<Vec2>>, mut contour: Vec<Vec2>) {
    contour.dedup_by(|a, b| a.distance_squared(*b) < 1e-12);
    if contour.len() > 1 && contour[0].distance_squared(contour[contour.len() - 1]) < 1e-12 {
        contour.pop();
    }
    if contour.len() >= 3 {
        contours.push(contour);
    }
}

/// Reads a font on a background thread.
///
/// The receiver yields exactly one result; poll it with `try_recv` from the
/// frame loop.
pub fn load_in_background(path: PathBuf) -> mpsc::Receiver<Result<Font, FontError>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let result = Font::load(&path);
        let _ = tx.send(result);
    });
    rx
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::time::Duration;

    /// A tiny font: a square "O" with a square hole, a curved "C" and a space.
    pub(crate) const TEST_FONT: &str = r#"{
        "familyName": "Test",
        "resolution": 1000,
        "underlineThickness": 50,
        "boundingBox": { "xMin": 0, "xMax": 600, "yMin": -200, "yMax": 900 },
        "glyphs": {
            "O": { "ha": 700, "x_min": 0, "x_max": 600,
                   "o": "m 0 0 l 600 0 l 600 700 l 0 700 m 150 150 l 150 550 l 450 550 l 450 150" },
            "C": { "ha": 700, "x_min": 0, "x_max": 600,
                   "o": "m 600 0 l 600 150 l 300 150 q 150 350 150 150 q 300 550 150 550 l 600 550 l 600 700 l 300 700 q 0 350 0 700 q 300 0 0 0" },
            "?": { "ha": 400, "x_min": 0, "x_max": 300, "o": "m 0 0 l 300 0 l 300 300 l 0 300" },
            " ": { "ha": 300, "x_min": 0, "x_max": 0, "o": "" }
        }
    }"#;

    fn font() -> Font {
        Font::from_json(TEST_FONT).unwrap()
    }

    #[test]
    fn parses_typeface_json() {
        let font = font();
        assert_eq!(font.family_name, "Test");
        assert_eq!(font.resolution, 1000.0);
        assert_eq!(font.glyphs.len(), 4);
        assert_eq!(font.bounding_box.y_max, 900.0);
    }

    #[test]
    fn glyphs_advance_by_scaled_width() {
        let outlines = font().outlines("O O", 1.0, 4).unwrap();
        assert_eq!(outlines.len(), 2);
        assert_eq!(outlines[0].contours.len(), 2);
        let first_x = outlines[1].contours[0][0].x;
        // 700 + 300 font units at size 1 / resolution 1000
        assert!((first_x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn newline_moves_down_by_line_height() {
        let outlines = font().outlines("O\nO", 0.5, 4).unwrap();
        let second = outlines[1].contours[0][0];
        assert!((second.x - 0.0).abs() < 1e-6);
        // (900 + 200 + 50) * 0.5 / 1000
        assert!((second.y + 0.575).abs() < 1e-6);
    }

    #[test]
    fn quadratic_curves_are_flattened() {
        let outlines = font().outlines("C", 1.0, 12).unwrap();
        let contour = &outlines[0].contours[0];
        // 6 straight points plus 4 curves of 12 points each
        assert_eq!(contour.len(), 6 + 4 * 12);
        let eps = 1e-5;
        assert!(contour
            .iter()
            .all(|p| p.x >= -eps && p.x <= 0.6 + eps && p.y >= -eps && p.y <= 0.7 + eps));
    }

    #[test]
    fn missing_glyph_falls_back_to_question_mark() {
        let outlines = font().outlines("Z", 1.0, 4).unwrap();
        assert_eq!(outlines.len(), 1);
        assert_eq!(outlines[0].contours[0].len(), 4);
    }

    #[test]
    fn missing_glyph_without_fallback_is_skipped() {
        let mut font = font();
        font.glyphs.remove(&'?');
        let outlines = font.outlines("ZO", 1.0, 4).unwrap();
        assert_eq!(outlines.len(), 1);
        assert_eq!(outlines[0].contours[0][0], Vec2::ZERO);
    }

    #[test]
    fn bad_outline_is_an_error() {
        let mut font = font();
        font.glyphs.get_mut(&'O').unwrap().o = "m 0 0 z 1 1".to_string();
        assert!(matches!(
            font.outlines("O", 1.0, 4),
            Err(FontError::Outline { glyph: 'O', .. })
        ));
    }

    #[test]
    fn background_load_reports_missing_file() {
        let rx = load_in_background(PathBuf::from("does/not/exist.typeface.json"));
        let result = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(result, Err(FontError::Io { .. })));
    }

    #[test]
    fn background_load_reads_file() {
        let path = std::env::temp_dir().join(format!("donut-scene-font-{}.json", std::process::id()));
        fs::write(&path, TEST_FONT).unwrap();
        let rx = load_in_background(path.clone());
        let font = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        assert_eq!(font.family_name, "Test");
        let _ = fs::remove_file(path);
    }
}
