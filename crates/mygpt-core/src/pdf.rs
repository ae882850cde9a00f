//! Plain text from PDF documents.
//!
//! Pages are run through `hayro-interpret` with a device that only records
//! glyphs. Text is then rebuilt from glyph geometry: a wide enough horizontal
//! gap becomes a space, a glyph that no longer overlaps the previous one
//! vertically starts a new line.
//!
//! PDF text has no guaranteed Unicode mapping; glyphs without one are dropped
//! but still count for spacing.

use std::path::Path;
use std::sync::Arc;

use hayro_interpret::font::Glyph;
use hayro_interpret::hayro_syntax::Pdf;
use hayro_interpret::util::PageExt;
use hayro_interpret::{
    interpret_page, BlendMode, ClipPath, Context, Device, GlyphDrawMode, Image, InterpreterSettings,
    Paint, PathDrawMode, SoftMask,
};
use kurbo::{Affine, Rect, Shape};
use tracing::debug;

use crate::error::ExtractError;

/// Turns a picked file into text for the chat input
pub trait TextExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

/// Minimum vertical overlap (relative to the smaller glyph) for two glyphs to
/// share a line
const SAME_LINE_OVERLAP: f64 = 0.5;

/// Horizontal gap, relative to glyph height, that reads as a word break
const WORD_GAP_RATIO: f64 = 0.25;

#[derive(Debug, Clone, Copy)]
struct RecordedGlyph {
    ch: Option<char>,
    bbox: Option<Rect>,
}

/// Device that keeps glyphs in drawing order and ignores everything else
#[derive(Debug, Default)]
struct GlyphRecorder {
    glyphs: Vec<RecordedGlyph>,
}

impl GlyphRecorder {
    fn to_text(&self) -> String {
        let mut out = String::new();
        let mut last_bbox: Option<Rect> = None;
        let mut last_was_break = true;

        for glyph in &self.glyphs {
            if let (Some(prev), Some(cur)) = (last_bbox, glyph.bbox) {
                if !is_same_line(prev, cur) {
                    if !out.is_empty() && !out.ends_with('\n') {
                        out.push('\n');
                        last_was_break = true;
                    }
                } else {
                    let gap = cur.x0 - prev.x1;
                    let threshold = WORD_GAP_RATIO * 0.5 * (prev.height() + cur.height());
                    if gap > threshold && !last_was_break {
                        out.push(' ');
                        last_was_break = true;
                    }
                }
            }

            if let Some(ch) = glyph.ch {
                out.push(ch);
                last_was_break = ch.is_whitespace();
            }

            if glyph.bbox.is_some() {
                last_bbox = glyph.bbox;
            }
        }

        out
    }
}

/// Blank glyphs such as spaces have an empty outline whose box collapses to
/// a point; they carry no line geometry
fn ink_bounds(bbox: Rect) -> Option<Rect> {
    (bbox.width() > 0.0 && bbox.height() > 0.0).then_some(bbox)
}

fn is_same_line(a: Rect, b: Rect) -> bool {
    let overlap = a.y1.min(b.y1) - a.y0.max(b.y0);
    if overlap <= 0.0 {
        return false;
    }

    let denom = a.height().min(b.height());
    if denom <= 0.0 {
        return false;
    }

    overlap / denom >= SAME_LINE_OVERLAP
}

impl<'a> Device<'a> for GlyphRecorder {
    fn set_soft_mask(&mut self, _mask: Option<SoftMask<'a>>) {}

    fn set_blend_mode(&mut self, _blend_mode: BlendMode) {}

    fn draw_path(
        &mut self,
        _path: &kurbo::BezPath,
        _transform: Affine,
        _paint: &Paint<'a>,
        _draw_mode: &PathDrawMode,
    ) {
    }

    fn push_clip_path(&mut self, _clip_path: &ClipPath) {}

    fn push_transparency_group(
        &mut self,
        _opacity: f32,
        _mask: Option<SoftMask<'a>>,
        _blend_mode: BlendMode,
    ) {
    }

    fn draw_glyph(
        &mut self,
        glyph: &Glyph<'a>,
        transform: Affine,
        glyph_transform: Affine,
        _paint: &Paint<'a>,
        _draw_mode: &GlyphDrawMode,
    ) {
        // Type3 glyphs would need their glyph program interpreted for a bbox
        let bbox = match glyph {
            Glyph::Outline(outline) => {
                let path = transform * (glyph_transform * outline.outline());
                ink_bounds(path.bounding_box())
            }
            Glyph::Type3(_) => None,
        };

        self.glyphs.push(RecordedGlyph {
            ch: glyph.as_unicode(),
            bbox,
        });
    }

    fn draw_image(&mut self, _image: Image<'a, '_>, _transform: Affine) {}

    fn pop_clip_path(&mut self) {}

    fn pop_transparency_group(&mut self) {}
}

#[derive(Clone, Default)]
pub struct PdfTextExtractor {
    settings: InterpreterSettings,
}

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract text from an in-memory document. Pages are separated by a
    /// blank line.
    pub fn extract_bytes(&self, data: Vec<u8>) -> Result<String, ExtractError> {
        let pdf = Pdf::new(Arc::new(data)).map_err(|e| ExtractError::Parse(format!("{e:?}")))?;

        let mut pages = Vec::new();
        for page in pdf.pages().iter() {
            let (w, h) = page.render_dimensions();
            let bbox = Rect::new(0.0, 0.0, w as f64, h as f64);

            let mut ctx = Context::new(
                page.initial_transform(true),
                bbox,
                page.xref(),
                self.settings.clone(),
            );
            let mut recorder = GlyphRecorder::default();
            interpret_page(page, &mut ctx, &mut recorder);

            pages.push(recorder.to_text());
        }

        debug!(pages = pages.len(), "interpreted document");

        let text = join_pages(&pages);
        if text.is_empty() {
            return Err(ExtractError::NoText);
        }
        Ok(text)
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let data = std::fs::read(path).map_err(|source| ExtractError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.extract_bytes(data)
    }
}

fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
