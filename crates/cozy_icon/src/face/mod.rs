//! Text measurement and glyph rasterization for badge labels.
//!
//! Coordinates here are y-down with the origin on the baseline at the pen start,
//! so a glyph sitting on the baseline has a negative `top`.

mod bitmap;
mod ttf;

pub use bitmap::BitmapFace;
pub use ttf::TtfFace;

/// A coverage bitmap for one character.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub width: usize,
    pub height: usize,
    /// offset of the left edge of the bitmap from the pen position
    pub xmin: i32,
    /// offset of the bottom edge of the bitmap from the baseline. positive is up.
    pub ymin: i32,
    pub advance: f32,
    /// row-major, top row first. `width * height` bytes.
    pub coverage: Vec<u8>,
}

impl Glyph {
    pub fn is_blank(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

pub trait GlyphSource: Send + Sync {
    /// rasterizes `ch` at `px` pixels per em. `None` if the face cannot draw this character.
    fn rasterize(&self, ch: char, px: f32) -> Option<Glyph>;
}

/// Ink bounds of some text relative to the pen origin. Same meaning as android's `getTextBounds`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TextBounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl TextBounds {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }
    fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        Self {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlacedGlyph {
    /// left edge relative to the pen origin
    pub x: i32,
    /// top edge relative to the baseline
    pub y: i32,
    pub glyph: Glyph,
}

/// A single line of text, measured and ready to be drawn.
#[derive(Debug, Clone, Default)]
pub struct TextRun {
    pub glyphs: Vec<PlacedGlyph>,
    pub bounds: TextBounds,
}

impl TextRun {
    pub fn layout(face: &dyn GlyphSource, text: &str, px: f32) -> Self {
        let mut run = TextRun::default();
        if !(px.is_finite() && px > 0.0) {
            return run;
        }
        let mut pen = 0.0f32;
        for ch in text.chars() {
            let Some(glyph) = face.rasterize(ch, px) else {
                continue;
            };
            let advance = glyph.advance;
            if !glyph.is_blank() {
                let x = pen.round() as i32 + glyph.xmin;
                let y = -(glyph.ymin + glyph.height as i32);
                run.bounds = run.bounds.union(TextBounds {
                    left: x,
                    top: y,
                    right: x + glyph.width as i32,
                    bottom: -glyph.ymin,
                });
                run.glyphs.push(PlacedGlyph { x, y, glyph });
            }
            pen += advance;
        }
        run
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// pen origin which puts the center of the ink box on `(cx, cy)`.
    /// `x = cx - width/2 - left` and `baseline = cy + height/2 - bottom`
    pub fn centered_origin(&self, cx: f32, cy: f32) -> (i32, i32) {
        let b = self.bounds;
        let x = cx - b.width() as f32 / 2.0 - b.left as f32;
        let y = cy + b.height() as f32 / 2.0 - b.bottom as f32;
        (x.round() as i32, y.round() as i32)
    }
}
