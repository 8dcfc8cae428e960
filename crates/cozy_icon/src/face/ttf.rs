use std::path::Path;

use fontdue::{Font, FontSettings};

use super::{Glyph, GlyphSource};
use crate::IconError;

/// A truetype/opentype face rasterized with fontdue.
pub struct TtfFace {
    font: Font,
}

impl std::fmt::Debug for TtfFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtfFace")
            .field("glyph_count", &self.font.glyph_count())
            .finish()
    }
}

impl TtfFace {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IconError> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| IconError::InvalidFont(e.to_string()))?;
        Ok(Self { font })
    }

    pub fn from_path(path: &Path) -> Result<Self, IconError> {
        let bytes = std::fs::read(path).map_err(|source| IconError::FontIo {
            path: path.to_path_buf(),
            source,
        })?;
        let face = Self::from_bytes(&bytes)?;
        tracing::info!(?path, "loaded label font");
        Ok(face)
    }
}

impl GlyphSource for TtfFace {
    fn rasterize(&self, ch: char, px: f32) -> Option<Glyph> {
        // index 0 is .notdef, which we treat as not drawable
        if self.font.lookup_glyph_index(ch) == 0 {
            return None;
        }
        let (metrics, coverage) = self.font.rasterize(ch, px);
        Some(Glyph {
            width: metrics.width,
            height: metrics.height,
            xmin: metrics.xmin,
            ymin: metrics.ymin,
            advance: metrics.advance_width,
            coverage,
        })
    }
}
