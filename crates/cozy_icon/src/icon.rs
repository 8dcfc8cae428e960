use std::io::Cursor;

use crate::IconError;

/// An immutable straight-alpha RGBA raster, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedIcon {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl std::fmt::Debug for RenderedIcon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedIcon")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl RenderedIcon {
    pub(crate) fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        debug_assert_eq!(rgba.len(), (width * height * 4) as usize);
        Self {
            width,
            height,
            rgba,
        }
    }
    pub fn width(&self) -> u32 {
        self.width
    }
    pub fn height(&self) -> u32 {
        self.height
    }
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ]
    }
    pub fn to_png(&self) -> Result<Vec<u8>, IconError> {
        let mut png = Cursor::new(vec![]);
        image::write_buffer_with_format(
            &mut png,
            &self.rgba,
            self.width,
            self.height,
            image::ColorType::Rgba8,
            image::ImageOutputFormat::Png,
        )?;
        Ok(png.into_inner())
    }
}
