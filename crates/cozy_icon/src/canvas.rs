use tiny_skia::{
    FillRule, IntSize, Paint, Path, PathBuilder, Pixmap, PixmapPaint, PremultipliedColorU8, Rect,
    Stroke, Transform,
};

use crate::{
    config::{Rgba, ShadowConfig},
    face::TextRun,
    IconError, RenderedIcon,
};

/// circle arcs approximated with cubic curves use control points at this fraction of the radius
const KAPPA: f32 = 0.552_284_8;

pub(crate) struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self, IconError> {
        Pixmap::new(width, height)
            .map(|pixmap| Self { pixmap })
            .ok_or(IconError::CanvasAllocation { width, height })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn fill_path(&mut self, path: &Path, color: Rgba) {
        self.pixmap.fill_path(
            path,
            &paint(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    /// strokes `path` on a separate layer, blurs that layer and composites it onto the canvas.
    /// must be called before the fill of the same shape, so that only the outer edge stays visible.
    pub fn shadow(&mut self, path: &Path, shadow: &ShadowConfig) -> Result<(), IconError> {
        let (width, height) = (self.width(), self.height());
        let mut layer = Pixmap::new(width, height)
            .ok_or(IconError::CanvasAllocation { width, height })?;
        let stroke = Stroke {
            width: shadow.stroke_width,
            ..Stroke::default()
        };
        layer.stroke_path(
            path,
            &paint(shadow.color),
            &stroke,
            Transform::from_translate(0.0, shadow.offset_y),
            None,
        );
        if shadow.blur_sigma > 0.0 {
            layer = blur(layer, shadow.blur_sigma)?;
        }
        self.pixmap.draw_pixmap(
            0,
            0,
            layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(())
    }

    /// source-over blend of the run's coverage, with the pen origin at `origin`.
    /// glyph pixels outside of the canvas are clipped.
    pub fn draw_text(&mut self, run: &TextRun, origin: (i32, i32), color: Rgba) {
        let (width, height) = (self.width() as i32, self.height() as i32);
        let [r, g, b, a] = color.0;
        let pixels = self.pixmap.pixels_mut();
        for placed in &run.glyphs {
            let glyph = &placed.glyph;
            let left = origin.0 + placed.x;
            let top = origin.1 + placed.y;
            for row in 0..glyph.height {
                let y = top + row as i32;
                if !(0..height).contains(&y) {
                    continue;
                }
                for col in 0..glyph.width {
                    let x = left + col as i32;
                    let coverage = glyph.coverage[row * glyph.width + col];
                    if coverage == 0 || !(0..width).contains(&x) {
                        continue;
                    }
                    let index = (y * width + x) as usize;
                    let dst = pixels[index];
                    let sa = mul(a, coverage);
                    let inv = 255 - sa;
                    let blended = PremultipliedColorU8::from_rgba(
                        mul(r, sa).saturating_add(mul(dst.red(), inv)),
                        mul(g, sa).saturating_add(mul(dst.green(), inv)),
                        mul(b, sa).saturating_add(mul(dst.blue(), inv)),
                        sa.saturating_add(mul(dst.alpha(), inv)),
                    );
                    if let Some(px) = blended {
                        pixels[index] = px;
                    }
                }
            }
        }
    }

    pub fn into_icon(self) -> RenderedIcon {
        let (width, height) = (self.width(), self.height());
        let rgba = self
            .pixmap
            .pixels()
            .iter()
            .flat_map(|px| {
                let c = px.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        RenderedIcon::from_rgba(width, height, rgba)
    }
}

fn paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint
}

/// (x * y) / 255, rounded
fn mul(x: u8, y: u8) -> u8 {
    ((x as u16 * y as u16 + 127) / 255) as u8
}

fn blur(layer: Pixmap, sigma: f32) -> Result<Pixmap, IconError> {
    let (width, height) = (layer.width(), layer.height());
    let alloc_err = || IconError::CanvasAllocation { width, height };
    let img = image::RgbaImage::from_raw(width, height, layer.take()).ok_or_else(alloc_err)?;
    let mut blurred = image::imageops::blur(&img, sigma);
    // channels are blurred independently. keep them valid premultiplied values.
    for px in blurred.pixels_mut() {
        let alpha = px.0[3];
        for c in &mut px.0[..3] {
            *c = (*c).min(alpha);
        }
    }
    let size = IntSize::from_wh(width, height).ok_or_else(alloc_err)?;
    Pixmap::from_vec(blurred.into_raw(), size).ok_or_else(alloc_err)
}

pub(crate) fn circle(cx: f32, cy: f32, radius: f32) -> Option<Path> {
    PathBuilder::from_circle(cx, cy, radius)
}

pub(crate) fn rounded_rect(x: f32, y: f32, width: f32, height: f32, radius: f32) -> Option<Path> {
    let r = radius.min(width / 2.0).min(height / 2.0).max(0.0);
    if r == 0.0 {
        return Some(PathBuilder::from_rect(Rect::from_xywh(x, y, width, height)?));
    }
    let (right, bottom) = (x + width, y + height);
    let k = r * KAPPA;
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.cubic_to(right - r + k, y, right, y + r - k, right, y + r);
    pb.line_to(right, bottom - r);
    pb.cubic_to(right, bottom - r + k, right - r + k, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.cubic_to(x + r - k, bottom, x, bottom - r + k, x, bottom - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
    pb.finish()
}

/// isosceles triangle with its base centered on `(cx, top)`, pointing down to `apex`
pub(crate) fn pointer(cx: f32, top: f32, apex: f32, half_base: f32) -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(cx - half_base, top);
    pb.line_to(cx + half_base, top);
    pb.line_to(cx, apex);
    pb.close();
    pb.finish()
}
