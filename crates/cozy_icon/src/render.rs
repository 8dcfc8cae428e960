use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    canvas::{self, Canvas},
    config::IconConfig,
    face::{BitmapFace, GlyphSource, TextBounds, TextRun, TtfFace},
    IconError, RenderedIcon,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeKind {
    /// fixed size circle, used for clusters
    Count,
    /// rounded rectangle that grows with the label, with a pointer tail
    Price,
}

/// Everything a single render depends on, apart from colors and fonts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IconSpec {
    pub kind: BadgeKind,
    pub label: String,
    pub base_size: u32,
    pub pointer_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BadgeBody {
    Circle {
        cx: f32,
        cy: f32,
        radius: f32,
    },
    Bubble {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        corner_radius: f32,
        /// height of the pointer below the bubble, if there is one
        pointer: Option<f32>,
    },
}

/// The measured geometry of a badge. Computed before any pixel is allocated.
#[derive(Debug, Clone)]
pub struct IconLayout {
    pub kind: BadgeKind,
    pub width: u32,
    pub height: u32,
    pub body: BadgeBody,
    /// pen origin of the label on the baseline, in canvas pixels
    pub origin: (i32, i32),
    pub text: TextRun,
}

impl IconLayout {
    /// ink box of the label in canvas pixels. `None` when the label has no visible glyphs.
    pub fn text_box(&self) -> Option<TextBounds> {
        if self.text.is_empty() {
            return None;
        }
        let b = self.text.bounds;
        let (x, y) = self.origin;
        Some(TextBounds {
            left: x + b.left,
            top: y + b.top,
            right: x + b.right,
            bottom: y + b.bottom,
        })
    }
}

/// Draws count and price badges. Cheap to clone.
#[derive(Clone)]
pub struct IconRenderer {
    config: Arc<IconConfig>,
    face: Arc<dyn GlyphSource>,
}

impl std::fmt::Debug for IconRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconRenderer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl IconRenderer {
    /// uses the font at `config.font_path` or the built-in bitmap face
    pub fn new(config: IconConfig) -> Result<Self, IconError> {
        let face: Arc<dyn GlyphSource> = match config.font_path.as_deref() {
            Some(path) => Arc::new(TtfFace::from_path(path)?),
            None => Arc::new(BitmapFace),
        };
        Self::with_face(config, face)
    }

    pub fn with_face(config: IconConfig, face: Arc<dyn GlyphSource>) -> Result<Self, IconError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            face,
        })
    }

    pub fn config(&self) -> &IconConfig {
        &self.config
    }

    pub fn layout(&self, kind: BadgeKind, label: &str) -> IconLayout {
        match kind {
            BadgeKind::Count => self.count_layout(label),
            BadgeKind::Price => self.bubble_layout(label),
        }
    }

    pub fn render(&self, kind: BadgeKind, label: &str) -> Result<RenderedIcon, IconError> {
        let layout = self.layout(kind, label);
        let mut canvas = Canvas::new(layout.width, layout.height)?;
        let config = &self.config;

        let body = match layout.body {
            BadgeBody::Circle { cx, cy, radius } => canvas::circle(cx, cy, radius),
            BadgeBody::Bubble {
                x,
                y,
                width,
                height,
                corner_radius,
                ..
            } => canvas::rounded_rect(x, y, width, height, corner_radius),
        };
        if let Some(body) = body {
            if let Some(shadow) = config.shadow.as_ref() {
                canvas.shadow(&body, shadow)?;
            }
            canvas.fill_path(&body, config.fill);
        }
        if let BadgeBody::Bubble {
            x,
            y,
            width,
            height,
            pointer: Some(pointer_height),
            ..
        } = layout.body
        {
            let bottom = y + height;
            let half_base = config.pointer_size as f32;
            // the base starts a pixel inside the bubble so that no seam shows between the two
            if let Some(tail) =
                canvas::pointer(x + width / 2.0, bottom - 1.0, bottom + pointer_height, half_base)
            {
                canvas.fill_path(&tail, config.fill);
            }
        }
        canvas.draw_text(&layout.text, layout.origin, config.text);
        trace!(
            ?kind,
            label,
            width = layout.width,
            height = layout.height,
            "rendered badge"
        );
        Ok(canvas.into_icon())
    }

    /// renders with the sizes carried by the [IconSpec] instead of the configured ones
    pub fn render_spec(&self, spec: &IconSpec) -> Result<RenderedIcon, IconError> {
        if spec.base_size == self.config.size && spec.pointer_size == self.config.pointer_size {
            return self.render(spec.kind, &spec.label);
        }
        let config = IconConfig {
            size: spec.base_size,
            pointer_size: spec.pointer_size,
            ..(*self.config).clone()
        };
        Self::with_face(config, self.face.clone())?.render(spec.kind, &spec.label)
    }

    fn count_layout(&self, label: &str) -> IconLayout {
        let config = &self.config;
        let text = TextRun::layout(self.face.as_ref(), label, config.count_text_px());
        // the circle never grows. a wide label overflows it, but the canvas still holds all of it.
        let width = config.size.max(text.bounds.width() as u32 + 2);
        let height = config.size.max(text.bounds.height() as u32 + 2);
        let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
        IconLayout {
            kind: BadgeKind::Count,
            width,
            height,
            body: BadgeBody::Circle {
                cx,
                cy,
                radius: config.circle_radius(),
            },
            origin: text.centered_origin(cx, cy),
            text,
        }
    }

    fn bubble_layout(&self, label: &str) -> IconLayout {
        let config = &self.config;
        // text is measured first, the bubble is sized around it
        let text = TextRun::layout(self.face.as_ref(), label, config.bubble_text_px());
        let margin = config.shadow_spread().ceil();
        let body_height = config
            .bubble_height()
            .max(text.bounds.height() as f32 + 2.0)
            .ceil();
        let body_width = (text.bounds.width() as f32 + 2.0 * config.bubble_padding)
            .max(body_height)
            .ceil();
        let pointer = (config.pointer && config.pointer_size > 0).then_some(config.pointer_size as f32);

        let width = (body_width + 2.0 * margin) as u32;
        let height = (margin + body_height + pointer.unwrap_or_default().max(margin)) as u32;
        let (x, y) = (margin, margin);
        IconLayout {
            kind: BadgeKind::Price,
            width,
            height,
            body: BadgeBody::Bubble {
                x,
                y,
                width: body_width,
                height: body_height,
                corner_radius: config.corner_radius,
                pointer,
            },
            origin: text.centered_origin(x + body_width / 2.0, y + body_height / 2.0),
            text,
        }
    }
}
