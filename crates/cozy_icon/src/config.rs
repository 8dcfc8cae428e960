use serde::{Deserialize, Serialize};

/// straight (not premultiplied) rgba
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const WHITE: Self = Self([255, 255, 255, 255]);
    pub const BLACK: Self = Self([0, 0, 0, 255]);

    pub fn with_alpha(self, alpha: u8) -> Self {
        let [r, g, b, _] = self.0;
        Self([r, g, b, alpha])
    }
    pub fn to_skia(self) -> tiny_skia::Color {
        let [r, g, b, a] = self.0;
        tiny_skia::Color::from_rgba8(r, g, b, a)
    }
}

/// The soft outline drawn under the badge.
/// It is a stroke of the badge shape which gets blurred and is then mostly covered by the fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    pub color: Rgba,
    pub stroke_width: f32,
    /// gaussian sigma in pixels. `0` leaves the stroke crisp.
    pub blur_sigma: f32,
    /// moves the shadow down a little so that the badge looks lifted
    pub offset_y: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            color: Rgba::BLACK.with_alpha(15),
            stroke_width: 6.0,
            // a blur radius of 8 as a gaussian sigma: 0.57735 * radius + 0.5
            blur_sigma: 5.1,
            offset_y: 1.0,
        }
    }
}

impl ShadowConfig {
    /// how far the blurred stroke bleeds outside of the shape it outlines
    pub fn spread(&self) -> f32 {
        self.stroke_width / 2.0 + 3.0 * self.blur_sigma.max(0.0) + self.offset_y.abs()
    }
}

/// Every size, color and font that goes into a badge.
/// Sizes derived from `size` are expressed as divisors, so that a single `size` change scales the whole badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    /// side of the count badge canvas and the base for every ratio below
    pub size: u32,
    /// half the base of the bubble's pointer triangle, and its height
    pub pointer_size: u32,
    /// whether bubbles get the pointer tail at all
    pub pointer: bool,
    pub circle_radius_ratio: f32,
    pub count_text_ratio: f32,
    pub bubble_text_ratio: f32,
    pub bubble_height_ratio: f32,
    /// horizontal padding on each side of the bubble text.
    /// vertically the bubble is `size / bubble_height_ratio` tall, or taller when the text needs it
    pub bubble_padding: f32,
    pub corner_radius: f32,
    pub fill: Rgba,
    pub text: Rgba,
    pub shadow: Option<ShadowConfig>,
    /// ttf/otf file for the labels. The built-in bitmap face is used when this is not set.
    pub font_path: Option<std::path::PathBuf>,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            size: 150,
            pointer_size: 12,
            pointer: true,
            circle_radius_ratio: 2.2,
            count_text_ratio: 3.0,
            bubble_text_ratio: 4.0,
            bubble_height_ratio: 3.0,
            bubble_padding: 32.0,
            corner_radius: 10.0,
            fill: Rgba::WHITE,
            text: Rgba::BLACK,
            shadow: Some(ShadowConfig::default()),
            font_path: None,
        }
    }
}

impl IconConfig {
    pub fn circle_radius(&self) -> f32 {
        self.size as f32 / self.circle_radius_ratio
    }
    pub fn count_text_px(&self) -> f32 {
        self.size as f32 / self.count_text_ratio
    }
    pub fn bubble_text_px(&self) -> f32 {
        self.size as f32 / self.bubble_text_ratio
    }
    pub fn bubble_height(&self) -> f32 {
        self.size as f32 / self.bubble_height_ratio
    }
    pub fn shadow_spread(&self) -> f32 {
        self.shadow.as_ref().map(ShadowConfig::spread).unwrap_or_default()
    }
    pub fn validate(&self) -> Result<(), crate::IconError> {
        let ratios = [
            self.circle_radius_ratio,
            self.count_text_ratio,
            self.bubble_text_ratio,
            self.bubble_height_ratio,
        ];
        if self.size == 0 || ratios.iter().any(|r| !r.is_finite() || *r <= 0.0) {
            return Err(crate::IconError::InvalidConfig(format!(
                "size must be positive and ratios must be finite positive numbers. size: {}, ratios: {ratios:?}",
                self.size
            )));
        }
        Ok(())
    }
}
