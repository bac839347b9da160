//! Display-dependent render scale

/// Viewport description used to pick a rasterization scale
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayMetrics {
    /// Viewport width in CSS pixels
    pub viewport_width: u32,
    /// Device pixel ratio
    pub pixel_ratio: f32,
}

impl Default for DisplayMetrics {
    fn default() -> Self {
        Self {
            viewport_width: 1024,
            pixel_ratio: 1.0,
        }
    }
}

impl DisplayMetrics {
    #[must_use]
    pub const fn new(viewport_width: u32, pixel_ratio: f32) -> Self {
        Self {
            viewport_width,
            pixel_ratio,
        }
    }

    /// Base scale for the viewport width, before pixel ratio is applied
    #[must_use]
    pub fn tier(&self) -> f32 {
        match self.viewport_width {
            w if w > 1920 => 3.5,
            w if w > 1440 => 3.0,
            w if w > 1024 => 2.5,
            _ => 2.0,
        }
    }

    /// Tier multiplied by pixel ratio, capped at `max_scale`
    #[must_use]
    pub fn render_scale(&self, max_scale: f32) -> f32 {
        let ratio = if self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0 {
            self.pixel_ratio
        } else {
            1.0
        };
        let scale = self.tier() * ratio;
        if max_scale > 0.0 {
            scale.min(max_scale)
        } else {
            scale
        }
    }
}
