//! Immediate-mode 2D drawing onto the off-screen buffer.
//!
//! Every coordinate and size passed to [`Graphics`] is multiplied by the
//! current scale before it is rasterised. Font size is not scaled.

use std::fmt;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use fontdue::FontSettings;
use log::{error, warn};

use crate::core::texture::{Texture, TextureFilter};
use crate::core::Color;
use crate::display::buffer::FrameBuffer;
use crate::error::ResourceError;

pub const DEFAULT_FONT_SIZE: f32 = 15.0;

/// DejaVu Sans Mono, shipped so text renders without any font on disk.
const BUILTIN_FONT: &[u8] = include_bytes!("../../assets/DejaVuSansMono.ttf");

fn parse_font(bytes: &[u8], size: f32) -> Result<fontdue::Font, ResourceError> {
    fontdue::Font::from_bytes(
        bytes,
        FontSettings {
            scale: size,
            ..FontSettings::default()
        },
    )
    .map_err(|e| ResourceError::Font(e.to_string()))
}

//--- Font ------------------------------------------------------------------

/// A parsed font at a fixed pixel size. Clones share the parsed font.
#[derive(Clone)]
pub struct Font {
    inner: Arc<fontdue::Font>,
    size: f32,
}

impl Font {
    pub fn from_bytes(bytes: Vec<u8>, size: f32) -> Result<Self, ResourceError> {
        Ok(Font {
            inner: Arc::new(parse_font(&bytes, size)?),
            size,
        })
    }

    /// The monospace face bundled with the crate. Parsed once, shared by
    /// every call.
    pub fn builtin(size: f32) -> Result<Self, ResourceError> {
        static PARSED: OnceLock<Result<Arc<fontdue::Font>, String>> = OnceLock::new();
        let parsed = PARSED.get_or_init(|| {
            fontdue::Font::from_bytes(BUILTIN_FONT, FontSettings::default())
                .map(Arc::new)
                .map_err(|e| e.to_string())
        });
        match parsed {
            Ok(inner) => Ok(Font {
                inner: Arc::clone(inner),
                size,
            }),
            Err(e) => Err(ResourceError::Font(e.clone())),
        }
    }

    pub fn load(path: impl AsRef<Path>, size: f32) -> Result<Self, ResourceError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ResourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(bytes, size)
    }

    /// Same typeface at another size.
    pub fn with_size(&self, size: f32) -> Self {
        Font {
            inner: Arc::clone(&self.inner),
            size,
        }
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// Width of `text` in pixels, summed glyph advances.
    pub fn text_width(&self, text: &str) -> f32 {
        text.chars()
            .map(|c| self.inner.metrics(c, self.size).advance_width)
            .sum()
    }

    /// Distance from the baseline to the top of the tallest glyphs.
    pub fn ascent(&self) -> f32 {
        self.inner
            .horizontal_line_metrics(self.size)
            .map(|m| m.ascent)
            .unwrap_or(self.size)
    }

    /// Full line height, ascent + descent + line gap.
    pub fn line_height(&self) -> f32 {
        self.inner
            .horizontal_line_metrics(self.size)
            .map(|m| m.new_line_size)
            .unwrap_or(self.size)
    }
}

impl PartialEq for Font {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) && self.size == other.size
    }
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Font")
            .field("name", &self.inner.name())
            .field("size", &self.size)
            .finish()
    }
}

/// Loads a font, logging and swallowing any failure.
pub fn load_font(path: impl AsRef<Path>, size: f32) -> Option<Font> {
    match Font::load(path.as_ref(), size) {
        Ok(font) => Some(font),
        Err(e) => {
            error!("Could not load font {}: {}", path.as_ref().display(), e);
            None
        }
    }
}

//--- RenderQuality ---------------------------------------------------------

/// Quality presets, trading image quality for speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderQuality {
    #[default]
    Default,
    Low,
    Medium,
    High,
}

impl RenderQuality {
    pub fn texture_filter(self) -> TextureFilter {
        match self {
            RenderQuality::Low => TextureFilter::Nearest,
            RenderQuality::Default | RenderQuality::Medium | RenderQuality::High => {
                TextureFilter::Bilinear
            }
        }
    }

    /// Whether glyph coverage is blended, or thresholded to hard pixels.
    pub fn antialias_text(self) -> bool {
        matches!(self, RenderQuality::Default | RenderQuality::High)
    }
}

//--- GraphicsState ---------------------------------------------------------

/// Drawing state that outlives a single frame.
#[derive(Debug, Clone)]
pub struct GraphicsState {
    pub color: Color,
    pub font: Option<Font>,
    pub scale: f64,
    pub background: Color,
    pub quality: RenderQuality,
    missing_font_warned: bool,
}

impl GraphicsState {
    pub fn new() -> Self {
        Self {
            color: Color::BLACK,
            font: None,
            scale: 1.0,
            background: Color::WHITE,
            quality: RenderQuality::Default,
            missing_font_warned: false,
        }
    }
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self::new()
    }
}

//--- Graphics --------------------------------------------------------------

/// Drawing context handed to `Scene::render` for one frame.
pub struct Graphics<'a> {
    buffer: &'a mut FrameBuffer,
    state: &'a mut GraphicsState,
}

impl<'a> Graphics<'a> {
    pub fn new(buffer: &'a mut FrameBuffer, state: &'a mut GraphicsState) -> Self {
        Self { buffer, state }
    }

    pub fn width(&self) -> usize {
        self.buffer.width
    }

    pub fn height(&self) -> usize {
        self.buffer.height
    }

    pub fn color(&self) -> Color {
        self.state.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.state.color = color;
    }

    pub fn font(&self) -> Option<&Font> {
        self.state.font.as_ref()
    }

    pub fn set_font(&mut self, font: Option<Font>) {
        self.state.font = font;
    }

    pub fn scale(&self) -> f64 {
        self.state.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.state.scale = scale;
    }

    pub fn quality(&self) -> RenderQuality {
        self.state.quality
    }

    pub fn set_quality(&mut self, quality: RenderQuality) {
        self.state.quality = quality;
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &*self.buffer
    }

    #[inline]
    fn scaled(&self, v: f64) -> i32 {
        (v * self.state.scale) as i32
    }

    /// Fills the whole buffer with the background color. The current color
    /// is left alone.
    pub fn reset_buffer(&mut self) {
        self.buffer.clear(self.state.background);
    }

    //--- Shapes -----------------------------------------------------------

    /// Outline covering `x..=x+w` by `y..=y+h`.
    pub fn draw_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let (x, y, w, h) = (self.scaled(x), self.scaled(y), self.scaled(w), self.scaled(h));
        if w < 0 || h < 0 {
            return;
        }
        let argb = self.state.color.to_argb();
        for px in x..=x + w {
            self.buffer.set_pixel(px, y, argb);
            if h > 0 {
                self.buffer.set_pixel(px, y + h, argb);
            }
        }
        for py in y + 1..y + h {
            self.buffer.set_pixel(x, py, argb);
            if w > 0 {
                self.buffer.set_pixel(x + w, py, argb);
            }
        }
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let (x, y, w, h) = (self.scaled(x), self.scaled(y), self.scaled(w), self.scaled(h));
        let argb = self.state.color.to_argb();
        // clip to the buffer up front, large rects are common (backgrounds)
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(self.buffer.width as i32);
        let y1 = (y + h).min(self.buffer.height as i32);
        for py in y0..y1 {
            for px in x0..x1 {
                self.buffer.set_pixel(px, py, argb);
            }
        }
    }

    pub fn draw_round_rect(&mut self, x: f64, y: f64, w: f64, h: f64, arc_w: f64, arc_h: f64) {
        let shape = RoundRect::new(
            self.scaled(x),
            self.scaled(y),
            self.scaled(w) + 1,
            self.scaled(h) + 1,
            self.scaled(arc_w),
            self.scaled(arc_h),
        );
        let argb = self.state.color.to_argb();
        for (px, py) in shape.pixels() {
            let edge = !shape.contains(px - 1, py)
                || !shape.contains(px + 1, py)
                || !shape.contains(px, py - 1)
                || !shape.contains(px, py + 1);
            if edge {
                self.buffer.set_pixel(px, py, argb);
            }
        }
    }

    pub fn fill_round_rect(&mut self, x: f64, y: f64, w: f64, h: f64, arc_w: f64, arc_h: f64) {
        let shape = RoundRect::new(
            self.scaled(x),
            self.scaled(y),
            self.scaled(w),
            self.scaled(h),
            self.scaled(arc_w),
            self.scaled(arc_h),
        );
        let argb = self.state.color.to_argb();
        for (px, py) in shape.pixels() {
            self.buffer.set_pixel(px, py, argb);
        }
    }

    //--- Text -------------------------------------------------------------

    /// Draws `text` with its baseline starting at `(x, y)`.
    pub fn draw_string(&mut self, text: &str, x: f64, y: f64) {
        let Some(font) = self.state.font.clone() else {
            if !self.state.missing_font_warned {
                warn!("No font set, text is not drawn");
                self.state.missing_font_warned = true;
            }
            return;
        };

        let color = self.state.color;
        let antialias = self.state.quality.antialias_text();
        let baseline = self.scaled(y);
        let mut cursor_x = (x * self.state.scale) as f32;

        for c in text.chars() {
            let (metrics, bitmap) = font.inner.rasterize(c, font.size);
            let left = cursor_x.round() as i32 + metrics.xmin;
            let top = baseline - (metrics.height as i32 + metrics.ymin);

            for (i, &coverage) in bitmap.iter().enumerate() {
                let alpha = if antialias {
                    coverage as f32 / 255.0
                } else if coverage >= 128 {
                    1.0
                } else {
                    0.0
                };
                if alpha <= 0.0 {
                    continue;
                }
                let bx = (i % metrics.width) as i32;
                let by = (i / metrics.width) as i32;
                let argb = Color { a: color.a * alpha, ..color }.to_argb();
                self.buffer.set_pixel(left + bx, top + by, argb);
            }

            cursor_x += metrics.advance_width;
        }
    }

    /// Draws `text` centered inside the box `(x, y, w, h)`.
    pub fn draw_string_centered(&mut self, text: &str, x: f64, y: f64, w: f64, h: f64) {
        let (text_w, line_h, ascent) = match &self.state.font {
            Some(font) => (
                font.text_width(text) as f64,
                font.line_height() as f64,
                font.ascent() as f64,
            ),
            None => (0.0, 0.0, 0.0),
        };
        let x = x + (w - text_w) / 2.0;
        let y = y + (h - line_h) / 2.0 + ascent;
        self.draw_string(text, x, y);
    }

    /// Width of `text` in the current font, 0 without a font.
    pub fn text_width(&self, text: &str) -> f64 {
        self.state
            .font
            .as_ref()
            .map(|f| f.text_width(text) as f64)
            .unwrap_or(0.0)
    }

    //--- Textures ---------------------------------------------------------

    pub fn draw_texture(&mut self, texture: &Texture, x: f64, y: f64) {
        self.draw_texture_sized(texture, x, y, texture.width as f64, texture.height as f64);
    }

    /// Draws `texture` stretched to `w` x `h`, alpha-composited.
    pub fn draw_texture_sized(&mut self, texture: &Texture, x: f64, y: f64, w: f64, h: f64) {
        let (x, y, w, h) = (self.scaled(x), self.scaled(y), self.scaled(w), self.scaled(h));
        if w <= 0 || h <= 0 {
            return;
        }
        let filter = self.state.quality.texture_filter();
        let native = w as u32 == texture.width && h as u32 == texture.height;

        for dy in 0..h {
            let py = y + dy;
            if py < 0 || py >= self.buffer.height as i32 {
                continue;
            }
            for dx in 0..w {
                let px = x + dx;
                if px < 0 || px >= self.buffer.width as i32 {
                    continue;
                }
                let argb = if native {
                    texture.data[(dy as u32 * texture.width + dx as u32) as usize]
                } else {
                    let u = (dx as f32 + 0.5) / w as f32;
                    let v = (dy as f32 + 0.5) / h as f32;
                    texture.sample(u, v, filter)
                };
                self.buffer.set_pixel(px, py, argb);
            }
        }
    }
}

/// Rectangle with elliptical corners, `arc_w`/`arc_h` are the corner
/// ellipse diameters.
struct RoundRect {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    rx: f64,
    ry: f64,
}

impl RoundRect {
    fn new(x: i32, y: i32, w: i32, h: i32, arc_w: i32, arc_h: i32) -> Self {
        let rx = (arc_w.max(0) as f64 / 2.0).min(w as f64 / 2.0);
        let ry = (arc_h.max(0) as f64 / 2.0).min(h as f64 / 2.0);
        Self { x, y, w, h, rx, ry }
    }

    fn contains(&self, px: i32, py: i32) -> bool {
        if px < self.x || py < self.y || px >= self.x + self.w || py >= self.y + self.h {
            return false;
        }
        if self.rx <= 0.0 || self.ry <= 0.0 {
            return true;
        }
        // pixel centers relative to the box
        let lx = (px - self.x) as f64 + 0.5;
        let ly = (py - self.y) as f64 + 0.5;
        let cx = if lx < self.rx {
            self.rx
        } else if lx > self.w as f64 - self.rx {
            self.w as f64 - self.rx
        } else {
            return true;
        };
        let cy = if ly < self.ry {
            self.ry
        } else if ly > self.h as f64 - self.ry {
            self.h as f64 - self.ry
        } else {
            return true;
        };
        let nx = (lx - cx) / self.rx;
        let ny = (ly - cy) / self.ry;
        nx * nx + ny * ny <= 1.0
    }

    fn pixels(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (self.y..self.y + self.h.max(0))
            .flat_map(move |py| (self.x..self.x + self.w.max(0)).map(move |px| (px, py)))
            .filter(move |&(px, py)| self.contains(px, py))
    }
}
