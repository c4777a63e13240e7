use crate::core::Color;
use crate::error::ResourceError;
use log::error;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A decoded image in the framebuffer's ARGB layout.
///
/// Pixel data sits behind an `Arc`, so clones are cheap and entities can share
/// one decoded image.
#[derive(Clone)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub data: Arc<Vec<u32>>,
    pub path: String,
}

impl Texture {
    /// Load a texture from an image file (any format the `image` crate decodes).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ResourceError> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| ResourceError::Image {
            path: path.to_path_buf(),
            source,
        })?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let data = rgba
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
            })
            .collect();

        Ok(Texture {
            width,
            height,
            data: Arc::new(data),
            path: path.display().to_string(),
        })
    }

    /// Wrap already-converted ARGB pixels.
    pub fn from_argb(width: u32, height: u32, data: Vec<u32>) -> Result<Self, ResourceError> {
        if width == 0 || height == 0 {
            return Err(ResourceError::TextureData(format!(
                "empty texture {}x{}",
                width, height
            )));
        }
        if data.len() != (width * height) as usize {
            return Err(ResourceError::TextureData(format!(
                "{} pixels for a {}x{} texture",
                data.len(),
                width,
                height
            )));
        }
        Ok(Texture {
            width,
            height,
            data: Arc::new(data),
            path: String::from("memory"),
        })
    }

    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Texture {
            width,
            height,
            data: Arc::new(vec![color.to_argb(); (width * height) as usize]),
            path: String::from("solid"),
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.data[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    /// Sample at normalized coordinates, origin at the top-left corner.
    /// Coordinates outside `[0, 1]` are clamped to the edge.
    pub fn sample(&self, u: f32, v: f32, filter: TextureFilter) -> u32 {
        let u = u.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);
        match filter {
            TextureFilter::Nearest => self.sample_nearest(u, v),
            TextureFilter::Bilinear => self.sample_bilinear(u, v),
        }
    }

    fn sample_nearest(&self, u: f32, v: f32) -> u32 {
        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = ((v * self.height as f32) as u32).min(self.height - 1);
        self.data[(y * self.width + x) as usize]
    }

    fn sample_bilinear(&self, u: f32, v: f32) -> u32 {
        let x_f = u * (self.width - 1) as f32;
        let y_f = v * (self.height - 1) as f32;

        let x0 = x_f.floor() as u32;
        let y0 = y_f.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let dx = x_f - x0 as f32;
        let dy = y_f - y0 as f32;

        let c00 = Color::from_argb(self.data[(y0 * self.width + x0) as usize]);
        let c10 = Color::from_argb(self.data[(y0 * self.width + x1) as usize]);
        let c01 = Color::from_argb(self.data[(y1 * self.width + x0) as usize]);
        let c11 = Color::from_argb(self.data[(y1 * self.width + x1) as usize]);

        let c0 = c00.lerp(&c10, dx);
        let c1 = c01.lerp(&c11, dx);
        c0.lerp(&c1, dy).to_argb()
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("path", &self.path)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl PartialEq for Texture {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
            || (self.width == other.width && self.height == other.height && self.data == other.data)
    }
}

/// Texture filtering modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFilter {
    #[default]
    Nearest,
    Bilinear,
}

/// Loads a texture, logging and swallowing any failure.
pub fn load_texture(path: impl AsRef<Path>) -> Option<Texture> {
    match Texture::load(path.as_ref()) {
        Ok(texture) => Some(texture),
        Err(e) => {
            error!("Could not load texture: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Texture {
        Texture::from_argb(
            2,
            2,
            vec![0xFF00_0000, 0xFFFF_FFFF, 0xFFFF_FFFF, 0xFF00_0000],
        )
        .unwrap()
    }

    #[test]
    fn from_argb_checks_dimensions() {
        assert!(Texture::from_argb(2, 2, vec![0; 3]).is_err());
        assert!(Texture::from_argb(0, 2, vec![]).is_err());
        assert_eq!(checker().get(1, 0), Some(0xFFFF_FFFF));
        assert_eq!(checker().get(2, 0), None);
    }

    #[test]
    fn nearest_sampling_picks_texels() {
        let tex = checker();
        assert_eq!(tex.sample(0.1, 0.1, TextureFilter::Nearest), 0xFF00_0000);
        assert_eq!(tex.sample(0.9, 0.1, TextureFilter::Nearest), 0xFFFF_FFFF);
        assert_eq!(tex.sample(0.9, 0.9, TextureFilter::Nearest), 0xFF00_0000);
        // clamped to the edge
        assert_eq!(tex.sample(4.0, -3.0, TextureFilter::Nearest), 0xFFFF_FFFF);
    }

    #[test]
    fn bilinear_sampling_blends_neighbours() {
        let tex = checker();
        assert_eq!(tex.sample(0.0, 0.0, TextureFilter::Bilinear), 0xFF00_0000);
        let mid = tex.sample(0.5, 0.0, TextureFilter::Bilinear);
        let red = (mid >> 16) & 0xFF;
        assert!((127..=128).contains(&red), "red channel {}", red);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Texture::load("does/not/exist.png").is_err());
        assert!(load_texture("does/not/exist.png").is_none());
    }

    #[test]
    fn solid_texture_is_uniform() {
        let tex = Texture::solid(3, 2, Color::RED);
        assert_eq!(tex.data.len(), 6);
        assert!(tex.data.iter().all(|&p| p == 0xFFFF_0000));
    }
}
