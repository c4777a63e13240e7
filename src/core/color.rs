#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32, // Red component (0.0 - 1.0)
    pub g: f32, // Green component (0.0 - 1.0)
    pub b: f32, // Blue component (0.0 - 1.0)
    pub a: f32, // Alpha (0.0 = transparent, 1.0 = opaque)
}

impl Color {
    /// Create a new opaque color with RGB components normalized.
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn with_alpha(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create a color from 8-bit channels, the way most palettes are written down.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Create a color from a hexadecimal string.
    /// Accepts formats like "#RRGGBB" or "RRGGBB".
    pub fn from_hex(hex: &str) -> Result<Self, &'static str> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err("Hex string should be 6 characters long (RRGGBB).");
        }

        let r = u8::from_str_radix(&hex[0..2], 16).map_err(|_| "Invalid red component in hex")?;
        let g = u8::from_str_radix(&hex[2..4], 16).map_err(|_| "Invalid green component in hex")?;
        let b = u8::from_str_radix(&hex[4..6], 16).map_err(|_| "Invalid blue component in hex")?;

        Ok(Self::from_rgb8(r, g, b))
    }

    const fn hex_char_to_u8(c: char) -> u8 {
        match c {
            '0'..='9' => (c as u8) - b'0',
            'a'..='f' => (c as u8) - b'a' + 10,
            'A'..='F' => (c as u8) - b'A' + 10,
            _ => 0,
        }
    }

    /// Convert two hex characters to a single byte (u8).
    const fn hex_pair_to_u8(high: char, low: char) -> u8 {
        (Self::hex_char_to_u8(high) << 4) | Self::hex_char_to_u8(low)
    }

    /// Only for the predefined constants below, invalid input silently maps to 0.
    const fn hex(hex: &str) -> Self {
        let bytes = hex.as_bytes();
        let offset = if bytes[0] == b'#' { 1 } else { 0 };

        let r =
            Self::hex_pair_to_u8(bytes[offset] as char, bytes[offset + 1] as char) as f32 / 255.0;
        let g = Self::hex_pair_to_u8(bytes[offset + 2] as char, bytes[offset + 3] as char) as f32
            / 255.0;
        let b = Self::hex_pair_to_u8(bytes[offset + 4] as char, bytes[offset + 5] as char) as f32
            / 255.0;

        Self { r, g, b, a: 1.0 }
    }

    /// Pack into the 0xAARRGGBB layout used by the framebuffer (and minifb).
    pub fn to_argb(&self) -> u32 {
        let a = (self.a.clamp(0.0, 1.0) * 255.0).round() as u32;
        let r = (self.r.clamp(0.0, 1.0) * 255.0).round() as u32;
        let g = (self.g.clamp(0.0, 1.0) * 255.0).round() as u32;
        let b = (self.b.clamp(0.0, 1.0) * 255.0).round() as u32;
        (a << 24) | (r << 16) | (g << 8) | b
    }

    pub fn from_argb(argb: u32) -> Self {
        Self {
            a: ((argb >> 24) & 0xFF) as f32 / 255.0,
            r: ((argb >> 16) & 0xFF) as f32 / 255.0,
            g: ((argb >> 8) & 0xFF) as f32 / 255.0,
            b: (argb & 0xFF) as f32 / 255.0,
        }
    }

    pub fn lerp(&self, end: &Color, t: f32) -> Color {
        Color {
            r: self.r + (end.r - self.r) * t,
            g: self.g + (end.g - self.g) * t,
            b: self.b + (end.b - self.b) * t,
            a: self.a + (end.a - self.a) * t,
        }
    }

    /*
    u32 RGB is 0xAARRGGBB in the framebuffer.

    red and blue don't overlap, so both get lerped in one go (& 0xFF00FF),
    green gets its own pass (& 0x00FF00), then OR them back together.
    The result is always opaque, alpha is handled by the caller.
    */
    pub fn lerp_u32(start: u32, end: u32, t: f32) -> u32 {
        let inv_t = 1.0 - t;
        let srb = start & 0xFF00FF;
        let sg = start & 0x00FF00;

        let erb = end & 0xFF00FF;
        let eg = end & 0x00FF00;

        let r = ((((srb >> 16) & 0xFF) as f32 * inv_t + ((erb >> 16) & 0xFF) as f32 * t) as u32)
            & 0xFF;
        let b = (((srb & 0xFF) as f32 * inv_t + (erb & 0xFF) as f32 * t) as u32) & 0xFF;
        let g = (((sg >> 8) as f32 * inv_t + (eg >> 8) as f32 * t) as u32) & 0xFF;

        0xFF00_0000 | (r << 16) | (g << 8) | b
    }

    /// Source-over compositing of an ARGB pixel onto an opaque destination.
    #[inline]
    pub fn blend_over(dst: u32, src: u32) -> u32 {
        match src >> 24 {
            0 => dst,
            0xFF => src,
            alpha => Self::lerp_u32(dst, src, alpha as f32 / 255.0),
        }
    }
}

// Predefined colors
impl Color {
    pub const TRANSPARENT: Color = Color::with_alpha(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Color::hex("000000");
    pub const LIGHT_GRAY: Color = Color::hex("D3D3D3");
    pub const DARK_GRAY: Color = Color::hex("363737");
    pub const GRAY: Color = Color::hex("808080");
    pub const WHITE: Color = Color::hex("FFFFFF");
    pub const RED: Color = Color::hex("FF0000");
    pub const GREEN: Color = Color::hex("00FF00");
    pub const BLUE: Color = Color::hex("0000FF");
    pub const YELLOW: Color = Color::hex("FFFF00");
    pub const CYAN: Color = Color::hex("00FFFF");
    pub const MAGENTA: Color = Color::hex("FF00FF");
    pub const ORANGE: Color = Color::hex("FFA500");
    pub const PURPLE: Color = Color::hex("800080");
    pub const NAVY: Color = Color::hex("000080");
    pub const TEAL: Color = Color::hex("008080");
    /// Debug overlay text color.
    pub const DEBUG_RED: Color = Color::hex("FA0505");
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}
