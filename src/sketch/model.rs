use serde::{Deserialize, Serialize};

/// Surface-local pixel coordinate.
pub type Point = (i32, i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_slice(px: &[u8]) -> Self {
        Self::rgba(px[0], px[1], px[2], px[3])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaintMode {
    #[default]
    Ink,
    Erase,
}

impl PaintMode {
    pub fn toggled(self) -> Self {
        match self {
            PaintMode::Ink => PaintMode::Erase,
            PaintMode::Erase => PaintMode::Ink,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokeConfig {
    ink_width: u32,
    erase_width: u32,
}

impl StrokeConfig {
    pub const DEFAULT_INK_WIDTH: u32 = 3;
    pub const DEFAULT_ERASE_WIDTH: u32 = 15;

    /// Widths are clamped to at least one pixel.
    pub fn new(ink_width: u32, erase_width: u32) -> Self {
        Self {
            ink_width: ink_width.max(1),
            erase_width: erase_width.max(1),
        }
    }

    pub fn ink_width(self) -> u32 {
        self.ink_width
    }

    pub fn erase_width(self) -> u32 {
        self.erase_width
    }
}

impl Default for StrokeConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INK_WIDTH, Self::DEFAULT_ERASE_WIDTH)
    }
}

/// Light/dark mode as reported by the host's theming layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn ink_color(self) -> Rgba {
        match self {
            Theme::Light => Rgba::BLACK,
            Theme::Dark => Rgba::WHITE,
        }
    }

    pub fn background_color(self) -> Rgba {
        match self {
            Theme::Light => Rgba::WHITE,
            Theme::Dark => Rgba::BLACK,
        }
    }
}
