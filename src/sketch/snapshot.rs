//! Rasterized snapshots of the stroke surface for the recognition service.
//!
//! A snapshot contains the raster layer only. Result annotations live as
//! structured state next to the surface and are never baked into the image,
//! so a re-submitted sketch is not polluted by its own previous answers.

use crate::sketch::model::Rgba;
use crate::sketch::raster::{blend_in_place, DirtyRect, RgbaBuffer};
use crate::sketch::surface::StrokeSurface;
use base64::{engine::general_purpose, Engine as _};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};

pub const PNG_MIME_TYPE: &str = "image/png";

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot region {0:?} does not intersect the surface")]
    EmptyRegion(DirtyRect),
    #[error("surface has no pixels to capture")]
    EmptySurface,
    #[error("encode snapshot as png: {0}")]
    Encode(#[from] image::ImageError),
}

/// Encoded image ready to be embedded in a recognition request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn mime_type(&self) -> &'static str {
        PNG_MIME_TYPE
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", PNG_MIME_TYPE, self.to_base64())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnapshotEncoder {
    background: Option<Rgba>,
}

impl SnapshotEncoder {
    /// Keeps erased and untouched pixels transparent.
    pub fn transparent() -> Self {
        Self { background: None }
    }

    /// Composites the raster over an opaque background before encoding.
    pub fn flattened(background: Rgba) -> Self {
        Self {
            background: Some(background),
        }
    }

    pub fn background(&self) -> Option<Rgba> {
        self.background
    }

    pub fn capture(&self, surface: &StrokeSurface) -> Result<ImagePayload, SnapshotError> {
        self.encode(self.flatten(surface.raster()))
    }

    pub fn capture_region(
        &self,
        surface: &StrokeSurface,
        region: DirtyRect,
    ) -> Result<ImagePayload, SnapshotError> {
        let cropped = surface
            .raster()
            .crop(region)
            .ok_or(SnapshotError::EmptyRegion(region))?;
        self.encode(self.flatten(&cropped))
    }

    pub fn flatten(&self, raster: &RgbaBuffer) -> RgbaBuffer {
        match self.background {
            Some(background) => {
                let mut output = RgbaBuffer::new(raster.width, raster.height, background);
                blend_in_place(&mut output, raster);
                output
            }
            None => raster.clone(),
        }
    }

    fn encode(&self, buffer: RgbaBuffer) -> Result<ImagePayload, SnapshotError> {
        if buffer.width == 0 || buffer.height == 0 {
            return Err(SnapshotError::EmptySurface);
        }
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes).write_image(
            &buffer.pixels,
            buffer.width,
            buffer.height,
            ColorType::Rgba8,
        )?;
        Ok(ImagePayload {
            width: buffer.width,
            height: buffer.height,
            bytes,
        })
    }
}
