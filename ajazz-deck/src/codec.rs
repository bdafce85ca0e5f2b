//! Key image conversion
//!
//! Key images go over the wire as JPEG. The panel mounts its key displays
//! rotated, so every image is transformed before encoding.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::DeckError;

/// Default JPEG quality for key images
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Orientation fix applied before encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageTransform {
    None,
    FlipHorizontal,
    FlipVertical,
    #[default]
    Rotate180,
    Rotate90,
    Rotate270,
}

impl ImageTransform {
    pub fn apply(self, image: &DynamicImage) -> DynamicImage {
        match self {
            ImageTransform::None => image.clone(),
            ImageTransform::FlipHorizontal => image.fliph(),
            ImageTransform::FlipVertical => image.flipv(),
            ImageTransform::Rotate180 => image.rotate180(),
            ImageTransform::Rotate90 => image.rotate90(),
            ImageTransform::Rotate270 => image.rotate270(),
        }
    }
}

/// Converts caller images into the bytes a BAT upload carries
pub trait ImageCodec: Send + Sync {
    /// Orient the image for the panel
    fn flip(&self, image: &DynamicImage) -> DynamicImage;

    /// Encode an already oriented image
    fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>, DeckError>;
}

/// JPEG encoding via the `image` crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegCodec {
    pub quality: u8,
    pub transform: ImageTransform,
}

impl Default for JpegCodec {
    fn default() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
            transform: ImageTransform::default(),
        }
    }
}

impl JpegCodec {
    pub fn new(quality: u8, transform: ImageTransform) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            transform,
        }
    }
}

impl ImageCodec for JpegCodec {
    fn flip(&self, image: &DynamicImage) -> DynamicImage {
        self.transform.apply(image)
    }

    fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>, DeckError> {
        let rgb = image.to_rgb8();
        let mut out = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut out, self.quality).encode_image(&rgb)?;
        Ok(out.into_inner())
    }
}

/// Solid black key image
pub fn black(pixels: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(pixels, pixels, Rgb([0, 0, 0])))
}

/// Scale an arbitrary picture to a square key image
pub fn fit_key(image: &DynamicImage, pixels: u32) -> DynamicImage {
    if image.dimensions() == (pixels, pixels) {
        return image.clone();
    }
    image.resize_exact(pixels, pixels, FilterType::Lanczos3)
}

/// Scale an arbitrary picture to the logo screen and return raw RGB bytes
pub fn logo_rgb(image: &DynamicImage, width: u32, height: u32) -> Vec<u8> {
    image
        .resize_exact(width, height, FilterType::Lanczos3)
        .to_rgb8()
        .into_raw()
}
