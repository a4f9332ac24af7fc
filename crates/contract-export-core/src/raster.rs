//! Raster snapshots and their JPEG encoding

use crate::error::ExportError;
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage, RgbaImage};

/// Pixels captured from the rendered contract, in device pixels.
#[derive(Debug, Clone)]
pub struct RasterSnapshot {
    image: RgbaImage,
}

impl RasterSnapshot {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Wrap a raw RGBA buffer (4 bytes per pixel, row-major)
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ExportError> {
        let len = pixels.len();
        RgbaImage::from_raw(width, height, pixels)
            .map(Self::new)
            .ok_or_else(|| {
                ExportError::Rasterize(format!(
                    "pixel buffer of {} bytes does not match {}x{} RGBA",
                    len, width, height
                ))
            })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

/// A JPEG ready to be embedded with `DCTDecode`
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Encode a snapshot as JPEG, flattening transparency onto white
pub fn encode_jpeg(snapshot: &RasterSnapshot, quality: u8) -> Result<EncodedImage, ExportError> {
    if snapshot.width() == 0 || snapshot.height() == 0 {
        return Err(ExportError::EmptyRaster {
            width: snapshot.width(),
            height: snapshot.height(),
        });
    }

    let rgb = flatten_on_white(snapshot.image());
    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, quality)
        .encode_image(&rgb)
        .map_err(|e| ExportError::Encode(e.to_string()))?;

    tracing::debug!(
        width = snapshot.width(),
        height = snapshot.height(),
        bytes = data.len(),
        "encoded raster as JPEG"
    );

    Ok(EncodedImage {
        width: snapshot.width(),
        height: snapshot.height(),
        data,
    })
}

fn flatten_on_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let blend = |c: u8| -> u8 {
            let a = a as u16;
            ((c as u16 * a + 255 * (255 - a)) / 255) as u8
        };
        Rgb([blend(r), blend(g), blend(b)])
    })
}
