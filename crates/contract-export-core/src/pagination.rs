//! Slicing a tall raster into fixed-height pages
//!
//! The raster is scaled to the page width and drawn whole on every page; each
//! page shifts it up so a different band is visible. Offsets follow the
//! accumulating scheme:
//!
//! ```text
//! remaining = image_height - page_height
//! while remaining > 0:
//!     offset = remaining - image_height
//!     remaining -= page_height
//! ```

use crate::config::PageFormat;
use crate::error::ExportError;

/// One page of the output document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSlice {
    /// Zero-based page index
    pub index: usize,
    /// Vertical draw offset of the image on this page (mm, <= 0)
    pub offset_mm: f64,
    pub page_width_mm: f64,
    pub page_height_mm: f64,
    /// Height of the whole scaled image (mm)
    pub image_height_mm: f64,
}

/// Height in mm of a raster scaled to the page width.
pub fn image_height_mm(
    raster_width: u32,
    raster_height: u32,
    format: &PageFormat,
) -> Result<f64, ExportError> {
    if raster_width == 0 || raster_height == 0 {
        return Err(ExportError::EmptyRaster {
            width: raster_width,
            height: raster_height,
        });
    }
    Ok(raster_height as f64 * format.width_mm / raster_width as f64)
}

/// Compute the ordered page slices for a raster of the given size.
pub fn paginate(
    raster_width: u32,
    raster_height: u32,
    format: &PageFormat,
) -> Result<Vec<PageSlice>, ExportError> {
    let image_height = image_height_mm(raster_width, raster_height, format)?;
    let slice = |index: usize, offset_mm: f64| PageSlice {
        index,
        offset_mm,
        page_width_mm: format.width_mm,
        page_height_mm: format.height_mm,
        image_height_mm: image_height,
    };

    let mut slices = vec![slice(0, 0.0)];
    let mut remaining = image_height - format.height_mm;

    while remaining > 0.0 {
        let offset = remaining - image_height;
        slices.push(slice(slices.len(), offset));
        remaining -= format.height_mm;
    }

    tracing::debug!(
        image_height_mm = image_height,
        pages = slices.len(),
        "paginated raster {}x{}",
        raster_width,
        raster_height
    );

    Ok(slices)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Page count matches ceil(image height / page height)
        #[test]
        fn page_count_is_ceiling(width in 100u32..4000, height in 1u32..40000) {
            let format = PageFormat::A4;
            let image_height = image_height_mm(width, height, &format).unwrap();
            let slices = paginate(width, height, &format).unwrap();
            let expected = (image_height / format.height_mm).ceil().max(1.0) as usize;
            // Floating error can only matter right at a page boundary
            prop_assert!((slices.len() as i64 - expected as i64).abs() <= 1);
            if (image_height / format.height_mm).fract() > 1e-6 {
                prop_assert_eq!(slices.len(), expected);
            }
        }

        /// First offset is zero and offsets step down by one page height
        #[test]
        fn offsets_step_by_page_height(width in 100u32..4000, height in 1u32..40000) {
            let slices = paginate(width, height, &PageFormat::A4).unwrap();
            prop_assert_eq!(slices[0].offset_mm, 0.0);
            for slice in &slices {
                let expected = -(slice.index as f64) * 297.0;
                prop_assert!((slice.offset_mm - expected).abs() < 1e-6);
                prop_assert!(slice.offset_mm <= 0.0);
            }
        }
    }
}
