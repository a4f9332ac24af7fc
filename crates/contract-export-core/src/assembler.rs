//! PDF assembly with lopdf
//!
//! Pages are laid out in millimetres with a top-left origin and converted to
//! PDF user space (points, bottom-left origin) when drawn.

use crate::config::PageFormat;
use crate::error::ExportError;
use crate::pagination::paginate;
use crate::raster::{encode_jpeg, EncodedImage, RasterSnapshot};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

const POINTS_PER_MM: f64 = 72.0 / 25.4;

fn mm_to_pt(mm: f64) -> f32 {
    (mm * POINTS_PER_MM) as f32
}

/// Handle to an image registered with [`PdfAssembler::register_image`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHandle(usize);

struct PageContent {
    operations: Vec<Operation>,
    images: Vec<usize>,
}

impl PageContent {
    fn new() -> Self {
        Self {
            operations: Vec::new(),
            images: Vec::new(),
        }
    }
}

/// Builds a portrait document page by page.
///
/// The assembler starts with one empty page, like a fresh sheet of paper.
pub struct PdfAssembler {
    doc: Document,
    format: PageFormat,
    images: Vec<ObjectId>,
    pages: Vec<PageContent>,
}

impl PdfAssembler {
    pub fn new(format: PageFormat) -> Self {
        Self {
            doc: Document::with_version("1.5"),
            format,
            images: Vec::new(),
            pages: vec![PageContent::new()],
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Start a new page; later drawing goes there
    pub fn add_page(&mut self) {
        self.pages.push(PageContent::new());
    }

    /// Embed a JPEG once; the handle can be drawn on any number of pages
    pub fn register_image(&mut self, image: &EncodedImage) -> ImageHandle {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(image.width as i64));
        dict.set("Height", Object::Integer(image.height as i64));
        dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        dict.set("BitsPerComponent", Object::Integer(8));
        dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));

        // Already compressed; flate on top of DCT only costs time
        let stream = Stream::new(dict, image.data.clone()).with_compression(false);
        let id = self.doc.add_object(Object::Stream(stream));
        self.images.push(id);
        ImageHandle(self.images.len() - 1)
    }

    /// Draw an image on the current page.
    ///
    /// `x`/`y` locate the image's top-left corner in mm from the page's
    /// top-left corner; negative values shift it off the page.
    pub fn draw_image(
        &mut self,
        handle: ImageHandle,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), ExportError> {
        if handle.0 >= self.images.len() {
            return Err(ExportError::Assemble(format!(
                "unknown image handle {}",
                handle.0
            )));
        }
        let page_height = self.format.height_mm;
        let page = self
            .pages
            .last_mut()
            .ok_or_else(|| ExportError::Assemble("no page to draw on".into()))?;

        let bottom = page_height - (y + height);
        page.operations.push(Operation::new("q", vec![]));
        page.operations.push(Operation::new(
            "cm",
            vec![
                Object::Real(mm_to_pt(width)),
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(mm_to_pt(height)),
                Object::Real(mm_to_pt(x)),
                Object::Real(mm_to_pt(bottom)),
            ],
        ));
        page.operations.push(Operation::new(
            "Do",
            vec![Object::Name(image_name(handle.0).into_bytes())],
        ));
        page.operations.push(Operation::new("Q", vec![]));
        if !page.images.contains(&handle.0) {
            page.images.push(handle.0);
        }
        Ok(())
    }

    /// Build the page tree and serialize the document
    pub fn finish(mut self) -> Result<Vec<u8>, ExportError> {
        let pages_id = self.doc.new_object_id();
        let media_box = vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(mm_to_pt(self.format.width_mm)),
            Object::Real(mm_to_pt(self.format.height_mm)),
        ];

        let mut kids = Vec::with_capacity(self.pages.len());
        for page in std::mem::take(&mut self.pages) {
            let content = Content {
                operations: page.operations,
            };
            let bytes = content
                .encode()
                .map_err(|e| ExportError::Assemble(format!("Failed to encode content: {}", e)))?;
            let content_id = self
                .doc
                .add_object(Object::Stream(Stream::new(Dictionary::new(), bytes)));

            let mut xobjects = Dictionary::new();
            for index in page.images {
                xobjects.set(image_name(index), Object::Reference(self.images[index]));
            }
            let mut resources = Dictionary::new();
            resources.set("XObject", Object::Dictionary(xobjects));

            let mut page_dict = Dictionary::new();
            page_dict.set("Type", Object::Name(b"Page".to_vec()));
            page_dict.set("Parent", Object::Reference(pages_id));
            page_dict.set("MediaBox", Object::Array(media_box.clone()));
            page_dict.set("Contents", Object::Reference(content_id));
            page_dict.set("Resources", Object::Dictionary(resources));
            kids.push(Object::Reference(
                self.doc.add_object(Object::Dictionary(page_dict)),
            ));
        }

        let mut pages_dict = Dictionary::new();
        pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
        pages_dict.set("Count", Object::Integer(kids.len() as i64));
        pages_dict.set("Kids", Object::Array(kids));
        self.doc
            .objects
            .insert(pages_id, Object::Dictionary(pages_dict));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = self.doc.add_object(Object::Dictionary(catalog));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        self.doc.compress();

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| ExportError::Assemble(format!("Failed to save PDF: {}", e)))?;
        Ok(buffer)
    }
}

fn image_name(index: usize) -> String {
    format!("Im{}", index)
}

/// A serialized document and its page count
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Paginate a snapshot and assemble the full document.
///
/// The raster is encoded once and drawn on every page at that page's offset.
pub fn render_pdf(
    snapshot: &RasterSnapshot,
    format: &PageFormat,
    jpeg_quality: u8,
) -> Result<RenderedPdf, ExportError> {
    let slices = paginate(snapshot.width(), snapshot.height(), format)?;
    let image = encode_jpeg(snapshot, jpeg_quality)?;

    let mut pdf = PdfAssembler::new(*format);
    let handle = pdf.register_image(&image);
    for slice in &slices {
        if slice.index > 0 {
            pdf.add_page();
        }
        pdf.draw_image(
            handle,
            0.0,
            slice.offset_mm,
            slice.page_width_mm,
            slice.image_height_mm,
        )?;
    }
    let page_count = pdf.page_count();
    Ok(RenderedPdf {
        bytes: pdf.finish()?,
        page_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn snapshot(width: u32, height: u32) -> RasterSnapshot {
        RasterSnapshot::new(RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])))
    }

    fn page_contents(doc: &Document) -> Vec<String> {
        doc.get_pages()
            .values()
            .map(|&id| String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned())
            .collect()
    }

    #[test]
    fn test_empty_assembler_has_one_page() {
        let bytes = PdfAssembler::new(PageFormat::A4).finish().unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_media_box_is_a4_in_points() {
        let bytes = PdfAssembler::new(PageFormat::A4).finish().unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        let height = media_box[3].as_float().unwrap();
        assert!((height - 841.89).abs() < 0.01);
        let width = media_box[2].as_float().unwrap();
        assert!((width - 595.28).abs() < 0.01);
    }

    #[test]
    fn test_draw_rejects_unknown_handle() {
        let mut pdf = PdfAssembler::new(PageFormat::A4);
        let err = pdf.draw_image(ImageHandle(3), 0.0, 0.0, 10.0, 10.0);
        assert!(err.is_err());
    }

    #[test]
    fn test_render_pdf_page_count_follows_pagination() {
        // 21x65 px scales to 650 mm: three A4 pages
        let bytes = render_pdf(&snapshot(21, 65), &PageFormat::A4, 100)
            .unwrap()
            .bytes;
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
        for content in page_contents(&doc) {
            assert!(content.contains("/Im0 Do"));
        }
    }

    #[test]
    fn test_image_is_embedded_once() {
        let bytes = render_pdf(&snapshot(21, 65), &PageFormat::A4, 90)
            .unwrap()
            .bytes;
        let doc = Document::load_mem(&bytes).unwrap();
        let images = doc
            .objects
            .values()
            .filter(|obj| match obj {
                Object::Stream(s) => s
                    .dict
                    .get(b"Subtype")
                    .and_then(|o| o.as_name())
                    .map(|n| n == b"Image")
                    .unwrap_or(false),
                _ => false,
            })
            .count();
        assert_eq!(images, 1);
    }

    #[test]
    fn test_later_pages_shift_image_up() {
        let bytes = render_pdf(&snapshot(21, 65), &PageFormat::A4, 100)
            .unwrap()
            .bytes;
        let doc = Document::load_mem(&bytes).unwrap();
        let page_ids: Vec<_> = doc.get_pages().values().copied().collect();
        let ys: Vec<f32> = page_ids
            .iter()
            .map(|&id| {
                let content = Content::decode(&doc.get_page_content(id).unwrap()).unwrap();
                let cm = content
                    .operations
                    .iter()
                    .find(|op| op.operator == "cm")
                    .unwrap();
                cm.operands[5].as_float().unwrap()
            })
            .collect();
        // bottom = 297 - (offset + 650), in points
        let expected = [-353.0, -56.0, 241.0].map(|mm: f64| mm_to_pt(mm));
        for (y, e) in ys.iter().zip(expected.iter()) {
            assert!((y - e).abs() < 0.01, "{} vs {}", y, e);
        }
    }

    #[test]
    fn test_render_pdf_rejects_empty_snapshot() {
        assert!(render_pdf(&snapshot(0, 0), &PageFormat::A4, 100).is_err());
    }
}
