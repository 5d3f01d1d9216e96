//! Single-page A4 PDF with the code centered in a fixed box

use image::RgbaImage;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use tracing::debug;

use super::{DocumentWriter, ExportError};
use crate::constants::export::{PDF_IMAGE_MM, PDF_PAGE_HEIGHT_PT, PDF_PAGE_WIDTH_PT, PT_PER_MM};

/// Image placement on the page in points, origin bottom-left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Fit `width × height` inside the square box, centered on the page
pub fn place(width: u32, height: u32) -> Placement {
    let box_pt = PDF_IMAGE_MM * PT_PER_MM;
    let scale = box_pt / width.max(height).max(1) as f32;
    let (w, h) = (width as f32 * scale, height as f32 * scale);
    Placement {
        x: (PDF_PAGE_WIDTH_PT - w) / 2.0,
        y: (PDF_PAGE_HEIGHT_PT - h) / 2.0,
        width: w,
        height: h,
    }
}

/// RGB samples with alpha flattened onto white paper
fn flatten_rgb(image: &RgbaImage) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(image.width() as usize * image.height() as usize * 3);
    for px in image.pixels() {
        let [r, g, b, a] = px.0;
        let a = a as u32;
        for c in [r, g, b] {
            rgb.push(((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8);
        }
    }
    rgb
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfWriter;

impl DocumentWriter for PdfWriter {
    fn single_image_page(&self, image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ExportError::Document("image is empty".into()));
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let xobject = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width() as i64,
                "Height" => image.height() as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            flatten_rgb(image),
        );
        let image_id = doc.add_object(xobject);

        let at = place(image.width(), image.height());
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        at.width.into(),
                        0.0f32.into(),
                        0.0f32.into(),
                        at.height.into(),
                        at.x.into(),
                        at.y.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|err| ExportError::Document(err.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
            "MediaBox" => vec![
                0.0f32.into(),
                0.0f32.into(),
                PDF_PAGE_WIDTH_PT.into(),
                PDF_PAGE_HEIGHT_PT.into(),
            ],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|err| ExportError::Document(err.to_string()))?;
        debug!(bytes = bytes.len(), width = at.width, height = at.height, "Built PDF page");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_fills_box_centered() {
        let at = place(1000, 1000);
        let box_pt = 75.0 * 72.0 / 25.4;
        assert!((at.width - box_pt).abs() < 0.01);
        assert!((at.height - box_pt).abs() < 0.01);
        assert!((at.x + at.width / 2.0 - PDF_PAGE_WIDTH_PT / 2.0).abs() < 0.01);
        assert!((at.y + at.height / 2.0 - PDF_PAGE_HEIGHT_PT / 2.0).abs() < 0.01);
    }

    #[test]
    fn test_labelled_image_keeps_aspect() {
        let at = place(1000, 1100);
        assert!(at.height > at.width);
        assert!((at.width / at.height - 1000.0 / 1100.0).abs() < 1e-4);
    }

    #[test]
    fn test_flatten_onto_white() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(1, 0, image::Rgba([0, 0, 0, 255]));
        assert_eq!(flatten_rgb(&img), vec![255, 255, 255, 0, 0, 0]);
    }

    #[test]
    fn test_writes_one_page_pdf() {
        let img = RgbaImage::from_pixel(8, 8, image::Rgba([10, 20, 30, 255]));
        let bytes = PdfWriter.single_image_page(&img).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let err = PdfWriter.single_image_page(&RgbaImage::new(0, 0)).unwrap_err();
        assert!(matches!(err, ExportError::Document(_)));
    }
}
