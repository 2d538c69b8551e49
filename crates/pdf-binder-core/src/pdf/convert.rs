//! Image-to-page conversion.
//!
//! Turns a raster image file into a one-page PDF whose page is sized so the
//! image prints at the configured DPI. Pixels are embedded losslessly
//! (FlateDecode over raw RGB rows); transparency is flattened onto white
//! first, since PDF pages have no alpha.

use std::io::Write;
use std::path::Path;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::{DynamicImage, RgbImage};
use lopdf::{Dictionary, Document, Object, Stream};

use crate::error::{Error, Result};

/// Default user space unit: 1/72 inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Convert an image file into the bytes of a single-page PDF.
///
/// The page's MediaBox is `pixels * 72 / dpi` points per axis, so the
/// image fills the page edge to edge.
pub fn image_to_pdf_bytes(path: &Path, dpi: f32) -> Result<Vec<u8>> {
    let decoded = image::open(path).map_err(|e| Error::ImageDecode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let rgb = flatten_to_rgb(&decoded);
    encode_single_page(&rgb, dpi)
}

/// Flatten any color mode to opaque 8-bit RGB.
///
/// Alpha is composited over white; grayscale and paletted images expand
/// through the decoder's RGB view.
pub(crate) fn flatten_to_rgb(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut flat = RgbImage::new(width, height);

    for (src, dst) in rgba.pixels().zip(flat.pixels_mut()) {
        let alpha = u32::from(src[3]);
        for channel in 0..3 {
            let blended = u32::from(src[channel]) * alpha + 255 * (255 - alpha);
            // Rounded division; the numerator is bounded by 255 * 255
            #[allow(clippy::cast_possible_truncation)]
            {
                dst[channel] = ((blended + 127) / 255) as u8;
            }
        }
    }

    flat
}

/// Build the one-page document around a flattened RGB bitmap.
#[allow(clippy::cast_precision_loss)]
fn encode_single_page(rgb: &RgbImage, dpi: f32) -> Result<Vec<u8>> {
    let (width, height) = rgb.dimensions();
    let width_pt = width as f32 * POINTS_PER_INCH / dpi;
    let height_pt = height as f32 * POINTS_PER_INCH / dpi;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(rgb.as_raw())?;
    let compressed = encoder.finish()?;

    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();

    let mut image_dict = Dictionary::new();
    image_dict.set("Type", Object::Name(b"XObject".to_vec()));
    image_dict.set("Subtype", Object::Name(b"Image".to_vec()));
    image_dict.set("Width", Object::Integer(i64::from(width)));
    image_dict.set("Height", Object::Integer(i64::from(height)));
    image_dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
    image_dict.set("BitsPerComponent", Object::Integer(8));
    image_dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
    let image_id = document.add_object(Stream::new(image_dict, compressed));

    let resources_id = document.add_object(Dictionary::from_iter([(
        "XObject",
        Object::Dictionary(Dictionary::from_iter([(
            "Im0",
            Object::Reference(image_id),
        )])),
    )]));

    // Scale the unit image square up to the page, then paint
    let operations = format!("q\n{width_pt} 0 0 {height_pt} 0 0 cm\n/Im0 Do\nQ");
    let content_id = document.add_object(Stream::new(Dictionary::new(), operations.into_bytes()));

    let page_id = document.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        ("Contents", Object::Reference(content_id)),
        ("Resources", Object::Reference(resources_id)),
        (
            "MediaBox",
            Object::Array(vec![
                0.into(),
                0.into(),
                width_pt.into(),
                height_pt.into(),
            ]),
        ),
    ]));

    document.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(vec![Object::Reference(page_id)])),
            ("Count", Object::Integer(1)),
        ])),
    );

    let catalog_id = document.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    document.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    document
        .save_to(&mut bytes)
        .map_err(|e| Error::Assemble(format!("failed to serialize converted page: {e}")))?;
    Ok(bytes)
}
