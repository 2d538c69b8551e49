//! Integration tests for pdf-binder-core
//!
//! These tests verify the end-to-end workflow:
//! - Adding PDF and image files to the sequence
//! - Reordering and removing pages
//! - Thumbnail rendering and caching
//! - Exporting the combined document

#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};
use pdf_binder_core::{Error, PageAssembler, PageRef};
use tempfile::TempDir;

// =============================================================================
// Test Fixtures
// =============================================================================

/// Build a PDF with one page per entry in `page_texts`.
fn test_pdf_bytes(page_texts: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let page_tree_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let resources_id = doc.add_object(Dictionary::from_iter([(
        "Font",
        Object::Dictionary(Dictionary::from_iter([(
            "F1",
            Object::Reference(font_id),
        )])),
    )]));

    let mut kids = Vec::with_capacity(page_texts.len());
    for text in page_texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().unwrap_or_default(),
        ));

        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(page_tree_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
            ),
        ]));
        kids.push(Object::Reference(page_id));
    }

    #[allow(clippy::cast_possible_wrap)]
    let count = page_texts.len() as i64;
    doc.objects.insert(
        page_tree_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ])),
    );

    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(page_tree_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output).unwrap();
    output
}

/// Build a one-page PDF whose page inherits Resources and MediaBox from
/// the page tree node instead of carrying them directly.
fn inheriting_pdf_bytes() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let page_tree_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![100.into(), 200.into()]),
            Operation::new("Tj", vec![Object::string_literal("Inherited")]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        Dictionary::new(),
        content.encode().unwrap_or_default(),
    ));

    let page_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(page_tree_id)),
        ("Contents", Object::Reference(content_id)),
    ]));

    doc.objects.insert(
        page_tree_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(vec![Object::Reference(page_id)])),
            ("Count", Object::Integer(1)),
            (
                "Resources",
                Object::Dictionary(Dictionary::from_iter([(
                    "Font",
                    Object::Dictionary(Dictionary::from_iter([(
                        "F1",
                        Object::Reference(font_id),
                    )])),
                )])),
            ),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), 500.into(), 400.into()]),
            ),
        ])),
    );

    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(page_tree_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output).unwrap();
    output
}

fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn write_test_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(width, height, Rgb([200, 30, 30]))
        .save(&path)
        .unwrap();
    path
}

fn as_f32(object: &Object) -> f32 {
    match object {
        Object::Integer(i) => {
            #[allow(clippy::cast_precision_loss)]
            {
                *i as f32
            }
        }
        Object::Real(r) => *r,
        other => panic!("expected number, got {other:?}"),
    }
}

/// MediaBox (width, height) of the 1-based page `page_num` in an exported file.
fn media_box_size(path: &Path, page_num: u32) -> (f32, f32) {
    let doc = Document::load(path).unwrap();
    let pages = doc.get_pages();
    let page = doc.get_object(pages[&page_num]).unwrap().as_dict().unwrap();
    let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
    (
        as_f32(&media_box[2]) - as_f32(&media_box[0]),
        as_f32(&media_box[3]) - as_f32(&media_box[1]),
    )
}

fn exported_page_count(path: &Path) -> usize {
    Document::load(path).unwrap().get_pages().len()
}

// =============================================================================
// Adding Files
// =============================================================================

#[test]
fn test_add_pdf_expands_to_page_refs() {
    let dir = TempDir::new().unwrap();
    let pdf = write_file(dir.path(), "doc.pdf", &test_pdf_bytes(&["One", "Two", "Three"]));

    let mut assembler = PageAssembler::default();
    let report = assembler.add_files(std::slice::from_ref(&pdf));

    assert!(report.is_clean());
    assert_eq!(report.added.len(), 3);
    assert_eq!(assembler.pages()[0], PageRef::pdf_page(&pdf, 0));
    assert_eq!(assembler.pages()[2], PageRef::pdf_page(&pdf, 2));
    assert_eq!(assembler.status(), "Total pages: 3");
}

#[test]
fn test_add_image_yields_single_ref() {
    let dir = TempDir::new().unwrap();
    let png = write_test_png(dir.path(), "photo.png", 40, 30);

    let mut assembler = PageAssembler::default();
    let report = assembler.add_files(std::slice::from_ref(&png));

    assert_eq!(report.added, vec![PageRef::image(&png)]);
    assert_eq!(assembler.len(), 1);
}

#[test]
fn test_unsupported_and_missing_paths_are_skipped() {
    let dir = TempDir::new().unwrap();
    let text_file = write_file(dir.path(), "notes.txt", b"hello");
    let missing = dir.path().join("not-there.pdf");

    let mut assembler = PageAssembler::default();
    let report = assembler.add_files(&[text_file, missing]);

    assert!(report.added.is_empty());
    assert!(report.failures.is_empty());
    assert!(assembler.is_empty());
}

#[test]
fn test_corrupt_pdf_is_reported_and_batch_continues() {
    let dir = TempDir::new().unwrap();
    let corrupt = write_file(dir.path(), "broken.pdf", b"this is not a pdf");
    let good = write_file(dir.path(), "good.pdf", &test_pdf_bytes(&["Fine"]));

    let mut assembler = PageAssembler::default();
    let report = assembler.add_files(&[corrupt.clone(), good.clone()]);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, corrupt);
    assert!(matches!(report.failures[0].1, Error::UnreadablePdf { .. }));

    // The good file still made it in
    assert_eq!(assembler.pages(), [PageRef::pdf_page(&good, 0)].as_slice());
}

// =============================================================================
// Export
// =============================================================================

#[test]
fn test_export_combines_in_sequence_order() {
    let dir = TempDir::new().unwrap();
    let png = write_test_png(dir.path(), "photo.png", 800, 600);
    let pdf = write_file(dir.path(), "doc.pdf", &test_pdf_bytes(&["One", "Two"]));

    let mut assembler = PageAssembler::default();
    assembler.add_files(&[png, pdf]);

    let out = assembler.export(dir.path().join("combined.pdf")).unwrap();
    assert_eq!(exported_page_count(&out), 3);

    // Image page first: 800x600 px at 300 DPI is 192x144 points
    let (width, height) = media_box_size(&out, 1);
    assert!((width - 192.0).abs() < 0.01, "got width {width}");
    assert!((height - 144.0).abs() < 0.01, "got height {height}");

    // PDF pages follow at their original size
    let (width, height) = media_box_size(&out, 2);
    assert!((width - 612.0).abs() < 0.01, "got width {width}");
    assert!((height - 792.0).abs() < 0.01, "got height {height}");
}

#[test]
fn test_reorder_changes_export_order() {
    let dir = TempDir::new().unwrap();
    let png = write_test_png(dir.path(), "photo.png", 800, 600);
    let pdf = write_file(dir.path(), "doc.pdf", &test_pdf_bytes(&["One", "Two"]));

    let mut assembler = PageAssembler::default();
    assembler.add_files(&[png, pdf]);

    // Image from the front to the back
    assembler.move_page(0, 2).unwrap();

    let out = assembler.export(dir.path().join("reordered.pdf")).unwrap();
    assert_eq!(exported_page_count(&out), 3);

    let (width, _) = media_box_size(&out, 1);
    assert!((width - 612.0).abs() < 0.01, "expected PDF page first, width {width}");
    let (width, _) = media_box_size(&out, 3);
    assert!((width - 192.0).abs() < 0.01, "expected image page last, width {width}");
}

#[test]
fn test_remove_page_shrinks_export() {
    let dir = TempDir::new().unwrap();
    let pdf = write_file(dir.path(), "doc.pdf", &test_pdf_bytes(&["One", "Two", "Three"]));

    let mut assembler = PageAssembler::default();
    assembler.add_files(&[pdf.clone()]);
    let removed = assembler.remove_page(1).unwrap();
    assert_eq!(removed, PageRef::pdf_page(&pdf, 1));

    let out = assembler.export(dir.path().join("trimmed.pdf")).unwrap();
    assert_eq!(exported_page_count(&out), 2);
}

#[test]
fn test_duplicate_pages_export_twice() {
    let dir = TempDir::new().unwrap();
    let pdf = write_file(dir.path(), "doc.pdf", &test_pdf_bytes(&["Only"]));

    let mut assembler = PageAssembler::default();
    assembler.add_files(&[pdf.clone(), pdf]);

    assert_eq!(assembler.len(), 2);
    let out = assembler.export(dir.path().join("doubled.pdf")).unwrap();
    assert_eq!(exported_page_count(&out), 2);
}

#[test]
fn test_export_empty_sequence_fails_before_touching_disk() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("never.pdf");

    let assembler = PageAssembler::default();
    let result = assembler.export(&target);

    assert!(matches!(result, Err(Error::NothingToExport)));
    assert!(!target.exists());
}

#[test]
fn test_export_appends_pdf_extension() {
    let dir = TempDir::new().unwrap();
    let pdf = write_file(dir.path(), "doc.pdf", &test_pdf_bytes(&["One"]));

    let mut assembler = PageAssembler::default();
    assembler.add_files(&[pdf]);

    let out = assembler.export(dir.path().join("result")).unwrap();
    assert_eq!(out, dir.path().join("result.pdf"));
    assert!(out.exists());
    assert!(!dir.path().join("result").exists());
}

#[test]
fn test_export_leaves_no_temp_file() {
    let dir = TempDir::new().unwrap();
    let pdf = write_file(dir.path(), "doc.pdf", &test_pdf_bytes(&["One"]));

    let mut assembler = PageAssembler::default();
    assembler.add_files(&[pdf]);

    let out = assembler.export(dir.path().join("combined.pdf")).unwrap();
    assert!(out.exists());
    assert!(!dir.path().join("combined.tmp").exists());
}

#[test]
fn test_export_resolves_inherited_attributes() {
    let dir = TempDir::new().unwrap();
    let pdf = write_file(dir.path(), "inherit.pdf", &inheriting_pdf_bytes());

    let mut assembler = PageAssembler::default();
    let report = assembler.add_files(&[pdf]);
    assert!(report.is_clean());

    let out = assembler.export(dir.path().join("resolved.pdf")).unwrap();

    // The inherited MediaBox must become direct on the exported page
    let (width, height) = media_box_size(&out, 1);
    assert!((width - 500.0).abs() < 0.01, "got width {width}");
    assert!((height - 400.0).abs() < 0.01, "got height {height}");

    // And the inherited Resources too, or the text would not render
    let doc = Document::load(&out).unwrap();
    let pages = doc.get_pages();
    let page = doc.get_object(pages[&1]).unwrap().as_dict().unwrap();
    assert!(page.has(b"Resources"));
}

#[test]
fn test_exported_file_reopens_as_source() {
    let dir = TempDir::new().unwrap();
    let png = write_test_png(dir.path(), "photo.png", 100, 100);
    let pdf = write_file(dir.path(), "doc.pdf", &test_pdf_bytes(&["One"]));

    let mut assembler = PageAssembler::default();
    assembler.add_files(&[png, pdf]);
    let out = assembler.export(dir.path().join("first.pdf")).unwrap();

    // The output must itself be a usable input
    let mut second = PageAssembler::default();
    let report = second.add_files(std::slice::from_ref(&out));
    assert!(report.is_clean());
    assert_eq!(second.len(), 2);
}

// =============================================================================
// Thumbnails
// =============================================================================

#[test]
fn test_image_thumbnail_fits_box() {
    let dir = TempDir::new().unwrap();
    let png = write_test_png(dir.path(), "photo.png", 800, 600);

    let assembler = PageAssembler::default();
    let thumb = assembler.thumbnail(&PageRef::image(&png));

    assert_eq!(thumb.dimensions(), (180, 135));
}

#[test]
fn test_pdf_thumbnail_fits_box() {
    let dir = TempDir::new().unwrap();
    let pdf = write_file(dir.path(), "doc.pdf", &test_pdf_bytes(&["One"]));

    let assembler = PageAssembler::default();
    let thumb = assembler.thumbnail(&PageRef::pdf_page(&pdf, 0));

    // A 612x792pt page is width-limited in a 180x240 box
    assert_eq!(thumb.width(), 180);
    assert!(thumb.height() <= 240 && thumb.height() >= 225, "height {}", thumb.height());
}

#[test]
fn test_thumbnail_repeat_requests_hit_cache() {
    let dir = TempDir::new().unwrap();
    let png = write_test_png(dir.path(), "photo.png", 64, 64);

    let assembler = PageAssembler::default();
    let page = PageRef::image(&png);

    let first = assembler.thumbnail(&page);
    let second = assembler.thumbnail(&page);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_out_of_range_pdf_page_previews_first_page() {
    let dir = TempDir::new().unwrap();
    let pdf = write_file(dir.path(), "doc.pdf", &test_pdf_bytes(&["Only"]));

    let assembler = PageAssembler::default();
    // Page 7 does not exist; the preview falls back to page 0
    let thumb = assembler.thumbnail(&PageRef::pdf_page(&pdf, 7));

    assert_eq!(thumb.width(), 180);
}

#[test]
fn test_stale_page_ref_fails_export() {
    let dir = TempDir::new().unwrap();
    let pdf = write_file(dir.path(), "doc.pdf", &test_pdf_bytes(&["One", "Two", "Three"]));

    let mut assembler = PageAssembler::default();
    assembler.add_files(&[pdf.clone()]);
    assert_eq!(assembler.len(), 3);

    // The source shrinks on disk after it was added; once the cached
    // reader is dropped, refs to the vanished pages are stale
    std::fs::write(&pdf, test_pdf_bytes(&["Only"])).unwrap();
    assembler.clear_caches();

    let target = dir.path().join("stale.pdf");
    let result = assembler.export(&target);

    assert!(matches!(result, Err(Error::InvalidPage { page: 1, total: 1 })));
    assert!(!target.exists());
}
