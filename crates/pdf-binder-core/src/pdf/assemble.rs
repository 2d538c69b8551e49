//! Building the combined output document.
//!
//! The assembler walks the page sequence in order, imports each distinct
//! source once under non-colliding object ids, and hangs the selected pages
//! off a fresh page tree in exactly sequence order. Image sources are
//! converted to single-page documents first and then imported like any PDF.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

use super::convert::image_to_pdf_bytes;
use super::page_index::PageIndex;
use crate::cache::ReaderCache;
use crate::config::ConvertConfig;
use crate::error::{Error, Result};
use crate::page::{PageKind, PageRef, PageSequence};

/// Attributes a page may inherit from ancestor nodes of its source page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Upper bound on ancestor hops when resolving inherited attributes,
/// so a malformed Parent cycle cannot hang the walk.
const MAX_TREE_DEPTH: usize = 64;

/// One source document imported into the output under renumbered ids.
struct ImportedSource {
    /// 1-based page number to renumbered page object id
    page_ids: BTreeMap<u32, ObjectId>,
    /// Page dictionaries with inherited attributes pulled down
    page_dicts: HashMap<ObjectId, Dictionary>,
}

/// Build the combined document for a page sequence.
///
/// Sources are loaded through `readers` (PDFs) or converted on the fly
/// (images); each distinct path is imported exactly once no matter how many
/// of its pages appear. The resulting document still needs to be saved.
pub fn assemble_sequence(
    sequence: &PageSequence,
    readers: &ReaderCache,
    convert: ConvertConfig,
) -> Result<Document> {
    if sequence.is_empty() {
        return Err(Error::NothingToExport);
    }

    let mut output = Document::with_version("1.5");
    let mut max_id: u32 = 1;
    let mut imported: HashMap<PathBuf, ImportedSource> = HashMap::new();
    let mut placed: Vec<(ObjectId, Dictionary)> = Vec::with_capacity(sequence.len());
    let mut used_ids: HashSet<ObjectId> = HashSet::new();

    for page in sequence {
        let source = match imported.entry(page.source_path().to_path_buf()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let doc = load_source(page, readers, convert)?;
                entry.insert(import_objects(&mut output, &mut max_id, doc)?)
            }
        };

        let total = source.page_ids.len();
        let requested = page.page_index().unwrap_or(0);
        let index = PageIndex::try_from_page_num(requested, total)?;
        let page_id = source
            .page_ids
            .get(&index.as_page_number())
            .copied()
            .ok_or(Error::InvalidPage {
                page: requested,
                total,
            })?;
        let dict = source.page_dicts.get(&page_id).cloned().ok_or_else(|| {
            Error::Assemble(format!("missing page dictionary for {}", page.label()))
        })?;

        // A page node may hang off the tree only once; repeats of the same
        // source page get a shallow copy under a fresh id.
        let placed_id = if used_ids.insert(page_id) {
            page_id
        } else {
            let clone_id: ObjectId = (max_id, 0);
            max_id += 1;
            clone_id
        };
        placed.push((placed_id, dict));
    }

    let pages_id: ObjectId = (max_id, 0);
    let catalog_id: ObjectId = (max_id + 1, 0);
    max_id += 2;

    #[allow(clippy::cast_possible_truncation)]
    let total_pages = placed.len() as u32;

    let mut kids = Vec::with_capacity(placed.len());
    for (page_id, mut dict) in placed {
        dict.set("Parent", Object::Reference(pages_id));
        output.objects.insert(page_id, Object::Dictionary(dict));
        kids.push(Object::Reference(page_id));
    }

    output.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(i64::from(total_pages))),
        ])),
    );

    output.objects.insert(
        catalog_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ])),
    );
    output.trailer.set("Root", Object::Reference(catalog_id));

    output.max_id = max_id - 1;
    output.prune_objects();
    output.renumber_objects();
    output.compress();

    debug!(pages = total_pages, sources = imported.len(), "assembled output document");
    Ok(output)
}

/// Open a source as an editable document: PDFs via the reader cache,
/// images via on-the-fly conversion.
fn load_source(page: &PageRef, readers: &ReaderCache, convert: ConvertConfig) -> Result<Document> {
    match page.kind() {
        PageKind::Pdf => {
            let source = readers.get_or_open(page.source_path())?;
            source.load_document()
        }
        PageKind::Image => {
            let bytes = image_to_pdf_bytes(page.source_path(), convert.dpi)?;
            Document::load_mem(&bytes).map_err(|e| {
                Error::Assemble(format!(
                    "converted page for {} did not parse: {e}",
                    page.source_path().display()
                ))
            })
        }
    }
}

/// Copy a source document's objects into the output under fresh ids.
///
/// Page tree structure (Catalog, Pages, Page, outline nodes) stays behind;
/// the returned map carries fully resolved page dictionaries instead, ready
/// to be reparented.
fn import_objects(
    output: &mut Document,
    max_id: &mut u32,
    mut doc: Document,
) -> Result<ImportedSource> {
    doc.renumber_objects_with(*max_id);
    *max_id = doc.max_id + 1;

    let page_ids = doc.get_pages();
    let mut page_dicts = HashMap::with_capacity(page_ids.len());
    for &page_id in page_ids.values() {
        page_dicts.insert(page_id, resolved_page_dict(&doc, page_id)?);
    }

    for (object_id, object) in doc.objects {
        match object.type_name().unwrap_or(b"") {
            b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
            _ => {
                output.objects.insert(object_id, object);
            }
        }
    }

    Ok(ImportedSource {
        page_ids,
        page_dicts,
    })
}

/// Clone a page dictionary with inheritable attributes pulled down from its
/// ancestors. The ancestors themselves are not carried into the output, so
/// anything inherited has to become direct here.
fn resolved_page_dict(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let Ok(Object::Dictionary(dict)) = doc.get_object(page_id) else {
        return Err(Error::Assemble(format!(
            "page object {} is not a dictionary",
            page_id.0
        )));
    };

    let mut resolved = dict.clone();
    for key in INHERITABLE_KEYS {
        if !resolved.has(key)
            && let Some(value) = inherited_attribute(doc, dict, key)
        {
            resolved.set(key, value);
        }
    }
    resolved.remove(b"Parent");
    Ok(resolved)
}

/// Walk up the Parent chain looking for an inheritable attribute.
fn inherited_attribute(doc: &Document, page_dict: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page_dict.get(b"Parent").ok().cloned();
    for _ in 0..MAX_TREE_DEPTH {
        let Some(Object::Reference(parent_id)) = parent else {
            return None;
        };
        let Ok(Object::Dictionary(dict)) = doc.get_object(parent_id) else {
            return None;
        };
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        parent = dict.get(b"Parent").ok().cloned();
    }
    None
}

/// Append `.pdf` unless the path already ends with it (case-insensitively).
///
/// Other extensions are kept and suffixed, so `scan.txt` becomes
/// `scan.txt.pdf` rather than `scan.pdf`.
pub fn normalize_extension(path: &Path) -> PathBuf {
    let has_pdf_extension = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    if has_pdf_extension {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(".pdf");
        PathBuf::from(name)
    }
}

/// Save a document atomically: write to a sibling temp file, then rename
/// over the target so a failed export never leaves a truncated PDF behind.
pub fn save_document(document: &mut Document, path: &Path) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    let write_err = |e: std::io::Error| Error::WriteOutput {
        path: temp_path.clone(),
        reason: e.to_string(),
    };

    let file = File::create(&temp_path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    document.save_to(&mut writer).map_err(|e| Error::WriteOutput {
        path: temp_path.clone(),
        reason: e.to_string(),
    })?;
    writer.flush().map_err(write_err)?;

    std::fs::rename(&temp_path, path).map_err(|e| Error::WriteOutput {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_extension() {
        assert_eq!(
            normalize_extension(Path::new("out")),
            PathBuf::from("out.pdf")
        );
        assert_eq!(
            normalize_extension(Path::new("out.pdf")),
            PathBuf::from("out.pdf")
        );
        assert_eq!(
            normalize_extension(Path::new("OUT.PDF")),
            PathBuf::from("OUT.PDF")
        );
        assert_eq!(
            normalize_extension(Path::new("scan.txt")),
            PathBuf::from("scan.txt.pdf")
        );
    }

    #[test]
    fn test_assemble_rejects_empty_sequence() {
        let readers = ReaderCache::new(4);
        let result = assemble_sequence(&PageSequence::new(), &readers, ConvertConfig::default());
        assert!(matches!(result, Err(Error::NothingToExport)));
    }

    #[test]
    fn test_resolved_page_dict_pulls_inherited_attributes() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
        ]));

        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter([
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(vec![Object::Reference(page_id)])),
                ("Count", Object::Integer(1)),
                (
                    "MediaBox",
                    Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
                ),
                ("Rotate", Object::Integer(90)),
            ])),
        );

        let resolved = resolved_page_dict(&doc, page_id).unwrap();
        assert!(resolved.has(b"MediaBox"));
        assert_eq!(resolved.get(b"Rotate").unwrap().as_i64().unwrap(), 90);
        assert!(!resolved.has(b"Parent"));
    }

    #[test]
    fn test_direct_attributes_win_over_inherited() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Rotate", Object::Integer(180)),
        ]));

        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter([
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(vec![Object::Reference(page_id)])),
                ("Count", Object::Integer(1)),
                ("Rotate", Object::Integer(90)),
            ])),
        );

        let resolved = resolved_page_dict(&doc, page_id).unwrap();
        assert_eq!(resolved.get(b"Rotate").unwrap().as_i64().unwrap(), 180);
    }
}
