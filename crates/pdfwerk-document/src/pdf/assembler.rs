// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page assembler — build a new PDF by copying pages, one at a time, out of a
// source document. Used by both slicing operations.

use std::collections::HashMap;
use std::io::BufWriter;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};
use pdfwerk_core::error::{PdfwerkError, Result};
use tracing::{debug, info, instrument, warn};

use crate::pdf::reader::PdfReader;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against malformed, cyclic page trees.
const MAX_TREE_DEPTH: usize = 64;

/// A growing output document.
///
/// Pages are deep-copied together with everything they reference. Objects
/// shared between pages (fonts, images) are copied once per assembler. All
/// pages pushed into one assembler must come from the same source document.
pub struct PageAssembler {
    document: Document,
    /// The target's `/Pages` node.
    pages_id: ObjectId,
    /// Source object id → target object id.
    copied: HashMap<ObjectId, ObjectId>,
    page_count: usize,
}

impl Default for PageAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl PageAssembler {
    /// Start an empty document with a catalog and an empty page tree.
    pub fn new() -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Kids", Object::Array(Vec::new()));
        pages.set("Count", Object::Integer(0));
        document.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = document.add_object(catalog);
        document.trailer.set("Root", Object::Reference(catalog_id));

        Self {
            document,
            pages_id,
            copied: HashMap::new(),
            page_count: 0,
        }
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn is_empty(&self) -> bool {
        self.page_count == 0
    }

    /// Append page `page_number` (1-indexed) of `source` as the last page.
    #[instrument(skip(self, source))]
    pub fn push_page(&mut self, source: &PdfReader, page_number: u32) -> Result<()> {
        let page_id = source.page_id(page_number)?;
        let cloned_id = self.copy_page(source.document(), page_id)?;

        // Add page reference to the /Kids array and bump /Count.
        if let Ok(Object::Dictionary(pages_dict)) = self.document.get_object_mut(self.pages_id) {
            if let Ok(Object::Array(kids)) = pages_dict.get_mut(b"Kids") {
                kids.push(Object::Reference(cloned_id));
            }
            pages_dict.set("Count", Object::Integer(self.page_count as i64 + 1));
        }
        self.page_count += 1;

        debug!(page_number, pages = self.page_count, "Page appended");
        Ok(())
    }

    /// Serialise the document as it stands.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.document.save_to(&mut output).map_err(|err| {
            PdfwerkError::PdfError(format!("failed to serialise assembled PDF: {}", err))
        })?;
        Ok(output)
    }

    /// Write the document to `path`. Failures are output errors.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|err| {
            PdfwerkError::Output(format!("cannot create {}: {}", path.display(), err))
        })?;
        let mut writer = BufWriter::new(file);
        self.document.save_to(&mut writer).map_err(|err| {
            PdfwerkError::Output(format!("cannot write {}: {}", path.display(), err))
        })?;
        info!(pages = self.page_count, "Wrote {}", path.display());
        Ok(())
    }

    // -- Copying --------------------------------------------------------------

    /// Copy one page dictionary, materialising inherited attributes so the
    /// page renders the same outside its original page tree.
    fn copy_page(&mut self, source: &Document, page_id: ObjectId) -> Result<ObjectId> {
        let page = source.get_dictionary(page_id).map_err(|err| {
            PdfwerkError::PdfError(format!("cannot read page object {:?}: {}", page_id, err))
        })?;

        // Reserve the id first so back-references (e.g. an annotation's /P)
        // resolve to the copy instead of recursing into the page again.
        let new_id = self.document.new_object_id();
        self.copied.insert(page_id, new_id);

        let mut new_page = Dictionary::new();
        for (key, value) in page.iter() {
            if key == b"Parent" {
                continue;
            }
            let cloned_value = self.copy_object(source, value);
            new_page.set(key.clone(), cloned_value);
        }

        for key in INHERITABLE_KEYS {
            if page.has(key) {
                continue;
            }
            if let Some(inherited) = inherited_attribute(source, page, key) {
                let cloned_value = self.copy_object(source, &inherited);
                new_page.set(key.to_vec(), cloned_value);
            }
        }

        new_page.set("Parent", Object::Reference(self.pages_id));
        self.document
            .objects
            .insert(new_id, Object::Dictionary(new_page));
        Ok(new_id)
    }

    /// Deep-copy an object into the target, following references.
    ///
    /// `/Parent` entries are dropped, and references to pages or page-tree
    /// nodes that are not being copied become `null`, so copying one page
    /// never drags in the rest of the source document.
    fn copy_object(&mut self, source: &Document, object: &Object) -> Object {
        match object {
            Object::Reference(ref_id) => {
                if let Some(&mapped) = self.copied.get(ref_id) {
                    return Object::Reference(mapped);
                }
                let referenced = match source.get_object(*ref_id) {
                    Ok(referenced) => referenced,
                    Err(err) => {
                        warn!(?ref_id, %err, "Cannot resolve reference, using Null");
                        return Object::Null;
                    }
                };
                if is_page_tree_node(referenced) {
                    return Object::Null;
                }
                let new_id = self.document.new_object_id();
                self.copied.insert(*ref_id, new_id);
                let cloned = self.copy_object(source, referenced);
                self.document.objects.insert(new_id, cloned);
                Object::Reference(new_id)
            }
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(source, dict)),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.copy_object(source, item))
                    .collect(),
            ),
            Object::Stream(stream) => {
                let mut cloned = stream.clone();
                cloned.dict = self.copy_dictionary(source, &stream.dict);
                Object::Stream(cloned)
            }
            other => other.clone(),
        }
    }

    fn copy_dictionary(&mut self, source: &Document, dict: &Dictionary) -> Dictionary {
        let mut new_dict = Dictionary::new();
        for (key, value) in dict.iter() {
            if key == b"Parent" {
                continue;
            }
            let cloned_value = self.copy_object(source, value);
            new_dict.set(key.clone(), cloned_value);
        }
        new_dict
    }
}

/// Look `key` up on the ancestors of `page`.
fn inherited_attribute(source: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").ok()?.as_reference().ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        let node = source.get_dictionary(parent).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

fn is_page_tree_node(object: &Object) -> bool {
    let dict = match object {
        Object::Dictionary(dict) => dict,
        _ => return false,
    };
    matches!(
        dict.get(b"Type"),
        Ok(Object::Name(name)) if name.as_slice() == b"Page" || name.as_slice() == b"Pages"
    )
}
