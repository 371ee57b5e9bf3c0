//! Document assembly backends
//!
//! The assembly pipeline drives an [`AssemblyBackend`] one page at a time.
//! [`LopdfBackend`] implements it on top of `lopdf` by deep-copying each
//! requested page (and everything it references) into a fresh document.

use crate::constants::OUTPUT_PDF_VERSION;
use crate::types::*;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Options for opening a source document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Accept encrypted documents instead of rejecting them
    pub ignore_encryption: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            ignore_encryption: true,
        }
    }
}

/// Builds an output document from pages of source documents.
///
/// Methods are synchronous and may be slow; the pipeline runs them on the
/// blocking thread pool, moving sources and output in and out of each call,
/// which is why everything must be `Send + 'static`.
pub trait AssemblyBackend: Clone + Send + Sync + 'static {
    type Source: Send + 'static;
    type Output: Send + 'static;
    type PageToken: Send + 'static;

    /// Start a new, empty output document
    fn create_empty(&self) -> Result<Self::Output>;

    /// Parse source bytes
    fn load_source(&self, bytes: &[u8], options: LoadOptions) -> Result<Self::Source>;

    /// Copy page `page_number` (1-based) of `source` into `output`'s object space
    fn copy_page(
        &self,
        output: &mut Self::Output,
        source: &Self::Source,
        page_number: u32,
    ) -> Result<Self::PageToken>;

    /// Append a copied page to the end of the output page order
    fn append(&self, output: &mut Self::Output, page: Self::PageToken) -> Result<()>;

    /// Finish and encode the output document
    fn serialize(&self, output: Self::Output) -> Result<Vec<u8>>;
}

// =============================================================================
// lopdf backend
// =============================================================================

/// Keys a page may inherit from its ancestors in the page tree
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against malformed, cyclic page trees
const MAX_PAGE_TREE_DEPTH: usize = 64;

static NEXT_SOURCE_KEY: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfBackend;

/// A parsed source document
pub struct LopdfSource {
    /// Distinguishes sources in the output's copy caches
    key: u64,
    doc: Document,
}

impl LopdfSource {
    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }
}

/// An output document under construction
pub struct LopdfOutput {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    /// Source object id -> output object id, per source
    copied: HashMap<u64, HashMap<ObjectId, ObjectId>>,
}

impl LopdfOutput {
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }
}

impl AssemblyBackend for LopdfBackend {
    type Source = LopdfSource;
    type Output = LopdfOutput;
    type PageToken = ObjectId;

    fn create_empty(&self) -> Result<LopdfOutput> {
        let mut doc = Document::with_version(OUTPUT_PDF_VERSION);
        let pages_id = doc.new_object_id();
        Ok(LopdfOutput {
            doc,
            pages_id,
            kids: Vec::new(),
            copied: HashMap::new(),
        })
    }

    fn load_source(&self, bytes: &[u8], options: LoadOptions) -> Result<LopdfSource> {
        let doc = Document::load_mem(bytes)?;

        if doc.trailer.get(b"Encrypt").is_ok() && !options.ignore_encryption {
            return Err(ArrangeError::LoadFailure(
                "document is encrypted".to_string(),
            ));
        }

        Ok(LopdfSource {
            key: NEXT_SOURCE_KEY.fetch_add(1, Ordering::SeqCst),
            doc,
        })
    }

    fn copy_page(
        &self,
        output: &mut LopdfOutput,
        source: &LopdfSource,
        page_number: u32,
    ) -> Result<ObjectId> {
        let pages = source.doc.get_pages();
        let page_id = *pages.get(&page_number).ok_or(InvariantViolation::IndexOutOfRange {
            index: page_number as usize,
            len: pages.len(),
        })?;

        let mut page = source.doc.get_dictionary(page_id)?.clone();
        for key in INHERITABLE_KEYS {
            if !page.has(key) {
                if let Some(value) = inherited_attribute(&source.doc, &page, key) {
                    page.set(key.to_vec(), value);
                }
            }
        }
        page.remove(b"Parent");

        let cache = output.copied.entry(source.key).or_default();
        let new_page_id = output.doc.new_object_id();
        cache.insert(page_id, new_page_id);

        let mut copied = copy_dictionary(&mut output.doc, &source.doc, &page, cache)?;
        copied.set("Parent", Object::Reference(output.pages_id));
        output
            .doc
            .objects
            .insert(new_page_id, Object::Dictionary(copied));

        Ok(new_page_id)
    }

    fn append(&self, output: &mut LopdfOutput, page: ObjectId) -> Result<()> {
        output.kids.push(Object::Reference(page));
        Ok(())
    }

    fn serialize(&self, output: LopdfOutput) -> Result<Vec<u8>> {
        let LopdfOutput {
            mut doc,
            pages_id,
            kids,
            ..
        } = output;

        let count = kids.len() as i64;
        let pages_dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut writer = Vec::new();
        doc.save_to(&mut writer)?;
        Ok(writer)
    }
}

// =============================================================================
// Page tree helpers
// =============================================================================

/// Look up an inheritable attribute on the ancestors of a page
pub(crate) fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_PAGE_TREE_DEPTH {
        let id = parent?;
        let node = doc.get_dictionary(id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    None
}

/// Page attribute, falling back to the page tree
pub(crate) fn page_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let page = doc.get_dictionary(page_id).ok()?;
    match page.get(key) {
        Ok(value) => Some(value.clone()),
        Err(_) => inherited_attribute(doc, page, key),
    }
}

fn is_page_tree_node(obj: &Object) -> bool {
    match obj {
        Object::Dictionary(dict) => {
            matches!(dict.get(b"Type"), Ok(Object::Name(name)) if name.as_slice() == b"Pages")
        }
        _ => false,
    }
}

fn is_page(dict: &Dictionary) -> bool {
    matches!(dict.get(b"Type"), Ok(Object::Name(name)) if name.as_slice() == b"Page")
}

// =============================================================================
// Deep Copy
// =============================================================================

/// Deep copy an object from source to output, following references.
///
/// Output ids are reserved before recursing, so reference cycles (such as
/// an annotation pointing back at its page) terminate. References into the
/// source page tree are cut: other pages are copied without their parent
/// and `/Pages` nodes become null.
fn copy_object(
    output: &mut Document,
    source: &Document,
    obj: &Object,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Object> {
    match obj {
        Object::Reference(id) => {
            if let Some(&new_id) = cache.get(id) {
                return Ok(Object::Reference(new_id));
            }

            let referenced = match source.get_object(*id) {
                Ok(referenced) => referenced,
                Err(_) => {
                    log::debug!("Dropping dangling reference {:?}", id);
                    return Ok(Object::Null);
                }
            };
            if is_page_tree_node(referenced) {
                return Ok(Object::Null);
            }

            let new_id = output.new_object_id();
            cache.insert(*id, new_id);
            let copied = copy_object(output, source, referenced, cache)?;
            output.objects.insert(new_id, copied);

            Ok(Object::Reference(new_id))
        }
        Object::Dictionary(dict) => Ok(Object::Dictionary(copy_dictionary(
            output, source, dict, cache,
        )?)),
        Object::Array(arr) => {
            let new_arr: Result<Vec<_>> = arr
                .iter()
                .map(|item| copy_object(output, source, item, cache))
                .collect();
            Ok(Object::Array(new_arr?))
        }
        Object::Stream(stream) => Ok(Object::Stream(Stream {
            dict: copy_dictionary(output, source, &stream.dict, cache)?,
            content: stream.content.clone(),
            allows_compression: stream.allows_compression,
            start_position: None,
        })),
        // Primitive types: just clone
        _ => Ok(obj.clone()),
    }
}

fn copy_dictionary(
    output: &mut Document,
    source: &Document,
    dict: &Dictionary,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Dictionary> {
    let skip_parent = is_page(dict);
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        if skip_parent && key.as_slice() == b"Parent" {
            continue;
        }
        new_dict.set(key.clone(), copy_object(output, source, value, cache)?);
    }
    Ok(new_dict)
}
