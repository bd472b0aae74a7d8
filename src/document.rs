//! In-memory PDF object graph.
//!
//! [`PdfDocument`] owns every indirect object of a document keyed by object
//! number, together with the catalog reference. It offers the small set of
//! graph operations the signature preparer needs: allocating new objects,
//! dereferencing, updating named entries, and walking the page tree to the
//! first leaf page.

use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef};
use crate::writer::ObjectSerializer;
use std::collections::{BTreeMap, HashSet};

/// Maximum depth followed when walking the page tree or reference chains.
const MAX_RESOLVE_DEPTH: u32 = 64;

/// Handle to a leaf `/Type /Page` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHandle {
    reference: ObjectRef,
}

impl PageHandle {
    /// Reference of the page dictionary.
    pub fn reference(&self) -> ObjectRef {
        self.reference
    }
}

/// An editable PDF object graph.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    version: (u8, u8),
    objects: BTreeMap<u32, Object>,
    next_obj_id: u32,
    root: ObjectRef,
    info: Option<ObjectRef>,
}

impl PdfDocument {
    /// Create a document with a catalog and an empty page tree.
    pub fn new() -> Self {
        let mut doc = Self {
            version: (1, 7),
            objects: BTreeMap::new(),
            next_obj_id: 1,
            root: ObjectRef::new(0, 0),
            info: None,
        };

        let pages = doc.add_object(ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("Pages")),
            ("Kids", ObjectSerializer::array(vec![])),
            ("Count", ObjectSerializer::integer(0)),
        ]));
        doc.root = doc.add_object(ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("Catalog")),
            ("Pages", Object::Reference(pages)),
        ]));
        doc
    }

    /// Build a document from an existing object table.
    ///
    /// This is the entry point for object graphs produced by an external
    /// parser. All objects must use generation 0.
    pub fn from_objects(
        objects: impl IntoIterator<Item = (u32, Object)>,
        root: ObjectRef,
    ) -> Result<Self> {
        let objects: BTreeMap<u32, Object> = objects.into_iter().collect();
        if !objects.contains_key(&root.id) {
            return Err(Error::ObjectNotFound(root.id, root.gen));
        }
        let next_obj_id = objects.keys().next_back().map_or(1, |id| id + 1);
        Ok(Self {
            version: (1, 7),
            objects,
            next_obj_id,
            root,
            info: None,
        })
    }

    /// PDF version as (major, minor).
    pub fn version(&self) -> (u8, u8) {
        self.version
    }

    /// Set the PDF version written in the header.
    pub fn set_version(&mut self, major: u8, minor: u8) {
        self.version = (major, minor);
    }

    /// Reference of the document catalog.
    pub fn root(&self) -> ObjectRef {
        self.root
    }

    /// Reference of the document information dictionary, if any.
    pub fn info(&self) -> Option<ObjectRef> {
        self.info
    }

    /// Attach a document information dictionary (/Title, /Author, ...).
    pub fn set_info(&mut self, entries: Vec<(&str, Object)>) -> ObjectRef {
        let info = self.add_object(ObjectSerializer::dict(entries));
        self.info = Some(info);
        info
    }

    /// Number of indirect objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Value for the trailer /Size entry (highest object number + 1).
    pub fn xref_size(&self) -> u32 {
        self.next_obj_id
    }

    /// Iterate over all indirect objects in object-number order.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectRef, &Object)> {
        self.objects
            .iter()
            .map(|(id, obj)| (ObjectRef::new(*id, 0), obj))
    }

    /// Allocate a new indirect object and return its reference.
    pub fn add_object(&mut self, obj: Object) -> ObjectRef {
        let id = self.next_obj_id;
        self.next_obj_id += 1;
        self.objects.insert(id, obj);
        ObjectRef::new(id, 0)
    }

    /// Look up an indirect object.
    pub fn get(&self, r: ObjectRef) -> Result<&Object> {
        if r.gen != 0 {
            return Err(Error::ObjectNotFound(r.id, r.gen));
        }
        self.objects
            .get(&r.id)
            .ok_or(Error::ObjectNotFound(r.id, r.gen))
    }

    /// Look up an indirect object for modification.
    pub fn get_mut(&mut self, r: ObjectRef) -> Result<&mut Object> {
        if r.gen != 0 {
            return Err(Error::ObjectNotFound(r.id, r.gen));
        }
        self.objects
            .get_mut(&r.id)
            .ok_or(Error::ObjectNotFound(r.id, r.gen))
    }

    /// Follow references until a direct object is reached.
    pub fn resolve<'a>(&'a self, obj: &'a Object) -> Result<&'a Object> {
        let mut current = obj;
        let mut depth = 0;
        while let Object::Reference(r) = current {
            depth += 1;
            if depth > MAX_RESOLVE_DEPTH {
                return Err(Error::CircularReference(*r));
            }
            current = self.get(*r)?;
        }
        Ok(current)
    }

    /// Dictionary stored at `r`.
    pub fn dict(&self, r: ObjectRef) -> Result<&Dictionary> {
        self.get(r)?.expect_dict()
    }

    /// Mutable dictionary stored at `r`.
    pub fn dict_mut(&mut self, r: ObjectRef) -> Result<&mut Dictionary> {
        let obj = self.get_mut(r)?;
        let found = obj.type_name();
        obj.as_dict_mut().ok_or_else(|| Error::InvalidObjectType {
            expected: "Dictionary".to_string(),
            found: found.to_string(),
        })
    }

    /// The document catalog.
    pub fn catalog(&self) -> Result<&Dictionary> {
        self.dict(self.root)
    }

    /// The document catalog, mutable.
    pub fn catalog_mut(&mut self) -> Result<&mut Dictionary> {
        self.dict_mut(self.root)
    }

    /// Reference of the root page tree node.
    fn pages_root(&self) -> Result<ObjectRef> {
        self.catalog()?
            .get("Pages")
            .ok_or_else(|| Error::InvalidPdf("Catalog missing /Pages".to_string()))?
            .expect_reference()
    }

    /// Walk the page tree down the first kid of every node to the first leaf page.
    pub fn first_page(&self) -> Result<PageHandle> {
        let mut node_ref = self.pages_root()?;
        let mut visited = HashSet::new();

        for _ in 0..MAX_RESOLVE_DEPTH {
            if !visited.insert(node_ref) {
                return Err(Error::CircularReference(node_ref));
            }

            let node = self.dict(node_ref)?;
            match node.get("Type").and_then(|t| t.as_name()) {
                Some("Page") => {
                    return Ok(PageHandle {
                        reference: node_ref,
                    })
                },
                Some("Pages") | None => {
                    let kids = node
                        .get("Kids")
                        .ok_or_else(|| Error::InvalidPdf("Pages node missing /Kids".to_string()))?;
                    let kids = self.resolve(kids)?.expect_array()?;
                    let first = kids
                        .first()
                        .ok_or_else(|| Error::InvalidPdf("Document has no pages".to_string()))?;
                    node_ref = first.expect_reference()?;
                },
                Some(other) => {
                    return Err(Error::InvalidPdf(format!(
                        "Unexpected /Type /{} in page tree",
                        other
                    )))
                },
            }
        }

        Err(Error::RecursionLimitExceeded(MAX_RESOLVE_DEPTH))
    }

    /// Append a page to the root page tree node.
    ///
    /// `content` becomes the page's content stream (may be empty).
    pub fn add_page(&mut self, width: f32, height: f32, content: Vec<u8>) -> Result<PageHandle> {
        let pages_ref = self.pages_root()?;

        let content_ref = self.add_object(Object::Stream {
            dict: Dictionary::new(),
            data: bytes::Bytes::from(content),
        });
        let page_ref = self.add_object(ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("Page")),
            ("Parent", Object::Reference(pages_ref)),
            (
                "MediaBox",
                ObjectSerializer::rect(0.0, 0.0, width as f64, height as f64),
            ),
            ("Contents", Object::Reference(content_ref)),
            ("Resources", ObjectSerializer::dict(vec![])),
        ]));

        let pages = self.dict_mut(pages_ref)?;
        match pages.get_mut("Kids").and_then(|k| k.as_array_mut()) {
            Some(kids) => kids.push(Object::Reference(page_ref)),
            None => {
                pages.insert("Kids".to_string(), Object::Array(vec![Object::Reference(page_ref)]));
            },
        }
        let count = pages.get("Count").and_then(|c| c.as_integer()).unwrap_or(0);
        pages.insert("Count".to_string(), Object::Integer(count + 1));

        Ok(PageHandle {
            reference: page_ref,
        })
    }

    /// Add a US Letter sized page (8.5" x 11").
    pub fn add_letter_page(&mut self) -> Result<PageHandle> {
        self.add_page(612.0, 792.0, Vec::new())
    }
}

impl Default for PdfDocument {
    fn default() -> Self {
        Self::new()
    }
}
