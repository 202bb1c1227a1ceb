//! Indexed view of a castxml dump.
//!
//! The resolver never touches raw markup. It consumes this indexed graph:
//! elements addressable by their `id` attribute, each carrying a tag, an
//! attribute map and ordered child elements.

use std::collections::HashMap;
use std::path::Path;

use crate::error::ParseError;

/// Handle to one element of an [`ElementGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(u32);

/// One element of the dump: tag, attributes and child elements, in
/// document order.
#[derive(Debug)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<ElementId>,
}

impl Element {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attribute value, or `None` when absent.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }
}

/// Random-access element graph the extractor runs against.
///
/// [`Document`] is the production implementation; tests substitute wrappers
/// (e.g. lookup-counting stand-ins) to observe the extractor's access
/// pattern.
pub trait ElementGraph {
    /// Direct children of the document root, in document order.
    fn roots(&self) -> &[ElementId];

    fn element(&self, id: ElementId) -> &Element;

    /// Locate an element by its `id` attribute.
    fn find_by_id(&self, source_id: &str) -> Option<ElementId>;
}

/// Owned, indexed castxml document.
#[derive(Debug, Default)]
pub struct Document {
    elements: Vec<Element>,
    roots: Vec<ElementId>,
    by_id: HashMap<String, ElementId>,
}

impl Document {
    /// Parse castxml XML text into an indexed document.
    ///
    /// Only element nodes are retained; text and comments carry nothing the
    /// resolver needs. Fails with [`ParseError::InvalidInput`] when the root
    /// element is not `<CastXML>`.
    pub fn parse(xml: &str) -> Result<Self, ParseError> {
        let dom = roxmltree::Document::parse(xml)?;
        let root = dom.root_element();
        if root.tag_name().name() != "CastXML" {
            return Err(ParseError::InvalidInput {
                root: root.tag_name().name().to_string(),
            });
        }

        let mut document = Document::default();
        for child in root.children().filter(roxmltree::Node::is_element) {
            let id = document.intern(child);
            document.roots.push(id);
        }
        Ok(document)
    }

    /// Read and parse a dump file.
    pub fn from_file(path: &Path) -> Result<Self, ParseError> {
        let xml = std::fs::read_to_string(path)?;
        Self::parse(&xml)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn intern(&mut self, node: roxmltree::Node<'_, '_>) -> ElementId {
        let children: Vec<ElementId> = node
            .children()
            .filter(roxmltree::Node::is_element)
            .map(|child| self.intern(child))
            .collect();

        let source_id = node.attribute("id").map(str::to_string);
        let id = ElementId(self.elements.len() as u32);
        self.elements.push(Element {
            tag: node.tag_name().name().to_string(),
            attributes: node
                .attributes()
                .map(|attribute| (attribute.name().to_string(), attribute.value().to_string()))
                .collect(),
            children,
        });
        if let Some(source_id) = source_id {
            self.by_id.insert(source_id, id);
        }
        id
    }
}

impl ElementGraph for Document {
    fn roots(&self) -> &[ElementId] {
        &self.roots
    }

    fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.0 as usize]
    }

    fn find_by_id(&self, source_id: &str) -> Option<ElementId> {
        self.by_id.get(source_id).copied()
    }
}
