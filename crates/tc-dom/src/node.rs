//! DOM Node
//!
//! Nodes live in the `DomTree` arena and refer to each other by `NodeId`.
//! Form-control state (value, checked, selected) is kept on the element
//! itself rather than in attributes, the way a browser keeps it.

use crate::{NamedNodeMap, NodeId};

/// DOM Node - Core structure
#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node (None if detached)
    pub(crate) parent: Option<NodeId>,
    /// Children in document order
    pub(crate) children: Vec<NodeId>,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    /// Create a new element node
    pub fn element(tag: &str) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            data: NodeData::Element(ElementData::new(tag)),
        }
    }

    /// Create a new text node
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            data: NodeData::Text(content.into()),
        }
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            NodeData::Text(_) => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            NodeData::Text(_) => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            NodeData::Element(_) => None,
        }
    }

    /// Attribute lookup, `None` for text nodes
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.as_element().and_then(|e| e.attrs.get(name))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.as_element().is_some_and(|e| e.attrs.has(name))
    }
}

/// Node-specific data
#[derive(Debug, Clone)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
}

/// Element-specific data
#[derive(Debug, Clone, Default)]
pub struct ElementData {
    /// Lowercase tag name
    pub tag: String,
    /// Attributes other than `class`
    pub attrs: NamedNodeMap,
    /// Class list
    pub classes: Vec<String>,
    /// Display toggled off (`.hide()`)
    pub hidden: bool,
    /// Current value of a form control
    pub value: String,
    /// Checkbox state
    pub checked: bool,
    /// Option selection state
    pub selected: bool,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        for c in class.split_whitespace() {
            if !self.has_class(c) {
                self.classes.push(c.to_string());
            }
        }
    }

    pub fn remove_class(&mut self, class: &str) {
        for c in class.split_whitespace() {
            self.classes.retain(|existing| existing != c);
        }
    }
}
