//! tc DOM - Document Object Model
//!
//! Arena-backed element tree. Editable pages are described entirely by
//! this tree: declarative `data-edit-*` attributes are read from it and
//! every view/edit transition is a mutation of it.

mod attributes;
mod builder;
mod error;
mod node;
mod selector;
mod template;
mod tree;

pub use attributes::{Attr, NamedNodeMap};
pub use builder::El;
pub use error::{DomError, DomResult};
pub use node::{ElementData, Node, NodeData};
pub use selector::Selector;
pub use template::Templates;
pub use tree::DomTree;

use std::fmt;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Arena index of this node
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
