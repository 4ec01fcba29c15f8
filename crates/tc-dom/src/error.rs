//! DOM operation errors

use crate::NodeId;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node id does not exist in this tree
    #[error("node {0} not found")]
    NotFound(NodeId),

    /// Operation expects an element, got a text node
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    /// Inserting a node into itself or one of its descendants
    #[error("hierarchy request error: {child} cannot be inserted into {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    /// Reference node is not a child of the given parent
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    /// Selector string could not be parsed
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Duplicate template id: {0}")]
    DuplicateTemplate(String),

    #[error("Tried to retrieve unknown template: {0}")]
    UnknownTemplate(String),
}
