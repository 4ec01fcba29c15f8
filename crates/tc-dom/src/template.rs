//! DOM Templates
//!
//! Template nodes are kept detached and addressed by id. Copies are deep
//! clones without the `id` attribute, so they can be inserted any number
//! of times.

use crate::{DomError, DomResult, DomTree, El, NodeId, Selector};
use std::collections::HashMap;

/// Template registry
#[derive(Debug, Default)]
pub struct Templates {
    nodes: HashMap<String, NodeId>,
    initialized: bool,
}

impl Templates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in `link` and `check` templates
    pub fn with_builtins(tree: &mut DomTree) -> Self {
        let mut templates = Self::new();
        let link = tree.build(El::new("a"));
        let check = tree.build(El::new("img").class("checkmark"));
        templates.nodes.insert("link".into(), link);
        templates.nodes.insert("check".into(), check);
        templates
    }

    pub fn register(&mut self, id: &str, node: NodeId) -> DomResult<()> {
        if self.nodes.contains_key(id) {
            return Err(DomError::DuplicateTemplate(id.to_string()));
        }
        self.nodes.insert(id.to_string(), node);
        Ok(())
    }

    pub fn get(&self, id: &str) -> DomResult<NodeId> {
        self.nodes
            .get(id)
            .copied()
            .ok_or_else(|| DomError::UnknownTemplate(id.to_string()))
    }

    pub fn has(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Detached deep copy of a template, `id` attribute removed
    pub fn copy(&self, tree: &mut DomTree, id: &str) -> DomResult<NodeId> {
        let copy = tree.clone_subtree(self.get(id)?)?;
        tree.remove_attr(copy, "id")?;
        Ok(copy)
    }

    /// Copy a template and fill its `[data-edit-name]` descendants from
    /// `data`; with `set_edit_value` the value also lands in `data-edit-value`
    pub fn copy_and_replace(
        &self,
        tree: &mut DomTree,
        id: &str,
        data: &[(String, String)],
        set_edit_value: bool,
    ) -> DomResult<NodeId> {
        let copy = self.copy(tree, id)?;
        for (name, value) in data {
            for node in tree.query(copy, &Selector::attr_eq("data-edit-name", name)) {
                tree.set_text(node, value)?;
                if set_edit_value {
                    tree.set_attr(node, "data-edit-value", value)?;
                }
            }
        }
        Ok(copy)
    }

    /// Register the children of `#editable-templates` and
    /// `.editable-templates` by their `id`; runs once
    pub fn init(&mut self, tree: &DomTree) -> DomResult<usize> {
        if self.initialized {
            return Ok(0);
        }
        let mut count = 0;
        for holder in tree.select("#editable-templates, .editable-templates")? {
            for child in tree.element_children(holder) {
                let Some(id) = tree.attr(child, "id") else {
                    continue;
                };
                self.register(&id.to_string(), child)?;
                count += 1;
            }
        }
        tracing::debug!("{} templates registered", count);
        self.initialized = true;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_and_unknown() {
        let mut tree = DomTree::new();
        let mut templates = Templates::with_builtins(&mut tree);
        let node = tree.create_element("div");
        assert_eq!(templates.register("link", node), Err(DomError::DuplicateTemplate("link".into())));
        assert_eq!(templates.get("nope"), Err(DomError::UnknownTemplate("nope".into())));
        assert!(templates.has("check"));
    }

    #[test]
    fn test_init_and_copy_and_replace() {
        let mut tree = DomTree::new();
        let root = tree.root();
        tree.build_into(
            root,
            El::new("div").attr("id", "editable-templates").hidden().child(
                El::new("div")
                    .attr("id", "row-tmpl")
                    .child(El::new("span").attr("data-edit-name", "name"))
                    .child(El::new("span").attr("data-edit-name", "asn")),
            ),
        )
        .unwrap();

        let mut templates = Templates::new();
        assert_eq!(templates.init(&tree).unwrap(), 1);
        assert_eq!(templates.init(&tree).unwrap(), 0);

        let data = vec![("name".to_string(), "Example".to_string())];
        let copy = templates.copy_and_replace(&mut tree, "row-tmpl", &data, true).unwrap();
        assert!(!tree.has_attr(copy, "id"));
        assert!(tree.parent(copy).is_none());
        let name = tree.query_first(copy, &Selector::attr_eq("data-edit-name", "name")).unwrap();
        assert_eq!(tree.text_content(name), "Example");
        assert_eq!(tree.attr(name, "data-edit-value"), Some("Example"));
    }
}
