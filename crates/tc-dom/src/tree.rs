//! DOM Tree (arena-based allocation)
//!
//! Nodes are never freed: detaching a node only unlinks it, so detached
//! subtrees (content backups, templates) can be re-attached later with
//! their identity intact.

use crate::{DomError, DomResult, El, ElementData, Node, NodeData, NodeId, Selector};

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl DomTree {
    /// Create a tree holding a single `<body>` root
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::element("body")],
            root: NodeId(0),
        }
    }

    /// Root element
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes ever allocated
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.get_mut(id).ok_or(DomError::NotFound(id))
    }

    /// Element data of `id`, `None` for text nodes and unknown ids
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    fn element_mut(&mut self, id: NodeId) -> DomResult<&mut ElementData> {
        self.node_mut(id)?.as_element_mut().ok_or(DomError::NotAnElement(id))
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(Node::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(Node::text(text))
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Materialize a builder description as a detached subtree
    pub fn build(&mut self, el: El) -> NodeId {
        match el {
            El::Text(text) => self.create_text(&text),
            El::Element { tag, attrs, classes, hidden, value, checked, selected, children } => {
                let id = self.create_element(&tag);
                if let Some(NodeData::Element(data)) = self.get_mut(id).map(|n| &mut n.data) {
                    for (k, v) in attrs {
                        data.attrs.set(&k, &v);
                    }
                    data.classes = classes;
                    data.hidden = hidden;
                    data.value = value;
                    data.checked = checked;
                    data.selected = selected;
                }
                for child in children {
                    let child_id = self.build(child);
                    self.link(id, child_id, None);
                }
                id
            }
        }
    }

    /// Build a subtree and append it to `parent`
    pub fn build_into(&mut self, parent: NodeId, el: El) -> DomResult<NodeId> {
        let id = self.build(el);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Deep copy of a subtree; the copy is detached
    pub fn clone_subtree(&mut self, id: NodeId) -> DomResult<NodeId> {
        let mut copy = self.node(id)?.clone();
        let children = std::mem::take(&mut copy.children);
        copy.parent = None;
        let new_id = self.push(copy);
        for child in children {
            let child_copy = self.clone_subtree(child)?;
            self.link(new_id, child_copy, None);
        }
        Ok(new_id)
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Element children only
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.get(*c).is_some_and(Node::is_element))
            .collect()
    }

    /// Check if `ancestor` is `id` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.parent(c);
        }
        false
    }

    /// Check if the node is connected to the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.is_inclusive_ancestor(self.root, id)
    }

    fn link(&mut self, parent: NodeId, child: NodeId, position: Option<usize>) {
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.get_mut(parent) {
            match position {
                Some(pos) if pos <= node.children.len() => node.children.insert(pos, child),
                _ => node.children.push(child),
            }
        }
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.node(parent)?;
        self.node(child)?;
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if !self.node(parent)?.is_element() {
            return Err(DomError::NotAnElement(parent));
        }
        Ok(())
    }

    /// Unlink a node from its parent; the subtree stays intact
    pub fn detach(&mut self, id: NodeId) -> DomResult<()> {
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent {
            if let Some(p) = self.get_mut(parent) {
                p.children.retain(|c| *c != id);
            }
        }
        self.node_mut(id)?.parent = None;
        tracing::trace!(node = %id, "detached");
        Ok(())
    }

    /// Append `child` as last child of `parent` (moving it if attached)
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.check_insert(parent, child)?;
        self.detach(child)?;
        self.link(parent, child, None);
        Ok(())
    }

    /// Insert `child` as first child of `parent`
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.check_insert(parent, child)?;
        self.detach(child)?;
        self.link(parent, child, Some(0));
        Ok(())
    }

    /// Insert `new` right before `reference` under the same parent
    pub fn insert_before(&mut self, reference: NodeId, new: NodeId) -> DomResult<()> {
        let parent = self.node(reference)?.parent.ok_or(DomError::NotFound(reference))?;
        self.check_insert(parent, new)?;
        self.detach(new)?;
        let pos = self
            .children(parent)
            .iter()
            .position(|c| *c == reference)
            .ok_or(DomError::NotAChild { parent, child: reference })?;
        self.link(parent, new, Some(pos));
        Ok(())
    }

    /// Insert `new` right after `reference` under the same parent
    pub fn insert_after(&mut self, reference: NodeId, new: NodeId) -> DomResult<()> {
        let parent = self.node(reference)?.parent.ok_or(DomError::NotFound(reference))?;
        self.check_insert(parent, new)?;
        self.detach(new)?;
        let pos = self
            .children(parent)
            .iter()
            .position(|c| *c == reference)
            .ok_or(DomError::NotAChild { parent, child: reference })?;
        self.link(parent, new, Some(pos + 1));
        Ok(())
    }

    /// Detach and return all children of `id`
    pub fn take_children(&mut self, id: NodeId) -> DomResult<Vec<NodeId>> {
        let children = std::mem::take(&mut self.node_mut(id)?.children);
        for child in &children {
            if let Some(node) = self.get_mut(*child) {
                node.parent = None;
            }
        }
        Ok(children)
    }

    /// Replace all children of `id` with `children`
    pub fn replace_children(&mut self, id: NodeId, children: Vec<NodeId>) -> DomResult<()> {
        self.take_children(id)?;
        for child in children {
            self.append_child(id, child)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Strict ancestors, nearest first
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(c) = current {
            out.push(c);
            current = self.parent(c);
        }
        out
    }

    /// Descendant elements in document order (excluding `id`)
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants_pruned(id, |_| false)
    }

    /// Descendant elements in document order; elements for which `prune`
    /// returns true are included but their subtree is not entered
    pub fn descendants_pruned(&self, id: NodeId, prune: impl Fn(&ElementData) -> bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            let Some(elem) = self.element(current) else {
                continue;
            };
            out.push(current);
            if !prune(elem) {
                stack.extend(self.children(current).iter().rev().copied());
            }
        }
        out
    }

    /// Nearest inclusive ancestor element matching `pred`
    pub fn closest(&self, id: NodeId, pred: impl Fn(&ElementData) -> bool) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(c) = current {
            if self.element(c).is_some_and(&pred) {
                return Some(c);
            }
            current = self.parent(c);
        }
        None
    }

    /// Descendants of `id` matching `selector`
    pub fn query(&self, id: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|d| self.matches(*d, selector))
            .collect()
    }

    /// First descendant of `id` matching `selector`
    pub fn query_first(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(id).into_iter().find(|d| self.matches(*d, selector))
    }

    /// Element children of `id` matching `selector`
    pub fn children_matching(&self, id: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.matches(*c, selector))
            .collect()
    }

    pub fn matches(&self, id: NodeId, selector: &Selector) -> bool {
        self.element(id).is_some_and(|e| selector.matches(e))
    }

    /// Find attached element by `id` attribute
    pub fn get_element_by_id(&self, html_id: &str) -> Option<NodeId> {
        self.query_first(self.root, &Selector::attr_eq("id", html_id))
    }

    /// Resolve a selector against the attached document
    pub fn select(&self, selector: &str) -> DomResult<Vec<NodeId>> {
        let sel = Selector::parse(selector)?;
        Ok(self.query(self.root, &sel))
    }

    // ------------------------------------------------------------------
    // Attributes, classes, visibility
    // ------------------------------------------------------------------

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attrs.get(name))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|e| e.attrs.has(name))
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        let elem = self.element_mut(id)?;
        if name == "class" {
            elem.classes.clear();
            elem.add_class(value);
        } else {
            elem.attrs.set(name, value);
        }
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> DomResult<()> {
        self.element_mut(id)?.attrs.remove(name);
        Ok(())
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|e| e.has_class(class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        self.element_mut(id)?.add_class(class);
        Ok(())
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        self.element_mut(id)?.remove_class(class);
        Ok(())
    }

    pub fn show(&mut self, id: NodeId) -> DomResult<()> {
        self.element_mut(id)?.hidden = false;
        Ok(())
    }

    pub fn hide(&mut self, id: NodeId) -> DomResult<()> {
        self.element_mut(id)?.hidden = true;
        Ok(())
    }

    /// Element itself is not hidden (ancestors are not considered)
    pub fn is_shown(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|e| !e.hidden)
    }

    // ------------------------------------------------------------------
    // Form control state
    // ------------------------------------------------------------------

    /// Control value; a select reports its first selected option
    pub fn value(&self, id: NodeId) -> &str {
        if self.tag(id) == Some("select") {
            return self
                .options(id)
                .into_iter()
                .find(|o| self.selected(*o))
                .map_or("", |o| self.value(o));
        }
        self.element(id).map(|e| e.value.as_str()).unwrap_or("")
    }

    pub fn set_value(&mut self, id: NodeId, value: &str) -> DomResult<()> {
        if self.tag(id) == Some("select") {
            return self.select_value(id, &[value]);
        }
        self.element_mut(id)?.value = value.to_string();
        Ok(())
    }

    pub fn checked(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|e| e.checked)
    }

    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> DomResult<()> {
        self.element_mut(id)?.checked = checked;
        Ok(())
    }

    pub fn selected(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|e| e.selected)
    }

    pub fn set_selected(&mut self, id: NodeId, selected: bool) -> DomResult<()> {
        self.element_mut(id)?.selected = selected;
        Ok(())
    }

    /// Option children of a select
    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.children(select)
            .iter()
            .copied()
            .filter(|c| self.tag(*c) == Some("option"))
            .collect()
    }

    /// Values of the selected options of a select, in option order
    pub fn selected_values(&self, select: NodeId) -> Vec<String> {
        self.options(select)
            .into_iter()
            .filter(|o| self.selected(*o))
            .map(|o| self.value(o).to_string())
            .collect()
    }

    /// Select exactly the options whose value is in `values`
    pub fn select_value(&mut self, select: NodeId, values: &[&str]) -> DomResult<()> {
        let multiple = self.has_attr(select, "multiple");
        let mut picked = false;
        for option in self.options(select) {
            let hit = values.contains(&self.value(option)) && (multiple || !picked);
            picked |= hit;
            self.set_selected(option, hit)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else { return };
        match &node.data {
            NodeData::Text(t) => out.push_str(t),
            NodeData::Element(_) => {
                for child in &node.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Replace children with a single text node (`.text(value)`)
    pub fn set_text(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        self.take_children(id)?;
        if !text.is_empty() {
            let t = self.create_text(text);
            self.link(id, t, None);
        }
        Ok(())
    }

    /// Remove all children (`.empty()`)
    pub fn clear(&mut self, id: NodeId) -> DomResult<()> {
        self.take_children(id).map(|_| ())
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    /// Markup of the node and its subtree
    pub fn outer_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    /// Markup of the children of the node
    pub fn inner_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_markup(*child, &mut out);
        }
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else { return };
        match &node.data {
            NodeData::Text(t) => out.push_str(&escape(t)),
            NodeData::Element(e) => {
                out.push('<');
                out.push_str(&e.tag);
                for attr in e.attrs.iter() {
                    out.push_str(&format!(" {}=\"{}\"", attr.name, escape(&attr.value)));
                }
                if !e.classes.is_empty() {
                    out.push_str(&format!(" class=\"{}\"", e.classes.join(" ")));
                }
                if e.hidden {
                    out.push_str(" hidden");
                }
                out.push('>');
                for child in &node.children {
                    self.write_markup(*child, out);
                }
                out.push_str("</");
                out.push_str(&e.tag);
                out.push('>');
            }
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_detach() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let span = tree.create_element("span");
        tree.append_child(tree.root(), div).unwrap();
        tree.append_child(div, span).unwrap();

        assert_eq!(tree.parent(span), Some(div));
        assert!(tree.is_attached(span));

        tree.detach(div).unwrap();
        assert!(!tree.is_attached(span));
        assert_eq!(tree.parent(span), Some(div));
    }

    #[test]
    fn test_hierarchy_error() {
        let mut tree = DomTree::new();
        let a = tree.create_element("div");
        let b = tree.create_element("div");
        tree.append_child(a, b).unwrap();
        assert!(matches!(tree.append_child(b, a), Err(DomError::HierarchyRequest { .. })));
    }

    #[test]
    fn test_take_and_restore_children() {
        let mut tree = DomTree::new();
        let div = tree.build(El::new("div").text("Hello ").child(El::new("b").text("world")));
        let before = tree.inner_markup(div);

        let saved = tree.take_children(div).unwrap();
        tree.set_text(div, "editing").unwrap();
        assert_eq!(tree.text_content(div), "editing");

        tree.replace_children(div, saved).unwrap();
        assert_eq!(tree.inner_markup(div), before);
    }

    #[test]
    fn test_pruned_descendants() {
        let mut tree = DomTree::new();
        let outer = tree.build(
            El::new("div")
                .child(El::new("span").attr("data-edit-type", "string"))
                .child(El::new("div").attr("data-edit-component", "list").child(El::new("span").attr("data-edit-type", "string"))),
        );
        let found = tree.descendants_pruned(outer, |e| e.attrs.has("data-edit-component"));
        assert_eq!(found.len(), 2);
        assert_eq!(tree.descendants(outer).len(), 3);
    }

    #[test]
    fn test_select_value_single() {
        let mut tree = DomTree::new();
        let select = tree.build(
            El::new("select")
                .child(El::new("option").value("1").text("One"))
                .child(El::new("option").value("2").text("Two")),
        );
        tree.set_value(select, "2").unwrap();
        assert_eq!(tree.selected_values(select), ["2"]);
        assert_eq!(tree.value(select), "2");
    }

    #[test]
    fn test_clone_subtree_is_detached_copy() {
        let mut tree = DomTree::new();
        let tpl = tree.build(El::new("div").attr("id", "row").child(El::new("span").text("x")));
        tree.append_child(tree.root(), tpl).unwrap();
        let copy = tree.clone_subtree(tpl).unwrap();
        assert_ne!(copy, tpl);
        assert!(tree.parent(copy).is_none());
        assert_eq!(tree.outer_markup(copy), tree.outer_markup(tpl));
    }
}
