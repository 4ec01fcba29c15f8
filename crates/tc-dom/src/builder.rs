//! Element builder
//!
//! Describes a subtree declaratively; `DomTree::build` turns it into nodes.

/// Subtree description
#[derive(Debug, Clone)]
pub enum El {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        classes: Vec<String>,
        hidden: bool,
        value: String,
        checked: bool,
        selected: bool,
        children: Vec<El>,
    },
    Text(String),
}

impl El {
    /// Start an element description
    pub fn new(tag: &str) -> Self {
        El::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            classes: Vec::new(),
            hidden: false,
            value: String::new(),
            checked: false,
            selected: false,
            children: Vec::new(),
        }
    }

    /// Text node description
    pub fn text_node(text: &str) -> Self {
        El::Text(text.to_string())
    }

    /// Set an attribute; `class` is split into the class list
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        if name == "class" {
            return self.class(value);
        }
        if let El::Element { attrs, .. } = &mut self {
            attrs.retain(|(k, _)| k != name);
            attrs.push((name.to_string(), value.to_string()));
        }
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        if let El::Element { classes, .. } = &mut self {
            for c in class.split_whitespace() {
                if !classes.iter().any(|e| e == c) {
                    classes.push(c.to_string());
                }
            }
        }
        self
    }

    pub fn hidden(mut self) -> Self {
        if let El::Element { hidden, .. } = &mut self {
            *hidden = true;
        }
        self
    }

    /// Form control value
    pub fn value(mut self, v: &str) -> Self {
        if let El::Element { value, .. } = &mut self {
            *value = v.to_string();
        }
        self
    }

    pub fn checked(mut self, on: bool) -> Self {
        if let El::Element { checked, .. } = &mut self {
            *checked = on;
        }
        self
    }

    pub fn selected(mut self, on: bool) -> Self {
        if let El::Element { selected, .. } = &mut self {
            *selected = on;
        }
        self
    }

    /// Append a text child
    pub fn text(self, text: &str) -> Self {
        self.child(El::Text(text.to_string()))
    }

    /// Append a child description
    pub fn child(mut self, child: El) -> Self {
        if let El::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }
}
