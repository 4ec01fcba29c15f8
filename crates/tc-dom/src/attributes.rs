//! Element Attributes
//!
//! Attribute manipulation: get, set, remove, has. Insertion order is kept
//! so serialized markup is stable.

use std::collections::HashMap;

/// Named node map (attribute collection)
#[derive(Debug, Clone, Default)]
pub struct NamedNodeMap {
    attributes: Vec<Attr>,
    by_name: HashMap<String, usize>,
}

/// Single attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

impl Attr {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl NamedNodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Get attribute value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.by_name
            .get(name)
            .and_then(|&i| self.attributes.get(i))
            .map(|a| a.value.as_str())
    }

    /// Set attribute, replacing any previous value
    pub fn set(&mut self, name: &str, value: &str) -> Option<String> {
        if let Some(&index) = self.by_name.get(name) {
            let old = std::mem::replace(&mut self.attributes[index].value, value.to_string());
            Some(old)
        } else {
            self.by_name.insert(name.to_string(), self.attributes.len());
            self.attributes.push(Attr::new(name, value));
            None
        }
    }

    /// Remove attribute by name
    pub fn remove(&mut self, name: &str) -> Option<Attr> {
        let index = self.by_name.remove(name)?;
        for idx in self.by_name.values_mut() {
            if *idx > index {
                *idx -= 1;
            }
        }
        Some(self.attributes.remove(index))
    }

    /// Check if attribute exists
    pub fn has(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Iterate over attributes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Attr> {
        self.attributes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_attribute() {
        let mut attrs = NamedNodeMap::new();
        attrs.set("data-edit-type", "string");
        attrs.set("data-edit-name", "name");

        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get("data-edit-type"), Some("string"));
        assert_eq!(attrs.set("data-edit-type", "bool"), Some("string".to_string()));
        assert_eq!(attrs.get("data-edit-type"), Some("bool"));
    }

    #[test]
    fn test_remove_keeps_indices() {
        let mut attrs = NamedNodeMap::new();
        attrs.set("a", "1");
        attrs.set("b", "2");
        attrs.set("c", "3");

        assert!(attrs.remove("a").is_some());
        assert!(!attrs.has("a"));
        assert_eq!(attrs.get("b"), Some("2"));
        assert_eq!(attrs.get("c"), Some("3"));
        let names: Vec<_> = attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["b", "c"]);
    }
}
