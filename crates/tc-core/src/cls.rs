//! Class Registries
//!
//! A registry maps normalized names to shared behavior objects. Extending
//! a registered entry hands the parent object to a constructor, which
//! wraps it; the wrapper delegates to the parent wherever it does not
//! override behavior.

use std::collections::HashMap;
use std::rc::Rc;

/// Registry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClsError {
    #[error("class with name '{name}' already exists in {registry} registry")]
    Duplicate { registry: String, name: String },

    #[error("trying to extend from class unknown to {registry} registry: {name}")]
    UnknownParent { registry: String, name: String },

    #[error("trying to retrieve class unknown to {registry} registry: {name}")]
    Unknown { registry: String, name: String },
}

/// Standardize a class name: tokens separated by `-` or whitespace are
/// joined camel-case style, the first token keeps its case.
///
/// `class-a` -> `classA`, `class a b` -> `classAB`, `Class-A_B` -> `ClassA_B`
pub fn make_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, token) in name.split(|c: char| c == '-' || c.is_whitespace()).enumerate() {
        if i == 0 {
            out.push_str(token);
            continue;
        }
        let mut chars = token.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

struct Class<T: ?Sized> {
    value: Rc<T>,
    parent: Option<String>,
}

/// Named class registry
pub struct Registry<T: ?Sized> {
    label: String,
    classes: HashMap<String, Class<T>>,
}

impl<T: ?Sized> Registry<T> {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            classes: HashMap::new(),
        }
    }

    /// Registry filled with built-in classes by `fill`.
    ///
    /// Built-in names never collide, so a failure here is a programming
    /// error: debug builds panic, release builds log it and keep whatever
    /// was registered before the failure.
    pub fn builtin(label: &str, fill: impl FnOnce(&mut Self) -> Result<(), ClsError>) -> Self {
        let mut reg = Self::new(label);
        if let Err(error) = fill(&mut reg) {
            tracing::error!(registry = %label, "built-in registration failed: {}", error);
            debug_assert!(false, "built-in registration failed: {error}");
        }
        reg
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn check_free(&self, name: &str) -> Result<String, ClsError> {
        let key = make_name(name);
        if self.classes.contains_key(&key) {
            return Err(ClsError::Duplicate {
                registry: self.label.clone(),
                name: name.to_string(),
            });
        }
        Ok(key)
    }

    /// Register a new root class
    pub fn register(&mut self, name: &str, value: Rc<T>) -> Result<Rc<T>, ClsError> {
        let key = self.check_free(name)?;
        tracing::debug!(registry = %self.label, "register {}", key);
        self.classes.insert(key, Class { value: value.clone(), parent: None });
        Ok(value)
    }

    /// Register `name` as an extension of `parent`; `build` receives the
    /// parent class and returns the derived one
    pub fn extend(&mut self, name: &str, parent: &str, build: impl FnOnce(Rc<T>) -> Rc<T>) -> Result<Rc<T>, ClsError> {
        let key = self.check_free(name)?;
        let parent_key = make_name(parent);
        let base = self
            .classes
            .get(&parent_key)
            .map(|c| c.value.clone())
            .ok_or_else(|| ClsError::UnknownParent {
                registry: self.label.clone(),
                name: parent.to_string(),
            })?;
        let value = build(base);
        tracing::debug!(registry = %self.label, "register {} extends {}", key, parent_key);
        self.classes.insert(
            key,
            Class {
                value: value.clone(),
                parent: Some(parent_key),
            },
        );
        Ok(value)
    }

    /// Get a registered class
    pub fn get(&self, name: &str) -> Result<Rc<T>, ClsError> {
        self.classes
            .get(&make_name(name))
            .map(|c| c.value.clone())
            .ok_or_else(|| ClsError::Unknown {
                registry: self.label.clone(),
                name: name.to_string(),
            })
    }

    pub fn has(&self, name: &str) -> bool {
        self.classes.contains_key(&make_name(name))
    }

    /// Direct parent of a registered class
    pub fn parent_of(&self, name: &str) -> Option<&str> {
        self.classes.get(&make_name(name)).and_then(|c| c.parent.as_deref())
    }

    /// The class and its ancestors, most derived first
    pub fn lineage(&self, name: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut current = self.has(name).then(|| make_name(name));
        while let Some(key) = current {
            current = self.classes.get(&key).and_then(|c| c.parent.clone());
            out.push(key);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
