//! Inputs
//!
//! An input behavior adapts one editable field to the get / set /
//! validate / export / apply lifecycle. Behaviors are registered by name
//! and extend each other: a derived behavior holds its parent and
//! forwards every method it does not override, so the parent stays
//! reachable for explicit super calls.
//!
//! An `Input` is the per-field instance. It is created when a field
//! enters edit mode (`create`) or once for fields of always-edit
//! containers (`manage`), and always dispatches through its most derived
//! behavior.

pub(crate) mod autocomplete;
mod base;
pub(crate) mod image;
mod markdown;
mod select;
mod units;

pub use autocomplete::AutocompleteState;
pub use image::UploadState;
pub use units::{UnitState, pretty_speed};

use crate::{EditResult, EditorConfig, FieldState};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tc_core::Registry;
use tc_dom::{DomTree, El, NodeId, Templates};

/// Everything an input behavior may touch besides its own instance
pub struct InputCx<'a> {
    pub dom: &'a mut DomTree,
    pub templates: &'a Templates,
    pub config: &'a EditorConfig,
    /// Other fields (the one being operated on is checked out)
    pub fields: &'a HashMap<NodeId, FieldState>,
    pub(crate) effects: &'a mut Vec<Effect>,
}

/// Work an input asks the editor to do once the call returns
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Effect {
    /// Fill a select from a data set, then take its value as baseline
    LoadOptions { field: NodeId, data_id: String },
}

/// Input behavior
pub trait InputBehavior {
    /// Behavior this one extends
    fn parent(&self) -> Option<&dyn InputBehavior> {
        None
    }

    /// Enter in the control runs the container's enter action
    fn action_on_enter(&self) -> bool {
        inherit!(self.action_on_enter() or false)
    }

    fn placeholder(&self) -> Option<&'static str> {
        inherit!(self.placeholder() or None)
    }

    /// Build the live control
    fn make(&self, cx: &mut InputCx<'_>, inp: &mut Input) -> EditResult<NodeId> {
        inherit!(self.make(cx, inp) or base::make(cx, inp))
    }

    /// Hook run once the instance is complete
    fn wire(&self, cx: &mut InputCx<'_>, inp: &mut Input) -> EditResult<()> {
        inherit!(self.wire(cx, inp) or Ok(()))
    }

    /// Set the control value; `None` takes it from the display text
    fn set(&self, cx: &mut InputCx<'_>, inp: &mut Input, value: Option<&str>) -> EditResult<()> {
        inherit!(self.set(cx, inp, value) or base::set(cx, inp, value))
    }

    fn get(&self, dom: &DomTree, inp: &Input) -> Value {
        inherit!(self.get(dom, inp) or Value::String(dom.value(inp.element).to_string()))
    }

    fn changed(&self, dom: &DomTree, inp: &Input) -> bool {
        inherit!(self.changed(dom, inp) or !loosely_equal(&inp.original_value, &inp.get(dom)))
    }

    fn blank(&self, dom: &DomTree, inp: &Input) -> bool {
        inherit!(self.blank(dom, inp) or dom.value(inp.element).is_empty())
    }

    fn validate(&self, cx: &mut InputCx<'_>, inp: &mut Input) -> EditResult<bool> {
        inherit!(self.validate(cx, inp) or Ok(true))
    }

    fn validation_message(&self) -> &'static str {
        inherit!(self.validation_message() or "Invalid value")
    }

    fn required_message(&self) -> &'static str {
        inherit!(self.required_message() or "Input required")
    }

    /// Value sent to the server
    fn export(&self, dom: &DomTree, inp: &Input) -> Value {
        inherit!(self.export(dom, inp) or inp.get(dom))
    }

    /// Render an accepted value into the display element
    fn apply(&self, cx: &mut InputCx<'_>, inp: &mut Input, value: &Value) -> EditResult<()> {
        inherit!(self.apply(cx, inp, value) or base::apply(cx, inp, value))
    }

    /// Reference data arrived
    fn load(&self, cx: &mut InputCx<'_>, inp: &mut Input, data: &Value) -> EditResult<()> {
        inherit!(self.load(cx, inp, data) or Ok(()))
    }

    /// Clear validation state; `reset_value` also restores the reset value
    fn reset(&self, cx: &mut InputCx<'_>, inp: &mut Input, reset_value: bool) -> EditResult<()> {
        inherit!(self.reset(cx, inp, reset_value) or base::reset(cx, inp, reset_value))
    }

    /// User changed the control
    fn changed_by_user(&self, cx: &mut InputCx<'_>, inp: &mut Input) -> EditResult<()> {
        inherit!(self.changed_by_user(cx, inp) or Ok(()))
    }

    /// Fill a cloned display template
    fn render_template(&self, dom: &mut DomTree, inp: &Input, template: &str, node: NodeId, value: &Value) -> EditResult<()> {
        inherit!(self.render_template(dom, inp, template, node, value) or Ok(()))
    }

    /// Option about to be added to a select control
    fn finalize_opt(&self, dom: &mut DomTree, inp: &Input, opt: NodeId) -> EditResult<()> {
        inherit!(self.finalize_opt(dom, inp, opt) or Ok(()))
    }

    /// Value including its unit, for query strings
    fn formatted(&self, dom: &DomTree, inp: &Input) -> String {
        inherit!(self.formatted(dom, inp) or value_text(&inp.get(dom)))
    }
}

/// Input instance bound to one field
pub struct Input {
    kind: String,
    behavior: Rc<dyn InputBehavior>,
    /// Display element carrying the `data-edit-*` attributes
    pub source: NodeId,
    /// Live control
    pub element: NodeId,
    pub frame: Option<NodeId>,
    /// Closest target container
    pub container: Option<NodeId>,
    pub original_value: Value,
    pub reset_value: Value,
    /// `[data-edit-static]` children preserved across `apply`
    pub static_elements: Vec<NodeId>,
    pub(crate) note: Option<NodeId>,
    pub(crate) unit: Option<UnitState>,
    pub(crate) autocomplete: Option<AutocompleteState>,
    pub(crate) upload: Option<UploadState>,
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Input")
            .field("kind", &self.kind)
            .field("source", &self.source)
            .field("element", &self.element)
            .field("original_value", &self.original_value)
            .finish()
    }
}

impl Input {
    fn new(kind: &str, behavior: Rc<dyn InputBehavior>, source: NodeId, container: Option<NodeId>) -> Self {
        Self {
            kind: kind.to_string(),
            behavior,
            source,
            element: source,
            frame: None,
            container,
            original_value: Value::Null,
            reset_value: Value::Null,
            static_elements: Vec::new(),
            note: None,
            unit: None,
            autocomplete: None,
            upload: None,
        }
    }

    /// Input type name
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Instance for a field toggling into edit mode: builds the live
    /// control inside a fresh frame, seeded from `data-edit-value`
    pub fn create(
        cx: &mut InputCx<'_>,
        kind: &str,
        behavior: Rc<dyn InputBehavior>,
        source: NodeId,
        container: Option<NodeId>,
    ) -> EditResult<Self> {
        let mut inp = Self::new(kind, behavior.clone(), source, container);
        inp.element = behavior.make(cx, &mut inp)?;
        cx.dom.add_class(inp.element, "editable")?;
        cx.dom.add_class(inp.element, kind)?;
        let frame = cx.dom.build(El::new("div").class("editable input-frame"));
        cx.dom.append_child(frame, inp.element)?;
        inp.frame = Some(frame);

        let value = cx.dom.attr(source, "data-edit-value").map(str::to_string);
        inp.set(cx, value.as_deref())?;
        inp.original_value = inp.get(cx.dom);
        inp.static_elements = cx.dom.query(source, &tc_dom::Selector::has_attr("data-edit-static"));
        inp.reset_value = match cx.dom.attr(source, "data-edit-reset-value") {
            Some("") => Value::Null,
            Some(v) => Value::String(v.to_string()),
            None => inp.original_value.clone(),
        };
        inp.apply_placeholder(cx)?;
        inp.wire(cx)?;
        Ok(inp)
    }

    /// Instance wrapping an always-editable control in place
    pub fn manage(
        cx: &mut InputCx<'_>,
        kind: &str,
        behavior: Rc<dyn InputBehavior>,
        element: NodeId,
        container: Option<NodeId>,
    ) -> EditResult<Self> {
        let mut inp = Self::new(kind, behavior, element, container);
        let frame = cx.dom.build(El::new("div").class("editable input-frame"));
        if cx.dom.parent(element).is_some() {
            cx.dom.insert_before(element, frame)?;
        }
        cx.dom.append_child(frame, element)?;
        inp.frame = Some(frame);
        inp.original_value = inp.get(cx.dom);
        inp.wire(cx)?;
        Ok(inp)
    }

    fn apply_placeholder(&mut self, cx: &mut InputCx<'_>) -> EditResult<()> {
        let placeholder = match self.behavior.placeholder() {
            Some(p) => Some(p.to_string()),
            None => cx.dom.attr(self.source, "data-edit-placeholder").map(str::to_string),
        };
        if let Some(p) = placeholder {
            cx.dom.set_attr(self.element, "placeholder", &p)?;
        }
        Ok(())
    }

    pub fn action_on_enter(&self) -> bool {
        self.behavior.action_on_enter()
    }

    pub fn get(&self, dom: &DomTree) -> Value {
        self.behavior.get(dom, self)
    }

    pub fn changed(&self, dom: &DomTree) -> bool {
        self.behavior.changed(dom, self)
    }

    pub fn blank(&self, dom: &DomTree) -> bool {
        self.behavior.blank(dom, self)
    }

    pub fn export(&self, dom: &DomTree) -> Value {
        self.behavior.export(dom, self)
    }

    pub fn formatted(&self, dom: &DomTree) -> String {
        self.behavior.formatted(dom, self)
    }

    pub fn validation_message(&self) -> &'static str {
        self.behavior.validation_message()
    }

    pub fn required_message(&self) -> &'static str {
        self.behavior.required_message()
    }

    pub fn set(&mut self, cx: &mut InputCx<'_>, value: Option<&str>) -> EditResult<()> {
        let b = Rc::clone(&self.behavior);
        b.set(cx, self, value)
    }

    pub fn validate(&mut self, cx: &mut InputCx<'_>) -> EditResult<bool> {
        let b = Rc::clone(&self.behavior);
        b.validate(cx, self)
    }

    pub fn apply(&mut self, cx: &mut InputCx<'_>, value: &Value) -> EditResult<()> {
        let b = Rc::clone(&self.behavior);
        b.apply(cx, self, value)
    }

    pub fn load(&mut self, cx: &mut InputCx<'_>, data: &Value) -> EditResult<()> {
        let b = Rc::clone(&self.behavior);
        b.load(cx, self, data)
    }

    pub fn reset(&mut self, cx: &mut InputCx<'_>, reset_value: bool) -> EditResult<()> {
        let b = Rc::clone(&self.behavior);
        b.reset(cx, self, reset_value)
    }

    pub fn changed_by_user(&mut self, cx: &mut InputCx<'_>) -> EditResult<()> {
        let b = Rc::clone(&self.behavior);
        b.changed_by_user(cx, self)
    }

    fn wire(&mut self, cx: &mut InputCx<'_>) -> EditResult<()> {
        let b = Rc::clone(&self.behavior);
        b.wire(cx, self)
    }

    pub(crate) fn render_template(&self, dom: &mut DomTree, template: &str, node: NodeId, value: &Value) -> EditResult<()> {
        self.behavior.render_template(dom, self, template, node, value)
    }

    pub(crate) fn finalize_opt(&self, dom: &mut DomTree, opt: NodeId) -> EditResult<()> {
        self.behavior.finalize_opt(dom, self, opt)
    }

    /// Show a note next to the control
    pub fn show_note(&mut self, dom: &mut DomTree, text: &str, class: &str) -> EditResult<NodeId> {
        self.close_note(dom)?;
        let note = dom.build(El::new("div").class("editable input-note").class(class).text(text));
        if dom.parent(self.element).is_some() {
            if dom.has_class(self.element, "input-note-relative") {
                dom.insert_after(self.element, note)?;
            } else {
                dom.insert_before(self.element, note)?;
            }
        }
        self.note = Some(note);
        Ok(note)
    }

    pub fn close_note(&mut self, dom: &mut DomTree) -> EditResult<()> {
        if let Some(note) = self.note.take() {
            dom.detach(note)?;
        }
        Ok(())
    }

    /// Current note text
    pub fn note(&self, dom: &DomTree) -> Option<String> {
        self.note.map(|n| dom.text_content(n))
    }

    /// Mark the control invalid; `None` uses the validation message
    pub fn show_validation_error(&mut self, dom: &mut DomTree, message: Option<&str>) -> EditResult<()> {
        let text = message.unwrap_or(self.validation_message()).to_string();
        self.show_note(dom, &text, "validation-error")?;
        dom.add_class(self.element, "validation-error")?;
        Ok(())
    }

    pub fn autocomplete(&self) -> Option<&AutocompleteState> {
        self.autocomplete.as_ref()
    }

    pub fn upload(&self) -> Option<&UploadState> {
        self.upload.as_ref()
    }

    pub fn unit_select(&self) -> Option<NodeId> {
        self.unit.as_ref().map(|u| u.select)
    }
}

/// Share a behavior as a registry entry
pub(crate) fn rc(behavior: impl InputBehavior + 'static) -> Rc<dyn InputBehavior> {
    Rc::new(behavior)
}

/// Text form of a value as it appears in the page
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Equality the way form values compare: same-typed values directly,
/// mixed scalars by their text
pub fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(_), Value::String(_)) | (Value::Bool(_), Value::Bool(_)) => a == b,
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => value_text(a) == value_text(b),
    }
}

/// Registry holding every built-in input type
pub fn default_inputs() -> Registry<dyn InputBehavior> {
    // dependency order: select and the string family extend base types
    Registry::builtin("input", |reg| {
        base::register(reg)?;
        select::register(reg)?;
        markdown::register(reg)?;
        autocomplete::register(reg)?;
        units::register(reg)?;
        image::register(reg)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&json!(null)), "");
        assert_eq!(value_text(&json!(12)), "12");
        assert_eq!(value_text(&json!(["1", 2])), "1,2");
        assert_eq!(value_text(&json!(true)), "true");
    }

    #[test]
    fn test_loosely_equal() {
        assert!(loosely_equal(&json!("10"), &json!(10)));
        assert!(!loosely_equal(&json!(null), &json!("")));
        assert!(loosely_equal(&json!(1.0), &json!(1)));
        assert!(!loosely_equal(&json!("a"), &json!("b")));
    }

    #[test]
    fn test_registry_chain() {
        let reg = default_inputs();
        assert_eq!(reg.lineage("traffic_capacity"), ["traffic_capacity", "unit_input", "string", "base"]);
        assert_eq!(reg.lineage("mandatory_bool"), ["mandatory_bool", "select", "base"]);
        assert!(reg.get("email").unwrap().action_on_enter());
        assert!(!reg.get("text").unwrap().action_on_enter());
        assert_eq!(reg.get("url").unwrap().placeholder(), Some("http://www.example.com"));
    }

    #[test]
    fn test_every_builtin_registered() {
        let reg = default_inputs();
        for name in [
            "base", "string", "password", "email", "url", "number", "latitude", "longitude", "text", "readonly",
            "markdown", "bool", "select", "mandatory_bool", "data_quality_select", "autocomplete", "network_speed",
            "unit_input", "traffic_capacity", "spatial_distance", "image",
        ] {
            assert!(reg.has(name), "{name} missing");
        }
        assert_eq!(reg.len(), 21);
    }
}
