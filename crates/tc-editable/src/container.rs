//! Editable container controller
//!
//! Containers (`[data-edit-target]`) and components
//! (`[data-edit-component]`) own the fields, triggers and nested parts
//! whose nearest container-like ancestor they are. Each one is in view or
//! edit mode; toggling into edit replaces every owned field's display
//! content with a live input, toggling out either restores the snapshot
//! (cancel) or applies the values the server accepted.

use crate::input::{Input, value_text};
use crate::state::{ContainerState, FieldState, Mode};
use crate::{EditError, EditResult, Editor, Event};
use serde_json::{Map, Value};
use tc_dom::{El, NodeId, Selector};

impl Editor {
    /// Container or component an element belongs to
    pub(crate) fn owner(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.dom.parent(node)?;
        self.dom.closest(parent, |e| {
            e.attrs.has("data-edit-target") || e.attrs.has("data-edit-component")
        })
    }

    /// Descendants of `container` matching `selector` that belong to it
    pub(crate) fn owned(&self, container: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.dom
            .query(container, selector)
            .into_iter()
            .filter(|node| self.owner(*node) == Some(container))
            .collect()
    }

    /// Containers that declare `data-edit-group` pointing at `container`
    pub(crate) fn grouped(&self, container: NodeId) -> Vec<NodeId> {
        if self.dom.has_attr(container, "data-edit-group") {
            return Vec::new();
        }
        let root = self.dom.root();
        let mut out = Vec::new();
        for node in self.dom.query(root, &Selector::has_attr("data-edit-group")) {
            let Some(group) = self.dom.attr(node, "data-edit-group") else {
                continue;
            };
            let Ok(selector) = Selector::parse(group) else {
                tracing::warn!("bad data-edit-group selector {:?}", group);
                continue;
            };
            if self.dom.query_first(root, &selector) == Some(container) {
                out.push(node);
            }
        }
        out
    }

    /// Whether `field` has an input reporting a change
    pub(crate) fn field_changed(&self, field: NodeId) -> bool {
        self.fields
            .get(&field)
            .and_then(|f| f.input.as_ref())
            .is_some_and(|inp| inp.changed(&self.dom))
    }

    /// Owned fields of `container` with a pending change
    pub fn changed_fields(&self, container: NodeId) -> Vec<NodeId> {
        self.owned(container, &Selector::has_attr("data-edit-type"))
            .into_iter()
            .filter(|f| self.field_changed(*f))
            .collect()
    }

    fn mode_of(&self, node: NodeId) -> Mode {
        self.containers.get(&node).map_or(Mode::View, |s| s.mode)
    }

    /// Wire a container once: initial mode, owned parts, error popin and
    /// loading shim
    pub(crate) fn init_container(&mut self, container: NodeId) -> EditResult<()> {
        if self.containers.get(&container).is_some_and(|s| s.initialized) {
            return Ok(());
        }
        let always = self.dom.has_class(container, "always");
        {
            let state = self.containers.entry(container).or_default();
            state.initialized = true;
            state.always = always;
            state.mode = if always { Mode::Edit } else { Mode::View };
        }
        self.sync(container)?;

        let popin = self.dom.build(
            El::new("div")
                .class("editable popin error")
                .hidden()
                .child(El::new("div").class("main"))
                .child(El::new("div").class("extra")),
        );
        self.dom.prepend_child(container, popin)?;
        let shim = self.dom.build(El::new("div").class("editable loading-shim").hidden());
        self.dom.prepend_child(container, shim)?;

        let state = self.containers.entry(container).or_default();
        state.error_popin = Some(popin);
        state.loading_shim = Some(shim);
        tracing::debug!("container {} initialized ({})", container, state.mode);
        Ok(())
    }

    /// Wire parts added since the last sync and reconcile their mode
    pub fn sync(&mut self, container: NodeId) -> EditResult<()> {
        let mode = self.mode_of(container);

        for trigger in self.owned(container, &Selector::parse("a, input, select, button")?) {
            if self.dom.has_attr(trigger, "data-edit-action") {
                self.triggers.entry(trigger).or_insert(container);
            }
        }

        for field in self.owned(container, &Selector::has_attr("data-edit-type")) {
            let state = self.fields.entry(field).or_default();
            if state.parent.is_none() {
                state.parent = Some(container);
            }
            if state.mode != mode {
                self.toggle(field, None)?;
            }
        }

        for node in self.owned(container, &Selector::has_attr("data-edit-data")) {
            let Some(id) = self.dom.attr(node, "data-edit-data").map(str::to_string) else {
                continue;
            };
            self.load_data(&id)?;
        }

        for node in self.owned(container, &Selector::has_attr("data-edit-toggled")) {
            if self.dom.attr(node, "data-edit-toggled") == Some(mode.as_str()) {
                self.dom.show(node)?;
            } else {
                self.dom.hide(node)?;
            }
        }

        for component in self.owned(container, &Selector::has_attr("data-edit-component")) {
            self.containers.entry(component).or_default().mode = mode;
            self.sync(component)?;
        }
        Ok(())
    }

    /// Flip a container, component or field between view and edit;
    /// `data` holds the values the server accepted
    pub fn toggle(&mut self, node: NodeId, data: Option<&Map<String, Value>>) -> EditResult<()> {
        if self.dom.has_class(node, "always") {
            return Ok(());
        }
        let is_container = self.dom.has_attr(node, "data-edit-target") || self.dom.has_attr(node, "data-edit-component");

        let mode = if is_container {
            let mode = self.mode_of(node).flipped();
            let (show, hide) = match mode {
                Mode::Edit => ("edit", "view"),
                Mode::View => ("view", "edit"),
            };
            for el in self.owned(node, &Selector::attr_eq("data-edit-toggled", show)) {
                self.dom.show(el)?;
            }
            for el in self.owned(node, &Selector::attr_eq("data-edit-toggled", hide)) {
                self.dom.hide(el)?;
            }
            match mode {
                Mode::Edit => self.dom.add_class(node, "mode-edit")?,
                Mode::View => {
                    self.dom.remove_class(node, "mode-edit")?;
                    if data.is_none() {
                        self.emit(Event::EditCancel { container: node });
                    }
                }
            }
            self.clear_error_popins(node)?;
            self.containers.entry(node).or_default().mode = mode;

            for part in self.owned(node, &Selector::parse("[data-edit-type], [data-edit-component]")?) {
                self.toggle(part, data)?;
            }
            for other in self.grouped(node) {
                self.toggle(other, data)?;
            }
            mode
        } else if self.dom.has_attr(node, "data-edit-type") {
            if self.fields.get(&node).is_some_and(|f| f.always) {
                return Ok(());
            }
            self.toggle_field(node, data)?
        } else {
            return Ok(());
        };

        self.emit(Event::Toggle { node, mode });
        Ok(())
    }

    fn toggle_field(&mut self, field: NodeId, data: Option<&Map<String, Value>>) -> EditResult<Mode> {
        let current = self.fields.get(&field).map_or(Mode::View, |f| f.mode);
        let mode = match current {
            Mode::Edit => {
                let state = self.fields.entry(field).or_default();
                let input = state.input.take();
                let backup = std::mem::take(&mut state.backup);
                let name = self.dom.attr(field, "data-edit-name").unwrap_or("").to_string();
                let applied = match input {
                    Some(mut inp) => {
                        let mut cx = self.cx();
                        inp.reset(&mut cx, false)?;
                        match data.filter(|d| !d.is_empty()) {
                            Some(data) => {
                                let value = data.get(&name).cloned().unwrap_or(Value::Null);
                                inp.apply(&mut cx, &value)?;
                                true
                            }
                            None => false,
                        }
                    }
                    None => false,
                };
                if !applied {
                    self.dom.replace_children(field, backup)?;
                }
                self.flush_effects()?;
                Mode::View
            }
            Mode::View => {
                let kind = self.dom.attr(field, "data-edit-type").unwrap_or("").to_string();
                let behavior = self.inputs.get(&kind)?;
                let container = self.dom.closest(field, |e| e.attrs.has("data-edit-target"));
                let mut cx = self.cx();
                let inp = Input::create(&mut cx, &kind, behavior, field, container)?;

                let backup = self.dom.take_children(field)?;
                if let Some(frame) = inp.frame {
                    self.dom.append_child(field, frame)?;
                }
                if let Some(name) = self.dom.attr(field, "data-edit-name").map(str::to_string) {
                    self.dom.set_attr(inp.element, "data-edit-name", &name)?;
                }

                let state = self.fields.entry(field).or_default();
                state.backup = backup;
                state.input = Some(inp);
                self.flush_effects()?;
                Mode::Edit
            }
        };
        self.fields.entry(field).or_default().mode = mode;
        Ok(mode)
    }

    /// Put every owned field back to its baseline without changing mode
    pub fn reset(&mut self, container: NodeId) -> EditResult<()> {
        for field in self.owned(container, &Selector::has_attr("data-edit-type")) {
            self.with_input(field, |inp, cx| inp.reset(cx, true))?;
        }
        for other in self.grouped(container) {
            if !self.dom.has_attr(other, "data-edit-module") {
                self.reset(other)?;
            }
        }
        for part in self.owned(container, &Selector::parse("[data-edit-module], [data-edit-component]")?) {
            self.reset(part)?;
        }
        Ok(())
    }

    /// Export the container's fields into `data`; does nothing unless
    /// the container is editing
    pub fn export(&mut self, container: NodeId, data: &mut Map<String, Value>) -> EditResult<()> {
        if self.mode_of(container) != Mode::Edit && !self.dom.has_class(container, "always") {
            return Ok(());
        }
        let fields = self.owned(container, &Selector::has_attr("data-edit-type"));
        self.export_fields(&fields, data)?;
        if let Some(id) = self.dom.attr(container, "data-edit-id") {
            let id = id.parse::<i64>().map_or_else(|_| Value::String(id.to_string()), Value::from);
            data.insert("_id".into(), id);
        }
        self.collect_payload(container, data)?;
        self.emit(Event::Export {
            container,
            data: Value::Object(data.clone()),
        });
        Ok(())
    }

    /// Export one field; tagged validation errors name the field
    fn export_field(&mut self, field: NodeId, data: &mut Map<String, Value>) -> EditResult<()> {
        let name = self.dom.attr(field, "data-edit-name").unwrap_or("").to_string();
        let required = self.dom.attr(field, "data-edit-required") == Some("yes");
        let outcome = self.with_input(field, |inp, cx| {
            if required && inp.blank(cx.dom) {
                let message = inp.required_message();
                inp.show_validation_error(cx.dom, Some(message))?;
                return Ok(Err(message.to_string()));
            }
            if !inp.validate(cx)? {
                inp.show_validation_error(cx.dom, None)?;
                return Ok(Err(inp.validation_message().to_string()));
            }
            Ok(Ok((inp.export(cx.dom), inp.changed(cx.dom))))
        })?;
        match outcome {
            None => Ok(()),
            Some(Err(message)) => Err(EditError::Validation { field: name, message }),
            Some(Ok((value, changed))) => {
                data.insert(name, value);
                let count = data.get("_changed").and_then(Value::as_u64).unwrap_or(0);
                data.insert("_changed".into(), Value::from(count + u64::from(changed)));
                Ok(())
            }
        }
    }

    /// Export `fields`, collecting every validation failure before
    /// failing with `ValidationErrors`
    pub(crate) fn export_fields(&mut self, fields: &[NodeId], data: &mut Map<String, Value>) -> EditResult<()> {
        let mut errors = Map::new();
        for field in fields {
            match self.export_field(*field, data) {
                Ok(()) => {}
                Err(EditError::Validation { field, message }) => {
                    errors.insert(field, Value::String(message));
                }
                Err(other) => return Err(other),
            }
        }
        let valid = errors.is_empty();
        data.insert("_valid".into(), Value::Bool(valid));
        data.insert("_validationErrors".into(), Value::Object(errors));
        if !valid {
            tracing::debug!("{} fields failed validation", data["_validationErrors"].as_object().map_or(0, Map::len));
            return Err(EditError::Validations {
                data: Value::Object(data.clone()),
            });
        }
        Ok(())
    }

    /// Values of `.payload` blocks that belong to `node`
    pub(crate) fn collect_payload(&self, node: NodeId, data: &mut Map<String, Value>) -> EditResult<()> {
        let payload = Selector::parse(".payload")?;
        let named = Selector::has_attr("data-edit-name");
        let blocks = self
            .dom
            .descendants_pruned(node, |e| {
                e.attrs.has("data-edit-target") || e.attrs.has("data-edit-component") || payload.matches(e)
            })
            .into_iter()
            .filter(|n| self.dom.matches(*n, &payload));
        for block in blocks {
            for item in self.dom.children_matching(block, &named) {
                if let Some(name) = self.dom.attr(item, "data-edit-name") {
                    data.insert(name.to_string(), Value::String(self.dom.text_content(item).trim().to_string()));
                }
            }
        }
        Ok(())
    }

    /// Store extra values sent with every export of `container`
    pub fn payload(&mut self, container: NodeId, values: &Map<String, Value>) -> EditResult<()> {
        let payload = Selector::parse(".payload")?;
        let block = match self.dom.children_matching(container, &payload).first() {
            Some(block) => *block,
            None => {
                let block = self.dom.build(El::new("div").class("editable payload"));
                self.dom.prepend_child(container, block)?;
                block
            }
        };
        for (name, value) in values {
            let existing = self.dom.children_matching(block, &Selector::attr_eq("data-edit-name", name));
            let item = match existing.first() {
                Some(item) => *item,
                None => self.dom.build_into(block, El::new("div").attr("data-edit-name", name))?,
            };
            self.dom.set_text(item, &value_text(value))?;
        }
        Ok(())
    }

    /// Current values become the baseline of every owned field
    pub fn accept_values(&mut self, container: NodeId) -> EditResult<()> {
        for field in self.owned(container, &Selector::has_attr("data-edit-type")) {
            let dom = &self.dom;
            if let Some(inp) = self.fields.get_mut(&field).and_then(|f| f.input.as_mut()) {
                inp.original_value = inp.get(dom);
            }
        }
        Ok(())
    }

    /// Hide the container's error popins
    pub fn clear_error_popins(&mut self, container: NodeId) -> EditResult<()> {
        for popin in self.owned(container, &Selector::parse(".editable.popin")?) {
            self.dom.hide(popin)?;
        }
        Ok(())
    }

    pub fn loading_shim(&mut self, container: NodeId, show: bool) -> EditResult<()> {
        for shim in self.dom.children_matching(container, &Selector::parse(".editable.loading-shim")?) {
            if show {
                self.dom.show(shim)?;
            } else {
                self.dom.hide(shim)?;
            }
        }
        Ok(())
    }

    /// Annotate the fields named `name` inside `scope` with a server error
    pub(crate) fn show_field_error(&mut self, scope: NodeId, name: &str, message: &str, include_error_field: bool) -> EditResult<()> {
        let mut nodes = self.dom.query(scope, &Selector::attr_eq("data-edit-name", name));
        if include_error_field {
            nodes.extend(self.dom.query(scope, &Selector::attr_eq("data-edit-error-field", name)));
        }
        for node in nodes {
            let dom = &mut self.dom;
            if let Some(inp) = self.fields.get_mut(&node).and_then(|f| f.input.as_mut()) {
                inp.show_validation_error(dom, Some(message))?;
            }
        }
        Ok(())
    }

    /// Field instances for always-edit containers: wraps the existing
    /// control in place
    pub(crate) fn manage_field(&mut self, field: NodeId) -> EditResult<()> {
        if self.fields.get(&field).is_some_and(|f| f.input.is_some()) {
            return Ok(());
        }
        let kind = self.dom.attr(field, "data-edit-type").unwrap_or("").to_string();
        let behavior = self.inputs.get(&kind)?;
        let container = self.dom.closest(field, |e| e.attrs.has("data-edit-target"));
        let mut cx = self.cx();
        let inp = Input::manage(&mut cx, &kind, behavior, field, container)?;
        self.fields.insert(
            field,
            FieldState {
                mode: Mode::Edit,
                always: true,
                parent: container,
                input: Some(inp),
                backup: Vec::new(),
            },
        );
        self.flush_effects()
    }

    pub fn container_state(&self, container: NodeId) -> Option<&ContainerState> {
        self.containers.get(&container)
    }

    pub fn field_state(&self, field: NodeId) -> Option<&FieldState> {
        self.fields.get(&field)
    }

    /// Force the next submit of `container` even without changed fields
    pub fn mark_changed(&mut self, container: NodeId) {
        self.containers.entry(container).or_default().changed = true;
    }
}
