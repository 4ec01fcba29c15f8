//! Editor runtime
//!
//! Owns the page, the registries, the network client and every piece of
//! per-element state. User interaction enters through the methods at the
//! bottom (`click`, `type_text`, ...); network completions enter through
//! [`Editor::deliver`] (or [`Editor::pump`]) and timers through
//! [`Editor::advance`]. Everything the page should react to is recorded
//! as an [`Event`].

use crate::action::{ActionBehavior, ActionRun, RunId, SubmitRun, default_actions};
use crate::input::{Effect, Input, InputBehavior, InputCx, autocomplete, default_inputs, image};
use crate::module::{ModuleBehavior, ModuleOp, ModuleRun, default_modules};
use crate::state::{ContainerState, FieldState, Mode};
use crate::target::{Dispatch, Target, TargetBehavior, default_targets, render_results};
use crate::{EditError, EditResult, EditorConfig, Event};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tc_core::{DataStore, LoadEvent, LoadOptions, LoadStatus, LoaderRegistry, Registry, TimerQueue};
use tc_dom::{DomTree, NodeId, Templates};
use tc_net::{Client, HttpTransport, NetError, Request, Response, Ticket, Transport};

/// What to do with a target's result
#[derive(Debug, Clone)]
pub(crate) enum Then {
    /// Main target of a submit
    Submit(RunId),
    /// Row operation of a module action
    Module { run: ModuleRun, op: ModuleOp },
    /// Render search results
    Search,
}

/// Request in flight outside the data store
#[derive(Debug)]
enum Pending {
    Target { target: Target, then: Then },
    Suggest { field: NodeId },
    Upload { field: NodeId },
    RemoveFile { field: NodeId },
}

/// Timer payloads
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Timed {
    EnterAction {
        trigger: NodeId,
        container: NodeId,
        action: String,
    },
    Autocomplete { field: NodeId },
}

/// Inline editing runtime for one page
pub struct Editor {
    pub(crate) dom: DomTree,
    pub(crate) templates: Templates,
    pub(crate) config: EditorConfig,
    pub(crate) client: Client,
    pub(crate) store: DataStore,

    pub(crate) inputs: Registry<dyn InputBehavior>,
    pub(crate) targets: Registry<dyn TargetBehavior>,
    pub(crate) actions: Registry<dyn ActionBehavior>,
    pub(crate) modules: Registry<dyn ModuleBehavior>,

    pub(crate) containers: HashMap<NodeId, ContainerState>,
    pub(crate) fields: HashMap<NodeId, FieldState>,
    /// Wired triggers and the container that wired them
    pub(crate) triggers: HashMap<NodeId, NodeId>,

    pub(crate) runs: HashMap<RunId, SubmitRun>,
    pub(crate) next_run: u64,

    pending: HashMap<Ticket, Pending>,
    pub(crate) timers: TimerQueue<Timed>,
    pub(crate) effects: Vec<Effect>,
    events: Vec<Event>,
    /// Fields waiting for a data set to fill their options
    data_waiters: HashMap<String, Vec<NodeId>>,
    confirm: Box<dyn FnMut(&str) -> bool>,
    initialized: bool,
}

impl Editor {
    /// Editor talking HTTP to `config.base_url`
    pub fn new(dom: DomTree, config: EditorConfig) -> EditResult<Self> {
        let transport = HttpTransport::new(&config.client_config())?;
        Self::with_transport(dom, config, transport)
    }

    pub fn with_transport(mut dom: DomTree, config: EditorConfig, transport: impl Transport + 'static) -> EditResult<Self> {
        let client = Client::with_transport(config.client_config(), transport)?;
        let templates = Templates::with_builtins(&mut dom);
        Ok(Self {
            dom,
            templates,
            config,
            client,
            store: DataStore::new(LoaderRegistry::with_defaults()),
            inputs: default_inputs(),
            targets: default_targets(),
            actions: default_actions(),
            modules: default_modules(),
            containers: HashMap::new(),
            fields: HashMap::new(),
            triggers: HashMap::new(),
            runs: HashMap::new(),
            next_run: 1,
            pending: HashMap::new(),
            timers: TimerQueue::new(),
            effects: Vec::new(),
            events: Vec::new(),
            data_waiters: HashMap::new(),
            confirm: Box::new(|_| true),
            initialized: false,
        })
    }

    /// Discover and wire everything editable on the page; runs once
    pub fn init(&mut self) -> EditResult<()> {
        if self.initialized {
            return Ok(());
        }
        self.initialized = true;

        let count = self.templates.init(&self.dom)?;
        for holder in self.dom.select("#editable-templates, .editable-templates")? {
            self.dom.detach(holder)?;
        }

        for field in self.dom.select(".editable.always")? {
            if self.dom.has_attr(field, "data-edit-type") && !self.dom.has_class(field, "auto-toggled") {
                self.manage_field(field)?;
            }
        }

        let containers = self.dom.select("[data-edit-target]")?;
        for container in &containers {
            self.init_container(*container)?;
        }

        for node in self.dom.select("[data-edit-module]")? {
            let mut module = self.instantiate_module(node)?;
            module.init(self)?;
        }
        tracing::info!("editor initialized: {} containers, {} templates", containers.len(), count);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn dom(&self) -> &DomTree {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut DomTree {
        &mut self.dom
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn templates_mut(&mut self) -> &mut Templates {
        &mut self.templates
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DataStore {
        &mut self.store
    }

    pub fn inputs_mut(&mut self) -> &mut Registry<dyn InputBehavior> {
        &mut self.inputs
    }

    pub fn targets_mut(&mut self) -> &mut Registry<dyn TargetBehavior> {
        &mut self.targets
    }

    pub fn actions_mut(&mut self) -> &mut Registry<dyn ActionBehavior> {
        &mut self.actions
    }

    pub fn modules_mut(&mut self) -> &mut Registry<dyn ModuleBehavior> {
        &mut self.modules
    }

    /// Input instance of a field in edit mode
    pub fn input(&self, field: NodeId) -> Option<&Input> {
        self.fields.get(&field).and_then(|f| f.input.as_ref())
    }

    /// Mode of a container, component or field
    pub fn mode(&self, node: NodeId) -> Mode {
        match self.containers.get(&node) {
            Some(state) => state.mode,
            None => self.fields.get(&node).map_or(Mode::View, |f| f.mode),
        }
    }

    /// Container that wired `trigger`
    pub fn trigger_container(&self, trigger: NodeId) -> Option<NodeId> {
        self.triggers.get(&trigger).copied()
    }

    /// Answer confirmation prompts with `f` (default: always yes)
    pub fn set_confirm(&mut self, f: impl FnMut(&str) -> bool + 'static) {
        self.confirm = Box::new(f);
    }

    pub(crate) fn confirm(&mut self, question: &str) -> bool {
        tracing::debug!("confirm: {}", question);
        (self.confirm)(question)
    }

    pub(crate) fn emit(&mut self, event: Event) {
        tracing::debug!("event {}", event.name());
        self.events.push(event);
    }

    /// Drain the events recorded so far
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Submits, module actions, suggestions and uploads still waiting
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.store.in_flight() == 0
    }

    // ------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------

    pub(crate) fn cx(&mut self) -> InputCx<'_> {
        InputCx {
            dom: &mut self.dom,
            templates: &self.templates,
            config: &self.config,
            fields: &self.fields,
            effects: &mut self.effects,
        }
    }

    /// Run `f` on the input of `field`; `None` if the field has none
    pub(crate) fn with_input<R>(
        &mut self,
        field: NodeId,
        f: impl FnOnce(&mut Input, &mut InputCx<'_>) -> EditResult<R>,
    ) -> EditResult<Option<R>> {
        let Some(mut inp) = self.fields.get_mut(&field).and_then(|s| s.input.take()) else {
            return Ok(None);
        };
        let mut cx = self.cx();
        let result = f(&mut inp, &mut cx);
        if let Some(state) = self.fields.get_mut(&field) {
            state.input = Some(inp);
        }
        let out = result?;
        self.flush_effects()?;
        Ok(Some(out))
    }

    /// Carry out what inputs asked for during the last call
    pub(crate) fn flush_effects(&mut self) -> EditResult<()> {
        for effect in std::mem::take(&mut self.effects) {
            match effect {
                Effect::LoadOptions { field, data_id } => {
                    match self.store.load(&mut self.client, &data_id, LoadOptions::new())? {
                        LoadStatus::Cached => self.fill_options(field, &data_id)?,
                        LoadStatus::Queued | LoadStatus::Dispatched(_) => {
                            self.data_waiters.entry(data_id).or_default().push(field);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Make a data set available without anyone waiting on it
    pub(crate) fn load_data(&mut self, id: &str) -> EditResult<()> {
        self.store.load(&mut self.client, id, LoadOptions::new())?;
        Ok(())
    }

    /// Feed a loaded data set to a field; its selection becomes the
    /// baseline
    fn fill_options(&mut self, field: NodeId, data_id: &str) -> EditResult<()> {
        let data = self.store.get(data_id).clone();
        self.with_input(field, |inp, cx| {
            inp.load(cx, &data)?;
            inp.original_value = inp.get(cx.dom);
            Ok(())
        })?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Targets and network
    // ------------------------------------------------------------------

    /// Execute `target` and route its result to `then`
    pub(crate) fn dispatch(&mut self, mut target: Target, append: Option<&str>, then: Then) -> EditResult<()> {
        let outcome = target.execute(self, append);
        self.route(target, outcome, then)
    }

    fn route(&mut self, target: Target, outcome: EditResult<Dispatch>, then: Then) -> EditResult<()> {
        match outcome {
            Ok(Dispatch::Send(request)) => match self.client.send(request) {
                Ok(ticket) => {
                    self.pending.insert(ticket, Pending::Target { target, then });
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!("{} could not be sent: {}", target.label(), e);
                    let error = EditError::Http { info: e.to_string() };
                    self.target_done(target, then, Err(error))
                }
            },
            Ok(Dispatch::Done(value)) => self.target_done(target, then, Ok(value)),
            Ok(Dispatch::Skip) => self.target_skipped(then),
            Err(error) if error.is_tagged() => self.target_done(target, then, Err(error)),
            Err(error) => Err(error),
        }
    }

    /// Target declined to run (refused confirmation); nothing will report
    fn target_skipped(&mut self, then: Then) -> EditResult<()> {
        match then {
            Then::Submit(run) => {
                if let Some(state) = self.runs.remove(&run) {
                    tracing::debug!("submit {} abandoned", run.0);
                    self.loading_shim(state.container, false)?;
                }
            }
            Then::Module { run, .. } => {
                if run.loading_shim {
                    self.loading_shim(run.container, false)?;
                }
            }
            Then::Search => {}
        }
        Ok(())
    }

    fn target_done(&mut self, target: Target, then: Then, result: EditResult<Value>) -> EditResult<()> {
        match then {
            Then::Submit(run) => self.submit_target_done(run, result),
            Then::Module { run, op } => self.module_target_done(run, op, result),
            Then::Search => match result {
                Ok(rows) => {
                    render_results(self, &target, &rows)?;
                    Ok(())
                }
                Err(error) => self.signal_error(target.sender, "search", error, false),
            },
        }
    }

    /// Feed one network completion to whoever is waiting for it
    pub fn deliver(&mut self, ticket: Ticket, result: Result<Response, NetError>) -> EditResult<()> {
        if self.store.owns(ticket) {
            match self.store.complete(ticket, result) {
                Some(LoadEvent::Loaded { payload, .. }) => {
                    self.emit(Event::DataLoaded { id: payload.id.clone() });
                    for field in self.data_waiters.remove(&payload.id).unwrap_or_default() {
                        self.fill_options(field, &payload.id)?;
                    }
                }
                Some(LoadEvent::Failed { id, .. }) => {
                    self.data_waiters.remove(&id);
                    self.emit(Event::DataFailed { id });
                }
                None => {}
            }
            return Ok(());
        }

        let Some(pending) = self.pending.remove(&ticket) else {
            tracing::warn!("completion for unknown request {}", ticket);
            return Ok(());
        };
        match pending {
            Pending::Target { target, then } => {
                let result = match target.complete(self, result) {
                    Err(error) if !error.is_tagged() => return Err(error),
                    other => other,
                };
                self.target_done(target, then, result)
            }
            Pending::Suggest { field } => {
                let body = result
                    .ok()
                    .filter(Response::is_success)
                    .and_then(|resp| resp.json().ok())
                    .unwrap_or(Value::Null);
                let choices = autocomplete::parse_results(&body);
                let state = self
                    .fields
                    .get_mut(&field)
                    .and_then(|f| f.input.as_mut())
                    .and_then(|inp| inp.autocomplete.as_mut());
                if let Some(state) = state {
                    state.results = choices.clone();
                }
                self.emit(Event::Suggestions { field, choices });
                Ok(())
            }
            Pending::Upload { field } => {
                let dom = &mut self.dom;
                let url = match self.fields.get_mut(&field).and_then(|f| f.input.as_mut()) {
                    Some(inp) => image::finish_upload(dom, inp, result)?,
                    None => None,
                };
                if let Some(url) = url {
                    self.emit(Event::Uploaded { field, url });
                }
                Ok(())
            }
            Pending::RemoveFile { field } => {
                let dom = &mut self.dom;
                let removed = match self.fields.get_mut(&field).and_then(|f| f.input.as_mut()) {
                    Some(inp) => image::finish_remove(dom, inp, result)?,
                    None => false,
                };
                if removed {
                    self.emit(Event::FileRemoved { field });
                }
                Ok(())
            }
        }
    }

    /// Deliver every completion available right now
    pub fn pump(&mut self) -> EditResult<usize> {
        let completions = self.client.poll();
        let count = completions.len();
        for (ticket, result) in completions {
            self.deliver(ticket, result)?;
        }
        Ok(count)
    }

    /// Block on the transport until nothing is in flight
    pub fn run_until_idle(&mut self) -> EditResult<usize> {
        let mut count = 0;
        while !self.is_idle() {
            let Some((ticket, result)) = self.client.wait() else {
                break;
            };
            self.deliver(ticket, result)?;
            count += 1;
        }
        Ok(count)
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    /// Move the clock forward, firing every timer that comes due
    pub fn advance(&mut self, by: Duration) -> EditResult<()> {
        for item in self.timers.advance(by) {
            self.fire(item)?;
        }
        Ok(())
    }

    fn fire(&mut self, item: Timed) -> EditResult<()> {
        match item {
            Timed::EnterAction {
                trigger,
                container,
                action,
            } => {
                let run = ActionRun {
                    name: action.clone(),
                    trigger,
                    container,
                };
                self.perform(&action, run)?;
            }
            Timed::Autocomplete { field } => {
                let Some(inp) = self.input(field) else {
                    return Ok(());
                };
                let reftag = autocomplete::reftag(&self.dom, inp);
                let text = self.dom.value(inp.element).to_string();
                let request = Request::get(&format!("/autocomplete/{}", reftag)).with_query("q", &text);
                let ticket = self.client.send(request)?;
                self.pending.insert(ticket, Pending::Suggest { field });
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // User interaction
    // ------------------------------------------------------------------

    /// Trigger clicked
    pub fn click(&mut self, node: NodeId) -> EditResult<()> {
        if self.triggers.contains_key(&node) {
            return self.run_trigger(node);
        }
        Ok(())
    }

    /// Control changed; triggers run their action, field controls notify
    /// their input
    pub fn change(&mut self, node: NodeId) -> EditResult<()> {
        if self.triggers.contains_key(&node) {
            return self.run_trigger(node);
        }
        self.with_input(node, |inp, cx| inp.changed_by_user(cx))?;
        Ok(())
    }

    fn require_input(&self, field: NodeId) -> EditResult<()> {
        match self.input(field) {
            Some(_) => Ok(()),
            None => Err(EditError::NoInput(field)),
        }
    }

    /// User set the control's value
    pub fn set_value(&mut self, field: NodeId, value: &str) -> EditResult<()> {
        self.require_input(field)?;
        self.with_input(field, |inp, cx| {
            cx.dom.set_value(inp.element, value)?;
            inp.changed_by_user(cx)
        })?;
        Ok(())
    }

    pub fn set_checked(&mut self, field: NodeId, checked: bool) -> EditResult<()> {
        self.require_input(field)?;
        self.with_input(field, |inp, cx| {
            cx.dom.set_checked(inp.element, checked)?;
            inp.changed_by_user(cx)
        })?;
        Ok(())
    }

    /// User picked a unit of a unit input
    pub fn select_unit(&mut self, field: NodeId, unit: &str) -> EditResult<()> {
        self.require_input(field)?;
        self.with_input(field, |inp, cx| {
            if let Some(select) = inp.unit_select() {
                cx.dom.select_value(select, &[unit])?;
            }
            inp.changed_by_user(cx)
        })?;
        Ok(())
    }

    /// User typed `text`; autocomplete fields query suggestions once the
    /// debounce delay passes without further typing
    pub fn type_text(&mut self, field: NodeId, text: &str) -> EditResult<()> {
        self.require_input(field)?;
        if self.input(field).is_some_and(|inp| inp.autocomplete.is_none()) {
            return self.set_value(field, text);
        }
        let delay = self.config.autocomplete_delay;
        let dom = &mut self.dom;
        let timers = &mut self.timers;
        let Some(inp) = self.fields.get_mut(&field).and_then(|f| f.input.as_mut()) else {
            return Err(EditError::NoInput(field));
        };
        let query = autocomplete::typed(dom, inp, text)?;
        if let Some(state) = inp.autocomplete.as_mut() {
            if query {
                state.timeout.set(timers, delay, Timed::Autocomplete { field });
            } else {
                state.timeout.cancel(timers);
                state.results.clear();
            }
        }
        Ok(())
    }

    /// Enter pressed in the control
    pub fn press_enter(&mut self, field: NodeId) -> EditResult<()> {
        let inp = self.input(field).ok_or(EditError::NoInput(field))?;
        if !inp.action_on_enter() {
            return Ok(());
        }
        let Some(container) = inp.container else {
            return Ok(());
        };
        let trigger = inp.element;
        let Some(action) = self.dom.attr(container, "data-edit-enter-action").map(str::to_string) else {
            return Ok(());
        };
        let delay = self.config.enter_action_delay;
        self.timers.schedule(
            delay,
            Timed::EnterAction {
                trigger,
                container,
                action,
            },
        );
        Ok(())
    }

    /// Control focused: clears its validation state
    pub fn focus(&mut self, field: NodeId) -> EditResult<()> {
        self.with_input(field, |inp, cx| inp.reset(cx, false))?;
        Ok(())
    }

    /// User picked an autocomplete suggestion
    pub fn choose(&mut self, field: NodeId, id: &str, text: &str) -> EditResult<()> {
        let dom = &mut self.dom;
        let timers = &mut self.timers;
        let Some(inp) = self.fields.get_mut(&field).and_then(|f| f.input.as_mut()) else {
            return Err(EditError::NoInput(field));
        };
        if let Some(state) = inp.autocomplete.as_mut() {
            state.timeout.cancel(timers);
        }
        autocomplete::select_choice(dom, inp, id, text)
    }

    /// User removed a chip of a multi autocomplete
    pub fn remove_choice(&mut self, field: NodeId, id: &str) -> EditResult<()> {
        let dom = &mut self.dom;
        let Some(inp) = self.fields.get_mut(&field).and_then(|f| f.input.as_mut()) else {
            return Err(EditError::NoInput(field));
        };
        autocomplete::remove_choice(dom, inp, id)
    }

    /// User chose a file for an image field; it is uploaded right away
    pub fn upload(&mut self, field: NodeId, filename: &str, bytes: Vec<u8>) -> EditResult<()> {
        let dom = &mut self.dom;
        let Some(inp) = self.fields.get_mut(&field).and_then(|f| f.input.as_mut()) else {
            return Err(EditError::NoInput(field));
        };
        if let Some(request) = image::start_upload(dom, inp, filename, bytes)? {
            let ticket = self.client.send(request)?;
            self.pending.insert(ticket, Pending::Upload { field });
        }
        Ok(())
    }

    /// User removed the image of an image field
    pub fn remove_file(&mut self, field: NodeId) -> EditResult<()> {
        let dom = &mut self.dom;
        let Some(inp) = self.fields.get_mut(&field).and_then(|f| f.input.as_mut()) else {
            return Err(EditError::NoInput(field));
        };
        if let Some(request) = image::start_remove(dom, inp)? {
            let ticket = self.client.send(request)?;
            self.pending.insert(ticket, Pending::RemoveFile { field });
        }
        Ok(())
    }

    /// Run the search of a container's target
    pub fn search(&mut self, container: NodeId) -> EditResult<()> {
        let mut target = match self.instantiate_target(container, None) {
            Ok(target) => target,
            Err(error) => return self.signal_error(container, "search", error, false),
        };
        let outcome = target.search(self);
        self.route(target, outcome, Then::Search)
    }

    /// Exported data of an editing container
    pub fn export_data(&mut self, container: NodeId) -> EditResult<Map<String, Value>> {
        if self.mode(container) != Mode::Edit && !self.dom.has_class(container, "always") {
            return Err(EditError::NotEditing(container));
        }
        let mut data = Map::new();
        self.export(container, &mut data)?;
        Ok(data)
    }
}
