//! Targets
//!
//! A target turns the data exported from a container into an external
//! effect. Containers declare it as `data-edit-target="<name>:<arg>..."`;
//! a name that is not registered is taken as the URL of an `XHRPost`
//! target. Executing a target yields a [`Dispatch`]: a request for the
//! editor to send, an immediate result, or nothing at all. Responses come
//! back through [`TargetBehavior::complete`].

mod api;
mod search;

pub(crate) use search::render_results;

use crate::input::value_text;
use crate::{EditError, EditResult, Editor, Event};
use serde_json::{Map, Value};
use std::fmt;
use std::rc::Rc;
use tc_core::{ClsError, Registry};
use tc_dom::NodeId;
use tc_net::{NetError, Request, Response};

/// What executing a target asks of the editor
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Send the request; the response goes to `complete`
    Send(Request),
    /// Finished without a network round-trip
    Done(Value),
    /// Nothing happens (refused confirmation, no-op target)
    Skip,
}

/// Target behavior
pub trait TargetBehavior {
    fn parent(&self) -> Option<&dyn TargetBehavior> {
        None
    }

    /// Start the submission; `append` extends the endpoint path
    fn execute(&self, ed: &mut Editor, target: &mut Target, append: Option<&str>) -> EditResult<Dispatch> {
        inherit!(self.execute(ed, target, append) or Ok(Dispatch::Skip))
    }

    /// Read-only query variant of `execute`
    fn search(&self, ed: &mut Editor, target: &mut Target) -> EditResult<Dispatch> {
        inherit!(self.search(ed, target) or Err(EditError::SearchUnsupported(target.kind().to_string())))
    }

    /// Turn a response into the success payload or a tagged error
    fn complete(&self, ed: &mut Editor, target: &Target, result: Result<Response, NetError>) -> EditResult<Value> {
        inherit!(self.complete(ed, target, result) or http_json(ed, target, result))
    }
}

/// Target instance bound to one container
#[derive(Clone)]
pub struct Target {
    kind: String,
    behavior: Rc<dyn TargetBehavior>,
    /// `data-edit-target` split on `:`
    pub args: Vec<String>,
    /// Exported field values plus `_changed`, `_valid`, `_id`,
    /// `_validationErrors`
    pub data: Map<String, Value>,
    /// Container the data was exported from
    pub sender: NodeId,
    /// Element that receives field errors instead of the sender
    pub context: Option<NodeId>,
    /// Element whose action started the submission
    pub trigger: Option<NodeId>,
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("kind", &self.kind)
            .field("args", &self.args)
            .field("sender", &self.sender)
            .field("data", &self.data)
            .finish()
    }
}

impl Target {
    pub(crate) fn new(
        kind: String,
        behavior: Rc<dyn TargetBehavior>,
        args: Vec<String>,
        sender: NodeId,
        trigger: Option<NodeId>,
        data: Map<String, Value>,
    ) -> Self {
        Self {
            kind,
            behavior,
            args,
            data,
            sender,
            context: None,
            trigger,
        }
    }

    /// Registered target type
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// First declared argument (target name or URL)
    pub fn label(&self) -> &str {
        self.arg(0).unwrap_or("")
    }

    pub fn arg(&self, i: usize) -> Option<&str> {
        self.args.get(i).map(String::as_str)
    }

    pub fn set_arg(&mut self, i: usize, value: &str) {
        if self.args.len() <= i {
            self.args.resize(i + 1, String::new());
        }
        self.args[i] = value.to_string();
    }

    /// Element whose fields get annotated with server errors
    pub fn scope(&self) -> NodeId {
        self.context.unwrap_or(self.sender)
    }

    /// Exported data without bookkeeping keys; `remove_empty` also drops
    /// nulls, empty strings and empty lists
    pub fn data_clean(&self, remove_empty: bool) -> Map<String, Value> {
        self.data
            .iter()
            .filter(|(k, _)| !k.starts_with('_'))
            .filter(|(_, v)| {
                !remove_empty
                    || !match v {
                        Value::Null => true,
                        Value::String(s) => s.is_empty(),
                        Value::Array(a) => a.is_empty(),
                        _ => false,
                    }
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn data_valid(&self) -> bool {
        self.data.get("_valid").is_some_and(|v| v.as_bool() == Some(true))
    }

    /// Number of changed fields in the export
    pub fn changed(&self) -> u64 {
        self.data.get("_changed").and_then(Value::as_u64).unwrap_or(0)
    }

    pub fn execute(&mut self, ed: &mut Editor, append: Option<&str>) -> EditResult<Dispatch> {
        let b = Rc::clone(&self.behavior);
        b.execute(ed, self, append)
    }

    pub fn search(&mut self, ed: &mut Editor) -> EditResult<Dispatch> {
        let b = Rc::clone(&self.behavior);
        b.search(ed, self)
    }

    pub fn complete(&self, ed: &mut Editor, result: Result<Response, NetError>) -> EditResult<Value> {
        self.behavior.complete(ed, self, result)
    }
}

struct Base;

impl TargetBehavior for Base {}

/// POST to the URL given as first argument
struct XhrPost {
    base: Rc<dyn TargetBehavior>,
}

impl TargetBehavior for XhrPost {
    fn parent(&self) -> Option<&dyn TargetBehavior> {
        Some(&*self.base)
    }

    fn execute(&self, ed: &mut Editor, target: &mut Target, append: Option<&str>) -> EditResult<Dispatch> {
        ed.clear_error_popins(target.scope())?;
        let mut url = target.label().to_string();
        if let Some(append) = append {
            url.push('/');
            url.push_str(append);
        }
        tracing::info!("XHRPost {}", url);
        Ok(Dispatch::Send(Request::post(&url).with_json(Value::Object(target.data_clean(true)))))
    }

    fn complete(&self, ed: &mut Editor, target: &Target, result: Result<Response, NetError>) -> EditResult<Value> {
        let resp = match result {
            Ok(resp) if resp.is_success() => resp,
            other => return http_json(ed, target, other),
        };
        let mut data = target.data.clone();
        data.insert("xhr_response".into(), resp.json().unwrap_or_else(|_| Value::String(resp.text())));
        if let Some(url) = ed.dom.attr(target.scope(), "data-edit-redirect-on-success") {
            let url = url.to_string();
            ed.emit(Event::Navigate { url });
        }
        Ok(Value::Object(data))
    }
}

/// Text of a server error message (lists are comma joined)
pub(crate) fn message_text(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(","),
        other => value_text(other),
    }
}

fn messages(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(value_text).collect(),
        Value::Null => Vec::new(),
        other => vec![value_text(other)],
    }
}

/// Default handling of a JSON response: success bodies pass through,
/// failures annotate fields (400) and become an `HTTPError`
pub(crate) fn http_json(ed: &mut Editor, target: &Target, result: Result<Response, NetError>) -> EditResult<Value> {
    let resp = match result {
        Ok(resp) if resp.is_success() => return Ok(resp.json().unwrap_or(Value::Null)),
        Ok(resp) => resp,
        Err(e) => {
            tracing::warn!("{} failed: {}", target.label(), e);
            return Err(EditError::Http { info: e.to_string() });
        }
    };
    let body = resp.json().unwrap_or(Value::Null);
    let message = body.get("message").map(value_text).unwrap_or_default();
    let info = match resp.status {
        400 => {
            let mut info = vec!["The server rejected your data".to_string()];
            if let Some(fields) = body.as_object() {
                for (name, msg) in fields {
                    ed.show_field_error(target.scope(), name, &message_text(msg), true)?;
                    if name == "non_field_errors" {
                        info.extend(messages(msg));
                    }
                }
            }
            info
        }
        429 => vec!["Too Many Requests".to_string(), message],
        403 => vec!["Forbidden".to_string(), message],
        status => match body.get("non_field_errors") {
            Some(errors) => messages(errors),
            None => vec![format!("{} {}", status, resp.status_text())],
        },
    };
    tracing::warn!(status = resp.status, "{} rejected: {}", target.label(), info.join("; "));
    Err(EditError::Http { info: info.join("<br />") })
}

impl Editor {
    /// Target declared by `container`; exports the container's fields
    /// into the target data
    pub fn instantiate_target(&mut self, container: NodeId, trigger: Option<NodeId>) -> EditResult<Target> {
        let declared = self
            .dom
            .attr(container, "data-edit-target")
            .ok_or(EditError::NoTarget(container))?
            .to_string();
        let args: Vec<String> = declared.split(':').map(str::to_string).collect();
        let name = args.first().map(String::as_str).unwrap_or("");
        let kind = if self.targets.has(name) { name.to_string() } else { "XHRPost".to_string() };
        let behavior = self.targets.get(&kind)?;

        let mut data = Map::new();
        self.export(container, &mut data)?;
        Ok(Target::new(kind, behavior, args, container, trigger, data))
    }
}

fn rc(behavior: impl TargetBehavior + 'static) -> Rc<dyn TargetBehavior> {
    Rc::new(behavior)
}

fn register(reg: &mut Registry<dyn TargetBehavior>) -> Result<(), ClsError> {
    reg.register("base", rc(Base))?;
    reg.extend("XHRPost", "base", |base| rc(XhrPost { base }))?;
    api::register(reg)?;
    search::register(reg)?;
    Ok(())
}

/// Registry holding every built-in target
pub fn default_targets() -> Registry<dyn TargetBehavior> {
    Registry::builtin("target", register)
}
