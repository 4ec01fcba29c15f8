//! REST api target
//!
//! `data-edit-target="api:<endpoint>:<update|create|delete>[:<operation>]"`
//!
//! Updates go to `PUT /api/<endpoint>/<id>` when the export carries an
//! `_id`, otherwise they create through `POST /api/<endpoint>`. An
//! operation turns the call into `POST /api/<endpoint>/<id>/<operation>`.

use super::{Dispatch, Target, TargetBehavior, message_text, rc};
use crate::input::value_text;
use crate::{EditError, EditResult, Editor};
use serde_json::{Value, json};
use std::rc::Rc;
use tc_core::{ClsError, Registry};
use tc_net::{Method, NetError, Request, Response};

const REJECTED: &str = "The server rejected your data";
const PENDING_REVIEW: &str =
    "Parent entity pending review - please wait for it to be approved before adding entities to it";
const NO_PERMISSION: &str = "You do not have permissions to perform this action";

/// Positive numeric record id from an exported `_id`
fn record_id(value: Option<&Value>) -> Option<i64> {
    let id = match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    (id != 0).then_some(id)
}

fn truthy_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.as_str(), "True" | "true"),
        _ => false,
    }
}

/// Classify a failed response, annotating fields on 400
fn classify(ed: &mut Editor, target: &Target, resp: &Response) -> EditResult<EditError> {
    let body = resp.json().unwrap_or(Value::Null);

    if resp.status == 400 {
        let ignore = truthy_flag(body.pointer("/meta/ignore_field_error"));
        let mut info = if ignore { Vec::new() } else { vec![REJECTED.to_string()] };
        if let Some(fields) = body.as_object() {
            for (name, msg) in fields {
                if name == "meta" {
                    let err = msg.get("error").map(value_text).unwrap_or_default();
                    if ignore || err.is_empty() {
                        continue;
                    }
                    if err.contains("not yet been approved") {
                        info.push(PENDING_REVIEW.to_string());
                    } else if err != "Unknown" {
                        info.push(err);
                    }
                    continue;
                }
                ed.show_field_error(target.scope(), name, &message_text(msg), false)?;
                if name == "non_field_errors" {
                    if let Some(list) = msg.as_array() {
                        info.extend(list.iter().map(value_text));
                    }
                }
            }
        }
        tracing::warn!(status = 400, "api {} rejected data", target.arg(1).unwrap_or(""));
        return Ok(if ignore {
            EditError::Ignore
        } else {
            EditError::Http { info: info.join("<br />") }
        });
    }

    let info = match body.pointer("/meta/error") {
        Some(err) => value_text(err),
        None if resp.status == 403 => NO_PERMISSION.to_string(),
        None => format!("{} {}", resp.status, resp.status_text()),
    };
    tracing::warn!(status = resp.status, "api {} failed: {}", target.arg(1).unwrap_or(""), info);
    Ok(match resp.status {
        403 => EditError::Http403 { info },
        503 => EditError::Http503 { info },
        _ => EditError::Http { info },
    })
}

struct Api {
    base: Rc<dyn TargetBehavior>,
}

impl TargetBehavior for Api {
    fn parent(&self) -> Option<&dyn TargetBehavior> {
        Some(&*self.base)
    }

    fn execute(&self, ed: &mut Editor, target: &mut Target, _append: Option<&str>) -> EditResult<Dispatch> {
        let endpoint = target.arg(1).unwrap_or("").to_string();
        let request_type = target.arg(2).unwrap_or("");
        let operation = target.arg(3).filter(|op| !op.is_empty()).map(str::to_string);
        let id = record_id(target.data.get("_id"));

        let mut method = match request_type {
            "update" if id.is_some() => Method::Put,
            "update" | "create" => Method::Post,
            "delete" => Method::Delete,
            other => return Err(EditError::UnknownRequestType(other.to_string())),
        };

        let path = match (&operation, id) {
            (Some(op), _) => {
                method = Method::Post;
                let raw_id = target.data.get("_id").map(value_text).unwrap_or_default();
                format!("/api/{}/{}/{}", endpoint, raw_id, op)
            }
            (None, Some(id)) => format!("/api/{}/{}", endpoint, id),
            (None, None) => format!("/api/{}", endpoint),
        };

        if let Some(trigger) = target.trigger {
            if let Some(question) = ed.dom.attr(trigger, "data-confirm") {
                let question = question.to_string();
                if !ed.confirm(&question) {
                    tracing::debug!("api {} not confirmed", endpoint);
                    ed.loading_shim(target.sender, false)?;
                    return Ok(Dispatch::Skip);
                }
            }
        }

        tracing::info!("api {} {}", method.as_str(), path);
        Ok(Dispatch::Send(
            Request::new(method, &path).with_json(Value::Object(target.data.clone())),
        ))
    }

    fn complete(&self, ed: &mut Editor, target: &Target, result: Result<Response, NetError>) -> EditResult<Value> {
        match result {
            Ok(resp) if resp.is_success() => {
                let body = resp.json().unwrap_or(Value::Null);
                Ok(body.pointer("/data/0").cloned().unwrap_or_else(|| json!({})))
            }
            Ok(resp) => Err(classify(ed, target, &resp)?),
            Err(e) => {
                tracing::warn!("api {} failed: {}", target.arg(1).unwrap_or(""), e);
                Err(EditError::Http { info: e.to_string() })
            }
        }
    }
}

pub(super) fn register(reg: &mut Registry<dyn TargetBehavior>) -> Result<(), ClsError> {
    reg.extend("api", "base", |base| rc(Api { base }))?;
    Ok(())
}
