//! Image upload input
//!
//! Files are uploaded to `data-edit-upload-path` as soon as they are
//! chosen; the field value itself is never exported. The editor performs
//! the requests, this module builds them and folds the responses back into
//! the control.

use super::{Input, InputBehavior, InputCx, rc, value_text};
use crate::{EditResult, humanize};
use serde_json::Value;
use std::rc::Rc;
use tc_core::{ClsError, Registry};
use tc_dom::{DomTree, El, NodeId, Selector};
use tc_net::{NetError, Request, Response};

/// Nodes of the upload control
#[derive(Debug, Clone)]
pub struct UploadState {
    /// Preview of the current image
    pub(crate) image: Option<NodeId>,
    pub(crate) clear: NodeId,
    pub(crate) upload: NodeId,
    pub(crate) file: NodeId,
    pub(crate) shim: NodeId,
}

impl UploadState {
    pub fn image(&self) -> Option<NodeId> {
        self.image
    }

    pub fn clear_button(&self) -> NodeId {
        self.clear
    }

    pub fn is_loading(&self, dom: &DomTree) -> bool {
        dom.is_shown(self.shim)
    }
}

fn upload_path(dom: &DomTree, inp: &Input) -> String {
    dom.attr(inp.source, "data-edit-upload-path").unwrap_or("").to_string()
}

fn field_name(dom: &DomTree, inp: &Input) -> String {
    dom.attr(inp.source, "data-edit-name").unwrap_or("").to_string()
}

/// Message for a failed request: the server's message for this field, or
/// the humanized status
fn xhr_error(result: &Result<Response, NetError>, name: &str) -> String {
    let (status, body) = match result {
        Ok(resp) => (resp.status, resp.json().unwrap_or(Value::Null)),
        Err(NetError::HttpError { status }) => (*status, Value::Null),
        Err(_) => (0, Value::Null),
    };
    match body.get(name) {
        Some(v) if !v.is_null() => value_text(v),
        _ => humanize(&format!("Http{}", status)).to_string(),
    }
}

/// File chosen: build the upload request
pub(crate) fn start_upload(dom: &mut DomTree, inp: &mut Input, filename: &str, bytes: Vec<u8>) -> EditResult<Option<Request>> {
    let Some(state) = inp.upload.clone() else {
        return Ok(None);
    };
    inp.close_note(dom)?;
    dom.set_attr(state.file, "value", filename)?;
    dom.show(state.upload)?;
    dom.show(state.shim)?;
    let name = field_name(dom, inp);
    Ok(Some(Request::post(&upload_path(dom, inp)).with_file(&name, filename, bytes)))
}

/// Upload finished; returns the new image url on success
pub(crate) fn finish_upload(dom: &mut DomTree, inp: &mut Input, result: Result<Response, NetError>) -> EditResult<Option<String>> {
    let Some(state) = inp.upload.clone() else {
        return Ok(None);
    };
    dom.hide(state.shim)?;
    let ok = result.as_ref().is_ok_and(Response::is_success);
    if ok {
        let url = result
            .as_ref()
            .ok()
            .and_then(|r| r.json().ok())
            .and_then(|b| b.get("url").map(value_text))
            .unwrap_or_default();
        let mut images = dom.query(inp.source, &Selector::parse("img")?);
        images.extend(state.image);
        for img in images {
            dom.set_attr(img, "src", &url)?;
            dom.show(img)?;
        }
        dom.show(state.clear)?;
        return Ok(Some(url));
    }

    let status = match &result {
        Ok(r) => r.status,
        Err(NetError::HttpError { status }) => *status,
        Err(_) => 0,
    };
    let message = if status == 413 {
        let max = dom
            .attr(inp.source, "data-edit-max-size")
            .and_then(|v| v.parse::<u64>().ok())
            .map(|size| format!(", max. {}kb", size / 1024))
            .unwrap_or_default();
        format!("File size too big{}", max)
    } else {
        xhr_error(&result, &field_name(dom, inp))
    };
    inp.show_validation_error(dom, Some(&message))?;
    Ok(None)
}

/// Remove clicked: build the delete request
pub(crate) fn start_remove(dom: &mut DomTree, inp: &mut Input) -> EditResult<Option<Request>> {
    let Some(state) = inp.upload.clone() else {
        return Ok(None);
    };
    inp.close_note(dom)?;
    dom.show(state.shim)?;
    Ok(Some(Request::delete(&upload_path(dom, inp))))
}

/// Removal finished; returns whether the image is gone
pub(crate) fn finish_remove(dom: &mut DomTree, inp: &mut Input, result: Result<Response, NetError>) -> EditResult<bool> {
    let Some(state) = inp.upload.clone() else {
        return Ok(false);
    };
    dom.hide(state.shim)?;
    if result.as_ref().is_ok_and(Response::is_success) {
        let mut images = dom.query(inp.source, &Selector::parse("img")?);
        images.extend(state.image);
        for img in images {
            dom.hide(img)?;
        }
        dom.hide(state.clear)?;
        return Ok(true);
    }
    let message = xhr_error(&result, &field_name(dom, inp));
    inp.show_validation_error(dom, Some(&message))?;
    Ok(false)
}

struct Image {
    base: Rc<dyn InputBehavior>,
}

impl InputBehavior for Image {
    fn parent(&self) -> Option<&dyn InputBehavior> {
        Some(&*self.base)
    }

    fn make(&self, cx: &mut InputCx<'_>, inp: &mut Input) -> EditResult<NodeId> {
        let dom = &mut *cx.dom;
        let node = dom.build(El::new("div").class("file-upload"));
        let current = dom.build_into(node, El::new("div").class("current"))?;
        let image = match dom.query_first(inp.source, &Selector::parse("img")?) {
            Some(img) => {
                let copy = dom.clone_subtree(img)?;
                dom.append_child(current, copy)?;
                Some(copy)
            }
            None => None,
        };
        let mut clear = El::new("input")
            .attr("type", "button")
            .class("btn btn-sm btn-danger btn-clear")
            .value("Remove");
        if dom.attr(inp.source, "data-edit-value").is_none_or(str::is_empty) {
            clear = clear.hidden();
        }
        let clear = dom.build_into(current, clear)?;

        let upload = dom.build_into(node, El::new("div").class("upload"))?;
        let mut file = El::new("input").attr("type", "file");
        if let Some(accept) = dom.attr(inp.source, "data-edit-accept") {
            file = file.attr("accept", accept);
        }
        let file = dom.build_into(upload, file)?;
        let button = dom.build_into(
            upload,
            El::new("input")
                .attr("type", "button")
                .class("btn btn-sm btn-default")
                .value("Upload")
                .hidden(),
        )?;
        let shim = dom.build_into(
            node,
            El::new("div").class("editable loading-shim single-field-shim").hidden(),
        )?;

        inp.upload = Some(UploadState {
            image,
            clear,
            upload: button,
            file,
            shim,
        });
        Ok(node)
    }

    fn apply(&self, cx: &mut InputCx<'_>, inp: &mut Input, _value: &Value) -> EditResult<()> {
        let preview = inp.upload.as_ref().and_then(|s| s.image);
        cx.dom.clear(inp.source)?;
        if let Some(img) = preview {
            let copy = cx.dom.clone_subtree(img)?;
            cx.dom.append_child(inp.source, copy)?;
        }
        Ok(())
    }
}

pub(super) fn register(reg: &mut Registry<dyn InputBehavior>) -> Result<(), ClsError> {
    reg.extend("image", "string", |base| rc(Image { base }))?;
    Ok(())
}
