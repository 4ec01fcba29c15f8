//! Base input and the plain text-like types

use super::{Input, InputBehavior, InputCx, rc, value_text};
use crate::EditResult;
use serde_json::Value;
use std::rc::Rc;
use tc_core::{ClsError, Registry};
use tc_dom::{DomTree, El, NodeId, Selector};

pub(super) fn make(cx: &mut InputCx<'_>, _inp: &mut Input) -> EditResult<NodeId> {
    Ok(cx.dom.build(El::new("input").attr("type", "text")))
}

pub(super) fn set(cx: &mut InputCx<'_>, inp: &mut Input, value: Option<&str>) -> EditResult<()> {
    let value = match value {
        Some(v) => v.to_string(),
        None => cx.dom.text_content(inp.source).trim().to_string(),
    };
    cx.dom.set_value(inp.element, &value)?;
    Ok(())
}

/// Show the control's value in the display element; `value` (the value
/// accepted by the server) only feeds display templates
pub(super) fn apply(cx: &mut InputCx<'_>, inp: &mut Input, value: &Value) -> EditResult<()> {
    let text = text(cx.dom, inp);
    let source = inp.source;
    if let Some(tmpl) = cx.dom.attr(source, "data-edit-template").map(str::to_string) {
        let node = cx.templates.copy(cx.dom, &tmpl)?;
        inp.render_template(cx.dom, &tmpl, node, value)?;
        cx.dom.replace_children(source, vec![node])?;
    } else {
        cx.dom.set_text(source, &text)?;
        for node in &inp.static_elements {
            cx.dom.append_child(source, *node)?;
        }
    }
    cx.dom.set_attr(source, "data-edit-value", &text)?;
    Ok(())
}

pub(super) fn reset(cx: &mut InputCx<'_>, inp: &mut Input, reset_value: bool) -> EditResult<()> {
    inp.close_note(cx.dom)?;
    cx.dom.remove_class(inp.element, "validation-error")?;
    if reset_value {
        let value = match &inp.reset_value {
            Value::Null => None,
            v => Some(value_text(v)),
        };
        cx.dom.set_attr(inp.source, "data-edit-value", value.as_deref().unwrap_or(""))?;
        inp.set(cx, value.as_deref())?;
    }
    Ok(())
}

/// Truthiness of a form value (`true`, `"True"`, `"1"`, non-zero)
pub(super) fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true") || s == "1",
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

pub(super) fn text(dom: &DomTree, inp: &Input) -> String {
    value_text(&inp.get(dom))
}

struct Base;

impl InputBehavior for Base {}

macro_rules! derived {
    ($name:ident) => {
        struct $name {
            base: Rc<dyn InputBehavior>,
        }
    };
}

derived!(StringInput);

impl InputBehavior for StringInput {
    fn parent(&self) -> Option<&dyn InputBehavior> {
        Some(&*self.base)
    }

    fn action_on_enter(&self) -> bool {
        true
    }
}

derived!(Password);

impl InputBehavior for Password {
    fn parent(&self) -> Option<&dyn InputBehavior> {
        Some(&*self.base)
    }

    fn validate(&self, cx: &mut InputCx<'_>, inp: &mut Input) -> EditResult<bool> {
        let Some(peer) = cx.dom.attr(inp.source, "data-edit-confirm-with").map(str::to_string) else {
            return Ok(true);
        };
        let Some(container) = inp.container else {
            return Ok(true);
        };
        let other = cx
            .dom
            .query(container, &Selector::attr_eq("data-edit-name", &peer))
            .into_iter()
            .find_map(|n| cx.fields.get(&n).and_then(|f| f.input()));
        Ok(match other {
            Some(other) => other.get(cx.dom) == inp.get(cx.dom),
            None => true,
        })
    }

    fn validation_message(&self) -> &'static str {
        "Needs to match password"
    }
}

derived!(Email);

impl InputBehavior for Email {
    fn parent(&self) -> Option<&dyn InputBehavior> {
        Some(&*self.base)
    }

    fn placeholder(&self) -> Option<&'static str> {
        Some("name@example.com")
    }

    fn validate(&self, cx: &mut InputCx<'_>, inp: &mut Input) -> EditResult<bool> {
        let v = text(cx.dom, inp);
        Ok(v.is_empty() || v.contains('@'))
    }

    fn validation_message(&self) -> &'static str {
        "Needs to be a valid email address"
    }

    fn render_template(&self, dom: &mut DomTree, inp: &Input, template: &str, node: NodeId, value: &Value) -> EditResult<()> {
        if template != "link" {
            return self.base.render_template(dom, inp, template, node, value);
        }
        let v = value_text(value);
        dom.set_attr(node, "href", &format!("mailto:{}", v))?;
        dom.set_text(node, &v)?;
        Ok(())
    }
}

/// Latitude or longitude, bounded by `limit` degrees
struct Coordinate {
    base: Rc<dyn InputBehavior>,
    limit: f64,
    message: &'static str,
}

impl InputBehavior for Coordinate {
    fn parent(&self) -> Option<&dyn InputBehavior> {
        Some(&*self.base)
    }

    fn get(&self, dom: &DomTree, inp: &Input) -> Value {
        match dom.value(inp.element).trim().parse::<f64>() {
            Ok(f) if f != 0.0 && f.is_finite() => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
            _ => Value::Null,
        }
    }

    fn validate(&self, cx: &mut InputCx<'_>, inp: &mut Input) -> EditResult<bool> {
        let raw = cx.dom.value(inp.element).trim();
        if raw.is_empty() {
            return Ok(true);
        }
        Ok(raw.parse::<f64>().is_ok_and(|f| f.is_finite() && f.abs() <= self.limit))
    }

    fn validation_message(&self) -> &'static str {
        self.message
    }
}

derived!(UrlInput);

impl InputBehavior for UrlInput {
    fn parent(&self) -> Option<&dyn InputBehavior> {
        Some(&*self.base)
    }

    fn placeholder(&self) -> Option<&'static str> {
        Some("http://www.example.com")
    }

    fn validate(&self, cx: &mut InputCx<'_>, inp: &mut Input) -> EditResult<bool> {
        let v = text(cx.dom, inp);
        if v.is_empty() {
            return Ok(true);
        }
        if v.chars().any(char::is_whitespace) {
            return Ok(false);
        }
        if !has_scheme(&v) {
            inp.set(cx, Some(&format!("http://{}", v)))?;
        }
        Ok(true)
    }

    fn validation_message(&self) -> &'static str {
        "Needs to be a valid url"
    }

    fn render_template(&self, dom: &mut DomTree, inp: &Input, template: &str, node: NodeId, value: &Value) -> EditResult<()> {
        if template != "link" {
            return self.base.render_template(dom, inp, template, node, value);
        }
        let v = value_text(value);
        dom.set_attr(node, "href", &v)?;
        dom.set_text(node, &v)?;
        Ok(())
    }
}

/// `scheme://` prefix
pub(super) fn has_scheme(v: &str) -> bool {
    match v.split_once("://") {
        Some((scheme, _)) => {
            !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

derived!(Number);

impl InputBehavior for Number {
    fn parent(&self) -> Option<&dyn InputBehavior> {
        Some(&*self.base)
    }

    fn validate(&self, cx: &mut InputCx<'_>, inp: &mut Input) -> EditResult<bool> {
        let v = text(cx.dom, inp);
        // blank is not a number, required or not
        Ok(!v.is_empty() && v.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-')))
    }

    fn validation_message(&self) -> &'static str {
        "Needs to be a number"
    }
}

derived!(Bool);

impl InputBehavior for Bool {
    fn parent(&self) -> Option<&dyn InputBehavior> {
        Some(&*self.base)
    }

    fn make(&self, cx: &mut InputCx<'_>, _inp: &mut Input) -> EditResult<NodeId> {
        Ok(cx.dom.build(
            El::new("input")
                .attr("type", "checkbox")
                .class("editable input-note-relative"),
        ))
    }

    fn set(&self, cx: &mut InputCx<'_>, inp: &mut Input, value: Option<&str>) -> EditResult<()> {
        let v = match value {
            Some(v) => v.to_string(),
            None => cx.dom.text_content(inp.source).trim().to_string(),
        };
        cx.dom.set_checked(inp.element, truthy(&Value::String(v)))?;
        Ok(())
    }

    fn get(&self, dom: &DomTree, inp: &Input) -> Value {
        Value::Bool(dom.checked(inp.element))
    }

    fn blank(&self, dom: &DomTree, inp: &Input) -> bool {
        !dom.checked(inp.element)
    }

    fn required_message(&self) -> &'static str {
        "Check required"
    }

    fn apply(&self, cx: &mut InputCx<'_>, inp: &mut Input, value: &Value) -> EditResult<()> {
        let on = truthy(value);
        if cx.dom.has_attr(inp.source, "data-edit-template") {
            self.base.apply(cx, inp, &Value::Bool(on))?;
        } else {
            cx.dom.set_text(inp.source, if on { "Yes" } else { "No" })?;
        }
        cx.dom.set_attr(inp.source, "data-edit-value", if on { "true" } else { "false" })?;
        Ok(())
    }

    fn render_template(&self, dom: &mut DomTree, inp: &Input, template: &str, node: NodeId, value: &Value) -> EditResult<()> {
        if template != "check" {
            return self.base.render_template(dom, inp, template, node, value);
        }
        let src = if truthy(value) { "checkmark.png" } else { "checkmark-off.png" };
        dom.set_attr(node, "src", src)?;
        Ok(())
    }
}

derived!(Text);

impl InputBehavior for Text {
    fn parent(&self) -> Option<&dyn InputBehavior> {
        Some(&*self.base)
    }

    fn make(&self, cx: &mut InputCx<'_>, _inp: &mut Input) -> EditResult<NodeId> {
        Ok(cx.dom.build(El::new("textarea")))
    }
}

derived!(Readonly);

impl InputBehavior for Readonly {
    fn parent(&self) -> Option<&dyn InputBehavior> {
        Some(&*self.base)
    }

    fn make(&self, cx: &mut InputCx<'_>, _inp: &mut Input) -> EditResult<NodeId> {
        Ok(cx.dom.build(El::new("span").class("editable input-note-relative")))
    }

    fn set(&self, cx: &mut InputCx<'_>, inp: &mut Input, value: Option<&str>) -> EditResult<()> {
        let v = match value {
            Some(v) => v.to_string(),
            None => cx.dom.text_content(inp.source).trim().to_string(),
        };
        cx.dom.set_text(inp.element, &v)?;
        Ok(())
    }

    fn get(&self, dom: &DomTree, inp: &Input) -> Value {
        Value::String(dom.text_content(inp.element))
    }

    fn blank(&self, dom: &DomTree, inp: &Input) -> bool {
        dom.text_content(inp.element).is_empty()
    }
}

pub(super) fn register(reg: &mut Registry<dyn InputBehavior>) -> Result<(), ClsError> {
    reg.register("base", rc(Base))?;
    reg.extend("string", "base", |base| rc(StringInput { base }))?;
    reg.extend("password", "string", |base| rc(Password { base }))?;
    reg.extend("email", "string", |base| rc(Email { base }))?;
    reg.extend("latitude", "string", |base| {
        rc(Coordinate {
            base,
            limit: 90.0,
            message: "Needs to be a valid latitude",
        })
    })?;
    reg.extend("longitude", "string", |base| {
        rc(Coordinate {
            base,
            limit: 180.0,
            message: "Needs to be a valid longitude",
        })
    })?;
    reg.extend("url", "string", |base| rc(UrlInput { base }))?;
    reg.extend("number", "string", |base| rc(Number { base }))?;
    reg.extend("bool", "base", |base| rc(Bool { base }))?;
    reg.extend("text", "base", |base| rc(Text { base }))?;
    reg.extend("readonly", "text", |base| rc(Readonly { base }))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthy() {
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!("True")));
        assert!(truthy(&json!("1")));
        assert!(!truthy(&json!("0")));
        assert!(!truthy(&json!(null)));
        assert!(truthy(&json!(2)));
    }

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("https://example.com"));
        assert!(has_scheme("ftp://x"));
        assert!(!has_scheme("www.example.com"));
        assert!(!has_scheme("://x"));
    }
}
