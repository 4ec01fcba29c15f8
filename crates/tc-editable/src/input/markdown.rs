//! Markdown input
//!
//! Edited as plain text, displayed rendered. Raw HTML in the source is
//! kept as literal text and links are limited to http(s).

use super::{Input, InputBehavior, InputCx, rc, value_text};
use crate::EditResult;
use pulldown_cmark::{Event, Parser, Tag};
use serde_json::Value;
use std::rc::Rc;
use tc_core::{ClsError, Registry};
use tc_dom::{DomTree, NodeId};

/// Link target allowed in rendered markdown; scheme-less targets are
/// taken as http, anything but http(s) is dropped
pub(crate) fn safe_href(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    let has_scheme = url.split_once(':').is_some_and(|(scheme, _)| !scheme.is_empty());
    let url = if has_scheme { url.to_string() } else { format!("http://{}", url) };
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http:") || lower.starts_with("https:") {
        url
    } else {
        String::new()
    }
}

/// Render markdown below `parent`
pub(crate) fn render(dom: &mut DomTree, parent: NodeId, markdown: &str) -> EditResult<()> {
    let mut stack = vec![parent];
    for event in Parser::new(markdown) {
        let top = *stack.last().unwrap_or(&parent);
        match event {
            Event::Start(tag) => {
                let node = match tag {
                    Tag::Paragraph => dom.create_element("p"),
                    Tag::Heading { level, .. } => dom.create_element(&format!("h{}", level as usize)),
                    Tag::BlockQuote(_) => dom.create_element("blockquote"),
                    Tag::CodeBlock(_) => dom.create_element("pre"),
                    Tag::List(Some(_)) => dom.create_element("ol"),
                    Tag::List(None) => dom.create_element("ul"),
                    Tag::Item => dom.create_element("li"),
                    Tag::Emphasis => dom.create_element("em"),
                    Tag::Strong => dom.create_element("strong"),
                    Tag::Strikethrough => dom.create_element("del"),
                    Tag::Link { dest_url, .. } => {
                        let a = dom.create_element("a");
                        dom.set_attr(a, "href", &safe_href(&dest_url))?;
                        a
                    }
                    Tag::Image { dest_url, .. } => {
                        let img = dom.create_element("img");
                        dom.set_attr(img, "src", &dest_url)?;
                        img
                    }
                    Tag::Table(_) => dom.create_element("table"),
                    Tag::TableHead => dom.create_element("thead"),
                    Tag::TableRow => dom.create_element("tr"),
                    Tag::TableCell => dom.create_element("td"),
                    _ => dom.create_element("span"),
                };
                dom.append_child(top, node)?;
                stack.push(node);
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                let t = dom.create_text(&text);
                dom.append_child(top, t)?;
            }
            Event::Code(code) => {
                let c = dom.create_element("code");
                let t = dom.create_text(&code);
                dom.append_child(c, t)?;
                dom.append_child(top, c)?;
            }
            Event::SoftBreak => {
                let t = dom.create_text("\n");
                dom.append_child(top, t)?;
            }
            Event::HardBreak => {
                let br = dom.create_element("br");
                dom.append_child(top, br)?;
            }
            Event::Rule => {
                let hr = dom.create_element("hr");
                dom.append_child(top, hr)?;
            }
            _ => {}
        }
    }
    Ok(())
}

struct Markdown {
    base: Rc<dyn InputBehavior>,
}

impl InputBehavior for Markdown {
    fn parent(&self) -> Option<&dyn InputBehavior> {
        Some(&*self.base)
    }

    fn apply(&self, cx: &mut InputCx<'_>, inp: &mut Input, value: &Value) -> EditResult<()> {
        let text = value_text(value);
        cx.dom.clear(inp.source)?;
        render(cx.dom, inp.source, &text)?;
        cx.dom.set_attr(inp.source, "data-edit-value", &text)?;
        Ok(())
    }
}

pub(super) fn register(reg: &mut Registry<dyn InputBehavior>) -> Result<(), ClsError> {
    reg.extend("markdown", "text", |base| rc(Markdown { base }))?;
    Ok(())
}
