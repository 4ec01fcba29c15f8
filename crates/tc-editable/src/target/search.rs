//! Advanced search target
//!
//! `data-edit-target="advanced_search:<reftag>"`. Purely client side:
//! `execute` turns the form into a query string and asks the page to
//! navigate there, `search` queries `/api/<reftag>` and renders the rows
//! into the form's `.results` element.

use super::{Dispatch, Target, TargetBehavior, http_json, rc};
use crate::input::value_text;
use crate::{EditError, EditResult, Editor, Event};
use serde_json::Value;
use std::collections::BTreeMap;
use std::rc::Rc;
use tc_core::{ClsError, Registry};
use tc_dom::{El, NodeId, Selector};
use tc_net::{NetError, Request, Response};

const ONE_COUNTRY: &str = "Please only select one country when filtering by distance.";

/// Leading integer of a value, the way form input is read
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim();
    let end = s
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+'))))
        .map_or(s.len(), |(i, _)| i);
    s[..end].parse().ok()
}

/// Cleaned export with list values comma joined
fn flatten(target: &Target) -> BTreeMap<String, String> {
    target
        .data_clean(true)
        .into_iter()
        .map(|(k, v)| (k, value_text(&v)))
        .collect()
}

fn positive_distance(params: &BTreeMap<String, String>) -> bool {
    params.get("distance").and_then(|d| leading_int(d)).is_some_and(|d| d > 0)
}

/// Unit formatted value of the sender's field `name`
fn formatted(ed: &Editor, scope: NodeId, name: &str) -> Option<String> {
    ed.dom
        .query(scope, &Selector::attr_eq("data-edit-name", name))
        .into_iter()
        .find_map(|node| ed.input(node))
        .map(|inp| inp.formatted(&ed.dom))
}

/// Query parameters for navigating to the search page
pub(crate) fn search_params(ed: &Editor, target: &Target) -> EditResult<BTreeMap<String, String>> {
    let mut params = flatten(target);
    let reftag = target.arg(1).unwrap_or("").to_string();

    // org autocompletes that allow free text yield either an id or a name
    if let Some(org) = params.remove("org") {
        if leading_int(&org).is_some() {
            params.insert("org".into(), org);
        } else {
            params.insert("org__name__contains".into(), org);
        }
    } else if let Some(name) = params.remove("org__name__contains") {
        if leading_int(&name).is_some() {
            params.insert("org".into(), name);
        } else {
            params.insert("org__name__contains".into(), name);
        }
    }

    if reftag == "ix" && params.contains_key("capacity__gte") {
        if let Some(capacity) = formatted(ed, target.sender, "capacity__gte") {
            params.insert("capacity__gte".into(), capacity);
        }
    }

    if positive_distance(&params) {
        if let Some(countries) = params.remove("country__in") {
            if countries.split(',').count() > 1 {
                return Err(EditError::Validation {
                    field: "country__in".into(),
                    message: ONE_COUNTRY.into(),
                });
            }
            params.insert("country".into(), countries);
        }
        if let Some(distance) = formatted(ed, target.sender, "distance") {
            params.insert("distance".into(), distance);
        }
    } else {
        params.remove("distance");
    }

    params.remove("undefined");
    params.insert("reftag".into(), reftag);
    Ok(params)
}

fn query_string(params: &BTreeMap<String, String>) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}

/// Per-reftag adjustments of a result row before it is rendered
fn finalize_row(reftag: &str, row: &mut Value) {
    if reftag != "net" {
        return;
    }
    let count = |row: &Value, key: &str| row.get(key).and_then(Value::as_array).map_or(0, Vec::len);
    let ix_count = count(row, "netixlan_set");
    let fac_count = count(row, "netfac_set");
    if let Some(obj) = row.as_object_mut() {
        obj.insert("ix_count".into(), ix_count.into());
        obj.insert("fac_count".into(), fac_count.into());
    }
}

/// Render search rows into the sender's `.results`; returns the row count
pub(crate) fn render_results(ed: &mut Editor, target: &Target, rows: &Value) -> EditResult<usize> {
    let sender = target.sender;
    let reftag = target.arg(1).unwrap_or("").to_string();
    let rows = rows.as_array().cloned().unwrap_or_default();

    let results = ed.dom.query_first(sender, &Selector::parse(".results")?);
    if let Some(results) = results {
        ed.dom.clear(results)?;
    }

    if rows.is_empty() {
        for node in ed.dom.query(sender, &Selector::parse(".results-empty")?) {
            ed.dom.show(node)?;
        }
    } else {
        if rows.len() == ed.config.search_limit {
            for node in ed.dom.query(sender, &Selector::parse(".results-cutoff")?) {
                ed.dom.show(node)?;
            }
        }
        let template = format!("advanced-search-{}-item", reftag);
        for mut data in rows.iter().cloned() {
            finalize_row(&reftag, &mut data);
            let row = ed.templates.copy(&mut ed.dom, &template)?;

            if let Some(name) = data.pointer("/sponsorship/name").map(value_text) {
                if let Some(anchor) = ed.dom.query_first(row, &Selector::parse(".name")?) {
                    let css = data.pointer("/sponsorship/css").map(value_text).unwrap_or_default();
                    let link = ed.dom.build(
                        El::new("a")
                            .attr("href", "/sponsors")
                            .class("sponsor")
                            .class(&css)
                            .text(&format!("{} sponsor", name.to_lowercase())),
                    );
                    ed.dom.insert_after(anchor, link)?;
                }
            }

            let id = data.get("id").map(value_text).unwrap_or_default();
            for field in ed.dom.query(row, &Selector::has_attr("data-edit-name")) {
                let name = ed.dom.attr(field, "data-edit-name").unwrap_or("").to_string();
                let value = data.get(&name).map(value_text).unwrap_or_default();
                let sort_key = ed.dom.attr(field, "data-sort-target").unwrap_or(&name).to_string();
                let sort_value = data.get(&sort_key).map(value_text).unwrap_or_default();
                ed.dom.set_attr(field, "data-sort-value", &sort_value.to_lowercase())?;
                ed.dom.set_text(field, &value)?;
                if ed.dom.tag(field) == Some("a") {
                    if let Some(href) = ed.dom.attr(field, "href") {
                        let href = href.replace("$id", &id);
                        ed.dom.set_attr(field, "href", &href)?;
                    }
                }
            }
            if let Some(results) = results {
                ed.dom.append_child(results, row)?;
            }
        }
    }

    ed.emit(Event::SearchResults {
        container: sender,
        reftag,
        count: rows.len(),
    });
    Ok(rows.len())
}

struct AdvancedSearch {
    base: Rc<dyn TargetBehavior>,
}

impl TargetBehavior for AdvancedSearch {
    fn parent(&self) -> Option<&dyn TargetBehavior> {
        Some(&*self.base)
    }

    fn execute(&self, ed: &mut Editor, target: &mut Target, _append: Option<&str>) -> EditResult<Dispatch> {
        let params = search_params(ed, target)?;
        let url = format!("?{}", query_string(&params));
        tracing::info!("advanced search {}", url);
        ed.emit(Event::Navigate { url: url.clone() });
        Ok(Dispatch::Done(Value::String(url)))
    }

    fn search(&self, ed: &mut Editor, target: &mut Target) -> EditResult<Dispatch> {
        let reftag = target.arg(1).unwrap_or("").to_string();
        let mut params = flatten(target);
        if positive_distance(&params) {
            if let Some(countries) = params.remove("country__in") {
                params.insert("country".into(), countries);
            }
        } else {
            params.remove("distance");
        }
        params.insert("limit".into(), ed.config.search_limit.to_string());
        params.insert("depth".into(), "1".into());

        for class in [".results-empty", ".results-cutoff"] {
            for node in ed.dom.query(target.sender, &Selector::parse(class)?) {
                ed.dom.hide(node)?;
            }
        }

        let mut req = Request::get(&format!("/api/{}", reftag));
        for (k, v) in &params {
            req = req.with_query(k, v);
        }
        tracing::info!("advanced search GET /api/{} ({} params)", reftag, params.len());
        Ok(Dispatch::Send(req))
    }

    fn complete(&self, ed: &mut Editor, target: &Target, result: Result<Response, NetError>) -> EditResult<Value> {
        let body = http_json(ed, target, result)?;
        Ok(body.get("data").cloned().unwrap_or_else(|| Value::Array(Vec::new())))
    }
}

pub(super) fn register(reg: &mut Registry<dyn TargetBehavior>) -> Result<(), ClsError> {
    reg.extend("advanced_search", "base", |base| rc(AdvancedSearch { base }))?;
    Ok(())
}
