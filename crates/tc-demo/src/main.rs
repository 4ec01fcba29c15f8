//! tc Demo - edit one network record against a live api
//!
//! Usage: `tc-demo [<net id> [<new name>]]`
//!
//! `TC_BASE_URL` points at the api host, `TC_CSRF_TOKEN` is sent with
//! every write.

use anyhow::Context;
use tc_dom::{DomTree, El, NodeId, Selector};
use tc_editable::{Editor, EditorConfig, Event};
use tracing_subscriber::EnvFilter;

/// Network page: name and speed fields plus toggle / submit triggers
fn page(id: &str) -> anyhow::Result<(DomTree, NodeId, NodeId)> {
    let mut dom = DomTree::new();
    let root = dom.root();
    let net = dom.build_into(
        root,
        El::new("div")
            .attr("id", "net")
            .attr("data-edit-target", "api:net:update")
            .attr("data-edit-id", id),
    )?;
    dom.build_into(
        net,
        El::new("div")
            .attr("data-edit-type", "string")
            .attr("data-edit-name", "name")
            .attr("data-edit-required", "yes"),
    )?;
    dom.build_into(
        net,
        El::new("div")
            .attr("data-edit-type", "traffic_capacity")
            .attr("data-edit-name", "info_traffic")
            .text("10 Gbps"),
    )?;
    let toggle = dom.build_into(net, El::new("a").attr("data-edit-action", "toggle-edit"))?;
    dom.build_into(net, El::new("a").attr("data-edit-action", "submit"))?;
    Ok((dom, net, toggle))
}

fn config_from_env() -> EditorConfig {
    let mut config = EditorConfig::default();
    if let Ok(url) = std::env::var("TC_BASE_URL") {
        config = config.base_url(&url);
    }
    if let Ok(token) = std::env::var("TC_CSRF_TOKEN") {
        config = config.csrf_token(&token);
    }
    config
}

fn log_events(ed: &mut Editor) {
    for event in ed.take_events() {
        match &event {
            Event::ActionError { action, error, .. } => {
                tracing::warn!("{} failed: {} {}", action, error.reason, error.info);
            }
            _ => tracing::info!(?event),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = std::env::args().skip(1);
    let id = args.next().unwrap_or_else(|| "1".to_string());
    let name = args.next().unwrap_or_else(|| "Example Network".to_string());

    let config = config_from_env();
    tracing::info!("editing net {} on {}", id, config.base_url);

    let (dom, net, toggle) = page(&id)?;
    let mut ed = Editor::new(dom, config).context("creating editor")?;
    ed.init().context("wiring page")?;

    ed.click(toggle)?;
    let field = ed
        .dom()
        .query_first(net, &Selector::attr_eq("data-edit-name", "name"))
        .context("page has no name field")?;
    ed.set_value(field, &name)?;
    let submit = ed
        .dom()
        .query_first(net, &Selector::attr_eq("data-edit-action", "submit"))
        .context("page has no submit trigger")?;
    ed.click(submit)?;

    let delivered = ed.run_until_idle().context("waiting for the api")?;
    log_events(&mut ed);
    tracing::info!("{} responses, net {} is in {} mode", delivered, id, ed.mode(net));
    Ok(())
}
