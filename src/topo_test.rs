use std::cell::RefCell;
use std::rc::Rc;

use frames::Frame;
use serde_json::json;

use super::*;
use crate::dispatch::Dispatcher;
use crate::headless::HeadlessPanels;
use crate::services::PanelHost;

struct Fixture {
    model: Rc<RefCell<TopoModel>>,
    host: Rc<RefCell<HeadlessPanels>>,
    panels: Rc<RefCell<OwnedPanels>>,
    dispatcher: Dispatcher,
}

impl Fixture {
    fn new() -> Self {
        let model = Rc::new(RefCell::new(TopoModel::new()));
        let host = Rc::new(RefCell::new(HeadlessPanels::default()));
        let dyn_host: Rc<RefCell<dyn PanelHost>> = host.clone();
        let panels = Rc::new(RefCell::new(OwnedPanels::new(dyn_host)));
        let (dispatcher, _) = Dispatcher::bind(dispatch_table(&model, &panels));
        Self { model, host, panels, dispatcher }
    }

    fn send(&mut self, event: &str, payload: Value) -> bool {
        self.dispatcher.dispatch(&Frame::new(event, payload))
    }
}

// =============================================================
// Model
// =============================================================

#[test]
fn upsert_requires_string_id() {
    let mut model = TopoModel::new();
    assert!(!model.upsert(ElementKind::Device, &json!({"type": "switch"})));
    assert!(!model.upsert(ElementKind::Device, &json!({"id": 7})));
    assert_eq!(model.count(ElementKind::Device), 0);
    assert_eq!(model.revision(), 0);
}

#[test]
fn update_merges_fields_into_existing_element() {
    let mut model = TopoModel::new();
    model.upsert(ElementKind::Device, &json!({"id": "of:1", "online": true, "type": "switch"}));
    model.update(ElementKind::Device, &json!({"id": "of:1", "online": false}));
    assert_eq!(
        model.get(ElementKind::Device, "of:1"),
        Some(&json!({"id": "of:1", "online": false, "type": "switch"}))
    );
}

#[test]
fn update_of_unknown_element_inserts_it() {
    let mut model = TopoModel::new();
    assert!(model.update(ElementKind::Host, &json!({"id": "h1", "ip": "10.0.0.1"})));
    assert_eq!(model.count(ElementKind::Host), 1);
}

#[test]
fn remove_reports_presence() {
    let mut model = TopoModel::new();
    model.upsert(ElementKind::Link, &json!({"id": "a-b"}));
    assert!(model.remove(ElementKind::Link, &json!({"id": "a-b"})));
    assert!(!model.remove(ElementKind::Link, &json!({"id": "a-b"})));
    assert_eq!(model.count(ElementKind::Link), 0);
}

#[test]
fn batch_applies_every_kind_and_skips_bad_items() {
    let mut model = TopoModel::new();
    let applied = model.apply_batch(&json!({
        "instances": [{"id": "onos-1"}],
        "devices": [{"id": "of:1"}, {"id": "of:2"}, {"name": "no-id"}],
        "links": [{"id": "of:1/1-of:2/1"}],
        "hosts": "not-an-array"
    }));
    assert_eq!(applied, 4);
    assert_eq!(model.count(ElementKind::Instance), 1);
    assert_eq!(model.count(ElementKind::Device), 2);
    assert_eq!(model.count(ElementKind::Link), 1);
    assert_eq!(model.count(ElementKind::Host), 0);
    assert_eq!(model.ids(ElementKind::Device).collect::<Vec<_>>(), vec!["of:1", "of:2"]);
}

#[test]
fn snapshot_replaces_previous_contents() {
    let mut model = TopoModel::new();
    model.upsert(ElementKind::Device, &json!({"id": "old"}));
    model.set_summary(&json!({"title": "old"}));
    model.load_snapshot(&json!({"devices": [{"id": "new"}]}));
    assert!(model.get(ElementKind::Device, "old").is_none());
    assert!(model.get(ElementKind::Device, "new").is_some());
    assert_eq!(model.summary(), Some(&json!({"title": "old"})));
}

// =============================================================
// Dispatch table
// =============================================================

#[test]
fn element_events_route_to_model() {
    let mut fx = Fixture::new();
    assert!(fx.send("addDevice", json!({"id": "of:1", "online": true})));
    assert!(fx.send("updateDevice", json!({"id": "of:1", "online": false})));
    assert!(fx.send("addHost", json!({"id": "h1"})));
    assert!(fx.send("addLink", json!({"id": "l1"})));
    assert!(fx.send("removeLink", json!({"id": "l1"})));
    assert!(fx.send("addInstance", json!({"id": "onos-1"})));

    let model = fx.model.borrow();
    assert_eq!(model.get(ElementKind::Device, "of:1").map(|d| d["online"].clone()), Some(json!(false)));
    assert_eq!(model.count(ElementKind::Host), 1);
    assert_eq!(model.count(ElementKind::Link), 0);
    assert_eq!(model.count(ElementKind::Instance), 1);
}

#[test]
fn topo_update_and_snapshot_route_to_batch_ops() {
    let mut fx = Fixture::new();
    fx.send("topo.update", json!({"devices": [{"id": "of:1"}]}));
    fx.send("topo.update", json!({"devices": [{"id": "of:2"}]}));
    assert_eq!(fx.model.borrow().count(ElementKind::Device), 2);

    fx.send("topo.snapshot", json!({"hosts": [{"id": "h1"}]}));
    assert_eq!(fx.model.borrow().count(ElementKind::Device), 0);
    assert_eq!(fx.model.borrow().count(ElementKind::Host), 1);
}

#[test]
fn show_summary_creates_panel_once_and_shows_content() {
    let mut fx = Fixture::new();
    fx.send("showSummary", json!({"title": "ONOS Summary", "props": {"Devices": "3"}}));
    fx.send("showSummary", json!({"title": "ONOS Summary", "props": {"Devices": "4"}}));

    let host = fx.host.borrow();
    assert_eq!(host.created_count(), 1);
    let panel = host.panel(SUMMARY_PANEL).expect("summary panel");
    assert!(panel.visible);
    assert_eq!(panel.content["props"]["Devices"], "4");
    assert_eq!(fx.model.borrow().summary().map(|s| s["title"].clone()), Some(json!("ONOS Summary")));
}

#[test]
fn hide_summary_hides_owned_panel_only() {
    let mut fx = Fixture::new();
    fx.send("hideSummary", json!({}));
    assert!(!fx.host.borrow().exists(SUMMARY_PANEL));

    fx.send("showSummary", json!({"title": "t"}));
    fx.send("hideSummary", json!({}));
    let host = fx.host.borrow();
    assert!(!host.panel(SUMMARY_PANEL).expect("summary panel").visible);
}

#[test]
fn snapshot_keeps_summary_and_panel_in_step() {
    let mut fx = Fixture::new();
    fx.send("showSummary", json!({"title": "ONOS Summary"}));
    fx.send("topo.snapshot", json!({"devices": [{"id": "of:1"}]}));

    let host = fx.host.borrow();
    let panel = host.panel(SUMMARY_PANEL).expect("summary panel");
    assert!(panel.visible);
    assert_eq!(fx.model.borrow().summary(), Some(&panel.content));
}

#[test]
fn released_panels_are_destroyed() {
    let mut fx = Fixture::new();
    fx.send("showSummary", json!({"title": "t"}));
    assert_eq!(fx.panels.borrow_mut().release_all(), 1);
    assert!(!fx.host.borrow().exists(SUMMARY_PANEL));
    assert_eq!(fx.panels.borrow_mut().release_all(), 0);
}
