use std::cell::Cell;

use canvas::input::{Modifiers, WheelDelta};
use canvas::transform::Point;
use frames::Frame;
use serde_json::json;

use super::*;
use crate::headless::{GLYPHS, HeadlessGlyphs, HeadlessKeys, HeadlessMaps, HeadlessPanels, HeadlessSurface};
use crate::services::PanelHost;
use crate::topo::{ElementKind, SUMMARY_PANEL};
use crate::transport::{Link, LinkSink, TransportError};

#[derive(Default)]
struct MockConnector {
    sinks: Rc<RefCell<Vec<LinkSink>>>,
    closes: Rc<Cell<usize>>,
}

struct MockLink {
    closes: Rc<Cell<usize>>,
}

impl Link for MockLink {
    fn close(&mut self) {
        self.closes.set(self.closes.get() + 1);
    }
}

impl Connector for MockConnector {
    type Link = MockLink;

    fn connect(&mut self, sink: LinkSink) -> MockLink {
        self.sinks.borrow_mut().push(sink);
        MockLink { closes: Rc::clone(&self.closes) }
    }
}

struct Host {
    surface: Rc<RefCell<HeadlessSurface>>,
    keys: Rc<RefCell<HeadlessKeys>>,
    glyphs: Rc<RefCell<HeadlessGlyphs>>,
    maps: Rc<RefCell<HeadlessMaps>>,
    panels: Rc<RefCell<HeadlessPanels>>,
    sinks: Rc<RefCell<Vec<LinkSink>>>,
    closes: Rc<Cell<usize>>,
}

impl Host {
    fn activate() -> (Self, TopoView<MockConnector>) {
        let connector = MockConnector::default();
        let host = Self {
            surface: Rc::new(RefCell::new(HeadlessSurface::default())),
            keys: Rc::new(RefCell::new(HeadlessKeys::default())),
            glyphs: Rc::new(RefCell::new(HeadlessGlyphs::default())),
            maps: Rc::new(RefCell::new(HeadlessMaps::default())),
            panels: Rc::new(RefCell::new(HeadlessPanels::default())),
            sinks: Rc::clone(&connector.sinks),
            closes: Rc::clone(&connector.closes),
        };
        let ctx = ViewContext {
            surface: host.surface.clone(),
            keys: host.keys.clone(),
            glyphs: host.glyphs.clone(),
            maps: host.maps.clone(),
            panels: host.panels.clone(),
            connector,
        };
        let view = TopoView::activate(ctx, &ViewConfig::default());
        (host, view)
    }

    fn sink(&self) -> LinkSink {
        self.sinks.borrow().last().cloned().expect("a link was opened")
    }

    fn stroke_width(&self, view: &TopoView<MockConnector>) -> Option<String> {
        self.surface.borrow().style(view.layers().map, "stroke-width").map(str::to_owned)
    }

    fn layer_transform(&self, view: &TopoView<MockConnector>) -> Option<Transform> {
        self.surface.borrow().layer(view.layers().zoom).and_then(|l| l.transform)
    }
}

fn open(host: &Host, view: &mut TopoView<MockConnector>) {
    host.sink().connected();
    view.channel_mut().pump();
    assert_eq!(view.channel_state(), ChannelState::Open);
}

#[test]
fn activation_builds_decorations_and_opens_channel() {
    let (host, view) = Host::activate();
    let surface = host.surface.borrow();
    let layers = view.layers();

    assert_eq!(surface.children(LayerId::ROOT), vec![layers.defs, layers.zoom]);
    assert_eq!(surface.children(layers.zoom), vec![layers.map]);
    assert_eq!(surface.children(layers.defs).len(), GLYPHS.len());
    assert_eq!(host.maps.borrow().loaded(), &[(layers.map, "*continental_us".to_owned())]);
    assert_eq!(host.glyphs.borrow().loads(), 1);
    drop(surface);

    assert_eq!(host.stroke_width(&view).as_deref(), Some("2px"));
    assert_eq!(view.transform(), Transform::IDENTITY);
    assert_eq!(view.channel_state(), ChannelState::Connecting);
    assert_eq!(host.sinks.borrow().len(), 1);
    assert!(view.dispatch().handles(&crate::dispatch::EventKind::TopoSnapshot));
}

#[test]
fn exactly_three_key_bindings() {
    let (host, _view) = Host::activate();
    let keys: Vec<String> = host.keys.borrow().describe().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["R", "W", "E"]);
    assert!(host.keys.borrow_mut().press("W"));
    assert!(host.keys.borrow_mut().press("E"));
}

#[test]
fn gestures_without_modifier_are_ignored() {
    let (host, view) = Host::activate();
    assert!(!view.on_gesture(&Gesture::pan(10.0, 10.0, Modifiers::NONE)));
    assert_eq!(view.transform(), Transform::IDENTITY);
    assert_eq!(host.layer_transform(&view), Some(Transform::IDENTITY));
}

#[test]
fn zoom_keeps_layer_and_stroke_width_in_sync() {
    let (host, view) = Host::activate();
    assert!(view.on_gesture(&Gesture::pan(30.0, -10.0, Modifiers::alt())));
    assert!(view.on_gesture(&Gesture::zoom(4.0, Point::new(0.0, 0.0), Modifiers::meta())));

    let t = view.transform();
    assert_eq!(t, Transform { translate_x: 120.0, translate_y: -40.0, scale: 4.0 });
    assert_eq!(host.layer_transform(&view), Some(t));
    assert_eq!(host.stroke_width(&view).as_deref(), Some("0.5px"));
}

#[test]
fn wheel_zoom_is_clamped_to_extent() {
    let (_host, view) = Host::activate();
    let wheel = Gesture::wheel(WheelDelta { dx: 0.0, dy: 100_000.0 }, Point::new(5.0, 5.0), Modifiers::alt());
    assert!(view.on_gesture(&wheel));
    assert!((view.transform().scale - 0.25).abs() < 1e-12);
}

#[test]
fn reset_key_returns_to_identity() {
    let (host, view) = Host::activate();
    view.on_gesture(&Gesture::zoom(2.0, Point::new(10.0, 10.0), Modifiers::alt()));
    assert_ne!(view.transform(), Transform::IDENTITY);

    assert!(host.keys.borrow_mut().press("r"));
    assert_eq!(view.transform(), Transform::IDENTITY);
    assert_eq!(host.stroke_width(&view).as_deref(), Some("2px"));
}

#[test]
fn reset_key_after_drop_is_harmless() {
    let (host, view) = Host::activate();
    drop(view);
    assert!(host.keys.borrow_mut().press("R"));
}

#[test]
fn events_update_model_and_summary_panel() {
    let (host, mut view) = Host::activate();
    let sink = host.sink();
    sink.frame(Frame::new("addDevice", json!({"id": "of:0001", "online": true})));
    open(&host, &mut view);

    sink.frame(Frame::new("showSummary", json!({"title": "ONOS Summary"})));
    view.channel_mut().pump();

    let model = view.model().borrow();
    assert!(model.get(ElementKind::Device, "of:0001").is_some());
    assert_eq!(model.summary(), Some(&json!({"title": "ONOS Summary"})));
    drop(model);

    let panels = host.panels.borrow();
    let summary = panels.panel(SUMMARY_PANEL).expect("summary panel created");
    assert!(summary.visible);
    assert_eq!(view.dispatch().dispatched(), 2);
}

#[test]
fn teardown_closes_channel_and_destroys_owned_panels_once() {
    let (host, mut view) = Host::activate();
    open(&host, &mut view);
    host.sink().frame(Frame::new("showSummary", json!({"title": "x"})));
    view.channel_mut().pump();
    assert!(host.panels.borrow().exists(SUMMARY_PANEL));

    view.teardown();
    assert!(view.is_torn_down());
    assert_eq!(view.channel_state(), ChannelState::Closed);
    assert!(!host.panels.borrow().exists(SUMMARY_PANEL));
    assert_eq!(host.closes.get(), 1);

    view.teardown();
    drop(view);
    assert_eq!(host.closes.get(), 1);
}

#[test]
fn teardown_without_summary_destroys_nothing() {
    let (host, view) = Host::activate();
    drop(view);
    assert_eq!(host.panels.borrow().created_count(), 0);
    assert_eq!(host.closes.get(), 1);
}

#[test]
fn recover_reopens_after_failure() {
    let (host, mut view) = Host::activate();
    open(&host, &mut view);
    host.sink().failed(TransportError::Other("reset by peer".to_owned()));
    view.channel_mut().pump();
    assert_eq!(view.channel_state(), ChannelState::Closed);
    assert!(view.channel().last_error().is_some());

    view.recover();
    assert_eq!(view.channel_state(), ChannelState::Connecting);
    assert_eq!(host.sinks.borrow().len(), 2);

    view.teardown();
    view.recover();
    assert_eq!(view.channel_state(), ChannelState::Closed);
    assert_eq!(host.sinks.borrow().len(), 2);
}

/// Records how many layers the surface held when bindings were installed.
struct OrderKeys {
    surface: Rc<RefCell<HeadlessSurface>>,
    layers_at_bind: Option<usize>,
    bindings: Vec<KeyBinding>,
}

impl crate::services::KeyBindings for OrderKeys {
    fn bind(&mut self, bindings: Vec<KeyBinding>) {
        self.layers_at_bind = Some(self.surface.borrow().len());
        self.bindings = bindings;
    }
}

#[test]
fn keys_are_bound_before_decorations_and_reset_still_works() {
    let surface = Rc::new(RefCell::new(HeadlessSurface::default()));
    let keys = Rc::new(RefCell::new(OrderKeys {
        surface: Rc::clone(&surface),
        layers_at_bind: None,
        bindings: Vec::new(),
    }));
    let ctx = ViewContext {
        surface: surface.clone(),
        keys: keys.clone(),
        glyphs: Rc::new(RefCell::new(HeadlessGlyphs::default())),
        maps: Rc::new(RefCell::new(HeadlessMaps::default())),
        panels: Rc::new(RefCell::new(HeadlessPanels::default())),
        connector: MockConnector::default(),
    };
    let view = TopoView::activate(ctx, &ViewConfig::default());
    assert_eq!(keys.borrow().layers_at_bind, Some(1));

    view.on_gesture(&Gesture::pan(15.0, 5.0, Modifiers::alt()));
    let mut keys = keys.borrow_mut();
    let reset = keys.bindings.iter_mut().find(|b| b.key == "R").expect("reset binding");
    (reset.handler)();
    assert_eq!(view.transform(), Transform::IDENTITY);
}
