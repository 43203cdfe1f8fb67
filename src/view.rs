//! Topology view lifecycle.
//!
//! DESIGN
//! ======
//! `TopoView::activate` wires one view together in a fixed order: the key
//! bindings, surface decorations (defs + glyphs, zoom layer, map layer + map),
//! the `ZoomController` whose change callback keeps the zoom layer transform
//! and the map stroke width in sync, and finally the `EventChannel` with the
//! topology dispatch table bound and the socket opened. The reset binding is
//! registered before the controller exists and reaches it through a slot
//! filled once the controller is built.
//!
//! `teardown` closes the channel and destroys the panels this view created.
//! It is idempotent and also runs on drop, so the transport never outlives
//! the view. Key handlers hold weak references and become no-ops once the
//! view is gone.

#[cfg(test)]
#[path = "view_test.rs"]
mod view_test;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use canvas::consts::MAP_STROKE_WIDTH_PX;
use canvas::input::Gesture;
use canvas::surface::{LayerId, RenderSurface};
use canvas::transform::Transform;
use canvas::zoom::{ZoomConfig, ZoomController, modifier_held};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::channel::{ChannelState, EventChannel};
use crate::config::ViewConfig;
use crate::dispatch::DispatcherHandle;
use crate::services::{KeyBinding, OwnedPanels, ViewContext};
use crate::topo::{self, TopoModel};
use crate::transport::Connector;

pub const DEFS_LAYER: &str = "defs";
pub const ZOOM_LAYER: &str = "topo-zoomlayer";
pub const MAP_LAYER: &str = "topo-map";

/// Layer handles created at activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewLayers {
    pub defs: LayerId,
    pub zoom: LayerId,
    pub map: LayerId,
}

pub struct TopoView<C: Connector> {
    id: Uuid,
    span: tracing::Span,
    layers: ViewLayers,
    zoom: Rc<RefCell<ZoomController>>,
    channel: EventChannel<C>,
    dispatch: DispatcherHandle,
    model: Rc<RefCell<TopoModel>>,
    panels: Rc<RefCell<OwnedPanels>>,
    torn_down: bool,
}

impl<C: Connector> TopoView<C> {
    /// Build the view on the host's services and start the event channel.
    ///
    /// # Panics
    ///
    /// Panics if the connector does, e.g. a [`crate::transport::WsConnector`]
    /// used outside a tokio runtime.
    pub fn activate(ctx: ViewContext<C>, config: &ViewConfig) -> Self {
        let id = Uuid::new_v4();
        let span = tracing::info_span!("topo_view", view_id = %id);
        let ViewContext { surface, keys, glyphs, maps, panels, connector } = ctx;

        span.in_scope(|| {
            let zoom_slot: ZoomSlot = Rc::new(RefCell::new(Weak::new()));
            keys.borrow_mut().bind(key_bindings(Rc::clone(&zoom_slot)));

            let layers = {
                let mut s = surface.borrow_mut();
                let root = s.root();
                let defs = s.append_layer(root, DEFS_LAYER);
                glyphs.borrow_mut().load_defs(&mut *s, defs);
                let zoom = s.append_layer(root, ZOOM_LAYER);
                let map = s.append_layer(zoom, MAP_LAYER);
                maps.borrow_mut().load_map_into(&mut *s, map, &config.map);
                let layers = ViewLayers { defs, zoom, map };
                apply_transform(&mut *s, layers, &Transform::IDENTITY);
                layers
            };

            let on_change_surface = Rc::clone(&surface);
            let on_change = move |t: &Transform| {
                apply_transform(&mut *on_change_surface.borrow_mut(), layers, t);
                debug!(tx = t.translate_x, ty = t.translate_y, scale = t.scale, "zoom changed");
            };
            let zoom_config = ZoomConfig::new(modifier_held, on_change).with_extent(config.scale_extent());
            let zoom = Rc::new(RefCell::new(ZoomController::new(zoom_config)));
            *zoom_slot.borrow_mut() = Rc::downgrade(&zoom);

            let model = Rc::new(RefCell::new(TopoModel::new()));
            let panels = Rc::new(RefCell::new(OwnedPanels::new(panels)));
            let mut channel = EventChannel::new(connector);
            let dispatch = channel.bind_dispatcher(topo::dispatch_table(&model, &panels));
            channel.open_sock();

            info!(map = %config.map, kinds = dispatch.kinds().len(), "topology view activated");
            Self {
                id,
                span: span.clone(),
                layers,
                zoom,
                channel,
                dispatch,
                model,
                panels,
                torn_down: false,
            }
        })
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn layers(&self) -> ViewLayers {
        self.layers
    }

    /// Feed a gesture to the zoom controller. Returns whether it moved the view.
    pub fn on_gesture(&self, gesture: &Gesture) -> bool {
        self.zoom.borrow_mut().on_gesture(gesture)
    }

    pub fn reset_zoom(&self) {
        self.zoom.borrow_mut().reset();
    }

    #[must_use]
    pub fn transform(&self) -> Transform {
        self.zoom.borrow().transform()
    }

    #[must_use]
    pub fn channel_state(&self) -> ChannelState {
        self.channel.state()
    }

    pub fn channel(&self) -> &EventChannel<C> {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut EventChannel<C> {
        &mut self.channel
    }

    #[must_use]
    pub fn dispatch(&self) -> &DispatcherHandle {
        &self.dispatch
    }

    #[must_use]
    pub fn model(&self) -> &Rc<RefCell<TopoModel>> {
        &self.model
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Re-open the channel after a transport failure. No-op once torn down.
    pub fn recover(&mut self) {
        if self.torn_down {
            warn!(view_id = %self.id, "recover ignored; view torn down");
            return;
        }
        let _span = self.span.enter();
        info!(last_error = ?self.channel.last_error().map(ToString::to_string), "recovering topo event channel");
        self.channel.open_sock();
    }

    /// Close the channel and destroy every panel this view created.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        let _span = self.span.enter();
        self.channel.close_sock();
        let destroyed = self.panels.borrow_mut().release_all();
        info!(
            destroyed,
            dispatched = self.dispatch.dispatched(),
            dropped = self.dispatch.dropped(),
            "topology view torn down"
        );
    }
}

impl<C: Connector> Drop for TopoView<C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Push `t` to the zoom layer and keep the map outline a constant width.
fn apply_transform(surface: &mut dyn RenderSurface, layers: ViewLayers, t: &Transform) {
    surface.set_transform(layers.zoom, t);
    let width = t.compensate(MAP_STROKE_WIDTH_PX);
    surface.set_style(layers.map, "stroke-width", &format!("{width}px"));
}

/// Late-bound handle to the view's controller, empty until activation builds it.
type ZoomSlot = Rc<RefCell<Weak<RefCell<ZoomController>>>>;

fn key_bindings(zoom: ZoomSlot) -> Vec<KeyBinding> {
    vec![
        KeyBinding::new("R", "Reset pan / zoom", move || {
            let controller = zoom.borrow().upgrade();
            if let Some(zoom) = controller {
                zoom.borrow_mut().reset();
            }
        }),
        KeyBinding::new("W", "Log a warning", || warn!("topology view: diagnostic warning")),
        KeyBinding::new("E", "Log an error", || error!("topology view: diagnostic error")),
    ]
}
