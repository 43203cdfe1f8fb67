//! Headless collaborators: in-memory stand-ins for the browser services.
//!
//! They keep enough state to be inspected (layer tree, styles, bound keys,
//! panel contents) and log what a real surface would draw. The CLI runs the
//! view on top of them; tests use them to observe the view.

#[cfg(test)]
#[path = "headless_test.rs"]
mod headless_test;

use std::collections::BTreeMap;

use canvas::surface::{LayerId, RenderSurface};
use canvas::transform::Transform;
use serde_json::Value;
use tracing::{debug, info, trace};

use crate::services::{GlyphService, KeyBinding, KeyBindings, MapService, PanelHost};

/// Glyph ids loaded into the defs layer.
pub const GLYPHS: &[&str] = &[
    "unknown",
    "node",
    "switch",
    "roadm",
    "router",
    "endstation",
    "bgpSpeaker",
    "uiAttached",
    "bird",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub parent: Option<LayerId>,
    pub styles: BTreeMap<String, String>,
    pub transform: Option<Transform>,
}

impl Layer {
    fn new(name: &str, parent: Option<LayerId>) -> Self {
        Self { name: name.to_owned(), parent, styles: BTreeMap::new(), transform: None }
    }
}

/// Layer tree kept in memory.
#[derive(Debug)]
pub struct HeadlessSurface {
    layers: Vec<Layer>,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self { layers: vec![Layer::new("svg", None)] }
    }
}

impl HeadlessSurface {
    #[must_use]
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id.0 as usize)
    }

    /// First layer with the given name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<LayerId> {
        self.layers
            .iter()
            .position(|l| l.name == name)
            .and_then(|i| u32::try_from(i).ok())
            .map(LayerId)
    }

    /// Children of `parent`, in append order.
    #[must_use]
    pub fn children(&self, parent: LayerId) -> Vec<LayerId> {
        self.layers
            .iter()
            .enumerate()
            .filter(|(_, l)| l.parent == Some(parent))
            .filter_map(|(i, _)| u32::try_from(i).ok().map(LayerId))
            .collect()
    }

    #[must_use]
    pub fn style(&self, id: LayerId, property: &str) -> Option<&str> {
        self.layer(id).and_then(|l| l.styles.get(property)).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl RenderSurface for HeadlessSurface {
    fn append_layer(&mut self, parent: LayerId, name: &str) -> LayerId {
        let id = LayerId(u32::try_from(self.layers.len()).unwrap_or(u32::MAX));
        self.layers.push(Layer::new(name, Some(parent)));
        trace!(?parent, ?id, name, "layer appended");
        id
    }

    fn set_style(&mut self, layer: LayerId, property: &str, value: &str) {
        if let Some(l) = self.layers.get_mut(layer.0 as usize) {
            l.styles.insert(property.to_owned(), value.to_owned());
            trace!(layer = %l.name, property, value, "style set");
        }
    }

    fn set_transform(&mut self, layer: LayerId, transform: &Transform) {
        if let Some(l) = self.layers.get_mut(layer.0 as usize) {
            l.transform = Some(*transform);
            trace!(layer = %l.name, transform = %transform.to_svg(), "transform set");
        }
    }
}

/// Key bindings that are triggered by name.
#[derive(Debug, Default)]
pub struct HeadlessKeys {
    bindings: Vec<KeyBinding>,
}

impl HeadlessKeys {
    /// Run the binding for `key` (case-insensitive). Returns `false` if unbound.
    pub fn press(&mut self, key: &str) -> bool {
        match self.bindings.iter_mut().find(|b| b.key.eq_ignore_ascii_case(key)) {
            Some(binding) => {
                debug!(key = %binding.key, description = %binding.description, "key binding triggered");
                (binding.handler)();
                true
            }
            None => false,
        }
    }

    /// `(key, description)` pairs, in registration order.
    #[must_use]
    pub fn describe(&self) -> Vec<(String, String)> {
        self.bindings.iter().map(|b| (b.key.clone(), b.description.clone())).collect()
    }
}

impl KeyBindings for HeadlessKeys {
    fn bind(&mut self, bindings: Vec<KeyBinding>) {
        self.bindings = bindings;
    }
}

/// Appends one child layer per known glyph.
#[derive(Debug, Default)]
pub struct HeadlessGlyphs {
    loads: usize,
}

impl HeadlessGlyphs {
    #[must_use]
    pub fn loads(&self) -> usize {
        self.loads
    }
}

impl GlyphService for HeadlessGlyphs {
    fn load_defs(&mut self, surface: &mut dyn RenderSurface, defs: LayerId) {
        for glyph in GLYPHS {
            surface.append_layer(defs, glyph);
        }
        self.loads += 1;
        debug!(glyphs = GLYPHS.len(), "glyph defs loaded");
    }
}

/// Records which map was loaded where.
#[derive(Debug, Default)]
pub struct HeadlessMaps {
    loaded: Vec<(LayerId, String)>,
}

impl HeadlessMaps {
    #[must_use]
    pub fn loaded(&self) -> &[(LayerId, String)] {
        &self.loaded
    }
}

impl MapService for HeadlessMaps {
    fn load_map_into(&mut self, surface: &mut dyn RenderSurface, layer: LayerId, map: &str) {
        surface.append_layer(layer, map.trim_start_matches('*'));
        self.loaded.push((layer, map.to_owned()));
        info!(map, "background map loaded");
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelState {
    pub visible: bool,
    pub content: Value,
}

/// Floating panels kept by name.
#[derive(Debug, Default)]
pub struct HeadlessPanels {
    panels: BTreeMap<String, PanelState>,
    created: usize,
}

impl HeadlessPanels {
    #[must_use]
    pub fn panel(&self, name: &str) -> Option<&PanelState> {
        self.panels.get(name)
    }

    /// Total panels ever created, including destroyed ones.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.created
    }
}

impl PanelHost for HeadlessPanels {
    fn create(&mut self, name: &str) {
        self.panels.insert(name.to_owned(), PanelState::default());
        self.created += 1;
        debug!(panel = name, "panel created");
    }

    fn set_content(&mut self, name: &str, content: &Value) {
        if let Some(panel) = self.panels.get_mut(name) {
            panel.content = content.clone();
        }
    }

    fn show(&mut self, name: &str) {
        if let Some(panel) = self.panels.get_mut(name) {
            panel.visible = true;
            info!(panel = name, content = %panel.content, "panel shown");
        }
    }

    fn hide(&mut self, name: &str) {
        if let Some(panel) = self.panels.get_mut(name) {
            panel.visible = false;
            debug!(panel = name, "panel hidden");
        }
    }

    fn destroy(&mut self, name: &str) {
        if self.panels.remove(name).is_some() {
            debug!(panel = name, "panel destroyed");
        }
    }

    fn exists(&self, name: &str) -> bool {
        self.panels.contains_key(name)
    }
}
