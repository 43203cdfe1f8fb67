//! Collaborator contracts the topology view drives but does not implement.
//!
//! Each service is a narrow capability handed to the view through
//! [`ViewContext`]. Services are shared as `Rc<RefCell<dyn ...>>` because the
//! view's callbacks (zoom changes, key presses, summary events) need to reach
//! them after activation, and everything runs on one task.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use canvas::surface::{LayerId, RenderSurface};
use serde_json::Value;

use crate::transport::Connector;

/// A key binding: the key, a human description, and the action.
pub struct KeyBinding {
    pub key: String,
    pub description: String,
    pub handler: Box<dyn FnMut()>,
}

impl KeyBinding {
    pub fn new(key: impl Into<String>, description: impl Into<String>, handler: impl FnMut() + 'static) -> Self {
        Self { key: key.into(), description: description.into(), handler: Box::new(handler) }
    }
}

impl std::fmt::Debug for KeyBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyBinding")
            .field("key", &self.key)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

pub trait KeyBindings {
    /// Install the view's bindings, replacing any previous set.
    fn bind(&mut self, bindings: Vec<KeyBinding>);
}

pub trait GlyphService {
    /// Load glyph definitions into `defs`.
    fn load_defs(&mut self, surface: &mut dyn RenderSurface, defs: LayerId);
}

pub trait MapService {
    /// Render the named background map into `layer`.
    fn load_map_into(&mut self, surface: &mut dyn RenderSurface, layer: LayerId, map: &str);
}

pub trait PanelHost {
    fn create(&mut self, name: &str);
    fn set_content(&mut self, name: &str, content: &Value);
    fn show(&mut self, name: &str);
    fn hide(&mut self, name: &str);
    fn destroy(&mut self, name: &str);
    fn exists(&self, name: &str) -> bool;
}

/// Everything a view needs from its host, passed in at activation.
pub struct ViewContext<C: Connector> {
    pub surface: Rc<RefCell<dyn RenderSurface>>,
    pub keys: Rc<RefCell<dyn KeyBindings>>,
    pub glyphs: Rc<RefCell<dyn GlyphService>>,
    pub maps: Rc<RefCell<dyn MapService>>,
    pub panels: Rc<RefCell<dyn PanelHost>>,
    pub connector: C,
}

/// Panels created by one view, so teardown destroys exactly those.
pub struct OwnedPanels {
    host: Rc<RefCell<dyn PanelHost>>,
    created: BTreeSet<String>,
}

impl OwnedPanels {
    #[must_use]
    pub fn new(host: Rc<RefCell<dyn PanelHost>>) -> Self {
        Self { host, created: BTreeSet::new() }
    }

    /// Create `name` unless this view already did. Returns `true` if created.
    pub fn ensure(&mut self, name: &str) -> bool {
        if self.created.contains(name) {
            return false;
        }
        self.host.borrow_mut().create(name);
        self.created.insert(name.to_owned());
        true
    }

    #[must_use]
    pub fn owns(&self, name: &str) -> bool {
        self.created.contains(name)
    }

    /// Run `f` against the host for a panel this view owns.
    pub fn with<F: FnOnce(&mut dyn PanelHost)>(&self, name: &str, f: F) -> bool {
        if !self.owns(name) {
            return false;
        }
        f(&mut *self.host.borrow_mut());
        true
    }

    /// Destroy every owned panel. Returns how many were destroyed.
    pub fn release_all(&mut self) -> usize {
        let names = std::mem::take(&mut self.created);
        let mut host = self.host.borrow_mut();
        for name in &names {
            host.destroy(name);
        }
        names.len()
    }
}
