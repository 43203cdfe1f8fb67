//! In-memory topology model fed by the event channel.
//!
//! The model is the contract between the event feed and whatever draws the
//! topology: handlers only mutate the model (and the summary panel), and the
//! renderer reads it. Elements are kept as the JSON objects the server sent,
//! keyed by their `id`, so new server-side fields flow through untouched.

#[cfg(test)]
#[path = "topo_test.rs"]
mod topo_test;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::dispatch::{DispatchTable, EventKind};
use crate::services::OwnedPanels;

/// Name of the floating summary panel.
pub const SUMMARY_PANEL: &str = "topo-p-summary";

/// Kinds of topology element tracked by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ElementKind {
    Instance,
    Device,
    Link,
    Host,
}

impl ElementKind {
    pub const ALL: [Self; 4] = [Self::Instance, Self::Device, Self::Link, Self::Host];

    /// Key of this kind's array in a batch payload.
    #[must_use]
    pub fn batch_key(self) -> &'static str {
        match self {
            Self::Instance => "instances",
            Self::Device => "devices",
            Self::Link => "links",
            Self::Host => "hosts",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    Update,
    Remove,
}

#[derive(Debug, Default)]
pub struct TopoModel {
    elements: BTreeMap<ElementKind, BTreeMap<String, Value>>,
    summary: Option<Value>,
    revision: u64,
}

impl TopoModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumped on every change; renderers compare it to skip redundant work.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn get(&self, kind: ElementKind, id: &str) -> Option<&Value> {
        self.elements.get(&kind).and_then(|m| m.get(id))
    }

    #[must_use]
    pub fn count(&self, kind: ElementKind) -> usize {
        self.elements.get(&kind).map_or(0, BTreeMap::len)
    }

    pub fn ids(&self, kind: ElementKind) -> impl Iterator<Item = &str> {
        self.elements.get(&kind).into_iter().flat_map(|m| m.keys().map(String::as_str))
    }

    #[must_use]
    pub fn summary(&self) -> Option<&Value> {
        self.summary.as_ref()
    }

    /// Insert or replace an element. Returns `false` if the payload has no id.
    pub fn upsert(&mut self, kind: ElementKind, payload: &Value) -> bool {
        let Some(id) = element_id(kind, payload) else {
            return false;
        };
        self.elements.entry(kind).or_default().insert(id.to_owned(), payload.clone());
        self.revision += 1;
        true
    }

    /// Shallow-merge fields into an existing element, inserting it if absent.
    pub fn update(&mut self, kind: ElementKind, payload: &Value) -> bool {
        let Some(id) = element_id(kind, payload) else {
            return false;
        };
        let slot = self.elements.entry(kind).or_default();
        match (slot.get_mut(id), payload.as_object()) {
            (Some(Value::Object(existing)), Some(fields)) => {
                for (k, v) in fields {
                    existing.insert(k.clone(), v.clone());
                }
            }
            _ => {
                slot.insert(id.to_owned(), payload.clone());
            }
        }
        self.revision += 1;
        true
    }

    /// Remove an element. Returns `true` if it was present.
    pub fn remove(&mut self, kind: ElementKind, payload: &Value) -> bool {
        let Some(id) = element_id(kind, payload) else {
            return false;
        };
        let removed = self.elements.get_mut(&kind).and_then(|m| m.remove(id)).is_some();
        if removed {
            self.revision += 1;
        } else {
            debug!(?kind, id, "remove for unknown element");
        }
        removed
    }

    /// Upsert every element listed in a batch payload. Returns how many applied.
    pub fn apply_batch(&mut self, payload: &Value) -> usize {
        let mut applied = 0;
        for kind in ElementKind::ALL {
            let Some(items) = payload.get(kind.batch_key()).and_then(Value::as_array) else {
                continue;
            };
            applied += items.iter().filter(|item| self.upsert(kind, item)).count();
        }
        applied
    }

    /// Replace every element with a batch payload.
    ///
    /// The summary is left alone; it is driven by its own summary events and
    /// stays in step with the summary panel.
    pub fn load_snapshot(&mut self, payload: &Value) -> usize {
        self.elements.clear();
        self.revision += 1;
        self.apply_batch(payload)
    }

    pub fn set_summary(&mut self, payload: &Value) {
        self.summary = Some(payload.clone());
        self.revision += 1;
    }
}

fn element_id<'a>(kind: ElementKind, payload: &'a Value) -> Option<&'a str> {
    let id = payload.get("id").and_then(Value::as_str);
    if id.is_none() {
        warn!(?kind, "topo element payload has no string id; ignored");
    }
    id
}

/// Build the dispatch table a topology view binds to its channel.
pub fn dispatch_table(model: &Rc<RefCell<TopoModel>>, panels: &Rc<RefCell<OwnedPanels>>) -> DispatchTable {
    let mut table = DispatchTable::new();

    let m = Rc::clone(model);
    table.insert(EventKind::TopoSnapshot, move |payload: &Value| {
        let loaded = m.borrow_mut().load_snapshot(payload);
        debug!(loaded, "topology snapshot loaded");
    });

    let m = Rc::clone(model);
    table.insert(EventKind::TopoUpdate, move |payload: &Value| {
        let applied = m.borrow_mut().apply_batch(payload);
        debug!(applied, "topology update applied");
    });

    let element_events = [
        (EventKind::AddInstance, ElementKind::Instance, Op::Add),
        (EventKind::UpdateInstance, ElementKind::Instance, Op::Update),
        (EventKind::RemoveInstance, ElementKind::Instance, Op::Remove),
        (EventKind::AddDevice, ElementKind::Device, Op::Add),
        (EventKind::UpdateDevice, ElementKind::Device, Op::Update),
        (EventKind::RemoveDevice, ElementKind::Device, Op::Remove),
        (EventKind::AddLink, ElementKind::Link, Op::Add),
        (EventKind::UpdateLink, ElementKind::Link, Op::Update),
        (EventKind::RemoveLink, ElementKind::Link, Op::Remove),
        (EventKind::AddHost, ElementKind::Host, Op::Add),
        (EventKind::UpdateHost, ElementKind::Host, Op::Update),
        (EventKind::RemoveHost, ElementKind::Host, Op::Remove),
    ];
    for (event, kind, op) in element_events {
        let m = Rc::clone(model);
        table.insert(event, move |payload: &Value| {
            let mut model = m.borrow_mut();
            match op {
                Op::Add => model.upsert(kind, payload),
                Op::Update => model.update(kind, payload),
                Op::Remove => model.remove(kind, payload),
            };
        });
    }

    let m = Rc::clone(model);
    let p = Rc::clone(panels);
    table.insert(EventKind::ShowSummary, move |payload: &Value| {
        m.borrow_mut().set_summary(payload);
        let mut panels = p.borrow_mut();
        panels.ensure(SUMMARY_PANEL);
        panels.with(SUMMARY_PANEL, |host| {
            host.set_content(SUMMARY_PANEL, payload);
            host.show(SUMMARY_PANEL);
        });
    });

    let p = Rc::clone(panels);
    table.insert(EventKind::HideSummary, move |_: &Value| {
        p.borrow().with(SUMMARY_PANEL, |host| host.hide(SUMMARY_PANEL));
    });

    table
}
