use std::cell::Cell;
use std::rc::Rc;

use super::*;

#[test]
fn surface_starts_with_root_layer() {
    let surface = HeadlessSurface::default();
    assert_eq!(surface.len(), 1);
    assert_eq!(surface.root(), LayerId::ROOT);
    assert_eq!(surface.layer(LayerId::ROOT).map(|l| l.name.as_str()), Some("svg"));
}

#[test]
fn surface_tracks_tree_styles_and_transforms() {
    let mut surface = HeadlessSurface::default();
    let zoom = surface.append_layer(LayerId::ROOT, "topo-zoomlayer");
    let map = surface.append_layer(zoom, "topo-map");
    surface.set_style(map, "stroke-width", "1px");
    let t = Transform { translate_x: 5.0, translate_y: 6.0, scale: 2.0 };
    surface.set_transform(zoom, &t);

    assert_eq!(surface.find("topo-map"), Some(map));
    assert_eq!(surface.children(LayerId::ROOT), vec![zoom]);
    assert_eq!(surface.children(zoom), vec![map]);
    assert_eq!(surface.style(map, "stroke-width"), Some("1px"));
    assert_eq!(surface.layer(zoom).and_then(|l| l.transform), Some(t));
}

#[test]
fn surface_ignores_unknown_layers() {
    let mut surface = HeadlessSurface::default();
    surface.set_style(LayerId(42), "fill", "red");
    assert_eq!(surface.style(LayerId(42), "fill"), None);
    assert_eq!(surface.len(), 1);
}

#[test]
fn keys_press_is_case_insensitive_and_reports_unbound() {
    let hits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&hits);
    let mut keys = HeadlessKeys::default();
    keys.bind(vec![KeyBinding::new("R", "Reset pan / zoom", move || counter.set(counter.get() + 1))]);

    assert!(keys.press("r"));
    assert!(keys.press("R"));
    assert!(!keys.press("Q"));
    assert_eq!(hits.get(), 2);
    assert_eq!(keys.describe(), vec![("R".to_owned(), "Reset pan / zoom".to_owned())]);
}

#[test]
fn glyphs_append_one_layer_each() {
    let mut surface = HeadlessSurface::default();
    let defs = surface.append_layer(LayerId::ROOT, "defs");
    let mut glyphs = HeadlessGlyphs::default();
    glyphs.load_defs(&mut surface, defs);
    assert_eq!(surface.children(defs).len(), GLYPHS.len());
    assert_eq!(glyphs.loads(), 1);
}

#[test]
fn maps_record_load_and_strip_star_prefix() {
    let mut surface = HeadlessSurface::default();
    let mut maps = HeadlessMaps::default();
    maps.load_map_into(&mut surface, LayerId::ROOT, "*continental_us");
    assert_eq!(maps.loaded(), &[(LayerId::ROOT, "*continental_us".to_owned())]);
    assert!(surface.find("continental_us").is_some());
}

#[test]
fn panels_lifecycle() {
    let mut panels = HeadlessPanels::default();
    panels.create("p");
    panels.set_content("p", &serde_json::json!({"title": "x"}));
    panels.show("p");
    assert_eq!(panels.panel("p").map(|p| p.visible), Some(true));
    panels.hide("p");
    assert_eq!(panels.panel("p").map(|p| p.visible), Some(false));
    panels.destroy("p");
    assert!(!panels.exists("p"));
    assert_eq!(panels.created_count(), 1);
}
