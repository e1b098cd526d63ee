//! End-to-end scenarios: parameters through geometry to every back-end.

use std::collections::BTreeMap;

use bridge_gad::compare::{check_agreement, dxf_layer_stats, expected_stats, import_dxf};
use bridge_gad::drawlist::{Component, DrawList, Layer, Primitive, View};
use bridge_gad::errors::{ConfigErrorKind, GadError};
use bridge_gad::params::Side;
use bridge_gad::render::{Backend, OutputFormat, RenderOptions, Renderer, ScreenRenderer, ScreenView};
use bridge_gad::{GeometryBuilder, ParameterStore};
use glam::{DVec2, dvec2};

const FORMATS: [OutputFormat; 3] = [OutputFormat::Dxf, OutputFormat::Pdf, OutputFormat::Png];

const GROUND: [(f64, f64); 4] = [(0.0, 100.5), (10.0, 100.3), (20.0, 100.4), (30.0, 100.6)];

fn scenario_a() -> BTreeMap<&'static str, f64> {
    BTreeMap::from([
        ("SCALE1", 100.0),
        ("SCALE2", 50.0),
        ("SKEW", 0.0),
        ("DATUM", 100.0),
        ("TOPRL", 110.0),
        ("LEFT", 0.0),
        ("RIGHT", 30.0),
        ("NSPAN", 1.0),
        ("SPAN1", 20.0),
        ("LBRIDGE", 20.0),
        ("ABTL", 5.0),
        ("RTL", 108.0),
        ("SOFL", 106.5),
        ("CCBR", 7.5),
    ])
}

fn store_with(changes: &[(&'static str, f64)]) -> ParameterStore {
    let mut map = scenario_a();
    map.extend(changes.iter().copied());
    ParameterStore::from_mapping(map, &GROUND).unwrap()
}

fn build(store: &ParameterStore) -> DrawList {
    GeometryBuilder::new(store).build().unwrap()
}

fn elevation_deck_rects(list: &DrawList) -> usize {
    list.iter()
        .filter(|i| {
            matches!(i.component, Component::Deck(_))
                && i.view == View::Elevation
                && matches!(i.primitive, Primitive::Rect { .. })
        })
        .count()
}

fn pier_plan_body(list: &DrawList, n: usize) -> Vec<DVec2> {
    list.of_component(Component::Pier(n))
        .find_map(|i| match &i.primitive {
            Primitive::Polyline { points, .. } if i.view == View::Plan && i.layer == Layer::Structure => {
                Some(points.clone())
            }
            _ => None,
        })
        .unwrap()
}

fn scenario_b(skew: f64) -> ParameterStore {
    store_with(&[
        ("NSPAN", 3.0),
        ("SPAN1", 25.0),
        ("LBRIDGE", 75.0),
        ("SKEW", skew),
        ("RIGHT", 90.0),
    ])
}

#[test]
fn scenario_a_single_span() {
    let list = build(&store_with(&[]));
    assert_eq!(elevation_deck_rects(&list), 1);
    assert!(list.iter().all(|i| !matches!(i.component, Component::Pier(_))));
    for side in [Side::Left, Side::Right] {
        let outlines = list
            .of_component(Component::Abutment(side))
            .filter(|i| i.view == View::Elevation && matches!(i.primitive, Primitive::Polyline { .. }))
            .count();
        assert_eq!(outlines, 1, "{side:?}");
    }
    let stubs = list
        .on_layer(Layer::CrossSection)
        .filter(|i| matches!(i.primitive, Primitive::Line { .. }))
        .count();
    assert_eq!(stubs, 4);
    assert!(list.on_layer(Layer::Grid).count() > 0);
}

#[test]
fn scenario_b_three_skewed_spans() {
    let list = build(&scenario_b(15.0));
    assert_eq!(elevation_deck_rects(&list), 3);
    for n in 1..=2 {
        let views: Vec<View> = list.of_component(Component::Pier(n)).map(|i| i.view).collect();
        assert!(views.contains(&View::Elevation) && views.contains(&View::Plan), "pier {n}");

        // the long side of the plan body leans by the skew
        let body = pier_plan_body(&list, n);
        let dir = (body[3] - body[0]).normalize();
        let t = 15f64.to_radians();
        assert!((dir - dvec2(-t.sin(), t.cos())).length() < 1e-9, "pier {n}");
    }
    assert_eq!(list.of_component(Component::Pier(3)).count(), 0);
}

#[test]
fn scenario_c_plan_elongation() {
    let store = store_with(&[
        ("NSPAN", 5.0),
        ("SPAN1", 24.0),
        ("LBRIDGE", 120.0),
        ("SKEW", 30.0),
        ("CCBR", 18.0),
        ("RIGHT", 130.0),
    ]);
    let list = build(&store);
    assert_eq!(elevation_deck_rects(&list), 5);

    let t = 30f64.to_radians();
    let expected = store.get("PIERST").unwrap() / t.cos() + (store.get("PIERTW").unwrap() * t.tan()).abs();
    for n in 1..=4 {
        let body = pier_plan_body(&list, n);
        let length = (body[3] - body[0]).length();
        assert!((length - expected).abs() < 1e-3, "pier {n}: {length} vs {expected}");
    }
}

#[test]
fn scenario_d_footing_above_cap() {
    let mut map = scenario_a();
    map.extend([("FUTRL", 104.0), ("FUTD", 2.0), ("CAPB", 105.0)]);
    let err = ParameterStore::from_mapping(map, &GROUND).unwrap_err();
    assert_eq!(err.kind, ConfigErrorKind::Inconsistent);
    assert_eq!(err.name, "FUTRL");
    assert_eq!(GadError::from(err).exit_code(), 3);
}

#[test]
fn scenario_e_backends_agree() {
    let list = build(&store_with(&[]));
    let reports: Vec<_> = FORMATS
        .into_iter()
        .map(|f| Backend::for_format(f, &RenderOptions::default()).render(&list).unwrap().report)
        .collect();
    for r in &reports {
        assert_eq!(r.stats, expected_stats(&list, r.format), "{}", r.format);
    }
    let disagreements = check_agreement(&list, &reports);
    assert!(disagreements.is_empty(), "{disagreements:?}");
}

#[test]
fn world_origin_is_left_datum_everywhere() {
    let store = scenario_b(15.0);
    let list = build(&store);
    let frame = *list.frame();
    for format in FORMATS {
        let backend = Backend::for_format(format, &RenderOptions::default());
        let proj = backend.projection(&list);
        let origin = proj.pt(frame.left, frame.datum);
        assert!((origin - backend.world_origin(&list)).length() < 1e-6, "{format}");
    }

    let mut view = ScreenView::new(800, 600);
    view.pan_by(dvec2(-40.0, 25.0));
    view.set_zoom(2.5);
    let screen = ScreenRenderer::new(view);
    let origin = screen.projection(&list).pt(frame.left, frame.datum);
    assert!((origin - screen.world_origin(&list)).length() < 1e-6);
}

#[test]
fn scale_changes_paper_sizes_only() {
    let base = build(&store_with(&[]));
    let doubled = build(&store_with(&[("SCALE1", 200.0)]));
    assert_eq!(base.len(), doubled.len());

    let elevation = |list: &DrawList| -> Vec<Primitive> {
        list.iter()
            .filter(|i| i.layer == Layer::Structure && i.view == View::Elevation)
            .map(|i| i.primitive.clone())
            .collect()
    };
    assert_eq!(elevation(&base), elevation(&doubled));

    // text sized in paper millimetres doubles in model metres
    let heights = |list: &DrawList| -> Vec<f64> {
        list.on_layer(Layer::Grid)
            .chain(list.on_layer(Layer::CrossSection))
            .filter_map(|i| match i.primitive {
                Primitive::Text { height, .. } => Some(height),
                _ => None,
            })
            .collect()
    };
    for (a, b) in heights(&base).into_iter().zip(heights(&doubled)) {
        assert!((b - 2.0 * a).abs() < 1e-12);
    }
}

#[test]
fn zero_skew_plan_is_axis_aligned() {
    let list = build(&scenario_b(0.0));
    for n in 1..=2 {
        let body = pier_plan_body(&list, n);
        for w in body.windows(2) {
            let d = w[1] - w[0];
            assert!(d.x.abs() < 1e-12 || d.y.abs() < 1e-12, "pier {n}: {d:?}");
        }
    }
}

/// Outline points of every structural item in elevation and plan, optionally
/// reflected about chainage `c`, rounded to the micrometre and sorted.
fn structure_points(list: &DrawList, c: f64, mirror: bool) -> Vec<(i64, i64)> {
    let key = |p: DVec2| ((p.x * 1e6).round() as i64, (p.y * 1e6).round() as i64);
    let mut pts: Vec<_> = list
        .iter()
        .filter(|i| matches!(i.layer, Layer::Structure | Layer::Foundation))
        .filter(|i| matches!(i.view, View::Elevation | View::Plan))
        .filter(|i| !matches!(i.primitive, Primitive::Text { .. }))
        .flat_map(|i| i.primitive.outline())
        .map(|p| if mirror { dvec2(2.0 * c - p.x, p.y) } else { p })
        .map(key)
        .collect();
    pts.sort_unstable();
    pts
}

#[test]
fn abutments_mirror_about_the_centreline() {
    // ABTL + LBRIDGE / 2, measured from LEFT
    let c = 5.0 + 10.0;
    for nspan in [1.0, 2.0] {
        let list = build(&store_with(&[("NSPAN", nspan), ("SPAN1", 20.0 / nspan)]));
        let left = structure_points(&list, c, false);
        assert!(!left.is_empty());
        assert_eq!(left, structure_points(&list, c, true), "{nspan} spans");
        for side in [Side::Left, Side::Right] {
            assert!(list.of_component(Component::Abutment(side)).count() > 0);
        }
    }
}

#[test]
fn dxf_round_trip_keeps_layer_counts() {
    let list = build(&scenario_b(15.0));
    let first = Backend::for_format(OutputFormat::Dxf, &RenderOptions::default())
        .render(&list)
        .unwrap()
        .bytes;
    let stats = dxf_layer_stats(&first).unwrap();
    assert_eq!(stats, expected_stats(&list, OutputFormat::Dxf));

    let imported = import_dxf(&first, list.frame()).unwrap();
    assert!(imported.iter().all(|i| i.component == Component::Imported));
    let second = Backend::for_format(OutputFormat::Dxf, &RenderOptions::default())
        .render(&imported)
        .unwrap()
        .bytes;
    assert_eq!(dxf_layer_stats(&second).unwrap(), stats);
}

#[test]
fn emit_writes_each_format() {
    let list = build(&store_with(&[]));
    let dir = tempfile::tempdir().unwrap();
    for format in FORMATS {
        let path = dir.path().join(format!("gad.{}", format.extension()));
        let mut backend = Backend::for_format(format, &RenderOptions::default());
        let report = backend.emit(&list, &path).unwrap();
        assert_eq!(report.format, format);
        let bytes = std::fs::read(&path).unwrap();
        match format {
            OutputFormat::Dxf => assert!(String::from_utf8_lossy(&bytes).contains("ENTITIES")),
            OutputFormat::Pdf => assert!(bytes.starts_with(b"%PDF-")),
            OutputFormat::Png => assert!(bytes.starts_with(b"\x89PNG")),
        }
    }
}

#[test]
fn failed_write_leaves_nothing() {
    let list = build(&store_with(&[]));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("gad.pdf");
    let mut backend = Backend::for_format(OutputFormat::Pdf, &RenderOptions::default());
    let err = backend.emit(&list, &path).unwrap_err();
    assert_eq!(err.exit_code(), 4);
    assert!(!path.exists());
}
