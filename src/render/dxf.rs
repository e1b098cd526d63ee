//! DXF back-end.
//!
//! Model space is millimetres with `(LEFT, DATUM)` at the origin. Every layer
//! is declared in the table with its colour and weight; entities plot
//! `BYLAYER` unless the item carries a style hint.

use std::io::Cursor;

use dxf::entities::{Arc, Entity, EntityType, Line, LwPolyline, Text};
use dxf::enums::{AcadVersion, DrawingUnits, HorizontalTextJustification, Units, VerticalTextJustification};
use dxf::tables;
use dxf::{Color, Drawing, LineWeight, LwPolylineVertex, Point};
use glam::DVec2;

use super::style::{dxf_lineweight, layer_style};
use super::{OutputFormat, Rendered, Renderer, Tally, check_drawable, device_hatch};
use crate::drawlist::{DrawItem, DrawList, Layer, LayerStats, Primitive, record};
use crate::errors::RenderError;
use crate::log::debug;
use crate::projection::Projection;
use crate::text::{self, Anchor, HAlign, VAlign};

/// `BYLAYER` in the entity lineweight field
const LINEWEIGHT_BY_LAYER: i16 = -1;

/// Writes a DrawList as a DXF document
#[derive(Debug, Clone)]
pub struct DxfRenderer {
    version: AcadVersion,
}

impl Default for DxfRenderer {
    fn default() -> Self {
        Self {
            version: AcadVersion::R2010,
        }
    }
}

impl DxfRenderer {
    pub fn with_version(version: AcadVersion) -> Self {
        Self { version }
    }

    fn new_drawing(&self) -> Drawing {
        let mut drawing = Drawing::new();
        drawing.header.version = self.version;
        drawing.header.default_drawing_units = Units::Millimeters;
        drawing.header.drawing_units = DrawingUnits::Metric;
        for layer in Layer::ALL {
            let style = layer_style(layer);
            let mut entry = tables::Layer::default();
            entry.name = layer.name().to_string();
            entry.color = Color::from_index(style.aci);
            entry.line_weight = LineWeight::from_raw_value(dxf_lineweight(style.lineweight));
            drawing.add_layer(entry);
        }
        drawing
    }
}

impl Renderer for DxfRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Dxf
    }

    fn projection(&self, list: &DrawList) -> Projection {
        Projection::dxf(list.frame())
    }

    fn render(&mut self, list: &DrawList) -> Result<Rendered, RenderError> {
        check_drawable(list)?;
        let proj = self.projection(list);
        let mut drawing = self.new_drawing();
        let mut tally = Tally::new(&proj);

        for item in list {
            tally.place(item);
            for specific in entities(&proj, item) {
                drawing.add_entity(tagged(item, specific));
            }
            if let Primitive::Hatch { .. } = item.primitive {
                tally.fallback(item.layer, "HATCH", "boundary and strokes");
            }
        }

        let mut bytes = Vec::new();
        drawing
            .save(&mut bytes)
            .map_err(|e| RenderError::Encode {
                backend: "dxf",
                message: e.to_string(),
            })?;
        let written = layer_stats(&read_back(&bytes)?);
        debug!(entities = drawing.entities().count(), bytes = bytes.len(), "dxf encoded");
        Ok(Rendered {
            bytes,
            report: tally.finish(OutputFormat::Dxf, Some(written)),
        })
    }
}

/// Parse an encoded DXF document.
pub fn read_back(bytes: &[u8]) -> Result<Drawing, RenderError> {
    Drawing::load(&mut Cursor::new(bytes)).map_err(|e| RenderError::Decode {
        backend: "dxf",
        message: e.to_string(),
    })
}

/// Entity and vertex counts per known layer.
///
/// Entities on layers outside the fixed set, or of kinds this back-end
/// never writes, are ignored.
pub fn layer_stats(drawing: &Drawing) -> LayerStats {
    let mut stats = LayerStats::new();
    for entity in drawing.entities() {
        let Some(layer) = Layer::from_name(&entity.common.layer) else {
            continue;
        };
        let vertices = match &entity.specific {
            EntityType::Line(_) => 2,
            EntityType::LwPolyline(p) => p.vertices.len(),
            EntityType::Arc(_) | EntityType::Text(_) => 1,
            _ => continue,
        };
        record(&mut stats, layer, vertices);
    }
    stats
}

fn point(p: DVec2) -> Point {
    Point::new(p.x, p.y, 0.0)
}

fn tagged(item: &DrawItem, specific: EntityType) -> Entity {
    let mut entity = Entity::new(specific);
    entity.common.layer = item.layer.name().to_string();
    entity.common.color = match item.style.colour {
        Some(aci) => Color::from_index(aci),
        None => Color::by_layer(),
    };
    entity.common.lineweight_enum_value = item
        .style
        .lineweight
        .map_or(LINEWEIGHT_BY_LAYER, dxf_lineweight);
    entity
}

fn lwpolyline(points: impl IntoIterator<Item = DVec2>, closed: bool) -> EntityType {
    let mut poly = LwPolyline::default();
    poly.set_is_closed(closed);
    poly.vertices = points
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            let mut v = LwPolylineVertex::default();
            v.id = i as i32;
            v.x = p.x;
            v.y = p.y;
            v
        })
        .collect();
    EntityType::LwPolyline(poly)
}

fn justification(anchor: Anchor) -> (HorizontalTextJustification, VerticalTextJustification) {
    let h = match anchor.h {
        HAlign::Left => HorizontalTextJustification::Left,
        HAlign::Centre => HorizontalTextJustification::Center,
        HAlign::Right => HorizontalTextJustification::Right,
    };
    let v = match anchor.v {
        VAlign::Baseline => VerticalTextJustification::Baseline,
        VAlign::Bottom => VerticalTextJustification::Bottom,
        VAlign::Middle => VerticalTextJustification::Middle,
        VAlign::Top => VerticalTextJustification::Top,
    };
    (h, v)
}

/// The DXF entities one item becomes, in drawing units.
fn entities(proj: &Projection, item: &DrawItem) -> Vec<EntityType> {
    let map = |p: DVec2| proj.from_model(p);
    match &item.primitive {
        Primitive::Line { a, b } => vec![EntityType::Line(Line::new(point(map(*a)), point(map(*b))))],
        Primitive::Polyline { points, closed } => {
            vec![lwpolyline(points.iter().map(|&p| map(p)), *closed)]
        }
        Primitive::Rect { .. } => {
            vec![lwpolyline(item.primitive.outline().into_iter().map(map), true)]
        }
        Primitive::Arc {
            centre,
            radius,
            start_deg,
            end_deg,
        } => vec![EntityType::Arc(Arc::new(
            point(map(*centre)),
            proj.length(*radius),
            *start_deg,
            *end_deg,
        ))],
        Primitive::Text {
            at,
            value,
            height,
            rotation_deg,
            anchor,
        } => {
            let anchor_point = map(*at);
            let h = proj.length(*height);
            let mut t = Text::default();
            t.location = point(text::baseline_start(anchor_point, value, h, *rotation_deg, *anchor));
            t.text_height = h;
            t.value = value.clone();
            t.rotation = *rotation_deg;
            let (hj, vj) = justification(*anchor);
            t.horizontal_text_justification = hj;
            t.vertical_text_justification = vj;
            if *anchor != Anchor::BASELINE_LEFT {
                t.second_alignment_point = point(anchor_point);
            }
            vec![EntityType::Text(t)]
        }
        Primitive::Hatch { boundary, .. } => {
            let mut out = vec![lwpolyline(boundary.iter().map(|&p| map(p)), true)];
            out.extend(
                device_hatch(proj, &item.primitive)
                    .into_iter()
                    .map(|(a, b)| EntityType::Line(Line::new(point(a), point(b)))),
            );
            out
        }
    }
}
