//! Per-layer pen settings shared by every back-end.

use crate::drawlist::{DrawItem, Layer};

/// Colour and weight a layer plots with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerStyle {
    /// AutoCAD colour index
    pub aci: u8,
    /// Line weight in paper millimetres
    pub lineweight: f64,
}

pub fn layer_style(layer: Layer) -> LayerStyle {
    let (aci, lineweight) = match layer {
        Layer::Grid => (8, 0.18),
        Layer::Structure => (1, 0.50),
        Layer::Foundation => (5, 0.35),
        Layer::Dimensions => (6, 0.18),
        Layer::Annotations => (3, 0.25),
        Layer::TitleBlock => (7, 0.35),
        Layer::CrossSection => (2, 0.25),
    };
    LayerStyle { aci, lineweight }
}

/// RGB of an ACI colour as plotted on white paper.
///
/// Only the indices the layers use are exact; anything else plots black.
pub fn aci_rgb(aci: u8) -> [u8; 3] {
    match aci {
        1 => [255, 0, 0],
        // yellow is unreadable on white
        2 => [204, 153, 0],
        3 => [0, 160, 0],
        4 => [0, 160, 160],
        5 => [0, 0, 255],
        6 => [255, 0, 255],
        8 => [128, 128, 128],
        9 => [192, 192, 192],
        _ => [0, 0, 0],
    }
}

/// Effective colour and weight of one item, hints first
pub fn item_style(item: &DrawItem) -> LayerStyle {
    let base = layer_style(item.layer);
    LayerStyle {
        aci: item.style.colour.unwrap_or(base.aci),
        lineweight: item.style.lineweight.unwrap_or(base.lineweight),
    }
}

/// DXF lineweight enum value (hundredths of a millimetre)
pub fn dxf_lineweight(mm: f64) -> i16 {
    (mm * 100.0).round().clamp(0.0, 211.0) as i16
}
