//! Sheet border and title block.
//!
//! Drawn last so it sits over everything else. The border wraps whatever
//! the other builders produced; the block hangs in its lower right corner.

use glam::dvec2;

use crate::drawlist::{Component, DrawSink, Layer, Style, View};
use crate::errors::{GadError, RenderError};
use crate::params::ParameterStore;
use crate::projection::Projection;
use crate::text::Anchor;
use crate::types::format_plain;

/// Border clearance around the drawing, paper mm
const BORDER_MARGIN: f64 = 10.0;
/// Title block size, paper mm
const BLOCK_WIDTH: f64 = 180.0;
const BLOCK_HEIGHT: f64 = 36.0;
const ROWS: usize = 4;
/// Text inset from the block edges, paper mm
const INSET: f64 = 3.0;
/// The outer border plots heavier than the rest of the block
const BORDER_STYLE: Style = Style {
    lineweight: Some(0.7),
    colour: None,
};

/// Text for the title block; the date is supplied by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct TitleInfo {
    pub title: String,
    pub project: String,
    pub drawing_number: String,
    pub date: String,
}

impl Default for TitleInfo {
    fn default() -> Self {
        Self {
            title: "GENERAL ARRANGEMENT DRAWING".into(),
            project: "BRIDGE DESIGN".into(),
            drawing_number: String::new(),
            date: String::new(),
        }
    }
}

pub fn build(
    store: &ParameterStore,
    proj: &Projection,
    sink: &mut DrawSink,
    info: &TitleInfo,
) -> Result<(), GadError> {
    let frame = store.frame()?;
    let mm = |v: f64| proj.length(v * store.derived().paper);

    let mut border = sink.bbox().inflate(mm(BORDER_MARGIN));
    if border.is_empty() {
        return Err(RenderError::EmptyDrawing.into());
    }
    border.min.y -= mm(BLOCK_HEIGHT);
    border.min.x = border.min.x.min(border.max.x - mm(BLOCK_WIDTH));

    let block_min = dvec2(border.max.x - mm(BLOCK_WIDTH), border.min.y);
    let block_max = dvec2(border.max.x, border.min.y + mm(BLOCK_HEIGHT));
    let row = mm(BLOCK_HEIGHT) / ROWS as f64;
    let row_centre = |r: usize| block_min.y + row * (r as f64 + 0.5);
    let left = block_min.x + mm(INSET);

    sink.pen(Layer::TitleBlock, View::Sheet, Component::TitleBlock)
        .with_style(BORDER_STYLE)
        .rect(border.min, border.max);
    let mut pen = sink.pen(Layer::TitleBlock, View::Sheet, Component::TitleBlock);
    pen.rect(block_min, block_max);
    for r in 1..ROWS {
        let y = block_min.y + row * r as f64;
        pen.line(dvec2(block_min.x, y), dvec2(block_max.x, y));
    }

    let scale = format!(
        "SCALE 1:{} (SECTIONS 1:{})",
        format_plain(frame.scale1),
        format_plain(frame.scale2)
    );
    pen.text(dvec2(left, row_centre(3)), info.title.as_str(), mm(4.0), 0.0, Anchor::MIDDLE_LEFT)
        .text(dvec2(left, row_centre(2)), info.project.as_str(), mm(3.0), 0.0, Anchor::MIDDLE_LEFT)
        .text(dvec2(left, row_centre(1)), scale, mm(2.5), 0.0, Anchor::MIDDLE_LEFT)
        .text(
            dvec2(left, row_centre(0)),
            format!("DRG. NO. {}", info.drawing_number),
            mm(2.5),
            0.0,
            Anchor::MIDDLE_LEFT,
        )
        .text(
            dvec2(block_max.x - mm(INSET), row_centre(0)),
            format!("DATE {}", info.date),
            mm(2.5),
            0.0,
            Anchor::MIDDLE_RIGHT,
        );
    Ok(())
}
