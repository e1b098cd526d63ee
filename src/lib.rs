//! General-arrangement drawings of reinforced-concrete bridges.
//!
//! The pipeline runs strictly left to right: a parameter file is parsed into
//! [`RawParameters`], validated into a read-only [`ParameterStore`], turned
//! into a back-end-neutral [`DrawList`] by the [`GeometryBuilder`], and
//! handed to one of the renderers in [`render`].

pub mod compare;
pub mod drawlist;
pub mod errors;
pub mod geometry;
pub mod log;
pub mod params;
pub mod projection;
pub mod render;
pub mod text;
pub mod types;

use pest_derive::Parser;

pub use drawlist::DrawList;
pub use errors::GadError;
pub use geometry::{GeometryBuilder, TitleInfo};
pub use params::{ParameterStore, RawParameters};
pub use render::{Backend, OutputFormat, RenderOptions, RenderReport, Renderer};

#[derive(Parser)]
#[grammar = "params.pest"]
pub struct ParamsParser;

/// Validate `raw` and build the drawing.
pub fn generate(raw: RawParameters, title: TitleInfo) -> Result<DrawList, GadError> {
    let store = ParameterStore::from_raw(raw)?;
    GeometryBuilder::new(&store).with_title(title).build()
}
