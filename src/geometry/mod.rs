//! The geometry builder.
//!
//! Every sub-builder is a function `(store, projection, sink)` appending
//! primitives in model coordinates. [`GeometryBuilder::build`] runs them in
//! draw order and closes the list.

pub mod abutment;
pub mod approach;
pub mod cross_section;
pub mod deck;
pub mod dims;
pub mod layout;
pub mod pier;
pub mod sections;
pub mod shapes;
pub mod sheet;
pub mod title;

pub use title::TitleInfo;

use crate::drawlist::{DrawList, DrawSink};
use crate::errors::GadError;
#[cfg(feature = "tracing")]
use crate::log::{debug, warn};
use crate::params::ParameterStore;
use crate::projection::{DrawingFrame, Projection};

type SubBuilder = fn(&ParameterStore, &Projection, &mut DrawSink) -> Result<(), GadError>;

/// Sub-builders in draw order, the title block excluded
const STAGES: [(&str, SubBuilder); 8] = [
    ("layout", layout::build),
    ("cross section", cross_section::build),
    ("deck", deck::build),
    ("piers", pier::build),
    ("abutments", abutment::build),
    ("approach slabs", approach::build),
    ("section", sections::build),
    ("dimensions", dims::build),
];

/// Turns a validated store into a finalised [`DrawList`]
pub struct GeometryBuilder<'a> {
    store: &'a ParameterStore,
    title: TitleInfo,
}

impl<'a> GeometryBuilder<'a> {
    pub fn new(store: &'a ParameterStore) -> Self {
        Self {
            store,
            title: TitleInfo::default(),
        }
    }

    pub fn with_title(mut self, title: TitleInfo) -> Self {
        self.title = title;
        self
    }

    pub fn build(&self) -> Result<DrawList, GadError> {
        let frame = DrawingFrame::from_store(self.store)?;
        let proj = Projection::model(&frame);
        let mut sink = DrawSink::new(frame);

        for stage in STAGES {
            #[cfg(feature = "tracing")]
            let before = sink.items().len();
            (stage.1)(self.store, &proj, &mut sink)?;
            #[cfg(feature = "tracing")]
            debug!(stage = stage.0, items = sink.items().len() - before, "geometry stage");
        }
        title::build(self.store, &proj, &mut sink, &self.title)?;

        let list = sink.finalise();
        #[cfg(feature = "tracing")]
        for w in list.warnings() {
            warn!(%w, "geometry warning");
        }
        Ok(list)
    }
}
