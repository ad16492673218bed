//! Dataset directories.
//!
//! A dataset is a directory holding a recording (`raw.mda` and/or a
//! `raw.chunks/` store), its `params.json`, and optionally `geom.csv` and
//! `firings.mda`.

mod firings;
mod geometry;
mod params;
mod recording;

pub use firings::Firings;
pub use geometry::{Geometry, default_location};
pub use params::DatasetParams;
pub use recording::Recording;
