//! Track export formats

pub mod gpx;

pub use gpx::{export_gpx, GPX_CONTENT_TYPE};
