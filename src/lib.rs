pub mod circle;
pub mod config;
pub mod difference;
pub mod error;
pub mod geojson;
pub mod geom;
pub mod intersect;
pub mod parallel;
pub mod segment;

pub use circle::{circle, destination, distance, CircleOptions, Units};
pub use difference::polygon_difference;
pub use error::{Error, Result};
pub use geojson::GeoJson;
pub use intersect::{line_intersect, IntersectOptions, Parallelism};
pub use segment::line_segment;
