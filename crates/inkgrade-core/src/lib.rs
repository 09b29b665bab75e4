//! inkgrade-core: local assessment engine for drawing exercises.
//!
//! Scores captured strokes (and, for color exercises, a canvas raster)
//! against authored exercise content: line tracing via DTW, shape fitting,
//! connect-the-dots hit testing and CIEDE2000 color fills. The batch engine,
//! TOML content parser and session reports build on those analyzers.

pub mod color;
pub mod colorimetry;
pub mod config;
pub mod dispatch;
pub mod dots;
pub mod dtw;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod line;
pub mod model;
pub mod parser;
pub mod path;
pub mod raster;
pub mod report;
pub mod results;
pub mod shape;
pub mod statistics;

pub use dispatch::assess;
pub use error::AssessmentError;
