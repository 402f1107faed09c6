pub mod error;
pub mod geometry;
pub mod model;
pub mod region_classifier;
pub mod text_metrics;
