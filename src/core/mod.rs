//! Domain modules: query catalog, query engine seam, result shaping

pub mod catalog;
pub mod engine;
pub mod result_set;
