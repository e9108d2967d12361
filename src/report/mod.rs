//! Report module - summary tables and result exports

pub mod export;
pub mod summary;

pub use export::*;
pub use summary::*;
