//! Restaurant collections for the nearby search
//!
//! The search reads restaurants through the [`RestaurantSource`] trait, which
//! hands out a lazy stream of documents so a scan never has to hold the whole
//! collection in memory.
//!
//! - [`JsonLinesSource`]: newline-delimited JSON export, one document per line
//! - [`MemoryRestaurantSource`]: in-memory collection, handy for tests and demos

pub mod json;
pub mod memory;
pub mod source;

pub use json::JsonLinesSource;
pub use memory::MemoryRestaurantSource;
pub use source::{RecordStream, RestaurantSource};
