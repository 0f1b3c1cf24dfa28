//! Nearest-restaurant search
//!
//! [`TopKSelector`] finds the closest restaurants matching a cuisine filter in
//! one streaming pass over a collection. [`NearbySearch`] puts the query cache
//! in front of it.

pub mod selector;
pub mod service;

pub use selector::{Selection, TopKSelector};
pub use service::{NearbySearch, QueryOutcome, ResultSource};
