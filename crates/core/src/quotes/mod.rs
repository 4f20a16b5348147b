//! Quote records and the local store that holds them.

mod quotes_model;
mod quotes_store;

pub use quotes_model::*;
pub use quotes_store::*;
