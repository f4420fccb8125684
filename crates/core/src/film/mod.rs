//! Film records as served by the data service.

mod types;

pub use types::*;
