mod artifact;
mod catalog;
mod error;
mod generate;
mod listing;

pub use crate::catalog::*;
pub use crate::error::*;
pub use crate::generate::*;
pub use crate::listing::parse_device_listing;
