//! Network and file access.

pub mod albion;
pub mod catalog;

pub use albion::AlbionDataClient;
pub use catalog::load_catalog;
