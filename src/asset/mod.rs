//! Asset routing: inline data URI or standalone file.
//!
//! Every processed module passes through [`AssetRouter::route`] exactly once.
//! Script and style code is always chunked; inlineable kinds (images, fonts,
//! media) are embedded as data URIs when small enough, otherwise emitted
//! under their kind directory.

mod data_uri;
mod dir;
mod route;

pub use data_uri::data_uri;
pub use dir::AssetDir;
pub use route::{AssetRouter, Placement, RoutedAsset};
