//! Persisted generations on local disk.
//!
//! - [`ImageMaterializer`] downloads the images of a finished job into its
//!   own folder and writes the metadata document.
//! - [`GalleryStore`] lists and deletes those folders.

pub mod error;
pub mod materializer;
pub mod store;

pub use error::GalleryError;
pub use materializer::ImageMaterializer;
pub use store::GalleryStore;
