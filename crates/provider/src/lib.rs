//! Client for the ImaginePro image-generation REST API.
//!
//! [`ImagineProApi`] talks HTTP to the provider; the [`ImageProvider`]
//! trait is the seam the job tracker and request handlers depend on, so
//! they can be driven by a scripted provider in tests.

pub mod api;
pub mod provider;

pub use api::{AccountInfo, ImagineProApi, ProviderApiError, DEFAULT_BASE_URL};
pub use provider::ImageProvider;
