pub mod analytics;
pub mod clicks;
pub mod clock;
pub mod config;
pub mod error;
pub mod expiry;
pub mod models;
pub mod registry;
pub mod shortcode;
pub mod storage;

pub use error::{RegistryError, RegistryResult};
pub use registry::Registry;
