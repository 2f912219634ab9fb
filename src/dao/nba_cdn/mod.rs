mod client;
mod config;
mod error;
mod models;

pub use client::NbaCdnFeed;
pub use config::{DEFAULT_BASE_URL, NbaCdnConfig};
pub use error::{NbaCdnError, NbaCdnResult};
