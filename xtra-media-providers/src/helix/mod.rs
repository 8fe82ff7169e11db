//! Helix REST backend

pub mod client;
pub mod request;
pub mod types;

pub use client::{DEFAULT_HELIX_URL, HelixClient, RestClient};
pub use request::{ClipOwner, HelixRequest, VideoOwner};
