pub mod backend;
pub mod cheer;
pub mod config;
pub mod credentials;
pub mod error;
pub mod listing;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod preferences;
pub mod service;
pub mod singleflight;

pub use backend::{BackendKind, BackendPreference};
pub use config::Config;
pub use credentials::{CredentialProvider, StaticCredentials};
pub use error::{AggregateFailure, BackendFailure, Error, Result};
pub use listing::{ListingHandle, ListingStatus, PageSource};
pub use models::{ChannelRef, Cursor, DomainRecord, GameRef, LogicalQuery, Page};
pub use service::{CatalogService, GqlApi};
