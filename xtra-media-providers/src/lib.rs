// Xtra upstream clients
//
// Pure request builders and HTTP transports for the two upstream APIs:
// - gql:   persisted-query GraphQL endpoint (signed operation hashes)
// - helix: versioned REST endpoint (app client id + bearer token)
//
// Nothing here knows about listings, fallback or domain records; that
// lives in xtra-core.

// Shared error types
pub mod error;

pub mod credentials;
pub mod filters;

pub mod gql;
pub mod helix;

pub use credentials::Credentials;
pub use error::{ProviderClientError, TransportErrorKind};
pub use filters::{BroadcastType, StreamSort, VideoPeriod, VideoSort};
pub use gql::{GqlClient, GqlRequest, GraphClient, Operation};
pub use helix::{ClipOwner, HelixClient, HelixRequest, RestClient, VideoOwner};
