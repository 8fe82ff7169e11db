//! Persisted-query GraphQL backend

pub mod client;
pub mod operation;
pub mod request;
pub mod types;

pub use client::{DEFAULT_GQL_URL, GqlClient, GraphClient, WEB_CLIENT_ID};
pub use operation::{Operation, OperationDef, registry};
pub use request::{GqlRequest, SearchIndex};
