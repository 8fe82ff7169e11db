pub mod catalog;
pub mod gql_api;

pub use catalog::CatalogService;
pub use gql_api::GqlApi;
