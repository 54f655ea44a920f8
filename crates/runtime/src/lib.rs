//! Runtime dispatcher for clientgen
//!
//! Builds clients from a normalized schema and turns operation calls into
//! HTTP requests: arguments are bound onto the operation, headers resolved,
//! the request sent through a [`Dispatch`] implementation and the response
//! validated against the schema.
//!
//! ## Example
//!
//! ```rust,ignore
//! use clientgen_runtime::{build_openapi_client, ClientOptions};
//! use serde_json::json;
//!
//! let client = build_openapi_client(ClientOptions {
//!     path: Some("movies.openapi.json".to_string()),
//!     ..ClientOptions::new("http://localhost:3042")
//! })
//! .await?;
//! let movies = client.invoke("getMovies", json!({ "limit": 10 })).await?;
//! ```

mod bind;
mod client;
mod config;
mod error;
mod fetch;
mod graphql;
mod headers;
mod middleware;
mod plugin;
mod query;
mod state;
mod transport;
mod validate;

pub use bind::{bind, BoundRequest, CallArgs};
pub use client::{CallOutput, FullResponse, OpenApiClient};
pub use config::{parse_base_url, ClientConfig, ClientConfigBuilder, ClientOptions};
pub use error::{BoxError, ClientError, ErrorReport, Result, TransportError};
pub use fetch::{fetch_schema, load_definition};
pub use graphql::{GraphqlClient, GraphqlRequest};
pub use headers::{provider_fn, CallInfo, FnHeaderProvider, HeaderProvider, HeaderSet};
pub use middleware::{Cached, Logged};
pub use plugin::{Client, ClientPlugin, RequestContext};
pub use query::{scalar_text, QuerySerializer, RepeatedKeySerializer};
pub use transport::{
    Dispatch, FormData, FormValue, HttpRequest, HttpResponse, ReqwestDispatcher, RequestBody,
};
pub use validate::{check, decode_body, validate_response};

use clientgen_common::SchemaKind;

/// Build an OpenAPI client from options or a configured builder
///
/// The options are validated before the schema is loaded from `path` or
/// `schemaUrl`; one of the two is required.
pub async fn build_openapi_client(builder: impl Into<ClientConfigBuilder>) -> Result<OpenApiClient> {
    let builder = builder.into();
    let options = builder.options().clone();
    let config = builder.build()?;
    let api = load_definition(&options, SchemaKind::OpenApi)
        .await?
        .ok_or_else(|| ClientError::wrong_option("path", "either path or schemaUrl is required"))?;
    Ok(OpenApiClient::new(api, config))
}

/// Build a GraphQL client; a schema is loaded only when one is named
pub async fn build_graphql_client(builder: impl Into<ClientConfigBuilder>) -> Result<GraphqlClient> {
    let builder = builder.into();
    let options = builder.options().clone();
    let config = builder.build()?;
    Ok(match load_definition(&options, SchemaKind::Graphql).await? {
        Some(api) => GraphqlClient::with_schema(api, config),
        None => GraphqlClient::new(config),
    })
}
