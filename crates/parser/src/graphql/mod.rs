//! GraphQL introspection normalizer
//!
//! Reads the JSON result of the standard introspection query. There is no
//! SDL or query-language parsing; queries are forwarded verbatim at runtime.
//!
//! ## Usage
//! ```rust,ignore
//! use clientgen_parser::graphql::GraphqlParser;
//!
//! let api = GraphqlParser::from_file("schema.introspection.json")?.parse()?;
//! assert_eq!(api.operations[0].id, "graphql");
//! ```

mod converter;
mod parser;
mod types;

pub use converter::{convert_graphql_to_api_definition, GRAPHQL_OPERATION_ID, GRAPHQL_PATH};
pub use parser::GraphqlParser;
pub use types::*;
