//! OpenAPI 3.x and Swagger 2.0 parser
//!
//! Normalizes OpenAPI documents (JSON or YAML) into the [`ApiDefinition`] IR.
//!
//! ## What gets read
//! - `paths`: every method of every path item becomes an operation
//! - `components.schemas` / `definitions`: named types, mapped up front so
//!   `$ref` cycles resolve to the same node
//! - `servers`, or `host` + `basePath` + `schemes` on 2.0 documents
//!
//! Cookie parameters are ignored.
//!
//! ## Usage
//! ```rust,ignore
//! use clientgen_parser::openapi::OpenApiParser;
//!
//! let parser = OpenApiParser::from_file("movies.openapi.json")?;
//! let api = parser.parse()?;
//! ```
//!
//! [`ApiDefinition`]: clientgen_common::ApiDefinition

mod converter;
mod parser;
mod types;

pub use converter::convert_openapi_to_api_definition;
pub use parser::OpenApiParser;
pub use types::*;
