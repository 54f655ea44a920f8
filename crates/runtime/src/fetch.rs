//! Loading the schema a client is built from

use crate::config::ClientOptions;
use crate::error::{ClientError, Result};
use crate::headers::HeaderSet;
use clientgen_common::{ApiDefinition, SchemaKind};
use tracing::{debug, info};

/// Download a schema document
///
/// `headers` are sent with the request, e.g. credentials for a protected
/// schema endpoint. Non-success statuses are failures.
pub async fn fetch_schema(url: &str, headers: &HeaderSet) -> Result<String> {
    let client = reqwest::Client::new();
    let mut request = client.get(url);
    for (name, value) in headers.iter() {
        request = request.header(name, value);
    }
    debug!(url, "fetching schema");

    let response = request
        .send()
        .await
        .map_err(|e| ClientError::unexpected_with(format!("failed to fetch schema from {}", url), e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::UnexpectedCallFailure {
            message: format!("failed to fetch schema from {}: status {}", url, status.as_u16()),
            status_code: Some(status.as_u16()),
            body: None,
            source: None,
        });
    }
    response
        .text()
        .await
        .map_err(|e| ClientError::unexpected_with(format!("failed to read schema from {}", url), e))
}

/// Schema named by the options: the local `path` wins over `schemaUrl`
///
/// Returns `None` when the options name no schema at all.
pub async fn load_definition(options: &ClientOptions, kind: SchemaKind) -> Result<Option<ApiDefinition>> {
    if let Some(path) = options.path.as_deref() {
        let api = clientgen_parser::normalize_file(path, Some(kind))
            .map_err(|e| ClientError::unexpected_with(format!("failed to load schema {}", path), e))?;
        info!(path, operations = api.operations.len(), "schema loaded");
        return Ok(Some(api));
    }
    if let Some(url) = options.schema_url.as_deref() {
        let raw = fetch_schema(url, &options.headers).await?;
        let api = clientgen_parser::normalize(&raw, Some(kind))
            .map_err(|e| ClientError::unexpected_with(format!("failed to load schema {}", url), e))?;
        info!(url, operations = api.operations.len(), "schema loaded");
        return Ok(Some(api));
    }
    Ok(None)
}
