//! Per-request context and plugin registration of named clients

use crate::client::OpenApiClient;
use crate::graphql::GraphqlClient;
use crate::headers::HeaderSet;
use std::collections::BTreeMap;
use std::fmt;

/// A client registered on a context
#[derive(Debug, Clone)]
pub enum Client {
    OpenApi(OpenApiClient),
    Graphql(GraphqlClient),
}

impl From<OpenApiClient> for Client {
    fn from(client: OpenApiClient) -> Self {
        Client::OpenApi(client)
    }
}

impl From<GraphqlClient> for Client {
    fn from(client: GraphqlClient) -> Self {
        Client::Graphql(client)
    }
}

/// Inbound request a host is handling, with the clients decorated onto it
///
/// Calls made with the context see its headers (for header providers) and
/// forward its telemetry headers.
#[derive(Clone, Default)]
pub struct RequestContext {
    headers: HeaderSet,
    telemetry: HeaderSet,
    clients: BTreeMap<String, Client>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_headers(headers: HeaderSet) -> Self {
        Self {
            headers,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Trace propagation header forwarded on every call made with this context
    pub fn with_telemetry(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.telemetry.insert(name, value);
        self
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    pub fn telemetry(&self) -> &HeaderSet {
        &self.telemetry
    }

    pub fn client(&self, name: &str) -> Option<&Client> {
        self.clients.get(name)
    }

    pub fn openapi(&self, name: &str) -> Option<&OpenApiClient> {
        match self.clients.get(name) {
            Some(Client::OpenApi(client)) => Some(client),
            _ => None,
        }
    }

    pub fn graphql(&self, name: &str) -> Option<&GraphqlClient> {
        match self.clients.get(name) {
            Some(Client::Graphql(client)) => Some(client),
            _ => None,
        }
    }

    pub fn client_names(&self) -> impl Iterator<Item = &str> {
        self.clients.keys().map(String::as_str)
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("headers", &self.headers)
            .field("telemetry", &self.telemetry)
            .field("clients", &self.clients.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Attaches one named client to every request context it is registered on
#[derive(Debug, Clone)]
pub struct ClientPlugin {
    name: String,
    client: Client,
}

impl ClientPlugin {
    pub fn new(name: impl Into<String>, client: impl Into<Client>) -> Self {
        Self {
            name: name.into(),
            client: client.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Decorate a context with the client; a previous client of the same name is replaced
    pub fn register(&self, context: &mut RequestContext) {
        context.clients.insert(self.name.clone(), self.client.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientConfig, ClientOptions};

    fn config() -> ClientConfig {
        ClientConfig::builder(ClientOptions::new("http://localhost:3042"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_register_named_clients() {
        let plugin = ClientPlugin::new("movies", GraphqlClient::new(config()));
        let mut context = RequestContext::new().with_header("Authorization", "Bearer t");
        plugin.register(&mut context);

        assert!(context.graphql("movies").is_some());
        assert!(context.openapi("movies").is_none());
        assert!(context.client("other").is_none());
        assert_eq!(context.client_names().collect::<Vec<_>>(), vec!["movies"]);
        assert_eq!(context.headers().get("authorization"), Some("Bearer t"));
    }

    #[test]
    fn test_clients_share_configuration() {
        let client = GraphqlClient::new(config());
        let plugin = ClientPlugin::new("movies", client.clone());
        let mut context = RequestContext::new();
        plugin.register(&mut context);

        client.set_base_url("http://example.com").unwrap();
        let registered = context.graphql("movies").unwrap();
        assert_eq!(registered.config().base_url.as_str(), "http://example.com/");
    }
}
